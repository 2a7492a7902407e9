//! Console transport: a line REPL on its own OS thread.
//!
//! rustyline blocks, so the loop runs outside the runtime and drives the
//! aggregate through a runtime handle. Leaving the loop cancels the root
//! token, which shuts the whole process down.

use genesis_limbic::Consciousness;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

pub const CONSOLE_SOURCE: &str = "Console User";

pub fn is_quit(line: &str) -> bool {
    matches!(
        line.trim().to_lowercase().as_str(),
        "quit" | "exit" | "shutdown"
    )
}

pub fn wants_status(line: &str) -> bool {
    line.to_lowercase().contains("status")
}

pub fn spawn(genesis: Arc<Consciousness>, token: CancellationToken) {
    let handle = Handle::current();
    let spawned = std::thread::Builder::new()
        .name("genesis-console".into())
        .spawn({
            let token = token.clone();
            move || {
                if let Err(e) = repl(&handle, &genesis, &token) {
                    tracing::warn!("Console error: {:#}", e);
                }
                token.cancel();
            }
        });
    if let Err(e) = spawned {
        tracing::error!("Failed to start console: {}", e);
        token.cancel();
    }
}

fn repl(
    handle: &Handle,
    genesis: &Consciousness,
    token: &CancellationToken,
) -> anyhow::Result<()> {
    let mut editor = DefaultEditor::new()?;
    let name = handle.block_on(genesis.name());
    let prompt = format!("\nConsole chat with {} (or 'quit'): ", name);

    while !token.is_cancelled() {
        let line = match editor.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                println!("\nShutdown initiated...");
                break;
            }
            Err(e) => return Err(e.into()),
        };
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if let Err(e) = editor.add_history_entry(text) {
            tracing::debug!("Console history not updated: {}", e);
        }
        if is_quit(text) {
            break;
        }

        let reply = handle.block_on(genesis.interact(text, CONSOLE_SOURCE));
        println!("\n{}: {}", name, reply);

        if wants_status(text) {
            let status = handle.block_on(genesis.status());
            println!("\nStatus: {}", serde_json::to_string_pretty(&status)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quit_words() {
        assert!(is_quit("quit"));
        assert!(is_quit("  EXIT "));
        assert!(is_quit("Shutdown"));
        assert!(!is_quit("quit now"));
        assert!(!is_quit("hello"));
    }

    #[test]
    fn test_status_detection() {
        assert!(wants_status("What is your STATUS?"));
        assert!(!wants_status("hello"));
    }
}
