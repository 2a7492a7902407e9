//! Raw TCP line transport: one newline-terminated line in, one line out.

use genesis_core::config::SocketConfig;
use genesis_limbic::Consciousness;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Source label for a peer.
pub fn network_source(addr: &SocketAddr) -> String {
    format!("Network-{}", addr.ip())
}

pub struct SocketListener {
    genesis: Arc<Consciousness>,
    host: String,
    port: u16,
}

impl SocketListener {
    pub fn new(genesis: Arc<Consciousness>, config: &SocketConfig) -> Self {
        Self {
            genesis,
            host: config.host.clone(),
            port: config.port,
        }
    }

    pub fn start(self, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let addr = format!("{}:{}", self.host, self.port);
            let listener = match TcpListener::bind(&addr).await {
                Ok(l) => l,
                Err(e) => {
                    tracing::warn!("Network listener failed to bind {}: {}", addr, e);
                    return;
                }
            };
            tracing::info!("Genesis network listener on {}", addr);
            accept_loop(listener, self.genesis, token).await;
        })
    }
}

/// Accept connections until cancelled; each connection gets its own task.
pub async fn accept_loop(
    listener: TcpListener,
    genesis: Arc<Consciousness>,
    token: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    tracing::info!("Connection from {}", addr);
                    let genesis = genesis.clone();
                    let token = token.child_token();
                    tokio::spawn(async move {
                        if let Err(e) = serve_connection(stream, addr, genesis, token).await {
                            tracing::warn!("Network client {} error: {}", addr, e);
                        }
                    });
                }
                Err(e) => tracing::warn!("Network accept failed: {}", e),
            }
        }
    }
    tracing::info!("Network listener stopped");
}

async fn serve_connection(
    stream: TcpStream,
    addr: SocketAddr,
    genesis: Arc<Consciousness>,
    token: CancellationToken,
) -> std::io::Result<()> {
    let source = network_source(&addr);
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    loop {
        let line = tokio::select! {
            _ = token.cancelled() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else { break };
        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        tracing::debug!(channel = "socket", "received from {}: {}", source, text);
        let reply = genesis.interact(text, &source).await;
        tracing::debug!(channel = "socket", "sent to {}: {}", source, reply);
        writer.write_all(format!("{}\n", reply).as_bytes()).await?;
    }
    Ok(())
}
