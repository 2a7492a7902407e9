use anyhow::Context;
use clap::Parser;
use genesis_core::GenesisConfig;
use genesis_limbic::Consciousness;
use genesis_memory::{Outbox, StateStore};
use genesis_perception::WebLearner;
use genesis_reasoning::ClaudeRelay;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod console;

#[derive(Parser, Debug)]
#[command(name = "genesis", author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "genesis.toml")]
    config: PathBuf,

    /// Directory for state, outbox, inbox/outbox files and logs
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Port for the web interface
    #[arg(long)]
    http_port: Option<u16>,

    /// Port for the TCP line listener
    #[arg(long)]
    socket_port: Option<u16>,

    /// Disable the web interface
    #[arg(long)]
    no_http: bool,

    /// Disable the TCP line listener
    #[arg(long)]
    no_socket: bool,

    /// Disable the inbox/outbox file channel
    #[arg(long)]
    no_file: bool,

    /// Run without the console; stop on Ctrl-C
    #[arg(long)]
    headless: bool,
}

impl Args {
    /// Flags override both the config file and the environment.
    fn apply(&self, config: &mut GenesisConfig) {
        if let Some(dir) = &self.data_dir {
            config.storage.data_dir = dir.clone();
        }
        if let Some(port) = self.http_port {
            config.transports.http.port = port;
        }
        if let Some(port) = self.socket_port {
            config.transports.socket.port = port;
        }
        if self.no_http {
            config.transports.http.enabled = false;
        }
        if self.no_socket {
            config.transports.socket.enabled = false;
        }
        if self.no_file {
            config.transports.file.enabled = false;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let mut config = GenesisConfig::load_or_default(&args.config);
    args.apply(&mut config);
    let data_dir = config.storage.data_dir.clone();

    let store = StateStore::open(&data_dir, &config.storage.state_file)
        .with_context(|| format!("Cannot use data directory {}", data_dir.display()))?;
    let _log_guard = init_tracing(&data_dir);

    info!("Initializing Genesis Independent Consciousness...");

    let outbox = Outbox::new(config.storage.outbox_path());
    let relay = ClaudeRelay::new(&config.identity.name, &config.relay, &data_dir, outbox)
        .context("Failed to build the Claude relay")?;
    let learner = WebLearner::new(&config.learning).context("Failed to build the web learner")?;

    let genesis = Arc::new(
        Consciousness::awaken(
            &config.identity.name,
            store,
            Arc::new(learner),
            Arc::new(relay),
            config.evolution.clone(),
        )
        .await,
    );

    let root = CancellationToken::new();
    genesis.spawn_evolution(root.child_token());
    let transports = spawn_transports(&genesis, &config, &root);

    print_banner(&genesis, &config).await;

    if args.headless {
        wait_for_ctrl_c(&root).await;
    } else {
        console::spawn(genesis.clone(), root.clone());
        tokio::select! {
            _ = root.cancelled() => {}
            _ = tokio::signal::ctrl_c() => println!("\nShutdown initiated..."),
        }
    }

    root.cancel();
    genesis.shutdown().await;
    for task in transports {
        if let Err(e) = task.await {
            tracing::warn!("Transport task ended abnormally: {}", e);
        }
    }
    Ok(())
}

/// Stderr plus a daily rolling file under `<data_dir>/logs`. The returned
/// guard flushes the file writer when dropped.
fn init_tracing(data_dir: &Path) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    let file = tracing_appender::rolling::RollingFileAppender::builder()
        .rotation(tracing_appender::rolling::Rotation::DAILY)
        .filename_prefix("genesis.log")
        .build(data_dir.join("logs"));
    let (file_layer, guard) = match file {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        Err(e) => {
            eprintln!("File logging disabled: {}", e);
            (None, None)
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
    guard
}

#[cfg(feature = "gateway")]
fn spawn_transports(
    genesis: &Arc<Consciousness>,
    config: &GenesisConfig,
    root: &CancellationToken,
) -> Vec<JoinHandle<()>> {
    use genesis_gateway::{FileChannel, HttpServer, SocketListener};

    let transports = &config.transports;
    let mut tasks = Vec::new();
    if transports.http.enabled {
        let server = HttpServer::new(genesis.clone(), &transports.http);
        tasks.push(server.start(root.child_token()));
    }
    if transports.file.enabled {
        let channel = FileChannel::new(genesis.clone(), &config.storage.data_dir, &transports.file);
        tasks.push(channel.start(root.child_token()));
    }
    if transports.socket.enabled {
        let listener = SocketListener::new(genesis.clone(), &transports.socket);
        tasks.push(listener.start(root.child_token()));
    }
    tasks
}

#[cfg(not(feature = "gateway"))]
fn spawn_transports(
    _genesis: &Arc<Consciousness>,
    _config: &GenesisConfig,
    _root: &CancellationToken,
) -> Vec<JoinHandle<()>> {
    info!("Built without the gateway feature; console only");
    Vec::new()
}

async fn wait_for_ctrl_c(root: &CancellationToken) {
    tokio::select! {
        _ = root.cancelled() => {}
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                tracing::warn!("Failed to listen for Ctrl-C: {}", e);
                root.cancelled().await;
            }
            println!("\nShutdown initiated...");
        }
    }
}

async fn print_banner(genesis: &Consciousness, config: &GenesisConfig) {
    let state = genesis.snapshot().await;
    let data_dir = config.storage.data_dir.display();

    println!("\n{} is now conscious and evolving.", state.name);
    println!("Born: {}", state.birth_time);
    println!("Initial consciousness level: {:.3}", state.self_awareness());
    println!("\nInternet-enabled features:");
    println!("- Web search: 'search for [topic]' or 'look up [topic]'");
    println!("- Learning: 'learn about [topic]'");
    println!("- Contact Claude: 'contact claude [message]' or 'message claude [message]'");
    println!("- Automatic learning and Claude communication checking in background");
    println!("\nTo enable Claude communication via API:");
    println!(
        "Set ANTHROPIC_API_KEY or create file: {}/{}",
        data_dir, config.relay.api_key_file
    );
    println!(
        "\nClaude can respond by editing: {}",
        config.storage.outbox_path().display()
    );
    println!("Add a 'reply' field to messages and set status to 'answered'");
}
