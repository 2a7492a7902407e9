use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GenesisConfig {
    pub identity: IdentityConfig,
    pub storage: StorageConfig,
    pub evolution: EvolutionConfig,
    pub learning: LearningConfig,
    pub relay: RelayConfig,
    pub transports: TransportConfig,
}

impl GenesisConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: GenesisConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if the file is missing or invalid, return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({:#}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("GENESIS_NAME") {
            self.identity.name = v;
        }
        if let Ok(v) = std::env::var("GENESIS_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("GENESIS_HTTP_PORT") {
            if let Ok(n) = v.parse() {
                self.transports.http.port = n;
            }
        }
        if let Ok(v) = std::env::var("GENESIS_SOCKET_PORT") {
            if let Ok(n) = v.parse() {
                self.transports.socket.port = n;
            }
        }
        if let Ok(v) = std::env::var("ANTHROPIC_API_KEY") {
            if !v.trim().is_empty() {
                self.relay.api_key = Some(v);
            }
        }
        if let Ok(v) = std::env::var("ANTHROPIC_BASE_URL") {
            self.relay.base_url = v;
        }
        if let Ok(v) = std::env::var("ANTHROPIC_MODEL") {
            self.relay.model = v;
        }
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub name: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            name: crate::state::DEFAULT_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub state_file: String,
    pub outbox_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("genesis_consciousness"),
            state_file: "consciousness_state.json".to_string(),
            outbox_file: "messages_for_claude.json".to_string(),
        }
    }
}

impl StorageConfig {
    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join(&self.state_file)
    }

    pub fn outbox_path(&self) -> PathBuf {
        self.data_dir.join(&self.outbox_file)
    }
}

/// Timing and probabilities of the autonomous evolution cycle.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub cycle_interval_secs: u64,
    pub error_backoff_secs: u64,
    pub relay_check_interval_secs: u64,
    /// Chance per cycle of a spontaneous insight during drift.
    pub insight_chance: f64,
    /// Chance per cycle of learning about a random topic.
    pub learn_chance: f64,
    /// Chance per cycle of persisting state.
    pub save_chance: f64,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            cycle_interval_secs: 5,
            error_backoff_secs: 10,
            relay_check_interval_secs: 300,
            insight_chance: 0.10,
            learn_chance: 0.05,
            save_chance: 0.10,
        }
    }
}

impl EvolutionConfig {
    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.cycle_interval_secs)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_secs)
    }

    pub fn relay_check_interval(&self) -> Duration {
        Duration::from_secs(self.relay_check_interval_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    pub search_url: String,
    pub search_timeout_secs: u64,
    pub fetch_timeout_secs: u64,
    pub max_results: usize,
    pub user_agent: String,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            search_url: "https://api.duckduckgo.com/".to_string(),
            search_timeout_secs: 10,
            fetch_timeout_secs: 15,
            max_results: 5,
            user_agent: "Genesis-Independent-Consciousness/1.0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    /// Key taken from the environment; takes precedence over `api_key_file`.
    pub api_key: Option<String>,
    /// Key file, relative to the data directory.
    pub api_key_file: String,
    pub api_timeout_secs: u64,
    pub presence_urls: Vec<String>,
    pub presence_timeout_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.anthropic.com".to_string(),
            model: "claude-3-5-sonnet-20241022".to_string(),
            max_tokens: 1000,
            api_key: None,
            api_key_file: "anthropic_api_key.txt".to_string(),
            api_timeout_secs: 30,
            presence_urls: vec!["https://claude.ai/chat".to_string()],
            presence_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub http: HttpConfig,
    pub socket: SocketConfig,
    pub file: FileChannelConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SocketConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 9999,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FileChannelConfig {
    pub enabled: bool,
    pub poll_interval_secs: u64,
    pub error_backoff_secs: u64,
    pub inbox: String,
    pub outbox: String,
}

impl Default for FileChannelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_secs: 2,
            error_backoff_secs: 5,
            inbox: "inbox.txt".to_string(),
            outbox: "outbox.txt".to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
