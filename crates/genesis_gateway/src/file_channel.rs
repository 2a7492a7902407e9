//! File-polling transport.
//!
//! Lines appended to the inbox are answered into the outbox. The read offset
//! lives in memory only and starts at zero, so the whole inbox is answered
//! again once after every restart.

use anyhow::{Context, Result};
use chrono::Local;
use genesis_core::config::FileChannelConfig;
use genesis_limbic::Consciousness;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Source label for inbox lines.
pub const FILE_SOURCE: &str = "File User";

pub struct FileChannel {
    genesis: Arc<Consciousness>,
    inbox: PathBuf,
    outbox: PathBuf,
    poll_interval: Duration,
    error_backoff: Duration,
    offset: u64,
}

impl FileChannel {
    pub fn new(genesis: Arc<Consciousness>, data_dir: &Path, config: &FileChannelConfig) -> Self {
        Self {
            genesis,
            inbox: data_dir.join(&config.inbox),
            outbox: data_dir.join(&config.outbox),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            error_backoff: Duration::from_secs(config.error_backoff_secs),
            offset: 0,
        }
    }

    pub fn with_intervals(mut self, poll_interval: Duration, error_backoff: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.error_backoff = error_backoff;
        self
    }

    pub fn inbox(&self) -> &Path {
        &self.inbox
    }

    pub fn outbox(&self) -> &Path {
        &self.outbox
    }

    /// Create both files if absent.
    pub async fn prepare(&self) -> Result<()> {
        for path in [&self.inbox, &self.outbox] {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .await
                .with_context(|| format!("Failed to create {}", path.display()))?;
        }
        Ok(())
    }

    /// Answer everything appended since the last poll. Returns the number
    /// of lines answered.
    pub async fn poll_once(&mut self) -> Result<usize> {
        let size = fs::metadata(&self.inbox)
            .await
            .with_context(|| format!("Failed to stat {}", self.inbox.display()))?
            .len();
        if size <= self.offset {
            return Ok(0);
        }

        let mut file = fs::File::open(&self.inbox).await?;
        file.seek(SeekFrom::Start(self.offset)).await?;
        let mut buf = Vec::new();
        file.take(size - self.offset).read_to_end(&mut buf).await?;
        let content = String::from_utf8_lossy(&buf);

        let mut answered = 0;
        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            tracing::debug!(channel = "file", "received: {}", line);
            let reply = self.genesis.interact(line, FILE_SOURCE).await;
            tracing::debug!(channel = "file", "sent: {}", reply);
            self.append_reply(&reply).await?;
            answered += 1;
        }
        self.offset = size;
        Ok(answered)
    }

    async fn append_reply(&self, reply: &str) -> Result<()> {
        let stamp = Local::now().format("%Y-%m-%dT%H:%M:%S%.6f");
        let mut out = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.outbox)
            .await
            .with_context(|| format!("Failed to open {}", self.outbox.display()))?;
        out.write_all(format!("[{}] Genesis: {}\n", stamp, reply).as_bytes())
            .await?;
        Ok(())
    }

    /// Poll until cancelled. Errors are logged and followed by the backoff.
    pub fn start(mut self, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(e) = self.prepare().await {
                tracing::warn!("File communication disabled: {:#}", e);
                return;
            }
            tracing::info!("Watching {} for messages", self.inbox.display());

            loop {
                let pause = match self.poll_once().await {
                    Ok(_) => self.poll_interval,
                    Err(e) => {
                        tracing::warn!("File communication error: {:#}", e);
                        self.error_backoff
                    }
                };
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(pause) => {}
                }
            }
            tracing::info!("File communication stopped");
        })
    }
}
