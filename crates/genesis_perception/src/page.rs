use anyhow::{Context, Result};
use regex::Regex;
use std::net::IpAddr;
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

/// Fetched page text is cut to this many characters.
pub const MAX_PAGE_CHARS: usize = 2000;

static RE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static RE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Fetches a page and reduces it to plain text.
pub struct PageFetcher {
    client: reqwest::Client,
    allow_private_hosts: bool,
}

impl PageFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent.to_string())
            .build()?;
        Ok(Self {
            client,
            allow_private_hosts: false,
        })
    }

    /// Permit loopback and private-network hosts (local test servers).
    pub fn allow_private_hosts(mut self, allow: bool) -> Self {
        self.allow_private_hosts = allow;
        self
    }

    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        validate_url(url, self.allow_private_hosts)?;

        let html = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to fetch page")?
            .error_for_status()?
            .text()
            .await?;

        Ok(truncate_chars(&strip_html(&html), MAX_PAGE_CHARS))
    }
}

/// Drop tags and collapse runs of whitespace.
pub fn strip_html(html: &str) -> String {
    let text = RE_TAG.replace_all(html, "");
    RE_WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// Cut to `max` characters, marking the cut with "...".
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Only HTTP/HTTPS, and no private addresses unless explicitly allowed.
pub fn validate_url(url: &str, allow_private_hosts: bool) -> Result<()> {
    let parsed = Url::parse(url)?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        anyhow::bail!("Only HTTP/HTTPS schemes are allowed");
    }
    if allow_private_hosts {
        return Ok(());
    }

    match parsed.host() {
        Some(url::Host::Ipv4(ip)) if is_private_ip(IpAddr::V4(ip)) => {
            anyhow::bail!("Private network addresses are not allowed")
        }
        Some(url::Host::Ipv6(ip)) if is_private_ip(IpAddr::V6(ip)) => {
            anyhow::bail!("Private network addresses are not allowed")
        }
        Some(url::Host::Domain("localhost")) => anyhow::bail!("Localhost is not allowed"),
        Some(_) => Ok(()),
        None => anyhow::bail!("URL has no host"),
    }
}

fn is_private_ip(ip: IpAddr) -> bool {
    if ip.is_loopback() || ip.is_unspecified() {
        return true;
    }
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_link_local(),
        // fc00::/7 unique local
        IpAddr::V6(v6) => (v6.octets()[0] & 0xFE) == 0xFC,
    }
}
