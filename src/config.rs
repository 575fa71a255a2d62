//! Configuration loading and the ignore list.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server connection settings.
    pub server: ServerConfig,
    /// Identities whose messages are never learned or replied to.
    #[serde(default)]
    pub ignore: Vec<String>,
    /// Channels to join, in order. The bot only participates in channels
    /// it was told to join; everything else is dropped.
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Configured channel names, in configured order.
    pub fn channel_names(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.name.clone()).collect()
    }
}

/// Server connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server address as `host:port`.
    pub address: String,
    /// Connect over TLS (verified against system roots).
    #[serde(default)]
    pub tls: bool,
    /// Optional server password (PASS).
    pub password: Option<String>,
    /// Bot nick, also used as ident and realname.
    pub nick: String,
}

/// A channel membership: name plus optional join key.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelConfig {
    pub name: String,
    pub key: Option<String>,
}

/// Identities never learned from or replied to.
///
/// An identity matches an entry if it equals the entry or begins with
/// the entry immediately followed by `:`. The prefix form suppresses
/// bridge-relayed identities formatted as `relay:realname`.
#[derive(Debug, Clone, Default)]
pub struct IgnoreSet(Vec<String>);

impl IgnoreSet {
    pub fn new(entries: Vec<String>) -> Self {
        Self(entries)
    }

    pub fn matches(&self, identity: &str) -> bool {
        self.0.iter().any(|entry| {
            identity == entry
                || identity
                    .strip_prefix(entry.as_str())
                    .is_some_and(|rest| rest.starts_with(':'))
        })
    }
}
