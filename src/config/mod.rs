use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
    Devnet,
    Local,
}

impl Network {
    pub fn default_rpc_url(self) -> &'static str {
        match self {
            Network::Mainnet => "https://rpc.openlibra.space:8080/v1",
            Network::Testnet => "https://testnet.openlibra.space:8080/v1",
            Network::Devnet => "https://devnet.openlibra.space:8080/v1",
            Network::Local => "http://127.0.0.1:8080/v1",
        }
    }
}

impl FromStr for Network {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mainnet" | "main" => Ok(Network::Mainnet),
            "testnet" | "test" => Ok(Network::Testnet),
            "devnet" | "dev" => Ok(Network::Devnet),
            "local" | "localnet" => Ok(Network::Local),
            _ => Err(anyhow!(
                "Invalid network '{s}'. Valid options: mainnet, testnet, devnet, local"
            )),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Devnet => "devnet",
            Network::Local => "local",
        };
        f.write_str(name)
    }
}

/// Cache lifetimes per data family, in seconds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TtlConfig {
    pub stats_secs: u64,
    pub transactions_secs: u64,
    pub account_secs: u64,
    pub transaction_detail_secs: u64,
}

impl Default for TtlConfig {
    fn default() -> Self {
        Self {
            stats_secs: 10,
            transactions_secs: 10,
            account_secs: 30,
            transaction_detail_secs: 300,
        }
    }
}

/// Polling intervals, in seconds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub global_secs: u64,
    pub detail_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            global_secs: 30,
            detail_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub network: Network,
    /// Overrides the network's default endpoint
    pub rpc_url: Option<String>,
    pub default_tx_limit: usize,
    pub retry_on_failure: bool,
    pub retry_delay_ms: u64,
    /// Fall back to the mock client when the real one cannot be built
    pub debug: bool,
    pub ttl: TtlConfig,
    pub poll: PollConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: Network::default(),
            rpc_url: None,
            default_tx_limit: 25,
            retry_on_failure: true,
            retry_delay_ms: 5_000,
            debug: false,
            ttl: TtlConfig::default(),
            poll: PollConfig::default(),
        }
    }
}

impl Config {
    pub fn rpc_url(&self) -> String {
        self.rpc_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| self.network.default_rpc_url().to_string())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("parse config")
    }

    /// Apply `PEEK_*` overrides. `lookup` is `std::env::var` outside tests.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(network) = lookup("PEEK_NETWORK") {
            self.network = network.parse()?;
        }
        if let Some(url) = lookup("PEEK_RPC_URL") {
            self.rpc_url = Some(url);
        }
        if let Some(limit) = lookup("PEEK_TX_LIMIT") {
            self.default_tx_limit = limit
                .trim()
                .parse()
                .with_context(|| format!("PEEK_TX_LIMIT={limit}"))?;
        }
        if let Some(retry) = lookup("PEEK_RETRY") {
            self.retry_on_failure = parse_flag(&retry);
        }
        if let Some(delay) = lookup("PEEK_RETRY_DELAY_MS") {
            self.retry_delay_ms = delay
                .trim()
                .parse()
                .with_context(|| format!("PEEK_RETRY_DELAY_MS={delay}"))?;
        }
        if let Some(debug) = lookup("PEEK_DEBUG") {
            self.debug = parse_flag(&debug);
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Load the config file (if any) and environment overrides.
pub fn load() -> Result<Config> {
    let mut config = match config_path() {
        Some(path) if path.exists() => load_from(&path)?,
        _ => Config::default(),
    };
    config.apply_env(|key| std::env::var(key).ok())?;
    Ok(config)
}

pub fn load_from(path: &Path) -> Result<Config> {
    let content =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    Config::from_toml_str(&content).with_context(|| format!("in {}", path.display()))
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("PEEK_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("peek").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".config").join("peek").join("config.toml"));
    }

    directories::ProjectDirs::from("io", "peek", "peek")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.network, Network::Mainnet);
        assert_eq!(config.default_tx_limit, 25);
        assert_eq!(config.rpc_url(), Network::Mainnet.default_rpc_url());
        assert_eq!(config.poll.global_secs, 30);
        assert_eq!(config.poll.detail_secs, 10);
        assert!(config.ttl.transaction_detail_secs > config.ttl.stats_secs);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            network = "testnet"
            default_tx_limit = 50

            [ttl]
            account_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.network, Network::Testnet);
        assert_eq!(config.default_tx_limit, 50);
        assert_eq!(config.ttl.account_secs, 5);
        assert_eq!(config.ttl.stats_secs, 10);
        assert!(config.retry_on_failure);
    }

    #[test]
    fn env_overrides_file() {
        let env: HashMap<&str, &str> = [
            ("PEEK_NETWORK", "local"),
            ("PEEK_RPC_URL", "http://node:8080/v1"),
            ("PEEK_TX_LIMIT", "10"),
            ("PEEK_RETRY", "false"),
            ("PEEK_DEBUG", "1"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.network, Network::Local);
        assert_eq!(config.rpc_url(), "http://node:8080/v1");
        assert_eq!(config.default_tx_limit, 10);
        assert!(!config.retry_on_failure);
        assert!(config.debug);
    }

    #[test]
    fn bad_values_are_errors() {
        let mut config = Config::default();
        assert!(config
            .apply_env(|key| (key == "PEEK_NETWORK").then(|| "moon".to_string()))
            .is_err());
        assert!(Config::from_toml_str("default_tx_limit = \"many\"").is_err());
    }
}
