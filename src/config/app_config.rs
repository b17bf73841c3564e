use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use broxus_util::{const_duration_ms, serde_duration_ms};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::multisig::{OrderParams, DEFAULT_QUERY_OFFSET, DEFAULT_WALLET_ID};

/// Tool config
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Multisig wallet id used in new orders
    pub wallet_id: u32,

    /// Order lifetime in seconds
    pub query_offset_sec: u32,

    /// Gateway prefix used to resolve `ipfs://` links
    pub ipfs_gateway: Url,

    /// Off-chain metadata request timeout
    #[serde(with = "serde_duration_ms", default = "const_duration_ms::<10000>")]
    pub fetch_timeout: Duration,
}

impl AppConfig {
    pub const DEFAULT_IPFS_GATEWAY: &str = "https://ipfs.io/ipfs/";

    /// Loads config from the specified path or returns the default one
    /// if the file doesn't exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config not found, using defaults");
            return Ok(Self::default());
        }

        let data = std::fs::read_to_string(path).context("failed to read app config")?;
        let mut deserializer = toml::Deserializer::new(&data);
        serde_path_to_error::deserialize(&mut deserializer).context("failed to parse app config")
    }

    pub fn store<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let data = toml::to_string_pretty(self).context("failed to serialize app config")?;
        std::fs::write(path, data).context("failed to write app config")
    }

    pub fn order_params(&self) -> OrderParams {
        OrderParams {
            wallet_id: self.wallet_id,
            query_offset: self.query_offset_sec,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            wallet_id: DEFAULT_WALLET_ID,
            query_offset_sec: DEFAULT_QUERY_OFFSET,
            // Valid constant url
            ipfs_gateway: Url::parse(Self::DEFAULT_IPFS_GATEWAY).unwrap(),
            fetch_timeout: Duration::from_millis(10000),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_uses_defaults() {
        let config: AppConfig = toml::from_str("wallet_id = 5\nfetch_timeout = 2500\n").unwrap();
        assert_eq!(config.wallet_id, 5);
        assert_eq!(config.query_offset_sec, DEFAULT_QUERY_OFFSET);
        assert_eq!(config.fetch_timeout, Duration::from_millis(2500));
        assert_eq!(config.ipfs_gateway.as_str(), AppConfig::DEFAULT_IPFS_GATEWAY);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(toml::from_str::<AppConfig>("gateway = 1").is_err());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("orderkeeper-missing-config.toml");
        let config = AppConfig::load(path).unwrap();
        assert_eq!(config.wallet_id, DEFAULT_WALLET_ID);
    }

    #[test]
    fn store_then_load() {
        let path = std::env::temp_dir().join(format!(
            "orderkeeper-config-{}.toml",
            rand::random::<u32>()
        ));
        let config = AppConfig {
            wallet_id: 42,
            ..Default::default()
        };
        config.store(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded.wallet_id, 42);
        assert_eq!(loaded.order_params().query_offset, DEFAULT_QUERY_OFFSET);
    }
}
