//! Runtime configuration
//!
//! Defaults, overridden by `MIRROR_*` environment variables (a `.env` file is
//! loaded first if present), overridden again by command-line flags.

use anyhow::{Context, Result};
use mirror_core::{AmountScale, ContractConfig, DEFAULT_CONTRACT_ADDRESS, DEFAULT_MODULE_NAME};
use mirror_engine::market::DEFAULT_TICKER_INTERVAL;
use mirror_networking::http::{DEFAULT_MARKET_API, DEFAULT_NODE_URL};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TICKER_URL: &str =
    "https://api.groww.in/v1/live-data/ltp?segment=CASH&exchange_symbols=NSE_RELIANCE,BSE_SENSEX";

const DATA_DIR_NAME: &str = "MirrorTrading";
const DB_FILE_NAME: &str = "mirror.db";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub node_url: String,
    pub contract_address: String,
    pub module_name: String,
    pub market_api: String,
    pub ticker_url: String,
    pub ticker_interval: Duration,
    pub confirm_timeout: Duration,
    pub confirm_poll: Duration,
    pub amount_scale: AmountScale,
    pub data_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_url: DEFAULT_NODE_URL.to_string(),
            contract_address: DEFAULT_CONTRACT_ADDRESS.to_string(),
            module_name: DEFAULT_MODULE_NAME.to_string(),
            market_api: DEFAULT_MARKET_API.to_string(),
            ticker_url: DEFAULT_TICKER_URL.to_string(),
            ticker_interval: DEFAULT_TICKER_INTERVAL,
            confirm_timeout: Duration::from_secs(30),
            confirm_poll: Duration::from_millis(500),
            amount_scale: AmountScale::Whole,
            data_dir: default_data_dir(),
        }
    }
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();

        if let Some(v) = get("MIRROR_NODE_URL") {
            config.node_url = v;
        }
        if let Some(v) = get("MIRROR_CONTRACT_ADDRESS") {
            config.contract_address = v;
        }
        if let Some(v) = get("MIRROR_MODULE") {
            config.module_name = v;
        }
        if let Some(v) = get("MIRROR_MARKET_API") {
            config.market_api = v;
        }
        if let Some(v) = get("MIRROR_TICKER_URL") {
            config.ticker_url = v;
        }
        if let Some(v) = get("MIRROR_TICKER_INTERVAL_SECS") {
            let secs: u64 = v
                .parse()
                .with_context(|| format!("MIRROR_TICKER_INTERVAL_SECS is not a number: {}", v))?;
            config.ticker_interval = Duration::from_secs(secs.max(1));
        }
        if let Some(v) = get("MIRROR_CONFIRM_TIMEOUT_SECS") {
            let secs: u64 = v
                .parse()
                .with_context(|| format!("MIRROR_CONFIRM_TIMEOUT_SECS is not a number: {}", v))?;
            config.confirm_timeout = Duration::from_secs(secs);
        }
        if let Some(v) = get("MIRROR_AMOUNT_SCALE") {
            config.amount_scale = v.parse().context("MIRROR_AMOUNT_SCALE")?;
        }
        if let Some(v) = get("MIRROR_DATA_DIR") {
            config.data_dir = PathBuf::from(v);
        }

        Ok(config)
    }

    pub fn contract(&self) -> ContractConfig {
        ContractConfig::new(&self.contract_address, &self.module_name)
            .with_amount_scale(self.amount_scale)
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }
}

fn default_data_dir() -> PathBuf {
    dirs_next::data_local_dir()
        .map(|p| p.join(DATA_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config.node_url, "https://fullnode.testnet.aptoslabs.com");
        assert_eq!(config.module_name, "mirror_trading");
        assert_eq!(config.amount_scale, AmountScale::Whole);
        assert_eq!(config.ticker_interval, Duration::from_secs(5));
        assert_eq!(config.confirm_timeout, Duration::from_secs(30));
        assert!(config.db_path().ends_with("mirror.db"));
    }

    #[test]
    fn test_env_overrides() {
        let config = from_pairs(&[
            ("MIRROR_NODE_URL", "http://localhost:8080"),
            ("MIRROR_CONTRACT_ADDRESS", "0xabc"),
            ("MIRROR_AMOUNT_SCALE", "Octas"),
            ("MIRROR_TICKER_INTERVAL_SECS", "0"),
            ("MIRROR_DATA_DIR", "/tmp/mirror"),
            ("MIRROR_MODULE", "   "),
        ])
        .unwrap();

        assert_eq!(config.node_url, "http://localhost:8080");
        assert_eq!(config.module_name, "mirror_trading");
        assert_eq!(config.ticker_interval, Duration::from_secs(1));
        assert_eq!(config.db_path(), PathBuf::from("/tmp/mirror/mirror.db"));

        let contract = config.contract();
        assert_eq!(contract.amount_scale, AmountScale::Octas);
        assert_eq!(contract.function_id("follow_leader"), "0xabc::mirror_trading::follow_leader");
    }

    #[test]
    fn test_bad_values_are_errors() {
        assert!(from_pairs(&[("MIRROR_AMOUNT_SCALE", "cents")]).is_err());
        assert!(from_pairs(&[("MIRROR_CONFIRM_TIMEOUT_SECS", "soon")]).is_err());
    }
}
