//! Configuration surface for the demo drivers (§6): a party's private
//! key, the ledger node endpoints and the peer's transport address.
//! Read from a YAML file if `SMC_DEMO_CONFIG` points at one, falling
//! back to individual `SMC_*` environment variables - mirroring the
//! teacher's `sample` binary, which takes its Algorand node/wallet
//! settings the same way.

use std::env;
use std::fs;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct DemoConfig {
    /// 32 raw secret-key bytes, hex-encoded.
    pub secret_key_hex: String,
    /// Ledger submission node, e.g. `http://localhost:4001`.
    #[serde(default = "default_node_url")]
    pub node_url: String,
    /// Ledger indexer, e.g. `http://localhost:8980`.
    #[serde(default = "default_indexer_url")]
    pub indexer_url: String,
    /// Address this party's transport listens on or dials.
    pub peer_address: String,
    #[serde(default)]
    pub listen: bool,
}

fn default_node_url() -> String {
    "http://localhost:4001".to_string()
}

fn default_indexer_url() -> String {
    "http://localhost:8980".to_string()
}

impl DemoConfig {
    /// Loads from `SMC_DEMO_CONFIG` (a YAML file path) if set, otherwise
    /// assembles one from individual environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = env::var("SMC_DEMO_CONFIG") {
            let contents = fs::read_to_string(&path)
                .map_err(|e| ConfigError(format!("reading {}: {}", path, e)))?;
            return serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError(format!("parsing {}: {}", path, e)));
        }

        Ok(DemoConfig {
            secret_key_hex: env::var("SMC_SECRET_KEY")
                .map_err(|_| ConfigError("SMC_SECRET_KEY is not set".to_string()))?,
            node_url: env::var("SMC_NODE_URL").unwrap_or_else(|_| default_node_url()),
            indexer_url: env::var("SMC_INDEXER_URL").unwrap_or_else(|_| default_indexer_url()),
            peer_address: env::var("SMC_PEER_ADDRESS")
                .map_err(|_| ConfigError("SMC_PEER_ADDRESS is not set".to_string()))?,
            listen: env::var("SMC_LISTEN").map(|v| v == "1").unwrap_or(false),
        })
    }
}

#[derive(Debug)]
pub struct ConfigError(String);

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "demo configuration error: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}
