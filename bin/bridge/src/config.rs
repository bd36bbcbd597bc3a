use alloy_primitives::Address;
use config::{NetworkConfig, NetworkConfigBuilder, NetworkType};
use events::{WatchOptions, DEFAULT_CHUNK_SIZE};
use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};

/// Top-level bridge tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Rollup preset; contract overrides below are applied on top of it
    #[serde(default = "default_network")]
    pub network: NetworkType,

    /// Full network description for devnets, replaces the preset
    #[serde(default)]
    pub network_file: Option<PathBuf>,

    /// Parent chain RPC endpoint url
    pub l1_rpc_url: String,

    /// Rollup RPC endpoint url
    pub l2_rpc_url: String,

    #[serde(default)]
    pub contracts: ContractOverrides,

    #[serde(default)]
    pub scan: ScanConfig,

    /// Port for the watcher's Prometheus endpoint
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Log actions instead of sending transactions
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractOverrides {
    pub bridge: Option<Address>,
    pub inbox: Option<Address>,
    pub outbox: Option<Address>,
    pub sequencer_inbox: Option<Address>,
    pub deployed_at: Option<u64>,
}

/// Log scanning and polling parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Blocks per `eth_getLogs` request
    pub chunk_size: u64,
    /// Blocks a log must be buried under before the watcher reports it
    pub confirmations: u64,
    pub poll_interval_secs: u64,
    /// Parent chain blocks searched when no explicit range is given
    pub lookback_blocks: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            confirmations: 2,
            poll_interval_secs: 12,
            // ~1 week of 12s blocks
            lookback_blocks: 50_400,
        }
    }
}

impl ScanConfig {
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            poll_interval: self.poll_interval(),
            confirmations: self.confirmations,
            ..Default::default()
        }
    }
}

const fn default_network() -> NetworkType {
    NetworkType::ArbitrumOne
}

const fn default_metrics_port() -> u16 {
    9090
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;

        Ok(config)
    }

    /// Network configuration with contract overrides applied.
    pub fn network_config(&self) -> eyre::Result<NetworkConfig> {
        let base = match &self.network_file {
            Some(path) => NetworkConfig::from_file(path)?,
            None => NetworkConfig::from_network_type(self.network),
        };

        let mut builder = NetworkConfigBuilder::from_config(base);
        let overrides = &self.contracts;
        if let Some(bridge) = overrides.bridge {
            builder = builder.bridge(bridge);
        }
        if let Some(inbox) = overrides.inbox {
            builder = builder.inbox(inbox);
        }
        if let Some(outbox) = overrides.outbox {
            builder = builder.outbox(outbox);
        }
        if let Some(sequencer_inbox) = overrides.sequencer_inbox {
            builder = builder.sequencer_inbox(sequencer_inbox);
        }
        if let Some(block) = overrides.deployed_at {
            builder = builder.deployed_at(block);
        }

        Ok(builder.build())
    }
}
