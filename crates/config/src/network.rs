//! Network configuration for Arbitrum rollups.
//!
//! Provides the core contract addresses and chain parameters for known
//! rollups (Arbitrum One, Nova, Arbitrum Sepolia), plus a builder for
//! custom deployments.

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read network file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid network file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Known rollup networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NetworkType {
    ArbitrumOne,
    Nova,
    ArbitrumSepolia,
}

/// Parent chain (where the rollup contracts live).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentChainConfig {
    /// Chain ID
    pub chain_id: u64,
    /// Block time in seconds (12 for Ethereum)
    pub block_time_secs: u64,
}

impl ParentChainConfig {
    pub const fn mainnet() -> Self {
        Self {
            chain_id: 1,
            block_time_secs: 12,
        }
    }

    pub const fn sepolia() -> Self {
        Self {
            chain_id: 11155111,
            block_time_secs: 12,
        }
    }
}

/// Core rollup contracts on the parent chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollupContracts {
    pub bridge: Address,
    pub inbox: Address,
    pub outbox: Address,
    pub sequencer_inbox: Address,
    /// Parent chain block the bridge was deployed at; scans never start earlier
    pub deployed_at: u64,
}

impl RollupContracts {
    /// Arbitrum One core contracts.
    pub const fn arbitrum_one() -> Self {
        Self {
            // https://etherscan.io/address/0x8315177aB297bA92A06054cE80a67Ed4DBd7ed3a
            bridge: address!("0x8315177aB297bA92A06054cE80a67Ed4DBd7ed3a"),
            inbox: address!("0x4Dbd4fc535Ac27206064B68FfCf827b0A60BAB3f"),
            outbox: address!("0x0B9857ae2D4A3DBe74ffE1d7DF045bb7F96E4840"),
            sequencer_inbox: address!("0x1c479675ad559DC151F6Ec7ed3FbF8ceE79582B6"),
            deployed_at: 15_411_056,
        }
    }

    /// Arbitrum Nova core contracts.
    pub const fn nova() -> Self {
        Self {
            // https://etherscan.io/address/0xC1Ebd02f738644983b6C4B2d440b8e77DdE276Bd
            bridge: address!("0xC1Ebd02f738644983b6C4B2d440b8e77DdE276Bd"),
            inbox: address!("0xc4448b71118c9071Bcb9734A0EAc55D18A153949"),
            outbox: address!("0xD4B80C3D7240325D18E645B49e6535A3Bf95cc58"),
            sequencer_inbox: address!("0x211E1c4c7f1bF5351Ac850Ed10FD68CFfCF6c21b"),
            deployed_at: 15_016_829,
        }
    }

    /// Arbitrum Sepolia core contracts.
    pub const fn arbitrum_sepolia() -> Self {
        Self {
            // https://sepolia.etherscan.io/address/0x38f918D0E9F1b721EDaA41302E399fa1B79333a9
            bridge: address!("0x38f918D0E9F1b721EDaA41302E399fa1B79333a9"),
            inbox: address!("0xaAe29B0366299461418F5324a79Afc425BE5ae21"),
            outbox: address!("0x65f07C7D521164a4d5DaC6eB8Fac8DA067A3B78F"),
            sequencer_inbox: address!("0x6c97864CE4bEf387dE0b3310A44230f7E3F1be0D"),
            deployed_at: 4_139_226,
        }
    }
}

/// Rollup (child) chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollupChainConfig {
    /// Chain ID
    pub chain_id: u64,
    /// Core contracts on the parent chain
    pub contracts: RollupContracts,
}

/// Complete network configuration for one rollup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Which preset this configuration started from
    pub network_type: NetworkType,
    /// Parent chain configuration
    pub parent: ParentChainConfig,
    /// Rollup chain configuration
    pub rollup: RollupChainConfig,
}

impl NetworkConfig {
    pub const fn arbitrum_one() -> Self {
        Self {
            network_type: NetworkType::ArbitrumOne,
            parent: ParentChainConfig::mainnet(),
            rollup: RollupChainConfig {
                chain_id: 42161,
                contracts: RollupContracts::arbitrum_one(),
            },
        }
    }

    pub const fn nova() -> Self {
        Self {
            network_type: NetworkType::Nova,
            parent: ParentChainConfig::mainnet(),
            rollup: RollupChainConfig {
                chain_id: 42170,
                contracts: RollupContracts::nova(),
            },
        }
    }

    pub const fn arbitrum_sepolia() -> Self {
        Self {
            network_type: NetworkType::ArbitrumSepolia,
            parent: ParentChainConfig::sepolia(),
            rollup: RollupChainConfig {
                chain_id: 421614,
                contracts: RollupContracts::arbitrum_sepolia(),
            },
        }
    }

    /// Create configuration from network type.
    pub const fn from_network_type(network_type: NetworkType) -> Self {
        match network_type {
            NetworkType::ArbitrumOne => Self::arbitrum_one(),
            NetworkType::Nova => Self::nova(),
            NetworkType::ArbitrumSepolia => Self::arbitrum_sepolia(),
        }
    }

    /// Load a full network description (e.g. a local devnet) from TOML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;

        Ok(config)
    }

    /// Shorthand for the core contracts.
    pub const fn contracts(&self) -> &RollupContracts {
        &self.rollup.contracts
    }
}

/// Builder for custom network configurations (devnets, forks, L3s).
#[derive(Debug, Clone)]
pub struct NetworkConfigBuilder {
    config: NetworkConfig,
}

impl NetworkConfigBuilder {
    /// Start from a preset.
    pub const fn from_network_type(network_type: NetworkType) -> Self {
        Self {
            config: NetworkConfig::from_network_type(network_type),
        }
    }

    /// Start from an existing configuration, e.g. one loaded from a file.
    pub const fn from_config(config: NetworkConfig) -> Self {
        Self { config }
    }

    pub const fn bridge(mut self, address: Address) -> Self {
        self.config.rollup.contracts.bridge = address;
        self
    }

    pub const fn inbox(mut self, address: Address) -> Self {
        self.config.rollup.contracts.inbox = address;
        self
    }

    pub const fn outbox(mut self, address: Address) -> Self {
        self.config.rollup.contracts.outbox = address;
        self
    }

    pub const fn sequencer_inbox(mut self, address: Address) -> Self {
        self.config.rollup.contracts.sequencer_inbox = address;
        self
    }

    pub const fn deployed_at(mut self, block: u64) -> Self {
        self.config.rollup.contracts.deployed_at = block;
        self
    }

    pub const fn parent_chain_id(mut self, chain_id: u64) -> Self {
        self.config.parent.chain_id = chain_id;
        self
    }

    pub const fn rollup_chain_id(mut self, chain_id: u64) -> Self {
        self.config.rollup.chain_id = chain_id;
        self
    }

    pub const fn build(self) -> NetworkConfig {
        self.config
    }
}
