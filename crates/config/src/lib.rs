//! Configuration types for the bridge tooling.
//!
//! This crate provides:
//! - Network presets for known Arbitrum rollups
//! - Core contract addresses on the parent chain
//! - A builder for custom deployments

pub mod network;

pub use network::{
    ConfigError, NetworkConfig, NetworkConfigBuilder, NetworkType, ParentChainConfig,
    RollupChainConfig, RollupContracts,
};
