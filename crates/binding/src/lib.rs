//! Contract bindings for the Arbitrum Nitro rollup contracts.
//!
//! This crate consolidates all Solidity contract interfaces used across the project:
//! - L1 bridge contracts (Bridge, Inbox, Outbox, SequencerInbox)
//! - The rollup's ownership interface (IOwnable)
//! - L2 precompiles used to follow L2→L1 messages (ArbSys, NodeInterface)
//!
//! All bindings are generated using alloy's `sol!` macro. Each binding exposes
//! its JSON ABI through `<Name>::abi::contract()`; creation bytecode is loaded
//! from compiled artifacts with [`artifact::ContractArtifact`].

pub mod artifact;
pub mod bridge;
pub mod inbox;
pub mod outbox;
pub mod precompile;
pub mod sequencer_inbox;

pub use artifact::{deploy, ArtifactError, ContractArtifact};
