//! L2->L1 messages: discovery on the child chain, confirmation and
//! execution status on the parent chain, and outbox proofs.

pub mod header;
pub mod state;
pub mod types;

pub use header::ArbHeaderInfo;
pub use state::OutboxStateProvider;
pub use types::{ExecutedMessage, L2ToL1Message, MessageStatus, OutboxProof, PendingMessage};
