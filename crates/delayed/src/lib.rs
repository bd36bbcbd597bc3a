//! Delayed inbox: messages enqueued on the parent chain through the bridge
//! and later read into the rollup by the sequencer inbox.

pub mod hash;
pub mod reader;
pub mod types;

pub use reader::{assemble, check_chain, decode_from_origin_calldata, DelayedInboxReader};
pub use types::{DelayedMessage, MessageKind};
