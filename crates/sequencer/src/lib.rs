//! Sequencer inbox: batches posted by the sequencer and the parameters that
//! govern force inclusion.

pub mod calldata;
pub mod payload;
pub mod reader;
pub mod types;

pub use calldata::decode_batch_calldata;
pub use payload::{decompress_batch_payload, PayloadKind};
pub use reader::{batch_from_event, check_chain, verify_after_acc, SequencerInboxReader};
pub use types::{
    blob_hashes_payload, DataLocation, MaxTimeVariation, SequencerBatch, TimeBounds,
    BLOB_HASHES_HEADER_FLAG, HEADER_LENGTH,
};
