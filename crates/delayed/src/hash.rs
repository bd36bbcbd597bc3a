use alloy_primitives::{keccak256, Address, FixedBytes, B256, U256};
use alloy_sol_types::SolValue;

/// Length of [`packed_message`]: 1 + 20 + 8 + 8 + 32 + 32 + 32.
pub const PACKED_MESSAGE_LENGTH: usize = 133;

/// `abi.encodePacked(kind, sender, blockNumber, timestamp, inboxSeqNum,
/// baseFeeL1, messageDataHash)`.
///
/// `u8` has no `SolValue` impl, so the kind goes in as `bytes1`, which packs
/// to the same single byte.
pub fn packed_message(
    kind: u8,
    sender: Address,
    block_number: u64,
    timestamp: u64,
    inbox_seq_num: U256,
    base_fee_l1: U256,
    message_data_hash: B256,
) -> Vec<u8> {
    (
        FixedBytes::<1>::from([kind]),
        sender,
        block_number,
        timestamp,
        inbox_seq_num,
        base_fee_l1,
        message_data_hash,
    )
        .abi_encode_packed()
}

/// Hash of a delayed inbox message as computed by the bridge.
pub fn message_hash(
    kind: u8,
    sender: Address,
    block_number: u64,
    timestamp: u64,
    inbox_seq_num: U256,
    base_fee_l1: U256,
    message_data_hash: B256,
) -> B256 {
    keccak256(packed_message(
        kind,
        sender,
        block_number,
        timestamp,
        inbox_seq_num,
        base_fee_l1,
        message_data_hash,
    ))
}

/// Next delayed inbox accumulator: `keccak256(prevAcc ‖ messageHash)`.
pub fn accumulate(prev_acc: B256, message_hash: B256) -> B256 {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(prev_acc.as_slice());
    buf[32..].copy_from_slice(message_hash.as_slice());
    keccak256(buf)
}
