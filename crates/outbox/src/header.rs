//! Arbitrum-specific fields packed into standard block header slots.
//!
//! - `extraData[0..32]`: send root (root of the L2->L1 send tree)
//! - `mixHash[0..8]`: send count (leaves in the send tree)
//! - `mixHash[8..16]`: parent chain block number
//! - `mixHash[16..24]`: ArbOS version

use alloy_primitives::B256;
use eyre::bail;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArbHeaderInfo {
    pub send_root: B256,
    pub send_count: u64,
    pub l1_block_number: u64,
    pub arbos_version: u64,
}

impl ArbHeaderInfo {
    pub fn from_header(extra_data: &[u8], mix_hash: B256) -> eyre::Result<Self> {
        if extra_data.len() != 32 {
            bail!(
                "Unexpected extra data length {} (not an Arbitrum header?)",
                extra_data.len()
            );
        }

        Ok(Self {
            send_root: B256::from_slice(extra_data),
            send_count: read_u64(&mix_hash, 0),
            l1_block_number: read_u64(&mix_hash, 8),
            arbos_version: read_u64(&mix_hash, 16),
        })
    }
}

fn read_u64(word: &B256, offset: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&word[offset..offset + 8]);
    u64::from_be_bytes(buf)
}
