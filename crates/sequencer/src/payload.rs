//! Batch payload formats, told apart by the first payload byte.
//!
//! | byte          | payload                                   |
//! |---------------|-------------------------------------------|
//! | `0x00`        | brotli-compressed L2 message segments     |
//! | `0x50`        | blob versioned hashes (EIP-4844)          |
//! | `0x80`        | DAS certificate                           |
//! | `0x88`        | DAS certificate over a tree of chunks     |

use alloy_primitives::Bytes;
use eyre::{bail, eyre};
use std::io::{Read, Write};

/// Header byte of a brotli-compressed payload.
pub const BROTLI_MESSAGE_HEADER_BYTE: u8 = 0x00;

/// Header bit marking a data availability certificate.
pub const DAS_MESSAGE_HEADER_FLAG: u8 = 0x80;

/// Header bit marking a tree-hashed DAS certificate (with the DAS bit).
pub const TREE_DAS_MESSAGE_HEADER_FLAG: u8 = 0x08;

/// Largest decompressed batch accepted.
pub const MAX_DECOMPRESSED_LEN: usize = 16 * 1024 * 1024;

/// Brotli quality used by the batch poster.
pub const LEVEL_WELL: u32 = 11;

const BROTLI_WINDOW_BITS: u32 = 22;
const BROTLI_BUFFER_SIZE: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// No payload, as with force-included batches
    Empty,
    Brotli,
    BlobHashes,
    Das,
    TreeDas,
    Unknown(u8),
}

impl PayloadKind {
    pub const fn classify(payload: &[u8]) -> Self {
        let Some(&header) = payload.first() else {
            return Self::Empty;
        };

        if header == BROTLI_MESSAGE_HEADER_BYTE {
            Self::Brotli
        } else if header == crate::types::BLOB_HASHES_HEADER_FLAG {
            Self::BlobHashes
        } else if header & DAS_MESSAGE_HEADER_FLAG != 0 {
            if header & TREE_DAS_MESSAGE_HEADER_FLAG != 0 {
                Self::TreeDas
            } else {
                Self::Das
            }
        } else {
            Self::Unknown(header)
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Empty => "Empty",
            Self::Brotli => "Brotli",
            Self::BlobHashes => "BlobHashes",
            Self::Das => "Das",
            Self::TreeDas => "TreeDas",
            Self::Unknown(_) => "Unknown",
        }
    }
}

/// Decompress a brotli stream, failing if it inflates past `max_len` bytes.
pub fn decompress(compressed: &[u8], max_len: usize) -> eyre::Result<Bytes> {
    let mut decoder = brotli::Decompressor::new(compressed, BROTLI_BUFFER_SIZE);
    let mut out = Vec::new();
    (&mut decoder)
        .take(max_len as u64 + 1)
        .read_to_end(&mut out)
        .map_err(|e| eyre!("Invalid brotli stream: {}", e))?;

    if out.len() > max_len {
        bail!("Decompressed batch exceeds {} bytes", max_len);
    }

    Ok(out.into())
}

/// Compress `input` at brotli `quality`.
pub fn compress(input: &[u8], quality: u32) -> eyre::Result<Bytes> {
    let mut writer =
        brotli::CompressorWriter::new(Vec::new(), BROTLI_BUFFER_SIZE, quality, BROTLI_WINDOW_BITS);
    writer.write_all(input)?;
    writer.flush()?;
    Ok(writer.into_inner().into())
}

/// Compress the way the batch poster does before posting.
pub fn compress_well(input: &[u8]) -> eyre::Result<Bytes> {
    compress(input, LEVEL_WELL)
}

/// Payload of a brotli batch with the header byte stripped and inflated.
pub fn decompress_batch_payload(payload: &[u8]) -> eyre::Result<Bytes> {
    match PayloadKind::classify(payload) {
        PayloadKind::Brotli => decompress(&payload[1..], MAX_DECOMPRESSED_LEN),
        other => bail!("Not a brotli batch payload: {:?}", other),
    }
}
