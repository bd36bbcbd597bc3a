use crate::payload::{decompress_batch_payload, PayloadKind};
use alloy_primitives::{keccak256, Bytes, B256};
use binding::sequencer_inbox::ISequencerInbox;
use eyre::bail;

/// Length of the batch header preceding the payload.
pub const HEADER_LENGTH: usize = 40;

/// First payload byte of a batch whose data lives in EIP-4844 blobs.
pub const BLOB_HASHES_HEADER_FLAG: u8 = 0x50;

/// Parent chain window a batch is valid in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeBounds {
    pub min_timestamp: u64,
    pub max_timestamp: u64,
    pub min_block_number: u64,
    pub max_block_number: u64,
}

impl From<ISequencerInbox::TimeBounds> for TimeBounds {
    fn from(bounds: ISequencerInbox::TimeBounds) -> Self {
        Self {
            min_timestamp: bounds.minTimestamp,
            max_timestamp: bounds.maxTimestamp,
            min_block_number: bounds.minBlockNumber,
            max_block_number: bounds.maxBlockNumber,
        }
    }
}

/// Where a batch's payload was posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataLocation {
    /// Calldata of the posting transaction
    TxInput,
    /// A `SequencerBatchData` event in the same transaction
    SeparateBatchEvent,
    /// No payload (e.g. force inclusion)
    NoData,
    /// EIP-4844 blobs of the posting transaction
    Blob,
}

impl TryFrom<ISequencerInbox::BatchDataLocation> for DataLocation {
    type Error = eyre::Report;

    fn try_from(location: ISequencerInbox::BatchDataLocation) -> Result<Self, Self::Error> {
        match location {
            ISequencerInbox::BatchDataLocation::TxInput => Ok(Self::TxInput),
            ISequencerInbox::BatchDataLocation::SeparateBatchEvent => Ok(Self::SeparateBatchEvent),
            ISequencerInbox::BatchDataLocation::NoData => Ok(Self::NoData),
            ISequencerInbox::BatchDataLocation::Blob => Ok(Self::Blob),
            other => bail!("Unknown batch data location: {:?}", other),
        }
    }
}

/// Limits on how far batches may lag behind or run ahead of the parent chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxTimeVariation {
    pub delay_blocks: u64,
    pub future_blocks: u64,
    pub delay_seconds: u64,
    pub future_seconds: u64,
}

/// A batch appended to the sequencer inbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencerBatch {
    pub sequence_number: u64,
    pub before_acc: B256,
    pub after_acc: B256,
    /// Delayed inbox accumulator at `after_delayed_count`
    pub delayed_acc: B256,
    /// Total delayed messages read once this batch is applied
    pub after_delayed_count: u64,
    pub time_bounds: TimeBounds,
    pub data_location: DataLocation,
    /// Parent chain block the batch was posted in
    pub block_number: u64,
    pub tx_hash: Option<B256>,
    /// Payload, `None` until resolved
    pub data: Option<Bytes>,
}

impl SequencerBatch {
    /// Big-endian `minTimestamp ‖ maxTimestamp ‖ minBlockNumber ‖
    /// maxBlockNumber ‖ afterDelayedMessagesRead`.
    pub fn header(&self) -> [u8; HEADER_LENGTH] {
        let mut header = [0u8; HEADER_LENGTH];
        let fields = [
            self.time_bounds.min_timestamp,
            self.time_bounds.max_timestamp,
            self.time_bounds.min_block_number,
            self.time_bounds.max_block_number,
            self.after_delayed_count,
        ];
        for (chunk, field) in header.chunks_exact_mut(8).zip(fields) {
            chunk.copy_from_slice(&field.to_be_bytes());
        }
        header
    }

    /// Header followed by the payload, as hashed into the accumulator.
    pub fn serialize(&self) -> eyre::Result<Bytes> {
        let Some(data) = &self.data else {
            bail!(
                "Data for batch {} ({:?}) has not been resolved",
                self.sequence_number,
                self.data_location
            );
        };

        let mut out = Vec::with_capacity(HEADER_LENGTH + data.len());
        out.extend_from_slice(&self.header());
        out.extend_from_slice(data);
        Ok(out.into())
    }

    /// Format of the resolved payload, `None` until resolved.
    pub fn payload_kind(&self) -> Option<PayloadKind> {
        self.data.as_ref().map(|data| PayloadKind::classify(data))
    }

    /// L2 message segments of a brotli batch.
    pub fn decompressed(&self) -> eyre::Result<Bytes> {
        let Some(data) = &self.data else {
            bail!("Data for batch {} has not been resolved", self.sequence_number);
        };
        decompress_batch_payload(data)
    }

    /// `keccak256(before_acc ‖ keccak256(serialize()) ‖ delayed_acc)`.
    pub fn compute_after_acc(&self) -> eyre::Result<B256> {
        let data_hash = keccak256(self.serialize()?);

        let mut buf = [0u8; 96];
        buf[..32].copy_from_slice(self.before_acc.as_slice());
        buf[32..64].copy_from_slice(data_hash.as_slice());
        buf[64..].copy_from_slice(self.delayed_acc.as_slice());
        Ok(keccak256(buf))
    }
}

/// Payload of a blob batch: the flag byte followed by the versioned hashes.
pub fn blob_hashes_payload(hashes: &[B256]) -> Bytes {
    let mut out = Vec::with_capacity(1 + hashes.len() * 32);
    out.push(BLOB_HASHES_HEADER_FLAG);
    for hash in hashes {
        out.extend_from_slice(hash.as_slice());
    }
    out.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::batch;
    use alloy_primitives::hex;

    #[test]
    fn test_header_layout() {
        let batch = batch(5, Some(Bytes::from_static(&[0x00, 0x01])));

        let header = batch.header();
        assert_eq!(
            header,
            hex!(
                "0000000065000000000000006500012c0000000001120a800000000001120a8a00000000000003e8"
            )
        );
    }

    #[test]
    fn test_serialize() {
        let batch = batch(5, Some(Bytes::from_static(&[0x00, 0xaa])));

        let serialized = batch.serialize().unwrap();
        assert_eq!(serialized.len(), HEADER_LENGTH + 2);
        assert_eq!(&serialized[..HEADER_LENGTH], &batch.header());
        assert_eq!(&serialized[HEADER_LENGTH..], &[0x00, 0xaa]);
    }

    #[test]
    fn test_serialize_unresolved() {
        let batch = batch(5, None);
        let err = batch.serialize().unwrap_err();
        assert!(err.to_string().contains("not been resolved"));
        assert!(batch.compute_after_acc().is_err());
    }

    #[test]
    fn test_compute_after_acc_depends_on_data() {
        let a = batch(5, Some(Bytes::from_static(&[0x00, 0x01])));
        let b = batch(5, Some(Bytes::from_static(&[0x00, 0x02])));

        assert_ne!(a.compute_after_acc().unwrap(), b.compute_after_acc().unwrap());
    }

    #[test]
    fn test_blob_hashes_payload() {
        let payload = blob_hashes_payload(&[B256::repeat_byte(0x01), B256::repeat_byte(0x02)]);

        assert_eq!(payload.len(), 65);
        assert_eq!(payload[0], BLOB_HASHES_HEADER_FLAG);
        assert_eq!(payload[1], 0x01);
        assert_eq!(payload[64], 0x02);
    }

    #[test]
    fn test_data_location_from_binding() {
        let location =
            DataLocation::try_from(ISequencerInbox::BatchDataLocation::SeparateBatchEvent).unwrap();
        assert_eq!(location, DataLocation::SeparateBatchEvent);

        let blob = DataLocation::try_from(ISequencerInbox::BatchDataLocation::Blob).unwrap();
        assert_eq!(blob, DataLocation::Blob);
    }

    #[test]
    fn test_payload_kind_and_decompress() {
        let segments = vec![0x03u8; 512];
        let mut payload = vec![0x00];
        payload.extend_from_slice(&crate::payload::compress_well(&segments).unwrap());

        let compressed = batch(6, Some(payload.into()));
        assert_eq!(compressed.payload_kind(), Some(PayloadKind::Brotli));
        assert_eq!(compressed.decompressed().unwrap().as_ref(), &segments[..]);

        let blob = batch(7, Some(blob_hashes_payload(&[B256::repeat_byte(0x01)])));
        assert_eq!(blob.payload_kind(), Some(PayloadKind::BlobHashes));
        assert!(blob.decompressed().is_err());

        assert_eq!(batch(8, None).payload_kind(), None);
        assert_eq!(batch(9, Some(Bytes::new())).payload_kind(), Some(PayloadKind::Empty));
    }
}
