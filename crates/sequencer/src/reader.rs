use crate::{
    calldata::decode_batch_calldata,
    types::{blob_hashes_payload, DataLocation, MaxTimeVariation, SequencerBatch},
};
use alloy_consensus::Transaction as _;
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_provider::Provider;
use alloy_rpc_types_eth::BlockNumberOrTag;
use binding::sequencer_inbox::ISequencerInbox;
use events::{u256_topic, DecodedLog, EventQuery, EventScanner};
use eyre::{bail, eyre};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Reads batches and parameters from a sequencer inbox.
#[derive(Debug, Clone)]
pub struct SequencerInboxReader<P> {
    scanner: EventScanner<P>,
    address: Address,
}

impl<P> SequencerInboxReader<P>
where
    P: Provider,
{
    pub const fn new(provider: P, address: Address) -> Self {
        Self {
            scanner: EventScanner::new(provider),
            address,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.scanner = self.scanner.with_chunk_size(chunk_size);
        self
    }

    pub const fn address(&self) -> Address {
        self.address
    }

    pub async fn batch_count(&self) -> eyre::Result<u64> {
        let inbox = ISequencerInbox::new(self.address, self.scanner.provider());
        let count = inbox.batchCount().call().await?;
        to_u64(count, "batchCount")
    }

    /// Sequencer accumulator after batch `index`.
    pub async fn accumulator(&self, index: u64) -> eyre::Result<B256> {
        let inbox = ISequencerInbox::new(self.address, self.scanner.provider());
        let acc = inbox.inboxAccs(U256::from(index)).call().await?;
        Ok(acc)
    }

    pub async fn total_delayed_messages_read(&self) -> eyre::Result<u64> {
        let inbox = ISequencerInbox::new(self.address, self.scanner.provider());
        let read = inbox.totalDelayedMessagesRead().call().await?;
        to_u64(read, "totalDelayedMessagesRead")
    }

    pub async fn max_time_variation(&self) -> eyre::Result<MaxTimeVariation> {
        let inbox = ISequencerInbox::new(self.address, self.scanner.provider());
        let variation = inbox.maxTimeVariation().call().await?;

        Ok(MaxTimeVariation {
            delay_blocks: to_u64(variation.delayBlocks, "delayBlocks")?,
            future_blocks: to_u64(variation.futureBlocks, "futureBlocks")?,
            delay_seconds: to_u64(variation.delaySeconds, "delaySeconds")?,
            future_seconds: to_u64(variation.futureSeconds, "futureSeconds")?,
        })
    }

    pub async fn is_batch_poster(&self, account: Address) -> eyre::Result<bool> {
        let inbox = ISequencerInbox::new(self.address, self.scanner.provider());
        let is_poster = inbox.isBatchPoster(account).call().await?;
        Ok(is_poster)
    }

    /// All batches posted between `from` and `to`, sorted by sequence
    /// number, with payloads resolved and accumulators checked.
    pub async fn lookup_batches(
        &self,
        from: BlockNumberOrTag,
        to: BlockNumberOrTag,
    ) -> eyre::Result<Vec<SequencerBatch>> {
        let query = EventQuery::<ISequencerInbox::SequencerBatchDelivered>::new(self.address);
        let deliveries = self.scanner.query(&query, from, to).await?;

        if deliveries.is_empty() {
            debug!("No batches found in range");
            return Ok(vec![]);
        }

        let mut batches = deliveries
            .iter()
            .map(batch_from_event)
            .collect::<eyre::Result<Vec<_>>>()?;
        batches.sort_by_key(|b| b.sequence_number);

        self.resolve_separate_event_data(&mut batches).await?;

        for batch in &mut batches {
            match batch.data_location {
                DataLocation::TxInput => {
                    let tx_hash = batch_tx_hash(batch)?;
                    let input = self.transaction_input(tx_hash).await?;
                    batch.data = Some(decode_batch_calldata(&input)?);
                }
                DataLocation::NoData => batch.data = Some(Bytes::new()),
                DataLocation::Blob => {
                    let tx_hash = batch_tx_hash(batch)?;
                    let hashes = self.blob_hashes(tx_hash).await?;
                    if hashes.is_empty() {
                        warn!(
                            sequence_number = batch.sequence_number,
                            tx_hash = %tx_hash,
                            "Blob batch transaction carries no blob hashes"
                        );
                    }
                    batch.data = Some(blob_hashes_payload(&hashes));
                }
                DataLocation::SeparateBatchEvent => {}
            }
        }

        check_chain(&batches)?;
        for batch in &batches {
            verify_after_acc(batch)?;
        }

        debug!(
            count = batches.len(),
            first = batches.first().map(|b| b.sequence_number),
            last = batches.last().map(|b| b.sequence_number),
            "Loaded sequencer batches"
        );

        Ok(batches)
    }

    /// Fill payloads of batches posted with a `SequencerBatchData` event.
    async fn resolve_separate_event_data(
        &self,
        batches: &mut [SequencerBatch],
    ) -> eyre::Result<()> {
        let pending: Vec<&SequencerBatch> = batches
            .iter()
            .filter(|b| b.data_location == DataLocation::SeparateBatchEvent)
            .collect();

        let (Some(min_block), Some(max_block)) = (
            pending.iter().map(|b| b.block_number).min(),
            pending.iter().map(|b| b.block_number).max(),
        ) else {
            return Ok(());
        };

        let topics: Vec<B256> = pending
            .iter()
            .map(|b| u256_topic(U256::from(b.sequence_number)))
            .collect();
        let query =
            EventQuery::<ISequencerInbox::SequencerBatchData>::new(self.address).topic1(topics);

        let mut data = HashMap::new();
        for log in self
            .scanner
            .query_range(&query, min_block, max_block)
            .await?
        {
            let sequence_number = to_u64(log.event.batchSequenceNumber, "batchSequenceNumber")?;
            data.insert(sequence_number, log.event.data);
        }

        for batch in batches
            .iter_mut()
            .filter(|b| b.data_location == DataLocation::SeparateBatchEvent)
        {
            let Some(payload) = data.remove(&batch.sequence_number) else {
                bail!(
                    "No SequencerBatchData event found for batch {}",
                    batch.sequence_number
                );
            };
            batch.data = Some(payload);
        }

        Ok(())
    }

    async fn transaction_input(&self, tx_hash: B256) -> eyre::Result<Bytes> {
        let tx = self
            .scanner
            .provider()
            .get_transaction_by_hash(tx_hash)
            .await?
            .ok_or_else(|| eyre!("Transaction {} not found", tx_hash))?;
        Ok(tx.input().clone())
    }

    async fn blob_hashes(&self, tx_hash: B256) -> eyre::Result<Vec<B256>> {
        let tx = self
            .scanner
            .provider()
            .get_transaction_by_hash(tx_hash)
            .await?
            .ok_or_else(|| eyre!("Transaction {} not found", tx_hash))?;
        Ok(tx
            .blob_versioned_hashes()
            .map(|hashes| hashes.to_vec())
            .unwrap_or_default())
    }
}

/// Build a batch (payload unresolved) from its delivery event.
pub fn batch_from_event(
    log: &DecodedLog<ISequencerInbox::SequencerBatchDelivered>,
) -> eyre::Result<SequencerBatch> {
    let event = &log.event;
    let sequence_number = to_u64(event.batchSequenceNumber, "batchSequenceNumber")?;

    let Some(block_number) = log.block_number() else {
        bail!("Log for batch {} has no block number", sequence_number);
    };

    Ok(SequencerBatch {
        sequence_number,
        before_acc: event.beforeAcc,
        after_acc: event.afterAcc,
        delayed_acc: event.delayedAcc,
        after_delayed_count: to_u64(event.afterDelayedMessagesRead, "afterDelayedMessagesRead")?,
        time_bounds: event.timeBounds.clone().into(),
        data_location: event.dataLocation.try_into()?,
        block_number,
        tx_hash: log.transaction_hash(),
        data: None,
    })
}

/// Check that sorted batches are consecutive and chain through their
/// accumulators.
pub fn check_chain(batches: &[SequencerBatch]) -> eyre::Result<()> {
    for pair in batches.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.sequence_number != prev.sequence_number + 1 {
            bail!(
                "Batches are not contiguous: {} followed by {}",
                prev.sequence_number,
                next.sequence_number
            );
        }
        if next.before_acc != prev.after_acc {
            bail!(
                "Batch {} does not chain: before acc {}, previous after acc {}",
                next.sequence_number,
                next.before_acc,
                prev.after_acc
            );
        }
        if next.after_delayed_count < prev.after_delayed_count {
            bail!(
                "Batch {} reads fewer delayed messages ({}) than batch {} ({})",
                next.sequence_number,
                next.after_delayed_count,
                prev.sequence_number,
                prev.after_delayed_count
            );
        }
    }

    Ok(())
}

/// Recompute the accumulator from the resolved payload.
pub fn verify_after_acc(batch: &SequencerBatch) -> eyre::Result<()> {
    let computed = batch.compute_after_acc()?;
    if computed != batch.after_acc {
        bail!(
            "Accumulator mismatch for batch {}: event has {}, computed {}",
            batch.sequence_number,
            batch.after_acc,
            computed
        );
    }
    Ok(())
}

fn batch_tx_hash(batch: &SequencerBatch) -> eyre::Result<B256> {
    batch
        .tx_hash
        .ok_or_else(|| eyre!("Log for batch {} has no transaction hash", batch.sequence_number))
}

fn to_u64(value: U256, what: &str) -> eyre::Result<u64> {
    u64::try_from(value).map_err(|_| eyre!("{} does not fit in u64: {}", what, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{batch, mocked_provider, rpc_transaction};
    use alloy_primitives::Log as PrimitiveLog;
    use alloy_rpc_types_eth::Log;
    use alloy_sol_types::{SolCall, SolEvent};

    const INBOX: Address = Address::repeat_byte(0x5e);

    const fn binding_location(location: DataLocation) -> ISequencerInbox::BatchDataLocation {
        match location {
            DataLocation::TxInput => ISequencerInbox::BatchDataLocation::TxInput,
            DataLocation::SeparateBatchEvent => {
                ISequencerInbox::BatchDataLocation::SeparateBatchEvent
            }
            DataLocation::NoData => ISequencerInbox::BatchDataLocation::NoData,
            DataLocation::Blob => ISequencerInbox::BatchDataLocation::Blob,
        }
    }

    fn delivered_log(
        batch: &SequencerBatch,
    ) -> DecodedLog<ISequencerInbox::SequencerBatchDelivered> {
        let event = ISequencerInbox::SequencerBatchDelivered {
            batchSequenceNumber: U256::from(batch.sequence_number),
            beforeAcc: batch.before_acc,
            afterAcc: batch.after_acc,
            delayedAcc: batch.delayed_acc,
            afterDelayedMessagesRead: U256::from(batch.after_delayed_count),
            timeBounds: ISequencerInbox::TimeBounds {
                minTimestamp: batch.time_bounds.min_timestamp,
                maxTimestamp: batch.time_bounds.max_timestamp,
                minBlockNumber: batch.time_bounds.min_block_number,
                maxBlockNumber: batch.time_bounds.max_block_number,
            },
            dataLocation: binding_location(batch.data_location),
        };
        let log = Log {
            inner: PrimitiveLog {
                address: INBOX,
                data: event.encode_log_data(),
            },
            block_number: Some(batch.block_number),
            transaction_hash: Some(batch.tx_hash.unwrap_or(B256::repeat_byte(0x0a))),
            ..Default::default()
        };
        DecodedLog { event, log }
    }

    /// Batches whose accumulators were computed the way the inbox does.
    fn chained(count: u64) -> Vec<SequencerBatch> {
        let mut batches = Vec::new();
        let mut before = B256::ZERO;
        for i in 0..count {
            let mut next = batch(100 + i, Some(Bytes::from(vec![0x00, i as u8])));
            next.before_acc = before;
            next.after_acc = next.compute_after_acc().unwrap();
            before = next.after_acc;
            batches.push(next);
        }
        batches
    }

    #[test]
    fn test_batch_from_event() {
        let expected = batch(7, None);
        let log = delivered_log(&expected);

        let parsed = batch_from_event(&log).unwrap();
        assert_eq!(parsed.sequence_number, 7);
        assert_eq!(parsed.time_bounds, expected.time_bounds);
        assert_eq!(parsed.after_delayed_count, expected.after_delayed_count);
        assert_eq!(parsed.data_location, DataLocation::SeparateBatchEvent);
        assert_eq!(parsed.tx_hash, Some(B256::repeat_byte(0x0a)));
        assert!(parsed.data.is_none());
    }

    #[test]
    fn test_chain_and_acc() {
        let batches = chained(3);

        assert!(check_chain(&batches).is_ok());
        for batch in &batches {
            assert!(verify_after_acc(batch).is_ok());
        }
    }

    #[test]
    fn test_broken_chain() {
        let mut batches = chained(2);
        batches[1].before_acc = B256::repeat_byte(0xff);

        let err = check_chain(&batches).unwrap_err();
        assert!(err.to_string().contains("does not chain"));
    }

    #[test]
    fn test_gap_in_sequence() {
        let mut batches = chained(3);
        batches.remove(1);

        let err = check_chain(&batches).unwrap_err();
        assert!(err.to_string().contains("not contiguous"));
    }

    #[test]
    fn test_tampered_payload() {
        let mut batches = chained(1);
        batches[0].data = Some(Bytes::from_static(&[0x00, 0xff, 0xff]));

        let err = verify_after_acc(&batches[0]).unwrap_err();
        assert!(err.to_string().contains("Accumulator mismatch"));
    }

    /// One batch per data location, chained from `B256::ZERO`.
    fn posted_batches(blob_hashes: &[B256]) -> Vec<SequencerBatch> {
        let payloads = [
            (DataLocation::SeparateBatchEvent, Bytes::from_static(&[0x00, 0x01])),
            (DataLocation::TxInput, Bytes::from_static(&[0x00, 0x02, 0x03])),
            (DataLocation::Blob, blob_hashes_payload(blob_hashes)),
            (DataLocation::NoData, Bytes::new()),
        ];

        let mut before = B256::ZERO;
        payloads
            .into_iter()
            .enumerate()
            .map(|(i, (location, data))| {
                let i = i as u64;
                let mut next = batch(10 + i, Some(data));
                next.data_location = location;
                next.block_number = 200 + i;
                next.tx_hash = Some(B256::with_last_byte(0xa0 + i as u8));
                next.before_acc = before;
                next.after_acc = next.compute_after_acc().unwrap();
                before = next.after_acc;
                next
            })
            .collect()
    }

    fn batch_data_log(batch: &SequencerBatch) -> Log {
        let event = ISequencerInbox::SequencerBatchData {
            batchSequenceNumber: U256::from(batch.sequence_number),
            data: batch.data.clone().unwrap(),
        };
        Log {
            inner: PrimitiveLog {
                address: INBOX,
                data: event.encode_log_data(),
            },
            block_number: Some(batch.block_number),
            transaction_hash: batch.tx_hash,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_lookup_batches_resolves_every_location() {
        let blob_hashes = [B256::repeat_byte(0x01), B256::repeat_byte(0x02)];
        let expected = posted_batches(&blob_hashes);
        let (asserter, provider) = mocked_provider();

        // Deliveries, returned out of order
        let mut delivered: Vec<Log> = expected.iter().map(|b| delivered_log(b).log).collect();
        delivered.reverse();
        asserter.push_success(&delivered);
        // SequencerBatchData for the separate-event batch
        asserter.push_success(&vec![batch_data_log(&expected[0])]);
        // Calldata of the TxInput batch
        let call = ISequencerInbox::addSequencerL2BatchFromOriginCall {
            sequenceNumber: U256::from(11),
            data: expected[1].data.clone().unwrap(),
            afterDelayedMessagesRead: U256::from(1_000),
            gasRefunder: Address::ZERO,
            prevMessageCount: U256::from(40),
            newMessageCount: U256::from(45),
        };
        asserter.push_success(&rpc_transaction(
            expected[1].tx_hash.unwrap(),
            INBOX,
            &call.abi_encode(),
            &[],
        ));
        // Blob batch transaction
        asserter.push_success(&rpc_transaction(
            expected[2].tx_hash.unwrap(),
            INBOX,
            &[],
            &blob_hashes,
        ));

        let reader = SequencerInboxReader::new(provider, INBOX);
        let batches = reader
            .lookup_batches(BlockNumberOrTag::Number(200), BlockNumberOrTag::Number(210))
            .await
            .unwrap();

        assert_eq!(batches, expected);
        assert_eq!(batches[2].data.as_ref().unwrap()[0], crate::BLOB_HASHES_HEADER_FLAG);
        assert_eq!(batches[3].data, Some(Bytes::new()));
    }

    #[tokio::test]
    async fn test_lookup_batches_missing_separate_data() {
        let expected = posted_batches(&[B256::repeat_byte(0x01)]);
        let (asserter, provider) = mocked_provider();

        asserter.push_success(&vec![delivered_log(&expected[0]).log]);
        asserter.push_success(&Vec::<Log>::new());

        let reader = SequencerInboxReader::new(provider, INBOX);
        let err = reader
            .lookup_batches(BlockNumberOrTag::Number(200), BlockNumberOrTag::Number(210))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No SequencerBatchData event"));
    }

    #[tokio::test]
    async fn test_lookup_batches_rejects_tampered_calldata() {
        let expected = posted_batches(&[B256::repeat_byte(0x01)]);
        let (asserter, provider) = mocked_provider();

        asserter.push_success(&vec![delivered_log(&expected[1]).log]);
        let call = ISequencerInbox::addSequencerL2BatchFromOriginCall {
            sequenceNumber: U256::from(11),
            data: Bytes::from_static(&[0x00, 0xff]),
            afterDelayedMessagesRead: U256::from(1_000),
            gasRefunder: Address::ZERO,
            prevMessageCount: U256::from(40),
            newMessageCount: U256::from(45),
        };
        asserter.push_success(&rpc_transaction(
            expected[1].tx_hash.unwrap(),
            INBOX,
            &call.abi_encode(),
            &[],
        ));

        let reader = SequencerInboxReader::new(provider, INBOX);
        let err = reader
            .lookup_batches(BlockNumberOrTag::Number(200), BlockNumberOrTag::Number(210))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Accumulator mismatch"));
    }
}
