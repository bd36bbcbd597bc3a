use crate::types::DelayedMessage;
use alloy_consensus::Transaction as _;
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_provider::Provider;
use alloy_rpc_types_eth::BlockNumberOrTag;
use alloy_sol_types::SolCall;
use binding::{bridge::IBridge, inbox::IInbox};
use events::{u256_topic, DecodedLog, EventQuery, EventScanner};
use eyre::{bail, eyre};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Reads delayed inbox messages from a bridge and its inboxes.
#[derive(Debug, Clone)]
pub struct DelayedInboxReader<P> {
    scanner: EventScanner<P>,
    bridge: Address,
}

impl<P> DelayedInboxReader<P>
where
    P: Provider,
{
    pub const fn new(provider: P, bridge: Address) -> Self {
        Self {
            scanner: EventScanner::new(provider),
            bridge,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.scanner = self.scanner.with_chunk_size(chunk_size);
        self
    }

    pub const fn bridge(&self) -> Address {
        self.bridge
    }

    /// Number of messages ever enqueued in the delayed inbox.
    pub async fn message_count(&self) -> eyre::Result<u64> {
        let bridge = IBridge::new(self.bridge, self.scanner.provider());
        let count = bridge.delayedMessageCount().call().await?;
        to_u64(count, "delayedMessageCount")
    }

    /// Accumulator after message `index` was appended.
    pub async fn accumulator(&self, index: u64) -> eyre::Result<B256> {
        let bridge = IBridge::new(self.bridge, self.scanner.provider());
        let acc = bridge.delayedInboxAccs(U256::from(index)).call().await?;
        Ok(acc)
    }

    /// All delayed messages delivered between `from` and `to`, sorted by
    /// index, with payloads recovered and checked against the bridge's
    /// commitments.
    pub async fn lookup_messages(
        &self,
        from: BlockNumberOrTag,
        to: BlockNumberOrTag,
    ) -> eyre::Result<Vec<DelayedMessage>> {
        let query = EventQuery::<IBridge::MessageDelivered>::new(self.bridge);
        let deliveries = self.scanner.query(&query, from, to).await?;

        if deliveries.is_empty() {
            debug!("No delayed messages found in range");
            return Ok(vec![]);
        }

        let (min_block, max_block) = block_span(&deliveries)?;

        let mut by_inbox: BTreeMap<Address, Vec<U256>> = BTreeMap::new();
        for delivery in &deliveries {
            by_inbox
                .entry(delivery.event.inbox)
                .or_default()
                .push(delivery.event.messageIndex);
        }

        let mut data = HashMap::new();
        for (inbox, indices) in by_inbox {
            debug!(
                inbox = %inbox,
                count = indices.len(),
                "Fetching delayed message payloads"
            );
            let payloads = self
                .message_data(inbox, indices, min_block, max_block)
                .await?;
            data.extend(payloads);
        }

        let mut messages = Vec::with_capacity(deliveries.len());
        for delivery in &deliveries {
            let index = to_u64(delivery.event.messageIndex, "messageIndex")?;
            let Some(payload) = data.remove(&index) else {
                bail!("No data event found for delayed message {}", index);
            };
            messages.push(assemble(delivery, payload)?);
        }

        messages.sort_by_key(|m| m.index);
        check_chain(&messages)?;

        debug!(
            count = messages.len(),
            first = messages.first().map(|m| m.index),
            last = messages.last().map(|m| m.index),
            "Loaded delayed messages"
        );

        Ok(messages)
    }

    /// Check that the last message's accumulator is the one stored on the
    /// bridge.
    pub async fn verify_against_bridge(&self, messages: &[DelayedMessage]) -> eyre::Result<()> {
        let Some(last) = messages.last() else {
            return Ok(());
        };

        let expected = self.accumulator(last.index).await?;
        let computed = last.after_inbox_acc();
        if expected != computed {
            bail!(
                "Delayed inbox accumulator mismatch at {}: bridge has {}, computed {}",
                last.index,
                expected,
                computed
            );
        }

        Ok(())
    }

    /// Payloads of `indices` posted through `inbox`, keyed by message index.
    async fn message_data(
        &self,
        inbox: Address,
        indices: Vec<U256>,
        from_block: u64,
        to_block: u64,
    ) -> eyre::Result<HashMap<u64, Bytes>> {
        let topics: Vec<B256> = indices.into_iter().map(u256_topic).collect();
        let mut data = HashMap::new();

        let delivered =
            EventQuery::<IInbox::InboxMessageDelivered>::new(inbox).topic1(topics.clone());
        for log in self
            .scanner
            .query_range(&delivered, from_block, to_block)
            .await?
        {
            let index = to_u64(log.event.messageNum, "messageNum")?;
            data.insert(index, log.event.data);
        }

        let from_origin =
            EventQuery::<IInbox::InboxMessageDeliveredFromOrigin>::new(inbox).topic1(topics);
        for log in self
            .scanner
            .query_range(&from_origin, from_block, to_block)
            .await?
        {
            let index = to_u64(log.event.messageNum, "messageNum")?;
            let Some(tx_hash) = log.transaction_hash() else {
                bail!("Log for delayed message {} has no transaction hash", index);
            };
            data.insert(index, self.from_origin_data(tx_hash).await?);
        }

        Ok(data)
    }

    /// Recover the payload of a `sendL2MessageFromOrigin` call from its
    /// transaction input.
    async fn from_origin_data(&self, tx_hash: B256) -> eyre::Result<Bytes> {
        let tx = self
            .scanner
            .provider()
            .get_transaction_by_hash(tx_hash)
            .await?
            .ok_or_else(|| eyre!("Transaction {} not found", tx_hash))?;

        decode_from_origin_calldata(tx.input())
    }
}

/// Extract `messageData` from `sendL2MessageFromOrigin` calldata.
pub fn decode_from_origin_calldata(input: &[u8]) -> eyre::Result<Bytes> {
    let call = IInbox::sendL2MessageFromOriginCall::abi_decode(input)
        .map_err(|e| eyre!("Not a sendL2MessageFromOrigin call: {}", e))?;
    Ok(call.messageData)
}

/// Build a message from its bridge event and recovered payload.
pub fn assemble(
    delivery: &DecodedLog<IBridge::MessageDelivered>,
    data: Bytes,
) -> eyre::Result<DelayedMessage> {
    let event = &delivery.event;
    let index = to_u64(event.messageIndex, "messageIndex")?;

    let Some(block_number) = delivery.block_number() else {
        bail!("Log for delayed message {} has no block number", index);
    };

    let data_hash = keccak256(&data);
    if data_hash != event.messageDataHash {
        warn!(
            index,
            computed = %data_hash,
            expected = %event.messageDataHash,
            "Delayed message data hash mismatch"
        );
        bail!(
            "Data hash mismatch for delayed message {}: event has {}, data hashes to {}",
            index,
            event.messageDataHash,
            data_hash
        );
    }

    Ok(DelayedMessage {
        index,
        before_inbox_acc: event.beforeInboxAcc,
        inbox: event.inbox,
        kind: event.kind,
        sender: event.sender,
        block_number,
        timestamp: event.timestamp,
        base_fee_l1: event.baseFeeL1,
        data_hash: event.messageDataHash,
        data,
        tx_hash: delivery.transaction_hash(),
    })
}

/// Check that sorted, consecutive messages chain through their accumulators.
pub fn check_chain(messages: &[DelayedMessage]) -> eyre::Result<()> {
    for pair in messages.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.index != prev.index + 1 {
            bail!(
                "Delayed messages are not contiguous: {} followed by {}",
                prev.index,
                next.index
            );
        }
        let after = prev.after_inbox_acc();
        if next.before_inbox_acc != after {
            bail!(
                "Delayed message {} does not chain: before acc {}, previous after acc {}",
                next.index,
                next.before_inbox_acc,
                after
            );
        }
    }

    Ok(())
}

fn block_span<E>(logs: &[DecodedLog<E>]) -> eyre::Result<(u64, u64)> {
    let mut blocks = logs.iter().map(|log| {
        log.block_number()
            .ok_or_else(|| eyre!("Log without block number"))
    });

    let first = blocks.next().ok_or_else(|| eyre!("No logs"))??;
    blocks.try_fold((first, first), |(min, max), block| {
        let block = block?;
        Ok((min.min(block), max.max(block)))
    })
}

fn to_u64(value: U256, what: &str) -> eyre::Result<u64> {
    u64::try_from(value).map_err(|_| eyre!("{} does not fit in u64: {}", what, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        test_utils::{deposit_message, mocked_provider, rpc_transaction},
        MessageKind,
    };
    use alloy_primitives::{address, Log as PrimitiveLog};
    use alloy_rpc_types_eth::Log;
    use alloy_sol_types::SolEvent;

    const BRIDGE: Address = address!("8315177aB297bA92A06054cE80a67Ed4DBd7ed3a");

    fn inbox_log<E: SolEvent>(message: &DelayedMessage, event: &E) -> Log {
        Log {
            inner: PrimitiveLog {
                address: message.inbox,
                data: event.encode_log_data(),
            },
            block_number: Some(message.block_number),
            transaction_hash: message.tx_hash,
            ..Default::default()
        }
    }

    /// The deposit at 1000 followed by an L2 message posted from origin.
    fn two_messages() -> (DelayedMessage, DelayedMessage) {
        let mut deposit = deposit_message();
        deposit.tx_hash = Some(B256::repeat_byte(0x01));

        let data = Bytes::from_static(&[0x04, 0xaa, 0xbb]);
        let from_origin = DelayedMessage {
            index: deposit.index + 1,
            before_inbox_acc: deposit.after_inbox_acc(),
            inbox: deposit.inbox,
            kind: MessageKind::L2Message.as_u8(),
            sender: address!("a4b1e63Cb4901E327597bc35d36FE8a23e4C253f"),
            block_number: deposit.block_number + 1,
            timestamp: deposit.timestamp + 12,
            base_fee_l1: deposit.base_fee_l1,
            data_hash: keccak256(&data),
            data,
            tx_hash: Some(B256::repeat_byte(0x02)),
        };

        (deposit, from_origin)
    }

    fn delivery_for(message: &DelayedMessage) -> DecodedLog<IBridge::MessageDelivered> {
        let event = IBridge::MessageDelivered {
            messageIndex: U256::from(message.index),
            beforeInboxAcc: message.before_inbox_acc,
            inbox: message.inbox,
            kind: message.kind,
            sender: message.sender,
            messageDataHash: message.data_hash,
            baseFeeL1: message.base_fee_l1,
            timestamp: message.timestamp,
        };
        let log = Log {
            inner: PrimitiveLog {
                address: BRIDGE,
                data: event.encode_log_data(),
            },
            block_number: Some(message.block_number),
            transaction_hash: Some(message.tx_hash.unwrap_or(B256::repeat_byte(0x01))),
            ..Default::default()
        };
        DecodedLog { event, log }
    }

    #[test]
    fn test_assemble() {
        let expected = deposit_message();
        let delivery = delivery_for(&expected);

        let message = assemble(&delivery, expected.data.clone()).unwrap();
        assert_eq!(message.index, 1_000);
        assert_eq!(message.block_number, 18_000_000);
        assert_eq!(message.tx_hash, Some(B256::repeat_byte(0x01)));
        assert_eq!(message.after_inbox_acc(), expected.after_inbox_acc());
    }

    #[test]
    fn test_assemble_rejects_wrong_data() {
        let expected = deposit_message();
        let delivery = delivery_for(&expected);

        let err = assemble(&delivery, Bytes::from_static(b"other")).unwrap_err();
        assert!(err.to_string().contains("Data hash mismatch"));
    }

    #[test]
    fn test_assemble_requires_block_number() {
        let expected = deposit_message();
        let mut delivery = delivery_for(&expected);
        delivery.log.block_number = None;

        assert!(assemble(&delivery, expected.data).is_err());
    }

    #[test]
    fn test_check_chain() {
        let first = deposit_message();
        let mut second = deposit_message();
        second.index = first.index + 1;
        second.before_inbox_acc = first.after_inbox_acc();

        assert!(check_chain(&[first.clone(), second.clone()]).is_ok());
        assert!(check_chain(&[]).is_ok());

        let mut broken = second.clone();
        broken.before_inbox_acc = B256::ZERO;
        let err = check_chain(&[first.clone(), broken]).unwrap_err();
        assert!(err.to_string().contains("does not chain"));

        let mut gap = second;
        gap.index += 1;
        let err = check_chain(&[first, gap]).unwrap_err();
        assert!(err.to_string().contains("not contiguous"));
    }

    #[test]
    fn test_decode_from_origin_calldata() {
        let payload = Bytes::from_static(&[0x04, 0xaa, 0xbb]);
        let call = IInbox::sendL2MessageFromOriginCall {
            messageData: payload.clone(),
        };

        let decoded = decode_from_origin_calldata(&call.abi_encode()).unwrap();
        assert_eq!(decoded, payload);

        let other = IInbox::sendL2MessageCall {
            messageData: payload,
        };
        assert!(decode_from_origin_calldata(&other.abi_encode()).is_err());
    }

    #[test]
    fn test_block_span() {
        let mut first = delivery_for(&deposit_message());
        first.log.block_number = Some(50);
        let mut second = first.clone();
        second.log.block_number = Some(20);
        let mut third = first.clone();
        third.log.block_number = Some(70);

        assert_eq!(block_span(&[first, second, third]).unwrap(), (20, 70));
        assert!(block_span::<IBridge::MessageDelivered>(&[]).is_err());
    }

    #[test]
    fn test_to_u64_overflow() {
        assert_eq!(to_u64(U256::from(7), "x").unwrap(), 7);
        assert!(to_u64(U256::MAX, "x").is_err());
    }

    #[tokio::test]
    async fn test_lookup_messages_recovers_payloads() {
        let (deposit, from_origin) = two_messages();
        let (asserter, provider) = mocked_provider();

        // Bridge deliveries, newest first
        asserter.push_success(&vec![
            delivery_for(&from_origin).log,
            delivery_for(&deposit).log,
        ]);
        // InboxMessageDelivered carries the deposit payload
        asserter.push_success(&vec![inbox_log(
            &deposit,
            &IInbox::InboxMessageDelivered {
                messageNum: U256::from(deposit.index),
                data: deposit.data.clone(),
            },
        )]);
        // The from-origin payload lives in the transaction input
        asserter.push_success(&vec![inbox_log(
            &from_origin,
            &IInbox::InboxMessageDeliveredFromOrigin {
                messageNum: U256::from(from_origin.index),
            },
        )]);
        let call = IInbox::sendL2MessageFromOriginCall {
            messageData: from_origin.data.clone(),
        };
        asserter.push_success(&rpc_transaction(
            from_origin.tx_hash.unwrap(),
            from_origin.sender,
            from_origin.inbox,
            &call.abi_encode(),
        ));
        // delayedInboxAccs(1001)
        asserter.push_success(&Bytes::copy_from_slice(
            from_origin.after_inbox_acc().as_slice(),
        ));

        let reader = DelayedInboxReader::new(provider, BRIDGE);
        let messages = reader
            .lookup_messages(
                BlockNumberOrTag::Number(18_000_000),
                BlockNumberOrTag::Number(18_000_010),
            )
            .await
            .unwrap();

        assert_eq!(messages, vec![deposit, from_origin]);
        reader.verify_against_bridge(&messages).await.unwrap();
    }

    #[tokio::test]
    async fn test_lookup_messages_missing_payload() {
        let (deposit, _) = two_messages();
        let (asserter, provider) = mocked_provider();

        asserter.push_success(&vec![delivery_for(&deposit).log]);
        asserter.push_success(&Vec::<Log>::new());
        asserter.push_success(&Vec::<Log>::new());

        let reader = DelayedInboxReader::new(provider, BRIDGE);
        let err = reader
            .lookup_messages(
                BlockNumberOrTag::Number(18_000_000),
                BlockNumberOrTag::Number(18_000_010),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No data event found for delayed message 1000"));
    }

    #[tokio::test]
    async fn test_verify_against_bridge_mismatch() {
        let (asserter, provider) = mocked_provider();
        asserter.push_success(&Bytes::copy_from_slice(B256::repeat_byte(0x99).as_slice()));

        let reader = DelayedInboxReader::new(provider, BRIDGE);
        let err = reader
            .verify_against_bridge(&[deposit_message()])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("accumulator mismatch at 1000"));

        // Nothing to check, no request made
        reader.verify_against_bridge(&[]).await.unwrap();
    }
}
