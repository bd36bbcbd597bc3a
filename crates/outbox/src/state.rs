use crate::{
    header::ArbHeaderInfo,
    types::{ExecutedMessage, L2ToL1Message, MessageStatus, OutboxProof, PendingMessage},
};
use alloy_primitives::{Address, B256, U256};
use alloy_provider::Provider;
use alloy_rpc_types_eth::BlockNumberOrTag;
use binding::{
    outbox::IOutbox,
    precompile::{IArbSys, INodeInterface, ARB_SYS_ADDRESS, NODE_INTERFACE_ADDRESS},
};
use events::{EventQuery, EventScanner};
use eyre::eyre;
use tracing::debug;

/// Tracks L2->L1 messages across the child chain (ArbSys, NodeInterface) and
/// the parent chain (Outbox).
#[derive(Debug, Clone)]
pub struct OutboxStateProvider<P1, P2> {
    l1: EventScanner<P1>,
    l2: EventScanner<P2>,
    outbox: Address,
}

impl<P1, P2> OutboxStateProvider<P1, P2>
where
    P1: Provider,
    P2: Provider,
{
    pub const fn new(l1_provider: P1, l2_provider: P2, outbox: Address) -> Self {
        Self {
            l1: EventScanner::new(l1_provider),
            l2: EventScanner::new(l2_provider),
            outbox,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.l1 = self.l1.with_chunk_size(chunk_size);
        self.l2 = self.l2.with_chunk_size(chunk_size);
        self
    }

    pub const fn outbox(&self) -> Address {
        self.outbox
    }

    /// Whether the message at `position` has been executed.
    pub async fn is_spent(&self, position: u64) -> eyre::Result<bool> {
        let outbox = IOutbox::new(self.outbox, self.l1.provider());
        let spent = outbox.isSpent(U256::from(position)).call().await?;
        Ok(spent)
    }

    /// L2 block hash recorded for a confirmed send root, `None` if unknown.
    pub async fn root(&self, send_root: B256) -> eyre::Result<Option<B256>> {
        let outbox = IOutbox::new(self.outbox, self.l1.provider());
        let block_hash = outbox.roots(send_root).call().await?;
        Ok((block_hash != B256::ZERO).then_some(block_hash))
    }

    /// Header info of the L2 block behind the latest `SendRootUpdated` in the
    /// last `lookback` parent chain blocks.
    pub async fn latest_confirmed_header(
        &self,
        lookback: u64,
    ) -> eyre::Result<Option<ArbHeaderInfo>> {
        let head = self.l1.provider().get_block_number().await?;
        let from = head.saturating_sub(lookback);

        let query = EventQuery::<IOutbox::SendRootUpdated>::new(self.outbox);
        let updates = self.l1.query_range(&query, from, head).await?;

        let Some(latest) = updates.last() else {
            debug!(from, to = head, "No send root updates in lookback window");
            return Ok(None);
        };

        let block_hash = latest.event.l2BlockHash;
        let block = self
            .l2
            .provider()
            .get_block_by_hash(block_hash)
            .await?
            .ok_or_else(|| eyre!("L2 block {} not found", block_hash))?;

        let info = ArbHeaderInfo::from_header(&block.header.extra_data, block.header.mix_hash)?;
        if info.send_root != latest.event.outputRoot {
            return Err(eyre!(
                "Send root mismatch for L2 block {}: header has {}, outbox has {}",
                block_hash,
                info.send_root,
                latest.event.outputRoot
            ));
        }

        debug!(
            l2_block_hash = %block_hash,
            send_count = info.send_count,
            l1_block = ?latest.block_number(),
            "Found latest confirmed send root"
        );

        Ok(Some(info))
    }

    /// Size of the latest confirmed send tree, 0 if no root was posted within
    /// `lookback` blocks.
    pub async fn latest_send_count(&self, lookback: u64) -> eyre::Result<u64> {
        let info = self.latest_confirmed_header(lookback).await?;
        Ok(info.map_or(0, |info| info.send_count))
    }

    pub async fn message_status(
        &self,
        message: &L2ToL1Message,
        send_count: u64,
    ) -> eyre::Result<MessageStatus> {
        let spent = self.is_spent(message.position).await?;
        Ok(MessageStatus::classify(spent, message.position, send_count))
    }

    /// Messages sent on L2 between `from` and `to` that have not been
    /// executed yet.
    pub async fn get_pending_messages(
        &self,
        from: BlockNumberOrTag,
        to: BlockNumberOrTag,
        lookback: u64,
    ) -> eyre::Result<Vec<PendingMessage>> {
        let send_count = self.latest_send_count(lookback).await?;

        let query = EventQuery::<IArbSys::L2ToL1Tx>::new(ARB_SYS_ADDRESS);
        let logs = self.l2.query(&query, from, to).await?;

        let mut pending = Vec::new();
        for log in &logs {
            let message = L2ToL1Message::from_log(log)?;
            let status = self.message_status(&message, send_count).await?;

            if status == MessageStatus::Executed {
                continue;
            }

            pending.push(PendingMessage { message, status });
        }

        debug!(
            scanned = logs.len(),
            pending = pending.len(),
            send_count,
            "Scanned L2->L1 messages"
        );

        Ok(pending)
    }

    /// Messages executed on the parent chain between `from` and `to`.
    pub async fn executed_messages(
        &self,
        from: BlockNumberOrTag,
        to: BlockNumberOrTag,
    ) -> eyre::Result<Vec<ExecutedMessage>> {
        let query = EventQuery::<IOutbox::OutBoxTransactionExecuted>::new(self.outbox);
        let logs = self.l1.query(&query, from, to).await?;

        logs.iter().map(ExecutedMessage::from_log).collect()
    }

    /// Merkle proof for `leaf` in the send tree of `size` leaves.
    pub async fn construct_proof(&self, size: u64, leaf: u64) -> eyre::Result<OutboxProof> {
        if leaf >= size {
            return Err(eyre!("Leaf {} is outside a send tree of size {}", leaf, size));
        }

        let node_interface = INodeInterface::new(NODE_INTERFACE_ADDRESS, self.l2.provider());
        let result = node_interface.constructOutboxProof(size, leaf).call().await?;

        debug!(size, leaf, proof_len = result.proof.len(), "Constructed outbox proof");

        Ok(OutboxProof {
            send: result.send,
            root: result.root,
            proof: result.proof,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{l2_to_l1_log, mocked_provider, rpc_l2_block};
    use alloy_primitives::{address, Bytes, Log as PrimitiveLog, U64};
    use alloy_rpc_types_eth::Log;
    use alloy_sol_types::{SolEvent, SolValue};

    const OUTBOX: Address = address!("0B9857ae2D4A3DBe74ffE1d7DF045bb7F96E4840");

    fn send_root_updated(output_root: B256, l2_block_hash: B256) -> Log {
        let event = IOutbox::SendRootUpdated {
            outputRoot: output_root,
            l2BlockHash: l2_block_hash,
        };
        Log {
            inner: PrimitiveLog {
                address: OUTBOX,
                data: event.encode_log_data(),
            },
            block_number: Some(20_000_050),
            ..Default::default()
        }
    }

    fn abi_bool(value: bool) -> Bytes {
        value.abi_encode().into()
    }

    #[tokio::test]
    async fn test_pending_messages_skip_executed() {
        let (l1, l1_provider) = mocked_provider();
        let (l2, l2_provider) = mocked_provider();
        let send_root = B256::repeat_byte(0x5e);
        let l2_block_hash = B256::repeat_byte(0xb1);

        // Latest confirmed root covers 8 leaves
        l1.push_success(&U64::from(20_000_100));
        l1.push_success(&vec![send_root_updated(send_root, l2_block_hash)]);
        l2.push_success(&rpc_l2_block(l2_block_hash, send_root, 8));

        l2.push_success(&vec![
            l2_to_l1_log(4).log,
            l2_to_l1_log(5).log,
            l2_to_l1_log(9).log,
        ]);
        // isSpent(4), isSpent(5), isSpent(9)
        l1.push_success(&abi_bool(true));
        l1.push_success(&abi_bool(false));
        l1.push_success(&abi_bool(false));

        let state = OutboxStateProvider::new(l1_provider, l2_provider, OUTBOX);
        let pending = state
            .get_pending_messages(
                BlockNumberOrTag::Number(249_999_000),
                BlockNumberOrTag::Number(250_000_000),
                1_000,
            )
            .await
            .unwrap();

        let summary: Vec<(u64, MessageStatus)> = pending
            .iter()
            .map(|entry| (entry.message.position, entry.status))
            .collect();
        assert_eq!(
            summary,
            vec![(5, MessageStatus::Confirmed), (9, MessageStatus::Unconfirmed)]
        );
    }

    #[tokio::test]
    async fn test_send_root_mismatch() {
        let (l1, l1_provider) = mocked_provider();
        let (l2, l2_provider) = mocked_provider();
        let l2_block_hash = B256::repeat_byte(0xb1);

        l1.push_success(&U64::from(20_000_100));
        l1.push_success(&vec![send_root_updated(B256::repeat_byte(0x5e), l2_block_hash)]);
        l2.push_success(&rpc_l2_block(l2_block_hash, B256::repeat_byte(0x77), 8));

        let state = OutboxStateProvider::new(l1_provider, l2_provider, OUTBOX);
        let err = state.latest_send_count(1_000).await.unwrap_err();
        assert!(err.to_string().contains("Send root mismatch"));
    }

    #[tokio::test]
    async fn test_no_recent_send_root() {
        let (l1, l1_provider) = mocked_provider();
        let (_l2, l2_provider) = mocked_provider();

        l1.push_success(&U64::from(20_000_100));
        l1.push_success(&Vec::<Log>::new());

        let state = OutboxStateProvider::new(l1_provider, l2_provider, OUTBOX);
        assert_eq!(state.latest_send_count(1_000).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_root_unknown_is_none() {
        let (l1, l1_provider) = mocked_provider();
        let (_l2, l2_provider) = mocked_provider();

        l1.push_success(&Bytes::copy_from_slice(B256::ZERO.as_slice()));
        l1.push_success(&Bytes::copy_from_slice(B256::repeat_byte(0xb1).as_slice()));

        let state = OutboxStateProvider::new(l1_provider, l2_provider, OUTBOX);
        assert_eq!(state.root(B256::repeat_byte(0x01)).await.unwrap(), None);
        assert_eq!(
            state.root(B256::repeat_byte(0x02)).await.unwrap(),
            Some(B256::repeat_byte(0xb1))
        );
    }

    #[tokio::test]
    async fn test_construct_proof() {
        let (_l1, l1_provider) = mocked_provider();
        let (l2, l2_provider) = mocked_provider();

        let send = B256::repeat_byte(0x0a);
        let root = B256::repeat_byte(0x0b);
        let path = vec![B256::repeat_byte(0x01), B256::repeat_byte(0x02)];
        let encoded: Bytes = (send, root, path.clone()).abi_encode_params().into();
        l2.push_success(&encoded);

        let state = OutboxStateProvider::new(l1_provider, l2_provider, OUTBOX);
        let proof = state.construct_proof(8, 5).await.unwrap();
        assert_eq!(proof, OutboxProof { send, root, proof: path });

        let err = state.construct_proof(8, 8).await.unwrap_err();
        assert!(err.to_string().contains("outside a send tree of size 8"));
    }
}
