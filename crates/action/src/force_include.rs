//! Force inclusion of delayed messages the sequencer has not picked up.
//!
//! Anyone may call `forceInclusion` once a delayed message is older than both
//! `delayBlocks` and `delaySeconds` of the sequencer inbox's max time
//! variation. Every delayed message up to and including the given one is then
//! read into the rollup.

use crate::{submit, Action, SignerFn};
use alloy_primitives::{Address, U256};
use alloy_provider::Provider;
use alloy_rpc_types_eth::BlockNumberOrTag;
use binding::sequencer_inbox::ISequencerInbox;
use delayed::DelayedMessage;
use sequencer::{MaxTimeVariation, SequencerInboxReader};
use tracing::info;

#[derive(Debug, Clone)]
pub struct ForceInclude {
    pub sequencer_inbox: Address,
    pub from: Address,
    /// Last delayed message to include
    pub message: DelayedMessage,
}

pub struct ForceIncludeAction<P> {
    provider: P,
    signer: SignerFn,
    action: ForceInclude,
}

/// Whether a message delivered at (`block_number`, `timestamp`) may be
/// force-included at the given parent chain head.
pub const fn delay_elapsed(
    block_number: u64,
    timestamp: u64,
    variation: &MaxTimeVariation,
    head_number: u64,
    head_timestamp: u64,
) -> bool {
    block_number.saturating_add(variation.delay_blocks) < head_number
        && timestamp.saturating_add(variation.delay_seconds) < head_timestamp
}

/// `forceInclusion` call covering every delayed message up to `message`.
pub fn force_inclusion_call(message: &DelayedMessage) -> ISequencerInbox::forceInclusionCall {
    ISequencerInbox::forceInclusionCall {
        _totalDelayedMessagesRead: U256::from(message.index + 1),
        kind: message.kind,
        l1BlockAndTime: [message.block_number, message.timestamp],
        baseFeeL1: message.base_fee_l1,
        sender: message.sender,
        messageDataHash: message.data_hash,
    }
}

impl<P> ForceIncludeAction<P>
where
    P: Provider + Clone,
{
    pub fn new(provider: P, signer: SignerFn, action: ForceInclude) -> Self {
        Self {
            provider,
            signer,
            action,
        }
    }

    fn reader(&self) -> SequencerInboxReader<P> {
        SequencerInboxReader::new(self.provider.clone(), self.action.sequencer_inbox)
    }

    async fn head(&self) -> eyre::Result<(u64, u64)> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await?
            .ok_or_else(|| eyre::eyre!("Failed to get latest block"))?;
        Ok((block.header.number, block.header.timestamp))
    }
}

impl<P> Action for ForceIncludeAction<P>
where
    P: Provider + Clone,
{
    async fn is_ready(&self) -> eyre::Result<bool> {
        if self.is_completed().await? {
            return Ok(false);
        }

        let variation = self.reader().max_time_variation().await?;
        let (head_number, head_timestamp) = self.head().await?;

        Ok(delay_elapsed(
            self.action.message.block_number,
            self.action.message.timestamp,
            &variation,
            head_number,
            head_timestamp,
        ))
    }

    async fn is_completed(&self) -> eyre::Result<bool> {
        let read = self.reader().total_delayed_messages_read().await?;
        Ok(read > self.action.message.index)
    }

    async fn execute(&mut self) -> eyre::Result<crate::Result> {
        if self.is_completed().await? {
            eyre::bail!(
                "Delayed message {} already included",
                self.action.message.index
            )
        }

        if !self.is_ready().await? {
            eyre::bail!(
                "Delayed message {} is not old enough to force include",
                self.action.message.index
            )
        }

        info!(
            index = self.action.message.index,
            kind = self.action.message.kind,
            block_number = self.action.message.block_number,
            "Force including delayed messages"
        );

        let call = force_inclusion_call(&self.action.message);
        let inbox = ISequencerInbox::new(self.action.sequencer_inbox, &self.provider);
        let tx_request = inbox
            .forceInclusion(
                call._totalDelayedMessagesRead,
                call.kind,
                call.l1BlockAndTime,
                call.baseFeeL1,
                call.sender,
                call.messageDataHash,
            )
            .into_transaction_request()
            .from(self.action.from);

        let receipt = submit(&self.provider, &self.signer, tx_request, self.action.from).await?;

        info!(
            tx_hash = %receipt.transaction_hash,
            block_number = receipt.block_number,
            gas_used = receipt.gas_used,
            index = self.action.message.index,
            "Delayed messages force included"
        );

        Ok(crate::Result::from(&receipt))
    }

    fn description(&self) -> String {
        format!(
            "Force including delayed messages up to {} on {}",
            self.action.message.index, self.action.sequencer_inbox
        )
    }
}
