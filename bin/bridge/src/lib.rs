pub mod config;
pub mod metrics;

use ::config::NetworkConfig;
use action::force_include::delay_elapsed;
use alloy_primitives::U256;
use alloy_provider::Provider;
use alloy_rpc_types_eth::BlockNumberOrTag;
use binding::{bridge::IBridge, inbox::IInbox};
use crate::config::ScanConfig;
use delayed::{DelayedInboxReader, DelayedMessage};
use outbox::{OutboxStateProvider, PendingMessage};
use sequencer::{MaxTimeVariation, SequencerBatch, SequencerInboxReader};
use tracing::{debug, info};

/// Snapshot of the bridge counters on both chains.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeStatus {
    pub delayed_message_count: u64,
    pub sequencer_message_count: u64,
    pub batch_count: u64,
    pub total_delayed_messages_read: u64,
    pub max_time_variation: Option<MaxTimeVariation>,
    pub inbox_paused: bool,
    /// Size of the latest confirmed send tree
    pub send_count: u64,
}

impl BridgeStatus {
    /// Delayed messages the sequencer has not read yet.
    pub const fn pending_delayed_messages(&self) -> u64 {
        self.delayed_message_count
            .saturating_sub(self.total_delayed_messages_read)
    }
}

/// First block of a scan when no explicit start was given.
pub const fn scan_start(head: u64, lookback: u64, deployed_at: u64) -> u64 {
    let start = head.saturating_sub(lookback);
    if start > deployed_at {
        start
    } else {
        deployed_at
    }
}

/// Block range for a scan from optional CLI bounds.
pub async fn scan_range<P>(
    provider: &P,
    scan: &ScanConfig,
    deployed_at: u64,
    from: Option<u64>,
    to: Option<u64>,
) -> eyre::Result<(BlockNumberOrTag, BlockNumberOrTag)>
where
    P: Provider,
{
    let to = to.map_or(BlockNumberOrTag::Latest, BlockNumberOrTag::Number);
    let from = match from {
        Some(block) => block,
        None => {
            let head = provider.get_block_number().await?;
            scan_start(head, scan.lookback_blocks, deployed_at)
        }
    };

    Ok((BlockNumberOrTag::Number(from), to))
}

fn to_u64(value: U256, name: &str) -> eyre::Result<u64> {
    u64::try_from(value).map_err(|_| eyre::eyre!("{} does not fit in u64: {}", name, value))
}

pub async fn bridge_status<P1, P2>(
    l1_provider: P1,
    l2_provider: P2,
    network: &NetworkConfig,
    scan: &ScanConfig,
) -> eyre::Result<BridgeStatus>
where
    P1: Provider + Clone,
    P2: Provider + Clone,
{
    let contracts = network.contracts();

    let bridge = IBridge::new(contracts.bridge, &l1_provider);
    let delayed_message_count = to_u64(
        bridge.delayedMessageCount().call().await?,
        "delayedMessageCount",
    )?;
    let sequencer_message_count = to_u64(
        bridge.sequencerMessageCount().call().await?,
        "sequencerMessageCount",
    )?;

    let sequencer = SequencerInboxReader::new(l1_provider.clone(), contracts.sequencer_inbox);
    let batch_count = sequencer.batch_count().await?;
    let total_delayed_messages_read = sequencer.total_delayed_messages_read().await?;
    let max_time_variation = sequencer.max_time_variation().await?;

    let inbox = IInbox::new(contracts.inbox, &l1_provider);
    let inbox_paused = inbox.paused().call().await?;

    let outbox = OutboxStateProvider::new(l1_provider.clone(), l2_provider, contracts.outbox);
    let send_count = outbox.latest_send_count(scan.lookback_blocks).await?;

    let status = BridgeStatus {
        delayed_message_count,
        sequencer_message_count,
        batch_count,
        total_delayed_messages_read,
        max_time_variation: Some(max_time_variation),
        inbox_paused,
        send_count,
    };

    debug!(?status, "Fetched bridge status");

    Ok(status)
}

/// Delayed messages delivered between `from` and `to`, checked against the
/// bridge accumulator.
pub async fn scan_delayed<P>(
    l1_provider: P,
    network: &NetworkConfig,
    scan: &ScanConfig,
    from: BlockNumberOrTag,
    to: BlockNumberOrTag,
) -> eyre::Result<Vec<DelayedMessage>>
where
    P: Provider + Clone,
{
    let reader = DelayedInboxReader::new(l1_provider, network.contracts().bridge)
        .with_chunk_size(scan.chunk_size);

    let messages = reader.lookup_messages(from, to).await?;
    reader.verify_against_bridge(&messages).await?;

    info!(count = messages.len(), "Scanned delayed messages");

    Ok(messages)
}

pub async fn scan_batches<P>(
    l1_provider: P,
    network: &NetworkConfig,
    scan: &ScanConfig,
    from: BlockNumberOrTag,
    to: BlockNumberOrTag,
) -> eyre::Result<Vec<SequencerBatch>>
where
    P: Provider + Clone,
{
    let reader = SequencerInboxReader::new(l1_provider, network.contracts().sequencer_inbox)
        .with_chunk_size(scan.chunk_size);

    let batches = reader.lookup_batches(from, to).await?;

    info!(count = batches.len(), "Scanned sequencer batches");

    Ok(batches)
}

/// Unexecuted L2->L1 messages sent between L2 blocks `from` and `to`.
pub async fn scan_outbox<P1, P2>(
    l1_provider: P1,
    l2_provider: P2,
    network: &NetworkConfig,
    scan: &ScanConfig,
    from: BlockNumberOrTag,
    to: BlockNumberOrTag,
) -> eyre::Result<Vec<PendingMessage>>
where
    P1: Provider + Clone,
    P2: Provider + Clone,
{
    let state = OutboxStateProvider::new(l1_provider, l2_provider, network.contracts().outbox)
        .with_chunk_size(scan.chunk_size);

    let pending = state
        .get_pending_messages(from, to, scan.lookback_blocks)
        .await?;

    info!(count = pending.len(), "Scanned pending L2->L1 messages");

    Ok(pending)
}

/// Unread delayed messages old enough to be force-included at the given head.
pub fn select_force_inclusion(
    messages: &[DelayedMessage],
    total_delayed_messages_read: u64,
    variation: &MaxTimeVariation,
    head_number: u64,
    head_timestamp: u64,
) -> Vec<DelayedMessage> {
    messages
        .iter()
        .filter(|message| message.index >= total_delayed_messages_read)
        .filter(|message| {
            delay_elapsed(
                message.block_number,
                message.timestamp,
                variation,
                head_number,
                head_timestamp,
            )
        })
        .cloned()
        .collect()
}

/// Delayed messages within the lookback window that may be force-included
/// now. Force-including the last one includes all of them.
pub async fn force_inclusion_candidates<P>(
    l1_provider: P,
    network: &NetworkConfig,
    scan: &ScanConfig,
) -> eyre::Result<Vec<DelayedMessage>>
where
    P: Provider + Clone,
{
    let contracts = network.contracts();
    let sequencer = SequencerInboxReader::new(l1_provider.clone(), contracts.sequencer_inbox);
    let delayed = DelayedInboxReader::new(l1_provider.clone(), contracts.bridge);

    let total_read = sequencer.total_delayed_messages_read().await?;
    let count = delayed.message_count().await?;
    if total_read >= count {
        debug!(total_read, count, "All delayed messages already read");
        return Ok(vec![]);
    }

    let head = l1_provider
        .get_block_by_number(BlockNumberOrTag::Latest)
        .await?
        .ok_or_else(|| eyre::eyre!("Failed to get latest block"))?;
    let variation = sequencer.max_time_variation().await?;

    let from = scan_start(
        head.header.number,
        scan.lookback_blocks,
        contracts.deployed_at,
    );
    let messages = scan_delayed(
        l1_provider,
        network,
        scan,
        BlockNumberOrTag::Number(from),
        BlockNumberOrTag::Number(head.header.number),
    )
    .await?;

    let candidates = select_force_inclusion(
        &messages,
        total_read,
        &variation,
        head.header.number,
        head.header.timestamp,
    );

    info!(
        unread = count - total_read,
        candidates = candidates.len(),
        "Checked force inclusion candidates"
    );

    Ok(candidates)
}
