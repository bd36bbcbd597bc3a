use crate::{iter::LogIterator, watch, DecodedLog, EventQuery, Subscription, WatchOptions};
use alloy_provider::Provider;
use alloy_rpc_types_eth::BlockNumberOrTag;
use alloy_sol_types::SolEvent;
use std::time::Duration;
use tokio_retry::{strategy::ExponentialBackoff, Retry};
use tracing::{debug, warn};

/// Block span of a single `eth_getLogs` request.
///
/// Most public RPCs cap ranges at 10,000 blocks; the 500 block margin covers
/// load-balanced backends that disagree slightly about the head.
pub const DEFAULT_CHUNK_SIZE: u64 = 9_500;

/// Retries after a failed chunk request: 100ms, 200ms, 400ms, 800ms, 1.6s.
///
/// tokio-retry multiplies the current delay by the base on every step, so the
/// base has to be 2 with the unit carried by `factor`.
pub fn retry_delays() -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(2).factor(50).take(5)
}

/// Split the inclusive range `from..=to` into inclusive chunks of at most
/// `chunk_size` blocks.
pub fn chunk_ranges(from: u64, to: u64, chunk_size: u64) -> Vec<(u64, u64)> {
    let chunk_size = chunk_size.max(1);
    let mut ranges = Vec::new();
    let mut current = from;

    while current <= to {
        let chunk_end = current.saturating_add(chunk_size - 1).min(to);
        ranges.push((current, chunk_end));
        if chunk_end == u64::MAX {
            break;
        }
        current = chunk_end + 1;
    }

    ranges
}

/// Fetches and decodes logs through one provider.
#[derive(Debug, Clone)]
pub struct EventScanner<P> {
    provider: P,
    chunk_size: u64,
}

impl<P> EventScanner<P>
where
    P: Provider,
{
    pub const fn new(provider: P) -> Self {
        Self {
            provider,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub const fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = if chunk_size == 0 { 1 } else { chunk_size };
        self
    }

    pub const fn provider(&self) -> &P {
        &self.provider
    }

    pub const fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// Resolve BlockNumberOrTag to a concrete block number.
    pub async fn resolve_block_number(&self, block: BlockNumberOrTag) -> eyre::Result<u64> {
        match block {
            BlockNumberOrTag::Number(n) => Ok(n),
            BlockNumberOrTag::Earliest => Ok(0),
            BlockNumberOrTag::Latest => {
                let block_num = self.provider.get_block_number().await?;
                Ok(block_num)
            }
            _ => Err(eyre::eyre!("Unsupported block tag: {:?}", block)),
        }
    }

    /// All logs matching `query` between `from` and `to` (inclusive).
    ///
    /// Both endpoints are resolved before the first request, so a moving head
    /// cannot change the range halfway through the scan.
    pub async fn query<E: SolEvent>(
        &self,
        query: &EventQuery<E>,
        from: BlockNumberOrTag,
        to: BlockNumberOrTag,
    ) -> eyre::Result<Vec<DecodedLog<E>>> {
        let from_block = self.resolve_block_number(from).await?;
        let to_block = self.resolve_block_number(to).await?;

        if from_block > to_block {
            return Err(eyre::eyre!(
                "from_block ({}) must be <= to_block ({})",
                from_block,
                to_block
            ));
        }

        debug!(
            event = E::SIGNATURE,
            from = from_block,
            to = to_block,
            "Scanning for events (snapshot taken)"
        );

        self.query_range(query, from_block, to_block).await
    }

    /// Chunked scan over concrete block numbers.
    pub async fn query_range<E: SolEvent>(
        &self,
        query: &EventQuery<E>,
        from_block: u64,
        to_block: u64,
    ) -> eyre::Result<Vec<DecodedLog<E>>> {
        let mut all_logs = Vec::new();

        for (chunk_start, chunk_end) in chunk_ranges(from_block, to_block, self.chunk_size) {
            debug!(from = chunk_start, to = chunk_end, "Scanning chunk");

            let logs = self
                .query_chunk_with_retry(query, chunk_start, chunk_end)
                .await?;
            all_logs.extend(logs);
        }

        Ok(all_logs)
    }

    /// Scan a single chunk with retry and exponential backoff.
    pub(crate) async fn query_chunk_with_retry<E: SolEvent>(
        &self,
        query: &EventQuery<E>,
        from_block: u64,
        to_block: u64,
    ) -> eyre::Result<Vec<DecodedLog<E>>> {
        Retry::spawn(retry_delays(), || async {
            self.query_chunk(query, from_block, to_block)
                .await
                .map_err(|e| {
                    warn!(
                        from = from_block,
                        to = to_block,
                        error = %e,
                        "Chunk scan failed, will retry"
                    );
                    e
                })
        })
        .await
    }

    async fn query_chunk<E: SolEvent>(
        &self,
        query: &EventQuery<E>,
        from_block: u64,
        to_block: u64,
    ) -> eyre::Result<Vec<DecodedLog<E>>> {
        let filter = query.filter(from_block, to_block);
        let logs = self.provider.get_logs(&filter).await?;

        let mut decoded = Vec::with_capacity(logs.len());
        for log in logs {
            if log.removed {
                continue;
            }
            let event = E::decode_log(&log.inner)
                .map_err(|e| {
                    eyre::eyre!(
                        "Failed to decode {} at block {:?}: {}",
                        E::SIGNATURE,
                        log.block_number,
                        e
                    )
                })?
                .data;
            decoded.push(DecodedLog { event, log });
        }

        Ok(decoded)
    }

    /// Lazy iterator over the logs in `from..=to`, fetched one chunk at a time.
    pub async fn iter<E: SolEvent>(
        &self,
        query: EventQuery<E>,
        from: BlockNumberOrTag,
        to: BlockNumberOrTag,
    ) -> eyre::Result<LogIterator<'_, P, E>> {
        let from_block = self.resolve_block_number(from).await?;
        let to_block = self.resolve_block_number(to).await?;

        if from_block > to_block {
            return Err(eyre::eyre!(
                "from_block ({}) must be <= to_block ({})",
                from_block,
                to_block
            ));
        }

        Ok(LogIterator::new(self, query, from_block, to_block))
    }
}

impl<P> EventScanner<P>
where
    P: Provider + Clone + 'static,
{
    /// Stream new logs matching `query` as blocks are produced.
    ///
    /// Starts at `from` (the current head when `None`) and only delivers logs
    /// that are at least `options.confirmations` blocks deep.
    pub async fn watch<E>(
        &self,
        query: EventQuery<E>,
        from: Option<BlockNumberOrTag>,
        options: WatchOptions,
    ) -> eyre::Result<Subscription<E>>
    where
        E: SolEvent + Send + Sync + 'static,
    {
        let start = match from {
            Some(block) => self.resolve_block_number(block).await?,
            None => self
                .provider
                .get_block_number()
                .await?
                .saturating_sub(options.confirmations),
        };

        debug!(event = E::SIGNATURE, from = start, "Starting subscription");

        Ok(watch::spawn(self.clone(), query, start, options))
    }
}
