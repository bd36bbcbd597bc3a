use crate::{chunk_ranges, DecodedLog, EventQuery, EventScanner};
use alloy_provider::Provider;
use alloy_sol_types::SolEvent;
use std::collections::VecDeque;

/// Pull-based iterator over historical logs.
///
/// Logs are fetched lazily, one chunk per request. When a request fails
/// (after retries) iteration stops and the failure is kept in
/// [`LogIterator::error`].
///
/// ```ignore
/// let mut logs = scanner.iter(query, from, to).await?;
/// while let Some(log) = logs.next().await {
///     handle(log);
/// }
/// if let Some(err) = logs.error() {
///     return Err(eyre::eyre!("scan aborted: {err}"));
/// }
/// ```
pub struct LogIterator<'a, P, E> {
    scanner: &'a EventScanner<P>,
    query: EventQuery<E>,
    chunks: VecDeque<(u64, u64)>,
    buffer: VecDeque<DecodedLog<E>>,
    error: Option<eyre::Report>,
    closed: bool,
}

impl<'a, P, E> LogIterator<'a, P, E>
where
    P: Provider,
    E: SolEvent,
{
    pub(crate) fn new(
        scanner: &'a EventScanner<P>,
        query: EventQuery<E>,
        from_block: u64,
        to_block: u64,
    ) -> Self {
        Self {
            scanner,
            query,
            chunks: chunk_ranges(from_block, to_block, scanner.chunk_size()).into(),
            buffer: VecDeque::new(),
            error: None,
            closed: false,
        }
    }

    /// Next log, or `None` once the range is exhausted, an error occurred or
    /// the iterator was closed.
    pub async fn next(&mut self) -> Option<DecodedLog<E>> {
        loop {
            if self.closed || self.error.is_some() {
                return None;
            }
            if let Some(log) = self.buffer.pop_front() {
                return Some(log);
            }

            let (from, to) = self.chunks.pop_front()?;
            match self
                .scanner
                .query_chunk_with_retry(&self.query, from, to)
                .await
            {
                Ok(logs) => self.buffer.extend(logs),
                Err(e) => self.error = Some(e),
            }
        }
    }

    /// The failure that ended iteration, if any.
    pub const fn error(&self) -> Option<&eyre::Report> {
        self.error.as_ref()
    }

    /// Stop iterating and drop any buffered logs.
    pub fn close(&mut self) {
        self.closed = true;
        self.chunks.clear();
        self.buffer.clear();
    }

    /// Chunks not fetched yet.
    pub fn remaining_chunks(&self) -> usize {
        self.chunks.len()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        test_utils::{mocked_provider, rpc_log, MockProvider},
        EventQuery, EventScanner,
    };
    use alloy_primitives::{address, B256, U256};
    use alloy_rpc_types_eth::BlockNumberOrTag;
    use binding::bridge::IBridge;

    fn query() -> EventQuery<IBridge::MessageDelivered> {
        EventQuery::new(address!("8315177aB297bA92A06054cE80a67Ed4DBd7ed3a"))
    }

    #[tokio::test]
    async fn test_iterator_is_chunked() {
        let scanner = EventScanner::new(MockProvider).with_chunk_size(100);

        let logs = scanner
            .iter(
                query(),
                BlockNumberOrTag::Number(1_000),
                BlockNumberOrTag::Number(1_250),
            )
            .await
            .unwrap();

        assert_eq!(logs.remaining_chunks(), 3);
        assert!(logs.error().is_none());
    }

    #[tokio::test]
    async fn test_closed_iterator_yields_nothing() {
        let scanner = EventScanner::new(MockProvider);

        let mut logs = scanner
            .iter(
                query(),
                BlockNumberOrTag::Number(1),
                BlockNumberOrTag::Number(10),
            )
            .await
            .unwrap();
        logs.close();

        assert!(logs.next().await.is_none());
        assert!(logs.error().is_none());
        assert_eq!(logs.remaining_chunks(), 0);
    }

    #[tokio::test]
    async fn test_iter_rejects_inverted_range() {
        let scanner = EventScanner::new(MockProvider);

        let result = scanner
            .iter(
                query(),
                BlockNumberOrTag::Number(10),
                BlockNumberOrTag::Number(1),
            )
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_iterator_stops_on_error() {
        let (asserter, provider) = mocked_provider();
        let scanner = EventScanner::new(provider).with_chunk_size(100);
        let bridge = address!("8315177aB297bA92A06054cE80a67Ed4DBd7ed3a");

        let event = IBridge::MessageDelivered {
            messageIndex: U256::from(4),
            beforeInboxAcc: B256::ZERO,
            inbox: address!("4Dbd4fc535Ac27206064B68FfCf827b0A60BAB3f"),
            kind: 3,
            sender: address!("5CFFA347b0aE99cc01E5c01714cA5658e54a23D1"),
            messageDataHash: B256::ZERO,
            baseFeeL1: U256::ZERO,
            timestamp: 1_700_000_000,
        };
        asserter.push_success(&vec![rpc_log(bridge, &event, 1_050)]);
        for _ in 0..6 {
            asserter.push_failure_msg("backend unavailable");
        }

        let mut logs = scanner
            .iter(
                query(),
                BlockNumberOrTag::Number(1_000),
                BlockNumberOrTag::Number(1_250),
            )
            .await
            .unwrap();

        let first = logs.next().await.unwrap();
        assert_eq!(first.event.messageIndex, U256::from(4));
        assert!(logs.error().is_none());

        assert!(logs.next().await.is_none());
        let err = logs.error().unwrap();
        assert!(err.to_string().contains("backend unavailable"));
        // The third chunk is never requested
        assert_eq!(logs.remaining_chunks(), 1);
        assert!(logs.next().await.is_none());
    }
}
