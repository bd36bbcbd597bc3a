use crate::{DecodedLog, EventQuery, EventScanner};
use alloy_provider::Provider;
use alloy_sol_types::SolEvent;
use std::time::Duration;
use tokio::{sync::mpsc, task::JoinHandle, time};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
pub struct WatchOptions {
    /// Delay between head polls
    pub poll_interval: Duration,
    /// Blocks a log must be buried under before it is delivered
    pub confirmations: u64,
    /// Logs buffered before the poller waits on the consumer
    pub channel_capacity: usize,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(12),
            confirmations: 0,
            channel_capacity: 1024,
        }
    }
}

/// Live stream of decoded logs.
///
/// A background task polls the head and forwards new logs in block order.
/// The first RPC failure is delivered as an `Err` item and ends the stream.
/// Dropping the subscription stops the task.
#[derive(Debug)]
pub struct Subscription<E> {
    receiver: mpsc::Receiver<eyre::Result<DecodedLog<E>>>,
    handle: Option<JoinHandle<()>>,
}

impl<E> Subscription<E> {
    pub(crate) const fn new(
        receiver: mpsc::Receiver<eyre::Result<DecodedLog<E>>>,
        handle: Option<JoinHandle<()>>,
    ) -> Self {
        Self { receiver, handle }
    }

    /// Wait for the next log. `None` once the stream has ended or was closed.
    pub async fn next(&mut self) -> Option<eyre::Result<DecodedLog<E>>> {
        self.receiver.recv().await
    }

    /// Stop the polling task. Logs already buffered are discarded.
    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.receiver.close();
        while self.receiver.try_recv().is_ok() {}
    }
}

impl<E> Drop for Subscription<E> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

pub(crate) fn spawn<P, E>(
    scanner: EventScanner<P>,
    query: EventQuery<E>,
    start: u64,
    options: WatchOptions,
) -> Subscription<E>
where
    P: Provider + Clone + 'static,
    E: SolEvent + Send + Sync + 'static,
{
    let (sender, receiver) = mpsc::channel(options.channel_capacity.max(1));
    let handle = tokio::spawn(poll_logs(scanner, query, start, options, sender));

    Subscription::new(receiver, Some(handle))
}

async fn poll_logs<P, E>(
    scanner: EventScanner<P>,
    query: EventQuery<E>,
    start: u64,
    options: WatchOptions,
    sender: mpsc::Sender<eyre::Result<DecodedLog<E>>>,
) where
    P: Provider + Clone + 'static,
    E: SolEvent + Send + Sync + 'static,
{
    let mut next_block = start;
    let mut interval = time::interval(options.poll_interval);

    loop {
        interval.tick().await;

        let head = match scanner.provider().get_block_number().await {
            Ok(head) => head,
            Err(e) => {
                warn!(error = %e, "Failed to fetch head, closing subscription");
                let _ = sender.send(Err(e.into())).await;
                return;
            }
        };

        let safe_head = head.saturating_sub(options.confirmations);
        if safe_head < next_block {
            continue;
        }

        debug!(from = next_block, to = safe_head, "Polling new logs");

        let logs = match scanner.query_range(&query, next_block, safe_head).await {
            Ok(logs) => logs,
            Err(e) => {
                warn!(
                    from = next_block,
                    to = safe_head,
                    error = %e,
                    "Log poll failed, closing subscription"
                );
                let _ = sender.send(Err(e)).await;
                return;
            }
        };

        for log in logs {
            if sender.send(Ok(log)).await.is_err() {
                // Receiver gone.
                return;
            }
        }

        next_block = safe_head + 1;
    }
}
