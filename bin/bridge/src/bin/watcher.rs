//! Follows delayed messages and sequencer batches as they are posted and
//! exports bridge counters to Prometheus.

use alloy_provider::DynProvider;
use binding::{bridge::IBridge, sequencer_inbox::ISequencerInbox};
use bridge::{
    bridge_status,
    config::Config,
    metrics::{install_prometheus_exporter, Metrics},
};
use clap::Parser;
use config::NetworkConfig;
use delayed::MessageKind;
use events::{EventQuery, EventScanner, Subscription};
use sequencer::DataLocation;
use std::time::Instant;
use tokio::time;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "watcher")]
#[command(about = "Watch an Arbitrum rollup bridge and export metrics")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

async fn refresh(
    l1_provider: &DynProvider,
    l2_provider: &DynProvider,
    network: &NetworkConfig,
    config: &Config,
    metrics: &Metrics,
) {
    let start = Instant::now();
    match bridge_status(l1_provider.clone(), l2_provider.clone(), network, &config.scan).await {
        Ok(status) => {
            metrics.record_refresh(&status, start.elapsed());
            info!(
                delayed_messages = status.delayed_message_count,
                delayed_pending = status.pending_delayed_messages(),
                batches = status.batch_count,
                send_count = status.send_count,
                "Refreshed bridge status"
            );
        }
        Err(e) => {
            metrics.record_refresh_failure();
            error!(error = %e, "Failed to refresh bridge status");
        }
    }
}

fn on_delayed_message(
    item: eyre::Result<events::DecodedLog<IBridge::MessageDelivered>>,
    metrics: &Metrics,
) -> eyre::Result<()> {
    let log = item?;
    let kind = MessageKind::from_u8(log.event.kind).map_or("Unknown", MessageKind::name);
    metrics.record_delayed_message(kind);

    info!(
        index = %log.event.messageIndex,
        kind,
        sender = %log.event.sender,
        block_number = ?log.block_number(),
        "Delayed message delivered"
    );

    Ok(())
}

fn on_batch(
    item: eyre::Result<events::DecodedLog<ISequencerInbox::SequencerBatchDelivered>>,
    metrics: &Metrics,
) -> eyre::Result<()> {
    let log = item?;
    let location = DataLocation::try_from(log.event.dataLocation)?;
    metrics.record_batch(&format!("{:?}", location));

    info!(
        sequence_number = %log.event.batchSequenceNumber,
        ?location,
        delayed_read = %log.event.afterDelayedMessagesRead,
        block_number = ?log.block_number(),
        "Sequencer batch delivered"
    );

    Ok(())
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if cli.log_json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("Starting watcher");

    let config = Config::from_file(&cli.config)?;
    let network = config.network_config()?;
    let contracts = network.contracts();

    install_prometheus_exporter(config.metrics_port)?;
    let metrics = Metrics::new();
    info!(port = config.metrics_port, "Metrics exporter listening");

    let l1_provider = client::create_provider(&config.l1_rpc_url).await?;
    let l2_provider = client::create_provider(&config.l2_rpc_url).await?;

    let scanner = EventScanner::new(l1_provider.clone()).with_chunk_size(config.scan.chunk_size);
    let options = config.scan.watch_options();

    let mut delayed: Subscription<IBridge::MessageDelivered> = scanner
        .watch(EventQuery::new(contracts.bridge), None, options)
        .await?;
    let mut batches: Subscription<ISequencerInbox::SequencerBatchDelivered> = scanner
        .watch(EventQuery::new(contracts.sequencer_inbox), None, options)
        .await?;

    let mut interval = time::interval(config.scan.poll_interval());

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                refresh(&l1_provider, &l2_provider, &network, &config, &metrics).await;
            }
            item = delayed.next() => {
                let Some(item) = item else {
                    eyre::bail!("Delayed message subscription closed");
                };
                if let Err(e) = on_delayed_message(item, &metrics) {
                    metrics.record_subscription_error("delayed");
                    return Err(e.wrap_err("Delayed message subscription failed"));
                }
            }
            item = batches.next() => {
                let Some(item) = item else {
                    eyre::bail!("Batch subscription closed");
                };
                if let Err(e) = on_batch(item, &metrics) {
                    metrics.record_subscription_error("batches");
                    return Err(e.wrap_err("Batch subscription failed"));
                }
            }
            _ = &mut shutdown => {
                warn!("Received shutdown signal");
                break;
            }
        }
    }

    delayed.close();
    batches.close();

    Ok(())
}
