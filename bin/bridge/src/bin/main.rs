//! CLI for reading and driving an Arbitrum rollup bridge.
//!
//! Read commands (`status`, `delayed`, `batches`, `outbox`) only need RPC
//! access. Transaction commands sign with a local key or a signer-proxy.

use action::{
    Action, DepositEth, DepositEthAction, Execute, ExecuteAction, ForceInclude,
    ForceIncludeAction, SendL2Message, SendL2MessageAction,
};
use alloy_primitives::{utils::parse_ether, Address, Bytes};
use alloy_provider::{DynProvider, Provider};
use binding::{
    bridge::IBridge, inbox::IInbox, outbox::IOutbox, sequencer_inbox::ISequencerInbox,
    ContractArtifact,
};
use bridge::{
    config::Config, force_inclusion_candidates, scan_batches, scan_delayed, scan_outbox,
    scan_range,
};
use clap::{Parser, Subcommand, ValueEnum};
use client::{SignerConfig, SignerFn};
use outbox::MessageStatus;
use sequencer::PayloadKind;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "bridge")]
#[command(about = "Inspect and interact with an Arbitrum rollup bridge")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Private key for signing transactions (hex string, with or without 0x prefix)
    #[arg(short = 'k', long, env = "PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<String>,

    /// Signer-proxy url; takes precedence over the private key
    #[arg(long, env = "SIGNER_URL")]
    signer_url: Option<String>,

    /// Address the signer-proxy signs for
    #[arg(long, env = "SIGNER_ADDRESS")]
    signer_address: Option<Address>,

    /// Dry-run mode: log actions without executing transactions
    #[arg(long)]
    dry_run: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print bridge counters on both chains
    Status,

    /// List delayed messages delivered in a parent chain block range
    Delayed {
        #[arg(long)]
        from: Option<u64>,
        #[arg(long)]
        to: Option<u64>,
    },

    /// List sequencer batches posted in a parent chain block range
    Batches {
        #[arg(long)]
        from: Option<u64>,
        #[arg(long)]
        to: Option<u64>,
    },

    /// List unexecuted L2->L1 messages sent in a rollup block range
    Outbox {
        #[arg(long)]
        from: u64,
        #[arg(long)]
        to: Option<u64>,
    },

    /// Deposit ETH into the rollup
    Deposit {
        /// Amount in ether, e.g. 0.01
        #[arg(long)]
        amount: String,
    },

    /// Post a signed L2 transaction through the delayed inbox
    SendL2Message {
        /// Hex encoded L2 message
        #[arg(long)]
        data: Bytes,
    },

    /// Force include every delayed message old enough to be included
    ForceInclude,

    /// Execute a confirmed L2->L1 message on the parent chain
    Execute {
        /// Leaf index of the message in the send tree
        #[arg(long)]
        position: u64,
        /// First rollup block to search for the message
        #[arg(long)]
        from: u64,
        #[arg(long)]
        to: Option<u64>,
    },

    /// Deploy a contract from a compiled artifact
    Deploy {
        /// Foundry or Hardhat artifact
        #[arg(long)]
        artifact: PathBuf,

        /// ABI encoded constructor arguments
        #[arg(long, default_value = "0x")]
        constructor_args: Bytes,

        /// Interface the artifact must implement
        #[arg(long, value_enum)]
        interface: Option<Interface>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Interface {
    Bridge,
    Inbox,
    Outbox,
    SequencerInbox,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Signer and sender address for transactions on the parent chain.
async fn l1_signer(cli: &Cli, provider: &DynProvider) -> eyre::Result<(SignerFn, Address)> {
    let signer_config = SignerConfig::from_parts(
        cli.private_key.clone(),
        cli.signer_url.clone(),
        cli.signer_address,
    )?;
    let from = signer_config.address()?;
    let chain_id = provider.get_chain_id().await?;
    let signer = client::signer_fn(&signer_config, chain_id, provider.clone())?;

    Ok((signer, from))
}

async fn run_action<A: Action>(mut action: A, dry_run: bool) -> eyre::Result<()> {
    info!("{}", action.description());

    if dry_run {
        let ready = action.is_ready().await?;
        let completed = action.is_completed().await?;
        info!(ready, completed, "[DRY-RUN] Skipping execution");
        return Ok(());
    }

    let result = action.execute().await?;
    info!(
        tx_hash = %result.tx_hash,
        block_number = ?result.block_number,
        gas_used = ?result.gas_used,
        "Action executed"
    );

    Ok(())
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut config = Config::from_file(&cli.config)?;

    // Override dry_run from CLI flag
    if cli.dry_run {
        config.dry_run = true;
    }

    let network = config.network_config()?;
    let contracts = network.contracts();

    info!("Loaded config:");
    info!("  Network: {:?}", network.network_type);
    info!("  Bridge: {}", contracts.bridge);
    info!("  Inbox: {}", contracts.inbox);
    info!("  SequencerInbox: {}", contracts.sequencer_inbox);
    info!("  Outbox: {}", contracts.outbox);
    if config.dry_run {
        info!("  Mode: DRY-RUN (no transactions will be executed)");
    }

    let l1_provider = client::create_provider(&config.l1_rpc_url).await?;
    let scan = &config.scan;

    match &cli.command {
        Command::Status => {
            let l2_provider = client::create_provider(&config.l2_rpc_url).await?;
            let status = bridge::bridge_status(l1_provider, l2_provider, &network, scan).await?;

            info!(
                delayed_messages = status.delayed_message_count,
                delayed_read = status.total_delayed_messages_read,
                delayed_pending = status.pending_delayed_messages(),
                sequencer_messages = status.sequencer_message_count,
                batches = status.batch_count,
                send_count = status.send_count,
                inbox_paused = status.inbox_paused,
                "Bridge status"
            );
            if let Some(variation) = status.max_time_variation {
                info!(
                    delay_blocks = variation.delay_blocks,
                    delay_seconds = variation.delay_seconds,
                    future_blocks = variation.future_blocks,
                    future_seconds = variation.future_seconds,
                    "Max time variation"
                );
            }
        }
        Command::Delayed { from, to } => {
            let (from, to) =
                scan_range(&l1_provider, scan, contracts.deployed_at, *from, *to).await?;
            let messages = scan_delayed(l1_provider, &network, scan, from, to).await?;

            for message in &messages {
                info!(
                    index = message.index,
                    kind = message.message_kind().map_or("Unknown", |kind| kind.name()),
                    sender = %message.sender,
                    block_number = message.block_number,
                    size = message.data.len(),
                    after_acc = %message.after_inbox_acc(),
                    "Delayed message"
                );
            }
        }
        Command::Batches { from, to } => {
            let (from, to) =
                scan_range(&l1_provider, scan, contracts.deployed_at, *from, *to).await?;
            let batches = scan_batches(l1_provider, &network, scan, from, to).await?;

            for batch in &batches {
                let kind = batch.payload_kind();
                let decompressed_size = match kind {
                    Some(PayloadKind::Brotli) => match batch.decompressed() {
                        Ok(segments) => Some(segments.len()),
                        Err(e) => {
                            warn!(
                                sequence_number = batch.sequence_number,
                                error = %e,
                                "Failed to decompress batch"
                            );
                            None
                        }
                    },
                    _ => None,
                };

                info!(
                    sequence_number = batch.sequence_number,
                    location = ?batch.data_location,
                    payload = kind.map_or("Unresolved", PayloadKind::name),
                    block_number = batch.block_number,
                    delayed_read = batch.after_delayed_count,
                    size = batch.data.as_ref().map_or(0, |data| data.len()),
                    decompressed_size = ?decompressed_size,
                    after_acc = %batch.after_acc,
                    "Sequencer batch"
                );
            }
        }
        Command::Outbox { from, to } => {
            let l2_provider = client::create_provider(&config.l2_rpc_url).await?;
            let (from, to) = scan_range(&l2_provider, scan, 0, Some(*from), *to).await?;
            let pending =
                scan_outbox(l1_provider, l2_provider, &network, scan, from, to).await?;

            for entry in &pending {
                info!(
                    position = entry.message.position,
                    status = ?entry.status,
                    caller = %entry.message.caller,
                    destination = %entry.message.destination,
                    l2_block = entry.message.l2_block,
                    "Pending L2->L1 message"
                );
            }
        }
        Command::Deposit { amount } => {
            let value = parse_ether(amount)
                .map_err(|e| eyre::eyre!("Invalid amount {}: {}", amount, e))?;
            let (signer, from) = l1_signer(&cli, &l1_provider).await?;

            let action = DepositEthAction::new(
                l1_provider,
                signer,
                DepositEth {
                    inbox: contracts.inbox,
                    from,
                    value,
                    tx_hash: None,
                },
            );
            run_action(action, config.dry_run).await?;
        }
        Command::SendL2Message { data } => {
            let (signer, from) = l1_signer(&cli, &l1_provider).await?;

            let action = SendL2MessageAction::new(
                l1_provider,
                signer,
                SendL2Message {
                    inbox: contracts.inbox,
                    from,
                    message_data: data.clone(),
                    tx_hash: None,
                },
            );
            run_action(action, config.dry_run).await?;
        }
        Command::ForceInclude => {
            let candidates = force_inclusion_candidates(l1_provider.clone(), &network, scan).await?;
            let Some(message) = candidates.last() else {
                info!("No delayed messages eligible for force inclusion");
                return Ok(());
            };

            let (signer, from) = l1_signer(&cli, &l1_provider).await?;
            let action = ForceIncludeAction::new(
                l1_provider,
                signer,
                ForceInclude {
                    sequencer_inbox: contracts.sequencer_inbox,
                    from,
                    message: message.clone(),
                },
            );
            run_action(action, config.dry_run).await?;
        }
        Command::Execute { position, from, to } => {
            let l2_provider = client::create_provider(&config.l2_rpc_url).await?;
            let (l2_from, l2_to) = scan_range(&l2_provider, scan, 0, Some(*from), *to).await?;
            let pending = scan_outbox(
                l1_provider.clone(),
                l2_provider.clone(),
                &network,
                scan,
                l2_from,
                l2_to,
            )
            .await?;

            let Some(entry) = pending.iter().find(|p| p.message.position == *position) else {
                eyre::bail!("No unexecuted L2->L1 message {} in the given range", position)
            };
            if entry.status != MessageStatus::Confirmed {
                warn!(position, status = ?entry.status, "Message is not executable yet");
            }

            let (signer, sender) = l1_signer(&cli, &l1_provider).await?;
            let action = ExecuteAction::new(
                l1_provider,
                l2_provider,
                signer,
                Execute {
                    outbox: contracts.outbox,
                    from: sender,
                    message: entry.message.clone(),
                    lookback: scan.lookback_blocks,
                },
            );
            run_action(action, config.dry_run).await?;
        }
        Command::Deploy {
            artifact,
            constructor_args,
            interface,
        } => {
            let artifact = ContractArtifact::from_file(artifact)?;

            if let Some(interface) = interface {
                let expected = match interface {
                    Interface::Bridge => IBridge::abi::contract(),
                    Interface::Inbox => IInbox::abi::contract(),
                    Interface::Outbox => IOutbox::abi::contract(),
                    Interface::SequencerInbox => ISequencerInbox::abi::contract(),
                };
                artifact.check_interface(&expected)?;
            }

            if config.dry_run {
                info!(
                    contract = artifact.name(),
                    code_size = artifact.deploy_code(constructor_args).len(),
                    "[DRY-RUN] Skipping deployment"
                );
                return Ok(());
            }

            let Some(private_key) = &cli.private_key else {
                eyre::bail!("Deployment requires --private-key or PRIVATE_KEY")
            };
            let provider = client::create_wallet_provider(&config.l1_rpc_url, private_key)?;
            let address = binding::deploy(provider, &artifact, constructor_args).await?;

            info!(contract = artifact.name(), %address, "Contract deployed");
        }
    }

    Ok(())
}
