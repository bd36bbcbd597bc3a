pub mod deposit;
pub mod execute;
pub mod force_include;
pub mod send;

use alloy_primitives::{Address, TxHash, U256};
use alloy_provider::Provider;
use alloy_rpc_types::TransactionRequest;
use alloy_rpc_types_eth::TransactionReceipt;
pub use client::{fill_transaction, SignerFn};
use std::future::Future;
use tracing::debug;

pub use deposit::{DepositEth, DepositEthAction};
pub use execute::{Execute, ExecuteAction};
pub use force_include::{ForceInclude, ForceIncludeAction};
pub use send::{SendL2Message, SendL2MessageAction};

/// Trait for executable onchain actions.
pub trait Action: Send + Sync {
    /// Check to see if the action is ready to be executed.
    ///
    /// Returns true if all preconditions are met.
    fn is_ready(&self) -> impl Future<Output = eyre::Result<bool>> + Send;

    /// Check if the action has already been completed.
    ///
    /// Returns true if the action was already executed successfully.
    fn is_completed(&self) -> impl Future<Output = eyre::Result<bool>> + Send;

    /// Execute the action.
    ///
    /// Returns the transaction hash of the executed action.
    fn execute(&mut self) -> impl Future<Output = eyre::Result<Result>> + Send;

    /// Get a human-readable description of this action.
    fn description(&self) -> String;
}

/// Result of an action.
#[derive(Debug, Clone)]
pub struct Result {
    /// Transaction hash
    pub tx_hash: TxHash,
    /// Block number where transaction was included
    pub block_number: Option<u64>,
    /// Gas used
    pub gas_used: Option<U256>,
}

impl From<&TransactionReceipt> for Result {
    fn from(receipt: &TransactionReceipt) -> Self {
        Self {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            gas_used: Some(U256::from(receipt.gas_used)),
        }
    }
}

/// Fill, sign, broadcast and wait for `tx`. Reverted transactions are errors.
pub(crate) async fn submit<P>(
    provider: &P,
    signer: &SignerFn,
    tx: TransactionRequest,
    from: Address,
) -> eyre::Result<TransactionReceipt>
where
    P: Provider,
{
    let chain_id = provider.get_chain_id().await?;

    // Fill transaction fields (nonce, gas, fees) using our provider
    let filled_tx = fill_transaction(tx, provider, from, chain_id).await?;

    // Sign externally
    let signed_tx = signer(filled_tx).await?;

    let pending = provider.send_raw_transaction(&signed_tx).await?;
    debug!(tx_hash = %pending.tx_hash(), "Transaction broadcast");

    let receipt = pending.get_receipt().await?;
    if !receipt.status() {
        eyre::bail!("Transaction {} reverted", receipt.transaction_hash);
    }

    Ok(receipt)
}
