//! ETH deposit into the rollup through the delayed inbox.

use crate::{submit, Action, SignerFn};
use alloy_primitives::{utils::format_ether, Address, B256, U256};
use alloy_provider::Provider;
use alloy_rpc_types_eth::TransactionReceipt;
use binding::inbox::IInbox;
use events::parse_receipt;
use tracing::info;

/// Deposit input data.
#[derive(Debug, Clone)]
pub struct DepositEth {
    /// Inbox contract on the parent chain
    pub inbox: Address,
    /// Depositor; funds are credited to the same address on L2
    pub from: Address,
    pub value: U256,
    /// Set once the deposit was sent
    pub tx_hash: Option<B256>,
}

pub struct DepositEthAction<P> {
    provider: P,
    signer: SignerFn,
    action: DepositEth,
    message_number: Option<U256>,
}

impl<P> DepositEthAction<P>
where
    P: Provider + Clone,
{
    pub fn new(provider: P, signer: SignerFn, action: DepositEth) -> Self {
        Self {
            provider,
            signer,
            action,
            message_number: None,
        }
    }

    /// Delayed inbox index of the deposit, once executed.
    pub const fn message_number(&self) -> Option<U256> {
        self.message_number
    }

    pub const fn tx_hash(&self) -> Option<B256> {
        self.action.tx_hash
    }

    fn delivered_message(&self, receipt: &TransactionReceipt) -> Option<U256> {
        parse_receipt::<IInbox::InboxMessageDelivered>(receipt, Some(self.action.inbox))
            .first()
            .map(|log| log.event.messageNum)
    }
}

impl<P> Action for DepositEthAction<P>
where
    P: Provider + Clone,
{
    async fn is_ready(&self) -> eyre::Result<bool> {
        if self.action.value == U256::ZERO {
            return Ok(false);
        }

        if self.action.inbox == Address::ZERO {
            return Ok(false);
        }

        let balance = self.provider.get_balance(self.action.from).await?;
        Ok(balance >= self.action.value)
    }

    async fn is_completed(&self) -> eyre::Result<bool> {
        let Some(tx_hash) = self.action.tx_hash else {
            return Ok(false);
        };

        // Transaction must exist and be mined
        let Some(receipt) = self.provider.get_transaction_receipt(tx_hash).await? else {
            return Ok(false);
        };

        Ok(receipt.status() && self.delivered_message(&receipt).is_some())
    }

    async fn execute(&mut self) -> eyre::Result<crate::Result> {
        if self.is_completed().await? {
            eyre::bail!("Deposit already sent")
        }

        let inbox = IInbox::new(self.action.inbox, &self.provider);
        let tx_request = inbox
            .depositEth()
            .value(self.action.value)
            .into_transaction_request()
            .from(self.action.from);

        let receipt = submit(&self.provider, &self.signer, tx_request, self.action.from).await?;

        let Some(message_number) = self.delivered_message(&receipt) else {
            eyre::bail!(
                "InboxMessageDelivered not found in receipt {}",
                receipt.transaction_hash
            )
        };

        self.action.tx_hash = Some(receipt.transaction_hash);
        self.message_number = Some(message_number);

        info!(
            tx_hash = %receipt.transaction_hash,
            block_number = receipt.block_number,
            gas_used = receipt.gas_used,
            message_number = %message_number,
            "ETH deposit sent to delayed inbox"
        );

        Ok(crate::Result::from(&receipt))
    }

    fn description(&self) -> String {
        format!(
            "Depositing {} ETH from {} via inbox {}",
            format_ether(self.action.value),
            self.action.from,
            self.action.inbox
        )
    }
}
