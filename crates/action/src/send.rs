use crate::{submit, Action, SignerFn};
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_provider::Provider;
use binding::inbox::IInbox;
use events::parse_receipt;
use tracing::info;

/// Signed L2 transaction (or batch) to post through the delayed inbox.
#[derive(Debug, Clone)]
pub struct SendL2Message {
    pub inbox: Address,
    pub from: Address,
    /// Serialized L2 message, starting with its L2 message kind byte
    pub message_data: Bytes,
    pub tx_hash: Option<B256>,
}

pub struct SendL2MessageAction<P> {
    provider: P,
    signer: SignerFn,
    action: SendL2Message,
    message_number: Option<U256>,
}

impl<P> SendL2MessageAction<P>
where
    P: Provider + Clone,
{
    pub fn new(provider: P, signer: SignerFn, action: SendL2Message) -> Self {
        Self {
            provider,
            signer,
            action,
            message_number: None,
        }
    }

    pub const fn message_number(&self) -> Option<U256> {
        self.message_number
    }
}

impl<P> Action for SendL2MessageAction<P>
where
    P: Provider + Clone,
{
    async fn is_ready(&self) -> eyre::Result<bool> {
        if self.action.message_data.is_empty() {
            return Ok(false);
        }

        let inbox = IInbox::new(self.action.inbox, &self.provider);
        let paused = inbox.paused().call().await?;
        Ok(!paused)
    }

    async fn is_completed(&self) -> eyre::Result<bool> {
        let Some(tx_hash) = self.action.tx_hash else {
            return Ok(false);
        };

        let Some(receipt) = self.provider.get_transaction_receipt(tx_hash).await? else {
            return Ok(false);
        };

        let delivered =
            parse_receipt::<IInbox::InboxMessageDelivered>(&receipt, Some(self.action.inbox));
        Ok(receipt.status() && !delivered.is_empty())
    }

    async fn execute(&mut self) -> eyre::Result<crate::Result> {
        if self.is_completed().await? {
            eyre::bail!("L2 message already sent")
        }

        if !self.is_ready().await? {
            eyre::bail!("Inbox is paused or message is empty")
        }

        let inbox = IInbox::new(self.action.inbox, &self.provider);
        let tx_request = inbox
            .sendL2Message(self.action.message_data.clone())
            .into_transaction_request()
            .from(self.action.from);

        let receipt = submit(&self.provider, &self.signer, tx_request, self.action.from).await?;

        let delivered =
            parse_receipt::<IInbox::InboxMessageDelivered>(&receipt, Some(self.action.inbox));
        let Some(log) = delivered.first() else {
            eyre::bail!(
                "InboxMessageDelivered not found in receipt {}",
                receipt.transaction_hash
            )
        };

        self.action.tx_hash = Some(receipt.transaction_hash);
        self.message_number = Some(log.event.messageNum);

        info!(
            tx_hash = %receipt.transaction_hash,
            block_number = receipt.block_number,
            gas_used = receipt.gas_used,
            message_number = %log.event.messageNum,
            size = self.action.message_data.len(),
            "L2 message sent to delayed inbox"
        );

        Ok(crate::Result::from(&receipt))
    }

    fn description(&self) -> String {
        format!(
            "Sending {} byte L2 message via inbox {}",
            self.action.message_data.len(),
            self.action.inbox
        )
    }
}
