//! Execution of confirmed L2->L1 messages on the parent chain outbox.

use crate::{submit, Action, SignerFn};
use alloy_primitives::{Address, B256, U256};
use alloy_provider::Provider;
use binding::outbox::IOutbox;
use outbox::{L2ToL1Message, OutboxProof, OutboxStateProvider};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct Execute {
    pub outbox: Address,
    pub from: Address,
    pub message: L2ToL1Message,
    /// Parent chain blocks searched for the latest send root
    pub lookback: u64,
}

pub struct ExecuteAction<P1, P2> {
    l1_provider: P1,
    signer: SignerFn,
    state: OutboxStateProvider<P1, P2>,
    action: Execute,
}

/// `executeTransaction` call for `message` proven by `proof`.
pub fn execute_call(message: &L2ToL1Message, proof: &OutboxProof) -> IOutbox::executeTransactionCall {
    IOutbox::executeTransactionCall {
        proof: proof.proof.clone(),
        index: U256::from(message.position),
        l2Sender: message.caller,
        to: message.destination,
        l2Block: U256::from(message.arb_block_num),
        l1Block: U256::from(message.eth_block_num),
        l2Timestamp: U256::from(message.timestamp),
        value: message.callvalue,
        data: message.data.clone(),
    }
}

impl<P1, P2> ExecuteAction<P1, P2>
where
    P1: Provider + Clone,
    P2: Provider + Clone,
{
    pub fn new(l1_provider: P1, l2_provider: P2, signer: SignerFn, action: Execute) -> Self {
        let state = OutboxStateProvider::new(l1_provider.clone(), l2_provider, action.outbox);
        Self {
            l1_provider,
            signer,
            state,
            action,
        }
    }

    async fn proof(&self) -> eyre::Result<OutboxProof> {
        let send_count = self.state.latest_send_count(self.action.lookback).await?;
        let position = self.action.message.position;
        if position >= send_count {
            eyre::bail!(
                "Message {} is not confirmed yet (send count {})",
                position,
                send_count
            )
        }

        let proof = self.state.construct_proof(send_count, position).await?;

        if proof.send != B256::from(self.action.message.hash) {
            eyre::bail!(
                "Proof leaf {} does not match message hash {}",
                proof.send,
                self.action.message.hash
            )
        }

        if self.state.root(proof.root).await?.is_none() {
            eyre::bail!("Send root {} is not known to the outbox", proof.root)
        }

        debug!(position, send_count, root = %proof.root, "Outbox proof ready");

        Ok(proof)
    }
}

impl<P1, P2> Action for ExecuteAction<P1, P2>
where
    P1: Provider + Clone,
    P2: Provider + Clone,
{
    async fn is_ready(&self) -> eyre::Result<bool> {
        let send_count = self.state.latest_send_count(self.action.lookback).await?;
        let status = self
            .state
            .message_status(&self.action.message, send_count)
            .await?;
        Ok(status == outbox::MessageStatus::Confirmed)
    }

    async fn is_completed(&self) -> eyre::Result<bool> {
        self.state.is_spent(self.action.message.position).await
    }

    async fn execute(&mut self) -> eyre::Result<crate::Result> {
        if self.is_completed().await? {
            eyre::bail!(
                "L2->L1 message {} already executed",
                self.action.message.position
            )
        }

        let proof = self.proof().await?;
        let call = execute_call(&self.action.message, &proof);

        let outbox = IOutbox::new(self.action.outbox, &self.l1_provider);
        let tx_request = outbox
            .executeTransaction(
                call.proof,
                call.index,
                call.l2Sender,
                call.to,
                call.l2Block,
                call.l1Block,
                call.l2Timestamp,
                call.value,
                call.data,
            )
            .into_transaction_request()
            .from(self.action.from);

        let receipt =
            submit(&self.l1_provider, &self.signer, tx_request, self.action.from).await?;

        info!(
            tx_hash = %receipt.transaction_hash,
            block_number = receipt.block_number,
            gas_used = receipt.gas_used,
            position = self.action.message.position,
            destination = %self.action.message.destination,
            "L2->L1 message executed"
        );

        Ok(crate::Result::from(&receipt))
    }

    fn description(&self) -> String {
        format!(
            "Executing L2->L1 message {} from {} to {} via outbox {}",
            self.action.message.position,
            self.action.message.caller,
            self.action.message.destination,
            self.action.outbox
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{mock_signer, MockProvider};
    use alloy_primitives::{address, Bytes};
    use alloy_sol_types::SolCall;

    fn message() -> L2ToL1Message {
        L2ToL1Message {
            caller: address!("5CFFA347b0aE99cc01E5c01714cA5658e54a23D1"),
            destination: address!("0000000000000000000000000000000000000bEE"),
            hash: U256::from(0xabcdefu64),
            position: 7,
            arb_block_num: 150_000_000,
            eth_block_num: 18_000_000,
            timestamp: 1_700_000_000,
            callvalue: U256::from(10u64).pow(U256::from(17)),
            data: Bytes::from_static(&[0xde, 0xad]),
            l2_block: 150_000_000,
            tx_hash: None,
        }
    }

    #[test]
    fn test_execute_call() {
        let proof = OutboxProof {
            send: B256::from(U256::from(0xabcdefu64)),
            root: B256::repeat_byte(0x22),
            proof: vec![B256::repeat_byte(0x01), B256::repeat_byte(0x02)],
        };
        let msg = message();
        let call = execute_call(&msg, &proof);

        assert_eq!(call.proof, proof.proof);
        assert_eq!(call.index, U256::from(7));
        assert_eq!(call.l2Sender, msg.caller);
        assert_eq!(call.to, msg.destination);
        assert_eq!(call.l2Block, U256::from(150_000_000u64));
        assert_eq!(call.l1Block, U256::from(18_000_000u64));
        assert_eq!(call.l2Timestamp, U256::from(1_700_000_000u64));
        assert_eq!(call.value, msg.callvalue);
        assert_eq!(call.data, msg.data);

        let encoded = call.abi_encode();
        assert_eq!(&encoded[..4], IOutbox::executeTransactionCall::SELECTOR.as_slice());
    }

    #[test]
    fn test_description() {
        let action = ExecuteAction::new(
            MockProvider,
            MockProvider,
            mock_signer(),
            Execute {
                outbox: address!("0B9857ae2D4A3DBe74ffE1d7DF045bb7F96E4840"),
                from: Address::ZERO,
                message: message(),
                lookback: 50_400,
            },
        );

        let desc = action.description();
        assert!(desc.contains("message 7"));
        assert!(desc.contains("0x0B9857ae2D4A3DBe74ffE1d7DF045bb7F96E4840"));
    }
}
