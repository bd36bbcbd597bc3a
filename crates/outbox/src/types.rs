use alloy_primitives::{Address, Bytes, B256, U256};
use binding::{outbox::IOutbox, precompile::IArbSys};
use events::DecodedLog;
use eyre::{bail, eyre};

/// An L2->L1 message recorded by ArbSys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct L2ToL1Message {
    /// L2 account that sent the message
    pub caller: Address,
    pub destination: Address,
    /// Leaf hash in the send tree
    pub hash: U256,
    /// Leaf index in the send tree
    pub position: u64,
    pub arb_block_num: u64,
    /// Parent chain block number as seen by ArbOS
    pub eth_block_num: u64,
    pub timestamp: u64,
    pub callvalue: U256,
    pub data: Bytes,
    /// L2 block the log was emitted in
    pub l2_block: u64,
    pub tx_hash: Option<B256>,
}

impl L2ToL1Message {
    pub fn from_log(log: &DecodedLog<IArbSys::L2ToL1Tx>) -> eyre::Result<Self> {
        let event = &log.event;
        let position = to_u64(event.position, "position")?;

        let Some(l2_block) = log.block_number() else {
            bail!("Log for L2->L1 message {} has no block number", position);
        };

        Ok(Self {
            caller: event.caller,
            destination: event.destination,
            hash: event.hash,
            position,
            arb_block_num: to_u64(event.arbBlockNum, "arbBlockNum")?,
            eth_block_num: to_u64(event.ethBlockNum, "ethBlockNum")?,
            timestamp: to_u64(event.timestamp, "timestamp")?,
            callvalue: event.callvalue,
            data: event.data.clone(),
            l2_block,
            tx_hash: log.transaction_hash(),
        })
    }
}

/// Where an L2->L1 message is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStatus {
    /// Not yet covered by a confirmed send root
    Unconfirmed,
    /// Covered by a confirmed send root, executable on L1
    Confirmed,
    /// Already executed on L1
    Executed,
}

impl MessageStatus {
    /// Status of the leaf at `position` given whether it is spent and the
    /// size of the latest confirmed send tree.
    pub const fn classify(spent: bool, position: u64, send_count: u64) -> Self {
        if spent {
            Self::Executed
        } else if position < send_count {
            Self::Confirmed
        } else {
            Self::Unconfirmed
        }
    }
}

/// A message not yet executed, with its current status.
#[derive(Debug, Clone)]
pub struct PendingMessage {
    pub message: L2ToL1Message,
    pub status: MessageStatus,
}

/// An `OutBoxTransactionExecuted` log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedMessage {
    pub to: Address,
    pub l2_sender: Address,
    pub position: u64,
    pub l1_block: u64,
    pub tx_hash: Option<B256>,
}

impl ExecutedMessage {
    pub fn from_log(log: &DecodedLog<IOutbox::OutBoxTransactionExecuted>) -> eyre::Result<Self> {
        let position = to_u64(log.event.transactionIndex, "transactionIndex")?;
        let Some(l1_block) = log.block_number() else {
            bail!("Log for executed message {} has no block number", position);
        };

        Ok(Self {
            to: log.event.to,
            l2_sender: log.event.l2Sender,
            position,
            l1_block,
            tx_hash: log.transaction_hash(),
        })
    }
}

/// Merkle proof of a send tree leaf, as returned by NodeInterface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxProof {
    /// Leaf value
    pub send: B256,
    /// Send root the proof is against
    pub root: B256,
    pub proof: Vec<B256>,
}

pub(crate) fn to_u64(value: U256, what: &str) -> eyre::Result<u64> {
    u64::try_from(value).map_err(|_| eyre!("{} does not fit in u64: {}", what, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::l2_to_l1_log;

    #[test]
    fn test_message_from_log() {
        let message = L2ToL1Message::from_log(&l2_to_l1_log(123_456)).unwrap();

        assert_eq!(message.position, 123_456);
        assert_eq!(message.l2_block, 250_000_000);
        assert_eq!(message.eth_block_num, 20_000_000);
        assert_eq!(message.callvalue, U256::from(100_000_000_000_000_000u64));
        assert_eq!(message.tx_hash, Some(B256::repeat_byte(0x42)));
    }

    #[test]
    fn test_message_without_block_rejected() {
        let mut log = l2_to_l1_log(1);
        log.log.block_number = None;
        assert!(L2ToL1Message::from_log(&log).is_err());
    }

    #[test]
    fn test_oversized_position_rejected() {
        let mut log = l2_to_l1_log(1);
        log.event.position = U256::MAX;
        assert!(L2ToL1Message::from_log(&log).is_err());
    }

    #[test]
    fn test_classify() {
        assert_eq!(MessageStatus::classify(true, 5, 0), MessageStatus::Executed);
        assert_eq!(MessageStatus::classify(false, 5, 6), MessageStatus::Confirmed);
        assert_eq!(MessageStatus::classify(false, 6, 6), MessageStatus::Unconfirmed);
        assert_eq!(MessageStatus::classify(false, 0, 0), MessageStatus::Unconfirmed);
    }
}
