use crate::hash::{accumulate, message_hash};
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};

/// Kinds of L1 messages understood by ArbOS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageKind {
    L2Message = 3,
    EndOfBlock = 6,
    L2FundedByL1 = 7,
    RollupEvent = 8,
    SubmitRetryable = 9,
    BatchForGasEstimation = 10,
    Initialize = 11,
    EthDeposit = 12,
    BatchPostingReport = 13,
    Invalid = 0xFF,
}

impl MessageKind {
    pub const fn from_u8(kind: u8) -> Option<Self> {
        match kind {
            3 => Some(Self::L2Message),
            6 => Some(Self::EndOfBlock),
            7 => Some(Self::L2FundedByL1),
            8 => Some(Self::RollupEvent),
            9 => Some(Self::SubmitRetryable),
            10 => Some(Self::BatchForGasEstimation),
            11 => Some(Self::Initialize),
            12 => Some(Self::EthDeposit),
            13 => Some(Self::BatchPostingReport),
            0xFF => Some(Self::Invalid),
            _ => None,
        }
    }

    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::L2Message => "L2Message",
            Self::EndOfBlock => "EndOfBlock",
            Self::L2FundedByL1 => "L2FundedByL1",
            Self::RollupEvent => "RollupEvent",
            Self::SubmitRetryable => "SubmitRetryable",
            Self::BatchForGasEstimation => "BatchForGasEstimation",
            Self::Initialize => "Initialize",
            Self::EthDeposit => "EthDeposit",
            Self::BatchPostingReport => "BatchPostingReport",
            Self::Invalid => "Invalid",
        }
    }
}

/// A message in the bridge's delayed inbox, with its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelayedMessage {
    /// Position in the delayed inbox (`inboxSeqNum`)
    pub index: u64,
    pub before_inbox_acc: B256,
    /// Inbox contract that enqueued the message
    pub inbox: Address,
    /// Raw kind byte; see [`DelayedMessage::message_kind`]
    pub kind: u8,
    /// Sender as recorded by the bridge (aliased for contracts)
    pub sender: Address,
    /// Parent chain block the message was delivered in
    pub block_number: u64,
    pub timestamp: u64,
    pub base_fee_l1: U256,
    /// `messageDataHash` from the bridge event
    pub data_hash: B256,
    pub data: Bytes,
    pub tx_hash: Option<B256>,
}

impl DelayedMessage {
    /// `None` for kinds this crate does not know about.
    pub const fn message_kind(&self) -> Option<MessageKind> {
        MessageKind::from_u8(self.kind)
    }

    /// Whether `data` matches the hash committed by the bridge.
    pub fn data_matches(&self) -> bool {
        keccak256(&self.data) == self.data_hash
    }

    pub fn message_hash(&self) -> B256 {
        message_hash(
            self.kind,
            self.sender,
            self.block_number,
            self.timestamp,
            U256::from(self.index),
            self.base_fee_l1,
            keccak256(&self.data),
        )
    }

    /// Accumulator after this message was appended.
    pub fn after_inbox_acc(&self) -> B256 {
        accumulate(self.before_inbox_acc, self.message_hash())
    }
}
