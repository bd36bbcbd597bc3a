//! Bridge contract bindings.
//!
//! The bridge holds the delayed inbox accumulator, the sequencer inbox
//! accumulator and all escrowed ETH. Inboxes enqueue delayed messages into it
//! and the outbox uses it to execute L2→L1 calls.

use alloy_sol_types::sol;

sol! {
    /// Bridge - L1 contract holding both inbox accumulators
    #[sol(rpc, abi)]
    #[derive(Debug)]
    interface IBridge {
        /// Emitted for every delayed message enqueued by an allowed inbox
        event MessageDelivered(
            uint256 indexed messageIndex,
            bytes32 indexed beforeInboxAcc,
            address inbox,
            uint8 kind,
            address sender,
            bytes32 messageDataHash,
            uint256 baseFeeL1,
            uint64 timestamp
        );

        /// Emitted when the outbox executes an L2→L1 call through the bridge
        event BridgeCallTriggered(
            address indexed outbox,
            address indexed to,
            uint256 value,
            bytes data
        );

        event InboxToggle(address indexed inbox, bool enabled);

        event OutboxToggle(address indexed outbox, bool enabled);

        event SequencerInboxUpdated(address newSequencerInbox);

        error NotContract(address addr);
        error NotDelayedInbox(address sender);
        error NotSequencerInbox(address sender);
        error NotOutbox(address sender);
        error InvalidOutboxSet(address outbox);
        error NotRollupOrOwner(address sender, address rollup, address owner);
        error BadSequencerMessageNumber(uint256 stored, uint256 received);

        function allowedDelayedInboxList(uint256 index) external view returns (address);

        function allowedOutboxList(uint256 index) external view returns (address);

        /// Accumulator after the delayed message at `index`
        function delayedInboxAccs(uint256 index) external view returns (bytes32);

        /// Accumulator after the sequencer message at `index`
        function sequencerInboxAccs(uint256 index) external view returns (bytes32);

        /// Rollup contract (an IOwnable)
        function rollup() external view returns (address);

        function sequencerInbox() external view returns (address);

        /// Outbox currently executing a call, or the default sentinel
        function activeOutbox() external view returns (address);

        function allowedDelayedInboxes(address inbox) external view returns (bool);

        function allowedOutboxes(address outbox) external view returns (bool);

        function sequencerReportedSubMessageCount() external view returns (uint256);

        /// Number of delayed messages ever enqueued
        function delayedMessageCount() external view returns (uint256);

        /// Number of sequencer batches ever enqueued
        function sequencerMessageCount() external view returns (uint256);

        function enqueueDelayedMessage(
            uint8 kind,
            address sender,
            bytes32 messageDataHash
        ) external payable returns (uint256);

        function executeCall(
            address to,
            uint256 value,
            bytes calldata data
        ) external returns (bool success, bytes memory returnData);

        function enqueueSequencerMessage(
            bytes32 dataHash,
            uint256 afterDelayedMessagesRead,
            uint256 prevMessageCount,
            uint256 newMessageCount
        ) external returns (
            uint256 seqMessageIndex,
            bytes32 beforeAcc,
            bytes32 delayedAcc,
            bytes32 acc
        );

        function submitBatchSpendingReport(
            address batchPoster,
            bytes32 dataHash
        ) external returns (uint256 msgNum);

        function setSequencerInbox(address _sequencerInbox) external;

        function setDelayedInbox(address inbox, bool enabled) external;

        function setOutbox(address inbox, bool enabled) external;

        function initialize(address rollup_) external;
    }

    /// Ownable - implemented by the rollup contract
    #[sol(rpc, abi)]
    #[derive(Debug)]
    interface IOwnable {
        function owner() external view returns (address);
    }
}
