//! Sequencer inbox contract bindings.
//!
//! The sequencer inbox receives compressed transaction batches from the batch
//! poster and lets anyone force-include delayed messages once they are older
//! than the maximum time variation.

use alloy_sol_types::sol;

sol! {
    /// SequencerInbox - L1 contract receiving batches from the batch poster
    #[sol(rpc, abi)]
    #[derive(Debug)]
    interface ISequencerInbox {
        /// Bounds on how far a batch may lag or lead L1
        struct MaxTimeVariation {
            uint256 delayBlocks;
            uint256 futureBlocks;
            uint256 delaySeconds;
            uint256 futureSeconds;
        }

        /// L1 time window a batch is valid in
        struct TimeBounds {
            uint64 minTimestamp;
            uint64 maxTimestamp;
            uint64 minBlockNumber;
            uint64 maxBlockNumber;
        }

        /// Where the batch payload can be found
        enum BatchDataLocation {
            TxInput,
            SeparateBatchEvent,
            NoData,
            Blob
        }

        /// Emitted for every batch appended to the sequencer accumulator
        event SequencerBatchDelivered(
            uint256 indexed batchSequenceNumber,
            bytes32 indexed beforeAcc,
            bytes32 indexed afterAcc,
            bytes32 delayedAcc,
            uint256 afterDelayedMessagesRead,
            TimeBounds timeBounds,
            BatchDataLocation dataLocation
        );

        /// Emitted for batches whose payload is not in the tx calldata
        event SequencerBatchData(uint256 indexed batchSequenceNumber, bytes data);

        event OwnerFunctionCalled(uint256 indexed id);

        event SetValidKeyset(bytes32 indexed keysetHash, bytes keysetBytes);

        event InvalidateKeyset(bytes32 indexed keysetHash);

        error AlreadyInit();
        error HadZeroInit();
        error NotOrigin();
        error NotBatchPoster();
        error NotOwner(address sender, address owner);
        error NotForked();
        error DataTooLarge(uint256 dataLength, uint256 maxDataLength);
        error DelayedBackwards();
        error DelayedTooFar();
        error ForceIncludeBlockTooSoon();
        error ForceIncludeTimeTooSoon();
        error IncorrectMessagePreimage();
        error BadSequencerNumber(uint256 stored, uint256 received);
        error DataNotAuthenticated();
        error AlreadyValidDASKeyset(bytes32 keysetHash);
        error NoSuchKeyset(bytes32 keysetHash);

        /// Number of delayed messages consumed by batches so far
        function totalDelayedMessagesRead() external view returns (uint256);

        function bridge() external view returns (address);

        function rollup() external view returns (address);

        function HEADER_LENGTH() external view returns (uint256);

        function DATA_AUTHENTICATED_FLAG() external view returns (bytes1);

        function isBatchPoster(address account) external view returns (bool);

        function maxTimeVariation() external view returns (
            uint256 delayBlocks,
            uint256 futureBlocks,
            uint256 delaySeconds,
            uint256 futureSeconds
        );

        function dasKeySetInfo(bytes32 keysetHash) external view returns (
            bool isValidKeyset,
            uint64 creationBlock
        );

        /// Sequencer accumulator after batch `index`
        function inboxAccs(uint256 index) external view returns (bytes32);

        function batchCount() external view returns (uint256);

        function isValidKeysetHash(bytes32 ksHash) external view returns (bool);

        function getKeysetCreationBlock(bytes32 ksHash) external view returns (uint256);

        /// Include delayed messages up to `_totalDelayedMessagesRead` without the sequencer
        function forceInclusion(
            uint256 _totalDelayedMessagesRead,
            uint8 kind,
            uint64[2] calldata l1BlockAndTime,
            uint256 baseFeeL1,
            address sender,
            bytes32 messageDataHash
        ) external;

        function addSequencerL2BatchFromOrigin(
            uint256 sequenceNumber,
            bytes calldata data,
            uint256 afterDelayedMessagesRead,
            address gasRefunder,
            uint256 prevMessageCount,
            uint256 newMessageCount
        ) external;

        function addSequencerL2Batch(
            uint256 sequenceNumber,
            bytes calldata data,
            uint256 afterDelayedMessagesRead,
            address gasRefunder,
            uint256 prevMessageCount,
            uint256 newMessageCount
        ) external;

        function setMaxTimeVariation(MaxTimeVariation memory maxTimeVariation_) external;

        function setIsBatchPoster(address addr, bool isBatchPoster_) external;

        function setValidKeyset(bytes calldata keysetBytes) external;

        function invalidateKeysetHash(bytes32 ksHash) external;

        function initialize(address bridge_, MaxTimeVariation calldata maxTimeVariation_) external;
    }

    /// Pre-upgrade batch posting entrypoint, still found in historical calldata
    #[sol(rpc, abi)]
    #[derive(Debug)]
    interface ILegacySequencerInbox {
        function addSequencerL2BatchFromOrigin(
            uint256 sequenceNumber,
            bytes calldata data,
            uint256 afterDelayedMessagesRead,
            address gasRefunder
        ) external;
    }
}
