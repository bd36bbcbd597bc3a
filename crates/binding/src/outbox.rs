//! Outbox contract bindings.
//!
//! The outbox executes L2→L1 messages once their send root has been
//! confirmed by the rollup.

use alloy_sol_types::sol;

sol! {
    /// Outbox - L1 contract executing confirmed L2→L1 messages
    #[sol(rpc, abi)]
    #[derive(Debug)]
    #[allow(clippy::too_many_arguments)]
    interface IOutbox {
        /// Emitted when the rollup confirms a new send root
        event SendRootUpdated(bytes32 indexed outputRoot, bytes32 indexed l2BlockHash);

        /// Emitted when an L2→L1 message is executed; `zero` is always 0
        event OutBoxTransactionExecuted(
            address indexed to,
            address indexed l2Sender,
            uint256 indexed zero,
            uint256 transactionIndex
        );

        error AlreadyInit();
        error HadZeroInit();
        error NotRollup(address sender, address rollup);
        error ProofTooLong(uint256 proofLength);
        error PathNotMinimal(uint256 index, uint256 maxIndex);
        error UnknownRoot(bytes32 root);
        error AlreadySpent(uint256 index);
        error BridgeCallFailed();
        error SimulationOnlyEntrypoint();

        function rollup() external view returns (address);

        function bridge() external view returns (address);

        /// Bitmap word tracking spent leaves
        function spent(uint256 index) external view returns (bytes32);

        /// L2 block hash for a confirmed send root, zero if unknown
        function roots(bytes32 sendRoot) external view returns (bytes32);

        function OUTBOX_VERSION() external view returns (uint128);

        function updateSendRoot(bytes32 sendRoot, bytes32 l2BlockHash) external;

        /// Context of the message currently being executed
        function l2ToL1Sender() external view returns (address);

        function l2ToL1Block() external view returns (uint256);

        function l2ToL1EthBlock() external view returns (uint256);

        function l2ToL1Timestamp() external view returns (uint256);

        function l2ToL1OutputId() external view returns (bytes32);

        /// Execute a message given its merkle proof against a confirmed send root
        function executeTransaction(
            bytes32[] calldata proof,
            uint256 index,
            address l2Sender,
            address to,
            uint256 l2Block,
            uint256 l1Block,
            uint256 l2Timestamp,
            uint256 value,
            bytes calldata data
        ) external;

        function executeTransactionSimulation(
            uint256 index,
            address l2Sender,
            address to,
            uint256 l2Block,
            uint256 l1Block,
            uint256 l2Timestamp,
            uint256 value,
            bytes calldata data
        ) external;

        function isSpent(uint256 index) external view returns (bool);

        function calculateItemHash(
            address l2Sender,
            address to,
            uint256 l2Block,
            uint256 l1Block,
            uint256 l2Timestamp,
            uint256 value,
            bytes calldata data
        ) external pure returns (bytes32);

        function calculateMerkleRoot(
            bytes32[] memory proof,
            uint256 path,
            bytes32 item
        ) external pure returns (bytes32);

        function initialize(address _bridge) external;
    }
}
