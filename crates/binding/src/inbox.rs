//! Delayed inbox contract bindings.
//!
//! The inbox is the user-facing entry point for L1→L2 messages: deposits,
//! retryable tickets and signed L2 transactions submitted through L1.

use alloy_sol_types::sol;

sol! {
    /// Inbox - L1 contract that enqueues delayed messages into the bridge
    #[sol(rpc, abi)]
    #[derive(Debug)]
    #[allow(clippy::too_many_arguments)]
    interface IInbox {
        /// Emitted with the full message payload
        event InboxMessageDelivered(uint256 indexed messageNum, bytes data);

        /// Emitted by `sendL2MessageFromOrigin`; the payload is the tx calldata
        event InboxMessageDeliveredFromOrigin(uint256 indexed messageNum);

        error L1Forked();
        error NotForked();
        error NotOrigin();
        error NotAllowedOrigin(address origin);
        error DataTooLarge(uint256 dataLength, uint256 maxDataLength);
        error InsufficientValue(uint256 expected, uint256 actual);
        error InsufficientSubmissionCost(uint256 expected, uint256 actual);
        error GasLimitTooLarge();
        error NotRollupOrOwner(address sender, address rollup, address owner);
        error RetryableData(
            address from,
            address to,
            uint256 l2CallValue,
            uint256 deposit,
            uint256 maxSubmissionCost,
            address excessFeeRefundAddress,
            address callValueRefundAddress,
            uint256 gasLimit,
            uint256 maxFeePerGas,
            bytes data
        );

        function bridge() external view returns (address);

        function sequencerInbox() external view returns (address);

        function paused() external view returns (bool);

        function allowListEnabled() external view returns (bool);

        function isAllowed(address user) external view returns (bool);

        /// Submission fee charged for a retryable with `dataLength` bytes of calldata
        function calculateRetryableSubmissionFee(
            uint256 dataLength,
            uint256 baseFee
        ) external view returns (uint256);

        /// Send a signed L2 message; payload is read from calldata by the node
        function sendL2MessageFromOrigin(bytes calldata messageData) external returns (uint256);

        /// Send a signed L2 message
        function sendL2Message(bytes calldata messageData) external returns (uint256);

        function sendL1FundedUnsignedTransaction(
            uint256 gasLimit,
            uint256 maxFeePerGas,
            uint256 nonce,
            address to,
            bytes calldata data
        ) external payable returns (uint256);

        function sendL1FundedContractTransaction(
            uint256 gasLimit,
            uint256 maxFeePerGas,
            address to,
            bytes calldata data
        ) external payable returns (uint256);

        function sendUnsignedTransaction(
            uint256 gasLimit,
            uint256 maxFeePerGas,
            uint256 nonce,
            address to,
            uint256 value,
            bytes calldata data
        ) external returns (uint256);

        function sendContractTransaction(
            uint256 gasLimit,
            uint256 maxFeePerGas,
            address to,
            uint256 value,
            bytes calldata data
        ) external returns (uint256);

        /// Deposit ETH to the sender's (possibly aliased) address on L2
        function depositEth() external payable returns (uint256);

        function createRetryableTicket(
            address to,
            uint256 l2CallValue,
            uint256 maxSubmissionCost,
            address excessFeeRefundAddress,
            address callValueRefundAddress,
            uint256 gasLimit,
            uint256 maxFeePerGas,
            bytes calldata data
        ) external payable returns (uint256);

        function unsafeCreateRetryableTicket(
            address to,
            uint256 l2CallValue,
            uint256 maxSubmissionCost,
            address excessFeeRefundAddress,
            address callValueRefundAddress,
            uint256 gasLimit,
            uint256 maxFeePerGas,
            bytes calldata data
        ) external payable returns (uint256);

        function pause() external;

        function unpause() external;

        function setAllowList(address[] calldata user, bool[] calldata val) external;

        function setAllowListEnabled(bool _allowListEnabled) external;

        function initialize(address _bridge, address _sequencerInbox) external;

        function postUpgradeInit(address _bridge) external;
    }
}
