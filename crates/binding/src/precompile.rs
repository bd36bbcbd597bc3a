//! Arbitrum L2 precompile bindings.
//!
//! Includes the precompiles needed to follow L2→L1 messages:
//! - ArbSys (emits L2ToL1Tx, holds the send merkle tree)
//! - NodeInterface (virtual contract answering proof queries)

use alloy_primitives::{address, Address};
use alloy_sol_types::sol;

/// ArbSys precompile address on every Arbitrum chain.
pub const ARB_SYS_ADDRESS: Address = address!("0000000000000000000000000000000000000064");

/// NodeInterface virtual contract address on every Arbitrum chain.
pub const NODE_INTERFACE_ADDRESS: Address = address!("00000000000000000000000000000000000000C8");

sol! {
    /// ArbSys - system precompile on L2
    #[sol(rpc, abi)]
    #[derive(Debug)]
    interface IArbSys {
        /// Emitted for every L2→L1 message; `position` is the leaf index in the send tree
        event L2ToL1Tx(
            address caller,
            address indexed destination,
            uint256 indexed hash,
            uint256 indexed position,
            uint256 arbBlockNum,
            uint256 ethBlockNum,
            uint256 timestamp,
            uint256 callvalue,
            bytes data
        );

        event SendMerkleUpdate(
            uint256 indexed reserved,
            bytes32 indexed hash,
            uint256 indexed position
        );

        function arbBlockNumber() external view returns (uint256);

        function arbChainID() external view returns (uint256);

        function arbOSVersion() external view returns (uint256);

        function sendTxToL1(address destination, bytes calldata data) external payable returns (uint256);

        function withdrawEth(address destination) external payable returns (uint256);

        function sendMerkleTreeState() external view returns (
            uint256 size,
            bytes32 root,
            bytes32[] memory partials
        );
    }

    /// NodeInterface - only reachable through eth_call
    #[sol(rpc, abi)]
    #[derive(Debug)]
    interface INodeInterface {
        /// Merkle proof for leaf `leaf` in a send tree of `size` leaves
        function constructOutboxProof(uint64 size, uint64 leaf) external view returns (
            bytes32 send,
            bytes32 root,
            bytes32[] memory proof
        );

        function findBatchContainingBlock(uint64 blockNum) external view returns (uint64 batch);

        function getL1Confirmations(bytes32 blockHash) external view returns (uint64 confirmations);
    }
}
