//! Typed access to contract event logs.
//!
//! Every `sol!` event implements [`SolEvent`], so one set of generic helpers
//! covers all of them:
//! - [`EventScanner::query`]: historical range query, chunked with retries
//! - [`EventScanner::iter`]: lazy pull iterator over a range
//! - [`EventScanner::watch`]: live subscription fed by a polling task
//! - [`parse_log`] / [`parse_receipt`]: decode raw logs

pub mod iter;
pub mod scanner;
pub mod watch;

use alloy_primitives::{Address, B256, U256};
use alloy_rpc_types_eth::{Filter, Log, TransactionReceipt};
use alloy_sol_types::SolEvent;
use std::marker::PhantomData;

pub use iter::LogIterator;
pub use scanner::{chunk_ranges, EventScanner, DEFAULT_CHUNK_SIZE};
pub use watch::{Subscription, WatchOptions};

/// A decoded event together with the raw log it came from.
#[derive(Debug, Clone)]
pub struct DecodedLog<E> {
    pub event: E,
    pub log: Log,
}

impl<E> DecodedLog<E> {
    pub const fn block_number(&self) -> Option<u64> {
        self.log.block_number
    }

    pub const fn transaction_hash(&self) -> Option<B256> {
        self.log.transaction_hash
    }

    pub const fn log_index(&self) -> Option<u64> {
        self.log.log_index
    }

    /// Contract that emitted the log.
    pub const fn address(&self) -> Address {
        self.log.inner.address
    }
}

/// Which logs of event `E` to fetch: emitter addresses plus optional
/// restrictions on the indexed arguments (topics 1..=3).
///
/// An empty topic list matches any value.
#[derive(Debug)]
pub struct EventQuery<E> {
    addresses: Vec<Address>,
    topics: [Vec<B256>; 3],
    _event: PhantomData<fn() -> E>,
}

impl<E> Clone for EventQuery<E> {
    fn clone(&self) -> Self {
        Self {
            addresses: self.addresses.clone(),
            topics: self.topics.clone(),
            _event: PhantomData,
        }
    }
}

impl<E: SolEvent> EventQuery<E> {
    /// Logs of `E` emitted by `address`.
    pub fn new(address: Address) -> Self {
        Self::from_addresses(vec![address])
    }

    /// Logs of `E` emitted by any of `addresses`.
    pub fn from_addresses(addresses: Vec<Address>) -> Self {
        Self {
            addresses,
            topics: Default::default(),
            _event: PhantomData,
        }
    }

    /// Restrict the first indexed argument.
    pub fn topic1(mut self, values: impl IntoIterator<Item = B256>) -> Self {
        self.topics[0].extend(values);
        self
    }

    /// Restrict the second indexed argument.
    pub fn topic2(mut self, values: impl IntoIterator<Item = B256>) -> Self {
        self.topics[1].extend(values);
        self
    }

    /// Restrict the third indexed argument.
    pub fn topic3(mut self, values: impl IntoIterator<Item = B256>) -> Self {
        self.topics[2].extend(values);
        self
    }

    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    pub const fn topics(&self) -> &[Vec<B256>; 3] {
        &self.topics
    }

    /// RPC filter for the inclusive block range `from..=to`.
    pub fn filter(&self, from: u64, to: u64) -> Filter {
        let mut filter = Filter::new()
            .address(self.addresses.clone())
            .event_signature(E::SIGNATURE_HASH)
            .from_block(from)
            .to_block(to);

        if !self.topics[0].is_empty() {
            filter = filter.topic1(self.topics[0].clone());
        }
        if !self.topics[1].is_empty() {
            filter = filter.topic2(self.topics[1].clone());
        }
        if !self.topics[2].is_empty() {
            filter = filter.topic3(self.topics[2].clone());
        }

        filter
    }
}

/// Topic encoding of an indexed `uint256`.
pub const fn u256_topic(value: U256) -> B256 {
    B256::new(value.to_be_bytes::<32>())
}

/// Topic encoding of an indexed `address`.
pub fn address_topic(address: Address) -> B256 {
    address.into_word()
}

/// Decode one raw log as event `E`.
///
/// A log of a different event (wrong topic0) or with malformed data returns
/// the ABI decoding error.
pub fn parse_log<E: SolEvent>(log: &Log) -> Result<E, alloy_sol_types::Error> {
    let decoded = E::decode_log(&log.inner)?;
    Ok(decoded.data)
}

/// Decode every `E` in a receipt, optionally only those emitted by `emitter`.
pub fn parse_receipt<E: SolEvent>(
    receipt: &TransactionReceipt,
    emitter: Option<Address>,
) -> Vec<DecodedLog<E>> {
    receipt
        .logs()
        .iter()
        .filter(|log| emitter.is_none_or(|address| log.inner.address == address))
        .filter_map(|log| {
            parse_log::<E>(log).ok().map(|event| DecodedLog {
                event,
                log: log.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod test_utils {
    use alloy_primitives::{Address, Log as PrimitiveLog};
    use alloy_provider::{network::Ethereum, DynProvider, Provider, ProviderBuilder, RootProvider};
    use alloy_rpc_types_eth::Log;
    use alloy_sol_types::SolEvent;
    use alloy_transport::mock::Asserter;

    /// Provider that must never be reached.
    #[derive(Clone)]
    pub struct MockProvider;

    impl Provider for MockProvider {
        fn root(&self) -> &RootProvider<Ethereum> {
            todo!()
        }
    }

    /// Provider answering from a queue of canned JSON-RPC responses, in
    /// request order.
    pub fn mocked_provider() -> (Asserter, DynProvider) {
        let asserter = Asserter::new();
        let provider = ProviderBuilder::new()
            .connect_mocked_client(asserter.clone())
            .erased();
        (asserter, provider)
    }

    pub fn rpc_log<E: SolEvent>(emitter: Address, event: &E, block: u64) -> Log {
        Log {
            inner: PrimitiveLog {
                address: emitter,
                data: event.encode_log_data(),
            },
            block_number: Some(block),
            ..Default::default()
        }
    }
}
