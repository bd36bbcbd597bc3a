//! RPC providers and transaction signing for the parent and child chains.
//!
//! Read paths use a plain HTTP provider. Write paths build a
//! [`TransactionRequest`], fill it with [`fill_transaction`] and hand it to a
//! [`SignerFn`], which is backed either by a local key or by a signer-proxy.

mod remote_signer;

use alloy_consensus::TxEnvelope;
use alloy_network::{eip2718::Encodable2718, EthereumWallet, TransactionBuilder};
use alloy_primitives::{Address, Bytes};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;
pub use remote_signer::RemoteSigner;
use std::{future::Future, pin::Pin, sync::Arc};
use thiserror::Error;
use tracing::debug;

/// A function that signs a transaction request and returns signed bytes.
///
/// The request is filled (nonce, fees, gas) before it reaches the signer.
pub type SignerFn = Arc<
    dyn Fn(TransactionRequest) -> Pin<Box<dyn Future<Output = eyre::Result<Bytes>> + Send>>
        + Send
        + Sync,
>;

/// Gas estimates are padded by 1/GAS_BUFFER_DIVISOR (20%).
const GAS_BUFFER_DIVISOR: u64 = 5;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Error parsing or validating URLs
    #[error("Invalid RPC URL: {0}")]
    InvalidUrl(String),

    /// Error with private key
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// Neither a private key nor a signer-proxy was configured
    #[error("No signer configured: {0}")]
    MissingSigner(String),
}

/// How transactions get signed.
#[derive(Debug, Clone)]
pub enum SignerConfig {
    /// Hex private key, with or without 0x prefix
    Local { private_key: String },
    /// Signer-proxy speaking `eth_signTransaction`
    Remote { url: String, address: Address },
}

impl SignerConfig {
    /// Pick a signer from optional CLI/env inputs. A proxy URL wins over a key.
    pub fn from_parts(
        private_key: Option<String>,
        signer_url: Option<String>,
        signer_address: Option<Address>,
    ) -> Result<Self, ClientError> {
        match (signer_url, signer_address, private_key) {
            (Some(url), Some(address), _) => Ok(Self::Remote { url, address }),
            (Some(_), None, _) => Err(ClientError::MissingSigner(
                "signer url given without signer address".to_string(),
            )),
            (None, _, Some(private_key)) => Ok(Self::Local { private_key }),
            (None, _, None) => Err(ClientError::MissingSigner(
                "set PRIVATE_KEY or --signer-url/--signer-address".to_string(),
            )),
        }
    }

    /// Address transactions will be sent from.
    pub fn address(&self) -> Result<Address, ClientError> {
        match self {
            Self::Local { private_key } => Ok(parse_private_key(private_key)?.address()),
            Self::Remote { address, .. } => Ok(*address),
        }
    }
}

fn parse_private_key(private_key: &str) -> Result<PrivateKeySigner, ClientError> {
    private_key
        .parse()
        .map_err(|e| ClientError::InvalidPrivateKey(format!("{}", e)))
}

/// Convenience function to create an ethereum rpc provider from url.
///
/// The provider is type-erased so it can be moved into spawned tasks and
/// signer closures.
pub async fn create_provider(rpc_url: &str) -> Result<DynProvider, ClientError> {
    let url = rpc_url
        .parse()
        .map_err(|e| ClientError::InvalidUrl(format!("{}", e)))?;
    let provider = ProviderBuilder::new().connect_http(url).erased();

    Ok(provider)
}

/// Create a provider with wallet signing capability from a private key.
///
/// Used by contract deployment, which goes through alloy's own send path.
pub fn create_wallet_provider(
    rpc_url: &str,
    private_key: &str,
) -> Result<impl Provider + Clone, ClientError> {
    let url = rpc_url
        .parse()
        .map_err(|e| ClientError::InvalidUrl(format!("{}", e)))?;

    let wallet = EthereumWallet::from(parse_private_key(private_key)?);
    let provider = ProviderBuilder::new().wallet(wallet).connect_http(url);

    Ok(provider)
}

/// Build a [`SignerFn`] for `config` on the chain with `chain_id`.
pub fn signer_fn<P>(
    config: &SignerConfig,
    chain_id: u64,
    provider: P,
) -> Result<SignerFn, ClientError>
where
    P: Provider + Clone + 'static,
{
    match config {
        SignerConfig::Local { private_key } => local_signer_fn(private_key, chain_id, provider),
        SignerConfig::Remote { url, address } => Ok(remote_signer_fn(
            RemoteSigner::new(url.clone(), *address, chain_id),
            provider,
        )),
    }
}

/// Create a SignerFn from a RemoteSigner and provider.
///
/// The provider fills nonce, gas and fees before the request goes to the proxy.
pub fn remote_signer_fn<P>(remote: RemoteSigner, provider: P) -> SignerFn
where
    P: Provider + Clone + 'static,
{
    let from_address = remote.address();
    let chain_id = remote.chain_id();

    Arc::new(move |tx| {
        let remote = remote.clone();
        let provider = provider.clone();
        Box::pin(async move {
            let filled_tx = fill_transaction(tx, &provider, from_address, chain_id).await?;
            remote.sign_transaction(filled_tx).await
        })
    })
}

/// Create a SignerFn from a local private key and provider.
pub fn local_signer_fn<P>(
    private_key: &str,
    chain_id: u64,
    provider: P,
) -> Result<SignerFn, ClientError>
where
    P: Provider + Clone + 'static,
{
    let signer = parse_private_key(private_key)?;
    let from_address = signer.address();
    let wallet = EthereumWallet::from(signer);

    Ok(Arc::new(move |tx: TransactionRequest| {
        let wallet = wallet.clone();
        let provider = provider.clone();
        Box::pin(async move {
            let filled_tx = fill_transaction(tx, &provider, from_address, chain_id).await?;

            let tx_envelope: TxEnvelope = filled_tx
                .build(&wallet)
                .await
                .map_err(|e| eyre::eyre!("{}", e))?;

            let mut encoded = Vec::new();
            tx_envelope.encode_2718(&mut encoded);
            Ok(Bytes::from(encoded))
        })
    }))
}

/// Fill missing transaction fields using the provider.
///
/// Fields already set on `tx` are left untouched.
pub async fn fill_transaction<P>(
    mut tx: TransactionRequest,
    provider: &P,
    from: Address,
    chain_id: u64,
) -> eyre::Result<TransactionRequest>
where
    P: Provider,
{
    if tx.from.is_none() {
        tx.from = Some(from);
    }

    if tx.chain_id.is_none() {
        tx.chain_id = Some(chain_id);
    }

    if tx.nonce.is_none() {
        let nonce = provider.get_transaction_count(from).await?;
        tx.nonce = Some(nonce);
    }

    // Fees first: estimation may depend on them.
    if tx.max_fee_per_gas.is_none() || tx.max_priority_fee_per_gas.is_none() {
        let fee_estimate = provider.estimate_eip1559_fees().await?;
        if tx.max_fee_per_gas.is_none() {
            tx.max_fee_per_gas = Some(fee_estimate.max_fee_per_gas);
        }
        if tx.max_priority_fee_per_gas.is_none() {
            tx.max_priority_fee_per_gas = Some(fee_estimate.max_priority_fee_per_gas);
        }
    }

    if tx.gas.is_none() {
        let gas_estimate = provider.estimate_gas(tx.clone()).await?;
        tx.gas = Some(gas_estimate + gas_estimate / GAS_BUFFER_DIVISOR);
    }

    debug!(
        from = %from,
        nonce = ?tx.nonce,
        gas = ?tx.gas,
        max_fee_per_gas = ?tx.max_fee_per_gas,
        "Filled transaction"
    );

    Ok(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    // Anvil's first dev account.
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[tokio::test]
    async fn test_invalid_url() {
        let result = create_provider("not a url").await;
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_private_key() {
        let result = create_wallet_provider("http://localhost:8545", "0xnothex");
        assert!(matches!(result, Err(ClientError::InvalidPrivateKey(_))));
    }

    #[test]
    fn test_signer_config_prefers_remote() {
        let proxy = address!("5CFFA347b0aE99cc01E5c01714cA5658e54a23D1");
        let config = SignerConfig::from_parts(
            Some(DEV_KEY.to_string()),
            Some("http://localhost:9060".to_string()),
            Some(proxy),
        )
        .unwrap();

        assert!(matches!(config, SignerConfig::Remote { .. }));
        assert_eq!(config.address().unwrap(), proxy);
    }

    #[test]
    fn test_signer_config_local_address() {
        let config = SignerConfig::from_parts(Some(DEV_KEY.to_string()), None, None).unwrap();

        assert_eq!(
            config.address().unwrap(),
            address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        );
    }

    #[test]
    fn test_signer_config_missing() {
        let result = SignerConfig::from_parts(None, None, None);
        assert!(matches!(result, Err(ClientError::MissingSigner(_))));

        let result = SignerConfig::from_parts(None, Some("http://localhost:9060".into()), None);
        assert!(matches!(result, Err(ClientError::MissingSigner(_))));
    }
}
