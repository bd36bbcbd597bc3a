//! Signing through a signer-proxy service.
//!
//! The proxy exposes a single JSON-RPC method, `eth_signTransaction`, and keeps
//! the key material out of this process.

use alloy_primitives::{Address, Bytes};
use alloy_rpc_types::eth::TransactionRequest;
use eyre::{bail, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Delegates transaction signing to a signer-proxy over HTTP.
///
/// ```ignore
/// let signer = RemoteSigner::new("http://localhost:9060", address, 1);
/// let raw = signer.sign_transaction(tx_request).await?;
/// provider.send_raw_transaction(&raw).await?;
/// ```
#[derive(Debug, Clone)]
pub struct RemoteSigner {
    client: reqwest::Client,
    proxy_url: String,
    address: Address,
    chain_id: u64,
}

impl RemoteSigner {
    pub fn new(proxy_url: impl Into<String>, address: Address, chain_id: u64) -> Self {
        Self::with_client(reqwest::Client::new(), proxy_url, address, chain_id)
    }

    pub fn with_client(
        client: reqwest::Client,
        proxy_url: impl Into<String>,
        address: Address,
        chain_id: u64,
    ) -> Self {
        Self {
            client,
            proxy_url: proxy_url.into(),
            address,
            chain_id,
        }
    }

    pub const fn address(&self) -> Address {
        self.address
    }

    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Sign a filled transaction and return the EIP-2718 encoded bytes.
    pub async fn sign_transaction(&self, tx: TransactionRequest) -> Result<Bytes> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method: "eth_signTransaction",
            params: [tx],
            id: 1,
        };

        debug!(proxy = %self.proxy_url, from = %self.address, "Requesting remote signature");

        let response = self
            .client
            .post(&self.proxy_url)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("signer-proxy returned {status}: {body}");
        }

        let rpc_response: JsonRpcResponse<SignedTransaction> = response.json().await?;
        rpc_response.into_raw()
    }
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<T> {
    jsonrpc: &'static str,
    method: &'static str,
    params: T,
    id: u32,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

/// `eth_signTransaction` result; `raw` is the hex-encoded signed transaction.
#[derive(Debug, Deserialize)]
struct SignedTransaction {
    raw: Bytes,
}

impl JsonRpcResponse<SignedTransaction> {
    fn into_raw(self) -> Result<Bytes> {
        match (self.result, self.error) {
            (Some(signed), _) => Ok(signed.raw),
            (None, Some(error)) => bail!("JSON-RPC error {}: {}", error.code, error.message),
            (None, None) => bail!("JSON-RPC response carried neither result nor error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, hex};

    #[test]
    fn test_signer_accessors() {
        let signer = RemoteSigner::new(
            "http://localhost:9060",
            address!("5CFFA347b0aE99cc01E5c01714cA5658e54a23D1"),
            42161,
        );

        assert_eq!(
            signer.address(),
            address!("5CFFA347b0aE99cc01E5c01714cA5658e54a23D1")
        );
        assert_eq!(signer.chain_id(), 42161);
    }

    #[test]
    fn test_response_with_result() {
        let json = r#"{"jsonrpc":"2.0","id":1,"result":{"raw":"0x02f801","tx":{}}}"#;
        let response: JsonRpcResponse<SignedTransaction> = serde_json::from_str(json).unwrap();

        assert_eq!(response.into_raw().unwrap(), Bytes::from(hex!("02f801")));
    }

    #[test]
    fn test_response_with_error() {
        let json = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"locked"}}"#;
        let response: JsonRpcResponse<SignedTransaction> = serde_json::from_str(json).unwrap();

        let err = response.into_raw().unwrap_err();
        assert!(err.to_string().contains("locked"));
    }
}
