//! Compiled contract artifacts and deployment.
//!
//! A [`ContractArtifact`] carries the JSON ABI and creation bytecode of a
//! contract, as emitted by Foundry (`out/<File>.sol/<Name>.json`) or Hardhat
//! (`artifacts/.../<Name>.json`).

use alloy_contract::RawCallBuilder;
use alloy_json_abi::JsonAbi;
use alloy_primitives::{Address, Bytes};
use alloy_provider::{network::Ethereum, Provider};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArtifactError {
    /// Error reading the artifact file
    #[error("Failed to read artifact: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing the artifact JSON
    #[error("Invalid artifact JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Bytecode is not plain hex (e.g. unlinked library placeholders)
    #[error("Invalid bytecode: {0}")]
    InvalidBytecode(String),

    /// Interfaces and abstract contracts have no creation code
    #[error("Artifact {0} has no deployable bytecode")]
    NoBytecode(String),

    #[error("Function {0} missing from artifact ABI")]
    MissingFunction(String),

    #[error("Event {0} missing from artifact ABI")]
    MissingEvent(String),

    /// Error reported by the deployment transaction
    #[error("Deployment failed: {0}")]
    Deploy(#[from] alloy_contract::Error),
}

/// ABI and bytecode of a compiled contract.
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    pub contract_name: Option<String>,
    pub abi: JsonAbi,
    /// Creation code, empty for interfaces
    pub bytecode: Bytes,
    pub deployed_bytecode: Option<Bytes>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    contract_name: Option<String>,
    abi: JsonAbi,
    bytecode: Option<RawBytecode>,
    deployed_bytecode: Option<RawBytecode>,
}

/// Hardhat stores bytecode as a string, Foundry nests it under `object`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    Hex(String),
    Object { object: String },
}

impl RawBytecode {
    fn parse(self) -> Result<Bytes, ArtifactError> {
        let hex = match self {
            Self::Hex(hex) | Self::Object { object: hex } => hex,
        };
        if hex.is_empty() {
            return Ok(Bytes::new());
        }
        hex.parse()
            .map_err(|e| ArtifactError::InvalidBytecode(format!("{}", e)))
    }
}

impl ContractArtifact {
    pub fn from_json(json: &str) -> Result<Self, ArtifactError> {
        let raw: RawArtifact = serde_json::from_str(json)?;

        let bytecode = match raw.bytecode {
            Some(code) => code.parse()?,
            None => Bytes::new(),
        };
        let deployed_bytecode = raw.deployed_bytecode.map(RawBytecode::parse).transpose()?;

        Ok(Self {
            contract_name: raw.contract_name,
            abi: raw.abi,
            bytecode,
            deployed_bytecode,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let mut artifact = Self::from_json(&contents)?;

        // Foundry artifacts omit the name; fall back to the file stem.
        if artifact.contract_name.is_none() {
            artifact.contract_name = path
                .as_ref()
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned());
        }

        Ok(artifact)
    }

    /// Name used in logs and errors.
    pub fn name(&self) -> &str {
        self.contract_name.as_deref().unwrap_or("<unnamed>")
    }

    /// Whether the artifact carries creation code.
    pub fn is_deployable(&self) -> bool {
        !self.bytecode.is_empty()
    }

    /// Creation code followed by the ABI-encoded constructor arguments.
    pub fn deploy_code(&self, constructor_args: &[u8]) -> Bytes {
        let mut code = Vec::with_capacity(self.bytecode.len() + constructor_args.len());
        code.extend_from_slice(&self.bytecode);
        code.extend_from_slice(constructor_args);
        code.into()
    }

    /// Check that every function and event of `expected` is present in this
    /// artifact's ABI, matched by selector.
    pub fn check_interface(&self, expected: &JsonAbi) -> Result<(), ArtifactError> {
        for function in expected.functions() {
            let selector = function.selector();
            if !self.abi.functions().any(|f| f.selector() == selector) {
                return Err(ArtifactError::MissingFunction(function.signature()));
            }
        }

        for event in expected.events() {
            let selector = event.selector();
            if !self.abi.events().any(|e| e.selector() == selector) {
                return Err(ArtifactError::MissingEvent(event.signature()));
            }
        }

        Ok(())
    }
}

/// Deploy `artifact` and return the new contract address.
///
/// `constructor_args` must already be ABI-encoded (empty when the contract
/// has no constructor parameters).
pub async fn deploy<P>(
    provider: P,
    artifact: &ContractArtifact,
    constructor_args: &[u8],
) -> Result<Address, ArtifactError>
where
    P: Provider,
{
    if !artifact.is_deployable() {
        return Err(ArtifactError::NoBytecode(artifact.name().to_string()));
    }

    let code = artifact.deploy_code(constructor_args);
    let builder = RawCallBuilder::<P, Ethereum>::new_raw_deploy(provider, code);
    let address = builder.deploy().await?;

    Ok(address)
}
