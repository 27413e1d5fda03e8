use std::path::PathBuf;

use ethers::types::H256;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Unsupported RPC URL scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),

    #[error("Network '{name}' not found in credentials (available: {available})")]
    UnknownNetwork { name: String, available: String },

    #[error("No {field} configured for network '{network}'")]
    MissingField { network: String, field: &'static str },

    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Wallet error: {0}")]
    Wallet(#[from] ethers::signers::WalletError),

    #[error("Hex error: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("No artifact for contract '{name}' under {}", .root.display())]
    ArtifactNotFound { name: String, root: PathBuf },

    #[error("Multiple artifacts for contract '{name}', use a fully qualified name: {paths}")]
    AmbiguousArtifact { name: String, paths: String },

    #[error("Contract '{0}' is abstract or an interface and cannot be deployed")]
    AbstractContract(String),

    #[error("Artifact for contract '{0}' has no deployedBytecode")]
    MissingRuntimeCode(String),

    #[error("Contract '{contract}' needs libraries linked before deployment: {libraries}")]
    UnlinkedLibraries { contract: String, libraries: String },

    #[error("Constructor expects {expected} arguments, got {got}")]
    ArgumentCount { expected: usize, got: usize },

    #[error("Invalid constructor argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Contract error: {0}")]
    Contract(String),

    #[error("Transaction receipt not found for {0:?}")]
    ReceiptNotFound(H256),
}

impl From<ethers::providers::ProviderError> for DeployError {
    fn from(err: ethers::providers::ProviderError) -> Self {
        DeployError::Provider(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DeployError>;
