//! Error taxonomy shared by every subsystem.

use crate::content::ContentId;
use crate::wallet::{Capability, ProviderError};
use thiserror::Error;

pub type AmdtelResult<T> = Result<T, AmdtelError>;

#[derive(Error, Debug)]
pub enum AmdtelError {
    /// No provider object in the environment, or none of them can be enabled.
    #[error("No Cardano wallet detected. Please install Nami, Eternl, Flint, Lace, or Yoroi wallet.")]
    NoWalletProvider,

    #[error("Wallet does not support {capability}")]
    WalletCapability { capability: Capability },

    #[error("Wallet error: {0}")]
    WalletProvider(String),

    #[error("Failed to get wallet information: {cause}")]
    ConnectFailed { cause: String },

    #[error("A wallet connection is already in progress")]
    ConnectInProgress,

    #[error("Address decoding failed: {0}")]
    AddressDecoding(String),

    #[error("No wallet address available")]
    NoAddress,

    #[error("Decryption failed: {0}")]
    Decryption(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Content not found: {0}")]
    NotFound(ContentId),

    #[error("Content store error: {0}")]
    ContentStore(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for AmdtelError {
    fn from(e: serde_json::Error) -> Self {
        AmdtelError::Serialization(e.to_string())
    }
}

impl From<ProviderError> for AmdtelError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Unsupported(capability) => AmdtelError::WalletCapability { capability },
            other => AmdtelError::WalletProvider(other.to_string()),
        }
    }
}

impl AmdtelError {
    /// Whether retrying the same operation with the same inputs could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AmdtelError::ContentStore(_) | AmdtelError::Io(_) | AmdtelError::ConnectInProgress)
    }
}
