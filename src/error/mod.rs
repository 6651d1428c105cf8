//! Error handling for the ledger
//!
//! This module provides the error type shared by every ledger operation.

use std::fmt;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, BlockchainError>;

/// Everything a ledger, wallet or mining round can fail with. Messages carry
/// the detail; the variant says which boundary rejected the input.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockchainError {
    /// Key generation, signing or hashing failed, or key material was unusable
    Crypto(String),
    Wallet(String),
    /// A transfer was refused before signature checks (bad amount, reserved sender)
    Transaction(String),
    /// Not a base58check address with the expected version byte
    InvalidAddress(String),
    /// A signature did not verify against the claimed sender's key
    InvalidSignature(String),
    /// The signing key does not derive the claimed sender address
    SenderKeyMismatch(String),
    /// A submission request is missing a field or carries an unparsable one
    MalformedRequest(String),
    /// Only raised when the ledger runs with the balance check enabled
    InsufficientFunds { required: f64, available: f64 },
    Mining(String),
    /// Bad settings file, environment override or out-of-range value
    Config(String),
    Serialization(String),
    Io(String),
}

impl fmt::Display for BlockchainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockchainError::Crypto(msg) => write!(f, "crypto failure: {msg}"),
            BlockchainError::Wallet(msg) => write!(f, "wallet rejected: {msg}"),
            BlockchainError::Transaction(msg) => write!(f, "transaction refused: {msg}"),
            BlockchainError::InvalidAddress(addr) => write!(f, "bad address: {addr}"),
            BlockchainError::InvalidSignature(msg) => write!(f, "signature check failed: {msg}"),
            BlockchainError::SenderKeyMismatch(msg) => {
                write!(f, "key not owned by sender: {msg}")
            }
            BlockchainError::MalformedRequest(msg) => write!(f, "malformed request: {msg}"),
            BlockchainError::InsufficientFunds {
                required,
                available,
            } => write!(f, "not enough balance: wants {required}, has {available}"),
            BlockchainError::Mining(msg) => write!(f, "mining round failed: {msg}"),
            BlockchainError::Config(msg) => write!(f, "bad settings: {msg}"),
            BlockchainError::Serialization(msg) => write!(f, "encoding failure: {msg}"),
            BlockchainError::Io(msg) => write!(f, "io failure: {msg}"),
        }
    }
}

impl std::error::Error for BlockchainError {}

impl From<std::io::Error> for BlockchainError {
    fn from(err: std::io::Error) -> Self {
        BlockchainError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for BlockchainError {
    fn from(err: toml::de::Error) -> Self {
        BlockchainError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for BlockchainError {
    fn from(err: serde_json::Error) -> Self {
        BlockchainError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_funds_display() {
        let err = BlockchainError::InsufficientFunds {
            required: 2.5,
            available: 1.0,
        };
        assert_eq!(
            err.to_string(),
            "not enough balance: wants 2.5, has 1"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: BlockchainError = io.into();
        assert!(matches!(err, BlockchainError::Io(_)));
    }
}
