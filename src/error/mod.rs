//! Error handling for the node
//!
//! This module provides the error types for all ledger and network operations.

use std::fmt;

/// Result type alias for node operations
pub type Result<T> = std::result::Result<T, NodeError>;

/// Error types for ledger and network operations
#[derive(Debug, Clone)]
pub enum NodeError {
    /// Transaction shape validation errors
    Transaction(String),
    /// Mempool add with an id that is already present
    DuplicateTransaction(String),
    /// Signature verification failed or the sender's key is not registered
    Signature(String),
    /// Simulated balance went negative during validation
    InsufficientBalance {
        address: String,
        balance: f64,
        amount: f64,
    },
    /// Block linkage, hash, or proof-of-work errors
    InvalidBlock(String),
    /// Mining errors, including re-entry while a mine is in flight
    Mining(String),
    /// Peer communication errors
    Network(String),
    /// Cryptographic operation errors
    Crypto(String),
    /// Serialization/deserialization errors
    Serialization(String),
    /// File I/O errors
    Io(String),
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeError::Transaction(msg) => write!(f, "Transaction error: {msg}"),
            NodeError::DuplicateTransaction(id) => {
                write!(f, "Transaction {id} already in mempool")
            }
            NodeError::Signature(msg) => write!(f, "Signature error: {msg}"),
            NodeError::InsufficientBalance {
                address,
                balance,
                amount,
            } => {
                write!(
                    f,
                    "Insufficient balance: address {address} has {balance:.2} but tried to send {amount:.2}"
                )
            }
            NodeError::InvalidBlock(msg) => write!(f, "Invalid block: {msg}"),
            NodeError::Mining(msg) => write!(f, "Mining error: {msg}"),
            NodeError::Network(msg) => write!(f, "Network error: {msg}"),
            NodeError::Crypto(msg) => write!(f, "Cryptographic error: {msg}"),
            NodeError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            NodeError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for NodeError {}

impl From<std::io::Error> for NodeError {
    fn from(err: std::io::Error) -> Self {
        NodeError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for NodeError {
    fn from(err: serde_json::Error) -> Self {
        NodeError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for NodeError {
    fn from(err: reqwest::Error) -> Self {
        NodeError::Network(err.to_string())
    }
}
