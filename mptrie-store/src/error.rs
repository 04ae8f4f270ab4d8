//! # Error types for key-value stores

use thiserror::Error;

/// Store error types
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Database not initialized")]
    NotInitialized,

    #[error("Key not found: {0}")]
    KeyNotFound(String),
}

impl StorageError {
    /// Build a `KeyNotFound` error carrying the hex form of the key
    pub fn key_not_found(key: &[u8]) -> Self {
        StorageError::KeyNotFound(hex::encode(key))
    }
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StorageError>;
