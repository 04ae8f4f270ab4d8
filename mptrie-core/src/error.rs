//! # Error types for the trie

use mptrie_store::StorageError;
use thiserror::Error;

/// Trie error types
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrieError {
    #[error("Cannot insert an empty key")]
    InvalidKey,

    #[error("Cannot produce proof: {0}")]
    ProofUnavailable(String),

    #[error("Malformed node: {0}")]
    MalformedNode(&'static str),

    #[error("Cannot pack {0} nibbles into bytes")]
    OddNibbles(usize),

    #[error("RLP decode error: {0}")]
    Rlp(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<alloy_rlp::Error> for TrieError {
    fn from(e: alloy_rlp::Error) -> Self {
        TrieError::Rlp(e.to_string())
    }
}

/// Result type for trie operations
pub type Result<T> = std::result::Result<T, TrieError>;
