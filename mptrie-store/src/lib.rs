//! # mptrie-store
//!
//! Key-value stores used as sinks for Merkle Patricia Trie proofs.
//!
//! A proof is written as `hash -> serialized node` pairs, so a verifier that
//! only holds the root hash can fetch each node by its digest. The store is
//! expected to synchronize internally: several proofs may be written into the
//! same store from different threads.

pub mod error;
pub mod memory;

pub use error::{Result, StorageError};
pub use memory::InMemoryStorage;

use std::sync::Arc;

/// Write half of a byte-oriented key-value store
pub trait KvWriter {
    /// Insert or overwrite `key`
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Remove `key`; removing an absent key is not an error
    fn delete(&self, key: &[u8]) -> Result<()>;
}

/// Read half of a byte-oriented key-value store
pub trait KvReader {
    /// Check whether `key` is present
    fn has(&self, key: &[u8]) -> Result<bool>;

    /// Fetch an owned copy of the value under `key`
    fn get(&self, key: &[u8]) -> Result<Vec<u8>>;
}

impl<T: KvWriter + ?Sized> KvWriter for &T {
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        (**self).delete(key)
    }
}

impl<T: KvReader + ?Sized> KvReader for &T {
    fn has(&self, key: &[u8]) -> Result<bool> {
        (**self).has(key)
    }

    fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        (**self).get(key)
    }
}

impl<T: KvWriter + ?Sized> KvWriter for Arc<T> {
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        (**self).delete(key)
    }
}

impl<T: KvReader + ?Sized> KvReader for Arc<T> {
    fn has(&self, key: &[u8]) -> Result<bool> {
        (**self).has(key)
    }

    fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        (**self).get(key)
    }
}
