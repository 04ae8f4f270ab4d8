//! # In-memory store
//!
//! A lock-guarded map from byte-string keys to byte-string values.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::trace;

use crate::error::{Result, StorageError};
use crate::{KvReader, KvWriter};

/// In-memory key-value store (volatile, useful for proofs and tests)
///
/// The backing map may be absent: a store built with
/// [`InMemoryStorage::uninitialized`], or one that has been
/// [`close`](InMemoryStorage::close)d, fails every operation with
/// [`StorageError::NotInitialized`].
#[derive(Debug)]
pub struct InMemoryStorage {
    kv: RwLock<Option<HashMap<Vec<u8>, Vec<u8>>>>,
}

impl InMemoryStorage {
    /// Create an empty, initialized store
    pub fn new() -> Self {
        InMemoryStorage {
            kv: RwLock::new(Some(HashMap::new())),
        }
    }

    /// Create a store with no backing map
    pub fn uninitialized() -> Self {
        InMemoryStorage {
            kv: RwLock::new(None),
        }
    }

    /// Drop the backing map; subsequent operations fail
    pub fn close(&self) {
        *self.kv.write() = None;
    }

    /// Number of stored entries
    pub fn len(&self) -> Result<usize> {
        self.kv
            .read()
            .as_ref()
            .map(HashMap::len)
            .ok_or(StorageError::NotInitialized)
    }

    /// Check if the store holds no entries
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl KvWriter for InMemoryStorage {
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut guard = self.kv.write();
        let kv = guard.as_mut().ok_or(StorageError::NotInitialized)?;

        trace!(key = %hex::encode(key), len = value.len(), "store put");
        kv.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        let mut guard = self.kv.write();
        let kv = guard.as_mut().ok_or(StorageError::NotInitialized)?;

        trace!(key = %hex::encode(key), "store delete");
        kv.remove(key);
        Ok(())
    }
}

impl KvReader for InMemoryStorage {
    fn has(&self, key: &[u8]) -> Result<bool> {
        let guard = self.kv.read();
        let kv = guard.as_ref().ok_or(StorageError::NotInitialized)?;
        Ok(kv.contains_key(key))
    }

    fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        let guard = self.kv.read();
        let kv = guard.as_ref().ok_or(StorageError::NotInitialized)?;

        kv.get(key)
            .cloned()
            .ok_or_else(|| StorageError::key_not_found(key))
    }
}
