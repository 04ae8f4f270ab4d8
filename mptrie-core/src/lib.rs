//! # Merkle Patricia Trie
//!
//! A radix trie over byte-string keys whose root hash commits to every
//! key-value pair it holds.
//!
//! - Leaf, extension and branch nodes over 4-bit key digits (nibbles)
//! - RLP node serialization with Keccak-256 hashing, compatible with
//!   Ethereum's trie
//! - Persistent nodes: a cloned [`Trie`] is a cheap read-only snapshot
//! - Proofs written as `hash -> node` pairs into any [`KvWriter`]

pub mod error;
pub mod hasher;
pub mod nibbles;
pub mod node;
pub mod proof;
pub mod trie;

pub use error::{Result, TrieError};
pub use hasher::{keccak, EMPTY_ROOT};
pub use nibbles::Nibbles;
pub use node::{Node, NodeKind, RawNode, EMBED_THRESHOLD};
pub use proof::{build_proof, Proof, ProofNode};
pub use trie::Trie;

pub use mptrie_store::{InMemoryStorage, KvReader, KvWriter, StorageError};
