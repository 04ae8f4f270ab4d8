//! # Node hashing
//!
//! Keccak-256 over the RLP form of a node. The empty trie commits to the
//! digest of the RLP empty string.

use alloy_primitives::{b256, keccak256, B256};

use crate::node::Node;

/// Empty trie root hash (keccak256(RLP("")))
pub const EMPTY_ROOT: B256 =
    b256!("56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421");

/// Serialized form of an absent node (RLP empty string)
pub const EMPTY_NODE_RAW: u8 = alloy_rlp::EMPTY_STRING_CODE;

/// Keccak-256 digest of arbitrary bytes
pub fn keccak(data: impl AsRef<[u8]>) -> B256 {
    keccak256(data)
}

/// Digest of a node's serialized form
pub fn hash_node(node: &Node) -> B256 {
    keccak(node.serialize())
}

/// Digest committing to a whole trie given its (possibly absent) root
pub fn hash_root(root: Option<&Node>) -> B256 {
    root.map_or(EMPTY_ROOT, hash_node)
}

/// Check whether a hash is the empty trie root
pub fn is_empty_root(hash: &B256) -> bool {
    *hash == EMPTY_ROOT
}
