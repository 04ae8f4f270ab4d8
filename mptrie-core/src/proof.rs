//! # Merkle Proofs
//!
//! Collect the nodes on the path to a key so the key's value can be checked
//! against the root hash alone.
//!
//! A proof lists every node the lookup passes through, root first. Writing it
//! to a store puts each node under its own hash, so a verifier can start from
//! the root hash, fetch a node, hash-check it and follow the key to the next
//! reference.

use alloy_primitives::{Bytes, B256};
use mptrie_store::KvWriter;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TrieError};
use crate::node::Node;
use crate::trie::Trie;

/// One node of a proof: its hash and serialized form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofNode {
    pub hash: B256,
    pub encoded: Bytes,
}

impl ProofNode {
    fn new(node: &Node) -> Self {
        let encoded = node.serialize();
        ProofNode {
            hash: crate::hasher::keccak(&encoded),
            encoded: encoded.into(),
        }
    }
}

/// A Merkle proof for a key in the trie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    /// The key being proven
    pub key: Bytes,
    /// Value at the end of the path; `None` when the path ends at a branch
    /// without a value
    pub value: Option<Bytes>,
    /// Nodes from the root down to the terminal node
    pub nodes: Vec<ProofNode>,
}

impl Proof {
    /// Hash of the first node, which is the trie's root hash
    pub fn root(&self) -> Option<B256> {
        self.nodes.first().map(|node| node.hash)
    }

    /// Number of nodes in the proof
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Write every node as `hash -> serialized` in root-to-leaf order.
    ///
    /// Stops at the first store error; nodes already written stay in the store.
    pub fn write_to<W: KvWriter>(&self, sink: &W) -> Result<()> {
        for node in &self.nodes {
            sink.put(node.hash.as_slice(), &node.encoded)?;
        }
        Ok(())
    }
}

impl Trie {
    /// Collect the proof for `key` without writing it anywhere.
    ///
    /// Fails with [`TrieError::ProofUnavailable`] when the path reaches an
    /// absent node, a leaf for a different key, or an extension that leaves
    /// the key.
    pub fn prove(&self, key: &[u8]) -> Result<Proof> {
        let mut nodes = Vec::new();
        let value = self
            .walk(key, |node| nodes.push(ProofNode::new(node)))
            .map_err(|dead_end| TrieError::ProofUnavailable(dead_end.to_string()))?;

        Ok(Proof {
            key: Bytes::copy_from_slice(key),
            value: value.map(Bytes::copy_from_slice),
            nodes,
        })
    }
}

/// Build the proof for `key` and write its nodes into `sink`
pub fn build_proof<W: KvWriter>(key: &[u8], trie: &Trie, sink: &W) -> Result<Proof> {
    let proof = trie.prove(key)?;
    proof.write_to(sink)?;

    debug!(
        key = %hex::encode(key),
        nodes = proof.len(),
        root = %trie.hash(),
        "proof written"
    );
    Ok(proof)
}
