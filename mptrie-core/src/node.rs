//! # Trie Node Types
//!
//! The trie has three node kinds:
//! 1. Leaf - the remaining key suffix and the stored value
//! 2. Extension - a shared, non-empty path prefix leading to one child
//! 3. Branch - 16-way fan-out plus an optional value
//!
//! An absent node (the empty trie, an unused branch slot) is `None` at the
//! slot that would hold it. Nodes are immutable once built; the engine swaps
//! whole subtrees instead of editing them, and children are shared through
//! `Arc` so a cloned trie is a cheap snapshot.
//!
//! Every node has a structural form ([`RawNode`]): a nested list of byte
//! strings. Its RLP encoding is the node's serialized form, and the Keccak-256
//! of that is the node's hash. A child whose serialized form is shorter than
//! [`EMBED_THRESHOLD`] bytes is embedded in its parent's structural form;
//! larger children are referenced by hash.

use std::sync::Arc;

use alloy_primitives::B256;
use alloy_rlp::{BufMut, Decodable, Encodable, Header};

use crate::error::{Result, TrieError};
use crate::hasher::keccak;
use crate::nibbles::Nibbles;

/// Serialized size at which a child is referenced by hash instead of embedded
pub const EMBED_THRESHOLD: usize = 32;

/// Number of child slots in a branch node
pub const BRANCH_WIDTH: usize = 16;

/// Child slots of a branch node
pub type Children = [Option<Arc<Node>>; BRANCH_WIDTH];

/// Structural form of a node: byte strings and nested lists
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawNode {
    Bytes(Vec<u8>),
    List(Vec<RawNode>),
}

impl RawNode {
    /// The marker for an absent child or an unset branch value
    pub fn empty() -> Self {
        RawNode::Bytes(Vec::new())
    }

    /// Get the byte string, if this is one
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            RawNode::Bytes(bytes) => Some(bytes),
            RawNode::List(_) => None,
        }
    }

    /// Get the list items, if this is a list
    pub fn as_list(&self) -> Option<&[RawNode]> {
        match self {
            RawNode::Bytes(_) => None,
            RawNode::List(items) => Some(items),
        }
    }

    /// Check for the empty marker
    pub fn is_empty(&self) -> bool {
        matches!(self, RawNode::Bytes(bytes) if bytes.is_empty())
    }

    /// RLP-encode into a fresh buffer
    pub fn to_rlp(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.length());
        self.encode(&mut out);
        out
    }

    /// Decode a complete RLP buffer, rejecting trailing bytes
    pub fn from_rlp(mut data: &[u8]) -> Result<Self> {
        let raw = RawNode::decode(&mut data)?;
        if !data.is_empty() {
            return Err(TrieError::Rlp(format!("{} trailing bytes", data.len())));
        }
        Ok(raw)
    }

    fn payload_length(items: &[RawNode]) -> usize {
        items.iter().map(|item| item.length()).sum()
    }
}

impl Encodable for RawNode {
    fn encode(&self, out: &mut dyn BufMut) {
        match self {
            RawNode::Bytes(bytes) => bytes.as_slice().encode(out),
            RawNode::List(items) => {
                Header {
                    list: true,
                    payload_length: Self::payload_length(items),
                }
                .encode(out);
                for item in items {
                    item.encode(out);
                }
            }
        }
    }

    fn length(&self) -> usize {
        match self {
            RawNode::Bytes(bytes) => bytes.as_slice().length(),
            RawNode::List(items) => {
                let payload_length = Self::payload_length(items);
                payload_length + alloy_rlp::length_of_length(payload_length)
            }
        }
    }
}

impl Decodable for RawNode {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let header = Header::decode(buf)?;
        let data = *buf;
        if data.len() < header.payload_length {
            return Err(alloy_rlp::Error::InputTooShort);
        }
        let (mut payload, rest) = data.split_at(header.payload_length);
        *buf = rest;

        if !header.list {
            return Ok(RawNode::Bytes(payload.to_vec()));
        }

        let mut items = Vec::new();
        while !payload.is_empty() {
            items.push(RawNode::decode(&mut payload)?);
        }
        Ok(RawNode::List(items))
    }
}

/// Node kind, for inspection without matching on contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Leaf,
    Extension,
    Branch,
}

/// Trie node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Leaf node: [hex_prefix(path, leaf), value]
    Leaf { path: Nibbles, value: Vec<u8> },

    /// Extension node: [hex_prefix(path, extension), child]
    Extension { path: Nibbles, next: Arc<Node> },

    /// Branch node: [child0, ..., child15, value]
    Branch {
        children: Box<Children>,
        value: Option<Vec<u8>>,
    },
}

impl Node {
    /// Create leaf node
    pub fn leaf(path: Nibbles, value: Vec<u8>) -> Self {
        Node::Leaf { path, value }
    }

    /// Create extension node; the shared path must not be empty
    pub fn extension(path: Nibbles, next: impl Into<Arc<Node>>) -> Result<Self> {
        if path.is_empty() {
            return Err(TrieError::MalformedNode("extension with empty path"));
        }
        Ok(Node::Extension {
            path,
            next: next.into(),
        })
    }

    /// Create branch node from its slots and optional value
    pub fn branch(children: Children, value: Option<Vec<u8>>) -> Self {
        Node::Branch {
            children: Box::new(children),
            value,
        }
    }

    /// Node kind
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Leaf { .. } => NodeKind::Leaf,
            Node::Extension { .. } => NodeKind::Extension,
            Node::Branch { .. } => NodeKind::Branch,
        }
    }

    /// Path stored in a leaf or extension
    pub fn path(&self) -> Option<&Nibbles> {
        match self {
            Node::Leaf { path, .. } | Node::Extension { path, .. } => Some(path),
            Node::Branch { .. } => None,
        }
    }

    /// Value stored in a leaf or branch
    pub fn value(&self) -> Option<&[u8]> {
        match self {
            Node::Leaf { value, .. } => Some(value),
            Node::Branch { value, .. } => value.as_deref(),
            Node::Extension { .. } => None,
        }
    }

    /// Child reached by `nibble` from a branch
    pub fn child(&self, nibble: u8) -> Option<&Node> {
        match self {
            Node::Branch { children, .. } => children.get(nibble as usize)?.as_deref(),
            _ => None,
        }
    }

    /// Structural form of this node
    pub fn raw(&self) -> RawNode {
        match self {
            Node::Leaf { path, value } => RawNode::List(vec![
                RawNode::Bytes(path.to_hex_prefix(true)),
                RawNode::Bytes(value.clone()),
            ]),
            Node::Extension { path, next } => RawNode::List(vec![
                RawNode::Bytes(path.to_hex_prefix(false)),
                child_reference(next),
            ]),
            Node::Branch { children, value } => {
                let mut items = Vec::with_capacity(BRANCH_WIDTH + 1);
                for child in children.iter() {
                    items.push(match child {
                        Some(node) => child_reference(node),
                        None => RawNode::empty(),
                    });
                }
                items.push(RawNode::Bytes(value.clone().unwrap_or_default()));
                RawNode::List(items)
            }
        }
    }

    /// RLP-encoded structural form
    pub fn serialize(&self) -> Vec<u8> {
        self.raw().to_rlp()
    }

    /// Keccak-256 of the serialized form
    pub fn hash(&self) -> B256 {
        keccak(self.serialize())
    }
}

/// How a parent refers to `node`: inline structural form when its serialized
/// form is under [`EMBED_THRESHOLD`] bytes, otherwise its hash.
pub fn child_reference(node: &Node) -> RawNode {
    let encoded = node.serialize();
    if encoded.len() < EMBED_THRESHOLD {
        node.raw()
    } else {
        RawNode::Bytes(keccak(&encoded).to_vec())
    }
}
