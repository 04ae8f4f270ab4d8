//! # Patricia Trie
//!
//! The trie engine: lookup and insertion over the node model.
//!
//! Insertion never edits a node. Each step takes the subtree currently in a
//! slot and returns the subtree that replaces it, so the root is rebuilt along
//! the key's path and every untouched sibling is shared with the previous
//! version.

use std::fmt;
use std::sync::Arc;

use alloy_primitives::B256;
use tracing::trace;

use crate::error::{Result, TrieError};
use crate::hasher::hash_root;
use crate::nibbles::Nibbles;
use crate::node::{Children, Node};

/// Merkle Patricia Trie
///
/// Cloning is cheap and yields an immutable snapshot: later `put`s on either
/// copy do not affect the other.
#[derive(Debug, Clone, Default)]
pub struct Trie {
    root: Option<Arc<Node>>,
}

/// Where a lookup stopped without reaching a value-bearing node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeadEnd {
    /// The walk reached an absent slot
    Absent,
    /// A leaf's path differs from the rest of the key
    LeafMismatch,
    /// An extension's path is not a prefix of the rest of the key
    ExtensionMismatch,
}

impl fmt::Display for DeadEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeadEnd::Absent => write!(f, "node is empty"),
            DeadEnd::LeafMismatch => write!(f, "key not found"),
            DeadEnd::ExtensionMismatch => write!(f, "extension path does not match"),
        }
    }
}

impl Trie {
    /// Create new empty trie
    pub fn new() -> Self {
        Trie { root: None }
    }

    /// Root node, `None` for the empty trie
    pub fn root(&self) -> Option<&Node> {
        self.root.as_deref()
    }

    /// Check if trie is empty
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Root hash committing to every key-value pair
    pub fn hash(&self) -> B256 {
        hash_root(self.root())
    }

    /// Get value for key
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.walk(key, |_| {}).ok().flatten()
    }

    /// Check whether a value is stored under key
    pub fn contains(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Insert or update a key-value pair.
    ///
    /// Fails with [`TrieError::InvalidKey`] on an empty key, leaving the trie
    /// untouched.
    pub fn put(&mut self, key: &[u8], value: impl Into<Vec<u8>>) -> Result<()> {
        if key.is_empty() {
            return Err(TrieError::InvalidKey);
        }

        let nibbles = Nibbles::from_bytes(key);
        let root = insert_at(self.root.as_deref(), nibbles, value.into())?;
        self.root = Some(Arc::new(root));
        Ok(())
    }

    /// Follow `key` from the root, calling `visit` on every node the key
    /// passes through.
    ///
    /// Returns the value stored under the key, `Ok(None)` when the key ends at
    /// a branch without a value, or the dead end that stopped the walk.
    pub(crate) fn walk<'a>(
        &'a self,
        key: &[u8],
        mut visit: impl FnMut(&'a Node),
    ) -> std::result::Result<Option<&'a [u8]>, DeadEnd> {
        let nibbles = Nibbles::from_bytes(key);
        let mut remaining = nibbles.as_slice();
        let mut current = self.root.as_deref();

        loop {
            let node = current.ok_or(DeadEnd::Absent)?;

            match node {
                Node::Leaf { path, value } => {
                    if path.as_slice() != remaining {
                        return Err(DeadEnd::LeafMismatch);
                    }
                    visit(node);
                    return Ok(Some(value.as_slice()));
                }

                Node::Branch { children, value } => {
                    visit(node);
                    match remaining.split_first() {
                        None => return Ok(value.as_deref()),
                        Some((nibble, rest)) => {
                            remaining = rest;
                            current = children[*nibble as usize].as_deref();
                        }
                    }
                }

                Node::Extension { path, next } => {
                    if !remaining.starts_with(path.as_slice()) {
                        return Err(DeadEnd::ExtensionMismatch);
                    }
                    visit(node);
                    remaining = &remaining[path.len()..];
                    current = Some(next.as_ref());
                }
            }
        }
    }
}

/// Insert `value` under `key` (the unconsumed nibbles) into the subtree
/// `node`, returning the subtree that replaces it.
fn insert_at(node: Option<&Node>, key: Nibbles, value: Vec<u8>) -> Result<Node> {
    let node = match node {
        Some(node) => node,
        None => return Ok(Node::leaf(key, value)),
    };

    match node {
        Node::Leaf {
            path,
            value: existing,
        } => {
            let matched = path.common_prefix_len(&key);

            if matched == path.len() && matched == key.len() {
                trace!(path = %path, "updating leaf value");
                return Ok(Node::leaf(key, value));
            }

            trace!(path = %path, key = %key, matched, "splitting leaf");

            let mut children: Children = Default::default();
            let mut branch_value = None;

            match path.get(matched) {
                Some(nibble) => {
                    let leaf = Node::leaf(path.slice(matched + 1), existing.clone());
                    children[nibble as usize] = Some(Arc::new(leaf));
                }
                None => branch_value = Some(existing.clone()),
            }

            match key.get(matched) {
                Some(nibble) => {
                    let leaf = Node::leaf(key.slice(matched + 1), value);
                    children[nibble as usize] = Some(Arc::new(leaf));
                }
                None => branch_value = Some(value),
            }

            with_prefix(key.slice_range(0, matched), Node::branch(children, branch_value))
        }

        Node::Branch {
            children,
            value: existing,
        } => match key.first() {
            None => {
                trace!("setting branch value");
                Ok(Node::Branch {
                    children: children.clone(),
                    value: Some(value),
                })
            }
            Some(nibble) => {
                let index = nibble as usize;
                let child = insert_at(children[index].as_deref(), key.slice(1), value)?;

                let mut children = children.clone();
                children[index] = Some(Arc::new(child));
                Ok(Node::Branch {
                    children,
                    value: existing.clone(),
                })
            }
        },

        Node::Extension { path, next } => {
            let matched = path.common_prefix_len(&key);

            if matched == path.len() {
                let child = insert_at(Some(next.as_ref()), key.slice(matched), value)?;
                return Node::extension(path.clone(), child);
            }

            trace!(path = %path, key = %key, matched, "splitting extension");

            let mut children: Children = Default::default();
            let mut branch_value = None;

            // matched < path.len(), so the extension has a nibble at `matched`
            if let Some(nibble) = path.get(matched) {
                let rest = path.slice(matched + 1);
                let child = if rest.is_empty() {
                    Arc::clone(next)
                } else {
                    Arc::new(Node::extension(rest, Arc::clone(next))?)
                };
                children[nibble as usize] = Some(child);
            }

            match key.get(matched) {
                Some(nibble) => {
                    let leaf = Node::leaf(key.slice(matched + 1), value);
                    children[nibble as usize] = Some(Arc::new(leaf));
                }
                None => branch_value = Some(value),
            }

            with_prefix(path.slice_range(0, matched), Node::branch(children, branch_value))
        }
    }
}

/// Put `branch` behind an extension over `prefix`, or return it as is when
/// the prefix is empty
fn with_prefix(prefix: Nibbles, branch: Node) -> Result<Node> {
    if prefix.is_empty() {
        Ok(branch)
    } else {
        Node::extension(prefix, branch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::EMPTY_ROOT;
    use crate::node::NodeKind;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn root(trie: &Trie) -> &Node {
        trie.root().expect("trie should not be empty")
    }

    #[test]
    fn test_empty_trie() {
        let trie = Trie::new();
        assert!(trie.is_empty());
        assert_eq!(trie.hash(), EMPTY_ROOT);
        assert_eq!(trie.get(b"key"), None);
    }

    #[test]
    fn test_single_insert() {
        let mut trie = Trie::new();
        trie.put(b"account.address", b"XYZABCDEF".to_vec()).unwrap();

        let node = root(&trie);
        assert_eq!(node.kind(), NodeKind::Leaf);
        assert_eq!(node.path(), Some(&Nibbles::from_bytes(b"account.address")));
        assert_eq!(node.value(), Some(&b"XYZABCDEF"[..]));

        assert_eq!(trie.get(b"account.address"), Some(&b"XYZABCDEF"[..]));
        assert_eq!(trie.get(b"account"), None);
        assert_eq!(trie.get(b"account.address.x"), None);
    }

    #[test]
    fn test_empty_key_rejected() {
        let mut trie = Trie::new();
        assert_eq!(trie.put(b"", b"value".to_vec()), Err(TrieError::InvalidKey));
        assert!(trie.is_empty());

        trie.put(b"key", b"value".to_vec()).unwrap();
        let before = trie.hash();
        assert_eq!(trie.put(&[], b"other".to_vec()), Err(TrieError::InvalidKey));
        assert_eq!(trie.hash(), before);
    }

    #[test]
    fn test_update_keeps_shape() {
        let mut trie = Trie::new();
        trie.put(b"key", b"value1".to_vec()).unwrap();
        let first = trie.hash();

        trie.put(b"key", b"value2".to_vec()).unwrap();
        assert_eq!(root(&trie).kind(), NodeKind::Leaf);
        assert_eq!(trie.get(b"key"), Some(&b"value2"[..]));
        assert_ne!(trie.hash(), first);
    }

    #[test]
    fn test_shared_prefix_makes_extension() {
        let mut trie = Trie::new();
        trie.put(b"accounts.address", b"A".to_vec()).unwrap();
        trie.put(b"accounts.value", b"B".to_vec()).unwrap();

        let node = root(&trie);
        assert_eq!(node.kind(), NodeKind::Extension);
        assert_eq!(node.path(), Some(&Nibbles::from_bytes(b"accounts.")));

        let Node::Extension { next, .. } = node else {
            panic!("expected extension");
        };
        assert_eq!(next.kind(), NodeKind::Branch);
        assert_eq!(next.value(), None);

        assert_eq!(trie.get(b"accounts.address"), Some(&b"A"[..]));
        assert_eq!(trie.get(b"accounts.value"), Some(&b"B"[..]));
    }

    #[test]
    fn test_no_shared_prefix_makes_branch() {
        let mut trie = Trie::new();
        trie.put(b"accounts.balance", b"X".to_vec()).unwrap();
        trie.put(b"system.version", b"Y".to_vec()).unwrap();

        let node = root(&trie);
        assert_eq!(node.kind(), NodeKind::Branch);

        let a = Nibbles::from_bytes(b"accounts.balance");
        let s = Nibbles::from_bytes(b"system.version");

        let left = node.child(a.first().unwrap()).unwrap();
        assert_eq!(left.kind(), NodeKind::Leaf);
        assert_eq!(left.path(), Some(&a.slice(1)));
        assert_eq!(left.value(), Some(&b"X"[..]));

        let right = node.child(s.first().unwrap()).unwrap();
        assert_eq!(right.kind(), NodeKind::Leaf);
        assert_eq!(right.path(), Some(&s.slice(1)));
        assert_eq!(right.value(), Some(&b"Y"[..]));
    }

    #[test]
    fn test_prefix_key_terminates_at_branch() {
        let mut trie = Trie::new();
        trie.put(b"transfer.input", b"A".to_vec()).unwrap();
        trie.put(b"transfer.input.value", b"B".to_vec()).unwrap();

        let node = root(&trie);
        assert_eq!(node.kind(), NodeKind::Extension);
        assert_eq!(node.path(), Some(&Nibbles::from_bytes(b"transfer.input")));

        let Node::Extension { next, .. } = node else {
            panic!("expected extension");
        };
        assert_eq!(next.kind(), NodeKind::Branch);
        assert_eq!(next.value(), Some(&b"A"[..]));

        let rest = Nibbles::from_bytes(b".value");
        let leaf = next.child(rest.first().unwrap()).unwrap();
        assert_eq!(leaf.kind(), NodeKind::Leaf);
        assert_eq!(leaf.path(), Some(&rest.slice(1)));
        assert_eq!(leaf.value(), Some(&b"B"[..]));

        assert_eq!(trie.get(b"transfer.input"), Some(&b"A"[..]));
        assert_eq!(trie.get(b"transfer.input.value"), Some(&b"B"[..]));
        assert_eq!(trie.get(b"transfer.in"), None);
    }

    #[test]
    fn test_longer_key_first() {
        let mut trie = Trie::new();
        trie.put(b"transfer.input.value", b"B".to_vec()).unwrap();
        trie.put(b"transfer.input", b"A".to_vec()).unwrap();

        let mut forward = Trie::new();
        forward.put(b"transfer.input", b"A".to_vec()).unwrap();
        forward.put(b"transfer.input.value", b"B".to_vec()).unwrap();

        assert_eq!(trie.hash(), forward.hash());
        assert_eq!(trie.get(b"transfer.input"), Some(&b"A"[..]));
    }

    #[test]
    fn test_key_ends_at_existing_branch() {
        let mut trie = Trie::new();
        trie.put(&[0x61, 0x10], b"one".to_vec()).unwrap();
        trie.put(&[0x61, 0x20], b"two".to_vec()).unwrap();

        // Extension over [6, 1] into a branch; [0x61] stops exactly there
        assert_eq!(root(&trie).kind(), NodeKind::Extension);
        trie.put(&[0x61], b"short".to_vec()).unwrap();

        let Node::Extension { next, .. } = root(&trie) else {
            panic!("expected extension");
        };
        assert_eq!(next.value(), Some(&b"short"[..]));
        assert_eq!(trie.get(&[0x61]), Some(&b"short"[..]));
        assert_eq!(trie.get(&[0x61, 0x10]), Some(&b"one"[..]));
        assert_eq!(trie.get(&[0x61, 0x20]), Some(&b"two"[..]));

        trie.put(&[0x61], b"updated".to_vec()).unwrap();
        assert_eq!(trie.get(&[0x61]), Some(&b"updated"[..]));
    }

    #[test]
    fn test_key_ends_inside_extension() {
        let mut trie = Trie::new();
        trie.put(b"abc", b"1".to_vec()).unwrap();
        trie.put(b"abd", b"2".to_vec()).unwrap();

        // The extension covers "ab" plus the high nibble of 'c'/'d'
        trie.put(b"ab", b"0".to_vec()).unwrap();

        let node = root(&trie);
        assert_eq!(node.kind(), NodeKind::Extension);
        assert_eq!(node.path(), Some(&Nibbles::from_bytes(b"ab")));

        let Node::Extension { next, .. } = node else {
            panic!("expected extension");
        };
        assert_eq!(next.value(), Some(&b"0"[..]));
        assert_eq!(next.child(6).map(Node::kind), Some(NodeKind::Branch));

        assert_eq!(trie.get(b"ab"), Some(&b"0"[..]));
        assert_eq!(trie.get(b"abc"), Some(&b"1"[..]));
        assert_eq!(trie.get(b"abd"), Some(&b"2"[..]));
    }

    #[test]
    fn test_extension_split_at_first_nibble() {
        let mut trie = Trie::new();
        trie.put(b"abc", b"1".to_vec()).unwrap();
        trie.put(b"abd", b"2".to_vec()).unwrap();
        trie.put(b"xyz", b"3".to_vec()).unwrap();

        // 'a' = 0x61 and 'x' = 0x78 diverge on the first nibble
        let node = root(&trie);
        assert_eq!(node.kind(), NodeKind::Branch);
        assert_eq!(node.child(6).map(Node::kind), Some(NodeKind::Extension));
        assert_eq!(node.child(7).map(Node::kind), Some(NodeKind::Leaf));

        for (key, value) in [(&b"abc"[..], &b"1"[..]), (b"abd", b"2"), (b"xyz", b"3")] {
            assert_eq!(trie.get(key), Some(value));
        }
    }

    #[test]
    fn test_extension_split_drops_single_nibble_remainder() {
        let mut trie = Trie::new();
        trie.put(&[0x12, 0x30], b"1".to_vec()).unwrap();
        trie.put(&[0x12, 0x31], b"2".to_vec()).unwrap();

        // Extension [1, 2, 3]; diverging at its last nibble attaches the
        // old branch directly
        trie.put(&[0x12, 0x40], b"3".to_vec()).unwrap();

        let node = root(&trie);
        assert_eq!(node.path(), Some(&Nibbles::from_bytes(&[0x12])));
        let Node::Extension { next, .. } = node else {
            panic!("expected extension");
        };
        assert_eq!(next.child(3).map(Node::kind), Some(NodeKind::Branch));
        assert_eq!(next.child(4).map(Node::kind), Some(NodeKind::Leaf));
    }

    #[test]
    fn test_multiple_insert() {
        let mut trie = Trie::new();

        trie.put(b"do", b"verb".to_vec()).unwrap();
        trie.put(b"dog", b"puppy".to_vec()).unwrap();
        trie.put(b"doge", b"coin".to_vec()).unwrap();
        trie.put(b"horse", b"stallion".to_vec()).unwrap();

        assert_eq!(trie.get(b"do"), Some(&b"verb"[..]));
        assert_eq!(trie.get(b"dog"), Some(&b"puppy"[..]));
        assert_eq!(trie.get(b"doge"), Some(&b"coin"[..]));
        assert_eq!(trie.get(b"horse"), Some(&b"stallion"[..]));
        assert_eq!(trie.get(b"cat"), None);
        assert_eq!(trie.get(b"d"), None);
        assert!(trie.contains(b"doge"));
        assert!(!trie.contains(b"dogs"));
    }

    #[test]
    fn test_order_independence() {
        let mut forward = Trie::new();
        forward.put(b"accounts.balance", b"X".to_vec()).unwrap();
        forward.put(b"system.version", b"Y".to_vec()).unwrap();

        let mut reverse = Trie::new();
        reverse.put(b"system.version", b"Y".to_vec()).unwrap();
        reverse.put(b"accounts.balance", b"X".to_vec()).unwrap();

        assert_eq!(forward.hash(), reverse.hash());
    }

    #[test]
    fn test_hash_deterministic() {
        let build = || {
            let mut trie = Trie::new();
            trie.put(b"key", b"value".to_vec()).unwrap();
            trie
        };

        let trie = build();
        assert_ne!(trie.hash(), EMPTY_ROOT);
        assert_eq!(trie.hash(), build().hash());
    }

    #[test]
    fn test_root_changes() {
        let mut trie = Trie::new();
        let root0 = trie.hash();

        trie.put(b"key1", b"value1".to_vec()).unwrap();
        let root1 = trie.hash();
        assert_ne!(root0, root1);

        trie.put(b"key2", b"value2".to_vec()).unwrap();
        assert_ne!(trie.hash(), root1);
    }

    #[test]
    fn test_snapshot_is_isolated() {
        let mut trie = Trie::new();
        trie.put(b"key1", b"value1".to_vec()).unwrap();

        let snapshot = trie.clone();
        let snapshot_hash = snapshot.hash();

        trie.put(b"key1", b"changed".to_vec()).unwrap();
        trie.put(b"key2", b"value2".to_vec()).unwrap();

        assert_eq!(snapshot.hash(), snapshot_hash);
        assert_eq!(snapshot.get(b"key1"), Some(&b"value1"[..]));
        assert_eq!(snapshot.get(b"key2"), None);
        assert_eq!(trie.get(b"key1"), Some(&b"changed"[..]));
    }

    #[test]
    fn test_concurrent_readers_on_snapshot() {
        let mut trie = Trie::new();
        for i in 0u32..64 {
            trie.put(&i.to_be_bytes(), i.to_le_bytes().to_vec()).unwrap();
        }
        let snapshot = trie.clone();

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for i in 0u32..64 {
                        assert_eq!(snapshot.get(&i.to_be_bytes()), Some(&i.to_le_bytes()[..]));
                    }
                });
            }
        });
    }

    #[test]
    fn test_many_keys() {
        let mut trie = Trie::new();

        for i in 0u32..500 {
            let key = format!("key{}", i);
            let value = format!("value{}", i);
            trie.put(key.as_bytes(), value.into_bytes()).unwrap();
        }

        for i in 0u32..500 {
            let key = format!("key{}", i);
            let expected = format!("value{}", i);
            assert_eq!(trie.get(key.as_bytes()), Some(expected.as_bytes()));
        }
    }

    fn entries() -> impl Strategy<Value = BTreeMap<Vec<u8>, Vec<u8>>> {
        proptest::collection::btree_map(
            proptest::collection::vec(any::<u8>(), 1..6),
            proptest::collection::vec(any::<u8>(), 0..48),
            1..24,
        )
    }

    proptest! {
        #[test]
        fn prop_put_then_get(entries in entries()) {
            let mut trie = Trie::new();
            for (key, value) in &entries {
                trie.put(key, value.clone()).unwrap();
            }
            for (key, value) in &entries {
                prop_assert_eq!(trie.get(key), Some(value.as_slice()));
            }
        }

        #[test]
        fn prop_last_write_wins(
            key in proptest::collection::vec(any::<u8>(), 1..8),
            first in proptest::collection::vec(any::<u8>(), 0..16),
            second in proptest::collection::vec(any::<u8>(), 0..16),
        ) {
            let mut trie = Trie::new();
            trie.put(&key, first).unwrap();
            trie.put(&key, second.clone()).unwrap();

            prop_assert_eq!(trie.get(&key), Some(second.as_slice()));
            prop_assert_eq!(trie.root().map(Node::kind), Some(NodeKind::Leaf));
        }

        #[test]
        fn prop_insertion_order_does_not_matter(entries in entries()) {
            let mut forward = Trie::new();
            for (key, value) in &entries {
                forward.put(key, value.clone()).unwrap();
            }

            let mut reverse = Trie::new();
            for (key, value) in entries.iter().rev() {
                reverse.put(key, value.clone()).unwrap();
            }

            prop_assert_eq!(forward.hash(), reverse.hash());
        }
    }
}
