//! # Nibbles
//!
//! Keys in the trie are walked as nibbles (half-bytes / 4 bits), so every
//! branch fans out over 16 possible values.
//!
//! Paths stored inside leaf and extension nodes are packed back into bytes
//! with the hex-prefix encoding: a leading flag nibble records whether the
//! node is a leaf and whether the path length is odd.

use std::fmt;

use crate::error::{Result, TrieError};

/// Hex-prefix flag for an odd-length path
const ODD_FLAG: u8 = 1;
/// Hex-prefix flag added for leaf paths
const LEAF_FLAG: u8 = 2;

/// Check whether a byte is a valid nibble value
pub fn is_nibble(value: u8) -> bool {
    value < 16
}

/// A sequence of nibbles (4-bit values)
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Nibbles {
    data: Vec<u8>,
}

impl Nibbles {
    /// Create empty nibbles
    pub fn new() -> Self {
        Nibbles { data: Vec::new() }
    }

    /// Split a single byte into its high and low nibble
    pub fn from_byte(byte: u8) -> Self {
        Nibbles {
            data: vec![byte >> 4, byte & 0x0f],
        }
    }

    /// Create from bytes (each byte becomes 2 nibbles)
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut data = Vec::with_capacity(bytes.len() * 2);
        for byte in bytes {
            data.push(byte >> 4);
            data.push(byte & 0x0f);
        }
        Nibbles { data }
    }

    /// Create from raw nibble values, rejecting anything above 15
    pub fn from_raw(nibbles: Vec<u8>) -> Result<Self> {
        if nibbles.iter().all(|n| is_nibble(*n)) {
            Ok(Nibbles { data: nibbles })
        } else {
            Err(TrieError::MalformedNode("nibble out of range"))
        }
    }

    /// Decode a hex-prefix encoded path.
    ///
    /// Returns the path and whether the flag marks it as a leaf path.
    pub fn from_hex_prefix(encoded: &[u8]) -> Result<(Self, bool)> {
        let (first, rest) = encoded
            .split_first()
            .ok_or(TrieError::MalformedNode("empty hex-prefix path"))?;

        let flag = first >> 4;
        if flag > (LEAF_FLAG | ODD_FLAG) {
            return Err(TrieError::MalformedNode("unknown hex-prefix flag"));
        }
        let is_leaf = flag & LEAF_FLAG != 0;
        let odd = flag & ODD_FLAG != 0;

        let mut data = Vec::with_capacity(rest.len() * 2 + 1);
        if odd {
            data.push(first & 0x0f);
        } else if first & 0x0f != 0 {
            return Err(TrieError::MalformedNode("non-zero padding in even path"));
        }

        for byte in rest {
            data.push(byte >> 4);
            data.push(byte & 0x0f);
        }

        Ok((Nibbles { data }, is_leaf))
    }

    /// Prepend the hex-prefix marker.
    ///
    /// Odd paths get a single flag nibble, even paths get the flag plus a zero
    /// pad nibble, so the result always has even length. Leaf paths add 2 to
    /// the flag.
    pub fn hex_prefix(&self, is_leaf: bool) -> Self {
        let leaf = if is_leaf { LEAF_FLAG } else { 0 };

        let mut data = Vec::with_capacity(self.data.len() + 2);
        if self.data.len() % 2 == 1 {
            data.push(ODD_FLAG + leaf);
        } else {
            data.push(leaf);
            data.push(0);
        }
        data.extend_from_slice(&self.data);

        Nibbles { data }
    }

    /// Encode to hex-prefix bytes
    pub fn to_hex_prefix(&self, is_leaf: bool) -> Vec<u8> {
        self.hex_prefix(is_leaf).pack()
    }

    /// Convert back to bytes (each 2 nibbles -> 1 byte)
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if self.data.len() % 2 != 0 {
            return Err(TrieError::OddNibbles(self.data.len()));
        }
        Ok(self.pack())
    }

    // Only called on even-length data
    fn pack(&self) -> Vec<u8> {
        self.data
            .chunks_exact(2)
            .map(|pair| pair[0] << 4 | pair[1])
            .collect()
    }

    /// Get length
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get nibble at index
    pub fn get(&self, index: usize) -> Option<u8> {
        self.data.get(index).copied()
    }

    /// Get first nibble
    pub fn first(&self) -> Option<u8> {
        self.data.first().copied()
    }

    /// Get the suffix starting at `start`
    pub fn slice(&self, start: usize) -> Self {
        Nibbles {
            data: self.data[start..].to_vec(),
        }
    }

    /// Get slice range
    pub fn slice_range(&self, start: usize, end: usize) -> Self {
        Nibbles {
            data: self.data[start..end].to_vec(),
        }
    }

    /// Length of the longest common prefix with another nibble sequence
    pub fn common_prefix_len(&self, other: &Nibbles) -> usize {
        self.data
            .iter()
            .zip(other.data.iter())
            .take_while(|(a, b)| a == b)
            .count()
    }

    /// Check whether `prefix` is a prefix of this sequence
    pub fn starts_with(&self, prefix: &Nibbles) -> bool {
        self.data.starts_with(&prefix.data)
    }

    /// Get as slice
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Debug for Nibbles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nibbles({})", self)
    }
}

impl fmt::Display for Nibbles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for n in &self.data {
            write!(f, "{:x}", n)?;
        }
        Ok(())
    }
}
