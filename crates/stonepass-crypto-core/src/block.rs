//! Fixed-size byte blocks with little-endian word views.
//!
//! [`Block<N>`] is the raw material every component here works on: the
//! permutation state and sponge block are [`Block64`], digests and keys
//! are [`Block32`]. The same bytes are addressable as 32- or 64-bit
//! little-endian words, the block wipes itself on drop, and `Debug`
//! output is masked because blocks routinely hold key material.

use std::fmt;
use std::ops::BitXorAssign;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// A fixed-size, wipe-on-drop byte container with little-endian word views.
///
/// Word accessors address complete words only; if `N` is not a multiple
/// of the word size, the tail is reachable through the byte view alone.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Block<const N: usize> {
    bytes: [u8; N],
}

/// 64-byte block: ChaCha permutation state, sponge block, RNG buffer.
pub type Block64 = Block<64>;

/// 32-byte block: digests and 256-bit keys.
pub type Block32 = Block<32>;

impl<const N: usize> Block<N> {
    /// A block of `N` zero bytes.
    #[must_use]
    pub const fn new() -> Self {
        Self { bytes: [0u8; N] }
    }

    /// Wrap an existing byte array.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; N]) -> Self {
        Self { bytes }
    }

    /// Raw byte view.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; N] {
        &self.bytes
    }

    /// Mutable raw byte view.
    pub fn as_bytes_mut(&mut self) -> &mut [u8; N] {
        &mut self.bytes
    }

    /// Number of complete 32-bit words in the block.
    #[must_use]
    pub const fn size_in_u32() -> usize {
        N / 4
    }

    /// Number of complete 64-bit words in the block.
    #[must_use]
    pub const fn size_in_u64() -> usize {
        N / 8
    }

    /// Read the `i`-th 32-bit little-endian word.
    ///
    /// # Panics
    ///
    /// Panics if `i` is past the last complete word.
    #[must_use]
    pub fn u32_at(&self, i: usize) -> u32 {
        let off = i * 4;
        u32::from_le_bytes([
            self.bytes[off],
            self.bytes[off + 1],
            self.bytes[off + 2],
            self.bytes[off + 3],
        ])
    }

    /// Write the `i`-th 32-bit little-endian word.
    ///
    /// # Panics
    ///
    /// Panics if `i` is past the last complete word.
    pub fn set_u32(&mut self, i: usize, value: u32) {
        let off = i * 4;
        self.bytes[off..off + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Read the `i`-th 64-bit little-endian word.
    ///
    /// # Panics
    ///
    /// Panics if `i` is past the last complete word.
    #[must_use]
    pub fn u64_at(&self, i: usize) -> u64 {
        let off = i * 8;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&self.bytes[off..off + 8]);
        u64::from_le_bytes(buf)
    }

    /// Write the `i`-th 64-bit little-endian word.
    ///
    /// # Panics
    ///
    /// Panics if `i` is past the last complete word.
    pub fn set_u64(&mut self, i: usize, value: u64) {
        let off = i * 8;
        self.bytes[off..off + 8].copy_from_slice(&value.to_le_bytes());
    }

    /// `true` if every byte is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }

    /// Overwrite the block with zeros through stores the compiler
    /// cannot elide.
    pub fn wipe(&mut self) {
        self.bytes.zeroize();
    }
}

impl Block64 {
    /// The sixteen 32-bit little-endian words of the block.
    #[must_use]
    pub fn words(&self) -> [u32; 16] {
        let mut w = [0u32; 16];
        for (i, word) in w.iter_mut().enumerate() {
            *word = self.u32_at(i);
        }
        w
    }

    /// Build a block from sixteen 32-bit words, serialized little-endian.
    #[must_use]
    pub fn from_words(words: &[u32; 16]) -> Self {
        let mut block = Self::new();
        for (i, &word) in words.iter().enumerate() {
            block.set_u32(i, word);
        }
        block
    }
}

impl Block32 {
    /// The eight 32-bit little-endian words of the block.
    #[must_use]
    pub fn words(&self) -> [u32; 8] {
        let mut w = [0u32; 8];
        for (i, word) in w.iter_mut().enumerate() {
            *word = self.u32_at(i);
        }
        w
    }
}

impl<const N: usize> Default for Block<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> From<[u8; N]> for Block<N> {
    fn from(bytes: [u8; N]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl<const N: usize> AsRef<[u8]> for Block<N> {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl<const N: usize> BitXorAssign<&Block<N>> for Block<N> {
    fn bitxor_assign(&mut self, rhs: &Block<N>) {
        for (a, b) in self.bytes.iter_mut().zip(rhs.bytes.iter()) {
            *a ^= *b;
        }
    }
}

impl<const N: usize> fmt::Debug for Block<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block<{N}>(***)")
    }
}

impl<const N: usize> fmt::Display for Block<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block<{N}>(***)")
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
