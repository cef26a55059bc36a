//! `StoneHash` — a sponge-style hash over the ChaCha permutation.
//!
//! Absorb arbitrary bytes with [`StoneHash::update`], then take a
//! 512-bit digest with [`StoneHash::finalize`] or the 256-bit prefix
//! with [`StoneHash::hash256`]. Finalization consumes the hasher, so a
//! finalized object cannot be fed again.
//!
//! Callers provide domain separation themselves by absorbing a literal
//! label first (e.g. `"StoneHash::v2::fill"`); the hash treats the
//! label as ordinary input.

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::block::{Block32, Block64};
use crate::chacha;

/// Sponge block width in bytes.
const RATE: usize = 64;

/// Streaming sponge hasher producing 256- or 512-bit digests.
///
/// Full 64-byte blocks are XORed into the state and permuted as they
/// arrive; at most 63 bytes ever sit in the pending buffer between
/// calls. The same message in any chunking yields the same digest.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct StoneHash {
    state: [u32; 16],
    pending: [u8; RATE],
    pending_len: usize,
    total_bytes: u64,
}

impl StoneHash {
    /// A fresh hasher with an all-zero state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: [0u32; 16],
            pending: [0u8; RATE],
            pending_len: 0,
            total_bytes: 0,
        }
    }

    /// Absorb `data`. May be called any number of times.
    ///
    /// Raw bytes, [`Block32`] and [`Block64`] all absorb through their
    /// byte view with identical semantics.
    pub fn update(&mut self, data: impl AsRef<[u8]>) {
        let mut input = data.as_ref();
        self.total_bytes = self.total_bytes.wrapping_add(input.len() as u64);

        // Top up a partially filled pending buffer first.
        if self.pending_len > 0 {
            let take = (RATE - self.pending_len).min(input.len());
            self.pending[self.pending_len..self.pending_len + take]
                .copy_from_slice(&input[..take]);
            self.pending_len += take;
            input = &input[take..];
            if self.pending_len == RATE {
                let mut chunk = self.pending;
                self.absorb_chunk(&chunk);
                chunk.zeroize();
                self.pending_len = 0;
            }
        }

        // Full blocks straight from the input.
        while input.len() >= RATE {
            let mut chunk = [0u8; RATE];
            chunk.copy_from_slice(&input[..RATE]);
            self.absorb_chunk(&chunk);
            chunk.zeroize();
            input = &input[RATE..];
        }

        // Stash the tail.
        if !input.is_empty() {
            self.pending[..input.len()].copy_from_slice(input);
            self.pending_len = input.len();
        }
    }

    /// Finalize and return the 512-bit digest.
    ///
    /// Residual pending bytes are XORed in zero-padded, the final-block
    /// flag `0x01` lands in word 0, and the total absorbed length —
    /// `rotate_left(total_bytes, 3)`, i.e. the bit length for messages
    /// under 2^61 bytes, injectively wrapped beyond — lands in words
    /// 12–13 before one last permutation.
    #[must_use]
    pub fn finalize(self) -> Block64 {
        let mut h = self.state;

        for i in 0..self.pending_len {
            h[i / 4] ^= u32::from(self.pending[i]) << (8 * (i % 4));
        }

        h[0] ^= 0x01;

        let bit_len = self.total_bytes.rotate_left(3);
        h[12] ^= bit_len as u32;
        h[13] ^= (bit_len >> 32) as u32;

        chacha::permute(&mut h);
        let digest = Block64::from_words(&h);
        h.zeroize();
        digest
    }

    /// Finalize and return the first 256 bits of the digest.
    #[must_use]
    pub fn hash256(self) -> Block32 {
        let digest = self.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest.as_bytes()[..32]);
        Block32::from_bytes(out)
    }

    fn absorb_chunk(&mut self, chunk: &[u8; RATE]) {
        for (i, word) in self.state.iter_mut().enumerate() {
            *word ^= u32::from_le_bytes([
                chunk[i * 4],
                chunk[i * 4 + 1],
                chunk[i * 4 + 2],
                chunk[i * 4 + 3],
            ]);
        }
        chacha::permute(&mut self.state);
    }
}

impl Default for StoneHash {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
