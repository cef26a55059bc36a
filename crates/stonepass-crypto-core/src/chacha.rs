//! ChaCha20 block permutation and state builders.
//!
//! This module provides:
//! - [`quarter_round`] — the ChaCha quarter-round on four state words
//! - [`permute`] / [`permute_block`] — the 20-round permutation with
//!   final input addition (RFC 8439 §2.3 round structure)
//! - [`build_state`] — original Bernstein layout (64-bit nonce + 64-bit
//!   counter)
//! - [`build_state_rfc8439`] — RFC 8439 layout (96-bit nonce + 32-bit
//!   counter), provided for interoperability
//! - [`random_key`] / [`random_nonce`] — OS-entropy material
//!
//! The permutation is a building block for the sponge hash, the KDF and
//! the RNG; no XOR-with-plaintext encryption API is exposed.
//!
//! Everything here runs in constant time: the round function is pure
//! add-rotate-xor with fixed indices and fixed trip counts.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::block::Block64;
use crate::error::CryptoError;

/// The four constant words, "expand 32-byte k" in little-endian ASCII.
pub const CONSTANTS: [u32; 4] = [0x6170_7865, 0x3320_646e, 0x7962_2d32, 0x6b20_6574];

/// 256-bit key as eight 32-bit words.
pub type Key = [u32; 8];

/// 64-bit nonce as two 32-bit words (original Bernstein layout).
pub type Nonce = [u32; 2];

/// 96-bit nonce as three 32-bit words (RFC 8439 layout).
pub type Nonce96 = [u32; 3];

/// One ChaCha quarter-round on state words `a`, `b`, `c`, `d`.
///
/// All arithmetic is 32-bit wrapping.
#[inline]
pub fn quarter_round(x: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize) {
    x[a] = x[a].wrapping_add(x[b]);
    x[d] ^= x[a];
    x[d] = x[d].rotate_left(16);

    x[c] = x[c].wrapping_add(x[d]);
    x[b] ^= x[c];
    x[b] = x[b].rotate_left(12);

    x[a] = x[a].wrapping_add(x[b]);
    x[d] ^= x[a];
    x[d] = x[d].rotate_left(8);

    x[c] = x[c].wrapping_add(x[d]);
    x[b] ^= x[c];
    x[b] = x[b].rotate_left(7);
}

/// Apply the 20-round ChaCha permutation to `state` in place.
///
/// Ten double-rounds (four column quarter-rounds, then four diagonal
/// quarter-rounds) over a working copy, then a word-wise wrapping add of
/// the original input. Operating in place makes input/output aliasing a
/// non-question.
pub fn permute(state: &mut [u32; 16]) {
    let mut x = *state;

    for _ in 0..10 {
        // columns
        quarter_round(&mut x, 0, 4, 8, 12);
        quarter_round(&mut x, 1, 5, 9, 13);
        quarter_round(&mut x, 2, 6, 10, 14);
        quarter_round(&mut x, 3, 7, 11, 15);
        // diagonals
        quarter_round(&mut x, 0, 5, 10, 15);
        quarter_round(&mut x, 1, 6, 11, 12);
        quarter_round(&mut x, 2, 7, 8, 13);
        quarter_round(&mut x, 3, 4, 9, 14);
    }

    for (out, word) in state.iter_mut().zip(x.iter()) {
        *out = out.wrapping_add(*word);
    }
}

/// [`permute`] on the byte view of a 64-byte block.
pub fn permute_block(block: &mut Block64) {
    let mut words = block.words();
    permute(&mut words);
    *block = Block64::from_words(&words);
}

/// Build a ChaCha state in the original Bernstein layout.
///
/// Words 0–3 constants, 4–11 key, 12–13 the 64-bit block counter
/// (low word first), 14–15 the 64-bit nonce.
///
/// This is NOT the RFC 8439 layout used by TLS and WireGuard; use
/// [`build_state_rfc8439`] when interoperating with those.
#[must_use]
pub fn build_state(key: &Key, nonce: &Nonce, counter: u64) -> Block64 {
    let mut words = [0u32; 16];
    words[..4].copy_from_slice(&CONSTANTS);
    words[4..12].copy_from_slice(key);
    words[12] = counter as u32;
    words[13] = (counter >> 32) as u32;
    words[14] = nonce[0];
    words[15] = nonce[1];
    Block64::from_words(&words)
}

/// Build a ChaCha state in the RFC 8439 layout.
///
/// Words 0–3 constants, 4–11 key, 12 the 32-bit block counter,
/// 13–15 the 96-bit nonce.
#[must_use]
pub fn build_state_rfc8439(key: &Key, nonce: &Nonce96, counter: u32) -> Block64 {
    let mut words = [0u32; 16];
    words[..4].copy_from_slice(&CONSTANTS);
    words[4..12].copy_from_slice(key);
    words[12] = counter;
    words[13] = nonce[0];
    words[14] = nonce[1];
    words[15] = nonce[2];
    Block64::from_words(&words)
}

/// A fresh 256-bit key from the OS entropy source.
///
/// # Errors
///
/// Returns [`CryptoError::Entropy`] if the OS CSPRNG fails.
pub fn random_key() -> Result<Key, CryptoError> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CryptoError::Entropy(format!("OS CSPRNG fill failed: {e}")))?;
    let mut key = [0u32; 8];
    for (i, word) in key.iter_mut().enumerate() {
        *word = u32::from_le_bytes([
            bytes[i * 4],
            bytes[i * 4 + 1],
            bytes[i * 4 + 2],
            bytes[i * 4 + 3],
        ]);
    }
    Ok(key)
}

/// A fresh 64-bit nonce from the OS entropy source.
///
/// # Errors
///
/// Returns [`CryptoError::Entropy`] if the OS CSPRNG fails.
pub fn random_nonce() -> Result<Nonce, CryptoError> {
    let mut bytes = [0u8; 8];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CryptoError::Entropy(format!("OS CSPRNG fill failed: {e}")))?;
    Ok([
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
    ])
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_spell_expand_32_byte_k() {
        let mut bytes = Vec::new();
        for word in CONSTANTS {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        assert_eq!(&bytes, b"expand 32-byte k");
    }

    /// RFC 8439 §2.1.1 quarter-round test vector.
    #[test]
    fn quarter_round_rfc8439_vector() {
        let mut x = [0u32; 16];
        x[0] = 0x1111_1111;
        x[1] = 0x0102_0304;
        x[2] = 0x9b8d_6f43;
        x[3] = 0x0123_4567;

        quarter_round(&mut x, 0, 1, 2, 3);

        assert_eq!(x[0], 0xea2a_92f4);
        assert_eq!(x[1], 0xcb1c_f8ce);
        assert_eq!(x[2], 0x4581_472e);
        assert_eq!(x[3], 0x5881_c4bb);
    }

    #[test]
    fn permute_is_deterministic() {
        let mut a = build_state(&[1; 8], &[2, 3], 4).words();
        let mut b = a;
        permute(&mut a);
        permute(&mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn permute_block_matches_word_permute() {
        let mut block = build_state(&[9; 8], &[7, 7], 1);
        let mut words = block.words();
        permute_block(&mut block);
        permute(&mut words);
        assert_eq!(block.words(), words);
    }

    #[test]
    fn bernstein_layout_places_counter_before_nonce() {
        let key: Key = [0x0101_0101; 8];
        let state = build_state(&key, &[0xaaaa_aaaa, 0xbbbb_bbbb], 0x1122_3344_5566_7788);
        let words = state.words();
        assert_eq!(words[..4], CONSTANTS);
        assert_eq!(words[4..12], key);
        assert_eq!(words[12], 0x5566_7788); // counter low
        assert_eq!(words[13], 0x1122_3344); // counter high
        assert_eq!(words[14], 0xaaaa_aaaa);
        assert_eq!(words[15], 0xbbbb_bbbb);
    }

    #[test]
    fn rfc8439_layout_places_nonce_after_counter() {
        let key: Key = [0x0202_0202; 8];
        let state = build_state_rfc8439(&key, &[0x1111_1111, 0x2222_2222, 0x3333_3333], 5);
        let words = state.words();
        assert_eq!(words[12], 5);
        assert_eq!(words[13], 0x1111_1111);
        assert_eq!(words[14], 0x2222_2222);
        assert_eq!(words[15], 0x3333_3333);
    }

    #[test]
    fn random_key_and_nonce_differ_between_calls() {
        let a = random_key().expect("entropy should be available");
        let b = random_key().expect("entropy should be available");
        assert_ne!(a, b);

        let n1 = random_nonce().expect("entropy should be available");
        let n2 = random_nonce().expect("entropy should be available");
        assert_ne!(n1, n2);
    }
}
