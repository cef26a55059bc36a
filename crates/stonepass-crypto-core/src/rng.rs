//! `StoneRNG` — a ChaCha20-keyed cryptographically secure generator.
//!
//! The generator keeps the exact ChaCha20 stream layout: a 256-bit key,
//! a 64-bit nonce and a 64-bit block counter (original Bernstein
//! configuration). Each refill permutes one block into a buffer of
//! eight 64-bit words; the key/nonce pair is exhausted after 2^70 bytes,
//! at which point every further operation fails — silently restarting
//! the stream would repeat the keystream.
//!
//! Copying is deliberately impossible (no `Clone`): two live copies
//! would emit the same "random" values. Moves transfer the unique
//! stream.

use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::block::{Block32, Block64};
use crate::chacha::{self, Key, Nonce};
use crate::error::CryptoError;

/// 64-bit words per ChaCha block.
const WORDS_PER_BLOCK: usize = 8;

/// Magic header of the serialized state layout.
const STATE_MAGIC: &[u8; 8] = b"StoneRNG";

/// Serialized state layout version.
const STATE_VERSION: u8 = 1;

/// Size of the serialized state in bytes.
pub const STATE_LEN: usize = 65;

/// Default seed for [`StoneRNG::from_u64_seed`] in reproducible tests.
pub const DEFAULT_SEED: u64 = 0x0123_4567_89AB_CDEF;

/// ChaCha20-based CSPRNG with unbiased bounded sampling.
///
/// All constructors leave the generator primed. All draws are fallible:
/// the only failure mode is counter exhaustion, and it must reach the
/// caller rather than wrap.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct StoneRNG {
    key: Key,
    nonce: Nonce,
    block_counter: u64,
    buffer: Block64,
    word_index: usize,
}

impl StoneRNG {
    // -----------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------

    /// Construct from an explicit key, nonce, and starting counter.
    ///
    /// The recommended construction for cryptographic use when key
    /// material already exists.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::ResourceExhausted`] if `initial_counter`
    /// is already at the end of the stream.
    pub fn from_parts(key: &Key, nonce: &Nonce, initial_counter: u64) -> Result<Self, CryptoError> {
        let mut rng = Self {
            key: *key,
            nonce: *nonce,
            block_counter: initial_counter,
            buffer: Block64::new(),
            word_index: WORDS_PER_BLOCK,
        };
        rng.refill_buffer()?;
        Ok(rng)
    }

    /// Construct from a 64-byte seed block.
    ///
    /// The seed is permuted once; bytes 0–31 of the result become the
    /// key and bytes 32–39 the nonce, so the raw seed is never used
    /// directly and cannot be recovered from the generator state.
    ///
    /// # Errors
    ///
    /// Propagates priming failure (see [`StoneRNG::from_parts`]).
    pub fn from_seed_block(seed: &Block64) -> Result<Self, CryptoError> {
        let mut temp = seed.clone();
        chacha::permute_block(&mut temp);

        let mut key: Key = [0u32; 8];
        for (i, word) in key.iter_mut().enumerate() {
            *word = temp.u32_at(i);
        }
        let nonce: Nonce = [temp.u32_at(8), temp.u32_at(9)];
        temp.wipe();

        let rng = Self::from_parts(&key, &nonce, 0);
        key.zeroize();
        rng
    }

    /// Construct from a 32-byte seed, zero-extended to the 64-byte
    /// seed-block path.
    ///
    /// This is the expansion used to turn a derived 256-bit key (e.g. a
    /// StoneKey output) into a full generator.
    ///
    /// # Errors
    ///
    /// Propagates priming failure (see [`StoneRNG::from_parts`]).
    pub fn from_seed32(seed: &Block32) -> Result<Self, CryptoError> {
        let mut wide = Block64::new();
        wide.as_bytes_mut()[..32].copy_from_slice(seed.as_bytes());
        Self::from_seed_block(&wide)
    }

    /// Construct from the operating system's entropy source.
    ///
    /// 64 bytes are requested: 0–31 key, 32–39 nonce, 40–47 initial
    /// block counter (randomized so distinct instances never share a
    /// stream position), 48–63 discarded.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Entropy`] if the OS CSPRNG fails or
    /// under-delivers.
    pub fn from_os_entropy() -> Result<Self, CryptoError> {
        let mut entropy = [0u8; 64];
        OsRng
            .try_fill_bytes(&mut entropy)
            .map_err(|e| CryptoError::Entropy(format!("OS CSPRNG fill failed: {e}")))?;

        let mut key: Key = [0u32; 8];
        for (i, word) in key.iter_mut().enumerate() {
            *word = u32::from_le_bytes([
                entropy[i * 4],
                entropy[i * 4 + 1],
                entropy[i * 4 + 2],
                entropy[i * 4 + 3],
            ]);
        }
        let nonce: Nonce = [
            u32::from_le_bytes([entropy[32], entropy[33], entropy[34], entropy[35]]),
            u32::from_le_bytes([entropy[36], entropy[37], entropy[38], entropy[39]]),
        ];
        let mut counter_bytes = [0u8; 8];
        counter_bytes.copy_from_slice(&entropy[40..48]);
        let counter = u64::from_le_bytes(counter_bytes);
        entropy.zeroize();

        let rng = Self::from_parts(&key, &nonce, counter);
        key.zeroize();
        counter_bytes.zeroize();
        rng
    }

    /// Construct a deterministic generator from a 64-bit seed.
    ///
    /// The seed is stretched with SplitMix64 to fill the key and nonce.
    /// For reproducible tests only — 64 bits of seed is NOT a
    /// cryptographic keyspace.
    ///
    /// # Errors
    ///
    /// Propagates priming failure (see [`StoneRNG::from_parts`]).
    pub fn from_u64_seed(seed: u64) -> Result<Self, CryptoError> {
        let mut state = seed;
        let mut key: Key = [0u32; 8];
        for word in &mut key {
            *word = splitmix64(&mut state) as u32;
        }
        let nonce: Nonce = [
            splitmix64(&mut state) as u32,
            splitmix64(&mut state) as u32,
        ];
        let rng = Self::from_parts(&key, &nonce, 0);
        key.zeroize();
        rng
    }

    // -----------------------------------------------------------------
    // Output
    // -----------------------------------------------------------------

    /// The next 64-bit keystream word.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::ResourceExhausted`] once the block
    /// counter would wrap (2^70 bytes, the RFC 8439 ceiling).
    pub fn next_u64(&mut self) -> Result<u64, CryptoError> {
        if self.word_index >= WORDS_PER_BLOCK {
            self.refill_buffer()?;
        }
        let value = self.buffer.u64_at(self.word_index);
        self.word_index += 1;
        Ok(value)
    }

    /// An unbiased uniform integer in the closed interval `[lo, hi]`.
    ///
    /// Arguments are swapped if transposed. Rejection sampling removes
    /// the modulo bias; the number of rejection iterations depends only
    /// on the public counter path, never on the key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::ResourceExhausted`] on counter wrap.
    pub fn unbiased(&mut self, lo: u64, hi: u64) -> Result<u64, CryptoError> {
        let (lo, hi) = if lo > hi { (hi, lo) } else { (lo, hi) };
        if lo == hi {
            return Ok(lo);
        }
        // Full 64-bit range: `hi - lo + 1` would overflow, and a raw
        // word is already uniform.
        if hi - lo == u64::MAX {
            return self.next_u64();
        }

        let range = hi - lo + 1;
        let limit = u64::MAX - (u64::MAX % range);

        loop {
            let value = self.next_u64()?;
            if value <= limit {
                return Ok(lo + (value % range));
            }
        }
    }

    /// Advance the stream by `n` 64-bit words without computing them.
    ///
    /// O(1): whole skipped blocks advance the counter directly.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::ResourceExhausted`] if the skip would
    /// overflow the block counter.
    pub fn discard(&mut self, mut n: u64) -> Result<(), CryptoError> {
        if n == 0 {
            return Ok(());
        }

        // Consume what is left of the current buffer.
        let remaining = (WORDS_PER_BLOCK - self.word_index) as u64;
        if n < remaining {
            self.word_index += n as usize;
            return Ok(());
        }
        n -= remaining;
        self.word_index = WORDS_PER_BLOCK;

        let full_blocks = n / WORDS_PER_BLOCK as u64;
        let remainder = n % WORDS_PER_BLOCK as u64;

        if full_blocks > 0 {
            self.block_counter = self.block_counter.checked_add(full_blocks).ok_or_else(|| {
                CryptoError::ResourceExhausted("block counter overflow during discard".into())
            })?;
        }

        if remainder != 0 {
            self.refill_buffer()?;
            self.word_index = remainder as usize;
        }
        Ok(())
    }

    /// Replace key and nonce, reset the counter to zero, and refill.
    ///
    /// # Errors
    ///
    /// Propagates refill failure.
    pub fn reseed(&mut self, key: &Key, nonce: &Nonce) -> Result<(), CryptoError> {
        self.key = *key;
        self.nonce = *nonce;
        self.block_counter = 0;
        self.refill_buffer()
    }

    // -----------------------------------------------------------------
    // State serialization — testing and trusted checkpoints only
    // -----------------------------------------------------------------

    /// Serialize the complete internal state (65 bytes, little-endian).
    ///
    /// The blob contains the raw 256-bit key: whoever holds it can
    /// predict every past and future output of this generator. It
    /// exists for test fixtures and trusted, encrypted checkpoints —
    /// never write it anywhere an attacker could read.
    #[must_use]
    pub fn to_state_bytes(&self) -> [u8; STATE_LEN] {
        let mut out = [0u8; STATE_LEN];
        out[..8].copy_from_slice(STATE_MAGIC);
        out[8] = STATE_VERSION;
        for (i, word) in self.key.iter().enumerate() {
            out[9 + i * 4..13 + i * 4].copy_from_slice(&word.to_le_bytes());
        }
        out[41..45].copy_from_slice(&self.nonce[0].to_le_bytes());
        out[45..49].copy_from_slice(&self.nonce[1].to_le_bytes());
        out[49..57].copy_from_slice(&self.block_counter.to_le_bytes());
        out[57] = self.word_index as u8;
        // bytes 58..65 reserved, zero
        out
    }

    /// Restore a generator from a 65-byte state blob.
    ///
    /// A state with `word_index < 8` requires recomputing the current
    /// block from `counter - 1`; such a state at `counter == 0` never
    /// existed and is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::StateCorruption`] for a wrong length, bad
    /// magic, unsupported version, out-of-range word index, or an
    /// unrestorable mid-block state.
    pub fn from_state_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != STATE_LEN {
            return Err(CryptoError::StateCorruption(format!(
                "truncated stream: {} bytes (expected {STATE_LEN})",
                bytes.len()
            )));
        }
        if &bytes[..8] != STATE_MAGIC {
            return Err(CryptoError::StateCorruption("bad magic".into()));
        }
        if bytes[8] != STATE_VERSION {
            return Err(CryptoError::StateCorruption(format!(
                "unsupported version: {}",
                bytes[8]
            )));
        }

        let mut key: Key = [0u32; 8];
        for (i, word) in key.iter_mut().enumerate() {
            *word = u32::from_le_bytes([
                bytes[9 + i * 4],
                bytes[10 + i * 4],
                bytes[11 + i * 4],
                bytes[12 + i * 4],
            ]);
        }
        let nonce: Nonce = [
            u32::from_le_bytes([bytes[41], bytes[42], bytes[43], bytes[44]]),
            u32::from_le_bytes([bytes[45], bytes[46], bytes[47], bytes[48]]),
        ];
        let mut counter_bytes = [0u8; 8];
        counter_bytes.copy_from_slice(&bytes[49..57]);
        let counter = u64::from_le_bytes(counter_bytes);

        let word_index = usize::from(bytes[57]);
        if word_index > WORDS_PER_BLOCK {
            return Err(CryptoError::StateCorruption(format!(
                "invalid word_index: {word_index}"
            )));
        }
        // Reserved tail bytes are ignored.

        let mut rng = Self {
            key,
            nonce,
            block_counter: counter,
            buffer: Block64::new(),
            word_index: WORDS_PER_BLOCK,
        };

        if word_index < WORDS_PER_BLOCK {
            // Recompute the partially consumed block from counter - 1.
            if counter == 0 {
                return Err(CryptoError::StateCorruption(
                    "cannot restore mid-block state at counter == 0".into(),
                ));
            }
            rng.block_counter = counter - 1;
            rng.refill_buffer()?;
            rng.word_index = word_index;
        }

        Ok(rng)
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    fn refill_buffer(&mut self) -> Result<(), CryptoError> {
        let mut state = chacha::build_state(&self.key, &self.nonce, self.block_counter);
        chacha::permute_block(&mut state);
        self.buffer = state.clone();
        state.wipe();
        self.word_index = 0;

        match self.block_counter.checked_add(1) {
            Some(next) => {
                self.block_counter = next;
                Ok(())
            }
            None => {
                // 2^70 bytes generated. Leave nothing usable behind.
                self.buffer.wipe();
                self.word_index = WORDS_PER_BLOCK;
                Err(CryptoError::ResourceExhausted(
                    "key/nonce pair exhausted (2^64 blocks generated)".into(),
                ))
            }
        }
    }
}

/// Equality of future output: key (constant-time), nonce, counter and
/// word index. The buffer is intentionally excluded — with those four
/// equal, every future word is equal regardless of buffer contents.
impl PartialEq for StoneRNG {
    fn eq(&self, other: &Self) -> bool {
        let mut key_diff = 0u32;
        for (a, b) in self.key.iter().zip(other.key.iter()) {
            key_diff |= a ^ b;
        }
        key_diff == 0
            && self.nonce == other.nonce
            && self.block_counter == other.block_counter
            && self.word_index == other.word_index
    }
}

impl Eq for StoneRNG {}

impl std::fmt::Debug for StoneRNG {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StoneRNG(***)")
    }
}

/// SplitMix64 step — the well-known 64-bit seed stretcher.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
