//! `StoneKey` — memory-hard, data-independent key derivation.
//!
//! This module provides:
//! - [`derive`] — derive a 256-bit key from a passphrase + context
//! - [`StoneKeyParams`] — memory/time cost parameter set
//!
//! The derivation fills an arena of 2^m 64-byte blocks from a
//! domain-separated hash of the context, then runs `t` rounds of a
//! butterfly mixing network over the arena, compresses it to one block,
//! wipes it, and extracts the key through a final domain-separated
//! hash. The butterfly's pair indexing depends only on the arena size,
//! never on the data, which keeps the access pattern constant-time.
//!
//! This is not an entropy stretcher: a weak passphrase stays
//! brute-forceable, the memory-hardness only raises the attacker's cost
//! per guess.

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::block::{Block32, Block64};
use crate::chacha;
use crate::error::CryptoError;
use crate::hash::StoneHash;
use crate::memory;

/// Smallest supported memory cost: 2^10 × 64 B = 64 KiB.
pub const MIN_M_COST: u32 = 10;

/// Largest supported memory cost: 2^26 × 64 B = 4 GiB hard cap.
pub const MAX_M_COST: u32 = 26;

/// Recommended memory cost (2^20 × 64 B = 64 MiB).
pub const DEFAULT_M_COST: u32 = 20;

/// Recommended time cost (~1 s at the default memory cost on current
/// desktop hardware).
pub const DEFAULT_T_COST: u32 = 3;

/// 2^64 / φ — the 64-bit golden-ratio increment.
const GOLDEN_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;

/// Domain labels. Changing any of these changes every derived key.
const FILL_DOMAIN: &str = "StoneHash::v2::fill";
const COUNTER_SEED_DOMAIN: &str = "StoneHash::v2::counter_seed";
const FINAL_DOMAIN: &str = "StoneKey::v2::final";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// StoneKey cost parameter set.
///
/// `m_cost` is the base-2 logarithm of the arena block count (arena
/// size = 2^m_cost × 64 bytes); `t_cost` is the number of butterfly
/// rounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoneKeyParams {
    /// log2 of the arena block count, 10..=26.
    pub m_cost: u32,
    /// Number of mixing rounds, >= 1.
    pub t_cost: u32,
}

impl StoneKeyParams {
    /// Validate the parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyDerivation`] if `m_cost` is outside
    /// 10..=26 or `t_cost` is zero.
    pub fn validate(&self) -> Result<(), CryptoError> {
        if self.m_cost < MIN_M_COST || self.m_cost > MAX_M_COST {
            return Err(CryptoError::KeyDerivation(format!(
                "m_cost out of range: {} (allowed {MIN_M_COST}..={MAX_M_COST}, \
                 2^{MAX_M_COST} x 64 B = 4 GiB cap)",
                self.m_cost
            )));
        }
        if self.t_cost == 0 {
            return Err(CryptoError::KeyDerivation(
                "t_cost must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for StoneKeyParams {
    fn default() -> Self {
        Self {
            m_cost: DEFAULT_M_COST,
            t_cost: DEFAULT_T_COST,
        }
    }
}

// ---------------------------------------------------------------------------
// Arena
// ---------------------------------------------------------------------------

/// One arena block: sixteen 32-bit words, the permutation's working
/// unit.
pub(crate) type ArenaBlock = [u32; 16];

/// The memory-hard workspace: 2^m blocks, page-locked from allocation
/// to release when the OS permits it.
///
/// Zeroized on every exit path: explicitly before extraction, and again
/// on drop so early returns cannot leak derived material.
struct Arena {
    blocks: Vec<ArenaBlock>,
    locked: bool,
}

impl Arena {
    fn allocate(n_blocks: usize) -> Result<Self, CryptoError> {
        let mut blocks: Vec<ArenaBlock> = Vec::new();
        blocks.try_reserve_exact(n_blocks).map_err(|_| {
            CryptoError::ResourceExhausted(format!(
                "arena allocation failed: {} bytes",
                n_blocks * 64
            ))
        })?;
        blocks.resize(n_blocks, [0u32; 16]);

        let locked = memory::lock_arena(&blocks);
        Ok(Self { blocks, locked })
    }

    fn wipe(&mut self) {
        for block in self.blocks.iter_mut() {
            block.zeroize();
        }
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        self.wipe();
        // Unpin while the Vec is still allocated.
        if self.locked {
            memory::unlock_arena(&self.blocks);
        }
    }
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Derive a 256-bit key from `password` and an optional `context`.
///
/// Deterministic: the same (password, context, params) triple always
/// yields the same key. The context carries all non-secret inputs
/// (site, username, policy) and isolates unrelated uses of the same
/// passphrase from one another.
///
/// # Errors
///
/// Returns [`CryptoError::KeyDerivation`] for an empty password or
/// out-of-range costs, and [`CryptoError::ResourceExhausted`] if the
/// arena cannot be allocated.
pub fn derive(
    password: &[u8],
    context: &[u8],
    params: &StoneKeyParams,
) -> Result<Block32, CryptoError> {
    params.validate()?;
    if password.is_empty() {
        return Err(CryptoError::KeyDerivation("password is empty".into()));
    }

    let n_blocks = 1usize << params.m_cost;
    let mut arena = Arena::allocate(n_blocks)?;

    // Phase 1: fill. The password enters block 0 only; every other
    // block depends on it transitively through the mixing rounds.
    fill(&mut arena.blocks, password, context);

    // Phase 2: butterfly mixing, t_cost rounds.
    let mut counter = counter_seed(password);
    butterfly(&mut arena.blocks, params.t_cost, &mut counter);

    // Phase 3: compress the arena down to one block.
    let mut acc = compress(&arena.blocks);

    // Phase 4: wipe the workspace before anything leaves this frame.
    arena.wipe();

    // Phase 5: extract. One final domain-separated compression of the
    // original inputs plus the accumulated state guarantees a uniform
    // key even if the XOR-accumulate compression carries slight bias.
    let mut out = StoneHash::new();
    out.update(FINAL_DOMAIN);
    out.update(password);
    out.update(context);
    out.update(Block64::from_words(&acc));
    acc.zeroize();
    counter.zeroize();

    Ok(out.hash256())
}

/// Fill each arena block with a domain-separated digest of the context
/// and the block index. Only block 0 absorbs the password.
fn fill(memory: &mut [ArenaBlock], password: &[u8], context: &[u8]) {
    for (i, slot) in memory.iter_mut().enumerate() {
        let mut h = StoneHash::new();
        h.update(FILL_DOMAIN);
        h.update(context);
        h.update((i as u64).to_le_bytes());
        if i == 0 {
            h.update(password);
        }
        *slot = h.finalize().words();
    }
}

/// Seed the round counter from the password so the mixing schedule is
/// itself passphrase-dependent.
fn counter_seed(password: &[u8]) -> u64 {
    let mut h = StoneHash::new();
    h.update(COUNTER_SEED_DOMAIN);
    h.update(password);
    GOLDEN_GAMMA ^ h.finalize().u64_at(0)
}

/// One full butterfly pass per round: `span` doubles from 1 to N/2, and
/// every (a, b = a + span) pair is mixed exactly once per round —
/// O(N log N) work touching long-range pairs, which is what frustrates
/// time-memory trade-off strategies.
///
/// Indexing depends only on (N, span, start, k), never on block
/// contents.
fn butterfly(memory: &mut [ArenaBlock], t_cost: u32, counter: &mut u64) {
    let n_blocks = memory.len();

    for _ in 0..t_cost {
        *counter = counter.wrapping_add(GOLDEN_GAMMA);

        let mut span = 1usize;
        while span < n_blocks {
            let mut start = 0usize;
            while start < n_blocks {
                for k in 0..span {
                    let a = start + k;
                    let b = a + span;
                    let mix = *counter ^ (((a as u64) << 32) | b as u64);

                    let (head, tail) = memory.split_at_mut(b);
                    let x = &mut head[a];
                    let y = &mut tail[0];

                    // Spread the 64-bit mix value across the 16 words in
                    // 4-bit steps. Shift amounts run 0..60, so words
                    // 8..15 see only the high half. Keep it exactly as
                    // is: changing the schedule changes every previously
                    // derived password.
                    for i in 0..16 {
                        y[i] ^= x[i] ^ (mix >> (4 * i)) as u32;
                    }

                    // Column quarter-rounds only; no diagonals, no final
                    // add. The full permutation runs in the compressor.
                    chacha::quarter_round(y, 0, 4, 8, 12);
                    chacha::quarter_round(y, 1, 5, 9, 13);
                    chacha::quarter_round(y, 2, 6, 10, 14);
                    chacha::quarter_round(y, 3, 7, 11, 15);

                    for i in 0..16 {
                        x[i] ^= y[i];
                    }
                }
                start += 2 * span;
            }
            span *= 2;
        }
    }
}

/// XOR every block into a running accumulator, stir in index-derived
/// words, and permute after each block. The XOR accumulation loses
/// information, so the compression stays one-way.
fn compress(memory: &[ArenaBlock]) -> [u32; 16] {
    let mut acc = [0u32; 16];

    for (i, block) in memory.iter().enumerate() {
        for (a, b) in acc.iter_mut().zip(block.iter()) {
            *a ^= *b;
        }

        let i = i as u64;
        xor_u64_lane(&mut acc, 0, i);
        xor_u64_lane(&mut acc, 1, i << 32);
        xor_u64_lane(&mut acc, 2, i.wrapping_mul(GOLDEN_GAMMA));
        xor_u64_lane(&mut acc, 3, i.wrapping_mul(GOLDEN_GAMMA >> 13));

        chacha::permute(&mut acc);
    }

    chacha::permute(&mut acc);
    acc
}

/// XOR a 64-bit value into lane `lane` of the state, little-endian
/// (low word first).
#[inline]
fn xor_u64_lane(acc: &mut [u32; 16], lane: usize, value: u64) {
    acc[2 * lane] ^= value as u32;
    acc[2 * lane + 1] ^= (value >> 32) as u32;
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
