//! Paging and core-dump hygiene for the derivation workspace.
//!
//! StoneKey's arena holds passphrase-derived blocks for the length of
//! one derivation. Zeroizing them is the arena's own job; this module
//! keeps the bytes from ever reaching disk in the first place:
//! [`lock_arena`] pins the arena's pages so the kernel cannot swap
//! them out, and [`disable_core_dumps`] stops a crash from writing
//! process memory to a core file.

use crate::error::CryptoError;
use crate::kdf::ArenaBlock;

/// Pin the arena's pages into RAM for the duration of a derivation.
/// Returns whether the lock took.
///
/// Locking is best-effort. Without CAP_IPC_LOCK the RLIMIT_MEMLOCK
/// quota (commonly 64 KiB to a few MiB) covers only the smallest
/// arenas, so a refusal downgrades to a single warning instead of
/// failing the derivation — the blocks still get wiped either way.
pub(crate) fn lock_arena(blocks: &[ArenaBlock]) -> bool {
    let locked = platform_lock(blocks);
    if !locked && !blocks.is_empty() {
        static WARNED: std::sync::Once = std::sync::Once::new();
        WARNED.call_once(|| {
            eprintln!(
                "[stonepass-crypto-core] WARNING: mlock refused {} KiB; the \
                 derivation arena may be swapped to disk (raise RLIMIT_MEMLOCK)",
                std::mem::size_of_val(blocks) / 1024
            );
        });
    }
    locked
}

/// Release a lock taken by [`lock_arena`].
///
/// Must be called with the same slice, while the arena's buffer is
/// still allocated.
pub(crate) fn unlock_arena(blocks: &[ArenaBlock]) {
    platform_unlock(blocks);
}

/// Keep a crash from writing the passphrase to disk: clamp the
/// process's core-dump size to zero, soft and hard limit both.
///
/// No-op outside Unix.
///
/// # Errors
///
/// Returns [`CryptoError::SecureMemory`] when the kernel rejects the
/// new limit.
pub fn disable_core_dumps() -> Result<(), CryptoError> {
    #[cfg(unix)]
    {
        let zero = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        // SAFETY: setrlimit only reads the struct passed to it.
        if unsafe { libc::setrlimit(libc::RLIMIT_CORE, &zero) } != 0 {
            return Err(CryptoError::SecureMemory(
                "setrlimit(RLIMIT_CORE, 0) was rejected".into(),
            ));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Platform shims
// ---------------------------------------------------------------------------

#[cfg(unix)]
fn platform_lock(blocks: &[ArenaBlock]) -> bool {
    if blocks.is_empty() {
        return true;
    }
    // SAFETY: the slice outlives the call, and mlock neither reads nor
    // writes through the pointer — it only pins the pages behind it.
    unsafe { libc::mlock(blocks.as_ptr().cast(), std::mem::size_of_val(blocks)) == 0 }
}

#[cfg(unix)]
fn platform_unlock(blocks: &[ArenaBlock]) {
    if blocks.is_empty() {
        return;
    }
    // SAFETY: same pointer and length the lock was taken with. A failed
    // munlock leaves pages pinned until process exit, nothing worse.
    unsafe {
        libc::munlock(blocks.as_ptr().cast(), std::mem::size_of_val(blocks));
    }
}

#[cfg(not(unix))]
fn platform_lock(_blocks: &[ArenaBlock]) -> bool {
    false
}

#[cfg(not(unix))]
fn platform_unlock(_blocks: &[ArenaBlock]) {}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
