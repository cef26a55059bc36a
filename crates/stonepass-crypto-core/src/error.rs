//! Cryptographic error types for `stonepass-crypto-core`.

use thiserror::Error;

/// Errors produced by cryptographic operations.
///
/// Every failure is surfaced to the caller as exactly one of these
/// variants; nothing is retried or swallowed inside the core.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key derivation failed (StoneKey parameter validation, empty password).
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Password/policy validation or composition failure.
    #[error("password generation error: {0}")]
    PasswordGeneration(String),

    /// OS CSPRNG unavailable or returned fewer bytes than requested.
    #[error("entropy failure: {0}")]
    Entropy(String),

    /// Keystream or workspace exhausted (RNG counter wrap, arena allocation).
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// StoneRNG state blob is corrupt (bad magic, version, index, truncation).
    #[error("RNG state corruption: {0}")]
    StateCorruption(String),

    /// Secure memory operation failed (core dump limits, page locking).
    #[error("secure memory error: {0}")]
    SecureMemory(String),
}
