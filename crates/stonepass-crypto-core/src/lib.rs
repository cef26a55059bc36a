//! `stonepass-crypto-core` — Pure cryptographic core for StonePass.
//!
//! This crate is the audit target: zero network, zero async, zero UI
//! dependencies. It derives reproducible, site-specific passwords from
//! a single master passphrase and persists nothing — the five
//! components form one closed pipeline:
//!
//! 1. [`block`] — fixed-size byte blocks with little-endian word views
//! 2. [`chacha`] — the 20-round ChaCha permutation and state builders
//! 3. [`hash`] — `StoneHash`, a sponge hash over the permutation
//! 4. [`kdf`] — `StoneKey`, a memory-hard passphrase-to-key derivation
//! 5. [`rng`] — `StoneRNG`, a ChaCha-keyed CSPRNG with unbiased
//!    bounded sampling
//!
//! [`password`] composes them into policy-conformant password
//! generation; [`memory`] keeps the workspace off disk.
//!
//! The constructions are conservative and built from well-studied
//! primitives, but they are personal designs without independent
//! cryptanalysis. They are not certified for regulated use; weak
//! passphrases remain weak.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod error;
pub mod memory;

pub mod block;
pub mod chacha;

pub mod hash;

pub mod kdf;

pub mod rng;

pub mod password;

pub use block::{Block, Block32, Block64};
pub use error::CryptoError;
pub use hash::StoneHash;
pub use kdf::{derive as stone_key, StoneKeyParams, DEFAULT_M_COST, DEFAULT_T_COST};
pub use memory::disable_core_dumps;
pub use password::{
    generate_password, generate_password_with_params, PasswordPolicy, DEFAULT_PASSWORD_LENGTH,
    MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH,
};
pub use rng::StoneRNG;
