//! Deterministic, policy-conformant password composition.
//!
//! [`generate_password`] is the top of the pipeline: it folds every
//! non-secret input into a canonical context string, derives a 256-bit
//! key with StoneKey, seeds a StoneRNG from it, draws characters until
//! the policy is satisfied, and shuffles. The result is a pure function
//! of its inputs — run it twice in ten years and the password matches.
//!
//! Nothing is stored anywhere at any point. A forgotten master
//! passphrase is unrecoverable by design.

use serde::{Deserialize, Serialize};

use crate::error::CryptoError;
use crate::kdf::{self, StoneKeyParams};
use crate::rng::StoneRNG;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Minimum allowed password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Maximum allowed password length.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Default password length.
pub const DEFAULT_PASSWORD_LENGTH: usize = 20;

// Default character sets, chosen for high readability: visually
// ambiguous glyphs (I/l/1, O/o/0) are excluded and the symbols are
// accepted by nearly all sites.

/// Default uppercase set (no I, O).
pub const DEFAULT_UPPERCASE: &str = "ABCDEFGHJKLMNPQRSTUVWXYZ";

/// Default lowercase set (no l, o).
pub const DEFAULT_LOWERCASE: &str = "abcdefghijkmnpqrstuvwxyz";

/// Default digit set (no 0, 1).
pub const DEFAULT_DIGITS: &str = "23456789";

/// Default symbol set (widely accepted characters only).
pub const DEFAULT_SYMBOLS: &str = "@#$%&*()[]{};:,.?";

/// Leading domain label of the context string. The trailing NUL is part
/// of the label.
const CONTEXT_LABEL: &[u8] = b"StonePassword_v1.0\x00";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Password policy: target length, version counter, character sets and
/// which categories are required.
///
/// Every field participates in the derivation context, so flipping any
/// flag or changing the length yields an unrelated password. Bumping
/// `version` is the rotation mechanism: same site, same passphrase, new
/// password.
#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PasswordPolicy {
    /// Target password length, 6..=128.
    pub length: usize,
    /// Rotation counter, >= 1.
    pub version: u32,
    /// Uppercase character set.
    pub uppercase: String,
    /// Lowercase character set.
    pub lowercase: String,
    /// Digit character set.
    pub digits: String,
    /// Symbol character set.
    pub symbols: String,
    /// Require at least one uppercase character.
    pub require_uppercase: bool,
    /// Require at least one lowercase character.
    pub require_lowercase: bool,
    /// Require at least one digit.
    pub require_digits: bool,
    /// Require at least one symbol.
    pub require_symbols: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            length: DEFAULT_PASSWORD_LENGTH,
            version: 1,
            uppercase: DEFAULT_UPPERCASE.to_string(),
            lowercase: DEFAULT_LOWERCASE.to_string(),
            digits: DEFAULT_DIGITS.to_string(),
            symbols: DEFAULT_SYMBOLS.to_string(),
            require_uppercase: true,
            require_lowercase: true,
            require_digits: true,
            require_symbols: true,
        }
    }
}

impl PasswordPolicy {
    /// The required (label, set) pairs in canonical order: upper,
    /// lower, digits, symbols.
    fn required_sets(&self) -> Vec<(&'static str, &str)> {
        let mut sets = Vec::with_capacity(4);
        if self.require_uppercase {
            sets.push(("uppercase", self.uppercase.as_str()));
        }
        if self.require_lowercase {
            sets.push(("lowercase", self.lowercase.as_str()));
        }
        if self.require_digits {
            sets.push(("digits", self.digits.as_str()));
        }
        if self.require_symbols {
            sets.push(("symbols", self.symbols.as_str()));
        }
        sets
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Derive the password for (`username`, `site_name`) from the master
/// passphrase, using the recommended KDF costs (64 MiB, 3 rounds).
///
/// Deterministic and stateless: each required category contributes at
/// least one character, every position is drawn from the union of the
/// required sets, and a Fisher–Yates shuffle removes the positional
/// bias of the guaranteed characters.
///
/// # Errors
///
/// Returns [`CryptoError::PasswordGeneration`] for invalid inputs or
/// policy (see [`validate`](#validation) rules), and propagates KDF and
/// RNG failures.
pub fn generate_password(
    username: &str,
    master_password: &str,
    site_name: &str,
    policy: &PasswordPolicy,
) -> Result<String, CryptoError> {
    generate_password_with_params(
        username,
        master_password,
        site_name,
        policy,
        &StoneKeyParams::default(),
    )
}

/// [`generate_password`] with explicit KDF costs.
///
/// Changing the costs changes the derived password; pick them once and
/// keep them. Exists for test suites and for callers that calibrate
/// their own memory budget.
///
/// # Errors
///
/// As [`generate_password`].
pub fn generate_password_with_params(
    username: &str,
    master_password: &str,
    site_name: &str,
    policy: &PasswordPolicy,
    params: &StoneKeyParams,
) -> Result<String, CryptoError> {
    validate(username, master_password, site_name, policy)?;

    let context = build_context(username, site_name, policy);
    let key = kdf::derive(master_password.as_bytes(), &context, params)?;
    let mut rng = StoneRNG::from_seed32(&key)?;

    let required = policy.required_sets();
    let all_chars: Vec<u8> = required
        .iter()
        .flat_map(|(_, set)| set.bytes())
        .collect();

    let mut password: Vec<u8> = Vec::with_capacity(policy.length);

    // One guaranteed character per required category, in canonical
    // order. The shuffle below erases the ordering.
    for (_, set) in &required {
        password.push(draw(&mut rng, set.as_bytes())?);
    }
    while password.len() < policy.length {
        password.push(draw(&mut rng, &all_chars)?);
    }

    // Fisher–Yates: i = L-1 down to 1, j uniform in [0, i].
    for i in (1..policy.length).rev() {
        let j = rng.unbiased(0, i as u64)? as usize;
        password.swap(i, j);
    }

    // Validation restricted the sets to ASCII.
    Ok(String::from_utf8(password).expect("password bytes are ASCII"))
}

// ---------------------------------------------------------------------------
// Pipeline stages
// ---------------------------------------------------------------------------

/// Reject inputs that would break determinism or the policy contract.
fn validate(
    username: &str,
    master_password: &str,
    site_name: &str,
    policy: &PasswordPolicy,
) -> Result<(), CryptoError> {
    if username.is_empty() {
        return Err(CryptoError::PasswordGeneration("username is empty".into()));
    }
    if master_password.is_empty() {
        return Err(CryptoError::PasswordGeneration(
            "master password is empty".into(),
        ));
    }
    if site_name.is_empty() {
        return Err(CryptoError::PasswordGeneration("site name is empty".into()));
    }
    if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&policy.length) {
        return Err(CryptoError::PasswordGeneration(format!(
            "length must be between {MIN_PASSWORD_LENGTH} and {MAX_PASSWORD_LENGTH}, got {}",
            policy.length
        )));
    }
    if policy.version < 1 {
        return Err(CryptoError::PasswordGeneration(
            "version must be >= 1".into(),
        ));
    }

    let required = policy.required_sets();
    if required.is_empty() {
        return Err(CryptoError::PasswordGeneration(
            "at least one character category must be required".into(),
        ));
    }
    for (label, set) in &required {
        if set.is_empty() {
            return Err(CryptoError::PasswordGeneration(format!(
                "cannot require {label} characters if none are supplied"
            )));
        }
        if !set.is_ascii() {
            return Err(CryptoError::PasswordGeneration(format!(
                "{label} character set must be ASCII"
            )));
        }
    }
    if policy.length < required.len() {
        return Err(CryptoError::PasswordGeneration(format!(
            "length ({}) must be at least {} to include one character from each required category",
            policy.length,
            required.len()
        )));
    }
    Ok(())
}

/// Build the canonical context string.
///
/// Layout (NUL bytes are literal, numbers are decimal ASCII, flags are
/// `1`/`0`):
///
/// ```text
/// StonePassword_v1.0\0 V \0 U \0 S \0 len:L \0upper:b \0lower:b \0digits:b \0symbols:b
/// ```
///
/// Any change to any input — including a flag flip — alters this string
/// bit-exactly, and with it the derived key.
fn build_context(username: &str, site_name: &str, policy: &PasswordPolicy) -> Vec<u8> {
    let mut ctx = Vec::new();
    ctx.extend_from_slice(CONTEXT_LABEL);
    ctx.extend_from_slice(policy.version.to_string().as_bytes());
    ctx.push(0);
    ctx.extend_from_slice(username.as_bytes());
    ctx.push(0);
    ctx.extend_from_slice(site_name.as_bytes());
    ctx.push(0);
    ctx.extend_from_slice(b"len:");
    ctx.extend_from_slice(policy.length.to_string().as_bytes());
    ctx.extend_from_slice(b"\x00upper:");
    ctx.push(flag_byte(policy.require_uppercase));
    ctx.extend_from_slice(b"\x00lower:");
    ctx.push(flag_byte(policy.require_lowercase));
    ctx.extend_from_slice(b"\x00digits:");
    ctx.push(flag_byte(policy.require_digits));
    ctx.extend_from_slice(b"\x00symbols:");
    ctx.push(flag_byte(policy.require_symbols));
    ctx
}

const fn flag_byte(flag: bool) -> u8 {
    if flag {
        b'1'
    } else {
        b'0'
    }
}

/// Draw one character uniformly from `set`.
fn draw(rng: &mut StoneRNG, set: &[u8]) -> Result<u8, CryptoError> {
    let max_index = (set.len() - 1) as u64;
    Ok(set[rng.unbiased(0, max_index)? as usize])
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
