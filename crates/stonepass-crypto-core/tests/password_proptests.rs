#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

//! Property-based tests for the end-to-end password pipeline.

use proptest::prelude::*;
use stonepass_crypto_core::kdf::{StoneKeyParams, MIN_M_COST};
use stonepass_crypto_core::password::{generate_password_with_params, PasswordPolicy};

/// Smallest legal KDF costs — the pipeline is what's under test.
const PROP_PARAMS: StoneKeyParams = StoneKeyParams {
    m_cost: MIN_M_COST,
    t_cost: 1,
};

fn arb_policy() -> impl Strategy<Value = PasswordPolicy> {
    (
        6usize..=40,
        1u32..1000,
        any::<[bool; 4]>().prop_filter("at least one category", |f| f.iter().any(|&b| b)),
    )
        .prop_map(|(length, version, flags)| PasswordPolicy {
            length,
            version,
            require_uppercase: flags[0],
            require_lowercase: flags[1],
            require_digits: flags[2],
            require_symbols: flags[3],
            ..PasswordPolicy::default()
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Same inputs, same password — always.
    #[test]
    fn generation_is_deterministic(policy in arb_policy()) {
        let a = generate_password_with_params("alice", "hunter2 is not enough", "example.com", &policy, &PROP_PARAMS)
            .expect("generation should succeed");
        let b = generate_password_with_params("alice", "hunter2 is not enough", "example.com", &policy, &PROP_PARAMS)
            .expect("generation should succeed");
        prop_assert_eq!(a, b);
    }

    /// Exact length, one character from each required category, and no
    /// character from outside the required union.
    #[test]
    fn policy_conformance(policy in arb_policy()) {
        let pw = generate_password_with_params("alice", "hunter2 is not enough", "example.com", &policy, &PROP_PARAMS)
            .expect("generation should succeed");

        prop_assert_eq!(pw.len(), policy.length);

        let mut union = String::new();
        for (required, set) in [
            (policy.require_uppercase, &policy.uppercase),
            (policy.require_lowercase, &policy.lowercase),
            (policy.require_digits, &policy.digits),
            (policy.require_symbols, &policy.symbols),
        ] {
            if required {
                prop_assert!(
                    pw.chars().any(|c| set.contains(c)),
                    "missing required category in {}", pw
                );
                union.push_str(set);
            }
        }
        prop_assert!(pw.chars().all(|c| union.contains(c)), "stray character in {}", pw);
    }

    /// Perturbing the site name rewrites the password nearly everywhere:
    /// at least half of the positions must change.
    #[test]
    fn site_perturbation_rewrites_the_password(suffix in "[a-z]{1,8}") {
        let policy = PasswordPolicy::default();
        let base = generate_password_with_params("alice", "hunter2 is not enough", "example.com", &policy, &PROP_PARAMS)
            .expect("generation should succeed");
        let site = format!("example.com/{suffix}");
        let other = generate_password_with_params("alice", "hunter2 is not enough", &site, &policy, &PROP_PARAMS)
            .expect("generation should succeed");

        let same_positions = base
            .chars()
            .zip(other.chars())
            .filter(|(a, b)| a == b)
            .count();
        prop_assert!(
            same_positions <= policy.length / 2,
            "{} of {} positions survived a site change", same_positions, policy.length
        );
    }

    /// Version bumps rotate: consecutive versions never collide.
    #[test]
    fn version_rotation(version in 1u32..500) {
        let policy = PasswordPolicy { version, ..PasswordPolicy::default() };
        let next = PasswordPolicy { version: version + 1, ..PasswordPolicy::default() };
        let a = generate_password_with_params("alice", "hunter2 is not enough", "example.com", &policy, &PROP_PARAMS)
            .expect("generation should succeed");
        let b = generate_password_with_params("alice", "hunter2 is not enough", "example.com", &next, &PROP_PARAMS)
            .expect("generation should succeed");
        prop_assert_ne!(a, b);
    }
}
