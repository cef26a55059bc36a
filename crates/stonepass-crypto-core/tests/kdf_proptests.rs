#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

//! Property-based tests for StoneKey derivation.

use proptest::prelude::*;
use stonepass_crypto_core::kdf::{derive, StoneKeyParams, MIN_M_COST};

/// Smallest legal params for fast property tests — 64 KiB, 1 round.
const PROP_PARAMS: StoneKeyParams = StoneKeyParams {
    m_cost: MIN_M_COST,
    t_cost: 1,
};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Same (password, context) pair always derives the same key.
    #[test]
    fn derivation_is_deterministic(
        password in proptest::collection::vec(any::<u8>(), 1..64),
        context in proptest::collection::vec(any::<u8>(), 0..64),
    ) {
        let a = derive(&password, &context, &PROP_PARAMS).expect("derive should succeed");
        let b = derive(&password, &context, &PROP_PARAMS).expect("derive should succeed");
        prop_assert_eq!(a.as_bytes(), b.as_bytes());
    }

    /// Distinct contexts isolate keys from one another.
    #[test]
    fn context_separates_keys(
        password in proptest::collection::vec(any::<u8>(), 1..64),
        context in proptest::collection::vec(any::<u8>(), 1..64),
    ) {
        let with_context = derive(&password, &context, &PROP_PARAMS)
            .expect("derive should succeed");
        let without_context = derive(&password, b"", &PROP_PARAMS)
            .expect("derive should succeed");
        prop_assert_ne!(with_context.as_bytes(), without_context.as_bytes());
    }

    /// Raising the time cost changes the key.
    #[test]
    fn time_cost_is_bound_into_the_key(
        password in proptest::collection::vec(any::<u8>(), 1..64),
    ) {
        let one_round = derive(&password, b"ctx", &PROP_PARAMS).expect("derive should succeed");
        let two_rounds = derive(
            &password,
            b"ctx",
            &StoneKeyParams { m_cost: MIN_M_COST, t_cost: 2 },
        )
        .expect("derive should succeed");
        prop_assert_ne!(one_round.as_bytes(), two_rounds.as_bytes());
    }
}
