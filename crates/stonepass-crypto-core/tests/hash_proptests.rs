#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

//! Property-based tests for the StoneHash sponge.

use proptest::prelude::*;
use stonepass_crypto_core::StoneHash;

proptest! {
    /// Absorbing the same message in any chunking yields the same digest.
    #[test]
    fn chunking_invariance(
        message in proptest::collection::vec(any::<u8>(), 0..512),
        cuts in proptest::collection::vec(any::<prop::sample::Index>(), 0..8),
    ) {
        let mut whole = StoneHash::new();
        whole.update(&message);

        let mut offsets: Vec<usize> = cuts.iter().map(|ix| ix.index(message.len() + 1)).collect();
        offsets.push(0);
        offsets.push(message.len());
        offsets.sort_unstable();

        let mut chunked = StoneHash::new();
        for pair in offsets.windows(2) {
            chunked.update(&message[pair[0]..pair[1]]);
        }

        let whole_digest = whole.finalize();
        let chunked_digest = chunked.finalize();
        prop_assert_eq!(whole_digest.as_bytes(), chunked_digest.as_bytes());
    }

    /// Same message, same digest — the hash carries no hidden state.
    #[test]
    fn determinism(message in proptest::collection::vec(any::<u8>(), 0..512)) {
        let mut a = StoneHash::new();
        a.update(&message);
        let mut b = StoneHash::new();
        b.update(&message);
        let a_digest = a.finalize();
        let b_digest = b.finalize();
        prop_assert_eq!(a_digest.as_bytes(), b_digest.as_bytes());
    }

    /// The 256-bit digest is the prefix of the 512-bit digest.
    #[test]
    fn hash256_is_a_prefix(message in proptest::collection::vec(any::<u8>(), 0..256)) {
        let mut short = StoneHash::new();
        short.update(&message);
        let mut long = StoneHash::new();
        long.update(&message);
        let short_digest = short.hash256();
        let long_digest = long.finalize();
        prop_assert_eq!(
            &short_digest.as_bytes()[..],
            &long_digest.as_bytes()[..32]
        );
    }

    /// Appending a byte never leaves the digest unchanged.
    #[test]
    fn extension_changes_the_digest(
        message in proptest::collection::vec(any::<u8>(), 0..256),
        extra in any::<u8>(),
    ) {
        let mut base = StoneHash::new();
        base.update(&message);

        let mut extended = StoneHash::new();
        extended.update(&message);
        extended.update([extra]);

        let base_digest = base.finalize();
        let extended_digest = extended.finalize();
        prop_assert_ne!(base_digest.as_bytes(), extended_digest.as_bytes());
    }
}
