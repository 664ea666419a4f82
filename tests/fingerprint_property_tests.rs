//! Property-based tests for fingerprint determinism and duplicate suppression
//!
//! This module uses the proptest crate to verify that fingerprint behavior
//! is correct across a wide range of randomly generated inputs. The unique
//! index in the store is only as good as the determinism of the hash it
//! indexes, so these invariants must hold for all inputs, not just specific
//! test cases.

use proptest::prelude::*;

use dream_orders::fingerprint::{dream_hash, idempotency_key, normalize};

// PROPERTY TEST STRATEGIES

/// Strategy to generate dream-like text with at least one word
fn dream_text_strategy() -> impl Strategy<Value = String> {
    proptest::collection::vec("[a-z]{1,12}", 1..40).prop_map(|words| words.join(" "))
}

/// Strategy to generate a bech32-shaped user id
fn user_id_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9]{8,24}".prop_map(|suffix| format!("user_1{suffix}"))
}

/// Strategy to wrap text in random extra whitespace that normalization
/// must erase
fn whitespace_perturbation_strategy() -> impl Strategy<Value = (String, String, String)> {
    (
        prop_oneof![Just(""), Just(" "), Just("  "), Just("\t"), Just("\n")],
        prop_oneof![Just(" "), Just("  "), Just("\t "), Just(" \n ")],
        prop_oneof![Just(""), Just(" "), Just("   "), Just("\n\n")],
    )
        .prop_map(|(lead, sep, trail)| (lead.to_string(), sep.to_string(), trail.to_string()))
}

// PROPERTY TESTS
proptest! {
    /// Property: the same (user, text) always yields the same hash
    ///
    /// Two calls with the same logical input must agree byte-for-byte even
    /// across processes; the store's unique key depends on it.
    #[test]
    fn prop_hash_is_deterministic(
        user_id in user_id_strategy(),
        text in dream_text_strategy()
    ) {
        prop_assert_eq!(
            dream_hash(&user_id, &text),
            dream_hash(&user_id, &text)
        );
    }

    /// Property: whitespace perturbations never change the fingerprint
    ///
    /// Leading, trailing, and repeated interior whitespace all normalize
    /// away, so a resubmission that only differs in spacing still collides
    /// with the original.
    #[test]
    fn prop_hash_ignores_whitespace(
        user_id in user_id_strategy(),
        text in dream_text_strategy(),
        (lead, sep, trail) in whitespace_perturbation_strategy()
    ) {
        let perturbed = format!("{lead}{}{trail}", text.replace(' ', &sep));
        prop_assert_eq!(
            dream_hash(&user_id, &text),
            dream_hash(&user_id, &perturbed)
        );
    }

    /// Property: identical text from different users yields different hashes
    ///
    /// Duplicate suppression is per user; one user's submission must never
    /// block another user from submitting the same text.
    #[test]
    fn prop_no_cross_user_blocking(
        user_a in user_id_strategy(),
        user_b in user_id_strategy(),
        text in dream_text_strategy()
    ) {
        prop_assume!(user_a != user_b);
        prop_assert_ne!(
            dream_hash(&user_a, &text),
            dream_hash(&user_b, &text)
        );
    }

    /// Property: different texts yield different hashes for the same user
    #[test]
    fn prop_distinct_content_distinct_hash(
        user_id in user_id_strategy(),
        text_a in dream_text_strategy(),
        text_b in dream_text_strategy()
    ) {
        prop_assume!(normalize(&text_a) != normalize(&text_b));
        prop_assert_ne!(
            dream_hash(&user_id, &text_a),
            dream_hash(&user_id, &text_b)
        );
    }

    /// Property: the idempotency key is deterministic and tracks the
    /// interpreter target independently of the dream hash
    #[test]
    fn prop_idempotency_key_deterministic(
        user_id in user_id_strategy(),
        text in dream_text_strategy()
    ) {
        let a = idempotency_key(&user_id, Some("intr_1target"), &text).unwrap();
        let b = idempotency_key(&user_id, Some("intr_1target"), &text).unwrap();
        let without_target = idempotency_key(&user_id, None, &text).unwrap();

        prop_assert_eq!(&a, &b);
        prop_assert_ne!(&a, &without_target);
        prop_assert!(a.starts_with("idem1"));
    }

    /// Property: normalization is idempotent
    #[test]
    fn prop_normalize_is_idempotent(text in "\\PC{0,200}") {
        let once = normalize(&text);
        let twice = normalize(&once);
        prop_assert_eq!(once, twice);
    }
}
