//! Deterministic content fingerprints for duplicate suppression
//!
//! The dream hash makes the store's unique key the single arbiter for
//! "already submitted": two concurrent creations with identical content race
//! on the same key and exactly one wins. The idempotency key is a second,
//! independent constraint covering the same logical request replayed through
//! a different entry point (retry, double-click, booking bridge).

use bech32::Bech32m;

/// Collapse interior whitespace runs to single spaces and trim the ends.
/// Every length check and every fingerprint measures this form, so all
/// entry points agree on what the content is.
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Stable digest of (user id, normalized dream text). Pure; identical
/// logical input yields identical output across processes.
pub fn dream_hash(user_id: &str, dream_text: &str) -> String {
    let normalized = normalize(dream_text);
    let cbor = minicbor::to_vec((user_id, normalized.as_str()))
        .expect("cbor encoding into a Vec cannot fail");

    sha256::digest(&cbor)
}

/// Digest of (user id, interpreter target, normalized text), bech32-encoded
/// with an `idem` prefix so it is visually distinct from a dream hash.
pub fn idempotency_key(
    user_id: &str,
    interpreter_id: Option<&str>,
    dream_text: &str,
) -> anyhow::Result<String> {
    let normalized = normalize(dream_text);
    let cbor = minicbor::to_vec((user_id, interpreter_id, normalized.as_str()))
        .expect("cbor encoding into a Vec cannot fail");

    let digest = sha256::digest(&cbor);
    let bytes = hex::decode(digest)?;

    let hrp = bech32::Hrp::parse("idem")?;
    let encoded = bech32::encode::<Bech32m>(hrp, &bytes)?;
    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_collapses_whitespace() {
        assert_eq!(normalize("  a \t dream\n\nof  water "), "a dream of water");
    }

    #[test]
    fn hash_is_stable_under_whitespace() {
        let a = dream_hash("user_1abc", "a dream of water");
        let b = dream_hash("user_1abc", "  a  dream\tof water\n");
        assert_eq!(a, b);
    }

    #[test]
    fn idempotency_key_has_idem_prefix() {
        let key = idempotency_key("user_1abc", None, "a dream of water").unwrap();
        assert!(key.starts_with("idem1"));
    }
}
