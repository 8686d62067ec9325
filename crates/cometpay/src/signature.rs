//! Keyed checksum over a flat payload, shared by the outbound request path,
//! the synchronous response path, and the asynchronous notification path.
//!
//! The processor recomputes the exact same canonical form on its side, so
//! field ordering and the reserved-field exclusion are protocol requirements,
//! not implementation choices.

use md5::{Digest, Md5};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::constants::SIGNATURE_FIELD;
use crate::payload::{render_value, SignablePayload};

/// Reduce a payload to its canonical signature base.
///
/// Drops the reserved `md5Info` field (present or not), walks the remaining
/// fields in ascending key order, and joins `key=value` pairs with `&`.
/// Composite values are serialized to compact JSON; empty strings are kept
/// as `key=`. A payload holding only the signature field reduces to `""`.
pub fn canonicalize(payload: &SignablePayload) -> String {
    let mut segments = Vec::with_capacity(payload.len());

    for (key, value) in payload.iter() {
        if key == SIGNATURE_FIELD {
            continue;
        }
        segments.push(format!("{key}={}", render_value(value)));
    }

    segments.join("&")
}

/// Compute the signature for a payload under the merchant secret.
///
/// MD5 over `canonicalize(payload) + "&key=" + secret_key`, hex-encoded.
/// Lowercase is the canonical case; verification is case-insensitive.
pub fn sign(payload: &SignablePayload, secret_key: &str) -> String {
    let base = format!("{}&key={secret_key}", canonicalize(payload));
    let digest = Md5::digest(base.as_bytes());
    hex::encode(digest)
}

/// Verify a provided signature against a payload.
///
/// Returns `false` for an empty provided signature and for an empty secret
/// key — the latter is a configuration error callers should reject before
/// ever reaching this point, but verification still fails closed.
/// Comparison is case-insensitive and constant-time. Pure: no side effects,
/// identical inputs always produce the identical result.
pub fn verify(payload: &SignablePayload, provided: &str, secret_key: &str) -> bool {
    if provided.is_empty() || secret_key.is_empty() {
        return false;
    }

    let expected = sign(payload, secret_key);
    constant_time_eq(
        expected.as_bytes(),
        provided.to_ascii_lowercase().as_bytes(),
    )
}

/// Constant-time byte comparison that does not leak length or content.
///
/// Both inputs are hashed to fixed-length SHA-256 digests first, then
/// compared via `subtle::ConstantTimeEq`. Used for signature checks here
/// and for bearer-token checks in the notification server.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let ha = Sha256::digest(a);
    let hb = Sha256::digest(b);
    ha.ct_eq(&hb).into()
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().fold(String::new(), |mut s, b| {
            use std::fmt::Write;
            let _ = write!(s, "{b:02x}");
            s
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_payload() -> SignablePayload {
        let mut payload = SignablePayload::new();
        payload.insert("merNo", "M1001");
        payload.insert("amount", "111.00");
        payload.insert("currency", "1");
        payload.insert("billNo", "420001715000000");
        payload
    }

    #[test]
    fn canonical_form_is_sorted_and_joined() {
        let payload = sample_payload();
        assert_eq!(
            canonicalize(&payload),
            "amount=111.00&billNo=420001715000000&currency=1&merNo=M1001"
        );
    }

    #[test]
    fn canonicalize_excludes_signature_field() {
        let mut with_sig = sample_payload();
        with_sig.insert("md5Info", "ABCDEF");
        assert_eq!(canonicalize(&with_sig), canonicalize(&sample_payload()));
    }

    #[test]
    fn canonicalize_is_insertion_order_invariant() {
        let mut reversed = SignablePayload::new();
        reversed.insert("currency", "1");
        reversed.insert("billNo", "420001715000000");
        reversed.insert("amount", "111.00");
        reversed.insert("merNo", "M1001");
        assert_eq!(canonicalize(&reversed), canonicalize(&sample_payload()));
    }

    #[test]
    fn signature_only_payload_canonicalizes_to_empty() {
        let mut payload = SignablePayload::new();
        payload.insert("md5Info", "ABCDEF");
        assert_eq!(canonicalize(&payload), "");
    }

    #[test]
    fn empty_string_fields_are_kept() {
        let mut payload = SignablePayload::new();
        payload.insert("message", "");
        payload.insert("code", "P0001");
        assert_eq!(canonicalize(&payload), "code=P0001&message=");
    }

    #[test]
    fn nested_values_use_compact_json() {
        let mut payload = SignablePayload::new();
        payload.insert("productInfo", json!(["Widget"]));
        assert_eq!(canonicalize(&payload), r#"productInfo=["Widget"]"#);
    }

    #[test]
    fn sign_is_deterministic() {
        let payload = sample_payload();
        assert_eq!(sign(&payload, "secret"), sign(&payload, "secret"));
    }

    #[test]
    fn sign_changes_with_any_field_or_key() {
        let payload = sample_payload();
        let base = sign(&payload, "secret");

        let mut tweaked = sample_payload();
        tweaked.insert("amount", "111.01");
        assert_ne!(sign(&tweaked, "secret"), base);

        assert_ne!(sign(&payload, "other-secret"), base);
    }

    #[test]
    fn verify_roundtrip() {
        let payload = sample_payload();
        let sig = sign(&payload, "secret");
        assert!(verify(&payload, &sig, "secret"));
    }

    #[test]
    fn verify_is_case_insensitive() {
        let payload = sample_payload();
        let sig = sign(&payload, "secret").to_ascii_uppercase();
        assert!(verify(&payload, &sig, "secret"));
    }

    #[test]
    fn verify_rejects_empty_signature() {
        assert!(!verify(&sample_payload(), "", "secret"));
    }

    #[test]
    fn verify_rejects_empty_secret() {
        let payload = sample_payload();
        let sig = sign(&payload, "secret");
        assert!(!verify(&payload, &sig, ""));
    }

    #[test]
    fn verify_rejects_single_character_mutation() {
        let payload = sample_payload();
        let sig = sign(&payload, "secret");
        let mut bytes = sig.into_bytes();
        bytes[0] = if bytes[0] == b'0' { b'1' } else { b'0' };
        let mutated = String::from_utf8(bytes).unwrap();
        assert!(!verify(&payload, &mutated, "secret"));
    }

    #[test]
    fn signature_is_128_bit_hex() {
        let sig = sign(&sample_payload(), "secret");
        assert_eq!(sig.len(), 32);
        assert!(sig.bytes().all(|b| b.is_ascii_hexdigit()));
        assert_eq!(sig, sig.to_ascii_lowercase());
    }
}
