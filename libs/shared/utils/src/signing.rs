//! Outbound webhook signing and inbound verification (§4.6, §6): the same
//! HMAC-SHA256 primitive as `identity::validate_token`, generalized from
//! signature-checking a token to signing an arbitrary payload.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// `sig = "sha256=" + hex(HMAC-SHA256(secret, body))` (§4.6).
pub fn sign_payload(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(body);
    let digest = mac.finalize().into_bytes();
    format!("sha256={}", hex::encode(digest))
}

/// Constant-time verification rejecting stale timestamps (§4.6, §6): replies
/// older than 300s are rejected regardless of signature validity. The
/// comparison itself reuses `Mac::verify_slice`, the same constant-time
/// primitive `identity::validate_token` already relies on for signatures.
pub fn verify_signature(
    secret: &str,
    body: &[u8],
    signature_header: &str,
    timestamp_header: &str,
    now_unix: i64,
    max_skew_secs: i64,
) -> bool {
    let Ok(ts) = timestamp_header.parse::<i64>() else {
        return false;
    };
    if (now_unix - ts).abs() > max_skew_secs {
        return false;
    }

    let Some(hex_digest) = signature_header.strip_prefix("sha256=") else {
        return false;
    };
    let Ok(claimed) = hex::decode(hex_digest) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&claimed).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify_round_trips() {
        let secret = "whsec_test";
        let body = br#"{"eventType":"booking.created"}"#;
        let sig = sign_payload(secret, body);
        let now = 1_700_000_000;
        assert!(verify_signature(secret, body, &sig, &now.to_string(), now, 300));
    }

    #[test]
    fn rejects_timestamp_outside_tolerance() {
        let secret = "whsec_test";
        let body = b"{}";
        let sig = sign_payload(secret, body);
        let now = 1_700_000_000;
        let stale = (now - 301).to_string();
        assert!(!verify_signature(secret, body, &sig, &stale, now, 300));
    }

    #[test]
    fn rejects_tampered_body() {
        let secret = "whsec_test";
        let sig = sign_payload(secret, b"original");
        let now = 1_700_000_000;
        assert!(!verify_signature(secret, b"tampered", &sig, &now.to_string(), now, 300));
    }
}
