//! Static API-key checks and inbound webhook signature verification.

use std::net::IpAddr;

use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Header carrying the static API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Header carrying the Facebook payload signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

const SIGNATURE_PREFIX: &str = "sha256=";

type HmacSha256 = Hmac<Sha256>;

// ---------------------------------------------------------------------------
// API keys
// ---------------------------------------------------------------------------

/// Compare two strings without short-circuiting on the first mismatch.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

/// The presented key matches a configured one. An empty `expected` key
/// never matches.
pub fn key_matches(provided: Option<&str>, expected: &str) -> bool {
    match provided {
        Some(key) if !expected.is_empty() => constant_time_compare(key, expected),
        _ => false,
    }
}

/// A request is allowed when it presents the expected key, or when it comes
/// from a loopback address.
///
/// Only loopback callers get in when no key is configured.
pub fn is_authorized(provided: Option<&str>, expected: &str, peer: Option<IpAddr>) -> bool {
    peer.is_some_and(|ip| ip.is_loopback()) || key_matches(provided, expected)
}

// ---------------------------------------------------------------------------
// Webhook signatures
// ---------------------------------------------------------------------------

/// Compute the `sha256=<hex>` signature Facebook sends for `body`.
pub fn compute_signature(secret: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(body);
    format!("{SIGNATURE_PREFIX}{}", hex::encode(mac.finalize().into_bytes()))
}

/// Verify an `X-Hub-Signature-256` header value against `body`.
pub fn verify_signature(secret: &str, body: &[u8], header: &str) -> bool {
    let Some(hex_sig) = header.strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };
    let Some(expected) = hex::decode(hex_sig) else {
        return false;
    };
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

// ---------------------------------------------------------------------------
// hex helpers (no extra dep)
// ---------------------------------------------------------------------------

mod hex {
    /// Encode bytes as a lowercase hex string.
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes
            .as_ref()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }

    /// Decode a hex string; `None` on odd length or non-hex characters.
    pub fn decode(s: &str) -> Option<Vec<u8>> {
        if s.len() % 2 != 0 {
            return None;
        }
        (0..s.len())
            .step_by(2)
            .map(|i| s.get(i..i + 2).and_then(|pair| u8::from_str_radix(pair, 16).ok()))
            .collect()
    }
}
