use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Compare two byte strings in time independent of where they differ.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// Encodes raw secrets and matches them against stored encoded secrets.
///
/// The hashing algorithm is the implementor's business; this crate only
/// requires that `matches` does no early-exit comparison and that the raw
/// secret is not retained past the call.
pub trait PasswordMatcher: Send + Sync {
    fn encode(&self, raw: &[u8]) -> String;

    fn matches(&self, raw: &[u8], encoded: &str) -> bool;
}

/// Unsalted SHA-256 matcher, base64url-encoded.
///
/// A reference strategy for tests and development setups. Deployments should
/// plug a real KDF behind [`PasswordMatcher`] instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256PasswordMatcher;

impl PasswordMatcher for Sha256PasswordMatcher {
    fn encode(&self, raw: &[u8]) -> String {
        URL_SAFE_NO_PAD.encode(Sha256::digest(raw))
    }

    fn matches(&self, raw: &[u8], encoded: &str) -> bool {
        let candidate = self.encode(raw);
        constant_time_eq(candidate.as_bytes(), encoded.as_bytes())
    }
}
