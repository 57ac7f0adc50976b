use std::fmt;
use std::hash::{Hash, Hasher};

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Identity plus raw secret for one authentication attempt.
///
/// The secret stays a byte sequence for its whole lifetime; there is no
/// string-returning accessor, and `Debug`/`Display` render it as `***`.
/// The backing storage is zeroed on drop, and callers that finish with the
/// credential earlier can call [`wipe`](Self::wipe) themselves.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecureCredential {
    #[zeroize(skip)]
    identity: String,
    secret: Vec<u8>,
}

impl SecureCredential {
    pub fn new(identity: impl Into<String>, secret: impl Into<Vec<u8>>) -> Self {
        Self {
            identity: identity.into(),
            secret: secret.into(),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Borrow the raw secret bytes. Callers must not retain the slice beyond
    /// immediate use.
    pub fn secret(&self) -> &[u8] {
        &self.secret
    }

    /// Mutable access so a caller can overwrite the secret in place.
    pub fn secret_mut(&mut self) -> &mut [u8] {
        &mut self.secret
    }

    /// Zero the secret storage now instead of waiting for drop.
    pub fn wipe(&mut self) {
        self.secret.zeroize();
    }
}

impl PartialEq for SecureCredential {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity && bool::from(self.secret.ct_eq(&other.secret))
    }
}

impl Eq for SecureCredential {}

impl Hash for SecureCredential {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity.hash(state);
        self.secret.hash(state);
    }
}

impl fmt::Debug for SecureCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureCredential")
            .field("identity", &self.identity)
            .field("secret", &"***")
            .finish()
    }
}

impl fmt::Display for SecureCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:***", self.identity)
    }
}
