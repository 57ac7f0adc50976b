use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{TryRngCore, rngs::OsRng};

use crate::AuthError;

const STATE_BYTES: usize = 32;

/// Generate a fresh anti-forgery state value for one authorization attempt.
///
/// 32 bytes from the OS RNG, base64url without padding, so the value is
/// unguessable and survives a query string untouched.
pub fn new_state_value() -> Result<String, AuthError> {
    let mut bytes = [0u8; STATE_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|err| AuthError::Rng {
            message: err.to_string(),
        })?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}
