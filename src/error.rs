use thiserror::Error;

/// Terminal failure of a single authentication attempt.
///
/// None of these are retried by the crate; a retry is always a fresh attempt
/// with a fresh state value. Secret material never appears in the display
/// strings.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credential")]
    InvalidCredential,

    #[error("invalid endpoint url: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("os rng error: {message}")]
    Rng { message: String },

    #[error("callback state does not match the issued state")]
    InvalidState,

    #[error("provider denied authorization: {error}")]
    ProviderDenied {
        error: String,
        description: Option<String>,
    },

    #[error("callback carried neither code nor error")]
    MalformedCallback,

    #[error("token exchange failed: {}", code.as_deref().unwrap_or("transport error"))]
    TokenExchange {
        /// Provider error code from the response body, when one was returned.
        /// `None` means the failure happened below HTTP (timeout, connect).
        code: Option<String>,
        description: Option<String>,
    },

    #[error("token response is missing an access token")]
    MalformedTokenResponse,

    #[error("provider rejected the grant")]
    InvalidGrant { description: Option<String> },

    #[error("account disabled")]
    AccountDisabled,

    #[error("account expired")]
    AccountExpired,

    #[error("account locked")]
    AccountLocked,

    #[error("password expired")]
    PasswordExpired,

    #[error("authorization attempt is already {0}")]
    AttemptState(&'static str),
}
