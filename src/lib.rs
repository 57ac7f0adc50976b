//! OAuth 2.0 client authentication with local account policy.
//!
//! This crate negotiates authorization with a remote identity provider,
//! exchanges credentials or codes for tokens, and gates the result on local
//! account state (enabled, not expired, not locked, password not expired).
//! Transport serving, session storage, and user persistence stay with the
//! caller; the seams are the [`UserStore`] and [`PasswordMatcher`] traits and
//! the [`ClientConfig`] describing the registered client.

mod account;
mod client;
mod credentials;
mod error;
mod grant;
mod password;
mod pipeline;
mod state;
mod types;

pub use account::{AccountPolicy, UserState, UserStore};
pub use client::{ClientConfig, OauthClient};
pub use credentials::SecureCredential;
pub use error::AuthError;
pub use grant::{Grant, GrantType};
pub use password::{PasswordMatcher, Sha256PasswordMatcher, constant_time_eq};
pub use pipeline::Authenticator;
pub use state::new_state_value;
pub use types::{
    Authentication, AuthenticationResult, AuthorizationRedirect, CallbackParams, TokenResponse,
};
