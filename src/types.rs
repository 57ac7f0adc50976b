use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::AuthError;

/// The redirect a caller should return to the user agent to start the
/// authorization-code flow. `state` is the issued anti-forgery value; the
/// caller's session store keys it by its own per-attempt correlation id.
#[derive(Debug, Clone)]
pub struct AuthorizationRedirect {
    pub location: String,
    pub state: String,
}

/// Query parameters of an inbound authorization callback.
#[derive(Debug, Clone, Default)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl CallbackParams {
    pub fn new(code: Option<&str>, state: Option<&str>) -> Self {
        Self {
            code: code.map(str::to_string),
            state: state.map(str::to_string),
            ..Self::default()
        }
    }

    /// Parse the callback query out of a full callback URL.
    pub fn from_url(callback_url: &str) -> Result<Self, AuthError> {
        let url = Url::parse(callback_url).map_err(|_| AuthError::MalformedCallback)?;
        let mut params = Self::default();

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => params.code = Some(value.to_string()),
                "state" => params.state = Some(value.to_string()),
                "error" => params.error = Some(value.to_string()),
                "error_description" => params.error_description = Some(value.to_string()),
                _ => {}
            }
        }

        Ok(params)
    }
}

/// Token endpoint response body. Unknown claims are kept in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub expires_in: Option<u64>,
    pub id_token: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl TokenResponse {
    /// The identity claim the provider included alongside the token, if any.
    /// Checked in order: `sub`, `preferred_username`, `username`, `email`.
    pub fn identity_claim(&self) -> Option<&str> {
        ["sub", "preferred_username", "username", "email"]
            .iter()
            .find_map(|claim| self.extra.get(*claim).and_then(Value::as_str))
    }
}

/// A completed authentication: who was authenticated plus the provider-issued
/// attributes (tokens, expiry, scope, and any extra claims).
#[derive(Debug, Clone)]
pub struct Authentication {
    pub identity: String,
    pub attributes: HashMap<String, Value>,
}

impl Authentication {
    pub(crate) fn from_token(identity: impl Into<String>, token: &TokenResponse) -> Self {
        let mut attributes = HashMap::new();
        attributes.insert(
            "access_token".to_string(),
            Value::String(token.access_token.clone()),
        );
        if let Some(refresh_token) = &token.refresh_token {
            attributes.insert(
                "refresh_token".to_string(),
                Value::String(refresh_token.clone()),
            );
        }
        if let Some(token_type) = &token.token_type {
            attributes.insert("token_type".to_string(), Value::String(token_type.clone()));
        }
        if let Some(scope) = &token.scope {
            attributes.insert("scope".to_string(), Value::String(scope.clone()));
        }
        if let Some(expires_in) = token.expires_in {
            attributes.insert("expires_in".to_string(), Value::from(expires_in));
        }
        if let Some(id_token) = &token.id_token {
            attributes.insert("id_token".to_string(), Value::String(id_token.clone()));
        }
        for (key, value) in &token.extra {
            attributes.insert(key.clone(), value.clone());
        }
        Self {
            identity: identity.into(),
            attributes,
        }
    }
}

/// Terminal outcome of one authentication attempt.
pub type AuthenticationResult = Result<Authentication, AuthError>;
