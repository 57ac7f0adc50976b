use std::collections::BTreeMap;
use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{AuthError, ClientConfig, SecureCredential};

/// OAuth 2.0 grant type, RFC 6749 wire form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantType {
    Password,
    AuthorizationCode,
    RefreshToken,
    ClientCredentials,
}

impl GrantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantType::Password => "password",
            GrantType::AuthorizationCode => "authorization_code",
            GrantType::RefreshToken => "refresh_token",
            GrantType::ClientCredentials => "client_credentials",
        }
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A token-endpoint request body, one variant per grant type.
///
/// [`to_request_map`](Self::to_request_map) is the single source of truth for
/// the bytes that leave the process toward the token endpoint: every key is
/// defined by the grant's RFC 6749 section, and absent optionals are omitted
/// rather than sent empty. Constructed per request, immutable afterwards; the
/// password variant zeroes its secret on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub enum Grant {
    Password {
        username: String,
        secret: Vec<u8>,
        scope: Option<String>,
        client_id: String,
        client_secret: Option<String>,
    },
    AuthorizationCode {
        code: String,
        redirect_uri: String,
        client_id: String,
        client_secret: Option<String>,
    },
    RefreshToken {
        refresh_token: String,
        client_id: String,
        client_secret: Option<String>,
    },
    ClientCredentials {
        scope: Option<String>,
        client_id: String,
        client_secret: Option<String>,
    },
}

impl Grant {
    /// Resource-owner password grant (RFC 6749 §4.3.2).
    ///
    /// Fails with [`AuthError::InvalidCredential`] when the credential has an
    /// empty identity or secret. The secret bytes are copied into the grant;
    /// the caller still owns (and should wipe) the credential.
    pub fn password(
        credential: &SecureCredential,
        config: &ClientConfig,
    ) -> Result<Self, AuthError> {
        if credential.identity().is_empty() || credential.secret().is_empty() {
            return Err(AuthError::InvalidCredential);
        }
        Ok(Grant::Password {
            username: credential.identity().to_string(),
            secret: credential.secret().to_vec(),
            scope: config.scope(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        })
    }

    /// Authorization-code grant (RFC 6749 §4.1.3).
    pub fn authorization_code(code: impl Into<String>, config: &ClientConfig) -> Self {
        Grant::AuthorizationCode {
            code: code.into(),
            redirect_uri: config.redirect_uri.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        }
    }

    /// Refresh-token grant (RFC 6749 §6).
    pub fn refresh_token(refresh_token: impl Into<String>, config: &ClientConfig) -> Self {
        Grant::RefreshToken {
            refresh_token: refresh_token.into(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        }
    }

    /// Client-credentials grant (RFC 6749 §4.4.2).
    pub fn client_credentials(config: &ClientConfig) -> Self {
        Grant::ClientCredentials {
            scope: config.scope(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        }
    }

    pub fn grant_type(&self) -> GrantType {
        match self {
            Grant::Password { .. } => GrantType::Password,
            Grant::AuthorizationCode { .. } => GrantType::AuthorizationCode,
            Grant::RefreshToken { .. } => GrantType::RefreshToken,
            Grant::ClientCredentials { .. } => GrantType::ClientCredentials,
        }
    }

    /// Serialize into the form body for the token endpoint. Pure; never fails.
    pub fn to_request_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("grant_type".to_string(), self.grant_type().to_string());
        match self {
            Grant::Password {
                username,
                secret,
                scope,
                client_id,
                client_secret,
            } => {
                map.insert("username".to_string(), username.clone());
                map.insert(
                    "password".to_string(),
                    String::from_utf8_lossy(secret).into_owned(),
                );
                if let Some(scope) = scope {
                    map.insert("scope".to_string(), scope.clone());
                }
                map.insert("client_id".to_string(), client_id.clone());
                if let Some(client_secret) = client_secret {
                    map.insert("client_secret".to_string(), client_secret.clone());
                }
            }
            Grant::AuthorizationCode {
                code,
                redirect_uri,
                client_id,
                client_secret,
            } => {
                map.insert("code".to_string(), code.clone());
                map.insert("redirect_uri".to_string(), redirect_uri.clone());
                map.insert("client_id".to_string(), client_id.clone());
                if let Some(client_secret) = client_secret {
                    map.insert("client_secret".to_string(), client_secret.clone());
                }
            }
            Grant::RefreshToken {
                refresh_token,
                client_id,
                client_secret,
            } => {
                map.insert("refresh_token".to_string(), refresh_token.clone());
                map.insert("client_id".to_string(), client_id.clone());
                if let Some(client_secret) = client_secret {
                    map.insert("client_secret".to_string(), client_secret.clone());
                }
            }
            Grant::ClientCredentials {
                scope,
                client_id,
                client_secret,
            } => {
                if let Some(scope) = scope {
                    map.insert("scope".to_string(), scope.clone());
                }
                map.insert("client_id".to_string(), client_id.clone());
                if let Some(client_secret) = client_secret {
                    map.insert("client_secret".to_string(), client_secret.clone());
                }
            }
        }
        map
    }
}

impl fmt::Debug for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Redacts the password variant's secret; everything else is wire data.
        match self {
            Grant::Password {
                username,
                scope,
                client_id,
                ..
            } => f
                .debug_struct("Password")
                .field("username", username)
                .field("secret", &"***")
                .field("scope", scope)
                .field("client_id", client_id)
                .finish_non_exhaustive(),
            Grant::AuthorizationCode {
                code,
                redirect_uri,
                client_id,
                ..
            } => f
                .debug_struct("AuthorizationCode")
                .field("code", code)
                .field("redirect_uri", redirect_uri)
                .field("client_id", client_id)
                .finish_non_exhaustive(),
            Grant::RefreshToken { client_id, .. } => f
                .debug_struct("RefreshToken")
                .field("client_id", client_id)
                .finish_non_exhaustive(),
            Grant::ClientCredentials {
                scope, client_id, ..
            } => f
                .debug_struct("ClientCredentials")
                .field("scope", scope)
                .field("client_id", client_id)
                .finish_non_exhaustive(),
        }
    }
}
