use reqwest::Client;
use tracing::debug;

use crate::{
    AccountPolicy, AuthError, AuthenticationResult, CallbackParams, ClientConfig, OauthClient,
    PasswordMatcher, SecureCredential, UserStore,
};

/// Glue from inbound credential or callback to a single
/// [`AuthenticationResult`].
///
/// Composition order is fixed: credential validation, grant construction,
/// token exchange, then local account policy where one is configured. Each
/// call runs one independent attempt on a fresh [`OauthClient`]; the
/// authenticator itself holds no per-attempt state and is safe to share.
pub struct Authenticator {
    config: ClientConfig,
    http: Option<Client>,
    local: Option<LocalAccounts>,
}

struct LocalAccounts {
    store: Box<dyn UserStore>,
    matcher: Box<dyn PasswordMatcher>,
}

impl Authenticator {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            http: None,
            local: None,
        }
    }

    /// Enforce local account policy on top of the provider's answer. The
    /// store supplies [`UserState`](crate::UserState) snapshots; the matcher
    /// checks raw secrets against their encoded form.
    pub fn with_local_accounts(
        mut self,
        store: impl UserStore + 'static,
        matcher: impl PasswordMatcher + 'static,
    ) -> Self {
        self.local = Some(LocalAccounts {
            store: Box::new(store),
            matcher: Box::new(matcher),
        });
        self
    }

    /// Use a caller-built HTTP client for every attempt.
    pub fn with_http_client(mut self, http: Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Start a fresh code-flow attempt. The caller issues the redirect from
    /// the returned client, holds it across the round trip, and hands the
    /// callback to [`callback`](Self::callback).
    pub fn begin(&self) -> Result<OauthClient, AuthError> {
        match &self.http {
            Some(http) => OauthClient::with_http_client(self.config.clone(), http.clone()),
            None => OauthClient::new(self.config.clone()),
        }
    }

    /// Resource-owner password path: exchange the credential for tokens, then
    /// match and gate against the local account when one is configured.
    ///
    /// The credential is consumed; its secret storage is zeroed when the
    /// attempt completes, success or not.
    pub async fn authenticate(&self, credential: SecureCredential) -> AuthenticationResult {
        if credential.identity().is_empty() || credential.secret().is_empty() {
            return Err(AuthError::InvalidCredential);
        }

        let mut client = self.begin()?;
        let token = client.exchange_password(&credential).await?;

        if let Some(local) = &self.local {
            let user = local
                .store
                .find_by_username(credential.identity())
                // An unknown user is indistinguishable from a bad password.
                .ok_or(AuthError::InvalidCredential)?;
            if !local.matcher.matches(credential.secret(), &user.encoded_secret) {
                return Err(AuthError::InvalidCredential);
            }
            AccountPolicy::validate(&user)?;
        }

        debug!(identity = %credential.identity(), "password authentication succeeded");
        Ok(crate::Authentication::from_token(
            credential.identity(),
            &token,
        ))
    }

    /// Code-flow completion: validate and exchange the callback on the
    /// attempt's client, then gate against the local account when the
    /// authenticated identity has one.
    pub async fn callback(
        &self,
        client: &mut OauthClient,
        params: &CallbackParams,
    ) -> AuthenticationResult {
        let authentication = client.on_callback(params).await?;

        if let Some(local) = &self.local {
            if let Some(user) = local.store.find_by_username(&authentication.identity) {
                AccountPolicy::validate(&user)?;
            }
        }

        Ok(authentication)
    }
}
