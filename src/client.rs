use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::password::constant_time_eq;
use crate::state::new_state_value;
use crate::{
    AuthError, Authentication, AuthorizationRedirect, CallbackParams, Grant, SecureCredential,
    TokenResponse,
};

/// Registered-client configuration for one authorization server.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub scopes: Vec<String>,
    pub redirect_uri: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(
        client_id: impl Into<String>,
        authorization_endpoint: impl Into<String>,
        token_endpoint: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            scopes: Vec::new(),
            redirect_uri: redirect_uri.into(),
            authorization_endpoint: authorization_endpoint.into(),
            token_endpoint: token_endpoint.into(),
            timeout: None,
        }
    }

    pub fn with_client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Scopes joined by a single space, in configured order. `None` when the
    /// list is empty so the wire field is omitted rather than sent blank.
    pub(crate) fn scope(&self) -> Option<String> {
        if self.scopes.is_empty() {
            None
        } else {
            Some(self.scopes.join(" "))
        }
    }
}

/// Where a single authorization attempt currently stands. Terminal phases are
/// never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    RedirectIssued,
    CallbackReceived,
    TokenExchanged,
    Authenticated,
    Failed,
}

impl Phase {
    fn describe(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::RedirectIssued => "awaiting callback",
            Phase::CallbackReceived => "exchanging",
            Phase::TokenExchanged => "exchanged",
            Phase::Authenticated => "authenticated",
            Phase::Failed => "failed",
        }
    }
}

/// Error body shape providers return from the token endpoint (RFC 6749 §5.2).
#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    error: Option<String>,
    error_description: Option<String>,
}

/// One authorization attempt against one provider.
///
/// An instance walks `Idle → RedirectIssued → CallbackReceived →
/// TokenExchanged → Authenticated` (or `Failed`) exactly once and is not
/// reused; a retry is a new instance with a fresh state value. The token
/// exchange is the only operation that touches the network.
pub struct OauthClient {
    config: ClientConfig,
    http: Client,
    phase: Phase,
    issued_state: Option<String>,
}

impl OauthClient {
    pub fn new(config: ClientConfig) -> Result<Self, AuthError> {
        Url::parse(&config.authorization_endpoint)?;
        Url::parse(&config.token_endpoint)?;
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|err| AuthError::TokenExchange {
            code: None,
            description: Some(err.to_string()),
        })?;
        Ok(Self {
            config,
            http,
            phase: Phase::Idle,
            issued_state: None,
        })
    }

    /// Same as [`new`](Self::new) but with a caller-built HTTP client, so
    /// tests and embedders control the transport.
    pub fn with_http_client(config: ClientConfig, http: Client) -> Result<Self, AuthError> {
        Url::parse(&config.authorization_endpoint)?;
        Url::parse(&config.token_endpoint)?;
        Ok(Self {
            config,
            http,
            phase: Phase::Idle,
            issued_state: None,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The state value issued by [`authorization_redirect`](Self::authorization_redirect),
    /// once one exists.
    pub fn issued_state(&self) -> Option<&str> {
        self.issued_state.as_deref()
    }

    /// Build the redirect that starts the code flow. Pure construction plus
    /// state-value generation; no network.
    pub fn authorization_redirect(&mut self) -> Result<AuthorizationRedirect, AuthError> {
        self.require(Phase::Idle)?;

        let state = new_state_value()?;
        let mut url = Url::parse(&self.config.authorization_endpoint)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("response_type", "code");
            pairs.append_pair("client_id", &self.config.client_id);
            pairs.append_pair("redirect_uri", &self.config.redirect_uri);
            if let Some(scope) = self.config.scope() {
                pairs.append_pair("scope", &scope);
            }
            pairs.append_pair("state", &state);
        }
        // The serializer writes form-urlencoded spaces as '+'; the
        // authorization endpoint gets percent-encoded spaces instead. Any
        // literal '+' in a value is already %2B at this point.
        if let Some(query) = url.query() {
            let query = query.replace('+', "%20");
            url.set_query(Some(&query));
        }

        self.issued_state = Some(state.clone());
        self.phase = Phase::RedirectIssued;
        debug!(client_id = %self.config.client_id, "issued authorization redirect");

        Ok(AuthorizationRedirect {
            location: url.to_string(),
            state,
        })
    }

    /// Handle the provider's callback and exchange the code for tokens.
    ///
    /// The callback state must match the issued one exactly. An `error`
    /// parameter means the provider denied the attempt, even when a code is
    /// also present. A callback carrying neither code nor error is malformed.
    pub async fn on_callback(
        &mut self,
        params: &CallbackParams,
    ) -> Result<Authentication, AuthError> {
        self.require(Phase::RedirectIssued)?;

        let issued = self.issued_state.clone().unwrap_or_default();
        let received = params.state.as_deref().unwrap_or_default();
        if !constant_time_eq(issued.as_bytes(), received.as_bytes()) {
            return Err(self.fail(AuthError::InvalidState));
        }

        if let Some(error) = &params.error {
            return Err(self.fail(AuthError::ProviderDenied {
                error: error.clone(),
                description: params.error_description.clone(),
            }));
        }

        let Some(code) = params.code.clone() else {
            return Err(self.fail(AuthError::MalformedCallback));
        };
        self.phase = Phase::CallbackReceived;

        let grant = Grant::authorization_code(code, &self.config);
        let token = match self.exchange(grant).await {
            Ok(token) => token,
            Err(err) => return Err(self.fail(err)),
        };
        self.phase = Phase::TokenExchanged;

        let identity = token
            .identity_claim()
            .unwrap_or(&self.config.client_id)
            .to_string();
        let authentication = Authentication::from_token(identity, &token);
        self.phase = Phase::Authenticated;
        debug!(identity = %authentication.identity, "authorization attempt authenticated");
        Ok(authentication)
    }

    /// Resource-owner password flow: no redirect, a single exchange.
    ///
    /// Provider rejections with the `invalid_grant` error code surface as
    /// [`AuthError::InvalidGrant`]; everything else follows the usual
    /// token-exchange error mapping.
    pub async fn exchange_password(
        &mut self,
        credential: &SecureCredential,
    ) -> Result<TokenResponse, AuthError> {
        self.require(Phase::Idle)?;

        let grant = match Grant::password(credential, &self.config) {
            Ok(grant) => grant,
            Err(err) => return Err(self.fail(err)),
        };

        match self.exchange(grant).await {
            Ok(token) => {
                self.phase = Phase::TokenExchanged;
                Ok(token)
            }
            Err(AuthError::TokenExchange { code, description })
                if code.as_deref() == Some("invalid_grant") =>
            {
                Err(self.fail(AuthError::InvalidGrant { description }))
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Exchange a stored refresh token for a fresh token response.
    pub async fn exchange_refresh(
        &mut self,
        refresh_token: &str,
    ) -> Result<TokenResponse, AuthError> {
        self.require(Phase::Idle)?;

        let grant = Grant::refresh_token(refresh_token, &self.config);
        match self.exchange(grant).await {
            Ok(token) => {
                self.phase = Phase::TokenExchanged;
                Ok(token)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    fn require(&self, expected: Phase) -> Result<(), AuthError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(AuthError::AttemptState(self.phase.describe()))
        }
    }

    fn fail(&mut self, err: AuthError) -> AuthError {
        self.phase = Phase::Failed;
        warn!(error = %err, "authorization attempt failed");
        err
    }

    /// POST the grant's request map to the token endpoint. The sole await
    /// point of an attempt; transport failures and non-2xx statuses both come
    /// back as [`AuthError::TokenExchange`].
    async fn exchange(&self, grant: Grant) -> Result<TokenResponse, AuthError> {
        let payload = grant.to_request_map();
        debug!(grant_type = %grant.grant_type(), "sending token request");

        let response = self
            .http
            .post(&self.config.token_endpoint)
            .form(&payload)
            .send()
            .await
            .map_err(|err| AuthError::TokenExchange {
                code: None,
                description: Some(err.without_url().to_string()),
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| AuthError::TokenExchange {
                code: None,
                description: Some(err.without_url().to_string()),
            })?;

        if !status.is_success() {
            let parsed: Option<TokenErrorBody> = serde_json::from_str(&body).ok();
            let (code, description) = parsed
                .map(|body| (body.error, body.error_description))
                .unwrap_or((None, None));
            warn!(status = status.as_u16(), code = code.as_deref().unwrap_or("-"),
                "token endpoint rejected the exchange");
            return Err(AuthError::TokenExchange { code, description });
        }

        serde_json::from_str(&body).map_err(|_| AuthError::MalformedTokenResponse)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use url::Url;

    use super::{ClientConfig, OauthClient};
    use crate::{AuthError, CallbackParams};

    fn config() -> ClientConfig {
        ClientConfig::new(
            "client-id",
            "https://idp.example/authorize",
            "https://idp.example/token",
            "https://app.example/callback",
        )
    }

    #[test]
    fn redirect_location_includes_required_params() {
        let mut client = OauthClient::new(config().with_scopes(["openid", "email"])).unwrap();
        let redirect = client.authorization_redirect().unwrap();

        let url = Url::parse(&redirect.location).unwrap();
        let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(pairs.get("response_type"), Some(&"code".to_string()));
        assert_eq!(pairs.get("client_id"), Some(&"client-id".to_string()));
        assert_eq!(
            pairs.get("redirect_uri"),
            Some(&"https://app.example/callback".to_string())
        );
        assert_eq!(pairs.get("scope"), Some(&"openid email".to_string()));
        assert_eq!(pairs.get("state"), Some(&redirect.state));
    }

    #[test]
    fn redirect_location_encodes_scope_separator() {
        let mut client = OauthClient::new(config().with_scopes(["openid", "email"])).unwrap();
        let redirect = client.authorization_redirect().unwrap();
        assert!(redirect.location.contains("scope=openid%20email"));
    }

    #[test]
    fn redirect_omits_scope_when_unconfigured() {
        let mut client = OauthClient::new(config()).unwrap();
        let redirect = client.authorization_redirect().unwrap();
        assert!(!redirect.location.contains("scope="));
    }

    #[test]
    fn state_values_differ_between_attempts() {
        let first = OauthClient::new(config())
            .unwrap()
            .authorization_redirect()
            .unwrap();
        let second = OauthClient::new(config())
            .unwrap()
            .authorization_redirect()
            .unwrap();
        assert_ne!(first.state, second.state);
    }

    #[test]
    fn one_attempt_per_instance() {
        let mut client = OauthClient::new(config()).unwrap();
        client.authorization_redirect().unwrap();
        let again = client.authorization_redirect();
        assert!(matches!(again, Err(AuthError::AttemptState(_))));
    }

    #[test]
    fn rejects_invalid_endpoint_urls() {
        let config = ClientConfig::new("client-id", "not a url", "https://idp.example/token", "x");
        assert!(matches!(
            OauthClient::new(config),
            Err(AuthError::InvalidEndpoint(_))
        ));
    }

    #[tokio::test]
    async fn callback_with_mismatched_state_fails() {
        let mut client = OauthClient::new(config()).unwrap();
        client.authorization_redirect().unwrap();

        let params = CallbackParams::new(Some("abc123"), Some("wrong-state"));
        let result = client.on_callback(&params).await;
        assert!(matches!(result, Err(AuthError::InvalidState)));
    }

    #[tokio::test]
    async fn callback_without_state_fails() {
        let mut client = OauthClient::new(config()).unwrap();
        client.authorization_redirect().unwrap();

        let params = CallbackParams::new(Some("abc123"), None);
        let result = client.on_callback(&params).await;
        assert!(matches!(result, Err(AuthError::InvalidState)));
    }

    #[tokio::test]
    async fn error_parameter_dominates_code() {
        let mut client = OauthClient::new(config()).unwrap();
        let redirect = client.authorization_redirect().unwrap();

        let params = CallbackParams {
            code: Some("abc123".to_string()),
            state: Some(redirect.state),
            error: Some("access_denied".to_string()),
            error_description: Some("user said no".to_string()),
        };
        let result = client.on_callback(&params).await;
        assert!(matches!(
            result,
            Err(AuthError::ProviderDenied { ref error, .. }) if error == "access_denied"
        ));
    }

    #[tokio::test]
    async fn callback_with_neither_code_nor_error_is_malformed() {
        let mut client = OauthClient::new(config()).unwrap();
        let redirect = client.authorization_redirect().unwrap();

        let params = CallbackParams::new(None, Some(&redirect.state));
        let result = client.on_callback(&params).await;
        assert!(matches!(result, Err(AuthError::MalformedCallback)));
    }

    #[tokio::test]
    async fn failed_attempt_stays_failed() {
        let mut client = OauthClient::new(config()).unwrap();
        client.authorization_redirect().unwrap();

        let params = CallbackParams::new(Some("abc123"), Some("wrong-state"));
        assert!(client.on_callback(&params).await.is_err());

        let retry = client.on_callback(&params).await;
        assert!(matches!(retry, Err(AuthError::AttemptState("failed"))));
    }

    #[tokio::test]
    async fn callback_before_redirect_is_rejected() {
        let mut client = OauthClient::new(config()).unwrap();
        let params = CallbackParams::new(Some("abc123"), Some("s"));
        let result = client.on_callback(&params).await;
        assert!(matches!(result, Err(AuthError::AttemptState("idle"))));
    }
}
