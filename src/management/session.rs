use std::{fmt, sync::Arc};

use chrono::{Duration, Utc};
use url::Url;

use crate::{
    config::Config,
    error::AuthError,
    management::ApiClientHandle,
    pkce::{self, PkceParams},
    spotify::token::TokenEndpoint,
    types::TokenSet,
};

/// Default window before expiry in which a handle request refreshes first.
pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::seconds(60);

/// Externally visible phase of an [`AuthSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingRedirect,
    Authenticated,
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::AwaitingRedirect => "awaiting redirect",
            SessionState::Authenticated => "authenticated",
            SessionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

struct PendingFlow {
    pkce: PkceParams,
    csrf_state: String,
}

enum Flow {
    Idle,
    AwaitingRedirect(PendingFlow),
    Authenticated(Arc<TokenSet>),
    Failed(String),
}

/// Drives one OAuth 2.0 PKCE authorization for one end user.
///
/// The session owns the verifier, the CSRF state and, once authenticated,
/// the token set. It moves through `Idle → AwaitingRedirect → Authenticated`;
/// any failure while completing the flow leaves it `Failed` until a new flow
/// is started.
///
/// Token sets are shared with handed-out [`ApiClientHandle`]s through an
/// `Arc` and replaced in a single assignment on refresh, so a handle always
/// sees either the complete old set or the complete new one.
pub struct AuthSession {
    config: Config,
    endpoint: TokenEndpoint,
    flow: Flow,
    refresh_margin: Duration,
}

impl AuthSession {
    /// Creates an idle session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self, AuthError> {
        let endpoint = TokenEndpoint::new(&config)?;
        Ok(Self {
            config,
            endpoint,
            flow: Flow::Idle,
            refresh_margin: DEFAULT_REFRESH_MARGIN,
        })
    }

    pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        match self.flow {
            Flow::Idle => SessionState::Idle,
            Flow::AwaitingRedirect(_) => SessionState::AwaitingRedirect,
            Flow::Authenticated(_) => SessionState::Authenticated,
            Flow::Failed(_) => SessionState::Failed,
        }
    }

    /// Returns why the last flow attempt failed, if the session is `Failed`.
    pub fn failure(&self) -> Option<&str> {
        match &self.flow {
            Flow::Failed(reason) => Some(reason.as_str()),
            _ => None,
        }
    }

    /// Returns the CSRF state of the in-flight attempt.
    ///
    /// Servers juggling several users can key pending sessions by it.
    pub fn pending_state(&self) -> Option<&str> {
        match &self.flow {
            Flow::AwaitingRedirect(pending) => Some(pending.csrf_state.as_str()),
            _ => None,
        }
    }

    /// Returns the current token set once authenticated.
    pub fn token_set(&self) -> Option<&TokenSet> {
        match &self.flow {
            Flow::Authenticated(tokens) => Some(tokens.as_ref()),
            _ => None,
        }
    }

    /// Drops any pending attempt, failure or token set.
    pub fn reset(&mut self) {
        self.flow = Flow::Idle;
    }

    /// Starts a new authorization attempt and returns the URL to visit.
    ///
    /// Starting again while a redirect is pending, or after a failure,
    /// discards the previous verifier/state pair: only the latest attempt can
    /// be completed.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidStateTransition`] when already
    /// authenticated; call [`AuthSession::reset`] first.
    pub fn start_auth_flow(&mut self) -> Result<Url, AuthError> {
        if let Flow::Authenticated(_) = self.flow {
            return Err(self.invalid_transition("start an authorization flow"));
        }

        let pkce = PkceParams::generate();
        let csrf_state = pkce::generate_state();

        let url = pkce::build_authorization_url(
            &self.config.auth_url,
            &self.config.client_id,
            &self.config.redirect_uri,
            &self.config.scope,
            pkce.challenge(),
            &csrf_state,
        );

        if let Flow::AwaitingRedirect(_) = self.flow {
            tracing::debug!("discarding previous pending authorization attempt");
        }
        self.flow = Flow::AwaitingRedirect(PendingFlow { pkce, csrf_state });
        tracing::debug!("authorization flow started");

        Ok(url)
    }

    /// Completes the pending attempt with the URL the user was redirected to.
    ///
    /// The returned state must match the one issued by
    /// [`AuthSession::start_auth_flow`] before any token request is made.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidStateTransition`] if no attempt is pending
    /// - [`AuthError::InvalidRedirectUrl`], [`AuthError::RemoteAuth`],
    ///   [`AuthError::MissingCode`], [`AuthError::MissingState`] from parsing
    /// - [`AuthError::StateMismatch`] if the state differs
    /// - [`AuthError::TokenExchange`] if the token endpoint call fails
    ///
    /// Every error except the first leaves the session `Failed`.
    pub async fn complete_auth_flow(
        &mut self,
        redirect_url: &str,
    ) -> Result<ApiClientHandle, AuthError> {
        let pending = match std::mem::replace(&mut self.flow, Flow::Idle) {
            Flow::AwaitingRedirect(pending) => pending,
            other => {
                self.flow = other;
                return Err(self.invalid_transition("complete an authorization flow"));
            }
        };

        let response = match pkce::parse_redirect(redirect_url) {
            Ok(response) => response,
            Err(e) => return Err(self.fail(e)),
        };

        if !pkce::states_match(&response.state, &pending.csrf_state) {
            return Err(self.fail(AuthError::StateMismatch));
        }

        // Stays failed if the exchange future is dropped before it resolves.
        self.flow = Flow::Failed("authorization code exchange did not finish".to_string());

        let result = self
            .endpoint
            .exchange_code(
                &response.code,
                &self.config.redirect_uri,
                pending.pkce.verifier(),
                &self.config.scope,
            )
            .await;

        match result {
            Ok(tokens) => {
                let tokens = Arc::new(tokens);
                self.flow = Flow::Authenticated(Arc::clone(&tokens));
                tracing::debug!(expires_at = %tokens.expires_at, "authorization flow completed");
                Ok(ApiClientHandle::new(tokens))
            }
            Err(e) => Err(self.fail(AuthError::TokenExchange(e))),
        }
    }

    /// Replaces the token set using the stored refresh token.
    ///
    /// On failure the previous token set stays in place and the session stays
    /// `Authenticated`.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidStateTransition`] if not authenticated
    /// - [`AuthError::NoRefreshToken`] if the token set has no refresh token
    /// - [`AuthError::Transport`] if the token endpoint call fails
    pub async fn refresh_auth(&mut self) -> Result<ApiClientHandle, AuthError> {
        let current = match &self.flow {
            Flow::Authenticated(tokens) => Arc::clone(tokens),
            _ => return Err(self.invalid_transition("refresh tokens")),
        };

        if current.refresh_token.is_none() {
            return Err(AuthError::NoRefreshToken);
        }

        let refreshed = Arc::new(self.endpoint.refresh(&current).await?);
        self.flow = Flow::Authenticated(Arc::clone(&refreshed));
        tracing::debug!(expires_at = %refreshed.expires_at, "access token refreshed");

        Ok(ApiClientHandle::new(refreshed))
    }

    /// True while authenticated with an access token that has not expired.
    pub fn is_authenticated(&self) -> bool {
        match &self.flow {
            Flow::Authenticated(tokens) => !tokens.is_expired_at(Utc::now()),
            _ => false,
        }
    }

    /// Returns a handle bound to the current access token.
    ///
    /// Returns `Ok(None)` unless authenticated. A token that expires within
    /// the refresh margin is refreshed first. If that refresh fails while the
    /// old token is still valid, the old token is handed out; once it has
    /// expired the refresh error is returned instead.
    pub async fn api_client_handle(&mut self) -> Result<Option<ApiClientHandle>, AuthError> {
        let current = match &self.flow {
            Flow::Authenticated(tokens) => Arc::clone(tokens),
            _ => return Ok(None),
        };

        let now = Utc::now();
        if !current.expires_within(now, self.refresh_margin) {
            return Ok(Some(ApiClientHandle::new(current)));
        }

        match self.refresh_auth().await {
            Ok(handle) => Ok(Some(handle)),
            Err(e) if !current.is_expired_at(Utc::now()) => {
                tracing::warn!(error = %e, "token refresh failed, using current access token");
                Ok(Some(ApiClientHandle::new(current)))
            }
            Err(e) => Err(e),
        }
    }

    fn fail(&mut self, err: AuthError) -> AuthError {
        tracing::debug!(error = %err, "authorization flow failed");
        self.flow = Flow::Failed(err.to_string());
        err
    }

    fn invalid_transition(&self, operation: &'static str) -> AuthError {
        AuthError::InvalidStateTransition {
            operation,
            state: self.state(),
        }
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("client_id", &self.config.client_id)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
