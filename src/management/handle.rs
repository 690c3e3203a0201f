use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};

use crate::{
    config::Config,
    error::TransportError,
    spotify::{HttpFetcher, SpotifyClient},
    types::TokenSet,
};

/// A snapshot of the access token minted by an [`AuthSession`].
///
/// Cheap to clone. The handle keeps the token set it was created from even
/// if the session refreshes in the meantime.
///
/// [`AuthSession`]: crate::management::AuthSession
#[derive(Clone)]
pub struct ApiClientHandle {
    tokens: Arc<TokenSet>,
}

impl ApiClientHandle {
    pub(crate) fn new(tokens: Arc<TokenSet>) -> Self {
        Self { tokens }
    }

    pub fn access_token(&self) -> &str {
        &self.tokens.access_token
    }

    pub fn token_type(&self) -> &str {
        &self.tokens.token_type
    }

    pub fn scope(&self) -> &str {
        &self.tokens.scope
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.tokens.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.tokens.is_expired_at(Utc::now())
    }

    /// Builds a typed client that authenticates with this handle's token.
    pub fn client(&self, config: &Config) -> Result<SpotifyClient<HttpFetcher>, TransportError> {
        let fetcher = HttpFetcher::new(config, self.clone())?;
        Ok(SpotifyClient::new(fetcher))
    }
}

impl fmt::Debug for ApiClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClientHandle")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.tokens.expires_at)
            .field("scope", &self.tokens.scope)
            .finish()
    }
}
