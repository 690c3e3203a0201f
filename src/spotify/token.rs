use chrono::{Duration, Utc};
use reqwest::Client;
use url::Url;

use crate::{
    config::Config,
    error::TransportError,
    types::{OAuthErrorResponse, TokenResponse, TokenSet},
};

/// Client for the remote token endpoint.
///
/// Issues the two form-encoded grants used by the PKCE flow. No request is
/// retried; every call is bounded by the timeout taken from [`Config`].
#[derive(Debug, Clone)]
pub struct TokenEndpoint {
    http: Client,
    url: Url,
    client_id: String,
}

impl TokenEndpoint {
    pub fn new(config: &Config) -> Result<Self, TransportError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            url: config.token_url.clone(),
            client_id: config.client_id.clone(),
        })
    }

    /// Exchanges an authorization code and its PKCE verifier for a token set.
    ///
    /// `requested_scope` is recorded on the token set when the server does
    /// not echo a `scope` back.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        verifier: &str,
        requested_scope: &str,
    ) -> Result<TokenSet, TransportError> {
        let response = self
            .request_token(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("client_id", &self.client_id),
                ("code_verifier", verifier),
            ])
            .await?;

        into_token_set(response, None, requested_scope)
    }

    /// Trades a refresh token for a new token set.
    ///
    /// Spotify may omit `refresh_token` from the response, in which case the
    /// previous token stays in use; likewise for `scope`.
    pub async fn refresh(&self, previous: &TokenSet) -> Result<TokenSet, TransportError> {
        let refresh_token = previous.refresh_token.as_deref().unwrap_or_default();
        let response = self
            .request_token(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", &self.client_id),
            ])
            .await?;

        into_token_set(response, previous.refresh_token.clone(), &previous.scope)
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenResponse, TransportError> {
        let res = self.http.post(self.url.clone()).form(form).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            let message = match serde_json::from_str::<OAuthErrorResponse>(&body) {
                Ok(err) => match err.error_description {
                    Some(description) => format!("{}: {}", err.error, description),
                    None => err.error,
                },
                Err(_) => body,
            };
            return Err(TransportError::Status { status, message });
        }

        serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

fn into_token_set(
    response: TokenResponse,
    previous_refresh_token: Option<String>,
    fallback_scope: &str,
) -> Result<TokenSet, TransportError> {
    if response.access_token.is_empty() {
        return Err(TransportError::Decode(
            "token response contains an empty access_token".to_string(),
        ));
    }

    let expires_at = i64::try_from(response.expires_in)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        .ok_or_else(|| {
            TransportError::Decode(format!("expires_in {} is out of range", response.expires_in))
        })?;

    Ok(TokenSet {
        access_token: response.access_token,
        token_type: response.token_type,
        refresh_token: response
            .refresh_token
            .filter(|t| !t.is_empty())
            .or(previous_refresh_token),
        expires_at,
        scope: response
            .scope
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| fallback_scope.to_string()),
    })
}
