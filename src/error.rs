//! Error types shared by the configuration, authorization and resource layers.

use reqwest::StatusCode;
use thiserror::Error;

use crate::management::SessionState;

/// Configuration could not be loaded or failed validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SPOTIFY_CLIENT_ID is required")]
    MissingClientId,

    #[error("SPOTIFY_REDIRECT_URI is required")]
    MissingRedirectUri,

    #[error("SPOTIFY_REDIRECT_URI must be a valid http(s) URL, got `{0}`")]
    InvalidRedirectUri(String),

    #[error("{key} is not a valid URL: {source}")]
    InvalidUrl {
        key: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("{key} has an invalid value `{value}`")]
    InvalidValue { key: &'static str, value: String },

    #[error("failed to read or write configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse .env file: {0}")]
    Dotenv(#[from] dotenv::Error),
}

/// Failure while talking to the token endpoint or the resource API.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("server responded with {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err)
        } else if err.is_decode() {
            TransportError::Decode(err.to_string())
        } else {
            TransportError::Request(err)
        }
    }
}

/// Errors raised by the PKCE engine and the authorization session.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("redirect URL could not be parsed: {0}")]
    InvalidRedirectUrl(#[from] url::ParseError),

    #[error("no authorization code found in redirect URL")]
    MissingCode,

    #[error("no state parameter found in redirect URL")]
    MissingState,

    #[error("state parameter does not match the pending authorization request")]
    StateMismatch,

    #[error("authorization error `{error}`: {description}")]
    RemoteAuth { error: String, description: String },

    #[error("authorization code exchange failed: {0}")]
    TokenExchange(#[source] TransportError),

    #[error("no refresh token available")]
    NoRefreshToken,

    #[error("cannot {operation} while the session is {state}")]
    InvalidStateTransition {
        operation: &'static str,
        state: SessionState,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Errors raised by the typed resource client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("failed to decode response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid {model}: {reason}")]
    Invalid { model: &'static str, reason: String },

    #[error("no audio features found for track {0}")]
    NoAudioFeatures(String),
}
