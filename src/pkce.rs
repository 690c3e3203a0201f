//! PKCE (Proof Key for Code Exchange) engine.
//!
//! Pure functions for the OAuth 2.0 authorization code flow with PKCE
//! (RFC 7636): verifier/challenge generation, CSRF state generation,
//! authorization URL construction and redirect parsing. Nothing in here
//! performs I/O.

use std::collections::HashMap;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use sha2::{Digest, Sha256};
use url::Url;

use crate::{config::normalize_scope, error::AuthError};

pub const CODE_CHALLENGE_METHOD: &str = "S256";

pub const MIN_VERIFIER_LEN: usize = 43;
pub const MAX_VERIFIER_LEN: usize = 128;

/// 96 random bytes encode to exactly 128 base64url characters.
const VERIFIER_BYTES: usize = 96;
const STATE_BYTES: usize = 32;

/// A code verifier and the S256 challenge derived from it.
///
/// Created fresh for every authorization attempt. Only the challenge is ever
/// sent to the authorization server; the verifier goes to the token endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct PkceParams {
    verifier: String,
    challenge: String,
}

impl PkceParams {
    /// Generates a new verifier from the thread-local CSPRNG and derives its
    /// challenge.
    pub fn generate() -> Self {
        let verifier = random_urlsafe(VERIFIER_BYTES);
        let challenge = code_challenge(&verifier);
        Self {
            verifier,
            challenge,
        }
    }

    /// Rebuilds the params from a known verifier.
    ///
    /// Returns `None` if the verifier is not 43–128 characters from the
    /// unreserved set `[A-Za-z0-9-._~]`.
    pub fn from_verifier(verifier: impl Into<String>) -> Option<Self> {
        let verifier = verifier.into();
        if !is_valid_verifier(&verifier) {
            return None;
        }
        let challenge = code_challenge(&verifier);
        Some(Self {
            verifier,
            challenge,
        })
    }

    pub fn verifier(&self) -> &str {
        &self.verifier
    }

    pub fn challenge(&self) -> &str {
        &self.challenge
    }
}

impl std::fmt::Debug for PkceParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkceParams")
            .field("verifier", &"<redacted>")
            .field("challenge", &self.challenge)
            .finish()
    }
}

/// Computes `base64url_nopad(SHA256(verifier))`.
pub fn code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

pub fn is_valid_verifier(verifier: &str) -> bool {
    (MIN_VERIFIER_LEN..=MAX_VERIFIER_LEN).contains(&verifier.len())
        && verifier
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~'))
}

/// Generates an opaque CSRF state token (43 url-safe characters).
pub fn generate_state() -> String {
    random_urlsafe(STATE_BYTES)
}

fn random_urlsafe(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Builds the URL the end user has to visit to grant access.
///
/// Query parameters are appended in a fixed order: `response_type`,
/// `client_id`, `scope`, `redirect_uri`, `state`, `code_challenge_method`,
/// `code_challenge`. Parameters already present on `endpoint` are kept.
pub fn build_authorization_url(
    endpoint: &Url,
    client_id: &str,
    redirect_uri: &str,
    scope: &str,
    challenge: &str,
    state: &str,
) -> Url {
    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", client_id)
        .append_pair("scope", &normalize_scope(scope))
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("state", state)
        .append_pair("code_challenge_method", CODE_CHALLENGE_METHOD)
        .append_pair("code_challenge", challenge);
    url
}

/// The parameters carried back by a successful authorization redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationResponse {
    pub code: String,
    pub state: String,
}

/// Parses the redirect URL the authorization server sent the user back to.
///
/// An `error` parameter takes precedence over everything else, since the
/// server omits `code` when the user denied access. Empty values count as
/// missing.
///
/// # Errors
///
/// - [`AuthError::InvalidRedirectUrl`] if `redirect_url` is not a URL
/// - [`AuthError::RemoteAuth`] if the server reported an error
/// - [`AuthError::MissingCode`] if there is no `code`
/// - [`AuthError::MissingState`] if there is no `state`
pub fn parse_redirect(redirect_url: &str) -> Result<AuthorizationResponse, AuthError> {
    let url = Url::parse(redirect_url.trim())?;
    let mut params: HashMap<String, String> = url
        .query_pairs()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if let Some(error) = params.remove("error") {
        let description = params
            .remove("error_description")
            .unwrap_or_else(|| error.clone());
        return Err(AuthError::RemoteAuth { error, description });
    }

    let code = params.remove("code").ok_or(AuthError::MissingCode)?;
    let state = params.remove("state").ok_or(AuthError::MissingState)?;

    Ok(AuthorizationResponse { code, state })
}

/// Compares two state tokens without short-circuiting on the first
/// differing byte.
pub fn states_match(received: &str, expected: &str) -> bool {
    let (a, b) = (received.as_bytes(), expected.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
