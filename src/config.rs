//! Configuration management for spotexp.
//!
//! This module loads the Spotify application settings from environment
//! variables and `.env` files and validates them once, at construction time,
//! into a [`Config`] value that is passed explicitly to the session and the
//! resource client.
//!
//! The lookup follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. `.env` file in the current working directory
//! 4. Application defaults (where applicable)

use std::{
    env,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
    time::Duration,
};

use url::Url;

use crate::error::ConfigError;

pub const ENV_CLIENT_ID: &str = "SPOTIFY_CLIENT_ID";
pub const ENV_REDIRECT_URI: &str = "SPOTIFY_REDIRECT_URI";
pub const ENV_SCOPE: &str = "SPOTIFY_SCOPE";
pub const ENV_AUTH_URL: &str = "SPOTIFY_AUTH_URL";
pub const ENV_TOKEN_URL: &str = "SPOTIFY_TOKEN_URL";
pub const ENV_API_URL: &str = "SPOTIFY_API_URL";
pub const ENV_HTTP_TIMEOUT: &str = "SPOTIFY_HTTP_TIMEOUT_SECS";

pub const DEFAULT_SCOPE: &str = "user-read-private user-read-email";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const ENV_TEMPLATE: &str = include_str!("../.env.example");

/// Validated application settings.
///
/// Every constructor runs the same validation pass and fails fast with the
/// first [`ConfigError`] it encounters, so a `Config` value is always usable
/// to start an authorization flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: String,
    pub auth_url: Url,
    pub token_url: Url,
    pub api_url: String,
    pub timeout: Duration,
}

impl Config {
    /// Builds a configuration with the default Spotify endpoints.
    ///
    /// An empty `scope` falls back to [`DEFAULT_SCOPE`].
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingClientId`] if `client_id` is blank
    /// - [`ConfigError::MissingRedirectUri`] if `redirect_uri` is blank
    /// - [`ConfigError::InvalidRedirectUri`] if `redirect_uri` is not an
    ///   absolute `http://` or `https://` URL
    pub fn new(
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
        scope: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let client_id = client_id.into().trim().to_string();
        if client_id.is_empty() {
            return Err(ConfigError::MissingClientId);
        }

        let redirect_uri = redirect_uri.into().trim().to_string();
        validate_redirect_uri(&redirect_uri)?;

        let scope = normalize_scope(&scope.into());
        let scope = if scope.is_empty() {
            DEFAULT_SCOPE.to_string()
        } else {
            scope
        };

        Ok(Self {
            client_id,
            redirect_uri,
            scope,
            auth_url: parse_url(ENV_AUTH_URL, DEFAULT_AUTH_URL)?,
            token_url: parse_url(ENV_TOKEN_URL, DEFAULT_TOKEN_URL)?,
            api_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_HTTP_TIMEOUT,
        })
    }

    /// Loads the configuration from the process environment.
    ///
    /// Call [`load_env`] first to pull values from `.env` files.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads the configuration through an arbitrary key lookup.
    ///
    /// Blank values are treated as absent.
    ///
    /// # Example
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use spotexp::config::Config;
    ///
    /// let vars = HashMap::from([
    ///     ("SPOTIFY_CLIENT_ID", "abc"),
    ///     ("SPOTIFY_REDIRECT_URI", "http://localhost:8080/callback"),
    /// ]);
    /// let config = Config::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
    /// assert_eq!(config.scope, "user-read-private user-read-email");
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let client_id = get(ENV_CLIENT_ID).ok_or(ConfigError::MissingClientId)?;
        let redirect_uri = get(ENV_REDIRECT_URI).ok_or(ConfigError::MissingRedirectUri)?;
        let scope = get(ENV_SCOPE).unwrap_or_else(|| DEFAULT_SCOPE.to_string());

        let mut config = Self::new(client_id, redirect_uri, scope)?;

        if let Some(value) = get(ENV_AUTH_URL) {
            config.auth_url = parse_url(ENV_AUTH_URL, &value)?;
        }
        if let Some(value) = get(ENV_TOKEN_URL) {
            config.token_url = parse_url(ENV_TOKEN_URL, &value)?;
        }
        if let Some(value) = get(ENV_API_URL) {
            parse_url(ENV_API_URL, &value)?;
            config.api_url = value.trim_end_matches('/').to_string();
        }
        if let Some(value) = get(ENV_HTTP_TIMEOUT) {
            config.timeout = parse_timeout(&value)?;
        }

        Ok(config)
    }

    pub fn with_auth_url(mut self, url: Url) -> Self {
        self.auth_url = url;
        self
    }

    pub fn with_token_url(mut self, url: Url) -> Self {
        self.token_url = url;
        self
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the individual scopes requested by this configuration.
    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.scope.split_whitespace()
    }

    /// Returns the local address a callback server must bind to receive the
    /// redirect, if the redirect URI points at this machine.
    ///
    /// Only plain `http://` URIs with an explicit port qualify. Loopback
    /// hosts (`localhost`, `127.0.0.1`, `[::1]`) bind the loopback address;
    /// any other host yields `None` since the redirect would not reach us.
    pub fn callback_addr(&self) -> Option<SocketAddr> {
        let url = Url::parse(&self.redirect_uri).ok()?;
        if url.scheme() != "http" {
            return None;
        }
        let port = url.port()?;

        let ip = match url.host()? {
            url::Host::Domain("localhost") => IpAddr::V4(Ipv4Addr::LOCALHOST),
            url::Host::Domain(_) => return None,
            url::Host::Ipv4(ip) => IpAddr::V4(ip),
            url::Host::Ipv6(ip) => IpAddr::V6(ip),
        };

        ip.is_loopback().then(|| SocketAddr::new(ip, port))
    }

    /// Returns the path component of the redirect URI (e.g. `/callback`).
    pub fn callback_path(&self) -> String {
        Url::parse(&self.redirect_uri)
            .map(|url| url.path().to_string())
            .unwrap_or_else(|_| "/".to_string())
    }
}

/// Loads environment variables from `.env` files.
///
/// Reads `<data_local_dir>/spotexp/.env` first, then `./.env`. Variables that
/// are already set in the process environment are never overwritten, and a
/// missing file is not an error.
///
/// # Directory Structure
///
/// - Linux: `~/.local/share/spotexp/.env`
/// - macOS: `~/Library/Application Support/spotexp/.env`
/// - Windows: `%LOCALAPPDATA%/spotexp/.env`
///
/// # Errors
///
/// Returns [`ConfigError::Dotenv`] if an existing file cannot be parsed.
pub fn load_env() -> Result<(), ConfigError> {
    for path in [data_env_path(), PathBuf::from(".env")] {
        if path.is_file() {
            dotenv::from_path(&path)?;
            tracing::debug!(path = %path.display(), "loaded environment file");
        }
    }
    Ok(())
}

/// Returns the `.env` location inside the platform data directory.
pub fn data_env_path() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("spotexp/.env");
    path
}

/// Returns the `.env` template written by `spotexp setup`.
pub fn env_template() -> &'static str {
    ENV_TEMPLATE
}

/// Writes the `.env` template to `path`.
///
/// Returns `Ok(false)` without touching the file when it already exists and
/// `force` is not set, `Ok(true)` after writing it.
pub async fn write_env_template(path: &Path, force: bool) -> Result<bool, ConfigError> {
    if path.exists() && !force {
        return Ok(false);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        async_fs::create_dir_all(parent).await?;
    }
    async_fs::write(path, env_template()).await?;
    Ok(true)
}

fn validate_redirect_uri(redirect_uri: &str) -> Result<(), ConfigError> {
    if redirect_uri.is_empty() {
        return Err(ConfigError::MissingRedirectUri);
    }

    match Url::parse(redirect_uri) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(()),
        _ => Err(ConfigError::InvalidRedirectUri(redirect_uri.to_string())),
    }
}

fn parse_url(key: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value.trim()).map_err(|source| ConfigError::InvalidUrl { key, source })
}

fn parse_timeout(value: &str) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidValue {
            key: ENV_HTTP_TIMEOUT,
            value: value.to_string(),
        }),
    }
}

/// Collapses any whitespace run in a scope string into a single space.
pub fn normalize_scope(scope: &str) -> String {
    scope.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(redirect_uri: &str) -> Config {
        Config::new("abc", redirect_uri, "").unwrap()
    }

    #[test]
    fn callback_addr_for_loopback_redirects() {
        assert_eq!(
            config("http://localhost:8080/callback").callback_addr(),
            Some("127.0.0.1:8080".parse().unwrap())
        );
        assert_eq!(
            config("http://[::1]:9000/cb").callback_addr(),
            Some("[::1]:9000".parse().unwrap())
        );
    }

    #[test]
    fn callback_addr_requires_local_http_with_port() {
        assert_eq!(config("http://localhost/callback").callback_addr(), None);
        assert_eq!(config("https://localhost:8080/callback").callback_addr(), None);
        assert_eq!(config("http://example.com:8080/callback").callback_addr(), None);
    }

    #[test]
    fn callback_path_is_taken_from_redirect_uri() {
        assert_eq!(config("http://localhost:8080/callback").callback_path(), "/callback");
        assert_eq!(config("http://localhost:8080").callback_path(), "/");
    }

    #[test]
    fn template_mentions_required_keys() {
        assert!(env_template().contains(ENV_CLIENT_ID));
        assert!(env_template().contains(ENV_REDIRECT_URI));
    }
}
