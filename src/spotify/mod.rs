//! # Spotify Integration Module
//!
//! Everything that talks to Spotify over HTTP lives here: the token endpoint
//! used by the authorization flow, the interactive flow driver, and the typed
//! Web API client.
//!
//! ## Architecture
//!
//! ```text
//! CLI
//!  ↓
//! auth::authorize ──► AuthSession (management) ──► token::TokenEndpoint
//!  ↓                        │
//!  ↓                  ApiClientHandle
//!  ↓                        ↓
//! SpotifyClient<F> ──► F: ResourceFetcher ──► HttpFetcher (reqwest, bearer)
//!  ↓
//! Spotify Web API
//! ```
//!
//! ## Core Modules
//!
//! ### Token Endpoint
//!
//! [`token`] - Form-encoded calls against `/api/token`:
//! - **Code Exchange**: `authorization_code` grant carrying the PKCE verifier
//! - **Refresh**: `refresh_token` grant, keeping the previous refresh token
//!   when Spotify does not rotate it
//! - **Expiry**: converts `expires_in` into an absolute UTC instant
//!
//! ### Authorization Driver
//!
//! [`auth`] - Runs a flow end to end for the CLI, either by reading the
//! pasted redirect URL from stdin or by serving the redirect on a local
//! callback server.
//!
//! ### Typed Client
//!
//! [`SpotifyClient`] - One method per Web API operation. Responses are
//! decoded into [`crate::types`] models and validated before they are
//! returned. The client never sees a token; it only depends on a
//! [`ResourceFetcher`].
//!
//! - **User**: profile, top tracks and top artists
//! - **Catalog**: tracks, albums, artists, audio features
//! - **Search**: tracks, artists, albums and playlists
//! - **Playlists**: read, create, add and remove tracks
//! - **Recommendations**: seeded by artists, genres and tracks
//!
//! ## Usage
//!
//! ```rust,ignore
//! let handle = session.api_client_handle().await?.ok_or("not authenticated")?;
//! let client = handle.client(session.config())?;
//!
//! let me = client.current_user().await?;
//! let top = client.user_top_tracks(10, 0, TimeRange::ShortTerm).await?;
//! ```
//!
//! ## Limits
//!
//! Page sizes are clamped to the Web API maximums and bulk operations are
//! split into chunks of the documented size, so callers can pass any number
//! of IDs.

mod albums;
mod artists;
pub mod auth;
pub(crate) mod client;
mod fetch;
mod playlists;
pub mod token;
mod tracks;

pub use client::{
    MAX_PAGE_LIMIT, MAX_RECOMMENDATION_LIMIT, MAX_RECOMMENDATION_SEEDS, SpotifyClient,
};
pub use fetch::{HttpFetcher, ResourceFetcher, ResourceRequest};
pub use playlists::MAX_PLAYLIST_ITEMS;
pub use tracks::{MAX_AUDIO_FEATURE_IDS, MAX_TRACK_IDS};
