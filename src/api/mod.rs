//! # API Module
//!
//! HTTP endpoints served by the local callback server while an
//! authorization flow is waiting for its redirect.
//!
//! ## Endpoints
//!
//! - [`callback`] - Receives Spotify's redirect, validates it against the
//!   pending flow of the shared [`AuthSession`](crate::management::AuthSession)
//!   and exchanges the authorization code for tokens.
//! - [`health`] - Returns application status and version.
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use axum::{Extension, Router, routing::get};
//! use spotexp::api::{callback, health};
//!
//! let app = Router::new()
//!     .route("/callback", get(callback).layer(Extension(state)))
//!     .route("/health", get(health));
//! ```
//!
//! See [`crate::server::start_callback_server`] for the wiring used by the CLI.

mod callback;
mod health;

pub use callback::callback;
pub use health::health;
