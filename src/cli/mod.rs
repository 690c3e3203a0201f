//! Command implementations behind the `spotexp` binary.
//!
//! Each command reports progress with the colored output macros and
//! terminates through [`error!`](crate::error!) on unrecoverable failures.

mod auth;
mod search;
mod setup;
mod top;

use clap::Args;

use crate::spotify::auth::{AuthorizeOptions, DEFAULT_CALLBACK_WAIT};

pub use auth::auth;
pub use search::search;
pub use setup::setup;
pub use top::{TopKind, top};

/// Flags shared by every command that needs an authorized session.
#[derive(Args, Debug, Clone, Default)]
pub struct AuthArgs {
    /// Serve the redirect URI locally instead of pasting the redirect URL
    #[clap(long)]
    pub listen: bool,

    /// Print the authorization URL instead of opening a browser
    #[clap(long)]
    pub no_browser: bool,
}

impl AuthArgs {
    pub fn options(&self) -> AuthorizeOptions {
        AuthorizeOptions {
            listen: self.listen,
            open_browser: !self.no_browser,
            wait: DEFAULT_CALLBACK_WAIT,
        }
    }
}
