use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    cli::AuthArgs,
    config::Config,
    error,
    info,
    management::{ApiClientHandle, AuthSession},
    spotify::{HttpFetcher, SpotifyClient, auth::authorize},
    success, warning,
};

pub async fn auth(args: &AuthArgs) {
    let (client, handle) = login(args).await;

    match client.current_user().await {
        Ok(me) => {
            success!(
                "Authenticated as {}",
                me.display_name.as_deref().unwrap_or(&me.id)
            );
            if let Some(email) = me.email {
                info!("Email: {}", email);
            }
        }
        Err(e) => warning!(
            "Authenticated, but the user profile could not be loaded. Err: {}",
            e
        ),
    }

    info!("Granted scopes: {}", handle.scope());
    info!(
        "Access token valid until {}",
        handle.expires_at().format("%Y-%m-%d %H:%M:%S UTC")
    );
}

/// Loads the configuration and runs an interactive authorization flow.
///
/// Exits the process with a message if any step fails.
pub(crate) async fn login(args: &AuthArgs) -> (SpotifyClient<HttpFetcher>, ApiClientHandle) {
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => error!(
            "Invalid configuration. Err: {}\nRun `spotexp setup` to create a .env template.",
            e
        ),
    };

    let session = match AuthSession::new(config.clone()) {
        Ok(s) => Arc::new(Mutex::new(s)),
        Err(e) => error!("Cannot create authorization session. Err: {}", e),
    };

    let handle = match authorize(Arc::clone(&session), &args.options()).await {
        Ok(h) => h,
        Err(e) => error!("Authentication failed. Err: {}", e),
    };

    let client = match handle.client(&config) {
        Ok(c) => c,
        Err(e) => error!("Cannot create Spotify client. Err: {}", e),
    };

    (client, handle)
}
