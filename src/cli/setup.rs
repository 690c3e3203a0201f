use std::path::Path;

use crate::{config, error, info, success, warning};

pub async fn setup(force: bool) {
    let path = Path::new(".env");

    match config::write_env_template(path, force).await {
        Ok(true) => {
            success!("Created {}", path.display());
            info!("Edit it and set SPOTIFY_CLIENT_ID and SPOTIFY_REDIRECT_URI.");
            info!("Register the redirect URI at https://developer.spotify.com/dashboard");
        }
        Ok(false) => warning!(
            "{} already exists, use --force to overwrite it",
            path.display()
        ),
        Err(e) => error!("Cannot write {}. Err: {}", path.display(), e),
    }
}
