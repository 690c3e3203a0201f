use std::{io::Write, time::Duration};

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
    Res, info,
    management::ApiClientHandle,
    server::{SharedSession, start_callback_server},
    utils, warning,
};

/// How long `--listen` waits for Spotify to redirect back.
pub const DEFAULT_CALLBACK_WAIT: Duration = Duration::from_secs(120);

/// How [`authorize`] obtains the redirect.
#[derive(Debug, Clone)]
pub struct AuthorizeOptions {
    /// Serve the redirect URI locally instead of asking for the pasted URL.
    pub listen: bool,
    /// Try to open the authorization URL in the default browser.
    pub open_browser: bool,
    /// Upper bound for waiting on the callback when listening.
    pub wait: Duration,
}

impl Default for AuthorizeOptions {
    fn default() -> Self {
        Self {
            listen: false,
            open_browser: true,
            wait: DEFAULT_CALLBACK_WAIT,
        }
    }
}

/// Runs a complete authorization flow on `session`.
///
/// 1. **Start**: generates the PKCE parameters and the CSRF state and builds
///    the authorization URL
/// 2. **Browser**: opens the URL, or prints it if no browser can be launched
/// 3. **Redirect**: either reads the URL the browser landed on from stdin or,
///    with `listen`, serves the redirect URI on loopback until Spotify calls
///    back or `wait` elapses
/// 4. **Exchange**: trades the authorization code and verifier for tokens
///
/// # Errors
///
/// Any [`AuthError`](crate::error::AuthError) from the session, a redirect URI
/// that cannot be served locally, I/O errors while reading stdin or binding
/// the callback port, and a timeout while listening.
pub async fn authorize(session: SharedSession, options: &AuthorizeOptions) -> Res<ApiClientHandle> {
    let (auth_url, callback_addr) = {
        let mut session = session.lock().await;
        let url = session.start_auth_flow()?;
        (url, session.config().callback_addr())
    };

    if !options.listen {
        present_url(auth_url.as_str(), options.open_browser);

        let redirect_url = prompt("Paste the URL you were redirected to: ").await?;
        if redirect_url.is_empty() {
            return Err("No redirect URL provided".into());
        }

        let pb = utils::spinner("Exchanging authorization code...");
        let result = session.lock().await.complete_auth_flow(&redirect_url).await;
        pb.finish_and_clear();

        return Ok(result?);
    }

    let addr = callback_addr.ok_or(
        "--listen needs a redirect URI of the form http://localhost:<port>/<path> or http://127.0.0.1:<port>/<path>",
    )?;

    let mut server = start_callback_server(addr, session).await?;
    tracing::debug!(addr = %server.local_addr(), "waiting for authorization callback");

    present_url(auth_url.as_str(), options.open_browser);

    let pb = utils::spinner("Waiting for Spotify to redirect back...");
    let outcome = server.wait(options.wait).await;
    pb.finish_and_clear();
    server.shutdown().await;

    match outcome {
        Some(result) => Ok(result?),
        None => Err(format!(
            "Timed out after {}s waiting for the authorization callback",
            options.wait.as_secs()
        )
        .into()),
    }
}

fn present_url(url: &str, open_browser: bool) {
    if open_browser && webbrowser::open(url).is_ok() {
        info!("Opened the authorization page in your browser.");
        info!("If nothing happened, open this URL manually:\n{}", url);
        return;
    }

    if open_browser {
        warning!("Failed to open browser. Please navigate to the following URL manually:");
    } else {
        info!("Open the following URL in your browser:");
    }
    println!("{}", url);
}

async fn prompt(message: &str) -> Res<String> {
    print!("{}", message);
    std::io::stdout().flush()?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;

    Ok(line.trim().to_string())
}
