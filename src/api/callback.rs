use axum::{Extension, extract::RawQuery, response::Html};
use url::Url;

use crate::{error::AuthError, server::CallbackState};

const SUCCESS_PAGE: &str =
    "<h2>Authentication successful.</h2><p>You can close this browser window.</p>";
const FAILURE_PAGE: &str = "<h4>Login failed.</h4><p>Check the terminal for details.</p>";
const NOT_PENDING_PAGE: &str = "<h4>No authorization in progress.</h4>";

/// Receives the authorization server's redirect and completes the flow.
///
/// The full redirect URL is rebuilt from the configured redirect URI and the
/// raw query string, so state validation happens exactly as for a pasted URL.
pub async fn callback(
    RawQuery(query): RawQuery,
    Extension(state): Extension<CallbackState>,
) -> Html<&'static str> {
    let redirect_url = match Url::parse(&state.redirect_uri) {
        Ok(mut url) => {
            url.set_query(query.as_deref());
            url.to_string()
        }
        Err(_) => format!("{}?{}", state.redirect_uri, query.unwrap_or_default()),
    };

    let result = state
        .session
        .lock()
        .await
        .complete_auth_flow(&redirect_url)
        .await;

    let page = match &result {
        Ok(_) => SUCCESS_PAGE,
        // Repeated hits (reloads, prefetches) must not clobber the outcome.
        Err(AuthError::InvalidStateTransition { .. }) => return Html(NOT_PENDING_PAGE),
        Err(e) => {
            tracing::warn!(error = %e, "authorization callback failed");
            FAILURE_PAGE
        }
    };

    if state.outcomes.try_send(result).is_err() {
        tracing::debug!("authorization outcome already delivered");
    }

    Html(page)
}
