use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{Extension, Router, routing::get};
use tokio::{
    sync::{Mutex, mpsc, oneshot},
    task::JoinHandle,
};

use crate::{
    api,
    error::AuthError,
    management::{ApiClientHandle, AuthSession},
};

pub type SharedSession = Arc<Mutex<AuthSession>>;
pub type CallbackOutcome = Result<ApiClientHandle, AuthError>;

/// State handed to the callback handler.
#[derive(Clone)]
pub struct CallbackState {
    pub session: SharedSession,
    pub redirect_uri: String,
    pub outcomes: mpsc::Sender<CallbackOutcome>,
}

/// A running local server that completes the flow of a shared session.
pub struct CallbackServer {
    local_addr: SocketAddr,
    outcomes: mpsc::Receiver<CallbackOutcome>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

/// Binds `addr` and serves `GET /health` and `GET <redirect path>`.
///
/// The redirect route completes the pending flow of `session` and forwards
/// the outcome to [`CallbackServer::wait`].
pub async fn start_callback_server(
    addr: SocketAddr,
    session: SharedSession,
) -> std::io::Result<CallbackServer> {
    let (redirect_uri, path) = {
        let session = session.lock().await;
        let config = session.config();
        (config.redirect_uri.clone(), config.callback_path())
    };

    let (tx, rx) = mpsc::channel(1);
    let state = CallbackState {
        session,
        redirect_uri,
        outcomes: tx,
    };

    let mut app = Router::new().route(&path, get(api::callback).layer(Extension(state)));
    if path != "/health" {
        app = app.route("/health", get(api::health));
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    tracing::debug!(%local_addr, %path, "callback server listening");

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        let shutdown = async {
            let _ = shutdown_rx.await;
        };
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
        {
            tracing::warn!(error = %e, "callback server stopped with an error");
        }
    });

    Ok(CallbackServer {
        local_addr,
        outcomes: rx,
        shutdown: Some(shutdown_tx),
        task,
    })
}

impl CallbackServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Waits for the first completed callback, or `None` after `max_wait`.
    pub async fn wait(&mut self, max_wait: Duration) -> Option<CallbackOutcome> {
        tokio::time::timeout(max_wait, self.outcomes.recv())
            .await
            .ok()
            .flatten()
    }

    /// Stops accepting connections and waits for the server task to end.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "callback server task failed");
        }
    }
}
