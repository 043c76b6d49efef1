//! HTTP server implementation.

use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing::{error, info, warn};

use super::{router, AppState};
use crate::config::ServiceConfig;
use crate::error::Result;
use crate::ratelimit::RateLimiter;

/// HTTP server fronting a shared [`RateLimiter`].
pub struct HttpServer {
    /// Address to bind to
    addr: SocketAddr,
    /// Upper bound on draining in-flight requests after shutdown is signalled
    shutdown_grace: Duration,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server.
    pub fn new(config: &ServiceConfig, rate_limiter: Arc<RateLimiter>) -> Self {
        Self {
            addr: config.server.bind_addr,
            shutdown_grace: config.server.shutdown_grace(),
            state: AppState::new(rate_limiter, config.rate_limiting.enabled),
        }
    }

    /// The application router, without a listener attached.
    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    /// Bind the configured address and serve until `signal` resolves.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.addr).await.map_err(|e| {
            error!(addr = %self.addr, error = %e, "Failed to bind HTTP listener");
            e
        })?;
        self.serve_on(listener, signal).await
    }

    /// Serve on an already bound listener until `signal` resolves.
    ///
    /// After the signal, in-flight requests get `shutdown_grace` to finish
    /// before the server stops waiting for them.
    pub async fn serve_on<F>(self, listener: TcpListener, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        let app = self.router();
        let grace = self.shutdown_grace;

        info!(addr = %addr, "Starting HTTP server with graceful shutdown");

        let signalled = Arc::new(Notify::new());
        let notify = Arc::clone(&signalled);
        let serve = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            signal.await;
            notify.notify_one();
        });
        let serve = async move { serve.await };

        tokio::select! {
            result = serve => {
                result.map_err(|e| {
                    error!(error = %e, "HTTP server failed");
                    e
                })?;
            }
            _ = async {
                signalled.notified().await;
                tokio::time::sleep(grace).await;
            } => {
                warn!(
                    grace = ?grace,
                    "Shutdown grace period elapsed, no longer waiting for open connections"
                );
            }
        }

        info!(addr = %addr, "HTTP server stopped");
        Ok(())
    }
}
