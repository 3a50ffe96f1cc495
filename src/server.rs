//! Axum server setup, shared application state, and graceful shutdown.
//!
//! Contains [`AppState`] (the `Arc`-shared state holding the loaded
//! policy, stats, and uptime), [`build_router`] for constructing the
//! Axum router with the gate layer, and [`shutdown_signal`] for
//! SIGTERM / Ctrl+C handling.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::config::ConfigVersion;
use crate::gate;
use crate::gate::engine::Cause;
use crate::gate::policy::RedirectPolicy;
use crate::health::health_handler;

#[derive(Debug)]
pub struct LoadedPolicy {
    pub policy: Arc<RedirectPolicy>,
    pub version: ConfigVersion,
    pub source_name: String,
    pub loaded_at: Instant,
}

#[derive(Debug)]
pub struct Stats {
    pub bounced: AtomicU64,
    pub canonicalized: AtomicU64,
    pub upgraded: AtomicU64,
    pub passed: AtomicU64,
    pub failed: AtomicU64,
    pub policy_reloads: AtomicU64,
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bounced: AtomicU64::new(0),
            canonicalized: AtomicU64::new(0),
            upgraded: AtomicU64::new(0),
            passed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            policy_reloads: AtomicU64::new(0),
        }
    }

    pub fn record(&self, cause: Cause) {
        let counter = match cause {
            Cause::CdnBounce => &self.bounced,
            Cause::HostCanonicalization => &self.canonicalized,
            Cause::HttpsUpgrade => &self.upgraded,
        };
        counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    }
}

pub struct AppState {
    pub policy: RwLock<LoadedPolicy>,
    pub start_time: Instant,
    pub policy_key: String,
    pub stats: Stats,
}

pub fn build_router(state: Arc<AppState>, max_body: usize) -> Router {
    // Routes registered after the gate layer bypass it: the health probe
    // must stay reachable from the load balancer over plain HTTP.
    Router::new()
        .fallback(pass_handler)
        .layer(axum::middleware::from_fn_with_state(
            Arc::clone(&state),
            gate::enforce,
        ))
        .route("/health", get(health_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(max_body)),
        )
        .with_state(state)
}

/// Fallback for requests the gate lets through. A standalone bounce
/// server serves no content of its own.
async fn pass_handler() -> StatusCode {
    StatusCode::NOT_FOUND
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
