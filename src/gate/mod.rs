//! The redirect gate: request metadata extraction, the ordered decision
//! checks, response emission, and the per-request lifecycle guard.
//!
//! [`enforce`] is the middleware entry point the hosting framework runs
//! before business-logic handlers. It builds a [`RequestContext`],
//! snapshots the current policy, and runs the lifecycle-guarded engine.
//! The first matching check short-circuits the request with a redirect
//! response; otherwise the request proceeds to the inner service.
//! Submodules hold the pieces: metadata extraction ([`context`]), the
//! compiled policy ([`policy`]), the decision checks ([`engine`]),
//! response construction ([`emitter`]), and the at-most-once guard
//! ([`lifecycle`]).

pub mod context;
pub mod emitter;
pub mod engine;
pub mod lifecycle;
pub mod policy;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::server::AppState;

use context::RequestContext;
use lifecycle::{Lifecycle, Verdict};

pub async fn enforce(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    // The guard rides in request extensions: a second gate layer on the
    // same request sees the claimed flag and becomes a no-op.
    let guard = match req.extensions().get::<Arc<Lifecycle>>() {
        Some(existing) => Arc::clone(existing),
        None => {
            let fresh = Arc::new(Lifecycle::new());
            req.extensions_mut().insert(Arc::clone(&fresh));
            fresh
        }
    };

    let correlation_id = req
        .headers()
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), String::from);

    // Clone the Arc<RedirectPolicy> (cheap refcount bump) to release the
    // RwLock before .await
    let policy = {
        let loaded = state.policy.read().await;
        Arc::clone(&loaded.policy)
    };

    let ctx = RequestContext::from_request(&req);

    match guard.init(&policy, &ctx) {
        Ok(Verdict::Redirect(decision)) => {
            state.stats.record(decision.cause);
            tracing::info!(
                correlation_id = %correlation_id,
                host = ctx.host().unwrap_or("-"),
                target_url = %decision.target,
                permanent = decision.permanent,
                cause = decision.cause.as_str(),
                "redirecting"
            );
            emitter::emit(&decision)
        }
        Ok(Verdict::Proceed) => {
            state.stats.passed.fetch_add(1, Ordering::Relaxed);
            next.run(req).await
        }
        Ok(Verdict::AlreadyRan) => next.run(req).await,
        Err(e) => {
            state.stats.failed.fetch_add(1, Ordering::Relaxed);
            tracing::error!(
                correlation_id = %correlation_id,
                host = ctx.host().unwrap_or("-"),
                error = %e,
                "redirect gate failed"
            );
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
