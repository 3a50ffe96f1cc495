//! `GET /health` endpoint handler.
//!
//! Returns a [`HealthResponse`] JSON payload containing the server
//! version, uptime, policy source metadata, and cumulative redirect
//! statistics.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::server::AppState;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub policy: PolicyHealth,
    pub stats: StatsResponse,
}

#[derive(Serialize, Deserialize)]
pub struct PolicyHealth {
    pub source: String,
    pub version: String,
    pub loaded_ago_seconds: u64,
    pub key: String,
    pub allowed_hosts: usize,
    pub require_https: bool,
}

#[derive(Serialize, Deserialize)]
pub struct StatsResponse {
    pub requests_bounced: u64,
    pub requests_canonicalized: u64,
    pub requests_upgraded: u64,
    pub requests_passed: u64,
    pub requests_failed: u64,
    pub policy_reloads: u64,
}

pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    // Clone Arc<RedirectPolicy> (cheap refcount bump) to release the lock quickly
    let (policy, source_name, version_str, loaded_ago) = {
        let loaded = state.policy.read().await;
        let policy = Arc::clone(&loaded.policy);
        let version_str = match &loaded.version {
            crate::config::ConfigVersion::Hash(h) => h.get(..8).unwrap_or(h).to_string(),
        };
        (
            policy,
            loaded.source_name.clone(),
            version_str,
            loaded.loaded_at.elapsed().as_secs(),
        )
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        policy: PolicyHealth {
            source: source_name,
            version: version_str,
            loaded_ago_seconds: loaded_ago,
            key: state.policy_key.clone(),
            allowed_hosts: policy.allowed_hosts.len(),
            require_https: policy.require_https,
        },
        stats: StatsResponse {
            requests_bounced: state.stats.bounced.load(Ordering::Relaxed),
            requests_canonicalized: state.stats.canonicalized.load(Ordering::Relaxed),
            requests_upgraded: state.stats.upgraded.load(Ordering::Relaxed),
            requests_passed: state.stats.passed.load(Ordering::Relaxed),
            requests_failed: state.stats.failed.load(Ordering::Relaxed),
            policy_reloads: state.stats.policy_reloads.load(Ordering::Relaxed),
        },
    })
}
