//! `hostgate run` — start the standalone bounce server.
//!
//! Loads the config store from a file source, compiles the redirect
//! policy under the configured key, starts the Axum HTTP server with
//! graceful shutdown, and spawns a background refresh loop that
//! hot-reloads the policy when the config file changes.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cli::RunArgs;
use crate::config::sources;
use crate::config::{ConfigResolver, ConfigSource};
use crate::error::HostgateError;
use crate::gate::policy::RedirectPolicy;
use crate::logging;
use crate::server::{self, AppState, LoadedPolicy, Stats};

pub async fn execute(args: RunArgs) -> Result<(), HostgateError> {
    let log_format = logging::resolve_format(args.pretty, args.json);
    logging::init(&args.log_level, log_format);

    #[cfg(feature = "sentry-integration")]
    let _sentry_guard = args
        .sentry_dsn
        .as_ref()
        .map(|dsn| crate::sentry_integration::init(dsn, args.sentry_environment.as_deref()));

    let resolver = resolve_config_sources(&args)?;
    let (store, version) = resolver.load_with_fallback().await?;

    // The policy must exist before any request is served; a missing key
    // must never degrade into gate-less serving.
    let policy = RedirectPolicy::from_config(store.policy(&args.policy_key)?);
    let allowed_hosts = policy.allowed_hosts.len();

    let loaded_policy = tokio::sync::RwLock::new(LoadedPolicy {
        policy: Arc::new(policy),
        version,
        source_name: resolver.primary_name().to_string(),
        loaded_at: Instant::now(),
    });

    let state = Arc::new(AppState {
        policy: loaded_policy,
        start_time: Instant::now(),
        policy_key: args.policy_key.clone(),
        stats: Stats::new(),
    });

    // Shutdown signal: dropping shutdown_tx closes the channel and stops the refresh loop
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    // Spawn policy refresh loop with cancellation
    let refresh_state = Arc::clone(&state);
    let policy_key = args.policy_key.clone();
    let poll_interval = args.poll_interval;
    let refresh_handle = tokio::spawn(async move {
        policy_refresh_loop(refresh_state, resolver, policy_key, poll_interval, shutdown_rx).await;
    });

    let router = server::build_router(Arc::clone(&state), args.max_body);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;

    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %addr,
        policy_key = %args.policy_key,
        allowed_hosts,
        "hostgate started"
    );

    // Wrap the shutdown signal to also stop the refresh loop immediately
    let graceful_shutdown = async move {
        server::shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    };

    axum::serve(listener, router)
        .with_graceful_shutdown(graceful_shutdown)
        .await?;

    // Wait for the refresh task to finish (catches panics)
    if let Err(e) = refresh_handle.await {
        tracing::error!(error = %e, "policy refresh task failed");
    }

    tracing::info!("hostgate stopped");
    Ok(())
}

fn resolve_config_sources(args: &RunArgs) -> Result<ConfigResolver, HostgateError> {
    let file_source = resolve_file_source(args.config.as_deref())?;

    file_source.map_or_else(
        || {
            Err(HostgateError::NoConfigSource {
                hint: "Provide --config <file> or place a hostgate.yaml in the working directory.\n  \
                       Run 'hostgate init' to create a config file."
                    .into(),
            })
        },
        |source| Ok(ConfigResolver::new(source, None)),
    )
}

fn resolve_file_source(
    explicit: Option<&std::path::Path>,
) -> Result<Option<Box<dyn ConfigSource>>, HostgateError> {
    if let Some(path) = explicit {
        return create_file_source(path).map(Some);
    }

    // Auto-detect in current directory
    let candidates = [
        "hostgate.yaml",
        "hostgate.yml",
        "hostgate.json",
        "hostgate.toml",
    ];

    for name in &candidates {
        let path = PathBuf::from(name);
        if path.exists() {
            tracing::info!(path = %path.display(), "auto-detected config file");
            return create_file_source(&path).map(Some);
        }
    }

    Ok(None)
}

fn create_file_source(path: &std::path::Path) -> Result<Box<dyn ConfigSource>, HostgateError> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    match ext {
        #[cfg(feature = "yaml")]
        "yaml" | "yml" => Ok(Box::new(sources::yaml::new(path.to_path_buf()))),

        #[cfg(feature = "json")]
        "json" => Ok(Box::new(sources::json::new(path.to_path_buf()))),

        #[cfg(feature = "toml")]
        "toml" => Ok(Box::new(sources::toml_source::new(path.to_path_buf()))),

        other => Err(HostgateError::UnsupportedFormat(other.to_string())),
    }
}

async fn policy_refresh_loop(
    state: Arc<AppState>,
    resolver: ConfigResolver,
    policy_key: String,
    interval_secs: u64,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    interval.tick().await; // Skip first immediate tick

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = shutdown.changed() => {
                tracing::debug!("policy refresh loop shutting down");
                return;
            }
        }

        let current_version = {
            let loaded = state.policy.read().await;
            loaded.version.clone()
        };

        match resolver.primary().has_changed(&current_version).await {
            Ok(true) => {
                tracing::info!("config change detected, reloading");
                match reload_policy(&resolver, &policy_key).await {
                    Ok((policy, version)) => {
                        let allowed_hosts = policy.allowed_hosts.len();
                        let mut loaded = state.policy.write().await;
                        loaded.policy = Arc::new(policy);
                        loaded.version = version;
                        loaded.loaded_at = Instant::now();
                        drop(loaded);
                        state
                            .stats
                            .policy_reloads
                            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                        tracing::info!(allowed_hosts, "policy reloaded");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "policy reload failed, keeping current policy");
                    }
                }
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(error = %e, "config change check failed");
            }
        }
    }
}

async fn reload_policy(
    resolver: &ConfigResolver,
    policy_key: &str,
) -> Result<(RedirectPolicy, crate::config::ConfigVersion), HostgateError> {
    let (store, version) = resolver.load_with_fallback().await?;
    let policy = RedirectPolicy::from_config(store.policy(policy_key)?);
    Ok((policy, version))
}
