//! Integration tests for the HTTP server: redirect statuses, pass-through
//! behavior, the health endpoint, and graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use hostgate::config::ConfigVersion;
use hostgate::gate::policy::{FallbackHost, RedirectPolicy};
use hostgate::health::HealthResponse;
use hostgate::server::{self, AppState, LoadedPolicy, Stats};

fn test_policy(allowed: &[&str]) -> RedirectPolicy {
    RedirectPolicy {
        allowed_hosts: allowed.iter().map(|s| (*s).to_string()).collect(),
        fallback_host: FallbackHost::Literal("www.example.com".into()),
        require_https: true,
        cdn_markers: vec!["CloudFront".into()],
    }
}

async fn start_test_server(
    make_policy: impl FnOnce(SocketAddr) -> RedirectPolicy,
) -> (SocketAddr, tokio::sync::oneshot::Sender<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let state = Arc::new(AppState {
        policy: tokio::sync::RwLock::new(LoadedPolicy {
            policy: Arc::new(make_policy(addr)),
            version: ConfigVersion::Hash("test-hash".into()),
            source_name: "test".into(),
            loaded_at: Instant::now(),
        }),
        start_time: Instant::now(),
        policy_key: "RedirectPlugin".into(),
        stats: Stats::new(),
    });

    let router = server::build_router(state, 1_048_576);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
    });

    (addr, shutdown_tx)
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

#[tokio::test]
async fn foreign_host_gets_temporary_redirect_to_fallback() {
    // The ephemeral 127.0.0.1 host is not whitelisted.
    let (addr, shutdown) = start_test_server(|_| test_policy(&["www.example.com"])).await;

    let resp = client()
        .get(format!("http://{addr}/foo"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 302);
    assert_eq!(
        resp.headers().get("location").unwrap(),
        "https://www.example.com/foo"
    );

    let _ = shutdown.send(());
}

#[tokio::test]
async fn insecure_allowed_host_gets_permanent_upgrade() {
    let (addr, shutdown) = start_test_server(|addr| test_policy(&[&addr.to_string()])).await;

    let resp = client()
        .get(format!("http://{addr}/login?next=%2Fhome"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 301);
    assert_eq!(
        resp.headers().get("location").unwrap().to_str().unwrap(),
        format!("https://{addr}/login?next=%2Fhome")
    );

    let _ = shutdown.send(());
}

#[tokio::test]
async fn cdn_via_header_gets_bounced_to_fallback() {
    let (addr, shutdown) = start_test_server(|addr| test_policy(&[&addr.to_string()])).await;

    let resp = client()
        .get(format!("http://{addr}/asset.css"))
        .header("via", "1.1 abc.cloudfront.net (CloudFront)")
        .header("x-forwarded-proto", "https")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 301);
    assert_eq!(
        resp.headers().get("location").unwrap(),
        "https://www.example.com/asset.css"
    );

    let _ = shutdown.send(());
}

#[tokio::test]
async fn canonical_secure_request_passes_through() {
    let (addr, shutdown) = start_test_server(|addr| test_policy(&[&addr.to_string()])).await;

    let resp = client()
        .get(format!("http://{addr}/anything"))
        .header("x-forwarded-proto", "https")
        .send()
        .await
        .unwrap();
    // The standalone server serves no content of its own.
    assert_eq!(resp.status(), 404);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn health_endpoint_bypasses_the_gate() {
    let (addr, shutdown) = start_test_server(|_| test_policy(&["www.example.com"])).await;

    // Plain HTTP from a non-whitelisted host would redirect anywhere else.
    let resp = client()
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let health: HealthResponse = resp.json().await.unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.policy.source, "test");
    assert_eq!(health.policy.key, "RedirectPlugin");
    assert_eq!(health.policy.allowed_hosts, 1);
    assert!(health.policy.require_https);
    assert_eq!(health.stats.requests_passed, 0);
    assert_eq!(health.stats.requests_failed, 0);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn stats_reflect_gate_decisions() {
    let (addr, shutdown) = start_test_server(|addr| test_policy(&[&addr.to_string()])).await;
    let client = client();

    // One canonicalization redirect is impossible here (host is allowed),
    // so drive one upgrade, one bounce, and one pass.
    let _ = client.get(format!("http://{addr}/a")).send().await.unwrap();
    let _ = client
        .get(format!("http://{addr}/b"))
        .header("via", "CloudFront")
        .send()
        .await
        .unwrap();
    let _ = client
        .get(format!("http://{addr}/c"))
        .header("x-forwarded-proto", "https")
        .send()
        .await
        .unwrap();

    let health: HealthResponse = client
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health.stats.requests_upgraded, 1);
    assert_eq!(health.stats.requests_bounced, 1);
    assert_eq!(health.stats.requests_passed, 1);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn health_version_matches_crate() {
    let (addr, shutdown) = start_test_server(|_| test_policy(&["www.example.com"])).await;

    let health: HealthResponse = client()
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));

    let _ = shutdown.send(());
}

#[tokio::test]
async fn graceful_shutdown_works() {
    let (addr, shutdown) = start_test_server(|_| test_policy(&["www.example.com"])).await;

    // Verify server is running
    let url = format!("http://{addr}/health");
    assert!(reqwest::get(&url).await.is_ok());

    // Send shutdown
    let _ = shutdown.send(());

    // Give it a moment to shut down
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    // Server should no longer accept connections
    let result = reqwest::get(&url).await;
    assert!(result.is_err());
}
