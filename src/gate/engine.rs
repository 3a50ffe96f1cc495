//! The redirect decision engine: three ordered checks.
//!
//! [`evaluate`] examines a [`RequestContext`] against a
//! [`RedirectPolicy`] and decides whether the request must be
//! short-circuited with a redirect. The checks run in fixed order and
//! the first that triggers wins:
//!
//! 1. CDN bounce-back — edge-originated traffic (identified by a marker
//!    in the `Via` header) goes back to the fallback host so the CDN
//!    re-fetches from the canonical origin instead of mirroring it.
//! 2. Host canonicalization — a present host outside the whitelist is
//!    sent to the fallback host. Temporary, since host misconfiguration
//!    (e.g. DNS propagation) may be transient.
//! 3. Protocol upgrade — insecure transport is upgraded to `https` on
//!    the *original* host.

use crate::error::HostgateError;

use super::context::RequestContext;
use super::policy::{FallbackHost, RedirectPolicy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectDecision {
    pub target: String,
    pub permanent: bool,
    pub cause: Cause,
}

/// Which check produced a decision. Consumed by stats and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cause {
    CdnBounce,
    HostCanonicalization,
    HttpsUpgrade,
}

impl Cause {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CdnBounce => "cdn_bounce",
            Self::HostCanonicalization => "host_canonicalization",
            Self::HttpsUpgrade => "https_upgrade",
        }
    }
}

/// Run the checks in order, stopping at the first that triggers.
///
/// `Ok(None)` means the request may proceed to normal handling. Errors
/// are fatal for the request: a host-less insecure request cannot be
/// upgraded ([`HostgateError::MissingHost`]), and a failing fallback
/// resolver must never be papered over with a broken redirect target.
pub fn evaluate(
    policy: &RedirectPolicy,
    ctx: &RequestContext,
) -> Result<Option<RedirectDecision>, HostgateError> {
    let mut fallback = LazyFallback::new(&policy.fallback_host);

    if ctx.via().is_some_and(|via| policy.is_cdn_via(via)) {
        let target = format!("https://{}{}", fallback.resolve()?, ctx.path());
        return Ok(Some(RedirectDecision {
            target,
            permanent: true,
            cause: Cause::CdnBounce,
        }));
    }

    // An absent host skips canonicalization: there is no meaningful host
    // to judge against the whitelist.
    if let Some(host) = ctx.host() {
        if !policy.allows(host) {
            let target = format!("https://{}{}", fallback.resolve()?, ctx.path());
            return Ok(Some(RedirectDecision {
                target,
                permanent: false,
                cause: Cause::HostCanonicalization,
            }));
        }
    }

    if policy.require_https && !ctx.is_secure() {
        let host = ctx.host().ok_or(HostgateError::MissingHost)?;
        let target = format!("https://{host}{}", ctx.path());
        return Ok(Some(RedirectDecision {
            target,
            permanent: true,
            cause: Cause::HttpsUpgrade,
        }));
    }

    Ok(None)
}

/// Memoizes the resolved fallback host so a dynamic resolver runs at
/// most once per decision.
struct LazyFallback<'a> {
    fallback: &'a FallbackHost,
    resolved: Option<String>,
}

impl<'a> LazyFallback<'a> {
    const fn new(fallback: &'a FallbackHost) -> Self {
        Self {
            fallback,
            resolved: None,
        }
    }

    fn resolve(&mut self) -> Result<&str, HostgateError> {
        if self.resolved.is_none() {
            self.resolved = Some(self.fallback.resolve()?);
        }
        Ok(self.resolved.as_deref().unwrap_or(""))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    fn policy() -> RedirectPolicy {
        RedirectPolicy {
            allowed_hosts: ["www.example.com".to_string()].into_iter().collect(),
            fallback_host: FallbackHost::Literal("www.example.com".into()),
            require_https: true,
            cdn_markers: vec!["CloudFront".into()],
        }
    }

    fn ctx(host: Option<&str>, path: &str, via: Option<&str>, secure: bool) -> RequestContext {
        RequestContext::new(
            host.map(str::to_string),
            path,
            via.map(str::to_string),
            secure,
        )
    }

    #[test]
    fn cdn_via_bounces_to_fallback_permanently() {
        let decision = evaluate(
            &policy(),
            &ctx(
                Some("cdn.example.com"),
                "/foo",
                Some("Amazon CloudFront"),
                true,
            ),
        )
        .unwrap()
        .unwrap();
        assert_eq!(decision.target, "https://www.example.com/foo");
        assert!(decision.permanent);
        assert_eq!(decision.cause, Cause::CdnBounce);
    }

    #[test]
    fn cdn_check_wins_regardless_of_host_and_transport() {
        // Even an allowed host over https bounces when the via marker is present.
        let decision = evaluate(
            &policy(),
            &ctx(
                Some("www.example.com"),
                "/",
                Some("1.1 abc.cloudfront.net (CloudFront)"),
                true,
            ),
        )
        .unwrap()
        .unwrap();
        assert_eq!(decision.cause, Cause::CdnBounce);
    }

    #[test]
    fn via_without_marker_does_not_bounce() {
        let decision = evaluate(
            &policy(),
            &ctx(Some("www.example.com"), "/", Some("1.1 some-proxy"), true),
        )
        .unwrap();
        assert!(decision.is_none());
    }

    #[test]
    fn foreign_host_canonicalizes_temporarily() {
        let decision = evaluate(&policy(), &ctx(Some("evil.example.net"), "/", None, true))
            .unwrap()
            .unwrap();
        assert_eq!(decision.target, "https://www.example.com/");
        assert!(!decision.permanent);
        assert_eq!(decision.cause, Cause::HostCanonicalization);
    }

    #[test]
    fn absent_host_skips_canonicalization() {
        let decision = evaluate(&policy(), &ctx(None, "/", None, true)).unwrap();
        assert!(decision.is_none());
    }

    #[test]
    fn insecure_allowed_host_upgrades_on_original_host() {
        let decision = evaluate(&policy(), &ctx(Some("www.example.com"), "/login", None, false))
            .unwrap()
            .unwrap();
        assert_eq!(decision.target, "https://www.example.com/login");
        assert!(decision.permanent);
        assert_eq!(decision.cause, Cause::HttpsUpgrade);
    }

    #[test]
    fn insecure_without_host_is_fatal() {
        let err = evaluate(&policy(), &ctx(None, "/", None, false)).unwrap_err();
        assert!(matches!(err, HostgateError::MissingHost));
    }

    #[test]
    fn allowed_host_secure_no_marker_proceeds() {
        let decision = evaluate(&policy(), &ctx(Some("www.example.com"), "/", None, true)).unwrap();
        assert!(decision.is_none());
    }

    #[test]
    fn require_https_off_skips_upgrade() {
        let mut relaxed = policy();
        relaxed.require_https = false;
        let decision =
            evaluate(&relaxed, &ctx(Some("www.example.com"), "/", None, false)).unwrap();
        assert!(decision.is_none());
    }

    #[test]
    fn path_with_query_is_preserved() {
        let decision = evaluate(
            &policy(),
            &ctx(Some("evil.example.net"), "/search?q=a+b", None, true),
        )
        .unwrap()
        .unwrap();
        assert_eq!(decision.target, "https://www.example.com/search?q=a+b");
    }

    #[test]
    fn canonicalization_beats_protocol_upgrade() {
        // Foreign host over http: the fallback wins, not a same-host upgrade.
        let decision = evaluate(&policy(), &ctx(Some("evil.example.net"), "/", None, false))
            .unwrap()
            .unwrap();
        assert_eq!(decision.cause, Cause::HostCanonicalization);
        assert_eq!(decision.target, "https://www.example.com/");
    }

    #[test]
    fn resolver_runs_at_most_once_per_decision() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut counting = policy();
        counting.fallback_host = FallbackHost::Resolver(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok("www.example.com".to_string())
        }));

        let decision = evaluate(
            &counting,
            &ctx(Some("cdn.example.com"), "/", Some("CloudFront"), false),
        )
        .unwrap()
        .unwrap();
        assert_eq!(decision.target, "https://www.example.com/");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn resolver_failure_aborts_the_decision() {
        let mut broken = policy();
        broken.fallback_host = FallbackHost::Resolver(Arc::new(|| Err("dns offline".into())));
        let err = evaluate(
            &broken,
            &ctx(Some("evil.example.net"), "/", None, true),
        )
        .unwrap_err();
        assert!(matches!(err, HostgateError::FallbackResolution { .. }));
    }
}
