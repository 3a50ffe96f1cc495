//! Runtime redirect policy, compiled once from configuration.
//!
//! [`RedirectPolicy`] is the immutable, `Arc`-shared form the decision
//! engine consumes. The config-side callable-or-string fallback host
//! becomes the explicit [`FallbackHost`] variant pair here: a literal
//! host, or a resolver closure invoked lazily when a fallback target is
//! needed.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::config::model::{FallbackHostConfig, PolicyConfig};
use crate::error::HostgateError;

type Resolver =
    Arc<dyn Fn() -> Result<String, Box<dyn std::error::Error + Send + Sync>> + Send + Sync>;

#[derive(Clone)]
pub enum FallbackHost {
    Literal(String),
    Resolver(Resolver),
}

impl FallbackHost {
    /// A resolver reading the named environment variable. This is what the
    /// config's `{env: NAME}` variant compiles to.
    pub fn from_env(var: impl Into<String>) -> Self {
        let var = var.into();
        Self::Resolver(Arc::new(move || {
            std::env::var(&var).map_err(|e| format!("environment variable '{var}': {e}").into())
        }))
    }

    /// Resolve to a concrete host.
    ///
    /// Callers must resolve at most once per decision and reuse the value;
    /// a dynamic resolver is not required to return the same host twice.
    pub fn resolve(&self) -> Result<String, HostgateError> {
        let host = match self {
            Self::Literal(host) => host.clone(),
            Self::Resolver(resolver) => {
                resolver().map_err(|source| HostgateError::FallbackResolution { source })?
            }
        };
        if host.is_empty() || host.contains('/') || host.chars().any(char::is_whitespace) {
            return Err(HostgateError::FallbackResolution {
                source: format!("'{host}' is not a usable host").into(),
            });
        }
        Ok(host)
    }
}

impl fmt::Debug for FallbackHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(host) => f.debug_tuple("Literal").field(host).finish(),
            Self::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RedirectPolicy {
    pub allowed_hosts: HashSet<String>,
    pub fallback_host: FallbackHost,
    pub require_https: bool,
    pub cdn_markers: Vec<String>,
}

impl RedirectPolicy {
    #[must_use]
    pub fn from_config(config: &PolicyConfig) -> Self {
        let fallback_host = match &config.fallback_host {
            FallbackHostConfig::Literal(host) => FallbackHost::Literal(host.clone()),
            FallbackHostConfig::Env { env } => FallbackHost::from_env(env.clone()),
        };
        Self {
            allowed_hosts: config.allowed_hosts.iter().cloned().collect(),
            fallback_host,
            require_https: config.require_https,
            cdn_markers: config.cdn_markers.clone(),
        }
    }

    #[must_use]
    pub fn allows(&self, host: &str) -> bool {
        self.allowed_hosts.contains(host)
    }

    /// Case-sensitive substring match against the configured CDN markers.
    #[must_use]
    pub fn is_cdn_via(&self, via: &str) -> bool {
        self.cdn_markers.iter().any(|m| via.contains(m.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal_policy() -> RedirectPolicy {
        RedirectPolicy {
            allowed_hosts: ["www.example.com".to_string()].into_iter().collect(),
            fallback_host: FallbackHost::Literal("www.example.com".into()),
            require_https: true,
            cdn_markers: vec!["CloudFront".into()],
        }
    }

    #[test]
    fn literal_resolves_to_itself() {
        let policy = literal_policy();
        assert_eq!(policy.fallback_host.resolve().unwrap(), "www.example.com");
    }

    #[test]
    fn resolver_output_is_used() {
        let fallback = FallbackHost::Resolver(Arc::new(|| Ok("edge.example.com".to_string())));
        assert_eq!(fallback.resolve().unwrap(), "edge.example.com");
    }

    #[test]
    fn resolver_failure_propagates() {
        let fallback = FallbackHost::Resolver(Arc::new(|| Err("resolver offline".into())));
        let err = fallback.resolve().unwrap_err();
        assert!(matches!(err, HostgateError::FallbackResolution { .. }));
    }

    #[test]
    fn empty_resolved_host_rejected() {
        let fallback = FallbackHost::Resolver(Arc::new(|| Ok(String::new())));
        assert!(fallback.resolve().is_err());
    }

    #[test]
    fn resolved_host_with_path_rejected() {
        let fallback = FallbackHost::Literal("www.example.com/evil".into());
        assert!(fallback.resolve().is_err());
    }

    #[test]
    fn cdn_marker_match_is_case_sensitive() {
        let policy = literal_policy();
        assert!(policy.is_cdn_via("1.1 abc.cloudfront.net (CloudFront)"));
        assert!(!policy.is_cdn_via("1.1 abc.cloudfront.net (cloudfront)"));
    }

    #[test]
    fn allows_exact_members_only() {
        let policy = literal_policy();
        assert!(policy.allows("www.example.com"));
        assert!(!policy.allows("example.com"));
        assert!(!policy.allows("WWW.EXAMPLE.COM"));
    }
}
