//! Serde data structures for the Hostgate configuration store.
//!
//! The config file is a key-value store: [`ConfigStore`] maps plugin keys
//! to [`PolicyConfig`] tables. The gate looks its policy up under a fixed
//! key ([`DEFAULT_POLICY_KEY`], overridable with `--policy-key`). All types
//! derive `Serialize` and `Deserialize` with `deny_unknown_fields` for
//! strict parsing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::HostgateError;

/// Key under which the redirect policy is looked up when no override is
/// given.
pub const DEFAULT_POLICY_KEY: &str = "RedirectPlugin";

const fn default_true() -> bool {
    true
}

fn default_cdn_markers() -> Vec<String> {
    vec!["CloudFront".to_string()]
}

fn is_true(v: &bool) -> bool {
    *v
}

fn is_default_cdn_markers(v: &[String]) -> bool {
    v.len() == 1 && v[0] == "CloudFront"
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigStore {
    pub plugins: HashMap<String, PolicyConfig>,
}

impl ConfigStore {
    /// Fetch the policy stored under `key`.
    ///
    /// A missing key is fatal: the gate must never run against undefined
    /// policy, since that risks an incorrect or looping redirect.
    pub fn policy(&self, key: &str) -> Result<&PolicyConfig, HostgateError> {
        self.plugins
            .get(key)
            .ok_or_else(|| HostgateError::PolicyMissing {
                key: key.to_string(),
            })
    }

    #[must_use]
    pub fn total_allowed_hosts(&self) -> usize {
        self.plugins.values().map(|p| p.allowed_hosts.len()).sum()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    pub allowed_hosts: Vec<String>,

    pub fallback_host: FallbackHostConfig,

    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub require_https: bool,

    #[serde(
        default = "default_cdn_markers",
        skip_serializing_if = "is_default_cdn_markers"
    )]
    pub cdn_markers: Vec<String>,
}

/// The fallback host is either a literal host name or resolved from an
/// environment variable each time a fallback target is needed.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FallbackHostConfig {
    Literal(String),
    Env { env: String },
}
