//! Configuration validation with detailed error reporting.
//!
//! The [`validate`] function checks a parsed [`ConfigStore`] for errors
//! such as empty policy tables, empty allowed-host lists, malformed host
//! values, unusable fallback hosts, and fallback hosts that would loop.
//! Returns a list of [`ValidationError`] values with per-field
//! suggestions.

use url::Url;

use super::model::{ConfigStore, FallbackHostConfig, PolicyConfig};
use crate::error::ValidationError;

/// Validate a bare host value (optionally with a port). Returns `Ok(())`
/// or a human-readable error.
pub fn validate_host(host: &str) -> Result<(), String> {
    if host.is_empty() {
        return Err("host cannot be empty".into());
    }
    if host.contains("://") {
        return Err(format!("'{host}' must not carry a scheme"));
    }
    if host.contains('/') {
        return Err(format!("'{host}' must not contain a path"));
    }
    if host.chars().any(char::is_whitespace) {
        return Err(format!("'{host}' must not contain whitespace"));
    }
    match Url::parse(&format!("https://{host}/")) {
        Ok(parsed) if parsed.host_str().is_some() => Ok(()),
        _ => Err(format!("'{host}' is not a valid host")),
    }
}

pub fn validate(store: &ConfigStore) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if store.plugins.is_empty() {
        errors.push(ValidationError {
            policy: "(root)".into(),
            field: "plugins".into(),
            message: "at least one policy must be defined".into(),
            suggestion: None,
        });
        return Err(errors);
    }

    // HashMap iteration order is arbitrary; sort for stable reports.
    let mut keys: Vec<&String> = store.plugins.keys().collect();
    keys.sort();

    for key in keys {
        validate_policy(key, &store.plugins[key], &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_policy(key: &str, policy: &PolicyConfig, errors: &mut Vec<ValidationError>) {
    if policy.allowed_hosts.is_empty() {
        errors.push(ValidationError {
            policy: key.into(),
            field: "allowed_hosts".into(),
            message: "at least one allowed host must be defined".into(),
            suggestion: Some("an empty whitelist would redirect every request".into()),
        });
    }

    for host in &policy.allowed_hosts {
        if let Err(msg) = validate_host(host) {
            errors.push(ValidationError {
                policy: key.into(),
                field: "allowed_hosts".into(),
                message: msg,
                suggestion: None,
            });
        }
    }

    match &policy.fallback_host {
        FallbackHostConfig::Literal(host) => {
            if let Err(msg) = validate_host(host) {
                errors.push(ValidationError {
                    policy: key.into(),
                    field: "fallback_host".into(),
                    message: msg,
                    suggestion: None,
                });
            } else if !policy.allowed_hosts.iter().any(|h| h == host) {
                errors.push(ValidationError {
                    policy: key.into(),
                    field: "fallback_host".into(),
                    message: format!("'{host}' is not in allowed_hosts, redirects would loop"),
                    suggestion: Some(format!("add '{host}' to allowed_hosts")),
                });
            }
        }
        FallbackHostConfig::Env { env } => {
            if env.is_empty() || env.chars().any(|c| c.is_whitespace() || c == '=') {
                errors.push(ValidationError {
                    policy: key.into(),
                    field: "fallback_host.env".into(),
                    message: format!("'{env}' is not a valid environment variable name"),
                    suggestion: None,
                });
            }
        }
    }

    for marker in &policy.cdn_markers {
        if marker.is_empty() {
            errors.push(ValidationError {
                policy: key.into(),
                field: "cdn_markers".into(),
                message: "marker cannot be empty".into(),
                suggestion: Some("an empty marker would match every Via header".into()),
            });
        }
    }
}

#[must_use]
pub fn format_validation_report(path: &str, store: &ConfigStore) -> String {
    let mut lines = vec![format!(
        "  {} policies, {} allowed hosts\n",
        store.plugins.len(),
        store.total_allowed_hosts()
    )];

    let mut keys: Vec<&String> = store.plugins.keys().collect();
    keys.sort();

    for key in keys {
        let policy = &store.plugins[key];
        let fallback = match &policy.fallback_host {
            FallbackHostConfig::Literal(host) => host.clone(),
            FallbackHostConfig::Env { env } => format!("${env}"),
        };
        lines.push(format!(
            "  {}  -> {} allowed hosts (fallback: {})",
            key,
            policy.allowed_hosts.len(),
            fallback,
        ));
        lines.push(format!(
            "    https upgrade: {}",
            if policy.require_https {
                "enforced"
            } else {
                "off"
            }
        ));
        lines.push(format!("    cdn markers: {}", policy.cdn_markers.join(", ")));
    }

    format!("{} is valid\n{}", path, lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn minimal_store() -> ConfigStore {
        let mut plugins = HashMap::new();
        plugins.insert(
            "RedirectPlugin".to_string(),
            PolicyConfig {
                allowed_hosts: vec!["www.example.com".into()],
                fallback_host: FallbackHostConfig::Literal("www.example.com".into()),
                require_https: true,
                cdn_markers: vec!["CloudFront".into()],
            },
        );
        ConfigStore { plugins }
    }

    #[test]
    fn valid_store_passes() {
        assert!(validate(&minimal_store()).is_ok());
    }

    #[test]
    fn empty_plugins_fails() {
        let store = ConfigStore {
            plugins: HashMap::new(),
        };
        let errors = validate(&store).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("at least one policy"));
    }

    #[test]
    fn empty_allowed_hosts_fails() {
        let mut store = minimal_store();
        store
            .plugins
            .get_mut("RedirectPlugin")
            .unwrap()
            .allowed_hosts
            .clear();
        let errors = validate(&store).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.message.contains("at least one allowed host")));
    }

    #[test]
    fn host_with_scheme_fails() {
        let mut store = minimal_store();
        store
            .plugins
            .get_mut("RedirectPlugin")
            .unwrap()
            .allowed_hosts
            .push("https://www.example.com".into());
        let errors = validate(&store).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("scheme")));
    }

    #[test]
    fn fallback_outside_whitelist_fails() {
        let mut store = minimal_store();
        store.plugins.get_mut("RedirectPlugin").unwrap().fallback_host =
            FallbackHostConfig::Literal("other.example.com".into());
        let errors = validate(&store).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("would loop")));
        assert!(errors
            .iter()
            .any(|e| e.suggestion.as_deref() == Some("add 'other.example.com' to allowed_hosts")));
    }

    #[test]
    fn env_fallback_skips_whitelist_check() {
        let mut store = minimal_store();
        store.plugins.get_mut("RedirectPlugin").unwrap().fallback_host =
            FallbackHostConfig::Env {
                env: "CANONICAL_HOST".into(),
            };
        assert!(validate(&store).is_ok());
    }

    #[test]
    fn invalid_env_name_fails() {
        let mut store = minimal_store();
        store.plugins.get_mut("RedirectPlugin").unwrap().fallback_host =
            FallbackHostConfig::Env { env: String::new() };
        let errors = validate(&store).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.field == "fallback_host.env"));
    }

    #[test]
    fn empty_cdn_marker_fails() {
        let mut store = minimal_store();
        store
            .plugins
            .get_mut("RedirectPlugin")
            .unwrap()
            .cdn_markers
            .push(String::new());
        let errors = validate(&store).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "cdn_markers"));
    }

    #[test]
    fn host_with_port_passes() {
        let mut store = minimal_store();
        let policy = store.plugins.get_mut("RedirectPlugin").unwrap();
        policy.allowed_hosts = vec!["www.example.com:8443".into()];
        policy.fallback_host = FallbackHostConfig::Literal("www.example.com:8443".into());
        assert!(validate(&store).is_ok());
    }
}
