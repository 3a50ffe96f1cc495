//! `hostgate init` — generate a starter configuration file.
//!
//! Creates a YAML, JSON, or TOML config file with either minimal
//! or fully documented templates.

use std::path::PathBuf;

use crate::cli::{ConfigFormat, InitArgs};
use crate::error::HostgateError;

pub fn execute(args: &InitArgs) -> Result<(), HostgateError> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("hostgate.{}", args.format.extension())));

    if output.exists() {
        return Err(HostgateError::FileExists { path: output });
    }

    let content = match (&args.format, args.full) {
        (ConfigFormat::Yaml, false) => YAML_MINIMAL,
        (ConfigFormat::Yaml, true) => YAML_FULL,
        (ConfigFormat::Json, false) => JSON_MINIMAL,
        (ConfigFormat::Json, true) => JSON_FULL,
        (ConfigFormat::Toml, false) => TOML_MINIMAL,
        (ConfigFormat::Toml, true) => TOML_FULL,
    };

    std::fs::write(&output, content)?;
    println!("Created {}", output.display());
    Ok(())
}

const YAML_MINIMAL: &str = r#"# Hostgate config — https://github.com/hostgate/hostgate

plugins:
  RedirectPlugin:
    allowed_hosts:
      - "www.example.com"
    fallback_host: "www.example.com"
"#;

const YAML_FULL: &str = r#"# Hostgate config — https://github.com/hostgate/hostgate
#
# The config file is a key-value store: each entry under `plugins` is a
# policy table, looked up by key (--policy-key, default RedirectPlugin).

plugins:
  RedirectPlugin:
    # Hosts allowed to serve traffic. Anything else is redirected to the
    # fallback host. A single-domain deployment is a whitelist of one.
    allowed_hosts:
      - "www.example.com"
      - "example.com"

    # Redirect target for foreign hosts and CDN bounce-backs. Either a
    # literal host (must itself be in allowed_hosts) or an environment
    # variable resolved each time a fallback target is needed:
    fallback_host: "www.example.com"
    # fallback_host:
    #   env: CANONICAL_HOST

    # Upgrade insecure requests to https on the original host.
    # require_https: true

    # Case-sensitive substrings identifying CDN edge traffic in the Via
    # header. Matching requests bounce back to the fallback host.
    # cdn_markers: ["CloudFront"]

  # A second policy key, e.g. for staging behind the same binary:
  # StagingRedirect:
  #   allowed_hosts: ["staging.example.com"]
  #   fallback_host: "staging.example.com"
  #   require_https: false
"#;

const JSON_MINIMAL: &str = r#"{
  "plugins": {
    "RedirectPlugin": {
      "allowed_hosts": ["www.example.com"],
      "fallback_host": "www.example.com"
    }
  }
}
"#;

const JSON_FULL: &str = r#"{
  "plugins": {
    "RedirectPlugin": {
      "allowed_hosts": ["www.example.com", "example.com"],
      "fallback_host": "www.example.com",
      "require_https": true,
      "cdn_markers": ["CloudFront"]
    }
  }
}
"#;

const TOML_MINIMAL: &str = r#"# Hostgate config — https://github.com/hostgate/hostgate

[plugins.RedirectPlugin]
allowed_hosts = ["www.example.com"]
fallback_host = "www.example.com"
"#;

const TOML_FULL: &str = r#"# Hostgate config — https://github.com/hostgate/hostgate
#
# The config file is a key-value store: each [plugins.<key>] table is a
# policy, looked up by key (--policy-key, default RedirectPlugin).

[plugins.RedirectPlugin]
allowed_hosts = ["www.example.com", "example.com"]
fallback_host = "www.example.com"
require_https = true
cdn_markers = ["CloudFront"]

# Resolve the fallback host from the environment instead:
# fallback_host = { env = "CANONICAL_HOST" }
"#;
