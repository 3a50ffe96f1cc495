//! Command-line interface definitions using clap derive macros.
//!
//! Contains the top-level [`Cli`] parser, the [`Commands`] enum for
//! subcommands (run, init, validate, check, health), and their
//! associated argument structs. Every flag has an environment variable
//! equivalent for container deployments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::model::DEFAULT_POLICY_KEY;

#[derive(Parser)]
#[command(
    name = "hostgate",
    version,
    about = "Canonical-host and HTTPS redirect gatekeeper",
    propagate_version = true,
    after_help = "\x1b[1mQuick start:\x1b[0m\n  \
        hostgate init                        Create a starter config\n  \
        hostgate run                         Start with ./hostgate.yaml\n  \
        hostgate run -c policy.yaml          Start with a specific config\n  \
        hostgate check --host evil.net       Dry-run the decision engine\n\n  \
        Docs: https://github.com/hostgate/hostgate"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the standalone bounce server
    Run(Box<RunArgs>),

    /// Generate a starter config file
    Init(InitArgs),

    /// Validate a config file without starting
    Validate(ValidateArgs),

    /// Dry-run the redirect decision engine against a simulated request
    Check(CheckArgs),

    /// Check health of a running instance
    Health(HealthArgs),
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        hostgate run                                    Auto-detect config\n  \
        hostgate run -c policy.yaml                     Specific config file\n  \
        hostgate run -c policy.yaml -p 8080 --pretty    Local dev mode\n  \
        hostgate run -k StagingRedirect                 Alternate policy key")]
pub struct RunArgs {
    /// Config file path (.yaml, .json, .toml)
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Listen port
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Listen address
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Key the redirect policy is stored under in the config store
    #[arg(
        short = 'k',
        long,
        env = "HOSTGATE_POLICY_KEY",
        default_value = DEFAULT_POLICY_KEY
    )]
    pub policy_key: String,

    // -- Logging --
    /// Log level
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Force pretty (human-readable) log output
    #[arg(long)]
    pub pretty: bool,

    /// Force JSON log output (overrides TTY detection)
    #[arg(long, conflicts_with = "pretty")]
    pub json: bool,

    // -- Observability --
    /// Sentry DSN (enables error tracking)
    #[cfg(feature = "sentry-integration")]
    #[arg(long, env = "SENTRY_DSN", help_heading = "Observability")]
    pub sentry_dsn: Option<String>,

    /// Sentry environment tag
    #[cfg(feature = "sentry-integration")]
    #[arg(long, env = "SENTRY_ENVIRONMENT", help_heading = "Observability")]
    pub sentry_environment: Option<String>,

    // -- Tuning --
    /// Max request body size in bytes
    #[arg(
        long,
        env = "MAX_BODY_SIZE",
        default_value_t = 1_048_576,
        help_heading = "Tuning"
    )]
    pub max_body: usize,

    /// Config refresh interval in seconds
    #[arg(
        long,
        env = "POLL_INTERVAL_SECS",
        default_value_t = 30,
        help_heading = "Tuning"
    )]
    pub poll_interval: u64,
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        hostgate init                          Quick start config (yaml)\n  \
        hostgate init -f toml -o policy.toml   Non-interactive, TOML format\n  \
        hostgate init --full                   Fully documented template")]
pub struct InitArgs {
    /// Output format
    #[arg(short, long, default_value = "yaml")]
    pub format: ConfigFormat,

    /// Output file path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Include full documentation as comments
    #[arg(long)]
    pub full: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Config file to validate
    #[arg(default_value = "hostgate.yaml")]
    pub config: PathBuf,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: ValidateFormat,
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        hostgate check --host evil.example.net                 Foreign host\n  \
        hostgate check --host www.example.com --insecure       HTTP upgrade\n  \
        hostgate check --via 'Amazon CloudFront' --path /foo   CDN bounce")]
pub struct CheckArgs {
    /// Config file to load the policy from
    #[arg(short, long, default_value = "hostgate.yaml")]
    pub config: PathBuf,

    /// Key the redirect policy is stored under in the config store
    #[arg(
        short = 'k',
        long,
        env = "HOSTGATE_POLICY_KEY",
        default_value = DEFAULT_POLICY_KEY
    )]
    pub policy_key: String,

    /// Simulated Host header (omit to simulate a host-less request)
    #[arg(long)]
    pub host: Option<String>,

    /// Simulated request path
    #[arg(long, default_value = "/")]
    pub path: String,

    /// Simulated Via header
    #[arg(long)]
    pub via: Option<String>,

    /// Simulate an insecure (plain HTTP) request
    #[arg(long)]
    pub insecure: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct HealthArgs {
    /// URL of the running instance
    #[arg(default_value = "http://localhost:8080")]
    pub url: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Clone, Debug, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Toml => "toml",
        }
    }
}

#[derive(Clone, Debug, ValueEnum)]
pub enum ValidateFormat {
    Text,
    Json,
}
