//! Hostgate is a request-time redirect gatekeeper.
//!
//! It inspects each inbound HTTP request's host, protocol indicator, and
//! upstream `Via` header and decides whether to short-circuit the request
//! with a redirect before normal handling occurs: CDN-edge traffic is
//! bounced back to the canonical host (preventing origin mirroring),
//! foreign hosts are canonicalized onto the configured whitelist, and
//! insecure transport is upgraded to HTTPS.
//!
//! Hostgate ships two ways: as an axum middleware ([`gate::enforce`])
//! layered in front of an application's handlers, and as a standalone
//! bounce server (`hostgate run`) that answers `404` for requests that
//! pass every check.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (run, init, validate,
//!   check, health).
//! - [`config`] -- Plugin-keyed config store: loading, validation, and
//!   hot-reloading via the [`ConfigSource`](config::ConfigSource) trait.
//! - [`error`] -- Unified error types using `thiserror`.
//! - [`gate`] -- The redirect core: request context extraction, the
//!   compiled policy, the ordered decision checks, response emission, and
//!   the per-request lifecycle guard.
//! - [`health`] -- `GET /health` endpoint handler returning runtime
//!   diagnostics.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print
//!   output.
//! - [`server`] -- Axum server setup, shared application state, and
//!   graceful shutdown.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `yaml` | YAML config file support _(enabled by default)_ |
//! | `json` | JSON config file support |
//! | `toml` | TOML config file support |
//! | `sentry-integration` | Sentry error tracking |
//! | `file-backends` | All file format backends |
//! | `full` | All features |

// Binary crate — public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod gate;
pub mod health;
pub mod logging;
pub mod server;

#[cfg(feature = "sentry-integration")]
pub mod sentry_integration;
