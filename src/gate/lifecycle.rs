//! At-most-once execution guard for the gate.
//!
//! [`Lifecycle`] carries the "initiated" flag: the first [`init`] call
//! claims it and runs the engine; every later call is a no-op. The flag
//! is claimed with an atomic `swap` *before* the engine runs, so a
//! re-entrant invocation can never produce a second redirect even if the
//! engine itself were to call back into `init`.
//!
//! [`init`]: Lifecycle::init

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::HostgateError;

use super::context::RequestContext;
use super::engine::{self, RedirectDecision};
use super::policy::RedirectPolicy;

#[derive(Debug)]
pub struct Lifecycle {
    initiated: AtomicBool,
}

/// Outcome of a [`Lifecycle::init`] call.
#[derive(Debug)]
pub enum Verdict {
    /// The engine ran and produced a redirect.
    Redirect(RedirectDecision),
    /// The engine ran; the request may proceed to normal handling.
    Proceed,
    /// A prior invocation already ran for this lifecycle; nothing happened.
    AlreadyRan,
}

impl Verdict {
    /// Whether this call actually executed the engine.
    #[must_use]
    pub const fn ran(&self) -> bool {
        !matches!(self, Self::AlreadyRan)
    }
}

impl Lifecycle {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            initiated: AtomicBool::new(false),
        }
    }

    /// Run the redirect engine at most once for this lifecycle.
    pub fn init(
        &self,
        policy: &RedirectPolicy,
        ctx: &RequestContext,
    ) -> Result<Verdict, HostgateError> {
        if self.initiated.swap(true, Ordering::SeqCst) {
            return Ok(Verdict::AlreadyRan);
        }
        Ok(match engine::evaluate(policy, ctx)? {
            Some(decision) => Verdict::Redirect(decision),
            None => Verdict::Proceed,
        })
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
