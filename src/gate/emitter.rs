//! Converts a redirect decision into the final HTTP response.
//!
//! Permanent decisions map to `301 Moved Permanently`, temporary ones to
//! `302 Found`. The `Location` header carries the target and no body is
//! emitted. In middleware position, returning this response without
//! invoking the inner service is what halts further request processing.

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use super::engine::RedirectDecision;

#[must_use]
pub fn emit(decision: &RedirectDecision) -> Response {
    let status = if decision.permanent {
        StatusCode::MOVED_PERMANENTLY
    } else {
        StatusCode::FOUND
    };

    Response::builder()
        .status(status)
        .header(header::LOCATION, decision.target.as_str())
        .body(Body::empty())
        .unwrap_or_else(|e| {
            tracing::error!(
                target_url = %decision.target,
                error = %e,
                "failed to build redirect response"
            );
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::engine::Cause;

    fn decision(permanent: bool) -> RedirectDecision {
        RedirectDecision {
            target: "https://www.example.com/foo".into(),
            permanent,
            cause: Cause::CdnBounce,
        }
    }

    #[test]
    fn permanent_maps_to_301() {
        let response = emit(&decision(true));
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "https://www.example.com/foo"
        );
    }

    #[test]
    fn temporary_maps_to_302() {
        let response = emit(&decision(false));
        assert_eq!(response.status(), StatusCode::FOUND);
    }
}
