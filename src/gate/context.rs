//! Read-only extraction of redirect-relevant request metadata.
//!
//! [`RequestContext`] captures the four signals the decision engine
//! consumes: the host, the request path, the `Via` proxy-chain header,
//! and whether the transport is secure. Absent headers stay `None` —
//! "absent" and "empty" carry different policy meaning downstream (an
//! absent host skips canonicalization entirely rather than forcing a
//! redirect to an empty host).

use axum::http::{header, Request};

#[derive(Debug, Clone)]
pub struct RequestContext {
    host: Option<String>,
    path: String,
    via: Option<String>,
    secure: bool,
}

impl RequestContext {
    #[must_use]
    pub fn new(
        host: Option<String>,
        path: impl Into<String>,
        via: Option<String>,
        secure: bool,
    ) -> Self {
        let path = path.into();
        Self {
            host,
            path: if path.is_empty() { "/".to_string() } else { path },
            via,
            secure,
        }
    }

    /// Extract the context from an inbound request.
    ///
    /// The host comes from the `Host` header, falling back to the URI
    /// authority for HTTP/2-style requests. The path keeps the query
    /// string. Transport security is read from `x-forwarded-proto`, set
    /// by the TLS-terminating proxy in front — hostgate never terminates
    /// TLS itself. Embedders with a different security indicator should
    /// construct the context via [`RequestContext::new`] instead.
    #[must_use]
    pub fn from_request<B>(req: &Request<B>) -> Self {
        let host = header_str(req, header::HOST)
            .map(str::to_string)
            .or_else(|| req.uri().authority().map(|a| a.as_str().to_string()));

        let via = header_str(req, header::VIA).map(str::to_string);

        let secure = req
            .headers()
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|proto| proto.eq_ignore_ascii_case("https"));

        let path = req
            .uri()
            .path_and_query()
            .map_or("/", |pq| pq.as_str())
            .to_string();

        Self {
            host,
            path,
            via,
            secure,
        }
    }

    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn via(&self) -> Option<&str> {
        self.via.as_deref()
    }

    #[must_use]
    pub const fn is_secure(&self) -> bool {
        self.secure
    }
}

fn header_str<B>(req: &Request<B>, name: header::HeaderName) -> Option<&str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}
