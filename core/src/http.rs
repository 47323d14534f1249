//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. `PocketClient` builds
//! `HttpRequest` values and parses `HttpResponse` values without touching the
//! network. Whoever drives a `SavesRetriever` supplies a `Transport` that
//! performs the actual round-trip, so the core stays deterministic and the
//! tests can substitute a recording fake.

use crate::error::ApiError;

/// HTTP method for a request. Every Pocket v3 call is a POST; `Get` is kept
/// for hosts that probe the browser-facing authorize page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// An HTTP response described as plain data.
///
/// Constructed by the transport after executing an `HttpRequest`, then handed
/// to the matching `PocketClient::parse_*` method.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Executes one request/response round-trip.
///
/// Non-2xx statuses must come back as `Ok(HttpResponse)`; status
/// interpretation belongs to the parsers. `Err` is reserved for failures to
/// complete the exchange at all (DNS, TLS, connection reset).
pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_ignores_case() {
        let response = HttpResponse {
            status: 403,
            headers: vec![("x-error-code".to_string(), "158".to_string())],
            body: String::new(),
        };
        assert_eq!(response.header("X-Error-Code"), Some("158"));
        assert_eq!(response.header("X-Error"), None);
    }
}
