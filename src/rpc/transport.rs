//! HTTP transport seam.
//!
//! The RPC client only needs "POST a body, get status + headers + body back".
//! `HttpTransport` captures that capability so the client can be driven by
//! `reqwest` in production and by scripted transports in tests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

use crate::config::Credentials;

/// Transport-level failures.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request never produced an HTTP response.
    #[error("Connection failed: {0}")]
    Network(String),

    /// No response within the per-call deadline.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The daemon answered with an HTTP error status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// Response status code
        status: StatusCode,
        /// Response body, lossily decoded, for diagnostics
        body: String,
    },

    /// A 409 response did not carry a usable session identifier.
    #[error("HTTP 409 response without a X-Transmission-Session-Id header")]
    MissingSessionId,
}

impl TransportError {
    /// HTTP status of the failure, if the daemon responded at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this is the 409 session-renewal signal.
    pub fn is_session_conflict(&self) -> bool {
        self.status() == Some(StatusCode::CONFLICT)
    }
}

/// A single outgoing POST.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub credentials: Option<Credentials>,
    pub timeout: Duration,
}

/// The raw HTTP answer, before any envelope handling.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Look up a header (case-insensitive) as a string.
    ///
    /// Returns `None` if the header is absent or not visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

/// Capability to POST a request and return the raw response.
///
/// Implementations must not retry and must not treat error statuses as
/// failures: every HTTP response, including 4xx/5xx, is returned as `Ok`.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// `HttpTransport` backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client (TLS, proxies, pooling are its concern).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let timeout = request.timeout;

        let mut builder = self
            .client
            .post(request.url)
            .headers(request.headers)
            .header(CONTENT_TYPE, "application/json")
            .timeout(timeout)
            .body(request.body);

        builder = match request.credentials {
            Some(Credentials::Basic { username, password }) => {
                builder.basic_auth(username, password)
            }
            Some(Credentials::Bearer(token)) => builder.bearer_auth(token),
            None => builder,
        };

        let response = builder
            .send()
            .await
            .map_err(|e| classify_error(e, timeout))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| classify_error(e, timeout))?
            .to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn classify_error(err: reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(timeout)
    } else {
        TransportError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SESSION_ID_HEADER;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert(SESSION_ID_HEADER, HeaderValue::from_static("abc123"));
        let response = HttpResponse {
            status: StatusCode::CONFLICT,
            headers,
            body: Vec::new(),
        };

        assert_eq!(response.header("x-transmission-session-id"), Some("abc123"));
        assert_eq!(response.header(SESSION_ID_HEADER), Some("abc123"));
        assert_eq!(response.header("X-Other"), None);
    }

    #[test]
    fn test_transport_error_display() {
        let status_err = TransportError::Status {
            status: StatusCode::UNAUTHORIZED,
            body: "Unauthorized User".to_string(),
        };
        assert_eq!(status_err.to_string(), "HTTP 401 Unauthorized: Unauthorized User");

        let missing = TransportError::MissingSessionId;
        assert_eq!(
            missing.to_string(),
            "HTTP 409 response without a X-Transmission-Session-Id header"
        );

        let timeout = TransportError::Timeout(Duration::from_secs(30));
        assert_eq!(timeout.to_string(), "Request timed out after 30s");
    }

    #[test]
    fn test_session_conflict_classification() {
        let conflict = TransportError::Status {
            status: StatusCode::CONFLICT,
            body: String::new(),
        };
        assert!(conflict.is_session_conflict());

        let server_error = TransportError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: String::new(),
        };
        assert!(!server_error.is_session_conflict());
        assert!(!TransportError::MissingSessionId.is_session_conflict());
        assert_eq!(TransportError::Network("refused".into()).status(), None);
    }
}
