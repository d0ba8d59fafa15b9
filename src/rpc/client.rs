//! Session-aware RPC client.
//!
//! This module provides `RpcClient`, an async client that wraps calls in the
//! Transmission request envelope, performs the 409 session-identifier
//! handshake, and validates the response envelope before handing it back.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, trace};
use url::Url;

use crate::config::{ClientConfig, Credentials};
use crate::models::{Arguments, RpcRequest, RpcResponse, SESSION_ID_HEADER};
use crate::rpc::retry::{AttemptOutcome, RetryDecision, RetryPolicy};
use crate::rpc::transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError};

/// Envelope-level failures reported by a well-formed response.
///
/// Always terminal: a call that hits one of these is never resent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The daemon answered with a `result` other than `"success"`.
    #[error("RPC call failed: {0}")]
    Failure(String),

    /// The response tag does not correlate with the request.
    #[error("Tag mismatch: sent {expected}, received {actual}")]
    TagMismatch { expected: u32, actual: i64 },
}

/// Errors returned by [`RpcClient::call`].
#[derive(Debug, Error)]
pub enum RpcError {
    /// Network failure or HTTP error status, including an exhausted 409 handshake.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The response envelope signalled failure.
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The response body is not a valid envelope.
    #[error("Failed to parse response: {0}")]
    Decode(#[source] serde_json::Error),

    /// The request arguments could not be serialized.
    #[error("Failed to serialize request: {0}")]
    Encode(#[source] serde_json::Error),
}

impl RpcError {
    pub fn is_protocol(&self) -> bool {
        matches!(self, RpcError::Protocol(_))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, RpcError::Transport(_))
    }

    /// HTTP status behind a transport failure, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            RpcError::Transport(err) => err.status(),
            _ => None,
        }
    }
}

/// RPC session against a single endpoint.
///
/// The client owns an [`HttpTransport`] rather than being one, and exposes
/// `call` as its only way onto the wire. The session identifier learned from
/// a 409 response is kept behind a lock, so one client can be shared across
/// tasks (wrap it in an `Arc`).
///
/// # Session Lifecycle
///
/// - No identifier at construction
/// - First 409 stores the identifier from `X-Transmission-Session-Id`
/// - Every later request carries it
/// - A later 409 overwrites it (server-side rotation)
///
/// # Example
///
/// ```ignore
/// use transmission_rpc::{ClientConfig, RpcClient};
///
/// let client = RpcClient::from_config(ClientConfig::load()?);
///
/// let session = client.call("session-get", None).await?;
/// println!("{:?}", session.arguments.get("version"));
/// ```
pub struct RpcClient {
    /// RPC endpoint.
    url: Url,
    /// Credentials passed through to the transport.
    credentials: Option<Credentials>,
    /// Default per-call timeout.
    timeout: Duration,
    /// HTTP capability used for every attempt.
    transport: Arc<dyn HttpTransport>,
    /// Attempt budget for the 409 handshake.
    retry: RetryPolicy,
    /// Session identifier learned from the daemon, kept as received.
    session_id: RwLock<Option<HeaderValue>>,
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("url", &self.url.as_str())
            .field("credentials", &self.credentials)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl RpcClient {
    /// Create a client using the default `reqwest` transport.
    pub fn from_config(config: ClientConfig) -> Self {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()))
    }

    /// Create a client on top of a custom transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            url: config.url,
            credentials: config.credentials,
            timeout: config.timeout,
            transport,
            retry: RetryPolicy::default(),
            session_id: RwLock::new(None),
        }
    }

    /// Replace the retry policy (default: 3 attempts).
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the default per-call timeout.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Current session identifier, if one has been learned.
    ///
    /// Returns `None` for an identifier that is not visible ASCII.
    pub async fn session_id(&self) -> Option<String> {
        self.session_id
            .read()
            .await
            .as_ref()
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    }

    /// Perform one RPC call.
    ///
    /// This method:
    /// 1. Wraps `method` and `arguments` (default `{}`) in an envelope with a random tag
    /// 2. POSTs it with the current session identifier, if any
    /// 3. On HTTP 409, adopts the new identifier and resends (up to 3 attempts total)
    /// 4. Validates `result` and the echoed tag
    ///
    /// # Errors
    ///
    /// - `RpcError::Transport` for network failures, non-409 error statuses,
    ///   or a 409 on the final attempt
    /// - `RpcError::Protocol` when `result != "success"` or the tag does not match
    /// - `RpcError::Decode` when the body is not a valid response envelope
    ///
    /// Only the 409 handshake is retried.
    pub async fn call(
        &self,
        method: &str,
        arguments: Option<Arguments>,
    ) -> Result<RpcResponse, RpcError> {
        self.call_with_timeout(method, arguments, self.timeout).await
    }

    /// Like [`call`](Self::call), with an explicit per-attempt deadline.
    pub async fn call_with_timeout(
        &self,
        method: &str,
        arguments: Option<Arguments>,
        timeout: Duration,
    ) -> Result<RpcResponse, RpcError> {
        let mut request = RpcRequest::new(method, arguments);
        let mut attempts = 0;

        loop {
            attempts += 1;
            let outcome = self.attempt(&request, timeout).await;

            match self.retry.decide(attempts, &outcome) {
                RetryDecision::Retry => {
                    debug!(
                        method,
                        attempt = attempts,
                        max_attempts = self.retry.max_attempts(),
                        "Session renewal requested, resending"
                    );
                    request.renew_tag();
                }
                RetryDecision::Stop => return outcome.into_result(),
            }
        }
    }

    /// Call and decode the response arguments into `T`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// #[derive(Deserialize)]
    /// struct Stats { #[serde(rename = "torrentCount")] torrent_count: u64 }
    ///
    /// let stats: Stats = client.call_typed("session-stats", None).await?;
    /// ```
    pub async fn call_typed<T: DeserializeOwned>(
        &self,
        method: &str,
        arguments: Option<Arguments>,
    ) -> Result<T, RpcError> {
        self.call(method, arguments)
            .await?
            .into_arguments()
            .map_err(RpcError::Decode)
    }

    /// Run a single attempt and classify what happened.
    async fn attempt(&self, request: &RpcRequest, timeout: Duration) -> AttemptOutcome {
        let http_request = match self.build_http_request(request, timeout).await {
            Ok(http_request) => http_request,
            Err(e) => return AttemptOutcome::TransportFailure(e),
        };

        trace!(method = %request.method, tag = request.tag, "Sending RPC request");

        let response = match self.transport.post(http_request).await {
            Ok(response) => response,
            Err(e) => return AttemptOutcome::TransportFailure(RpcError::Transport(e)),
        };

        if response.status == StatusCode::CONFLICT {
            return self.renew_session(&response).await;
        }

        if response.status.is_client_error() || response.status.is_server_error() {
            return AttemptOutcome::TransportFailure(RpcError::Transport(status_error(&response)));
        }

        check_envelope(&response.body, request.tag)
    }

    async fn build_http_request(
        &self,
        request: &RpcRequest,
        timeout: Duration,
    ) -> Result<HttpRequest, RpcError> {
        let body = serde_json::to_vec(request).map_err(RpcError::Encode)?;

        let mut headers = HeaderMap::new();
        if let Some(id) = self.session_id.read().await.as_ref() {
            headers.insert(SESSION_ID_HEADER, id.clone());
        }

        Ok(HttpRequest {
            url: self.url.clone(),
            headers,
            body,
            credentials: self.credentials.clone(),
            timeout,
        })
    }

    /// Store the identifier carried by a 409 response.
    async fn renew_session(&self, response: &HttpResponse) -> AttemptOutcome {
        let Some(id) = response.headers.get(SESSION_ID_HEADER) else {
            return AttemptOutcome::TransportFailure(RpcError::Transport(
                TransportError::MissingSessionId,
            ));
        };

        *self.session_id.write().await = Some(id.clone());
        debug!("Adopted new session identifier");

        AttemptOutcome::SessionRenewal(status_error(response))
    }
}

fn status_error(response: &HttpResponse) -> TransportError {
    TransportError::Status {
        status: response.status,
        body: String::from_utf8_lossy(&response.body).into_owned(),
    }
}

/// Parse and validate a response envelope for the request tagged `tag`.
fn check_envelope(body: &[u8], tag: u32) -> AttemptOutcome {
    let response: RpcResponse = match serde_json::from_slice(body) {
        Ok(response) => response,
        Err(e) => return AttemptOutcome::TransportFailure(RpcError::Decode(e)),
    };

    if !response.is_success() {
        return AttemptOutcome::ProtocolFailure(ProtocolError::Failure(response.result));
    }

    if response.tag != i64::from(tag) {
        return AttemptOutcome::ProtocolFailure(ProtocolError::TagMismatch {
            expected: tag,
            actual: response.tag,
        });
    }

    AttemptOutcome::Success(response)
}
