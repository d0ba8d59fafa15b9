//! Envelope models for the Transmission RPC protocol.
//!
//! Every call is wrapped in a request envelope carrying the method name, its
//! arguments and a random correlation tag. The daemon answers with a response
//! envelope echoing the tag alongside a `result` string and its own arguments.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Header carrying the session identifier in both directions.
pub const SESSION_ID_HEADER: &str = "X-Transmission-Session-Id";

/// `result` value signalling a successful call.
pub const RESULT_SUCCESS: &str = "success";

/// Argument mapping sent with a request or returned in a response.
pub type Arguments = Map<String, Value>;

/// Request envelope: `{"method", "arguments", "tag"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Method name, opaque to the client.
    pub method: String,
    /// Method arguments; `{}` when the caller supplies none.
    pub arguments: Arguments,
    /// Correlation tag echoed back by the daemon.
    pub tag: u32,
}

impl RpcRequest {
    /// Build a request with a freshly drawn random tag.
    pub fn new(method: impl Into<String>, arguments: Option<Arguments>) -> Self {
        Self {
            method: method.into(),
            arguments: arguments.unwrap_or_default(),
            tag: rand::random::<u32>(),
        }
    }

    /// Draw a new tag for a resend of the same call.
    pub fn renew_tag(&mut self) {
        self.tag = rand::random::<u32>();
    }
}

/// Response envelope: `{"result", "tag", "arguments"}`.
///
/// All three fields are required; a body missing any of them fails to parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    /// `"success"` or an application-level error message.
    pub result: String,
    /// Tag of the request this response answers.
    ///
    /// Decoded as a signed integer so an out-of-range echo is reported as a
    /// tag mismatch rather than a malformed body.
    pub tag: i64,
    /// Result arguments.
    pub arguments: Arguments,
}

impl RpcResponse {
    /// Check whether the daemon reported success.
    pub fn is_success(&self) -> bool {
        self.result == RESULT_SUCCESS
    }

    /// Decode the response arguments into a typed value.
    pub fn into_arguments<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.arguments))
    }
}
