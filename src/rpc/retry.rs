//! Attempt classification and the bounded retry decision.
//!
//! Every attempt is reduced to an [`AttemptOutcome`]. The only outcome that
//! may be retried is a 409 session renewal, and only while the attempt
//! budget lasts. Everything else ends the call.

use crate::models::RpcResponse;
use crate::rpc::client::{ProtocolError, RpcError};
use crate::rpc::transport::TransportError;

/// Total attempts per call, including the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Classified result of a single attempt.
#[derive(Debug)]
pub enum AttemptOutcome {
    /// Well-formed, successful, tag-correlated response.
    Success(RpcResponse),
    /// HTTP 409; the new session identifier has already been stored.
    SessionRenewal(TransportError),
    /// Envelope-level failure: non-success `result` or tag mismatch.
    ProtocolFailure(ProtocolError),
    /// Any other failure (network, HTTP status, malformed body).
    TransportFailure(RpcError),
}

impl AttemptOutcome {
    /// Convert the outcome into what `call` returns.
    pub fn into_result(self) -> Result<RpcResponse, RpcError> {
        match self {
            AttemptOutcome::Success(response) => Ok(response),
            AttemptOutcome::SessionRenewal(err) => Err(RpcError::Transport(err)),
            AttemptOutcome::ProtocolFailure(err) => Err(RpcError::Protocol(err)),
            AttemptOutcome::TransportFailure(err) => Err(err),
        }
    }
}

/// What to do after an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    Stop,
}

/// Retry only on session renewal, up to a fixed number of attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl RetryPolicy {
    /// Create a policy allowing `max_attempts` total attempts (at least one).
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decide whether to attempt again after `attempts_made` attempts.
    pub fn decide(&self, attempts_made: u32, outcome: &AttemptOutcome) -> RetryDecision {
        match outcome {
            AttemptOutcome::SessionRenewal(_) if attempts_made < self.max_attempts => {
                RetryDecision::Retry
            }
            _ => RetryDecision::Stop,
        }
    }
}
