//! Transmission RPC envelope handling over HTTP.
//!
//! This module is the client side of the Transmission daemon's JSON RPC
//! protocol. It knows nothing about individual methods; it only wraps calls
//! in envelopes, keeps the session identifier current and checks responses.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐   HttpRequest    ┌──────────────────┐    HTTP POST    ┌──────────────┐
//! │   RpcClient     │ ───────────────► │  HttpTransport   │ ──────────────► │ transmission │
//! │ (envelope+retry)│ ◄─────────────── │ (ReqwestTransport│ ◄────────────── │   daemon     │
//! └─────────────────┘   HttpResponse   └──────────────────┘                 └──────────────┘
//! ```
//!
//! # Protocol
//!
//! ```text
//! POST /transmission/rpc
//! X-Transmission-Session-Id: <id, once known>
//!
//! {"method":"session-get","arguments":{},"tag":3141592653}
//! ```
//!
//! A daemon that does not recognise the session identifier answers `409 Conflict`
//! with a fresh `X-Transmission-Session-Id` header; the client stores it and resends.
//!
//! # Usage
//!
//! ```ignore
//! use transmission_rpc::rpc::RpcClient;
//! use transmission_rpc::ClientConfig;
//!
//! let client = RpcClient::from_config(ClientConfig::load()?);
//! let response = client.call("session-stats", None).await?;
//! ```

mod client;
mod retry;
mod transport;

pub use client::{ProtocolError, RpcClient, RpcError};
pub use retry::{AttemptOutcome, RetryDecision, RetryPolicy, DEFAULT_MAX_ATTEMPTS};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError};
