//! Transmission RPC client library.
//!
//! - `rpc` - session-aware envelope client and its HTTP transport seam
//! - `models` - request/response envelopes
//! - `config` - endpoint, credentials and timeout resolution
//!
//! ```ignore
//! use transmission_rpc::{ClientConfig, RpcClient};
//!
//! let client = RpcClient::from_config(ClientConfig::load()?);
//! let response = client.call("session-get", None).await?;
//! ```

pub mod config;
pub mod models;
pub mod rpc;

pub use config::{ClientConfig, ConfigError, Credentials};
pub use models::{Arguments, RpcRequest, RpcResponse};
pub use rpc::{ProtocolError, RpcClient, RpcError};
