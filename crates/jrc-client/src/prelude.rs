//! # Batching Client Prelude
//!
//! Convenient re-exports of the most commonly used types.
//!
//! ```rust
//! use jrc_client::prelude::*;
//! ```

// Core client types
pub use crate::client::{BatchClient, BatchClientBuilder, ClientOption};
pub use crate::config::{ClientConfig, TimeoutConfig};
pub use crate::dispatch::RawPayload;
pub use crate::error::{BatchClientError, BatchClientResult};

// Transport types
pub use crate::transport::{BatchTransport, HttpTransport};

// Protocol types
pub use jrc_json_rpc::{JsonRpcRequest, JsonRpcResponse, RequestId};

pub use tokio_util::sync::CancellationToken;
pub use std::time::Duration;
