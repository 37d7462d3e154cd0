//! # Batching JSON-RPC Client
//!
//! A JSON-RPC 2.0 client for high call volumes against a single endpoint, such as
//! a blockchain node. Requests are packed into batches of at most
//! `max_batch_size` and the batches are sent over at most `max_connections`
//! concurrent HTTP exchanges.
//!
//! ## Features
//!
//! - **Batching**: one HTTP POST carries a JSON array of up to `max_batch_size` requests
//! - **Bounded concurrency**: `min(max_connections, batches)` workers per call
//! - **Partial failure**: a failed exchange becomes a payload for that batch only
//! - **Raw or decoded**: take the raw bodies, or decoded responses with undecoded results
//! - **Cancellation**: every call has a `*_with_cancel` variant
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use jrc_client::{BatchClientBuilder, JsonRpcRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = BatchClientBuilder::new()
//!         .with_endpoint("http://localhost:8545")
//!         .with_max_connections(8)
//!         .with_max_batch_size(100)
//!         .build()?;
//!
//!     let requests: Vec<_> = (0..1_000)
//!         .map(|n| {
//!             JsonRpcRequest::new_with_array_params(
//!                 n,
//!                 "eth_getBlockByNumber",
//!                 vec![format!("{:#x}", n).into(), false.into()],
//!             )
//!         })
//!         .collect();
//!
//!     for response in client.execute(requests).await? {
//!         println!("{} -> {:?}", response.id, response.raw_result());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Ordering
//!
//! Batches complete in whatever order the endpoint answers them. Within a batch the
//! server's order is kept, but across batches it is arrival order. Match responses
//! to requests by `id`.

pub mod batch;
pub mod client;
pub mod config;
pub mod decode;
pub mod dispatch;
pub mod error;
pub mod prelude;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types
pub use client::{BatchClient, BatchClientBuilder, ClientOption};
pub use config::{ClientConfig, ConnectionConfig, TimeoutConfig};
pub use dispatch::RawPayload;
pub use error::{BatchClientError, BatchClientResult, ConfigError, DecodeError, TransportError};

// Re-export transport types
pub use transport::{BatchTransport, HttpTransport, TransportResponse};

// Re-export protocol types for convenience
pub use jrc_json_rpc::{
    JsonRpcErrorCode, JsonRpcErrorObject, JsonRpcRequest, JsonRpcResponse, RequestId,
    RequestParams, ResultError,
};

pub use tokio_util::sync::CancellationToken;
