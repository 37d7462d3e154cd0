//! Transport layer for batch exchanges
//!
//! The batching engine only needs one operation from a transport: POST a JSON body
//! to an endpoint and hand back the status and (decompressed) body.
//! Keep-alive, TLS and gzip are the transport's business.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use url::Url;

use crate::error::TransportError;

pub mod http;

pub use http::HttpTransport;

/// Transport response containing status and body
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body, already decompressed and owned by the caller
    pub body: Bytes,
}

impl TransportResponse {
    /// Create a new transport response
    pub fn new(status: u16, body: Bytes) -> Self {
        Self { status, body }
    }

    /// Create a 200 response
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport trait for batch exchanges.
///
/// Implementations are shared by every worker of every dispatch cycle, so one
/// instance must tolerate concurrent `exchange` calls.
#[async_trait]
pub trait BatchTransport: Send + Sync + std::fmt::Debug {
    /// POST one serialized batch to `endpoint` and wait for the full response
    async fn exchange(&self, endpoint: &Url, body: Vec<u8>)
    -> Result<TransportResponse, TransportError>;
}

/// Type alias for a shared transport
pub type SharedTransport = Arc<dyn BatchTransport>;
