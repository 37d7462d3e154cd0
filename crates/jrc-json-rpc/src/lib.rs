//! # JSON-RPC 2.0 Envelope Types
//!
//! The request, response and error envelopes exchanged with a JSON-RPC 2.0 endpoint.
//! This crate holds no transport code; it only describes what goes over the wire.
//!
//! ## Features
//! - Requests with positional or named parameters (`params` omitted when absent)
//! - Responses that keep `result` undecoded so callers pick their own target type
//! - The standard JSON-RPC 2.0 error code table
//!
//! Batches are plain JSON arrays of these envelopes, so `Vec<JsonRpcRequest>` and
//! `Vec<JsonRpcResponse>` serialize to and from the batch wire format directly.

pub mod error;
pub mod request;
pub mod response;
pub mod types;

// Re-export main types
pub use error::{JsonRpcErrorCode, JsonRpcErrorObject};
pub use request::{JsonRpcRequest, RequestParams};
pub use response::{JsonRpcResponse, ResultError};
pub use types::{JsonRpcVersion, RequestId};

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC 2.0 error codes
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    // Server error range: -32099 to -32000
    pub const SERVER_ERROR_START: i64 = -32099;
    pub const SERVER_ERROR_END: i64 = -32000;
}
