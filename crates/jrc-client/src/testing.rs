//! In-memory transport for engine tests

use async_trait::async_trait;
use jrc_json_rpc::JsonRpcRequest;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

use crate::error::TransportError;
use crate::transport::{BatchTransport, TransportResponse};

/// Answers every request with its method name as the result, optionally after a
/// delay. Any batch containing [`ScriptedTransport::FAIL_METHOD`] fails as a
/// refused connection, and one containing [`ScriptedTransport::PANIC_METHOD`]
/// panics mid-exchange. Tracks how many exchanges run at once.
#[derive(Debug, Default)]
pub(crate) struct ScriptedTransport {
    delay: Option<Duration>,
    stall: bool,
    calls: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
}

struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ScriptedTransport {
    pub const FAIL_METHOD: &'static str = "fail";
    pub const PANIC_METHOD: &'static str = "panic";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Every exchange hangs until its future is dropped
    pub fn stalled() -> Self {
        Self {
            stall: true,
            ..Self::default()
        }
    }

    pub fn failure_text() -> String {
        TransportError::ConnectionFailed("connection refused".to_string()).to_string()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn peak_active(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BatchTransport for ScriptedTransport {
    async fn exchange(
        &self,
        _endpoint: &Url,
        body: Vec<u8>,
    ) -> Result<TransportResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now_active, Ordering::SeqCst);
        let _guard = ActiveGuard(&self.active);

        if self.stall {
            std::future::pending::<()>().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let batch: Vec<JsonRpcRequest> = serde_json::from_slice(&body)?;
        if batch.iter().any(|r| r.method == Self::PANIC_METHOD) {
            panic!("scripted transport panicked on batch of {}", batch.len());
        }
        if batch.iter().any(|r| r.method == Self::FAIL_METHOD) {
            return Err(TransportError::ConnectionFailed(
                "connection refused".to_string(),
            ));
        }

        let responses: Vec<_> = batch
            .iter()
            .map(|r| json!({"jsonrpc": "2.0", "id": r.id, "result": r.method}))
            .collect();
        Ok(TransportResponse::ok(serde_json::to_vec(&responses)?))
    }
}
