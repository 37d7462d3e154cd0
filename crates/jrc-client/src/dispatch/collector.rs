//! Fan-in of raw payloads from the worker pool

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use super::RawPayload;

/// Spawn the collector for one dispatch cycle.
///
/// The task drains `receiver` in arrival order and yields the full sequence once
/// every sender has been dropped.
pub(crate) fn spawn(receiver: mpsc::UnboundedReceiver<RawPayload>) -> JoinHandle<Vec<RawPayload>> {
    tokio::spawn(collect(receiver))
}

async fn collect(mut receiver: mpsc::UnboundedReceiver<RawPayload>) -> Vec<RawPayload> {
    let mut payloads = Vec::new();
    while let Some(payload) = receiver.recv().await {
        payloads.push(payload);
    }
    debug!(payloads = payloads.len(), "Collector channel closed");
    payloads
}
