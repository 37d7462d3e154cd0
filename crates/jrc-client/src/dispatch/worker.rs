//! Worker loop: pull a batch, exchange it, forward the raw payload

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use super::{CompletionTracker, RawPayload};
use crate::batch::Batch;
use crate::transport::{BatchTransport, SharedTransport};

/// Receiving half of the dispatch channel, shared by all workers of one cycle
pub(crate) type BatchQueue = Arc<Mutex<mpsc::Receiver<Batch>>>;

/// Everything one worker needs for the lifetime of a dispatch cycle
pub(crate) struct Worker {
    pub id: usize,
    pub transport: SharedTransport,
    pub endpoint: Arc<Url>,
    pub queue: BatchQueue,
    pub results: mpsc::UnboundedSender<RawPayload>,
    pub tracker: CompletionTracker,
    pub cancel: CancellationToken,
}

impl Worker {
    /// Process batches until the dispatch channel is closed and drained, or the
    /// cycle is cancelled.
    pub async fn run(self) {
        let mut processed = 0usize;

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                batch = async { self.queue.lock().await.recv().await } => batch,
            };
            let Some(batch) = next else {
                break;
            };
            let completion = self.tracker.complete_on_drop();

            let payload = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                payload = exchange_batch(self.id, self.transport.as_ref(), &self.endpoint, &batch) => payload,
            };

            // Forward before marking done so the payload is already queued when the
            // tracker reaches zero.
            if self.results.send(payload).is_err() {
                debug!(worker = self.id, "Collector closed, dropping payload");
            }
            drop(completion);
            processed += 1;
        }

        debug!(worker = self.id, processed, "Worker exiting");
    }
}

/// Perform one exchange for `batch`, folding any failure into a payload
pub(crate) async fn exchange_batch(
    worker: usize,
    transport: &dyn BatchTransport,
    endpoint: &Url,
    batch: &Batch,
) -> RawPayload {
    let start_time = Instant::now();

    let body = match batch.to_body() {
        Ok(body) => body,
        Err(e) => {
            warn!(worker, batch = batch.index(), error = %e, "Failed to encode batch");
            return RawPayload::TransportFailed(crate::error::TransportError::Encode(e).to_string());
        }
    };

    match transport.exchange(endpoint, body).await {
        Ok(response) => {
            if !response.is_success() {
                warn!(
                    worker,
                    batch = batch.index(),
                    status = response.status,
                    "Batch answered with non-success status, forwarding body as-is"
                );
            }
            debug!(
                worker,
                batch = batch.index(),
                requests = batch.len(),
                bytes = response.body.len(),
                elapsed_ms = start_time.elapsed().as_millis(),
                "Batch exchange completed"
            );
            RawPayload::Body(response.body)
        }
        Err(e) => {
            warn!(
                worker,
                batch = batch.index(),
                requests = batch.len(),
                error = %e,
                "Batch exchange failed"
            );
            RawPayload::TransportFailed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::batches;
    use crate::testing::ScriptedTransport;
    use jrc_json_rpc::JsonRpcRequest;

    fn endpoint() -> Url {
        Url::parse("http://127.0.0.1:8545").unwrap()
    }

    #[tokio::test]
    async fn test_exchange_batch_success_forwards_body() {
        let transport = ScriptedTransport::new();
        let requests: Arc<[JsonRpcRequest]> =
            vec![JsonRpcRequest::new_no_params(1, "eth_chainId")].into();
        let batch = &batches(&requests, 10)[0];

        let payload = exchange_batch(0, &transport, &endpoint(), batch).await;
        let RawPayload::Body(body) = payload else {
            panic!("expected body payload");
        };
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value[0]["id"], 1);
        assert_eq!(value[0]["result"], "eth_chainId");
    }

    #[tokio::test]
    async fn test_exchange_batch_failure_becomes_text_payload() {
        let transport = ScriptedTransport::new();
        let requests: Arc<[JsonRpcRequest]> =
            vec![JsonRpcRequest::new_no_params(1, ScriptedTransport::FAIL_METHOD)].into();
        let batch = &batches(&requests, 10)[0];

        let payload = exchange_batch(3, &transport, &endpoint(), batch).await;
        assert_eq!(
            payload,
            RawPayload::TransportFailed(ScriptedTransport::failure_text())
        );
    }

    #[tokio::test]
    async fn test_worker_exits_when_queue_closed() {
        let transport: SharedTransport = Arc::new(ScriptedTransport::new());
        let requests: Arc<[JsonRpcRequest]> = (0..4)
            .map(|i| JsonRpcRequest::new_no_params(i, "eth_blockNumber"))
            .collect();

        let (batch_tx, batch_rx) = mpsc::channel(1);
        let (results_tx, mut results_rx) = mpsc::unbounded_channel();
        let tracker = CompletionTracker::new();
        let worker = Worker {
            id: 0,
            transport,
            endpoint: Arc::new(endpoint()),
            queue: Arc::new(Mutex::new(batch_rx)),
            results: results_tx,
            tracker: tracker.clone(),
            cancel: CancellationToken::new(),
        };
        let handle = tokio::spawn(worker.run());

        for batch in batches(&requests, 2) {
            tracker.add();
            batch_tx.send(batch).await.unwrap();
        }
        drop(batch_tx);

        handle.await.unwrap();
        assert_eq!(tracker.outstanding(), 0);

        let mut received = 0;
        while results_rx.recv().await.is_some() {
            received += 1;
        }
        assert_eq!(received, 2);
    }

    #[tokio::test]
    async fn test_panicking_exchange_still_completes_batch() {
        let transport: SharedTransport = Arc::new(ScriptedTransport::new());
        let requests: Arc<[JsonRpcRequest]> =
            vec![JsonRpcRequest::new_no_params(1, ScriptedTransport::PANIC_METHOD)].into();

        let (batch_tx, batch_rx) = mpsc::channel(1);
        let (results_tx, _results_rx) = mpsc::unbounded_channel();
        let tracker = CompletionTracker::new();
        let worker = Worker {
            id: 0,
            transport,
            endpoint: Arc::new(endpoint()),
            queue: Arc::new(Mutex::new(batch_rx)),
            results: results_tx,
            tracker: tracker.clone(),
            cancel: CancellationToken::new(),
        };
        let handle = tokio::spawn(worker.run());

        tracker.add();
        batch_tx.send(batches(&requests, 1).remove(0)).await.unwrap();

        assert!(handle.await.unwrap_err().is_panic());
        assert_eq!(tracker.outstanding(), 0);
    }
}
