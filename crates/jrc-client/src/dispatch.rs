//! The dispatch cycle: fan batches out to a bounded worker pool and fan the raw
//! payloads back in.
//!
//! Every piece of cycle state (dispatch channel, collector channel, completion
//! tracker, workers) is created by [`run_cycle`] and gone when it returns, so
//! concurrent cycles on one client never share anything but the transport.
//!
//! Order of a cycle:
//! 1. partition requests and spawn `min(max_connections, batches)` workers
//! 2. register each batch with the tracker, then enqueue it
//! 3. close the dispatch channel so idle workers exit
//! 4. wait for the tracker to reach zero, then join the workers
//! 5. drop the last collector sender and take the collected payloads
//!
//! A worker that dies mid-cycle stops its siblings and fails the cycle with
//! [`BatchClientError::Internal`].

use bytes::Bytes;
use jrc_json_rpc::JsonRpcRequest;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::batch::{self, Batch};
use crate::error::{BatchClientError, BatchClientResult};
use crate::transport::SharedTransport;

mod collector;
mod tracker;
mod worker;

pub use tracker::CompletionTracker;

use worker::Worker;

/// One collected result of a batch exchange.
///
/// Collected in arrival order, which need not match submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawPayload {
    /// The exchange completed; the (decompressed) response body
    Body(Bytes),
    /// The exchange failed; the transport's description of the failure
    TransportFailed(String),
}

impl RawPayload {
    /// The body bytes, or the failure text as bytes
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            RawPayload::Body(body) => body,
            RawPayload::TransportFailed(message) => message.as_bytes(),
        }
    }

    pub fn is_transport_failure(&self) -> bool {
        matches!(self, RawPayload::TransportFailed(_))
    }

    /// The response body if the exchange completed
    pub fn body(&self) -> Option<&Bytes> {
        match self {
            RawPayload::Body(body) => Some(body),
            RawPayload::TransportFailed(_) => None,
        }
    }
}

/// Limits read from the client configuration at the start of a cycle
#[derive(Debug, Clone, Copy)]
pub(crate) struct CycleLimits {
    pub max_connections: usize,
    pub max_batch_size: usize,
}

/// What a finished cycle produced
#[derive(Debug)]
pub(crate) struct CycleOutcome {
    pub payloads: Vec<RawPayload>,
    pub batches: usize,
    pub workers: usize,
}

/// Run one dispatch cycle over `requests`.
pub(crate) async fn run_cycle(
    transport: SharedTransport,
    endpoint: Arc<Url>,
    requests: Arc<[JsonRpcRequest]>,
    limits: CycleLimits,
    cancel: CancellationToken,
) -> BatchClientResult<CycleOutcome> {
    let batches = batch::batches(&requests, limits.max_batch_size);
    if batches.is_empty() {
        return Ok(CycleOutcome {
            payloads: Vec::new(),
            batches: 0,
            workers: 0,
        });
    }

    let batch_count = batches.len();
    let worker_count = limits.max_connections.min(batch_count);
    debug!(
        requests = requests.len(),
        batches = batch_count,
        workers = worker_count,
        "Starting dispatch cycle"
    );

    // Capacity 1: the producer stays at most one batch ahead of the workers.
    let (batch_tx, batch_rx) = mpsc::channel::<Batch>(1);
    let (payload_tx, payload_rx) = mpsc::unbounded_channel();
    let queue = Arc::new(Mutex::new(batch_rx));
    let tracker = CompletionTracker::new();
    let collector = collector::spawn(payload_rx);

    // Workers stop on caller cancellation, or when a sibling worker dies.
    let stop = cancel.child_token();
    let mut workers = JoinSet::new();
    for id in 0..worker_count {
        workers.spawn(
            Worker {
                id,
                transport: Arc::clone(&transport),
                endpoint: Arc::clone(&endpoint),
                queue: Arc::clone(&queue),
                results: payload_tx.clone(),
                tracker: tracker.clone(),
                cancel: stop.clone(),
            }
            .run(),
        );
    }
    drop(queue);

    let mut failure = None;
    for batch in batches {
        tracker.add();
        let sent = tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            Some(Err(e)) = workers.join_next() => {
                failure = Some(e);
                false
            }
            sent = batch_tx.send(batch) => sent.is_ok(),
        };
        if !sent {
            tracker.done();
            break;
        }
    }
    drop(batch_tx);

    while failure.is_none() {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tracker.wait() => break,
            joined = workers.join_next() => match joined {
                Some(Ok(())) => {}
                Some(Err(e)) => failure = Some(e),
                None => break,
            },
        }
    }

    if failure.is_some() {
        stop.cancel();
    }
    while let Some(joined) = workers.join_next().await {
        if let Err(e) = joined {
            stop.cancel();
            failure.get_or_insert(e);
        }
    }

    drop(payload_tx);
    let payloads = collector
        .await
        .map_err(|e| BatchClientError::internal(format!("collector task failed: {}", e)))?;

    if let Some(e) = failure {
        warn!(error = %e, "Dispatch cycle aborted by a failed worker");
        return Err(BatchClientError::internal(format!("worker task failed: {}", e)));
    }

    if cancel.is_cancelled() {
        debug!(collected = payloads.len(), "Dispatch cycle cancelled");
        return Err(BatchClientError::Cancelled);
    }

    debug!(payloads = payloads.len(), "Dispatch cycle completed");
    Ok(CycleOutcome {
        payloads,
        batches: batch_count,
        workers: worker_count,
    })
}
