//! Batch partitioning
//!
//! Requests are split into contiguous slices of at most `max_batch_size`, in
//! submission order. A [`Batch`] is a view into the shared request list, so
//! partitioning copies nothing.

use jrc_json_rpc::JsonRpcRequest;
use std::ops::Range;
use std::sync::Arc;

/// Split `len` items into contiguous ranges of at most `max_batch_size`.
///
/// Yields `ceil(len / max_batch_size)` ranges; only the last may be shorter.
/// `max_batch_size` must be positive, which configuration guarantees.
pub fn partition(len: usize, max_batch_size: usize) -> Vec<Range<usize>> {
    debug_assert!(max_batch_size > 0, "max_batch_size must be positive");
    (0..len)
        .step_by(max_batch_size.max(1))
        .map(|start| start..(start + max_batch_size).min(len))
        .collect()
}

/// One group of requests sent as a single HTTP exchange
#[derive(Debug, Clone)]
pub struct Batch {
    /// Position of this batch in submission order
    index: usize,
    requests: Arc<[JsonRpcRequest]>,
    range: Range<usize>,
}

impl Batch {
    pub(crate) fn new(index: usize, requests: Arc<[JsonRpcRequest]>, range: Range<usize>) -> Self {
        Self {
            index,
            requests,
            range,
        }
    }

    /// Position of this batch in submission order
    pub fn index(&self) -> usize {
        self.index
    }

    /// The requests in this batch, in submission order
    pub fn requests(&self) -> &[JsonRpcRequest] {
        &self.requests[self.range.clone()]
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Serialize the batch as a JSON-RPC 2.0 batch body (a JSON array)
    pub fn to_body(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self.requests())
    }
}

/// Partition shared requests into batches
pub fn batches(requests: &Arc<[JsonRpcRequest]>, max_batch_size: usize) -> Vec<Batch> {
    partition(requests.len(), max_batch_size)
        .into_iter()
        .enumerate()
        .map(|(index, range)| Batch::new(index, Arc::clone(requests), range))
        .collect()
}
