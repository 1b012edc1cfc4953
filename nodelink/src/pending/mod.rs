// Copyright (c) Sean Lawlor
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree.

//! Pending-request correlation table
//!
//! One correlation entry lives here per in-flight request. The atomic
//! remove-and-return of the underlying concurrent map is the single point of
//! truth for "has this request been resolved": every terminal path (response,
//! timeout, send failure, disconnect sweep, shutdown drain) competes for the
//! removal, and only the winner gets to invoke the handler.
//!
//! A bounded cache of [TimedOutRequest] records is kept purely so that a very
//! late response can still be logged with useful context.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use lru::LruCache;
use parking_lot::Mutex;

use crate::concurrency::{Instant, JoinHandle};
use crate::lanes::LaneName;
use crate::node::NodeId;
use crate::transport::ResponseHandler;

#[cfg(test)]
mod tests;

/// Correlation key between an outbound send and its inbound
/// response/timeout/error. Allocated atomically, strictly increasing, never
/// reused for the lifetime of the service
pub type RequestId = u64;

/// Number of timed-out request records retained for diagnosing late responses
const TIMED_OUT_HISTORY_CAPACITY: usize = 100;

/// The live record linking an outstanding request id to its handler and
/// bookkeeping
pub(crate) struct CorrelationEntry {
    pub(crate) request_id: RequestId,
    pub(crate) node: NodeId,
    pub(crate) action: String,
    pub(crate) handler: Box<dyn ResponseHandler>,
    /// Armed only after the entry is inserted. Aborting is advisory, a
    /// firing already past its pending-table re-read cannot be retracted
    pub(crate) timeout_task: Option<JoinHandle<()>>,
    pub(crate) lane: LaneName,
    /// The caller's context at send time, restored before the handler runs
    pub(crate) span: tracing::Span,
    pub(crate) sent_at: Instant,
}

impl std::fmt::Debug for CorrelationEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorrelationEntry")
            .field("request_id", &self.request_id)
            .field("node", &self.node)
            .field("action", &self.action)
            .finish()
    }
}

/// Diagnostic-only record of a request whose timeout won the race
#[derive(Clone, Debug)]
pub struct TimedOutRequest {
    /// The id of the timed-out request
    pub request_id: RequestId,
    /// The node the request was addressed to
    pub node: NodeId,
    /// The action that was requested
    pub action: String,
    /// When the request was dispatched
    pub sent_at: Instant,
    /// When the timeout fired
    pub timed_out_at: Instant,
}

/// The concurrent table of in-flight requests plus the bounded forensic
/// history of timed-out ones
pub(crate) struct PendingRequests {
    counter: AtomicU64,
    entries: DashMap<RequestId, CorrelationEntry>,
    timed_out: Mutex<LruCache<RequestId, TimedOutRequest>>,
}

impl PendingRequests {
    pub(crate) fn new() -> Self {
        let capacity = NonZeroUsize::new(TIMED_OUT_HISTORY_CAPACITY)
            .expect("timed-out history capacity is non-zero");
        Self {
            counter: AtomicU64::new(0),
            entries: DashMap::new(),
            timed_out: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Allocate the next request id
    pub(crate) fn next_request_id(&self) -> RequestId {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Register a new in-flight request. Ids are allocator-unique so this
    /// never displaces a live entry
    pub(crate) fn insert(&self, entry: CorrelationEntry) {
        self.entries.insert(entry.request_id, entry);
    }

    /// Atomically remove and return the entry for `request_id`, if it is
    /// still pending. This is the exactly-once rendezvous: whichever caller
    /// receives `Some` owns the handler invocation
    pub(crate) fn remove(&self, request_id: RequestId) -> Option<CorrelationEntry> {
        self.entries.remove(&request_id).map(|(_, entry)| entry)
    }

    /// Attach the armed timeout task to an already-inserted entry. Returns
    /// `false` if the entry resolved in the meantime, in which case the
    /// caller should abort the task itself
    pub(crate) fn attach_timeout(&self, request_id: RequestId, task: JoinHandle<()>) -> bool {
        match self.entries.get_mut(&request_id) {
            Some(mut entry) => {
                entry.timeout_task = Some(task);
                true
            }
            None => false,
        }
    }

    /// Clone the fields needed for a forensic record without removing the
    /// entry. The shard guard is dropped before this returns
    pub(crate) fn snapshot_for_timeout(
        &self,
        request_id: RequestId,
    ) -> Option<(NodeId, String, Instant)> {
        self.entries
            .get(&request_id)
            .map(|entry| (entry.node.clone(), entry.action.clone(), entry.sent_at))
    }

    /// Record that a timeout won the race for `request_id`. Oldest records
    /// are evicted once the bounded capacity is exceeded
    pub(crate) fn record_timed_out(&self, record: TimedOutRequest) {
        self.timed_out.lock().put(record.request_id, record);
    }

    /// Retract a forensic record written by a timeout firing that then lost
    /// the removal race
    pub(crate) fn retract_timed_out(&self, request_id: RequestId) {
        self.timed_out.lock().pop(&request_id);
    }

    /// Consume the forensic record for `request_id`, if one exists. Used to
    /// explain a late response for an id that is no longer pending
    pub(crate) fn take_timed_out(&self, request_id: RequestId) -> Option<TimedOutRequest> {
        self.timed_out.lock().pop(&request_id)
    }

    /// Ids of all pending requests addressed to `node`
    pub(crate) fn ids_for_node(&self, node: &NodeId) -> Vec<RequestId> {
        self.entries
            .iter()
            .filter(|entry| entry.node == *node)
            .map(|entry| entry.request_id)
            .collect()
    }

    /// Ids of every pending request. Each is still resolved through
    /// [PendingRequests::remove] so a concurrent completion stays
    /// exactly-once
    pub(crate) fn ids(&self) -> Vec<RequestId> {
        self.entries.iter().map(|entry| entry.request_id).collect()
    }

    /// Number of in-flight requests
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
