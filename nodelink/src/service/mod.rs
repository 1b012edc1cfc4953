// Copyright (c) Sean Lawlor
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree.

//! The transport service, which orchestrates request dispatch, response
//! correlation, timeouts and lifecycle
//!
//! ## Overview
//!
//! A [TransportService] issues outbound requests to remote or local cluster
//! members, tracks each in-flight request in the pending table, and delivers
//! exactly one terminal outcome (response, timeout, send failure, node
//! disconnect, or shutdown) to the caller's [ResponseHandler]. Requests
//! addressed to the service's own node take a zero-serialization loopback
//! path through the identical correlation bookkeeping.
//!
//! The service never holds a lock across a handler invocation or a transport
//! call. The single synchronization primitive carrying the exactly-once
//! guarantee is the atomic remove-and-return of the pending table: every
//! terminal path competes for the removal of the same entry and only the
//! winner invokes the handler.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::concurrency::{self, Duration, Instant};
use crate::errors::{BoxError, TransportErr};
use crate::lanes::{self, LaneName};
use crate::node::NodeId;
use crate::pending::{CorrelationEntry, PendingRequests, TimedOutRequest};
use crate::registry::{ActionRegistry, HandlerDescriptor};
use crate::transport::{
    ConnectionListener, RequestHandler, ResponseChannel, ResponseHandler, Transport,
};

pub use crate::pending::RequestId;


/// The lifecycle of a [TransportService]. States only ever advance
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LifecycleState {
    /// Constructed, transport not yet wired
    Created = 0,
    /// Transport started, outbound requests flowing
    Started = 1,
    /// The admission gate is released, inbound requests are processed
    AcceptingInbound = 2,
    /// Shutdown began, new sends are refused, the pending table is draining
    Stopping = 3,
    /// Every previously admitted request has been resolved
    Stopped = 4,
    /// Transport resources released
    Closed = 5,
}

impl LifecycleState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Created,
            1 => Self::Started,
            2 => Self::AcceptingInbound,
            3 => Self::Stopping,
            4 => Self::Stopped,
            _ => Self::Closed,
        }
    }
}

/// Forward-only atomic lifecycle state
struct Lifecycle(AtomicU8);

impl Lifecycle {
    fn new() -> Self {
        Self(AtomicU8::new(LifecycleState::Created as u8))
    }

    fn get(&self) -> LifecycleState {
        LifecycleState::from_u8(self.0.load(Ordering::SeqCst))
    }

    /// Advance to `to`, returning `true` if this call performed the
    /// transition. Never moves the state backwards
    fn advance(&self, to: LifecycleState) -> bool {
        let target = to as u8;
        let mut current = self.0.load(Ordering::SeqCst);
        while current < target {
            match self
                .0
                .compare_exchange(current, target, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
        false
    }
}

/// One-shot admission gate. Releasing it wakes every waiter, current and
/// future
struct Gate {
    sender: watch::Sender<bool>,
}

impl Gate {
    fn new() -> Self {
        let (sender, _receiver) = watch::channel(false);
        Self { sender }
    }

    fn open(&self) {
        self.sender.send_replace(true);
    }

    async fn wait(&self) {
        let mut receiver = self.sender.subscribe();
        if *receiver.borrow() {
            return;
        }
        while receiver.changed().await.is_ok() {
            if *receiver.borrow() {
                return;
            }
        }
    }
}

/// Per-request options, passed by value on every send
#[derive(Clone, Debug)]
pub struct RequestOptions {
    /// Deadline for the response. `None` means the request waits forever
    pub timeout: Option<Duration>,
    /// The lane the response handler runs on
    pub lane: LaneName,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            lane: lanes::INLINE.to_string(),
        }
    }
}

impl RequestOptions {
    /// Options with the given response deadline
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Default::default()
        }
    }
}

/// Static configuration of a [TransportService]
#[derive(Clone, Debug)]
pub struct TransportSettings {
    /// The identity of this node
    pub local_node: NodeId,
    /// The name of the cluster this node belongs to, verified during
    /// handshakes
    pub cluster_name: String,
    /// Action patterns to include in request tracing. Empty means all
    pub trace_include: Vec<String>,
    /// Action patterns excluded from request tracing
    pub trace_exclude: Vec<String>,
}

impl TransportSettings {
    /// Settings with the default trace patterns (everything except
    /// `internal:*` actions)
    pub fn new(local_node: NodeId, cluster_name: impl Into<String>) -> Self {
        Self {
            local_node,
            cluster_name: cluster_name.into(),
            trace_include: Vec::new(),
            trace_exclude: vec!["internal:*".to_string()],
        }
    }
}

struct ServiceInner {
    settings: TransportSettings,
    transport: Arc<dyn Transport>,
    registry: ActionRegistry,
    pending: PendingRequests,
    lifecycle: Lifecycle,
    accept_gate: Gate,
    listeners: Mutex<Vec<Arc<dyn ConnectionListener>>>,
    bytes_sent: AtomicU64,
    bytes_received: AtomicU64,
}

/// The request/response correlation core of the cluster transport layer.
/// Cheap to clone, all clones share the same service
#[derive(Clone)]
pub struct TransportService {
    inner: Arc<ServiceInner>,
}

impl TransportService {
    /// Construct a new service around the given transport collaborator. The
    /// internal handshake action is registered as part of construction
    pub fn new(settings: TransportSettings, transport: Arc<dyn Transport>) -> Self {
        let service = Self {
            inner: Arc::new(ServiceInner {
                settings,
                transport,
                registry: ActionRegistry::new(),
                pending: PendingRequests::new(),
                lifecycle: Lifecycle::new(),
                accept_gate: Gate::new(),
                listeners: Mutex::new(Vec::new()),
                bytes_sent: AtomicU64::new(0),
                bytes_received: AtomicU64::new(0),
            }),
        };
        crate::handshake::register_handshake_handler(&service);
        service
    }

    /// The identity of this node
    pub fn local_node(&self) -> &NodeId {
        &self.inner.settings.local_node
    }

    /// The cluster name this service answers handshakes with
    pub fn cluster_name(&self) -> &str {
        &self.inner.settings.cluster_name
    }

    /// The current lifecycle state
    pub fn state(&self) -> LifecycleState {
        self.inner.lifecycle.get()
    }

    /// Number of requests currently in flight
    pub fn pending_request_count(&self) -> usize {
        self.inner.pending.len()
    }

    /// Total payload bytes handed to the transport
    pub fn bytes_sent(&self) -> u64 {
        self.inner.bytes_sent.load(Ordering::Relaxed)
    }

    /// Total payload bytes received from the transport
    pub fn bytes_received(&self) -> u64 {
        self.inner.bytes_received.load(Ordering::Relaxed)
    }

    /// The inbound surface handed to the transport collaborator
    pub fn adapter(&self) -> TransportAdapter {
        TransportAdapter {
            service: self.clone(),
        }
    }

    // ------------------ lifecycle ------------------ //

    /// Start the service, wiring the transport to this service's adapter.
    /// A service can only be started once
    pub async fn start(&self) -> Result<(), BoxError> {
        if !self.inner.lifecycle.advance(LifecycleState::Started) {
            return Err("Transport service cannot be started more than once".into());
        }
        self.inner.transport.start(self.adapter()).await
    }

    /// Release the admission gate. Inbound request processing blocks until
    /// this is called; releasing wakes all current and future waiters
    pub fn accept_incoming_requests(&self) {
        self.inner.lifecycle.advance(LifecycleState::AcceptingInbound);
        self.inner.accept_gate.open();
    }

    /// Stop the service. The transport is stopped first, then every
    /// remaining pending request is drained with a [TransportErr::ServiceStopped]
    /// error, each handler scheduled on its own task so that handler code
    /// cannot deadlock the shutdown sequence. Idempotent
    pub async fn stop(&self) {
        if !self.inner.lifecycle.advance(LifecycleState::Stopping) {
            return;
        }
        if let Err(reason) = self.inner.transport.stop().await {
            tracing::warn!("Transport failed to stop cleanly '{reason}'");
        }
        let drained = self.inner.pending.ids();
        if !drained.is_empty() {
            tracing::debug!("Draining {} in-flight requests on shutdown", drained.len());
        }
        for request_id in drained {
            // a racing completion may still win any individual entry
            if let Some(entry) = self.inner.pending.remove(request_id) {
                deliver_failure(entry, TransportErr::ServiceStopped);
            }
        }
        self.inner.lifecycle.advance(LifecycleState::Stopped);
    }

    /// Stop if still running, then release the transport's resources.
    /// Idempotent
    pub async fn close(&self) {
        if self.state() == LifecycleState::Closed {
            return;
        }
        self.stop().await;
        if let Err(reason) = self.inner.transport.close().await {
            tracing::warn!("Transport failed to close cleanly '{reason}'");
        }
        self.inner.lifecycle.advance(LifecycleState::Closed);
    }

    // ------------------ handler registration ------------------ //

    /// Register a request handler for `action` running on `lane`, replacing
    /// any previous registration for the same action
    pub fn register_request_handler(
        &self,
        action: impl Into<String>,
        lane: impl Into<LaneName>,
        handler: Arc<dyn RequestHandler>,
    ) {
        self.register_handler(HandlerDescriptor {
            action: action.into(),
            lane: lane.into(),
            force_execution: false,
            can_trip_admission_control: true,
            handler,
        });
    }

    /// Register a fully-specified [HandlerDescriptor]
    pub fn register_handler(&self, descriptor: HandlerDescriptor) {
        self.inner.registry.register(descriptor);
    }

    /// Remove the handler registered for `action`, if any
    pub fn remove_handler(&self, action: &str) {
        self.inner.registry.unregister(action);
    }

    // ------------------ connection listeners ------------------ //

    /// Register an observer of node connect/disconnect events
    pub fn add_connection_listener(&self, listener: Arc<dyn ConnectionListener>) {
        self.inner.listeners.lock().push(listener);
    }

    /// Remove a previously registered observer
    pub fn remove_connection_listener(&self, listener: &Arc<dyn ConnectionListener>) {
        self.inner
            .listeners
            .lock()
            .retain(|existing| !Arc::ptr_eq(existing, listener));
    }

    /// Notify listeners that `node` connected, each on its own task
    pub fn on_node_connected(&self, node: &NodeId) {
        let listeners = self.inner.listeners.lock().clone();
        for listener in listeners {
            let node = node.clone();
            concurrency::spawn(async move {
                listener.on_node_connected(&node);
            });
        }
    }

    /// Notify listeners that `node` disconnected and resolve every pending
    /// request addressed to it with [TransportErr::NodeDisconnected]. Each
    /// listener notification and each entry resolution is scheduled on its
    /// own task, so one slow callback cannot block the sweep of the others
    pub fn on_node_disconnected(&self, node: &NodeId) {
        let listeners = self.inner.listeners.lock().clone();
        for listener in listeners {
            let node = node.clone();
            concurrency::spawn(async move {
                listener.on_node_disconnected(&node);
            });
        }

        for request_id in self.inner.pending.ids_for_node(node) {
            if let Some(entry) = self.inner.pending.remove(request_id) {
                deliver_failure(entry, TransportErr::NodeDisconnected(node.clone()));
            }
        }
    }

    // ------------------ connections ------------------ //

    /// Open a connection to `node`. Connecting to the local node is a no-op
    pub async fn connect_to_node(&self, node: &NodeId) -> Result<(), TransportErr> {
        if self.state() >= LifecycleState::Stopping {
            return Err(TransportErr::ServiceStopped);
        }
        if *node == self.inner.settings.local_node {
            return Ok(());
        }
        self.inner
            .transport
            .connect_to_node(node)
            .await
            .map_err(TransportErr::SendFailure)?;
        self.on_node_connected(node);
        Ok(())
    }

    /// Tear down the connection to `node` and sweep its pending requests
    pub async fn disconnect_from_node(&self, node: &NodeId) -> Result<(), TransportErr> {
        self.inner
            .transport
            .disconnect_from_node(node)
            .await
            .map_err(TransportErr::SendFailure)?;
        self.on_node_disconnected(node);
        Ok(())
    }

    // ------------------ outbound path ------------------ //

    /// Issue a request for `action` on `node`.
    ///
    /// The pending entry is registered before any dispatch is attempted, so a
    /// response racing ahead of the registration is impossible by
    /// construction. The call returns once dispatch was attempted; the
    /// outcome arrives through `handler`, exactly once, on the lane named in
    /// `options`. The caller's current [tracing::Span] is captured and
    /// restored around the handler invocation
    pub async fn send_request(
        &self,
        node: &NodeId,
        action: &str,
        payload: Bytes,
        options: RequestOptions,
        handler: Box<dyn ResponseHandler>,
    ) {
        let request_id = self.inner.pending.next_request_id();
        self.inner.pending.insert(CorrelationEntry {
            request_id,
            node: node.clone(),
            action: action.to_string(),
            handler,
            timeout_task: None,
            lane: options.lane.clone(),
            span: tracing::Span::current(),
            sent_at: Instant::now(),
        });

        if self.state() >= LifecycleState::Stopping {
            self.fail_request(request_id, TransportErr::ServiceStopped);
            return;
        }

        if let Some(timeout) = options.timeout {
            self.arm_timeout(request_id, timeout);
        }

        if self.should_trace(action) {
            tracing::trace!("[{request_id}][{action}] sent to {node}");
        }

        if *node == self.inner.settings.local_node {
            self.dispatch_local(request_id, action, payload);
        } else {
            self.inner
                .bytes_sent
                .fetch_add(payload.len() as u64, Ordering::Relaxed);
            if let Err(reason) = self
                .inner
                .transport
                .send_request(node, request_id, action, payload, &options)
                .await
            {
                self.fail_request(request_id, TransportErr::SendFailure(reason));
            }
        }
    }

    /// Issue a request and await its outcome. Convenience wrapper over
    /// [TransportService::send_request] backed by a oneshot channel
    pub async fn submit_request(
        &self,
        node: &NodeId,
        action: &str,
        payload: Bytes,
        options: RequestOptions,
    ) -> Result<Bytes, TransportErr> {
        let (sender, receiver) = concurrency::oneshot();
        let handler = Box::new(move |result: Result<Bytes, TransportErr>| {
            let _ = sender.send(result);
        });
        self.send_request(node, action, payload, options, handler)
            .await;
        match receiver.await {
            Ok(result) => result,
            // the handler can only be dropped un-invoked if the runtime tore
            // the delivery task down mid-shutdown
            Err(_) => Err(TransportErr::ServiceStopped),
        }
    }

    /// Resolve a request terminally with `error`, if it is still pending
    fn fail_request(&self, request_id: RequestId, error: TransportErr) {
        if let Some(entry) = self.inner.pending.remove(request_id) {
            deliver_failure(entry, error);
        }
    }

    fn arm_timeout(&self, request_id: RequestId, timeout: Duration) {
        let service = self.clone();
        let task = concurrency::spawn(async move {
            concurrency::sleep(timeout).await;
            service.fire_timeout(request_id);
        });
        let abort = task.abort_handle();
        if !self.inner.pending.attach_timeout(request_id, task) {
            // the request resolved before the timeout could be attached
            abort.abort();
        }
    }

    fn fire_timeout(&self, request_id: RequestId) {
        // the response may have beaten this firing, which is a silent no-op
        let (node, action, sent_at) = match self.inner.pending.snapshot_for_timeout(request_id) {
            Some(snapshot) => snapshot,
            None => return,
        };
        let timed_out_at = Instant::now();
        // record first, remove second: a response racing with this firing
        // finds its forensic context already written
        self.inner.pending.record_timed_out(TimedOutRequest {
            request_id,
            node: node.clone(),
            action: action.clone(),
            sent_at,
            timed_out_at,
        });
        match self.inner.pending.remove(request_id) {
            Some(entry) => {
                let elapsed = timed_out_at.duration_since(entry.sent_at);
                tracing::debug!(
                    "Request {request_id} to {node} for action '{action}' timed out after {}ms",
                    elapsed.as_millis()
                );
                deliver_failure(entry, TransportErr::Timeout { elapsed });
            }
            None => {
                // the response path won between the re-read and the removal
                self.inner.pending.retract_timed_out(request_id);
            }
        }
    }

    // ------------------ inbound path ------------------ //

    /// The single rendezvous point for inbound responses. Removes the
    /// pending entry for `request_id` and invokes its handler on the
    /// declared lane. A late or duplicate response for an id that is no
    /// longer pending is an expected, benign race: it is logged with
    /// whatever forensic context exists and dropped
    pub fn handle_response(&self, request_id: RequestId, result: Result<Bytes, TransportErr>) {
        match self.inner.pending.remove(request_id) {
            Some(mut entry) => {
                if let Some(task) = entry.timeout_task.take() {
                    // best effort, a firing already past its re-read cannot
                    // be retracted and will find the entry gone
                    task.abort();
                }
                if self.should_trace(&entry.action) {
                    tracing::trace!(
                        "[{request_id}][{}] received response from {}",
                        entry.action,
                        entry.node
                    );
                }
                match result {
                    Ok(payload) => {
                        let CorrelationEntry {
                            handler, span, lane, ..
                        } = entry;
                        lanes::submit(&lane, span, move || handler.on_response(payload));
                    }
                    Err(error) => deliver_failure(entry, error),
                }
            }
            None => self.log_unmatched_response(request_id),
        }
    }

    fn log_unmatched_response(&self, request_id: RequestId) {
        match self.inner.pending.take_timed_out(request_id) {
            Some(record) => {
                let overdue = record.timed_out_at.duration_since(record.sent_at);
                tracing::warn!(
                    "Received response for request {request_id} to {} for action '{}' that timed out after {}ms, dropping",
                    record.node,
                    record.action,
                    overdue.as_millis()
                );
            }
            None => {
                tracing::warn!("Received response for unknown request id {request_id}, dropping");
            }
        }
    }

    /// Process one inbound request. Blocks on the admission gate until the
    /// service accepts inbound traffic, then executes the registered handler
    /// on its declared lane, replying through `channel`. An unregistered
    /// action answers with [TransportErr::ActionNotFound]
    pub async fn handle_inbound_request(
        &self,
        from: NodeId,
        request_id: RequestId,
        action: &str,
        payload: Bytes,
        channel: Box<dyn ResponseChannel>,
    ) {
        self.inner.accept_gate.wait().await;
        if self.should_trace(action) {
            tracing::trace!("[{request_id}][{action}] received request from {from}");
        }
        match self.inner.registry.lookup(action) {
            None => {
                tracing::debug!("No handler registered for action '{action}' requested by {from}");
                if let Err(reason) = channel
                    .send_error(TransportErr::ActionNotFound(action.to_string()))
                    .await
                {
                    tracing::warn!(
                        "Failed to reply action-not-found for request {request_id} '{reason}'"
                    );
                }
            }
            Some(descriptor) => {
                let handler = descriptor.handler.clone();
                let action = action.to_string();
                let task = async move {
                    match handler.handle(from, payload).await {
                        Ok(response) => {
                            if let Err(reason) = channel.send_response(response).await {
                                tracing::warn!(
                                    "Failed to respond to request {request_id} '{reason}'"
                                );
                            }
                        }
                        Err(reason) => {
                            tracing::debug!("Handler for action '{action}' failed '{reason}'");
                            if let Err(reason) = channel
                                .send_error(TransportErr::RemoteFailure(reason.to_string()))
                                .await
                            {
                                tracing::warn!(
                                    "Failed to reply handler failure for request {request_id} '{reason}'"
                                );
                            }
                        }
                    }
                };
                lanes::run(&descriptor.lane, task).await;
            }
        }
    }

    /// Loopback dispatch for requests addressed to the local node. The
    /// request flows through the same inbound path and the same response
    /// rendezvous as a request that arrived over the wire, bound to the
    /// original request id by a synthetic in-process response channel. The
    /// body runs on its own task: a closed admission gate parks the request,
    /// never the sender
    fn dispatch_local(&self, request_id: RequestId, action: &str, payload: Bytes) {
        let channel = Box::new(LocalResponseChannel {
            service: self.clone(),
            request_id,
        });
        let service = self.clone();
        let from = self.inner.settings.local_node.clone();
        let action = action.to_string();
        concurrency::spawn(async move {
            service
                .handle_inbound_request(from, request_id, &action, payload, channel)
                .await;
        });
    }

    fn should_trace(&self, action: &str) -> bool {
        let include = &self.inner.settings.trace_include;
        let exclude = &self.inner.settings.trace_exclude;
        (include.is_empty() || include.iter().any(|pattern| simple_match(pattern, action)))
            && !exclude.iter().any(|pattern| simple_match(pattern, action))
    }
}

/// Resolve an entry with a terminal error, always scheduling the handler on
/// its own task so no caller of a terminal path ever runs handler code
/// inline on its own stack
fn deliver_failure(mut entry: CorrelationEntry, error: TransportErr) {
    if let Some(task) = entry.timeout_task.take() {
        task.abort();
    }
    let CorrelationEntry { handler, span, .. } = entry;
    concurrency::spawn(async move {
        span.in_scope(|| handler.on_failure(error));
    });
}

/// Glob-lite matching, `*` matches any (possibly empty) substring
fn simple_match(pattern: &str, value: &str) -> bool {
    match pattern.find('*') {
        None => pattern == value,
        Some(index) => {
            let head = &pattern[..index];
            let rest = &pattern[index + 1..];
            if !value.starts_with(head) {
                return false;
            }
            let remainder = &value[head.len()..];
            if rest.is_empty() {
                return true;
            }
            // skip offsets must land on char boundaries
            remainder
                .char_indices()
                .map(|(skip, _)| skip)
                .chain(std::iter::once(remainder.len()))
                .any(|skip| simple_match(rest, &remainder[skip..]))
        }
    }
}

/// The synthetic in-process reply path used by loopback requests. Responses
/// and errors funnel through the identical rendezvous used for wire replies
struct LocalResponseChannel {
    service: TransportService,
    request_id: RequestId,
}

#[async_trait]
impl ResponseChannel for LocalResponseChannel {
    async fn send_response(self: Box<Self>, payload: Bytes) -> Result<(), BoxError> {
        self.service.handle_response(self.request_id, Ok(payload));
        Ok(())
    }

    async fn send_error(self: Box<Self>, error: TransportErr) -> Result<(), BoxError> {
        self.service.handle_response(self.request_id, Err(error));
        Ok(())
    }
}

/// The inbound surface a [Transport] uses to feed traffic and connection
/// events back into the service
#[derive(Clone)]
pub struct TransportAdapter {
    service: TransportService,
}

impl TransportAdapter {
    /// Account payload bytes received from the wire
    pub fn add_bytes_received(&self, count: u64) {
        self.service
            .inner
            .bytes_received
            .fetch_add(count, Ordering::Relaxed);
    }

    /// Account payload bytes written to the wire
    pub fn add_bytes_sent(&self, count: u64) {
        self.service
            .inner
            .bytes_sent
            .fetch_add(count, Ordering::Relaxed);
    }

    /// An inbound request arrived for this node
    pub async fn on_request_received(
        &self,
        from: NodeId,
        request_id: RequestId,
        action: &str,
        payload: Bytes,
        channel: Box<dyn ResponseChannel>,
    ) {
        self.service
            .handle_inbound_request(from, request_id, action, payload, channel)
            .await;
    }

    /// An inbound response (or wire-level failure) arrived for `request_id`
    pub fn on_response_received(&self, request_id: RequestId, result: Result<Bytes, TransportErr>) {
        self.service.handle_response(request_id, result);
    }

    /// Look up the handler registered for `action`
    pub fn request_handler(&self, action: &str) -> Option<Arc<HandlerDescriptor>> {
        self.service.inner.registry.lookup(action)
    }

    /// The transport observed a connection to `node` being established
    pub fn on_node_connected(&self, node: &NodeId) {
        self.service.on_node_connected(node);
    }

    /// The transport observed the connection to `node` dropping
    pub fn on_node_disconnected(&self, node: &NodeId) {
        self.service.on_node_disconnected(node);
    }
}

impl std::fmt::Debug for TransportService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportService")
            .field("local_node", &self.inner.settings.local_node)
            .field("cluster_name", &self.inner.settings.cluster_name)
            .field("state", &self.state())
            .field("pending", &self.inner.pending.len())
            .finish()
    }
}
