// Copyright (c) Sean Lawlor
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree.

//! Seams between the correlation core and its collaborators
//!
//! The correlation core never talks to sockets itself. Byte movement is the
//! job of a [Transport] implementation, which is handed a
//! [crate::service::TransportAdapter] on startup and feeds inbound traffic
//! back through it.

use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::{BoxError, TransportErr};
use crate::node::NodeId;
use crate::service::{RequestId, RequestOptions, TransportAdapter};

/// The byte-moving collaborator of the correlation core.
///
/// Implementations are expected to enqueue outbound work rather than block
/// [Transport::send_request] on socket I/O; a caller observing the method
/// return knows only that dispatch was attempted.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Start the transport, wiring inbound traffic to the given adapter
    async fn start(&self, adapter: TransportAdapter) -> Result<(), BoxError>;

    /// Stop accepting and delivering traffic
    async fn stop(&self) -> Result<(), BoxError>;

    /// Release all resources. Must be idempotent
    async fn close(&self) -> Result<(), BoxError>;

    /// Deliver a request to a remote node. An `Err` here is treated as a
    /// terminal send failure for the request
    async fn send_request(
        &self,
        node: &NodeId,
        request_id: RequestId,
        action: &str,
        payload: Bytes,
        options: &RequestOptions,
    ) -> Result<(), BoxError>;

    /// Open a connection to the given node
    async fn connect_to_node(&self, node: &NodeId) -> Result<(), BoxError>;

    /// Tear down the connection to the given node
    async fn disconnect_from_node(&self, node: &NodeId) -> Result<(), BoxError>;
}

/// The reply path for one inbound request.
///
/// Consuming `self` makes a double reply unrepresentable.
#[async_trait]
pub trait ResponseChannel: Send + 'static {
    /// Send a successful response back to the requesting node
    async fn send_response(self: Box<Self>, payload: Bytes) -> Result<(), BoxError>;

    /// Send a failure back to the requesting node
    async fn send_error(self: Box<Self>, error: TransportErr) -> Result<(), BoxError>;
}

/// A registered handler for inbound requests under one action name
#[async_trait]
pub trait RequestHandler: Send + Sync + 'static {
    /// Process one inbound request, producing the response payload
    async fn handle(&self, from: NodeId, payload: Bytes) -> Result<Bytes, BoxError>;
}

/// The caller-side callback for one outbound request.
///
/// Exactly one of [ResponseHandler::on_response] or
/// [ResponseHandler::on_failure] is invoked, exactly once, whichever terminal
/// path wins. The consuming receivers make a second delivery unrepresentable.
pub trait ResponseHandler: Send + Sync + 'static {
    /// The request completed with a response payload
    fn on_response(self: Box<Self>, payload: Bytes);

    /// The request resolved with a terminal error
    fn on_failure(self: Box<Self>, error: TransportErr);
}

impl<F> ResponseHandler for F
where
    F: FnOnce(Result<Bytes, TransportErr>) + Send + Sync + 'static,
{
    fn on_response(self: Box<Self>, payload: Bytes) {
        (*self)(Ok(payload))
    }

    fn on_failure(self: Box<Self>, error: TransportErr) {
        (*self)(Err(error))
    }
}

/// Observer of node connection lifecycle events.
///
/// Notifications are fanned out asynchronously; a slow listener cannot block
/// its siblings or the disconnect sweep.
pub trait ConnectionListener: Send + Sync + 'static {
    /// A connection to `node` was established
    fn on_node_connected(&self, node: &NodeId);

    /// The connection to `node` was lost or torn down
    fn on_node_disconnected(&self, node: &NodeId);
}
