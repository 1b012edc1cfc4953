// Copyright (c) Sean Lawlor
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree.

//! In-memory transport
//!
//! Routes requests between [crate::service::TransportService]s living in the
//! same process without any sockets or serialization of the framing. Used to
//! exercise the full correlation machinery in tests and single-process
//! deployments.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::Mutex;

use crate::concurrency;
use crate::errors::{BoxError, TransportErr};
use crate::node::NodeId;
use crate::service::{RequestId, RequestOptions, TransportAdapter};
use crate::transport::{ResponseChannel, Transport};

/// A process-wide fabric connecting [MemoryTransport] endpoints
#[derive(Clone, Default)]
pub struct MemoryNetwork {
    peers: std::sync::Arc<DashMap<NodeId, TransportAdapter>>,
}

impl MemoryNetwork {
    /// Create an empty fabric
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, node: NodeId, adapter: TransportAdapter) {
        self.peers.insert(node, adapter);
    }

    fn deregister(&self, node: &NodeId) {
        self.peers.remove(node);
    }

    fn adapter_for(&self, node: &NodeId) -> Option<TransportAdapter> {
        self.peers.get(node).map(|entry| entry.value().clone())
    }
}

/// One node's endpoint on a [MemoryNetwork]
pub struct MemoryTransport {
    network: MemoryNetwork,
    local: NodeId,
    adapter: Mutex<Option<TransportAdapter>>,
    connected: DashMap<NodeId, ()>,
}

impl MemoryTransport {
    /// Create an endpoint for `local` on the given fabric
    pub fn new(network: MemoryNetwork, local: NodeId) -> Self {
        Self {
            network,
            local,
            adapter: Mutex::new(None),
            connected: DashMap::new(),
        }
    }

    fn adapter(&self) -> Result<TransportAdapter, BoxError> {
        self.adapter
            .lock()
            .clone()
            .ok_or_else(|| "Memory transport is not started".into())
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn start(&self, adapter: TransportAdapter) -> Result<(), BoxError> {
        self.network.register(self.local.clone(), adapter.clone());
        *self.adapter.lock() = Some(adapter);
        Ok(())
    }

    async fn stop(&self) -> Result<(), BoxError> {
        self.connected.clear();
        self.network.deregister(&self.local);
        Ok(())
    }

    async fn close(&self) -> Result<(), BoxError> {
        self.connected.clear();
        self.network.deregister(&self.local);
        *self.adapter.lock() = None;
        Ok(())
    }

    async fn send_request(
        &self,
        node: &NodeId,
        request_id: RequestId,
        action: &str,
        payload: Bytes,
        _options: &RequestOptions,
    ) -> Result<(), BoxError> {
        if !self.connected.contains_key(node) {
            return Err(format!("Not connected to node {node}").into());
        }
        let target = self
            .network
            .adapter_for(node)
            .ok_or_else(|| format!("Unknown node {node}"))?;
        let origin = self.adapter()?;
        let from = self.local.clone();
        let action = action.to_string();
        let channel = Box::new(MemoryResponseChannel { origin, request_id });
        // deliver off the sender's task, like bytes leaving through a socket
        concurrency::spawn(async move {
            target.add_bytes_received(payload.len() as u64);
            target
                .on_request_received(from, request_id, &action, payload, channel)
                .await;
        });
        Ok(())
    }

    async fn connect_to_node(&self, node: &NodeId) -> Result<(), BoxError> {
        if self.network.adapter_for(node).is_none() {
            return Err(format!("Unknown node {node}").into());
        }
        self.connected.insert(node.clone(), ());
        Ok(())
    }

    async fn disconnect_from_node(&self, node: &NodeId) -> Result<(), BoxError> {
        self.connected.remove(node);
        Ok(())
    }
}

/// Reply path carrying a response back to the requesting endpoint's adapter
struct MemoryResponseChannel {
    origin: TransportAdapter,
    request_id: RequestId,
}

#[async_trait]
impl ResponseChannel for MemoryResponseChannel {
    async fn send_response(self: Box<Self>, payload: Bytes) -> Result<(), BoxError> {
        self.origin.add_bytes_received(payload.len() as u64);
        self.origin.on_response_received(self.request_id, Ok(payload));
        Ok(())
    }

    async fn send_error(self: Box<Self>, error: TransportErr) -> Result<(), BoxError> {
        self.origin.on_response_received(self.request_id, Err(error));
        Ok(())
    }
}
