// Copyright (c) Sean Lawlor
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree.

//! Connection handshake
//!
//! After connecting to a peer, a node sends the fixed internal handshake
//! action and verifies the responder's cluster identity and protocol version
//! before the connection is considered usable. On a mismatch the just-made
//! connection is explicitly torn down and a
//! [TransportErr::HandshakeFailed] is surfaced.
//!
//! The handshake is a thin client of the dispatcher: it rides the ordinary
//! request/response correlation machinery and adds no state of its own.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::concurrency::Duration;
use crate::errors::{BoxError, TransportErr};
use crate::lanes;
use crate::node::NodeId;
use crate::registry::HandlerDescriptor;
use crate::service::{RequestOptions, TransportService};
use crate::transport::RequestHandler;

#[cfg(test)]
mod tests;

/// The reserved action name for the connection handshake
pub const HANDSHAKE_ACTION: &str = "internal:handshake";

/// Version of the node-to-node protocol. Peers must agree exactly
pub const PROTOCOL_VERSION: u32 = 1;

/// Identity a node announces during the handshake
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HandshakeRequest {
    /// The identity of the connecting node
    pub node: NodeId,
    /// The cluster the connecting node believes it belongs to
    pub cluster_name: String,
    /// The connecting node's protocol version
    pub protocol_version: u32,
}

/// Identity the responding node answers with
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HandshakeResponse {
    /// The identity of the responding node
    pub node: NodeId,
    /// The cluster the responding node belongs to
    pub cluster_name: String,
    /// The responding node's protocol version
    pub protocol_version: u32,
}

struct HandshakeHandler {
    local_node: NodeId,
    cluster_name: String,
}

#[async_trait]
impl RequestHandler for HandshakeHandler {
    async fn handle(&self, from: NodeId, payload: Bytes) -> Result<Bytes, BoxError> {
        let request: HandshakeRequest = bincode::deserialize(&payload)?;
        tracing::debug!(
            "Handshake from {from} announcing node {} of cluster '{}' (protocol v{})",
            request.node,
            request.cluster_name,
            request.protocol_version
        );
        let response = HandshakeResponse {
            node: self.local_node.clone(),
            cluster_name: self.cluster_name.clone(),
            protocol_version: PROTOCOL_VERSION,
        };
        Ok(Bytes::from(bincode::serialize(&response)?))
    }
}

/// Install the handshake responder into a service's registry. Called during
/// service construction
pub(crate) fn register_handshake_handler(service: &TransportService) {
    service.register_handler(HandlerDescriptor {
        action: HANDSHAKE_ACTION.to_string(),
        lane: lanes::INLINE.to_string(),
        force_execution: true,
        can_trip_admission_control: false,
        handler: Arc::new(HandshakeHandler {
            local_node: service.local_node().clone(),
            cluster_name: service.cluster_name().to_string(),
        }),
    });
}

impl TransportService {
    /// Connect to `node` and verify the peer's identity with a handshake.
    ///
    /// On success the verified [HandshakeResponse] is returned. Any
    /// verification failure (cluster-name mismatch when `check_cluster_name`
    /// is set, protocol version disagreement, or an undecodable reply) tears
    /// the fresh connection back down before surfacing
    /// [TransportErr::HandshakeFailed], so a subsequent connection attempt
    /// starts clean
    pub async fn connect_to_node_and_handshake(
        &self,
        node: &NodeId,
        timeout: Duration,
        check_cluster_name: bool,
    ) -> Result<HandshakeResponse, TransportErr> {
        self.connect_to_node(node).await?;

        let request = HandshakeRequest {
            node: self.local_node().clone(),
            cluster_name: self.cluster_name().to_string(),
            protocol_version: PROTOCOL_VERSION,
        };
        let payload = match bincode::serialize(&request) {
            Ok(encoded) => Bytes::from(encoded),
            Err(reason) => return Err(TransportErr::SendFailure(reason)),
        };

        let outcome = self
            .submit_request(
                node,
                HANDSHAKE_ACTION,
                payload,
                RequestOptions::with_timeout(timeout),
            )
            .await;

        let response = match outcome {
            Ok(raw) => match bincode::deserialize::<HandshakeResponse>(&raw) {
                Ok(response) => response,
                Err(reason) => {
                    return self
                        .fail_handshake(node, format!("undecodable handshake reply '{reason}'"))
                        .await;
                }
            },
            Err(error) => {
                // the request itself failed, nothing to verify
                let _ = self.disconnect_from_node(node).await;
                return Err(error);
            }
        };

        if response.protocol_version != PROTOCOL_VERSION {
            return self
                .fail_handshake(
                    node,
                    format!(
                        "peer {} speaks protocol v{}, expected v{}",
                        response.node, response.protocol_version, PROTOCOL_VERSION
                    ),
                )
                .await;
        }

        if check_cluster_name && response.cluster_name != self.cluster_name() {
            return self
                .fail_handshake(
                    node,
                    format!(
                        "peer {} belongs to cluster '{}', expected '{}'",
                        response.node,
                        response.cluster_name,
                        self.cluster_name()
                    ),
                )
                .await;
        }

        tracing::debug!(
            "Handshake with {} complete (cluster '{}', protocol v{})",
            response.node,
            response.cluster_name,
            response.protocol_version
        );
        Ok(response)
    }

    async fn fail_handshake(
        &self,
        node: &NodeId,
        reason: String,
    ) -> Result<HandshakeResponse, TransportErr> {
        tracing::warn!("Handshake with {node} failed: {reason}");
        if let Err(teardown) = self.disconnect_from_node(node).await {
            tracing::warn!("Failed to tear down connection to {node} '{teardown}'");
        }
        Err(TransportErr::HandshakeFailed(reason))
    }
}
