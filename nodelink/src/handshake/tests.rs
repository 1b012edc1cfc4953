// Copyright (c) Sean Lawlor
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree.

//! Tests for the connection handshake

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use super::{HandshakeRequest, HandshakeResponse, HANDSHAKE_ACTION, PROTOCOL_VERSION};
use crate::concurrency::Duration;
use crate::errors::{BoxError, TransportErr};
use crate::lanes;
use crate::memory::{MemoryNetwork, MemoryTransport};
use crate::node::NodeId;
use crate::service::{RequestOptions, TransportService, TransportSettings};
use crate::transport::RequestHandler;

fn test_node(uid: u64) -> NodeId {
    NodeId::new(format!("127.0.0.1:{}", 9300 + uid).parse().unwrap(), uid)
}

async fn memory_service(network: &MemoryNetwork, uid: u64, cluster: &str) -> TransportService {
    let node = test_node(uid);
    let transport = Arc::new(MemoryTransport::new(network.clone(), node.clone()));
    let service = TransportService::new(TransportSettings::new(node, cluster), transport);
    service.start().await.expect("Failed to start service");
    service.accept_incoming_requests();
    service
}

#[tokio::test(flavor = "multi_thread")]
async fn test_handshake_with_matching_peer() {
    let network = MemoryNetwork::new();
    let alpha = memory_service(&network, 1, "test-cluster").await;
    let beta = memory_service(&network, 2, "test-cluster").await;

    let response = alpha
        .connect_to_node_and_handshake(beta.local_node(), Duration::from_secs(5), true)
        .await
        .expect("Handshake failed");
    assert_eq!(&response.node, beta.local_node());
    assert_eq!(response.cluster_name, "test-cluster");
    assert_eq!(response.protocol_version, PROTOCOL_VERSION);

    alpha.close().await;
    beta.close().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_handshake_cluster_mismatch_tears_down_connection() {
    let network = MemoryNetwork::new();
    let alpha = memory_service(&network, 1, "test-cluster").await;
    let stranger = memory_service(&network, 2, "other-cluster").await;

    let outcome = alpha
        .connect_to_node_and_handshake(stranger.local_node(), Duration::from_secs(5), true)
        .await;
    assert!(matches!(outcome, Err(TransportErr::HandshakeFailed(_))));

    // no residual connection: an ordinary request now fails at the wire
    let send_outcome = alpha
        .submit_request(
            stranger.local_node(),
            "test:any",
            Bytes::new(),
            RequestOptions::default(),
        )
        .await;
    assert!(matches!(send_outcome, Err(TransportErr::SendFailure(_))));

    // a fresh attempt starts clean and succeeds when the check is waived
    let response = alpha
        .connect_to_node_and_handshake(stranger.local_node(), Duration::from_secs(5), false)
        .await
        .expect("Unchecked handshake failed");
    assert_eq!(response.cluster_name, "other-cluster");

    alpha.close().await;
    stranger.close().await;
}

/// Answers handshakes with an incompatible protocol version
struct AncientHandshakeHandler {
    local_node: NodeId,
    cluster_name: String,
}

#[async_trait]
impl RequestHandler for AncientHandshakeHandler {
    async fn handle(&self, _from: NodeId, payload: Bytes) -> Result<Bytes, BoxError> {
        let _request: HandshakeRequest = bincode::deserialize(&payload)?;
        let response = HandshakeResponse {
            node: self.local_node.clone(),
            cluster_name: self.cluster_name.clone(),
            protocol_version: PROTOCOL_VERSION + 1,
        };
        Ok(Bytes::from(bincode::serialize(&response)?))
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_handshake_version_mismatch_fails() {
    let network = MemoryNetwork::new();
    let alpha = memory_service(&network, 1, "test-cluster").await;
    let relic = memory_service(&network, 2, "test-cluster").await;

    // replace the built-in responder with one speaking a newer protocol
    relic.register_request_handler(
        HANDSHAKE_ACTION,
        lanes::INLINE,
        Arc::new(AncientHandshakeHandler {
            local_node: relic.local_node().clone(),
            cluster_name: "test-cluster".to_string(),
        }),
    );

    let outcome = alpha
        .connect_to_node_and_handshake(relic.local_node(), Duration::from_secs(5), true)
        .await;
    assert!(matches!(outcome, Err(TransportErr::HandshakeFailed(_))));

    alpha.close().await;
    relic.close().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_handshake_with_unreachable_node_fails() {
    let network = MemoryNetwork::new();
    let alpha = memory_service(&network, 1, "test-cluster").await;
    let ghost = test_node(9);

    let outcome = alpha
        .connect_to_node_and_handshake(&ghost, Duration::from_secs(1), true)
        .await;
    assert!(matches!(outcome, Err(TransportErr::SendFailure(_))));

    alpha.close().await;
}
