// Copyright (c) Sean Lawlor
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree.

//! Tests for the action handler registry

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use super::{ActionRegistry, HandlerDescriptor};
use crate::errors::BoxError;
use crate::lanes;
use crate::node::NodeId;
use crate::transport::RequestHandler;

struct TaggedHandler {
    tag: &'static str,
}

#[async_trait]
impl RequestHandler for TaggedHandler {
    async fn handle(&self, _from: NodeId, _payload: Bytes) -> Result<Bytes, BoxError> {
        Ok(Bytes::from_static(self.tag.as_bytes()))
    }
}

fn descriptor(action: &str, tag: &'static str) -> HandlerDescriptor {
    HandlerDescriptor {
        action: action.to_string(),
        lane: lanes::INLINE.to_string(),
        force_execution: false,
        can_trip_admission_control: true,
        handler: Arc::new(TaggedHandler { tag }),
    }
}

fn test_node() -> NodeId {
    NodeId::new("127.0.0.1:9300".parse().unwrap(), 1)
}

#[tokio::test]
async fn test_lookup_returns_registered_handler() {
    let registry = ActionRegistry::new();
    assert!(registry.lookup("cluster:ping").is_none());

    registry.register(descriptor("cluster:ping", "pong"));

    let found = registry.lookup("cluster:ping").expect("Handler not found");
    assert_eq!(found.action, "cluster:ping");
    let reply = found
        .handler
        .handle(test_node(), Bytes::new())
        .await
        .expect("Handler failed");
    assert_eq!(reply, Bytes::from_static(b"pong"));
}

#[tokio::test]
async fn test_replacement_activates_second_handler() {
    let registry = ActionRegistry::new();
    registry.register(descriptor("cluster:ping", "first"));
    // a collision is logged as a diagnostic, never an error
    registry.register(descriptor("cluster:ping", "second"));

    let found = registry.lookup("cluster:ping").expect("Handler not found");
    let reply = found
        .handler
        .handle(test_node(), Bytes::new())
        .await
        .expect("Handler failed");
    assert_eq!(reply, Bytes::from_static(b"second"));
}

#[test]
fn test_unregister_removes_by_name() {
    let registry = ActionRegistry::new();
    registry.register(descriptor("cluster:ping", "pong"));
    registry.register(descriptor("cluster:state", "state"));

    registry.unregister("cluster:ping");

    assert!(registry.lookup("cluster:ping").is_none());
    assert!(registry.lookup("cluster:state").is_some());

    // unregistering an unknown action is a no-op
    registry.unregister("cluster:unknown");
    assert!(registry.lookup("cluster:state").is_some());
}

#[test]
fn test_snapshots_are_isolated_from_later_writes() {
    let registry = ActionRegistry::new();
    registry.register(descriptor("cluster:ping", "pong"));

    let before = registry.lookup("cluster:ping").expect("Handler not found");
    registry.unregister("cluster:ping");

    // the reader's snapshot is unaffected by the concurrent removal
    assert_eq!(before.action, "cluster:ping");
    assert!(registry.lookup("cluster:ping").is_none());
}
