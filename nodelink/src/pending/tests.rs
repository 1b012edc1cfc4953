// Copyright (c) Sean Lawlor
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree.

//! Tests for the pending-request table

use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;

use super::{CorrelationEntry, PendingRequests, TimedOutRequest};
use crate::concurrency::Instant;
use crate::errors::TransportErr;
use crate::lanes;
use crate::node::NodeId;

fn test_node(uid: u64) -> NodeId {
    NodeId::new("127.0.0.1:9300".parse().unwrap(), uid)
}

fn test_entry(request_id: u64, node: NodeId) -> CorrelationEntry {
    CorrelationEntry {
        request_id,
        node,
        action: "test:action".to_string(),
        handler: Box::new(|_result: Result<Bytes, TransportErr>| {}),
        timeout_task: None,
        lane: lanes::INLINE.to_string(),
        span: tracing::Span::current(),
        sent_at: Instant::now(),
    }
}

#[test]
fn test_id_allocation_is_injective_under_concurrency() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 1000;

    let pending = Arc::new(PendingRequests::new());
    let mut joins = Vec::new();
    for _ in 0..THREADS {
        let pending = pending.clone();
        joins.push(std::thread::spawn(move || {
            (0..PER_THREAD)
                .map(|_| pending.next_request_id())
                .collect::<Vec<_>>()
        }));
    }

    let mut seen = HashSet::new();
    for join in joins {
        for id in join.join().expect("Allocator thread panicked") {
            assert!(id > 0);
            assert!(seen.insert(id), "Request id {id} allocated twice");
        }
    }
    assert_eq!(seen.len(), THREADS * PER_THREAD);
}

#[test]
fn test_remove_is_exactly_once() {
    let pending = Arc::new(PendingRequests::new());
    let id = pending.next_request_id();
    pending.insert(test_entry(id, test_node(1)));

    let mut winners = 0;
    let mut joins = Vec::new();
    for _ in 0..4 {
        let pending = pending.clone();
        joins.push(std::thread::spawn(move || pending.remove(id).is_some()));
    }
    for join in joins {
        if join.join().expect("Removal thread panicked") {
            winners += 1;
        }
    }

    assert_eq!(winners, 1, "Exactly one terminal path may win the entry");
    assert_eq!(pending.len(), 0);
}

#[test]
fn test_ids_for_node_filters_by_target() {
    let pending = PendingRequests::new();
    let near = test_node(1);
    let far = test_node(2);

    let mut near_ids = HashSet::new();
    for _ in 0..3 {
        let id = pending.next_request_id();
        pending.insert(test_entry(id, near.clone()));
        near_ids.insert(id);
    }
    for _ in 0..2 {
        let id = pending.next_request_id();
        pending.insert(test_entry(id, far.clone()));
    }

    let swept = pending.ids_for_node(&near);
    assert_eq!(swept.len(), 3);
    assert!(swept.iter().all(|id| near_ids.contains(id)));
    assert_eq!(pending.len(), 5);
}

#[test]
fn test_attach_timeout_fails_for_resolved_entry() {
    let pending = PendingRequests::new();
    let id = pending.next_request_id();
    pending.insert(test_entry(id, test_node(1)));
    assert!(pending.remove(id).is_some());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("Failed to build runtime");
    let task = {
        let _guard = runtime.enter();
        crate::concurrency::spawn(async {})
    };
    assert!(!pending.attach_timeout(id, task));
}

#[test]
fn test_timed_out_history_is_bounded_and_consumed() {
    let pending = PendingRequests::new();
    let node = test_node(1);
    for id in 1..=150u64 {
        let now = Instant::now();
        pending.record_timed_out(TimedOutRequest {
            request_id: id,
            node: node.clone(),
            action: "test:action".to_string(),
            sent_at: now,
            timed_out_at: now,
        });
    }

    // capacity is 100, the oldest records were evicted first
    assert!(pending.take_timed_out(1).is_none());
    assert!(pending.take_timed_out(50).is_none());

    // a lookup consumes the record
    assert!(pending.take_timed_out(150).is_some());
    assert!(pending.take_timed_out(150).is_none());
}

#[test]
fn test_retract_removes_forensic_record() {
    let pending = PendingRequests::new();
    let now = Instant::now();
    pending.record_timed_out(TimedOutRequest {
        request_id: 7,
        node: test_node(1),
        action: "test:action".to_string(),
        sent_at: now,
        timed_out_at: now,
    });

    pending.retract_timed_out(7);
    assert!(pending.take_timed_out(7).is_none());
}
