// Copyright (c) Sean Lawlor
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree.

//! Cluster member identity

use std::fmt::Display;
use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

/// Identifies a member of the cluster.
///
/// A [NodeId] is an immutable (address, unique-id) pair. Equality against the
/// service's own identity is what routes a request down the loopback path, and
/// equality against a disconnecting peer is what selects the pending requests
/// to sweep.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    addr: SocketAddr,
    uid: u64,
}

impl NodeId {
    /// Construct a new [NodeId] from a network address and a unique
    /// per-incarnation id
    pub fn new(addr: SocketAddr, uid: u64) -> Self {
        Self { addr, uid }
    }

    /// The network address of the node
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The unique id of this node incarnation
    pub fn uid(&self) -> u64 {
        self.uid
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.addr, self.uid)
    }
}
