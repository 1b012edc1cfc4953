// Copyright (c) Sean Lawlor
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree.

//! Transport error types

use std::fmt::Display;

use crate::concurrency::Duration;
use crate::node::NodeId;

/// A boxed dynamic error, used where collaborators surface arbitrary faults
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The terminal outcome delivered to a response handler when a request
/// cannot complete normally.
///
/// Every admitted request resolves with exactly one of a successful response
/// or one of these errors, whichever terminal path wins the race for the
/// pending entry.
#[derive(Debug)]
pub enum TransportErr {
    /// The request could not be handed to the transport (connection or
    /// serialization fault)
    SendFailure(BoxError),

    /// No response arrived within the configured deadline
    Timeout {
        /// Time elapsed between dispatch and the timeout firing
        elapsed: Duration,
    },

    /// The destination node dropped before responding
    NodeDisconnected(NodeId),

    /// The service was stopped while this request was still pending, or the
    /// request was issued after shutdown began
    ServiceStopped,

    /// No handler is registered under the requested action name. Surfaced to
    /// the requesting side, never to the node that received the request
    ActionNotFound(String),

    /// The remote handler for the action failed while processing the request
    RemoteFailure(String),

    /// The peer's cluster name or protocol version is incompatible. The
    /// freshly-made connection is torn down as a side effect
    HandshakeFailed(String),
}

impl std::error::Error for TransportErr {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self {
            Self::SendFailure(inner) => Some(inner.as_ref()),
            _ => None,
        }
    }
}

impl Display for TransportErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SendFailure(inner) => {
                write!(f, "Failed to send request to the transport '{inner}'")
            }
            Self::Timeout { elapsed } => {
                write!(f, "Request timed out after {}ms", elapsed.as_millis())
            }
            Self::NodeDisconnected(node) => {
                write!(f, "Node '{node}' disconnected before responding")
            }
            Self::ServiceStopped => {
                write!(f, "Transport service stopped")
            }
            Self::ActionNotFound(action) => {
                write!(f, "No handler registered for action '{action}'")
            }
            Self::RemoteFailure(msg) => {
                write!(f, "Remote handler failed '{msg}'")
            }
            Self::HandshakeFailed(msg) => {
                write!(f, "Handshake with peer failed '{msg}'")
            }
        }
    }
}
