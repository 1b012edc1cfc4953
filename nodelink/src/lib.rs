// Copyright (c) Sean Lawlor
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree.

//! # nodelink
//!
//! Request/response correlation core for cluster member communication.
//!
//! A [TransportService] sits between "caller wants a response for action `A`
//! on node `N`" and the response (or failure) eventually arriving. It issues
//! outbound requests through a pluggable [Transport], tracks every in-flight
//! request in a concurrent pending table, and guarantees that exactly one
//! terminal outcome reaches the caller's handler no matter which completion
//! path wins: a normal response, a timeout, a send failure, the destination
//! node disconnecting, or service shutdown.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use bytes::Bytes;
//! use nodelink::concurrency::Duration;
//! use nodelink::memory::{MemoryNetwork, MemoryTransport};
//! use nodelink::{NodeId, RequestOptions, TransportService, TransportSettings};
//!
//! struct Echo;
//!
//! #[async_trait::async_trait]
//! impl nodelink::RequestHandler for Echo {
//!     async fn handle(
//!         &self,
//!         _from: NodeId,
//!         payload: Bytes,
//!     ) -> Result<Bytes, nodelink::BoxError> {
//!         Ok(payload)
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let node = NodeId::new("127.0.0.1:9300".parse().unwrap(), 1);
//!     let network = MemoryNetwork::new();
//!     let transport = Arc::new(MemoryTransport::new(network, node.clone()));
//!     let service = TransportService::new(
//!         TransportSettings::new(node.clone(), "demo-cluster"),
//!         transport,
//!     );
//!     service.register_request_handler("demo:echo", nodelink::lanes::INLINE, Arc::new(Echo));
//!     service.start().await.expect("Failed to start service");
//!     service.accept_incoming_requests();
//!
//!     // a self-addressed request takes the loopback path
//!     let reply = service
//!         .submit_request(
//!             &node,
//!             "demo:echo",
//!             Bytes::from_static(b"hello"),
//!             RequestOptions::with_timeout(Duration::from_secs(1)),
//!         )
//!         .await
//!         .expect("Echo failed");
//!     assert_eq!(reply, Bytes::from_static(b"hello"));
//!
//!     service.close().await;
//! }
//! ```

#![warn(missing_docs)]

#[cfg(test)]
mod common_test;

pub mod concurrency;
pub mod errors;
pub mod handshake;
pub mod lanes;
pub mod memory;
pub mod node;
pub mod pending;
pub mod registry;
pub mod service;
pub mod transport;

pub use errors::{BoxError, TransportErr};
pub use node::NodeId;
pub use pending::{RequestId, TimedOutRequest};
pub use registry::{ActionRegistry, HandlerDescriptor};
pub use service::{
    LifecycleState, RequestOptions, TransportAdapter, TransportService, TransportSettings,
};
pub use transport::{
    ConnectionListener, RequestHandler, ResponseChannel, ResponseHandler, Transport,
};
