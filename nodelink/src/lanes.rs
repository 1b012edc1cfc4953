// Copyright (c) Sean Lawlor
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree.

//! Named execution lanes for handler callbacks
//!
//! A lane names the place where a callback runs. The reserved [INLINE] lane
//! runs the callback directly on the calling task; any other name submits it
//! as a named task on the runtime.

use std::future::Future;

use crate::concurrency;

/// Reserved lane name which runs the callback inline on the calling task
pub const INLINE: &str = "inline";

/// The name of an execution lane
pub type LaneName = String;

/// Run a synchronous callback on the given lane, restoring the supplied
/// captured span before it executes
pub(crate) fn submit<F>(lane: &str, span: tracing::Span, op: F)
where
    F: FnOnce() + Send + 'static,
{
    if lane == INLINE {
        span.in_scope(op);
    } else {
        concurrency::spawn_named(Some(lane), async move {
            span.in_scope(op);
        });
    }
}

/// Run a future on the given lane. The inline lane awaits it on the calling
/// task, any other lane submits it as a named task
pub(crate) async fn run<F>(lane: &str, future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    if lane == INLINE {
        future.await;
    } else {
        concurrency::spawn_named(Some(lane), future);
    }
}
