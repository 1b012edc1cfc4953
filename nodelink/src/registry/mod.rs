// Copyright (c) Sean Lawlor
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree.

//! Action handler registry
//!
//! Maps action names to their [HandlerDescriptor]s. Writes go through a
//! mutex and publish a fresh immutable snapshot; readers load the current
//! snapshot without taking any lock, so lookups on the hot receive path never
//! contend with registrations.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use crate::lanes::LaneName;
use crate::transport::RequestHandler;

#[cfg(test)]
mod tests;

/// Everything the service needs to execute an inbound request for one action
pub struct HandlerDescriptor {
    /// The action name this handler is registered under
    pub action: String,
    /// The lane the handler executes on
    pub lane: LaneName,
    /// Execute even when the service is under pressure and would otherwise
    /// shed load
    pub force_execution: bool,
    /// Whether a failure of this action may trip admission control
    pub can_trip_admission_control: bool,
    /// The handler implementation
    pub handler: Arc<dyn RequestHandler>,
}

impl std::fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("action", &self.action)
            .field("lane", &self.lane)
            .field("force_execution", &self.force_execution)
            .field("can_trip_admission_control", &self.can_trip_admission_control)
            .finish()
    }
}

/// Copy-on-write registry of action handlers
pub struct ActionRegistry {
    snapshot: ArcSwap<HashMap<String, Arc<HandlerDescriptor>>>,
    update_lock: Mutex<()>,
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(HashMap::new()),
            update_lock: Mutex::new(()),
        }
    }

    /// Install a handler, replacing any handler previously registered under
    /// the same action name. A replacement is logged as a collision
    /// diagnostic but is not an error
    pub fn register(&self, descriptor: HandlerDescriptor) {
        let action = descriptor.action.clone();
        let _guard = self.update_lock.lock();
        let mut next = (**self.snapshot.load()).clone();
        if next.insert(action.clone(), Arc::new(descriptor)).is_some() {
            tracing::warn!(
                "Action '{action}' was already registered, replacing the previous handler"
            );
        }
        self.snapshot.store(Arc::new(next));
    }

    /// Remove the handler registered under `action`, if any
    pub fn unregister(&self, action: &str) {
        let _guard = self.update_lock.lock();
        let mut next = (**self.snapshot.load()).clone();
        if next.remove(action).is_some() {
            self.snapshot.store(Arc::new(next));
        }
    }

    /// Lock-free lookup against the current snapshot
    pub fn lookup(&self, action: &str) -> Option<Arc<HandlerDescriptor>> {
        self.snapshot.load().get(action).cloned()
    }
}
