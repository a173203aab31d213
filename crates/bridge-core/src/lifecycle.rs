//! Invocation lifecycle tracking.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::ApplicationError;
use crate::event::Event;
use crate::scope::Scope;

/// Process-unique identifier for one bridged invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InvocationId(u64);

impl InvocationId {
    /// Allocate the next identifier.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw counter value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "inv-{:06}", self.0)
    }
}

/// Hook called by the bridge at well-defined points of an invocation.
///
/// Every method defaults to doing nothing, so observers implement only
/// what they need.
pub trait InvocationObserver: Send + Sync {
    /// The invocation is about to run the application.
    fn on_start(&self, _id: InvocationId, _scope: &Scope, _body: Option<&[u8]>) {}

    /// An inbound event was handed to the application.
    fn on_receive(&self, _id: InvocationId, _event: &Event) {}

    /// The application emitted an outbound event.
    fn on_send(&self, _id: InvocationId, _event: &Event) {}

    /// The application finished; `events` were collected.
    fn on_complete(&self, _id: InvocationId, _events: usize, _elapsed: Duration) {}

    /// The application failed.
    fn on_error(&self, _id: InvocationId, _error: &ApplicationError, _elapsed: Duration) {}

    /// The invocation was dropped before the application returned, for
    /// example by an outer timeout. No other end hook follows.
    fn on_cancel(&self, _id: InvocationId, _elapsed: Duration) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl InvocationObserver for NoopObserver {}

/// Fans every callback out to several observers, in registration order.
#[derive(Clone, Default)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn InvocationObserver>>,
}

impl ObserverSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer.
    pub fn with(mut self, observer: impl InvocationObserver + 'static) -> Self {
        self.observers.push(Arc::new(observer));
        self
    }

    /// Add a shared observer.
    pub fn with_shared(mut self, observer: Arc<dyn InvocationObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Number of observers.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl fmt::Debug for ObserverSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverSet")
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl InvocationObserver for ObserverSet {
    fn on_start(&self, id: InvocationId, scope: &Scope, body: Option<&[u8]>) {
        for observer in &self.observers {
            observer.on_start(id, scope, body);
        }
    }

    fn on_receive(&self, id: InvocationId, event: &Event) {
        for observer in &self.observers {
            observer.on_receive(id, event);
        }
    }

    fn on_send(&self, id: InvocationId, event: &Event) {
        for observer in &self.observers {
            observer.on_send(id, event);
        }
    }

    fn on_complete(&self, id: InvocationId, events: usize, elapsed: Duration) {
        for observer in &self.observers {
            observer.on_complete(id, events, elapsed);
        }
    }

    fn on_error(&self, id: InvocationId, error: &ApplicationError, elapsed: Duration) {
        for observer in &self.observers {
            observer.on_error(id, error, elapsed);
        }
    }

    fn on_cancel(&self, id: InvocationId, elapsed: Duration) {
        for observer in &self.observers {
            observer.on_cancel(id, elapsed);
        }
    }
}
