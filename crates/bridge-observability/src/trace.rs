//! Lifecycle events through `tracing`.

use std::time::Duration;

use bridge_core::{ApplicationError, Event, InvocationId, InvocationObserver, Scope};
use tracing::{debug, error, info, warn};

/// Observer emitting `tracing` events for each invocation.
///
/// Start and completion are logged at `info`, individual protocol events at
/// `debug` and failures at `error`. Install a subscriber to see them.
#[derive(Debug, Clone, Default)]
pub struct TracingObserver {
    app: String,
}

impl TracingObserver {
    /// Observer tagging every event with `app`.
    pub fn new(app: impl Into<String>) -> Self {
        Self { app: app.into() }
    }

    /// The application name used as a field.
    pub fn app(&self) -> &str {
        &self.app
    }
}

impl InvocationObserver for TracingObserver {
    fn on_start(&self, id: InvocationId, scope: &Scope, body: Option<&[u8]>) {
        info!(
            invocation = %id,
            app = %self.app,
            method = scope.method().unwrap_or("-"),
            path = scope.path().unwrap_or("-"),
            body_len = body.map(<[u8]>::len),
            "Invocation started"
        );
    }

    fn on_receive(&self, id: InvocationId, event: &Event) {
        debug!(invocation = %id, kind = event.kind(), "Event received");
    }

    fn on_send(&self, id: InvocationId, event: &Event) {
        debug!(invocation = %id, kind = event.kind(), "Event sent");
    }

    fn on_complete(&self, id: InvocationId, events: usize, elapsed: Duration) {
        info!(
            invocation = %id,
            app = %self.app,
            events,
            elapsed_us = elapsed.as_micros() as u64,
            "Invocation completed"
        );
    }

    fn on_error(&self, id: InvocationId, err: &ApplicationError, elapsed: Duration) {
        error!(
            invocation = %id,
            app = %self.app,
            error = %err,
            elapsed_us = elapsed.as_micros() as u64,
            "Invocation failed"
        );
    }

    fn on_cancel(&self, id: InvocationId, elapsed: Duration) {
        warn!(
            invocation = %id,
            app = %self.app,
            elapsed_us = elapsed.as_micros() as u64,
            "Invocation cancelled"
        );
    }
}
