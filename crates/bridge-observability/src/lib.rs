//! Observability for bridged invocations.
//!
//! This crate provides:
//! - `TracingObserver` - Lifecycle events through `tracing`
//! - `LogObserver` - Structured log lines written to any writer
//! - `RecordingObserver` / `Recording` - Capture invocations and replay them

mod logging;
mod replay;
mod trace;

pub use logging::*;
pub use replay::*;
pub use trace::*;

// Re-export the observer hook for convenience
pub use bridge_core::{InvocationId, InvocationObserver, ObserverSet};
