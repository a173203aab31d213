//! Invocation recording and replay comparison.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use bridge_core::{ApplicationError, Event, InvocationId, InvocationObserver, Scope};
use bridge_protocol::EventLog;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A complete recording of one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    /// Recording format version.
    pub version: u32,
    /// When the invocation started.
    pub recorded_at: DateTime<Utc>,
    /// The scope the application saw.
    pub scope: Scope,
    /// The request body, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Vec<u8>>,
    /// Every outbound event, in emission order.
    pub events: EventLog,
    /// The failure, if the invocation failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Recording {
    /// Current recording format version.
    pub const VERSION: u32 = 1;

    /// A recording of a successful invocation.
    pub fn new(scope: Scope, body: Option<Vec<u8>>, events: EventLog) -> Self {
        Self {
            version: Self::VERSION,
            recorded_at: Utc::now(),
            scope,
            body,
            events,
            error: None,
        }
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Whether the recorded invocation failed.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Compare a new event log against the recorded one, event by event.
    pub fn compare(&self, actual: &EventLog) -> ReplayOutcome {
        let expected = self.events.as_slice();
        let actual = actual.as_slice();

        for index in 0..expected.len().max(actual.len()) {
            let (left, right) = (expected.get(index), actual.get(index));
            if left != right {
                return ReplayOutcome::Diverged {
                    index,
                    expected: left.cloned(),
                    actual: right.cloned(),
                };
            }
        }
        ReplayOutcome::Match
    }

    /// Compare the result of a replayed invocation, errors included.
    pub fn compare_result(&self, result: &Result<EventLog, ApplicationError>) -> ReplayOutcome {
        match (result, &self.error) {
            (Ok(log), None) => self.compare(log),
            (Err(err), Some(expected)) if err.to_string() == *expected => ReplayOutcome::Match,
            (Ok(_), expected) => ReplayOutcome::ErrorMismatch {
                expected: expected.clone(),
                actual: None,
            },
            (Err(err), expected) => ReplayOutcome::ErrorMismatch {
                expected: expected.clone(),
                actual: Some(err.to_string()),
            },
        }
    }
}

/// Outcome of replaying a recording.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReplayOutcome {
    /// The replay produced exactly the recorded events.
    Match,
    /// The first differing event. `None` means the log ended early.
    Diverged {
        index: usize,
        expected: Option<Event>,
        actual: Option<Event>,
    },
    /// The replay failed differently than recorded.
    ErrorMismatch {
        expected: Option<String>,
        actual: Option<String>,
    },
}

impl ReplayOutcome {
    /// Whether the replay matched.
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Match)
    }
}

struct Pending {
    recorded_at: DateTime<Utc>,
    scope: Scope,
    body: Option<Vec<u8>>,
    events: Vec<Event>,
}

/// Observer that records every invocation it sees.
///
/// Share it with the bridge through an `Arc` and collect the finished
/// recordings with [`take`](Self::take).
#[derive(Default)]
pub struct RecordingObserver {
    pending: Mutex<HashMap<InvocationId, Pending>>,
    finished: Mutex<Vec<Recording>>,
}

impl RecordingObserver {
    /// An empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return all finished recordings, oldest first.
    pub fn take(&self) -> Vec<Recording> {
        match self.finished.lock() {
            Ok(mut finished) => std::mem::take(&mut *finished),
            Err(_) => Vec::new(),
        }
    }

    /// Number of finished recordings.
    pub fn len(&self) -> usize {
        self.finished.lock().map(|f| f.len()).unwrap_or(0)
    }

    /// Whether no recording has finished yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn finish(&self, id: InvocationId, error: Option<String>) {
        let pending = match self.pending.lock() {
            Ok(mut pending) => pending.remove(&id),
            Err(_) => None,
        };
        let Some(pending) = pending else {
            return;
        };

        let recording = Recording {
            version: Recording::VERSION,
            recorded_at: pending.recorded_at,
            scope: pending.scope,
            body: pending.body,
            // Failed invocations keep no event log.
            events: if error.is_some() {
                EventLog::default()
            } else {
                EventLog::from(pending.events)
            },
            error,
        };
        if let Ok(mut finished) = self.finished.lock() {
            finished.push(recording);
        }
    }
}

impl std::fmt::Debug for RecordingObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingObserver")
            .field("finished", &self.len())
            .finish_non_exhaustive()
    }
}

impl InvocationObserver for RecordingObserver {
    fn on_start(&self, id: InvocationId, scope: &Scope, body: Option<&[u8]>) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.insert(
                id,
                Pending {
                    recorded_at: Utc::now(),
                    scope: scope.clone(),
                    body: body.map(<[u8]>::to_vec),
                    events: Vec::new(),
                },
            );
        }
    }

    fn on_send(&self, id: InvocationId, event: &Event) {
        if let Ok(mut pending) = self.pending.lock() {
            if let Some(entry) = pending.get_mut(&id) {
                entry.events.push(event.clone());
            }
        }
    }

    fn on_complete(&self, id: InvocationId, _events: usize, _elapsed: Duration) {
        self.finish(id, None);
    }

    fn on_error(&self, id: InvocationId, err: &ApplicationError, _elapsed: Duration) {
        self.finish(id, Some(err.to_string()));
    }

    // Cancelled invocations have no outcome to replay.
    fn on_cancel(&self, id: InvocationId, _elapsed: Duration) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.remove(&id);
        }
    }
}
