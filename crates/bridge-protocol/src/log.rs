//! Outbound event log.

use std::slice;

use async_trait::async_trait;
use bridge_core::{Emit, Event, InvocationId, InvocationObserver};
use serde::{Deserialize, Serialize};

use crate::response::{CollectedResponse, ResponseError};

/// Append-only sink backing one invocation's log.
///
/// Events are stored exactly as sent; no validation happens here.
pub(crate) struct LogSink<'a> {
    id: InvocationId,
    events: Vec<Event>,
    observer: &'a dyn InvocationObserver,
}

impl<'a> LogSink<'a> {
    pub(crate) fn new(id: InvocationId, observer: &'a dyn InvocationObserver) -> Self {
        Self {
            id,
            events: Vec::new(),
            observer,
        }
    }

    /// Close the sink and take the snapshot.
    pub(crate) fn finish(self) -> EventLog {
        EventLog {
            events: self.events,
        }
    }
}

#[async_trait]
impl Emit for LogSink<'_> {
    async fn send(&mut self, event: Event) {
        self.observer.on_send(self.id, &event);
        self.events.push(event);
    }
}

/// The events an application emitted during one invocation, in emission order.
///
/// A returned log is a snapshot: nothing can be appended to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the application emitted nothing.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Iterate in emission order.
    pub fn iter(&self) -> slice::Iter<'_, Event> {
        self.events.iter()
    }

    /// Event at `index`.
    pub fn get(&self, index: usize) -> Option<&Event> {
        self.events.get(index)
    }

    /// First emitted event.
    pub fn first(&self) -> Option<&Event> {
        self.events.first()
    }

    /// Last emitted event.
    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    /// Borrow as a slice.
    pub fn as_slice(&self) -> &[Event] {
        &self.events
    }

    /// Consume into the underlying events.
    pub fn into_vec(self) -> Vec<Event> {
        self.events
    }

    /// The `type` tag of every event.
    pub fn kinds(&self) -> Vec<&str> {
        self.events.iter().map(Event::kind).collect()
    }

    /// Assemble the HTTP response described by this log.
    pub fn response(&self) -> Result<CollectedResponse, ResponseError> {
        CollectedResponse::from_events(&self.events)
    }
}

impl From<Vec<Event>> for EventLog {
    fn from(events: Vec<Event>) -> Self {
        Self { events }
    }
}

impl IntoIterator for EventLog {
    type Item = Event;
    type IntoIter = std::vec::IntoIter<Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl<'a> IntoIterator for &'a EventLog {
    type Item = &'a Event;
    type IntoIter = slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
