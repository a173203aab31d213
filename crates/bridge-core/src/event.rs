//! Protocol events exchanged with an application.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::EventError;

/// Inbound request body chunk.
pub const HTTP_REQUEST: &str = "http.request";
/// Inbound end-of-stream.
pub const HTTP_DISCONNECT: &str = "http.disconnect";
/// Outbound response status and headers.
pub const HTTP_RESPONSE_START: &str = "http.response.start";
/// Outbound response body chunk.
pub const HTTP_RESPONSE_BODY: &str = "http.response.body";

/// A raw header pair (name, value).
pub type Header = (Vec<u8>, Vec<u8>);

/// One unit of protocol traffic.
///
/// Events travel as JSON objects tagged by `type`. Tags the bridge does not
/// know about are kept in [`Event::Other`] and pass through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "Value", try_from = "Value")]
pub enum Event {
    /// Request body delivered to the application.
    Request { body: Vec<u8>, more_body: bool },
    /// No more inbound data will arrive.
    Disconnect,
    /// Response status line and headers.
    ResponseStart { status: u16, headers: Vec<Header> },
    /// Response body chunk.
    ResponseBody { body: Vec<u8>, more_body: bool },
    /// Any other tag, with its remaining fields.
    Other {
        kind: String,
        fields: Map<String, Value>,
    },
}

impl Event {
    /// A single, final request body chunk.
    pub fn request(body: impl Into<Vec<u8>>) -> Self {
        Self::Request {
            body: body.into(),
            more_body: false,
        }
    }

    /// Start a response.
    pub fn response_start(status: u16, headers: Vec<Header>) -> Self {
        Self::ResponseStart { status, headers }
    }

    /// A single, final response body chunk.
    pub fn response_body(body: impl Into<Vec<u8>>) -> Self {
        Self::ResponseBody {
            body: body.into(),
            more_body: false,
        }
    }

    /// An event with a tag not modelled here.
    pub fn other(kind: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self::Other {
            kind: kind.into(),
            fields,
        }
    }

    /// The `type` tag.
    pub fn kind(&self) -> &str {
        match self {
            Self::Request { .. } => HTTP_REQUEST,
            Self::Disconnect => HTTP_DISCONNECT,
            Self::ResponseStart { .. } => HTTP_RESPONSE_START,
            Self::ResponseBody { .. } => HTTP_RESPONSE_BODY,
            Self::Other { kind, .. } => kind,
        }
    }

    /// Body bytes carried by request and response body events.
    pub fn body(&self) -> Option<&[u8]> {
        match self {
            Self::Request { body, .. } | Self::ResponseBody { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Whether this event flows from the bridge into the application.
    pub fn is_inbound(&self) -> bool {
        matches!(self, Self::Request { .. } | Self::Disconnect)
    }
}

impl From<Event> for Value {
    fn from(event: Event) -> Self {
        let kind = event.kind().to_string();
        let mut map = match event {
            Event::Request { body, more_body } | Event::ResponseBody { body, more_body } => {
                let mut map = Map::new();
                map.insert("body".into(), bytes_to_value(body));
                map.insert("more_body".into(), Value::Bool(more_body));
                map
            }
            Event::Disconnect => Map::new(),
            Event::ResponseStart { status, headers } => {
                let headers = headers
                    .into_iter()
                    .map(|(name, value)| {
                        Value::Array(vec![bytes_to_value(name), bytes_to_value(value)])
                    })
                    .collect();
                let mut map = Map::new();
                map.insert("status".into(), Value::from(status));
                map.insert("headers".into(), Value::Array(headers));
                map
            }
            Event::Other { fields, .. } => fields,
        };
        map.insert("type".into(), Value::String(kind));
        Value::Object(map)
    }
}

impl TryFrom<Value> for Event {
    type Error = EventError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(mut map) = value else {
            return Err(EventError::NotAnObject);
        };
        let kind = match map.remove("type") {
            Some(Value::String(kind)) => kind,
            _ => return Err(EventError::MissingType),
        };

        match kind.as_str() {
            HTTP_REQUEST => Ok(Self::Request {
                body: take_bytes(&mut map, "body")?,
                more_body: take_bool(&mut map, "more_body")?,
            }),
            HTTP_DISCONNECT => Ok(Self::Disconnect),
            HTTP_RESPONSE_START => Ok(Self::ResponseStart {
                status: take_status(&mut map)?,
                headers: take_headers(&mut map)?,
            }),
            HTTP_RESPONSE_BODY => Ok(Self::ResponseBody {
                body: take_bytes(&mut map, "body")?,
                more_body: take_bool(&mut map, "more_body")?,
            }),
            _ => Ok(Self::Other {
                kind: kind.clone(),
                fields: map,
            }),
        }
    }
}

/// Bytes become a string when they are valid UTF-8, an integer array otherwise.
fn bytes_to_value(bytes: Vec<u8>) -> Value {
    match String::from_utf8(bytes) {
        Ok(text) => Value::String(text),
        Err(err) => Value::from(err.into_bytes()),
    }
}

/// Accepts a string, an array of byte values, or null (empty).
pub(crate) fn bytes_from_value(value: &Value, field: &'static str) -> Result<Vec<u8>, EventError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(text) => Ok(text.as_bytes().to_vec()),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_u64()
                    .and_then(|n| u8::try_from(n).ok())
                    .ok_or_else(|| EventError::invalid(field, "expected byte values 0-255"))
            })
            .collect(),
        _ => Err(EventError::invalid(field, "expected string or byte array")),
    }
}

fn take_bytes(map: &mut Map<String, Value>, field: &'static str) -> Result<Vec<u8>, EventError> {
    map.remove(field)
        .map_or(Ok(Vec::new()), |value| bytes_from_value(&value, field))
}

fn take_bool(map: &mut Map<String, Value>, field: &'static str) -> Result<bool, EventError> {
    match map.remove(field) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(flag)) => Ok(flag),
        Some(_) => Err(EventError::invalid(field, "expected boolean")),
    }
}

fn take_status(map: &mut Map<String, Value>) -> Result<u16, EventError> {
    map.remove("status")
        .and_then(|value| value.as_u64())
        .and_then(|status| u16::try_from(status).ok())
        .ok_or_else(|| EventError::invalid("status", "expected integer status code"))
}

fn take_headers(map: &mut Map<String, Value>) -> Result<Vec<Header>, EventError> {
    let items = match map.remove("headers") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(EventError::invalid("headers", "expected array of pairs")),
    };

    items
        .iter()
        .map(|pair| match pair.as_array().map(Vec::as_slice) {
            Some([name, value]) => Ok((
                bytes_from_value(name, "headers")?,
                bytes_from_value(value, "headers")?,
            )),
            _ => Err(EventError::invalid("headers", "expected [name, value] pair")),
        })
        .collect()
}
