//! HTTP response assembled from an event log.

use bridge_core::Event;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors assembling a response from events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponseError {
    #[error("No http.response.start event in log")]
    MissingStart,

    #[error("http.response.body emitted before http.response.start")]
    BodyBeforeStart,

    #[error("http.response.start emitted more than once")]
    DuplicateStart,

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Status, headers and body of a response, collected from its events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedResponse {
    /// The HTTP status code.
    pub status: u16,
    /// The response headers, decoded lossily as text.
    pub headers: Vec<(String, String)>,
    /// All body chunks concatenated.
    pub body: Vec<u8>,
    /// Whether a final chunk (`more_body = false`) was seen.
    pub complete: bool,
}

impl CollectedResponse {
    /// Collect a response from events. Events with other tags are ignored.
    pub fn from_events(events: &[Event]) -> Result<Self, ResponseError> {
        let mut response: Option<Self> = None;

        for event in events {
            match event {
                Event::ResponseStart { status, headers } => {
                    if response.is_some() {
                        return Err(ResponseError::DuplicateStart);
                    }
                    response = Some(Self {
                        status: *status,
                        headers: headers
                            .iter()
                            .map(|(k, v)| {
                                (
                                    String::from_utf8_lossy(k).into_owned(),
                                    String::from_utf8_lossy(v).into_owned(),
                                )
                            })
                            .collect(),
                        body: Vec::new(),
                        complete: false,
                    });
                }
                Event::ResponseBody { body, more_body } => {
                    let current = response.as_mut().ok_or(ResponseError::BodyBeforeStart)?;
                    current.body.extend_from_slice(body);
                    current.complete = !*more_body;
                }
                _ => {}
            }
        }

        response.ok_or(ResponseError::MissingStart)
    }

    /// Check if the response was successful (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if the response was a client error (4xx status).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Check if the response was a server error (5xx status).
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// Get a header value (case-insensitive).
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Get the response body as text.
    pub fn text(&self) -> Result<&str, ResponseError> {
        std::str::from_utf8(&self.body)
            .map_err(|e| ResponseError::Parse(format!("Invalid UTF-8: {}", e)))
    }

    /// Parse the response body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ResponseError> {
        serde_json::from_slice(&self.body).map_err(|e| ResponseError::Parse(e.to_string()))
    }
}
