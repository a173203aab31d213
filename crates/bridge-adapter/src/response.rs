//! Handler responses and conversions into them.

use std::fmt::Display;

use bridge_core::{Emit, Event};
use http::StatusCode;
use serde::Serialize;

use crate::error::HandlerError;

/// A complete response produced by a handler or the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Response {
    /// An empty response with `status`.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// A `text/plain` response.
    pub fn text(status: StatusCode, body: impl Into<String>) -> Self {
        Self::new(status)
            .with_header("content-type", "text/plain; charset=utf-8")
            .with_body(body.into().into_bytes())
    }

    /// An `application/json` response.
    pub fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Result<Self, HandlerError> {
        let body = serde_json::to_vec(value)
            .map_err(|e| HandlerError::new(format!("JSON serialization failed: {}", e)))?;
        Ok(Self::new(status)
            .with_header("content-type", "application/json")
            .with_body(body))
    }

    /// Canonical plain-text response for `status` (e.g. "Not Found").
    pub fn status_text(status: StatusCode) -> Self {
        Self::text(status, status.canonical_reason().unwrap_or("Unknown"))
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Replace the body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Replace the status.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// The status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get a header value (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The protocol events for this response: start, then one final body chunk.
    pub fn into_events(self) -> [Event; 2] {
        let mut headers: Vec<_> = self
            .headers
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase().into_bytes(), v.into_bytes()))
            .collect();
        if !headers.iter().any(|(k, _)| k == b"content-length") {
            headers.push((
                b"content-length".to_vec(),
                self.body.len().to_string().into_bytes(),
            ));
        }

        [
            Event::response_start(self.status.as_u16(), headers),
            Event::response_body(self.body),
        ]
    }

    /// Emit this response through `send`.
    pub(crate) async fn send_to(self, send: &mut dyn Emit) {
        for event in self.into_events() {
            send.send(event).await;
        }
    }
}

/// A JSON response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Json<T>(pub T);

/// Converts a handler's return value into a response.
pub trait Responder {
    /// Produce the response, or the handler's failure.
    fn respond(self) -> Result<Response, HandlerError>;
}

impl Responder for Response {
    fn respond(self) -> Result<Response, HandlerError> {
        Ok(self)
    }
}

impl Responder for String {
    fn respond(self) -> Result<Response, HandlerError> {
        Ok(Response::text(StatusCode::OK, self))
    }
}

impl Responder for &'static str {
    fn respond(self) -> Result<Response, HandlerError> {
        Ok(Response::text(StatusCode::OK, self))
    }
}

impl Responder for Vec<u8> {
    fn respond(self) -> Result<Response, HandlerError> {
        Ok(Response::new(StatusCode::OK)
            .with_header("content-type", "application/octet-stream")
            .with_body(self))
    }
}

impl Responder for serde_json::Value {
    fn respond(self) -> Result<Response, HandlerError> {
        Response::json(StatusCode::OK, &self)
    }
}

impl<T: Serialize> Responder for Json<T> {
    fn respond(self) -> Result<Response, HandlerError> {
        Response::json(StatusCode::OK, &self.0)
    }
}

impl<T: Responder> Responder for (StatusCode, T) {
    fn respond(self) -> Result<Response, HandlerError> {
        Ok(self.1.respond()?.with_status(self.0))
    }
}

impl<T: Responder> Responder for (u16, T) {
    fn respond(self) -> Result<Response, HandlerError> {
        let status = StatusCode::from_u16(self.0)
            .map_err(|_| HandlerError::new(format!("Invalid status code: {}", self.0)))?;
        (status, self.1).respond()
    }
}

impl<T: Responder, E: Display> Responder for Result<T, E> {
    fn respond(self) -> Result<Response, HandlerError> {
        self.map_err(|e| HandlerError::new(e.to_string()))?.respond()
    }
}
