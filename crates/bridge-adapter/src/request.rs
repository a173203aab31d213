//! The request handed to a handler.

use bridge_core::{Event, ProtocolError, Receive, Scope};
use http::Method;
use serde::de::DeserializeOwned;

/// A fully buffered request built from a scope and the inbound events.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    scope: Scope,
}

impl Request {
    /// Build a request from a scope and an already collected body.
    pub fn new(method: Method, scope: Scope, body: Vec<u8>) -> Self {
        Self {
            method,
            path: scope.path().unwrap_or("/").to_string(),
            headers: scope.headers(),
            body,
            scope,
        }
    }

    /// Read the body from `receive` until the final chunk or a disconnect.
    pub(crate) async fn read(
        method: Method,
        scope: &Scope,
        receive: &mut dyn Receive,
    ) -> Result<Self, ProtocolError> {
        let mut body = Vec::new();

        loop {
            match receive.receive().await {
                Event::Request {
                    body: chunk,
                    more_body,
                } => {
                    body.extend_from_slice(&chunk);
                    if !more_body {
                        break;
                    }
                }
                Event::Disconnect => break,
                other => return Err(ProtocolError::UnexpectedEvent(other.kind().to_string())),
            }
        }

        Ok(Self::new(method, scope.clone(), body))
    }

    /// The request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The request path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The raw query string.
    pub fn query_string(&self) -> &str {
        self.scope.query_string().unwrap_or_default()
    }

    /// First value of a query parameter. Values are not percent-decoded.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query_string()
            .split('&')
            .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }

    /// Get a header value by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All headers in scope order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// The raw body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The body as UTF-8 text.
    pub fn text(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.body)
    }

    /// Parse the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// The scope this request was built from.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }
}
