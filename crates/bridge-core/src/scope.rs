//! Request descriptor ("scope").

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::event::bytes_from_value;

/// Immutable metadata for one request.
///
/// A string-keyed map of arbitrary JSON values. The bridge only ever hands
/// out `&Scope`; the builder methods consume `self`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope(Map<String, Value>);

impl Scope {
    /// An empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// An HTTP scope for `method` and `path`.
    pub fn http(method: &str, path: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert("type".into(), json!("http"));
        map.insert("asgi".into(), json!({ "version": "3.0" }));
        map.insert("http_version".into(), json!("1.1"));
        map.insert("scheme".into(), json!("http"));
        map.insert("method".into(), json!(method.to_ascii_uppercase()));
        map.insert("path".into(), Value::String(path.into()));
        map.insert("query_string".into(), json!(""));
        map.insert("headers".into(), json!([]));
        Self(map)
    }

    /// Wrap an existing map.
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Set an arbitrary key.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Append a header. Names are stored lower-cased.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let value: String = value.into();
        let pair = json!([name.to_ascii_lowercase(), value]);
        match self.0.get_mut("headers") {
            Some(Value::Array(headers)) => headers.push(pair),
            _ => {
                self.0.insert("headers".into(), Value::Array(vec![pair]));
            }
        }
        self
    }

    /// Set the raw query string (without the leading `?`).
    pub fn with_query(self, query: impl Into<String>) -> Self {
        self.with("query_string", Value::String(query.into()))
    }

    /// Look up a key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The scope `type` (e.g. `"http"`).
    pub fn kind(&self) -> Option<&str> {
        self.str_value("type")
    }

    /// The request method.
    pub fn method(&self) -> Option<&str> {
        self.str_value("method")
    }

    /// The request method parsed as an HTTP method token.
    pub fn request_method(&self) -> Option<http::Method> {
        self.method()
            .and_then(|m| http::Method::from_bytes(m.as_bytes()).ok())
    }

    /// The request path.
    pub fn path(&self) -> Option<&str> {
        self.str_value("path")
    }

    /// The raw query string.
    pub fn query_string(&self) -> Option<&str> {
        self.str_value("query_string")
    }

    /// Headers as text pairs. Malformed entries are skipped.
    pub fn headers(&self) -> Vec<(String, String)> {
        let Some(Value::Array(items)) = self.0.get("headers") else {
            return Vec::new();
        };

        items
            .iter()
            .filter_map(|pair| match pair.as_array().map(Vec::as_slice) {
                Some([name, value]) => {
                    let name = bytes_from_value(name, "headers").ok()?;
                    let value = bytes_from_value(value, "headers").ok()?;
                    Some((
                        String::from_utf8_lossy(&name).into_owned(),
                        String::from_utf8_lossy(&value).into_owned(),
                    ))
                }
                _ => None,
            })
            .collect()
    }

    /// Get the first header value by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers()
            .into_iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume into the underlying map.
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    fn str_value(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }
}

impl From<Map<String, Value>> for Scope {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
