//! Structured logging of invocation lifecycles.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::Duration;

use bridge_core::{ApplicationError, Event, InvocationId, InvocationObserver, Scope};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Log level for structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trace => write!(f, "TRACE"),
            Self::Debug => write!(f, "DEBUG"),
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown log level: {}", other)),
        }
    }
}

/// A structured log entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    /// Log level.
    pub level: LogLevel,
    /// Log message.
    pub message: String,
    /// Invocation ID for correlation.
    pub invocation: String,
    /// Application name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
    /// Additional structured fields.
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
    /// Time since the invocation started, in microseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_us: Option<u64>,
}

impl LogEntry {
    /// Format as JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.message.clone())
    }

    /// Format as human-readable string.
    pub fn to_human(&self) -> String {
        let mut s = format!("[{}] {} {}", self.level, self.invocation, self.message);

        if let Some(elapsed) = self.elapsed_us {
            s.push_str(&format!(" ({}us)", elapsed));
        }

        if !self.fields.is_empty() {
            s.push_str(" | ");
            let fields: Vec<String> = self
                .fields
                .iter()
                .map(|(k, v)| match v {
                    Value::String(text) => format!("{}={}", k, text),
                    other => format!("{}={}", k, other),
                })
                .collect();
            s.push_str(&fields.join(" "));
        }

        s
    }
}

/// Output format for logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON lines (for log aggregation).
    #[default]
    Json,
    /// Human-readable lines (for development).
    Human,
}

/// Observer writing one structured line per lifecycle event.
///
/// Write failures are ignored; logging never fails an invocation.
pub struct LogObserver<W> {
    writer: Mutex<W>,
    app: Option<String>,
    min_level: LogLevel,
    format: LogFormat,
}

impl<W: Write + Send> LogObserver<W> {
    /// Log to `writer` at `Info` and above, as JSON.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            app: None,
            min_level: LogLevel::Info,
            format: LogFormat::Json,
        }
    }

    /// Set the application name added to every entry.
    pub fn with_app(mut self, app: impl Into<String>) -> Self {
        self.app = Some(app.into());
        self
    }

    /// Set minimum log level.
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Set output format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Consume the observer and return the writer.
    pub fn into_writer(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn log(
        &self,
        level: LogLevel,
        id: InvocationId,
        message: &str,
        fields: BTreeMap<String, Value>,
        elapsed: Option<Duration>,
    ) {
        if level < self.min_level {
            return;
        }

        let entry = LogEntry {
            level,
            message: message.to_string(),
            invocation: id.to_string(),
            app: self.app.clone(),
            fields,
            elapsed_us: elapsed.map(|d| d.as_micros() as u64),
        };

        let line = match self.format {
            LogFormat::Json => entry.to_json(),
            LogFormat::Human => entry.to_human(),
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
        }
    }
}

impl<W> fmt::Debug for LogObserver<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogObserver")
            .field("app", &self.app)
            .field("min_level", &self.min_level)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

fn fields<const N: usize>(pairs: [(&str, Value); N]) -> BTreeMap<String, Value> {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

impl<W: Write + Send> InvocationObserver for LogObserver<W> {
    fn on_start(&self, id: InvocationId, scope: &Scope, body: Option<&[u8]>) {
        self.log(
            LogLevel::Info,
            id,
            "invocation started",
            fields([
                ("method", json!(scope.method().unwrap_or("-"))),
                ("path", json!(scope.path().unwrap_or("-"))),
                ("body_len", json!(body.map(<[u8]>::len))),
            ]),
            None,
        );
    }

    fn on_receive(&self, id: InvocationId, event: &Event) {
        self.log(
            LogLevel::Debug,
            id,
            "event received",
            fields([("type", json!(event.kind()))]),
            None,
        );
    }

    fn on_send(&self, id: InvocationId, event: &Event) {
        let mut entry = fields([("type", json!(event.kind()))]);
        if let Event::ResponseStart { status, .. } = event {
            entry.insert("status".to_string(), json!(status));
        }
        self.log(LogLevel::Debug, id, "event sent", entry, None);
    }

    fn on_complete(&self, id: InvocationId, events: usize, elapsed: Duration) {
        self.log(
            LogLevel::Info,
            id,
            "invocation completed",
            fields([("events", json!(events))]),
            Some(elapsed),
        );
    }

    fn on_error(&self, id: InvocationId, error: &ApplicationError, elapsed: Duration) {
        self.log(
            LogLevel::Error,
            id,
            "invocation failed",
            fields([("error", json!(error.to_string()))]),
            Some(elapsed),
        );
    }

    fn on_cancel(&self, id: InvocationId, elapsed: Duration) {
        self.log(
            LogLevel::Warn,
            id,
            "invocation cancelled",
            BTreeMap::new(),
            Some(elapsed),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(observer: LogObserver<Vec<u8>>) -> Vec<String> {
        String::from_utf8(observer.into_writer())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    // === LogLevel Tests ===

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Info < LogLevel::Error);
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!("WARN".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    // === LogEntry Tests ===

    #[test]
    fn test_log_entry_human() {
        let entry = LogEntry {
            level: LogLevel::Info,
            message: "invocation completed".to_string(),
            invocation: "inv-000007".to_string(),
            app: None,
            fields: fields([("events", json!(2)), ("path", json!("/"))]),
            elapsed_us: Some(150),
        };

        assert_eq!(
            entry.to_human(),
            "[INFO] inv-000007 invocation completed (150us) | events=2 path=/"
        );
    }

    #[test]
    fn test_log_entry_json_flattens_fields() {
        let entry = LogEntry {
            level: LogLevel::Error,
            message: "invocation failed".to_string(),
            invocation: "inv-000001".to_string(),
            app: Some("shop".to_string()),
            fields: fields([("error", json!("boom"))]),
            elapsed_us: None,
        };

        let value: Value = serde_json::from_str(&entry.to_json()).unwrap();

        assert_eq!(value["level"], "error");
        assert_eq!(value["app"], "shop");
        assert_eq!(value["error"], "boom");
        assert!(value.get("elapsed_us").is_none());
    }

    // === LogObserver Tests ===

    #[test]
    fn test_log_observer_filters_by_level() {
        let observer = LogObserver::new(Vec::new());
        let id = InvocationId::next();

        observer.on_start(id, &Scope::http("GET", "/"), None);
        observer.on_send(id, &Event::response_body("x"));
        observer.on_complete(id, 1, Duration::from_micros(10));

        let lines = lines(observer);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("invocation started"));
        assert!(lines[1].contains("invocation completed"));
    }

    #[test]
    fn test_log_observer_debug_level_includes_events() {
        let observer = LogObserver::new(Vec::new())
            .with_min_level(LogLevel::Debug)
            .with_format(LogFormat::Human)
            .with_app("echo");
        let id = InvocationId::next();

        observer.on_receive(id, &Event::request("hi"));
        observer.on_send(id, &Event::response_start(201, Vec::new()));

        let lines = lines(observer);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("event received | type=http.request"));
        assert!(lines[1].contains("status=201"));
        assert!(lines[1].contains(&id.to_string()));
    }

    #[test]
    fn test_log_observer_cancel_entry() {
        let observer = LogObserver::new(Vec::new()).with_format(LogFormat::Human);
        let id = InvocationId::next();

        observer.on_cancel(id, Duration::from_micros(40));

        let lines = lines(observer);
        assert_eq!(lines, vec![format!("[WARN] {} invocation cancelled (40us)", id)]);
    }

    #[test]
    fn test_log_observer_error_entry() {
        let observer = LogObserver::new(Vec::new());
        let id = InvocationId::next();

        observer.on_error(id, &ApplicationError::failed("boom"), Duration::from_millis(1));

        let lines = lines(observer);
        let value: Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(value["level"], "error");
        assert_eq!(value["invocation"], id.to_string());
        assert_eq!(value["elapsed_us"], 1000);
        assert!(value["error"].as_str().unwrap().contains("boom"));
    }
}
