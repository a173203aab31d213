//! Single invocation of a demo application.

use std::fs;
use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use bridge_core::{Event, Scope};
use bridge_observability::{Recording, RecordingObserver};
use bridge_protocol::EventLog;

use super::{observers, InvokeArgs};
use crate::apps;
use crate::context::Context;
use crate::output::{format_bytes, status_badge};

/// Run the invoke command.
pub async fn run(args: InvokeArgs, ctx: &Context) -> Result<()> {
    let demo = args.app.unwrap_or(ctx.config.app.demo);
    let scope = build_scope(&args, ctx)?;
    let body = read_body(&args, ctx)?;

    let recorder = args.record.as_ref().map(|_| Arc::new(RecordingObserver::new()));
    let mut observers = observers(ctx)?;
    if let Some(recorder) = &recorder {
        observers = observers.with_shared(recorder.clone());
    }
    let bridge = apps::build(demo, &ctx.config)?.with_observer(observers);

    ctx.output.debug(&format!(
        "Invoking {} with {} {}",
        demo.name(),
        scope.method().unwrap_or("-"),
        scope.path().unwrap_or("-")
    ));
    let result = bridge.invoke(&scope, body.as_deref()).await;

    if let (Some(name), Some(recorder)) = (&args.record, &recorder) {
        for recording in recorder.take() {
            save_recording(name, &recording, ctx)?;
        }
    }

    let log = result.with_context(|| format!("Application '{}' failed", demo.name()))?;
    print_log(&log, ctx);

    Ok(())
}

fn build_scope(args: &InvokeArgs, ctx: &Context) -> Result<Scope> {
    let mut scope = match &args.scope {
        Some(path) => {
            let path = ctx.resolve_path(path);
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read scope file: {}", path.display()))?;
            serde_json::from_str::<Scope>(&content)
                .with_context(|| format!("Failed to parse scope file: {}", path.display()))?
        }
        None => Scope::http(&args.method, args.path.clone()),
    };

    if let Some(query) = &args.query {
        scope = scope.with_query(query.clone());
    }
    for header in &args.headers {
        let (name, value) = parse_header(header)?;
        scope = scope.with_header(name, value);
    }

    Ok(scope)
}

fn read_body(args: &InvokeArgs, ctx: &Context) -> Result<Option<Vec<u8>>> {
    if let Some(body) = &args.body {
        return Ok(Some(body.clone().into_bytes()));
    }
    match &args.body_file {
        Some(path) => {
            let path = ctx.resolve_path(path);
            let body = fs::read(&path)
                .with_context(|| format!("Failed to read body file: {}", path.display()))?;
            Ok(Some(body))
        }
        None => Ok(None),
    }
}

/// Split a "name: value" header argument.
fn parse_header(header: &str) -> Result<(&str, &str)> {
    let Some((name, value)) = header.split_once(':') else {
        bail!("Invalid header '{}': expected \"name: value\"", header);
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("Invalid header '{}': empty name", header);
    }
    Ok((name, value.trim()))
}

fn save_recording(name: &str, recording: &Recording, ctx: &Context) -> Result<()> {
    let path = ctx.recordings_dir()?.join(format!("{}.json", name));
    if path.exists() {
        ctx.output.warn(&format!("Overwriting recording: {}", path.display()));
    }

    fs::write(&path, recording.to_json()?)
        .with_context(|| format!("Failed to write recording: {}", path.display()))?;
    ctx.output.success(&format!("Recorded: {}", path.display()));

    Ok(())
}

fn describe(event: &Event) -> String {
    match event {
        Event::ResponseStart { status, headers } => {
            format!("{} status={} headers={}", event.kind(), status, headers.len())
        }
        Event::ResponseBody { body, more_body } => format!(
            "{} {} more_body={}",
            event.kind(),
            format_bytes(body.len() as u64),
            more_body
        ),
        other => other.kind().to_string(),
    }
}

fn print_log(log: &EventLog, ctx: &Context) {
    if ctx.output.is_json() {
        ctx.output.json(log);
        return;
    }

    ctx.output.header("Events");
    for (i, event) in log.iter().enumerate() {
        ctx.output.step(i + 1, log.len(), &describe(event));
    }

    match log.response() {
        Ok(response) => {
            ctx.output.header("Response");
            ctx.output.kv("Status", &status_badge(response.status));
            for (name, value) in &response.headers {
                ctx.output.kv(name, value);
            }
            if !response.complete {
                ctx.output.warn("Response body was not finished");
            }
            match response.text() {
                Ok(text) => ctx.output.raw(text),
                Err(_) => ctx.output.info(&format!(
                    "<{} binary body>",
                    format_bytes(response.body.len() as u64)
                )),
            }
        }
        Err(e) => ctx.output.warn(&format!("No response: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CliConfig;
    use crate::output::Output;

    fn args() -> InvokeArgs {
        InvokeArgs {
            method: "post".to_string(),
            path: "/cart".to_string(),
            headers: vec!["Content-Type: application/json".to_string()],
            query: Some("id=7".to_string()),
            body: Some("{}".to_string()),
            body_file: None,
            scope: None,
            app: None,
            record: None,
        }
    }

    fn context(dir: &std::path::Path) -> Context {
        Context {
            config: CliConfig::default(),
            config_path: None,
            output: Output::new(false, true),
            cwd: dir.to_path_buf(),
        }
    }

    #[test]
    fn test_parse_header() {
        assert_eq!(parse_header("X-Token: abc").unwrap(), ("X-Token", "abc"));
        assert_eq!(parse_header("x-empty:").unwrap(), ("x-empty", ""));
        assert!(parse_header("no-colon").is_err());
        assert!(parse_header(": value").is_err());
    }

    #[test]
    fn test_build_scope_from_flags() {
        let dir = tempfile::tempdir().unwrap();

        let scope = build_scope(&args(), &context(dir.path())).unwrap();

        assert_eq!(scope.method(), Some("POST"));
        assert_eq!(scope.path(), Some("/cart"));
        assert_eq!(scope.query_string(), Some("id=7"));
        assert_eq!(scope.header("content-type").as_deref(), Some("application/json"));
    }

    #[test]
    fn test_build_scope_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let base = Scope::http("PUT", "/items").with_header("x-base", "1");
        fs::write(dir.path().join("scope.json"), serde_json::to_string(&base).unwrap()).unwrap();
        let mut args = args();
        args.scope = Some("scope.json".to_string());
        args.query = None;

        let scope = build_scope(&args, &context(dir.path())).unwrap();

        assert_eq!(scope.method(), Some("PUT"));
        assert_eq!(scope.path(), Some("/items"));
        assert_eq!(scope.headers().len(), 2);
    }

    #[test]
    fn test_read_body_from_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("body.bin"), [0u8, 159, 146, 150]).unwrap();
        let mut args = args();
        args.body = None;
        args.body_file = Some("body.bin".to_string());

        let body = read_body(&args, &context(dir.path())).unwrap();

        assert_eq!(body, Some(vec![0u8, 159, 146, 150]));
    }

    #[test]
    fn test_describe_events() {
        assert_eq!(
            describe(&Event::response_start(201, Vec::new())),
            "http.response.start status=201 headers=0"
        );
        assert_eq!(
            describe(&Event::response_body("abc")),
            "http.response.body 3 B more_body=false"
        );
        assert_eq!(describe(&Event::Disconnect), "http.disconnect");
    }
}
