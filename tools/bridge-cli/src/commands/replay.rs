//! Replay of recorded invocations.

use std::fs;

use anyhow::{bail, Context as _, Result};
use bridge_observability::{Recording, ReplayOutcome};
use serde::Serialize;

use super::{observers, ReplayArgs};
use crate::apps;
use crate::context::Context;

#[derive(Debug, Serialize)]
struct ReplayReport {
    recording: String,
    #[serde(flatten)]
    outcome: ReplayOutcome,
}

/// Run the replay command.
pub async fn run(args: ReplayArgs, ctx: &Context) -> Result<()> {
    let demo = args.app.unwrap_or(ctx.config.app.demo);
    let bridge = apps::build(demo, &ctx.config)?.with_observer(observers(ctx)?);

    ctx.output.header(&format!("Replaying against {}", demo.name()));

    let progress = ctx.output.progress(args.recordings.len() as u64, "Replaying");
    let mut reports = Vec::with_capacity(args.recordings.len());

    for name in &args.recordings {
        progress.set_message(name.clone());
        let recording = load_recording(name, ctx)?;

        let result = bridge
            .invoke(&recording.scope, recording.body.as_deref())
            .await;
        reports.push(ReplayReport {
            recording: name.clone(),
            outcome: recording.compare_result(&result),
        });

        progress.inc(1);
    }

    progress.finish_and_clear();

    let diverged = reports.iter().filter(|r| !r.outcome.is_match()).count();

    if ctx.output.is_json() {
        ctx.output.json(&reports);
    } else {
        for report in &reports {
            print_report(report, ctx);
        }
        ctx.output.kv("Matched", &(reports.len() - diverged).to_string());
        ctx.output.kv("Diverged", &diverged.to_string());
    }

    if diverged > 0 {
        bail!("{} of {} recording(s) diverged", diverged, reports.len());
    }

    ctx.output.success("Replay complete");
    Ok(())
}

fn load_recording(name: &str, ctx: &Context) -> Result<Recording> {
    let path = ctx.recording_path(name)?;
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read recording: {}", path.display()))?;
    let recording = Recording::from_json(&content)
        .with_context(|| format!("Failed to parse recording: {}", path.display()))?;

    if recording.version > Recording::VERSION {
        bail!(
            "Recording {} has version {}, newest supported is {}",
            path.display(),
            recording.version,
            Recording::VERSION
        );
    }

    ctx.output.debug(&format!(
        "Loaded {} (recorded {})",
        path.display(),
        recording.recorded_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    Ok(recording)
}

fn print_report(report: &ReplayReport, ctx: &Context) {
    match &report.outcome {
        ReplayOutcome::Match => ctx.output.success(&report.recording),
        ReplayOutcome::Diverged {
            index,
            expected,
            actual,
        } => {
            ctx.output
                .warn(&format!("{}: diverged at event {}", report.recording, index));
            ctx.output.kv("expected", &event_text(expected.as_ref()));
            ctx.output.kv("actual", &event_text(actual.as_ref()));
        }
        ReplayOutcome::ErrorMismatch { expected, actual } => {
            ctx.output
                .warn(&format!("{}: failure differs", report.recording));
            ctx.output
                .kv("expected", expected.as_deref().unwrap_or("success"));
            ctx.output.kv("actual", actual.as_deref().unwrap_or("success"));
        }
    }
}

fn event_text<T: Serialize>(event: Option<&T>) -> String {
    match event {
        Some(event) => serde_json::to_string(event).unwrap_or_default(),
        None => "<end of log>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CliConfig, DemoApp};
    use crate::output::Output;
    use bridge_core::{Event, Scope};
    use bridge_protocol::EventLog;

    fn context(dir: &std::path::Path) -> Context {
        Context {
            config: CliConfig::default(),
            config_path: None,
            output: Output::new(false, true),
            cwd: dir.to_path_buf(),
        }
    }

    fn echo_recording(body: &str) -> Recording {
        let headers = vec![
            (b"content-type".to_vec(), b"application/octet-stream".to_vec()),
            (b"content-length".to_vec(), body.len().to_string().into_bytes()),
        ];
        Recording::new(
            Scope::http("POST", "/"),
            Some(body.as_bytes().to_vec()),
            EventLog::from(vec![
                Event::response_start(200, headers),
                Event::response_body(body),
            ]),
        )
    }

    fn save(ctx: &Context, name: &str, recording: &Recording) {
        let path = ctx.recording_path(name).unwrap();
        fs::write(path, recording.to_json().unwrap()).unwrap();
    }

    #[tokio::test]
    async fn test_replay_matching_recording() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        save(&ctx, "echo", &echo_recording("ping"));

        let args = ReplayArgs {
            recordings: vec!["echo".to_string()],
            app: Some(DemoApp::Echo),
        };

        run(args, &ctx).await.unwrap();
    }

    #[tokio::test]
    async fn test_replay_diverged_recording_fails() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let mut recording = echo_recording("ping");
        recording.events = EventLog::from(vec![Event::response_start(404, Vec::new())]);
        save(&ctx, "stale", &recording);

        let args = ReplayArgs {
            recordings: vec!["stale".to_string()],
            app: Some(DemoApp::Echo),
        };

        let err = run(args, &ctx).await.unwrap_err();
        assert!(err.to_string().contains("1 of 1"));
    }

    #[test]
    fn test_load_recording_rejects_newer_version() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let mut recording = echo_recording("x");
        recording.version = Recording::VERSION + 1;
        save(&ctx, "future", &recording);

        assert!(load_recording("future", &ctx).is_err());
    }

    #[test]
    fn test_event_text() {
        assert_eq!(event_text::<Event>(None), "<end of log>");
        assert!(event_text(Some(&Event::Disconnect)).contains("http.disconnect"));
    }
}
