//! Replay command handler.

use crate::error::CliError;
use crate::format::{OutputMode, pretty_json};
use crate::{CliOutput, collect_scoped_env, format_error_output, open_input};
use opstats_config::{SinkKind, ValidatedStatsConfig};
use opstats_infra::{
    InfraResult, ReplaySummary, StatsLoggerStack, build_stats_logger, load_effective_config,
    replay_stats_lines,
};
use opstats_shared::{ErrorCode, ErrorEnvelope};
use std::fmt::Write as _;
use std::path::Path;

/// Inputs for the replay command.
#[derive(Debug, Clone, Copy)]
pub struct ReplayCommandInput<'a> {
    pub input: Option<&'a Path>,
    pub config: Option<&'a Path>,
    pub overrides_json: Option<&'a str>,
}

/// Replay NDJSON records through the configured logger stack.
pub fn run_replay(mode: OutputMode, input: ReplayCommandInput<'_>) -> Result<CliOutput, CliError> {
    match replay(mode, input) {
        Ok((stack, summary)) => {
            let stdout = if mode.is_json() {
                format_replay_json(&stack, &summary)?
            } else {
                format_replay_text(&stack, &summary)
            };
            Ok(CliOutput::ok(stdout))
        },
        Err(error) => Ok(format_error_output(mode, &error)),
    }
}

fn replay(
    mode: OutputMode,
    input: ReplayCommandInput<'_>,
) -> InfraResult<(StatsLoggerStack, ReplaySummary)> {
    let env = collect_scoped_env("OPSTATS_");
    let config = load_effective_config(&env, input.config, input.overrides_json)?;
    ensure_stdout_is_free(mode, &config)?;
    let stack = build_stats_logger(&config)?;
    let reader = open_input(input.input)?;
    let summary = replay_stats_lines(reader, stack.logger().as_ref())?;
    tracing::info!(
        accepted = summary.accepted,
        rejected = summary.rejected,
        "replay finished"
    );
    Ok((stack, summary))
}

/// JSON output owns stdout; a sink writing stats lines there would corrupt it.
fn ensure_stdout_is_free(mode: OutputMode, config: &ValidatedStatsConfig) -> InfraResult<()> {
    if mode.is_json() && config.needs_sink() && config.sink.kind == SinkKind::Stdout {
        return Err(ErrorEnvelope::expected(
            ErrorCode::new("cli", "stdout_sink_conflict"),
            "the stdout sink cannot be combined with --output json; use stderr or a file sink",
        )
        .with_metadata("sink", SinkKind::Stdout.as_str())
        .with_metadata("output", "json"));
    }
    Ok(())
}

fn format_replay_text(stack: &StatsLoggerStack, summary: &ReplaySummary) -> String {
    let backends: Vec<&str> = stack.backends().iter().map(|backend| backend.as_str()).collect();
    let mut out = String::new();
    let _ = writeln!(out, "status: ok");
    let _ = writeln!(out, "backends: {}", backends.join(","));
    let _ = writeln!(out, "accepted: {}", summary.accepted);
    let _ = writeln!(out, "rejected: {}", summary.rejected);
    let _ = writeln!(out, "dropped: {}", stack.dropped());
    for (kind, count) in &summary.per_kind {
        let _ = writeln!(out, "count.{kind}: {count}");
    }
    if let Some(counts) = stack.counts() {
        for (kind, count) in counts.iter() {
            if count > 0 {
                let _ = writeln!(out, "latencyMillis.{kind}: {}", counts.total_latency_millis(kind));
            }
        }
    }
    out
}

fn format_replay_json(
    stack: &StatsLoggerStack,
    summary: &ReplaySummary,
) -> Result<String, CliError> {
    let latency = stack.counts().map(|counts| {
        counts
            .iter()
            .filter(|(_, count)| *count > 0)
            .map(|(kind, _)| {
                (
                    kind.as_str().to_string(),
                    serde_json::Value::from(counts.total_latency_millis(kind)),
                )
            })
            .collect::<serde_json::Map<_, _>>()
    });

    Ok(pretty_json(&serde_json::json!({
        "status": "ok",
        "backends": stack.backends(),
        "summary": serde_json::to_value(summary)?,
        "dropped": stack.dropped(),
        "latencyMillis": latency,
    }))?)
}
