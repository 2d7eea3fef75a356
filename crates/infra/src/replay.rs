//! Replay NDJSON stats records into a logger.
//!
//! Accepts bare records (`{"kind": "call", ...}`) and the line shape the JSON
//! logger writes (`{"timestampMs", "kind", "stats": {...}}`), so a captured
//! stream can be fed back through a different backend stack.

use crate::InfraResult;
use opstats_domain::StatsKind;
use opstats_ports::{StatsLoggerPort, StatsRecord};
use opstats_shared::ErrorEnvelope;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::BufRead;

/// Outcome of a replay run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaySummary {
    /// Records dispatched to the logger.
    pub accepted: u64,
    /// Non-blank lines that did not parse as a record.
    pub rejected: u64,
    /// Dispatched records per kind.
    pub per_kind: BTreeMap<StatsKind, u64>,
}

/// Read every line from `reader` and dispatch the parsed records to `logger`.
///
/// Blank lines are ignored. Lines that are not UTF-8 or do not parse as a
/// record are counted and skipped; only read failures abort the replay.
pub fn replay_stats_lines<R: BufRead>(
    mut reader: R,
    logger: &dyn StatsLoggerPort,
) -> InfraResult<ReplaySummary> {
    let mut summary = ReplaySummary::default();
    let mut buf = Vec::new();
    let mut line_number = 0_usize;

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(ErrorEnvelope::from)?;
        if read == 0 {
            break;
        }
        line_number += 1;

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line.trim(),
            Err(error) => {
                summary.rejected += 1;
                tracing::debug!(line = line_number, %error, "skipping non-UTF-8 stats line");
                continue;
            },
        };
        if line.is_empty() {
            continue;
        }

        match parse_stats_line(line) {
            Ok(record) => {
                *summary.per_kind.entry(record.kind()).or_default() += 1;
                summary.accepted += 1;
                logger.log_stats(record);
            },
            Err(error) => {
                summary.rejected += 1;
                tracing::debug!(line = line_number, %error, "skipping invalid stats line");
            },
        }
    }

    Ok(summary)
}

/// Parse one NDJSON line into a record.
pub fn parse_stats_line(line: &str) -> Result<StatsRecord, serde_json::Error> {
    let value = match serde_json::from_str(line)? {
        Value::Object(mut envelope) => match envelope.remove("stats") {
            Some(Value::Object(mut stats)) => {
                if let Some(kind) = envelope.remove("kind") {
                    stats.insert("kind".to_string(), kind);
                }
                Value::Object(stats)
            },
            Some(other) => {
                envelope.insert("stats".to_string(), other);
                Value::Object(envelope)
            },
            None => Value::Object(envelope),
        },
        other => other,
    };
    serde_json::from_value(value)
}
