//! Logger stack wiring tests: config in, records through, lines out.

use opstats_adapters::{LineSink, SinkError};
use opstats_config::{SinkConfig, SinkKind, StatsBackendKind, StatsConfig};
use opstats_domain::{CallStats, ResultCode, SearchStats, StatsKind};
use opstats_infra::{
    InfraResult, build_stats_logger, build_stats_logger_with_sink, replay_stats_lines,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Default)]
struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    fn parsed(&self) -> Vec<Value> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter_map(|line| serde_json::from_str(line.trim()).ok())
            .collect()
    }
}

impl LineSink for MemorySink {
    fn write_line(&self, line: &str) -> Result<(), SinkError> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
        Ok(())
    }
}

fn config_with(backends: Vec<StatsBackendKind>) -> InfraResult<opstats_config::ValidatedStatsConfig> {
    let mut base_fields = BTreeMap::new();
    base_fields.insert(Box::from("service"), Box::from("document-store"));
    let config = StatsConfig {
        backends,
        base_fields,
        ..StatsConfig::default()
    };
    Ok(config.validate_and_normalize()?)
}

#[test]
fn json_and_counting_backends_see_every_record() -> InfraResult<()> {
    let sink = Arc::new(MemorySink::default());
    let config = config_with(vec![StatsBackendKind::Json, StatsBackendKind::Counting])?;
    let stack = build_stats_logger_with_sink(&config, sink.clone());
    let logger = stack.logger();

    logger.log_call(CallStats {
        package_name: Box::from("com.example.notes"),
        total_latency_millis: 12,
        ..CallStats::default()
    });
    logger.log_search(SearchStats {
        status_code: ResultCode::InternalError,
        total_latency_millis: 30,
        ..SearchStats::default()
    });

    let lines = sink.parsed();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["kind"], "call");
    assert_eq!(lines[0]["fields"]["service"], "document-store");
    assert_eq!(lines[0]["stats"]["packageName"], "com.example.notes");
    assert_eq!(lines[1]["kind"], "search");

    let counts = stack.counts().ok_or_else(|| std::io::Error::other("counting disabled"))?;
    assert_eq!(counts.count(StatsKind::Call), 1);
    assert_eq!(counts.total_latency_millis(StatsKind::Search), 30);
    assert_eq!(stack.dropped(), 0);
    Ok(())
}

#[test]
fn telemetry_backend_emits_count_latency_and_success_per_record() -> InfraResult<()> {
    let sink = Arc::new(MemorySink::default());
    let config = config_with(vec![StatsBackendKind::Telemetry])?;
    let stack = build_stats_logger_with_sink(&config, sink.clone());

    stack.logger().log_call(CallStats::default());

    let metrics: Vec<String> = sink
        .parsed()
        .iter()
        .filter_map(|line| line["name"].as_str().map(str::to_string))
        .collect();
    assert_eq!(
        metrics,
        vec!["stats.call.count", "stats.call.latency", "stats.call.success"]
    );
    Ok(())
}

#[test]
fn replayed_json_output_reproduces_counts() -> InfraResult<()> {
    let sink = Arc::new(MemorySink::default());
    let config = config_with(vec![StatsBackendKind::Json])?;
    let writer = build_stats_logger_with_sink(&config, sink.clone());
    for latency in 0..5 {
        writer.logger().log_call(CallStats {
            total_latency_millis: latency,
            ..CallStats::default()
        });
    }
    writer.logger().log_search(SearchStats::default());

    let captured = sink
        .lines
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .concat();

    let reader_config = config_with(vec![StatsBackendKind::Counting])?;
    let reader = build_stats_logger_with_sink(&reader_config, sink.clone());
    let summary = replay_stats_lines(Cursor::new(captured), reader.logger().as_ref())?;

    assert_eq!(summary.accepted, 6);
    assert_eq!(summary.rejected, 0);
    let counts = reader.counts().ok_or_else(|| std::io::Error::other("counting disabled"))?;
    assert_eq!(counts.count(StatsKind::Call), 5);
    assert_eq!(counts.total_latency_millis(StatsKind::Call), 10);
    assert_eq!(counts.count(StatsKind::Search), 1);
    Ok(())
}

#[test]
fn file_sink_appends_lines() -> Result<(), Box<dyn std::error::Error>> {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let path = std::env::temp_dir().join(format!("opstats-infra-{unique}.ndjson"));
    let config = StatsConfig {
        backends: vec![StatsBackendKind::Json],
        sink: SinkConfig {
            kind: SinkKind::File,
            path: Some(path.to_string_lossy().to_string().into_boxed_str()),
        },
        ..StatsConfig::default()
    }
    .validate_and_normalize()?;

    let stack = build_stats_logger(&config)?;
    stack.logger().log_call(CallStats::default());
    stack.logger().log_call(CallStats::default());
    drop(stack);

    let contents = std::fs::read_to_string(&path)?;
    std::fs::remove_file(&path)?;
    assert_eq!(contents.lines().count(), 2);
    Ok(())
}
