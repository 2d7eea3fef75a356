//! JSON-lines stats logger.

use crate::sink::LineSink;
use opstats_ports::{StatsLoggerPort, StatsRecord};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Fields attached to every emitted line.
pub type StatsFields = BTreeMap<Box<str>, Value>;

/// Logger writing one JSON object per record to a [`LineSink`].
///
/// Line shape: `{"timestampMs", "kind", "fields"?, "stats"}`. Lines the sink
/// rejects are counted in [`JsonStatsLogger::dropped`].
pub struct JsonStatsLogger {
    sink: Arc<dyn LineSink>,
    base_fields: StatsFields,
    dropped: AtomicU64,
}

impl JsonStatsLogger {
    /// Create a logger backed by the provided sink.
    #[must_use]
    pub fn new(sink: Arc<dyn LineSink>) -> Self {
        Self {
            sink,
            base_fields: StatsFields::new(),
            dropped: AtomicU64::new(0),
        }
    }

    /// Set fields applied to every line.
    #[must_use]
    pub fn with_base_fields(mut self, fields: StatsFields) -> Self {
        self.base_fields = fields;
        self
    }

    /// Lines that could not be encoded or written.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn encode(&self, record: &StatsRecord) -> Result<String, serde_json::Error> {
        let mut stats = match serde_json::to_value(record)? {
            Value::Object(map) => map,
            other => {
                let mut map = serde_json::Map::new();
                map.insert("value".to_string(), other);
                map
            },
        };
        stats.remove("kind");

        let mut payload = serde_json::Map::new();
        payload.insert("timestampMs".to_string(), Value::from(now_epoch_ms()));
        payload.insert(
            "kind".to_string(),
            Value::String(record.kind().as_str().to_string()),
        );
        if !self.base_fields.is_empty() {
            let fields = self
                .base_fields
                .iter()
                .map(|(key, value)| (key.to_string(), value.clone()))
                .collect();
            payload.insert("fields".to_string(), Value::Object(fields));
        }
        payload.insert("stats".to_string(), Value::Object(stats));

        let mut line = serde_json::to_string(&Value::Object(payload))?;
        line.push('\n');
        Ok(line)
    }
}

impl StatsLoggerPort for JsonStatsLogger {
    fn log_stats(&self, record: StatsRecord) {
        let line = match self.encode(&record) {
            Ok(line) => line,
            Err(error) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(kind = %record.kind(), %error, "stats record could not be encoded");
                return;
            },
        };

        if let Err(error) = self.sink.write_line(&line) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                kind = %record.kind(),
                sink = self.sink.name(),
                %error,
                "stats line dropped"
            );
        }
    }
}

pub(crate) fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|duration| u64::try_from(duration.as_millis()).ok())
        .unwrap_or_default()
}
