//! Environment variable parsing and env-to-config merging.
//!
//! Env parsing is strict (invalid values fail fast) and deterministic (CSV
//! lists normalize to sorted, deduplicated values).

use crate::schema::{SinkKind, StatsBackendKind, StatsConfig, ValidatedStatsConfig};
use opstats_shared::{ErrorCode, ErrorEnvelope};
use std::collections::BTreeMap;
use std::fmt;

/// Env var: comma-separated backend list.
pub const ENV_BACKENDS: &str = "OPSTATS_BACKENDS";
/// Env var: sink kind.
pub const ENV_SINK: &str = "OPSTATS_SINK";
/// Env var: sink file path.
pub const ENV_SINK_PATH: &str = "OPSTATS_SINK_PATH";
/// Env var: `tracing` filter directive for internal diagnostics.
pub const ENV_LOG: &str = "OPSTATS_LOG";

const BACKENDS_CSV_MAX: usize = 16;

/// Env overrides, parsed but not yet applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsEnv {
    /// Backend list override.
    pub backends: Option<Vec<StatsBackendKind>>,
    /// Sink kind override.
    pub sink: Option<SinkKind>,
    /// Sink path override.
    pub sink_path: Option<Box<str>>,
}

impl StatsEnv {
    /// Parse env overrides from a key/value map (useful for tests and fixtures).
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, EnvParseError> {
        Ok(Self {
            backends: parse_optional_backends(map, ENV_BACKENDS)?,
            sink: parse_optional_sink(map, ENV_SINK)?,
            sink_path: parse_optional_trimmed_string(map, ENV_SINK_PATH)?,
        })
    }

    /// Parse env overrides from the current process environment.
    pub fn from_std_env() -> Result<Self, EnvParseError> {
        let map = [ENV_BACKENDS, ENV_SINK, ENV_SINK_PATH]
            .into_iter()
            .filter_map(|name| std::env::var(name).ok().map(|value| (name.to_string(), value)))
            .collect();
        Self::from_map(&map)
    }

    /// Returns true when no override is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.backends.is_none() && self.sink.is_none() && self.sink_path.is_none()
    }
}

/// Apply env overrides to a base config (env wins over file/default values).
pub fn apply_env_overrides(
    base: StatsConfig,
    env: &StatsEnv,
) -> Result<ValidatedStatsConfig, ErrorEnvelope> {
    let mut config = base;
    if let Some(backends) = &env.backends {
        config.backends.clone_from(backends);
    }
    if let Some(sink) = env.sink {
        config.sink.kind = sink;
    }
    if let Some(path) = &env.sink_path {
        config.sink.path = Some(path.clone());
    }

    config.validate_and_normalize().map_err(Into::into)
}

/// Validation failures when parsing env variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvParseError {
    /// An env var was present but empty after trimming.
    EmptyValue {
        /// Env var name.
        var: &'static str,
    },
    /// Enum env var had an invalid value.
    InvalidEnum {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// CSV list exceeds a safety limit.
    CsvTooLarge {
        /// Env var name.
        var: &'static str,
        /// Number of parsed items.
        len: usize,
        /// Maximum allowed.
        max: usize,
    },
}

impl EnvParseError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyValue { .. } => ErrorCode::new("config", "empty_env_var"),
            Self::InvalidEnum { .. } => ErrorCode::new("config", "invalid_env_enum"),
            Self::CsvTooLarge { .. } => ErrorCode::new("config", "invalid_env_csv"),
        }
    }
}

impl fmt::Display for EnvParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyValue { var } => write!(formatter, "{var} must be non-empty"),
            Self::InvalidEnum { var, .. } => write!(formatter, "{var} has an unsupported value"),
            Self::CsvTooLarge { var, len, max } => {
                write!(formatter, "{var} is too large ({len} items, max {max})")
            },
        }
    }
}

impl std::error::Error for EnvParseError {}

impl From<EnvParseError> for ErrorEnvelope {
    fn from(error: EnvParseError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let envelope = Self::expected(code, message);

        match error {
            EnvParseError::EmptyValue { var } => envelope.with_metadata("env_var", var),
            EnvParseError::InvalidEnum { var, value } => envelope
                .with_metadata("env_var", var)
                .with_metadata("value", value),
            EnvParseError::CsvTooLarge { var, len, max } => envelope
                .with_metadata("env_var", var)
                .with_metadata("len", len.to_string())
                .with_metadata("max", max.to_string()),
        }
    }
}

fn parse_optional_trimmed_string(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Box<str>>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }

    Ok(Some(trimmed.to_owned().into_boxed_str()))
}

fn parse_optional_sink(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<SinkKind>, EnvParseError> {
    parse_optional_trimmed_string(map, var)?
        .map(|value| {
            SinkKind::parse(&value).ok_or_else(|| EnvParseError::InvalidEnum {
                var,
                value: value.into_string(),
            })
        })
        .transpose()
}

fn parse_optional_backends(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Vec<StatsBackendKind>>, EnvParseError> {
    let Some(raw) = parse_optional_trimmed_string(map, var)? else {
        return Ok(None);
    };

    let entries: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .collect();
    if entries.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }
    if entries.len() > BACKENDS_CSV_MAX {
        return Err(EnvParseError::CsvTooLarge {
            var,
            len: entries.len(),
            max: BACKENDS_CSV_MAX,
        });
    }

    let mut backends = entries
        .into_iter()
        .map(|entry| {
            StatsBackendKind::parse(entry).ok_or_else(|| EnvParseError::InvalidEnum {
                var,
                value: entry.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    backends.sort_unstable();
    backends.dedup();
    Ok(Some(backends))
}
