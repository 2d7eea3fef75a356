//! Stats logger configuration schema, defaults, validation, and normalization.
//!
//! - Deserialization uses `serde` (JSON or TOML).
//! - Validation is manual and returns typed errors mapped to `ErrorEnvelope`.
//! - Normalization enforces stable ordering for list fields.

use opstats_shared::{ErrorCode, ErrorEnvelope};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Current supported configuration schema version.
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Maximum number of base fields attached to every JSON line.
pub const BASE_FIELDS_MAX: usize = 32;

/// A stats logger backend.
///
/// Declaration order is the normalized order of `backends`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsBackendKind {
    /// Lock-free per-kind counters.
    Counting,
    /// JSON lines written to the configured sink.
    Json,
    /// Discard everything.
    Noop,
    /// Counter and timer metrics written to the configured sink.
    Telemetry,
    /// `tracing` events.
    Tracing,
}

impl StatsBackendKind {
    /// Every backend, in normalized order.
    pub const ALL: [Self; 5] = [
        Self::Counting,
        Self::Json,
        Self::Noop,
        Self::Telemetry,
        Self::Tracing,
    ];

    /// Stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Counting => "counting",
            Self::Json => "json",
            Self::Noop => "noop",
            Self::Telemetry => "telemetry",
            Self::Tracing => "tracing",
        }
    }

    /// Parse a label (case-insensitive).
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let normalized = input.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
    }

    /// Returns true when the backend writes to the configured sink.
    #[must_use]
    pub const fn uses_sink(self) -> bool {
        matches!(self, Self::Json | Self::Telemetry)
    }
}

impl fmt::Display for StatsBackendKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Destination for line-oriented backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    /// Standard error.
    #[default]
    Stderr,
    /// Standard output.
    Stdout,
    /// Append to `sink.path`.
    File,
}

impl SinkKind {
    /// Stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stderr => "stderr",
            Self::Stdout => "stdout",
            Self::File => "file",
        }
    }

    /// Parse a label (case-insensitive).
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "stderr" => Some(Self::Stderr),
            "stdout" => Some(Self::Stdout),
            "file" => Some(Self::File),
            _ => None,
        }
    }
}

/// Sink settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct SinkConfig {
    /// Sink kind.
    pub kind: SinkKind,
    /// File path; required for [`SinkKind::File`], ignored otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Box<str>>,
}

/// Top-level stats logger configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct StatsConfig {
    /// Schema version for forward-compatible migrations.
    pub version: u32,
    /// Enabled backends.
    pub backends: Vec<StatsBackendKind>,
    /// Destination for line-oriented backends.
    pub sink: SinkConfig,
    /// Fields attached to every JSON line and metric.
    pub base_fields: BTreeMap<Box<str>, Box<str>>,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_CONFIG_VERSION,
            backends: vec![StatsBackendKind::Tracing],
            sink: SinkConfig::default(),
            base_fields: BTreeMap::new(),
        }
    }
}

impl StatsConfig {
    /// Validate and normalize the config.
    pub fn validate_and_normalize(mut self) -> Result<ValidatedStatsConfig, ConfigSchemaError> {
        self.validate_version()?;

        self.backends.sort_unstable();
        self.backends.dedup();
        if self.backends.is_empty() {
            return Err(ConfigSchemaError::EmptyBackends);
        }

        self.sink.path = self
            .sink
            .path
            .take()
            .map(|path| path.trim().to_owned().into_boxed_str())
            .filter(|path| !path.is_empty());
        match self.sink.kind {
            SinkKind::File if self.sink.path.is_none() => {
                return Err(ConfigSchemaError::MissingSinkPath);
            },
            SinkKind::File => {},
            SinkKind::Stderr | SinkKind::Stdout => self.sink.path = None,
        }

        if self.base_fields.len() > BASE_FIELDS_MAX {
            return Err(ConfigSchemaError::ListTooLarge {
                section: "root",
                field: "baseFields",
                len: self.base_fields.len(),
                max: BASE_FIELDS_MAX,
            });
        }
        if let Some(key) = self.base_fields.keys().find(|key| !is_valid_field_key(key)) {
            return Err(ConfigSchemaError::InvalidFieldKey {
                key: key.to_string(),
            });
        }

        Ok(ValidatedStatsConfig { raw: self })
    }

    const fn validate_version(&self) -> Result<(), ConfigSchemaError> {
        if self.version != CURRENT_CONFIG_VERSION {
            return Err(ConfigSchemaError::UnsupportedVersion {
                found: self.version,
                supported: CURRENT_CONFIG_VERSION,
            });
        }
        Ok(())
    }
}

fn is_valid_field_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars.next().is_some_and(|first| first.is_ascii_alphabetic())
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

/// Config that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedStatsConfig {
    raw: StatsConfig,
}

impl ValidatedStatsConfig {
    /// Borrow the raw config.
    #[must_use]
    pub const fn as_ref(&self) -> &StatsConfig {
        &self.raw
    }

    /// Consume the wrapper and return the raw config.
    #[must_use]
    pub fn into_inner(self) -> StatsConfig {
        self.raw
    }

    /// Returns true when any enabled backend writes to the sink.
    #[must_use]
    pub fn needs_sink(&self) -> bool {
        self.raw.backends.iter().any(|backend| backend.uses_sink())
    }
}

impl AsRef<StatsConfig> for ValidatedStatsConfig {
    fn as_ref(&self) -> &StatsConfig {
        &self.raw
    }
}

impl std::ops::Deref for ValidatedStatsConfig {
    type Target = StatsConfig;

    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}

/// Validation failures for [`StatsConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSchemaError {
    /// The config version is not supported by this binary.
    UnsupportedVersion {
        /// Version found in the config.
        found: u32,
        /// Version supported by this crate.
        supported: u32,
    },
    /// `backends` is empty.
    EmptyBackends,
    /// `sink.kind` is `file` without a `sink.path`.
    MissingSinkPath,
    /// A list or map field exceeds the maximum allowed size.
    ListTooLarge {
        /// Schema section.
        section: &'static str,
        /// Field name in the config file.
        field: &'static str,
        /// Number of entries.
        len: usize,
        /// Maximum allowed number of entries.
        max: usize,
    },
    /// A `baseFields` key violates the allowed pattern.
    InvalidFieldKey {
        /// Offending key.
        key: String,
    },
}

impl ConfigSchemaError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedVersion { .. } => ErrorCode::new("config", "unsupported_version"),
            Self::EmptyBackends => ErrorCode::new("config", "empty_backends"),
            Self::MissingSinkPath => ErrorCode::new("config", "missing_sink_path"),
            Self::ListTooLarge { .. } => ErrorCode::new("config", "list_too_large"),
            Self::InvalidFieldKey { .. } => ErrorCode::new("config", "invalid_field_key"),
        }
    }
}

impl fmt::Display for ConfigSchemaError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { found, supported } => {
                write!(
                    formatter,
                    "unsupported config version: {found} (supported: {supported})"
                )
            },
            Self::EmptyBackends => formatter.write_str("backends must list at least one backend"),
            Self::MissingSinkPath => formatter.write_str("sink.path is required when sink.kind is file"),
            Self::ListTooLarge {
                section,
                field,
                len,
                max,
            } => write!(
                formatter,
                "{section}.{field} must have at most {max} entries (got {len})"
            ),
            Self::InvalidFieldKey { key } => {
                write!(formatter, "baseFields key must match /^[A-Za-z][A-Za-z0-9_]*$/: {key}")
            },
        }
    }
}

impl std::error::Error for ConfigSchemaError {}

impl From<ConfigSchemaError> for ErrorEnvelope {
    fn from(error: ConfigSchemaError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let envelope = Self::expected(code, message);

        match error {
            ConfigSchemaError::UnsupportedVersion { found, supported } => envelope
                .with_metadata("found", found.to_string())
                .with_metadata("supported", supported.to_string()),
            ConfigSchemaError::EmptyBackends => envelope.with_metadata("field", "backends"),
            ConfigSchemaError::MissingSinkPath => envelope.with_metadata("field", "sink.path"),
            ConfigSchemaError::ListTooLarge {
                section,
                field,
                len,
                max,
            } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field)
                .with_metadata("len", len.to_string())
                .with_metadata("max", max.to_string()),
            ConfigSchemaError::InvalidFieldKey { key } => envelope.with_metadata("key", key),
        }
    }
}

/// Parse a config from a JSON string, applying validation and normalization.
pub fn parse_stats_config_json(input: &str) -> Result<ValidatedStatsConfig, ErrorEnvelope> {
    let config: StatsConfig = serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid config JSON: {error}"),
        )
    })?;

    config.validate_and_normalize().map_err(Into::into)
}

/// Parse a config from a TOML string, applying validation and normalization.
pub fn parse_stats_config_toml(input: &str) -> Result<ValidatedStatsConfig, ErrorEnvelope> {
    let config: StatsConfig = toml::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_toml"),
            format!("invalid config TOML: {error}"),
        )
    })?;

    config.validate_and_normalize().map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn defaults_validate() -> Result<(), ConfigSchemaError> {
        let config = StatsConfig::default().validate_and_normalize()?;
        assert_eq!(config.backends, vec![StatsBackendKind::Tracing]);
        assert_eq!(config.sink.kind, SinkKind::Stderr);
        assert!(!config.needs_sink());
        Ok(())
    }

    #[test]
    fn backends_are_sorted_and_deduplicated() -> Result<(), Box<dyn Error>> {
        let config = parse_stats_config_json(
            r#"{ "backends": ["tracing", "json", "counting", "json"] }"#,
        )?;
        assert_eq!(
            config.backends,
            vec![
                StatsBackendKind::Counting,
                StatsBackendKind::Json,
                StatsBackendKind::Tracing
            ]
        );
        assert!(config.needs_sink());
        Ok(())
    }

    #[test]
    fn file_sink_requires_path() {
        let error = parse_stats_config_json(r#"{ "sink": { "kind": "file", "path": "  " } }"#).err();
        assert_eq!(
            error.map(|error| error.code),
            Some(ErrorCode::new("config", "missing_sink_path"))
        );
    }

    #[test]
    fn path_is_dropped_for_stream_sinks() -> Result<(), Box<dyn Error>> {
        let config =
            parse_stats_config_json(r#"{ "sink": { "kind": "stdout", "path": "ignored.log" } }"#)?;
        assert_eq!(config.sink.path, None);
        Ok(())
    }

    #[test]
    fn invalid_field_keys_are_rejected() {
        let error = parse_stats_config_json(r#"{ "baseFields": { "9lives": "x" } }"#).err();
        let Some(error) = error else {
            return;
        };
        assert_eq!(error.code, ErrorCode::new("config", "invalid_field_key"));
        assert_eq!(error.metadata_value("key"), Some("9lives"));
    }

    #[test]
    fn too_many_base_fields_are_rejected() {
        let fields: BTreeMap<Box<str>, Box<str>> = (0..=BASE_FIELDS_MAX)
            .map(|index| (format!("field{index}").into_boxed_str(), Box::from("v")))
            .collect();
        let config = StatsConfig {
            base_fields: fields,
            ..StatsConfig::default()
        };
        assert!(matches!(
            config.validate_and_normalize(),
            Err(ConfigSchemaError::ListTooLarge { .. })
        ));
    }

    #[test]
    fn unknown_fields_and_versions_fail() {
        let error = parse_stats_config_json(r#"{ "backend": ["json"] }"#).err();
        assert_eq!(
            error.map(|error| error.code),
            Some(ErrorCode::new("config", "invalid_json"))
        );

        let error = parse_stats_config_json(r#"{ "version": 2 }"#).err();
        assert_eq!(
            error.map(|error| error.code),
            Some(ErrorCode::new("config", "unsupported_version"))
        );
    }

    #[test]
    fn empty_backends_fail() {
        let error = parse_stats_config_toml("backends = []\n").err();
        assert_eq!(
            error.map(|error| error.code),
            Some(ErrorCode::new("config", "empty_backends"))
        );
    }

    #[test]
    fn backend_labels_parse() {
        assert_eq!(StatsBackendKind::parse(" JSON "), Some(StatsBackendKind::Json));
        assert_eq!(StatsBackendKind::parse("otlp"), None);
        assert_eq!(SinkKind::parse("File"), Some(SinkKind::File));
    }
}
