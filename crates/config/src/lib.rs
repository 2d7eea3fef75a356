//! # opstats-config
//!
//! Stats logger configuration schema, validation, env overrides, and loading.
//! This crate depends on `shared` only.

/// Environment variable parsing and merging.
pub mod env;
/// Config loading helpers (env + file + overrides).
pub mod load;
/// Configuration schema types and helpers.
pub mod schema;

pub use schema::{
    BASE_FIELDS_MAX, CURRENT_CONFIG_VERSION, ConfigSchemaError, SinkConfig, SinkKind,
    StatsBackendKind, StatsConfig, ValidatedStatsConfig, parse_stats_config_json,
    parse_stats_config_toml,
};

pub use env::{
    ENV_BACKENDS, ENV_LOG, ENV_SINK, ENV_SINK_PATH, EnvParseError, StatsEnv, apply_env_overrides,
};
pub use load::{
    load_stats_config_from_path, load_stats_config_from_sources, load_stats_config_std_env,
    to_pretty_json, to_pretty_toml,
};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
