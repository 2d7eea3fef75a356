//! # opstats-infra
//!
//! Infrastructure wiring and runtime composition.
//! This crate depends on `adapters`, `config`, `ports`, `domain`, and `shared`.

/// Config loading helpers used by CLI surfaces.
pub mod config_check;
/// Environment validation helpers used by CLI surfaces.
pub mod env_check;
/// Stats logger stack selection helpers.
mod logger_factory;
/// Property profile helpers used by CLI surfaces.
pub mod profile_check;
/// NDJSON replay into a logger stack.
pub mod replay;

pub use config_check::{
    load_effective_config, load_effective_config_json, load_effective_config_toml,
};
pub use env_check::{InfraError, InfraResult, validate_env_parsing};
pub use logger_factory::{
    StatsLoggerStack, build_line_sink, build_stats_logger, build_stats_logger_with_sink,
};
pub use profile_check::build_profile_json;
pub use replay::{ReplaySummary, parse_stats_line, replay_stats_lines};

/// Returns the infra crate version.
#[must_use]
pub const fn infra_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
