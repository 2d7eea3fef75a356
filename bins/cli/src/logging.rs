//! Diagnostic logging setup.
//!
//! Diagnostics go to stderr so stdout stays reserved for command output and
//! for the `stdout` stats sink.

use opstats_config::ENV_LOG;
use tracing_subscriber::EnvFilter;

/// Warnings everywhere, plus every record from the `tracing` stats backend.
const DEFAULT_DIRECTIVE: &str = "warn,opstats::stats=info";

/// Install the global `tracing` subscriber.
///
/// The filter comes from `OPSTATS_LOG` and falls back to
/// [`DEFAULT_DIRECTIVE`] when the variable is unset or unparsable. A subscriber installed earlier wins.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
