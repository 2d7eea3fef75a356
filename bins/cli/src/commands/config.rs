//! Config command handlers.

use crate::error::CliError;
use crate::format::OutputMode;
use crate::{CliOutput, collect_scoped_env, format_error_output};
use opstats_infra::{load_effective_config_json, load_effective_config_toml};
use std::path::Path;

/// Print the effective config: TOML for text output, JSON otherwise.
pub fn run_config_show(
    mode: OutputMode,
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
) -> Result<CliOutput, CliError> {
    let env = collect_scoped_env("OPSTATS_");
    let rendered = if mode.is_json() {
        load_effective_config_json(&env, config_path, overrides_json)
    } else {
        load_effective_config_toml(&env, config_path, overrides_json)
    };

    Ok(match rendered {
        Ok(stdout) => CliOutput::ok(stdout),
        Err(error) => format_error_output(mode, &error),
    })
}
