//! CLI binary entrypoint.

mod commands;
mod error;
mod format;
mod logging;

use clap::{Parser, Subcommand};
use commands::{ReplayCommandInput, run_config_show, run_info, run_profile, run_replay};
use error::{CliError, ExitCode};
use format::{OutputArgs, OutputMode};
use opstats_infra::InfraError;
use opstats_shared::ErrorEnvelope;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(
    name = "opstats",
    version,
    about = "Operational stats replay and vehicle property profile CLI",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    output: OutputArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show build and version details.
    Info,
    /// Config-related commands.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Dispatch NDJSON stats records to the configured logger stack.
    Replay {
        /// NDJSON input file (`-` or omitted reads stdin).
        #[arg(long)]
        input: Option<PathBuf>,
        /// Optional config file path (JSON/TOML).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Partial config JSON applied over the file.
        #[arg(long)]
        overrides_json: Option<String>,
    },
    /// Build a property profile from a JSON description and print it.
    Profile {
        /// Profile JSON file (`-` reads stdin).
        #[arg(long)]
        input: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Print the effective config (defaults, file, overrides, env).
    Show {
        /// Optional config file path (JSON/TOML).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Partial config JSON applied over the file.
        #[arg(long)]
        overrides_json: Option<String>,
    },
}

pub(crate) struct CliOutput {
    stdout: String,
    stderr: String,
    exit_code: ExitCode,
}

impl CliOutput {
    pub(crate) const fn ok(stdout: String) -> Self {
        Self {
            stdout,
            stderr: String::new(),
            exit_code: ExitCode::Ok,
        }
    }
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    logging::init_tracing();
    let mode = OutputMode::from_args(&cli.output);

    match run(&cli.command, mode) {
        Ok(output) => match write_output(&output) {
            Ok(()) => std::process::ExitCode::from(output.exit_code.as_u8()),
            Err(error) => exit_with_error(&error),
        },
        Err(error) => exit_with_error(&error),
    }
}

fn exit_with_error(error: &CliError) -> std::process::ExitCode {
    let _ = writeln!(io::stderr(), "error: {error}");
    std::process::ExitCode::from(error.exit_code().as_u8())
}

fn run(command: &Commands, mode: OutputMode) -> Result<CliOutput, CliError> {
    match command {
        Commands::Info => run_info(mode),
        Commands::Config { command } => match command {
            ConfigCommands::Show {
                config,
                overrides_json,
            } => run_config_show(mode, config.as_deref(), overrides_json.as_deref()),
        },
        Commands::Replay {
            input,
            config,
            overrides_json,
        } => run_replay(
            mode,
            ReplayCommandInput {
                input: input.as_deref(),
                config: config.as_deref(),
                overrides_json: overrides_json.as_deref(),
            },
        ),
        Commands::Profile { input } => run_profile(mode, Some(input.as_path())),
    }
}

/// Render an infra error: JSON on stdout in JSON mode, text on stderr otherwise.
pub(crate) fn format_error_output(mode: OutputMode, error: &InfraError) -> CliOutput {
    let exit_code = ExitCode::for_envelope(error);
    if mode.is_json() {
        let payload = serde_json::json!({
            "status": "error",
            "error": {
                "code": error.code.to_string(),
                "kind": error.kind.to_string(),
                "class": error.class.to_string(),
                "message": error.message,
                "metadata": error.metadata,
            }
        });
        // This is a CLI boundary, so JSON serialization errors are internal.
        let stdout = format::pretty_json(&payload).unwrap_or_else(|_| {
            "{\"status\":\"error\",\"error\":{\"code\":\"core:internal\",\"message\":\"internal error\"}}\n"
                .to_string()
        });
        return CliOutput {
            stdout,
            stderr: String::new(),
            exit_code,
        };
    }

    let mut stderr = format!("error: {}: {}\n", error.code, error.message);
    for (key, value) in &error.metadata {
        stderr.push_str(&format!("  {key}: {value}\n"));
    }
    CliOutput {
        stdout: String::new(),
        stderr,
        exit_code,
    }
}

/// Open a line reader over a file, or stdin for `-` / no path.
pub(crate) fn open_input(path: Option<&Path>) -> Result<Box<dyn BufRead>, InfraError> {
    match path {
        Some(path) if path != Path::new("-") => {
            let file = File::open(path).map_err(|error| {
                ErrorEnvelope::from(error).with_metadata("path", path.to_string_lossy().to_string())
            })?;
            Ok(Box::new(BufReader::new(file)))
        },
        _ => Ok(Box::new(io::stdin().lock())),
    }
}

/// Read a whole input file, or stdin for `-` / no path.
pub(crate) fn read_input_text(path: Option<&Path>) -> Result<String, InfraError> {
    let mut reader = open_input(path)?;
    let mut buf = String::new();
    reader.read_to_string(&mut buf).map_err(ErrorEnvelope::from)?;
    Ok(buf)
}

fn write_output(output: &CliOutput) -> Result<(), CliError> {
    let mut stdout = io::stdout();
    stdout.write_all(output.stdout.as_bytes())?;
    stdout.flush()?;

    if !output.stderr.is_empty() {
        let mut stderr = io::stderr();
        stderr.write_all(output.stderr.as_bytes())?;
        stderr.flush()?;
    }

    Ok(())
}

pub(crate) fn collect_scoped_env(prefix: &str) -> BTreeMap<String, String> {
    std::env::vars()
        .filter(|(key, _)| key.starts_with(prefix))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::OutputFormat;
    use clap::CommandFactory;
    use opstats_shared::{ErrorClass, ErrorCode};

    const JSON_MODE: OutputMode = OutputMode {
        format: OutputFormat::Json,
    };
    const TEXT_MODE: OutputMode = OutputMode {
        format: OutputFormat::Text,
    };

    #[test]
    fn version_flag_is_supported() {
        let result = Cli::command().try_get_matches_from(["opstats", "--version"]);
        let is_version = matches!(
            result,
            Err(error) if error.kind() == clap::error::ErrorKind::DisplayVersion
        );

        assert!(is_version, "expected clap to render version");
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn exit_codes_for_errors() -> Result<(), Box<dyn std::error::Error>> {
        let io_error = CliError::Io(io::Error::other("io"));
        let serialization_error = match serde_json::from_str::<serde_json::Value>("not-json") {
            Ok(_) => return Err("expected serialization error".into()),
            Err(error) => CliError::Serialization(error),
        };

        assert_eq!(io_error.exit_code(), ExitCode::Io);
        assert_eq!(serialization_error.exit_code(), ExitCode::Internal);
        Ok(())
    }

    #[test]
    fn envelope_exit_codes() {
        let validation = ErrorEnvelope::expected(ErrorCode::new("config", "empty_backends"), "x");
        assert_eq!(ExitCode::for_envelope(&validation), ExitCode::InvalidInput);

        let missing_file =
            ErrorEnvelope::expected(ErrorCode::new("config", "config_file_not_found"), "x");
        assert_eq!(ExitCode::for_envelope(&missing_file), ExitCode::Io);

        let sink = ErrorEnvelope::unexpected(
            ErrorCode::new("sink", "open_failed"),
            "x",
            ErrorClass::NonRetriable,
        );
        assert_eq!(ExitCode::for_envelope(&sink), ExitCode::Io);

        let invariant = ErrorEnvelope::invariant(ErrorCode::internal(), "x");
        assert_eq!(ExitCode::for_envelope(&invariant), ExitCode::Internal);
    }

    #[test]
    fn json_errors_go_to_stdout() -> Result<(), Box<dyn std::error::Error>> {
        let error = ErrorEnvelope::expected(ErrorCode::new("profile", "missing_field"), "missing")
            .with_metadata("field", "status");
        let output = format_error_output(JSON_MODE, &error);
        let value: serde_json::Value = serde_json::from_str(output.stdout.trim())?;

        assert_eq!(value["status"], "error");
        assert_eq!(value["error"]["code"], "profile:missing_field");
        assert_eq!(value["error"]["metadata"]["field"], "status");
        assert!(output.stderr.is_empty());
        assert_eq!(output.exit_code, ExitCode::InvalidInput);
        Ok(())
    }

    #[test]
    fn text_errors_go_to_stderr() {
        let error = ErrorEnvelope::expected(ErrorCode::new("config", "missing_sink_path"), "no path");
        let output = format_error_output(TEXT_MODE, &error);
        assert!(output.stdout.is_empty());
        assert!(output.stderr.starts_with("error: config:missing_sink_path: no path"));
    }
}
