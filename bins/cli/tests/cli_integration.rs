//! CLI integration tests.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

fn cli() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_opstats"));
    scrub_scoped_env(&mut command);
    command
}

fn run_cli(args: &[&str]) -> std::io::Result<Output> {
    cli().args(args).output()
}

fn scrub_scoped_env(command: &mut Command) {
    for (key, _) in std::env::vars() {
        if key.starts_with("OPSTATS_") {
            command.env_remove(key);
        }
    }
}

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn config_fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("crates")
        .join("config")
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn parse_stdout(output: &Output) -> std::io::Result<serde_json::Value> {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(stdout.trim()).map_err(std::io::Error::other)
}

#[test]
fn cli_version_runs() -> std::io::Result<()> {
    let output = run_cli(&["--version"])?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success(), "--version failed: {stderr}");
    assert!(stdout.starts_with("opstats "));
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn cli_info_json_has_build_block() -> std::io::Result<()> {
    let output = run_cli(&["--output", "json", "info"])?;
    assert!(output.status.success());

    let value = parse_stdout(&output)?;
    assert_eq!(value["status"], "ok");
    assert_eq!(value["build"]["name"], "opstats-cli");
    Ok(())
}

#[test]
fn replay_counts_valid_and_invalid_lines() -> std::io::Result<()> {
    let input = fixture_path("records.ndjson");
    let output = cli()
        .args(["replay", "--overrides-json", r#"{"backends":["counting"]}"#, "--input"])
        .arg(&input)
        .output()?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success(), "replay failed: {stderr}");
    assert!(stdout.contains("status: ok"));
    assert!(stdout.contains("backends: counting"));
    assert!(stdout.contains("accepted: 6"));
    assert!(stdout.contains("rejected: 2"));
    assert!(stdout.contains("count.call: 2"));
    assert!(stdout.contains("count.optimize: 1"));
    assert!(stdout.contains("latencyMillis.call: 20"));
    Ok(())
}

#[test]
fn replay_reads_stdin_and_reports_json() -> std::io::Result<()> {
    let mut child = cli()
        .args(["--output", "json", "replay", "--input", "-"])
        .env("OPSTATS_BACKENDS", "counting,noop")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(b"{\"kind\":\"remove\",\"totalLatencyMillis\":5}\n")?;
        stdin.write_all(b"{\"kind\":\"set_schema\",\"totalLatencyMillis\":6}\n")?;
    }
    let output = child.wait_with_output()?;
    assert!(output.status.success());

    let value = parse_stdout(&output)?;
    assert_eq!(value["backends"], serde_json::json!(["counting", "noop"]));
    assert_eq!(value["summary"]["accepted"], 2);
    assert_eq!(value["summary"]["perKind"]["remove"], 1);
    assert_eq!(value["latencyMillis"]["set_schema"], 6);
    assert_eq!(value["dropped"], 0);
    Ok(())
}

#[test]
fn replay_json_backend_writes_lines_to_stdout_sink() -> std::io::Result<()> {
    let mut child = cli()
        .args(["replay"])
        .env("OPSTATS_BACKENDS", "json")
        .env("OPSTATS_SINK", "stdout")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(b"{\"kind\":\"call\",\"packageName\":\"com.example\"}\n")?;
    }
    let output = child.wait_with_output()?;
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    let first_line = stdout.lines().next().unwrap_or_default();
    let record: serde_json::Value =
        serde_json::from_str(first_line).map_err(std::io::Error::other)?;
    assert_eq!(record["kind"], "call");
    assert_eq!(record["stats"]["packageName"], "com.example");
    assert!(stdout.contains("accepted: 1"));
    Ok(())
}

#[test]
fn replay_json_output_rejects_stdout_sink() -> std::io::Result<()> {
    let mut child = cli()
        .args(["--output", "json", "replay"])
        .env("OPSTATS_BACKENDS", "json,counting")
        .env("OPSTATS_SINK", "stdout")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        // The CLI may reject the config and exit before reading stdin.
        match stdin.write_all(b"{\"kind\":\"call\",\"totalLatencyMillis\":3}\n") {
            Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => {}
            other => other?,
        }
    }
    let output = child.wait_with_output()?;

    assert_eq!(output.status.code(), Some(2));
    let value = parse_stdout(&output)?;
    assert_eq!(value["status"], "error");
    assert_eq!(value["error"]["code"], "cli:stdout_sink_conflict");
    assert_eq!(value["error"]["metadata"]["sink"], "stdout");
    Ok(())
}

#[test]
fn replay_json_output_with_stderr_sink_stays_parseable() -> std::io::Result<()> {
    let mut child = cli()
        .args(["--output", "json", "replay"])
        .env("OPSTATS_BACKENDS", "json,counting")
        .env("OPSTATS_SINK", "stderr")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(b"{\"kind\":\"call\",\"totalLatencyMillis\":3}\n")?;
    }
    let output = child.wait_with_output()?;
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success());
    let value = parse_stdout(&output)?;
    assert_eq!(value["summary"]["accepted"], 1);
    assert!(stderr.contains("\"kind\":\"call\""));
    Ok(())
}

#[test]
fn default_replay_logs_stats_events_on_stderr() -> std::io::Result<()> {
    let mut child = cli()
        .args(["replay"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(b"{\"kind\":\"call\",\"totalLatencyMillis\":3}\n")?;
    }
    let output = child.wait_with_output()?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success(), "replay failed: {stderr}");
    assert!(stdout.contains("backends: tracing"));
    assert!(stderr.contains("opstats::stats"));
    assert!(stderr.contains("stats recorded"));
    Ok(())
}

#[test]
fn replay_skips_non_utf8_lines() -> std::io::Result<()> {
    let mut child = cli()
        .args(["--output", "json", "replay"])
        .env("OPSTATS_BACKENDS", "counting")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(b"{\"kind\":\"call\"}\n\xff\xfe garbage\n{\"kind\":\"remove\"}\n")?;
    }
    let output = child.wait_with_output()?;

    assert!(output.status.success());
    let value = parse_stdout(&output)?;
    assert_eq!(value["summary"]["accepted"], 2);
    assert_eq!(value["summary"]["rejected"], 1);
    Ok(())
}

#[test]
fn replay_missing_input_is_an_io_error() -> std::io::Result<()> {
    let output = run_cli(&["replay", "--input", "/nonexistent/opstats/records.ndjson"])?;
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(3));
    assert!(stderr.contains("core:not_found"));
    Ok(())
}

#[test]
fn replay_invalid_env_is_invalid_input() -> std::io::Result<()> {
    let output = cli()
        .args(["--output", "json", "replay", "--input", "-"])
        .env("OPSTATS_BACKENDS", "statsd")
        .stdin(Stdio::null())
        .output()?;

    assert_eq!(output.status.code(), Some(2));
    let value = parse_stdout(&output)?;
    assert_eq!(value["error"]["code"], "config:invalid_env_enum");
    assert_eq!(value["error"]["metadata"]["env_var"], "OPSTATS_BACKENDS");
    Ok(())
}

#[test]
fn profile_prints_defaults_and_values() -> std::io::Result<()> {
    let input = fixture_path("profile.json");
    let output = cli().args(["profile", "--input"]).arg(&input).output()?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success(), "profile failed: {stderr}");
    assert!(stdout.contains("propertyId: 0x15400500"));
    assert!(stdout.contains("propertyStatus: success"));
    assert!(stdout.contains("celsiusRange: [16, 28]"));
    assert!(stdout.contains("celsiusIncrement: 0.5"));
    assert!(stdout.contains("fahrenheitRange: none"));
    assert!(stdout.contains("fahrenheitIncrement: -1 (unspecified)"));
    Ok(())
}

#[test]
fn profile_json_output_serializes_profile() -> std::io::Result<()> {
    let input = fixture_path("profile.json");
    let output = cli()
        .args(["--output", "json", "profile", "--input"])
        .arg(&input)
        .output()?;
    assert!(output.status.success());

    let value = parse_stdout(&output)?;
    assert_eq!(value["profile"]["propertyId"], 356_517_120);
    assert_eq!(value["profile"]["carZones"].as_array().map(Vec::len), Some(2));
    assert_eq!(value["profile"]["carZoneSetsToMinMaxRange"][0]["max"], 28.0);
    Ok(())
}

#[test]
fn profile_missing_status_exits_with_invalid_input() -> std::io::Result<()> {
    let mut child = cli()
        .args(["--output", "json", "profile", "--input", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(br#"{"propertyId": 1}"#)?;
    }
    let output = child.wait_with_output()?;

    assert_eq!(output.status.code(), Some(2));
    let value = parse_stdout(&output)?;
    assert_eq!(value["error"]["code"], "profile:missing_field");
    assert_eq!(value["error"]["metadata"]["field"], "status");
    Ok(())
}

#[test]
fn profile_empty_input_is_a_json_error() -> std::io::Result<()> {
    let output = cli()
        .args(["--output", "json", "profile", "--input", "-"])
        .stdin(Stdio::null())
        .output()?;

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stderr.is_empty());
    let value = parse_stdout(&output)?;
    assert_eq!(value["error"]["code"], "profile:empty_input");
    assert_eq!(value["error"]["metadata"]["input"], "stdin");
    Ok(())
}

#[test]
fn config_show_defaults_as_toml() -> std::io::Result<()> {
    let output = run_cli(&["config", "show"])?;
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("version = 1"));
    assert!(stdout.contains("backends = ["));
    assert!(stdout.contains("\"tracing\""));
    Ok(())
}

#[test]
fn config_show_env_overrides_win() -> std::io::Result<()> {
    let path = config_fixture_path("stats-config.valid.json");
    let output = cli()
        .args(["--output", "json", "config", "show", "--config"])
        .arg(path)
        .env("OPSTATS_SINK", "stderr")
        .output()?;
    assert!(output.status.success());

    let value = parse_stdout(&output)?;
    assert_eq!(value["sink"]["kind"], "stderr");
    assert!(value["sink"].get("path").is_none());
    assert_eq!(value["baseFields"]["service"], "document-store");
    Ok(())
}

#[test]
fn config_show_fails_on_invalid_fixture() -> std::io::Result<()> {
    let path = config_fixture_path("stats-config.invalid-key.json");
    let output = cli()
        .args(["config", "show", "--config"])
        .arg(path)
        .output()?;
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("config:invalid_field_key"));
    Ok(())
}
