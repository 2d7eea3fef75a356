//! Profile command handler.

use crate::error::CliError;
use crate::format::{OutputMode, pretty_json};
use crate::{CliOutput, format_error_output, read_input_text};
use opstats_domain::{PropertyProfile, TemperatureRange, UNSPECIFIED_INCREMENT};
use opstats_shared::{ErrorCode, ErrorEnvelope};
use std::fmt::Write as _;
use std::path::Path;

/// Build a property profile from a JSON description and print it.
pub fn run_profile(mode: OutputMode, input: Option<&Path>) -> Result<CliOutput, CliError> {
    let text = match read_input_text(input) {
        Ok(text) => text,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };
    if text.trim().is_empty() {
        let error = ErrorEnvelope::expected(
            ErrorCode::new("profile", "empty_input"),
            "profile input is empty",
        )
        .with_metadata("input", describe_input(input));
        return Ok(format_error_output(mode, &error));
    }
    let profile = match opstats_infra::build_profile_json(&text) {
        Ok(profile) => profile,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };

    let stdout = if mode.is_json() {
        pretty_json(&serde_json::json!({
            "status": "ok",
            "profile": serde_json::to_value(&profile)?,
        }))?
    } else {
        format_profile_text(&profile)
    };
    Ok(CliOutput::ok(stdout))
}

fn describe_input(input: Option<&Path>) -> String {
    match input {
        Some(path) if path != Path::new("-") => path.to_string_lossy().to_string(),
        _ => "stdin".to_string(),
    }
}

fn format_profile_text(profile: &PropertyProfile<f64>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "status: ok");
    let _ = writeln!(out, "propertyId: {}", profile.property_id());
    let _ = writeln!(out, "propertyStatus: {}", profile.status().as_str());
    let zones: Vec<String> = profile.car_zones().iter().map(ToString::to_string).collect();
    let _ = writeln!(out, "carZones: [{}]", zones.join(", "));
    match profile.car_zone_sets_to_min_max_range() {
        None => {
            let _ = writeln!(out, "zoneRanges: none");
        },
        Some(ranges) => {
            for (group, bounds) in ranges {
                let _ = writeln!(out, "zoneRange {group}: [{}, {}]", bounds.min, bounds.max);
            }
        },
    }
    let _ = writeln!(out, "celsiusRange: {}", format_range(profile.celsius_range()));
    let _ = writeln!(out, "fahrenheitRange: {}", format_range(profile.fahrenheit_range()));
    let _ = writeln!(
        out,
        "celsiusIncrement: {}",
        format_increment(profile.celsius_increment_or_sentinel())
    );
    let _ = writeln!(
        out,
        "fahrenheitIncrement: {}",
        format_increment(profile.fahrenheit_increment_or_sentinel())
    );
    out
}

fn format_range(range: Option<TemperatureRange>) -> String {
    range.map_or_else(
        || "none".to_string(),
        |range| format!("[{}, {}]", range.min(), range.max()),
    )
}

fn format_increment(increment: f32) -> String {
    if increment.to_bits() == UNSPECIFIED_INCREMENT.to_bits() {
        format!("{increment} (unspecified)")
    } else {
        increment.to_string()
    }
}
