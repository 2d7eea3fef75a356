//! Property profile helpers for CLI surfaces.

use crate::InfraResult;
use opstats_domain::{ProfileInput, PropertyProfile};
use opstats_shared::{ErrorCode, ErrorEnvelope};

/// Parse a JSON profile description and build it through the profile builder.
///
/// Absent fields take the builder defaults (global zone group, no ranges,
/// unspecified increments).
pub fn build_profile_json(input: &str) -> InfraResult<PropertyProfile<f64>> {
    let parsed: ProfileInput<f64> = serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("profile", "invalid_json"),
            format!("invalid profile JSON: {error}"),
        )
    })?;
    parsed.into_profile().map_err(ErrorEnvelope::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use opstats_domain::{PropertyId, PropertyStatus, ZoneGroup};

    #[test]
    fn minimal_description_gets_defaults() -> InfraResult<()> {
        let profile = build_profile_json(r#"{ "propertyId": 356517120, "status": "success" }"#)?;
        assert_eq!(profile.property_id(), PropertyId::new(356_517_120));
        assert_eq!(profile.status(), PropertyStatus::Success);
        assert_eq!(profile.car_zones(), &[ZoneGroup::global()]);
        assert!(profile.celsius_increment().is_none());
        Ok(())
    }

    #[test]
    fn missing_status_is_a_profile_error() {
        let error = build_profile_json(r#"{ "propertyId": 1 }"#).err();
        assert_eq!(
            error.map(|error| error.code),
            Some(ErrorCode::new("profile", "missing_field"))
        );
    }

    #[test]
    fn malformed_json_is_rejected() {
        let error = build_profile_json("{ propertyId: 1 }").err();
        assert_eq!(
            error.map(|error| error.code),
            Some(ErrorCode::new("profile", "invalid_json"))
        );
    }
}
