//! Capability profile of a vehicle property.
//!
//! A [`PropertyProfile`] is immutable once built. All construction goes
//! through [`PropertyProfileBuilder`], which enforces required fields and
//! fills defaults.

use crate::zones::ZoneGroup;
use opstats_shared::{ErrorCode, ErrorEnvelope};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Increment value reported when no increment is set.
pub const UNSPECIFIED_INCREMENT: f32 = -1.0;

/// Failures raised by [`PropertyProfileBuilder::build`].
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileError {
    /// A required field was never set.
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },
    /// `car_zones` was set to an empty list.
    EmptyCarZones,
    /// A zone group has no zones.
    EmptyZoneGroup {
        /// Field holding the group.
        field: &'static str,
        /// Position of the group within the field.
        index: usize,
    },
    /// An increment is neither positive and finite nor the unset sentinel.
    InvalidIncrement {
        /// Increment field name.
        field: &'static str,
        /// Rejected value.
        value: f32,
    },
}

impl ProfileError {
    fn error_code(&self) -> ErrorCode {
        let code = match self {
            Self::MissingField { .. } => "missing_field",
            Self::EmptyCarZones => "empty_car_zones",
            Self::EmptyZoneGroup { .. } => "empty_zone_group",
            Self::InvalidIncrement { .. } => "invalid_increment",
        };
        ErrorCode::new("profile", code)
    }
}

impl fmt::Display for ProfileError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { field } => write!(formatter, "Missing required properties: {field}"),
            Self::EmptyCarZones => formatter.write_str("car_zones must contain at least one group"),
            Self::EmptyZoneGroup { field, index } => {
                write!(formatter, "{field}[{index}] must contain at least one zone")
            },
            Self::InvalidIncrement { field, value } => {
                write!(formatter, "{field} must be positive and finite, got {value}")
            },
        }
    }
}

impl std::error::Error for ProfileError {}

impl From<ProfileError> for ErrorEnvelope {
    fn from(error: ProfileError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());
        match error {
            ProfileError::MissingField { field } => envelope.with_metadata("field", field),
            ProfileError::EmptyCarZones => envelope.with_metadata("field", "car_zones"),
            ProfileError::EmptyZoneGroup { field, index } => envelope
                .with_metadata("field", field)
                .with_metadata("index", index.to_string()),
            ProfileError::InvalidIncrement { field, value } => envelope
                .with_metadata("field", field)
                .with_metadata("value", value.to_string()),
        }
    }
}

/// Numeric identifier of a vehicle property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyId(i32);

impl PropertyId {
    /// Wrap a raw id.
    #[must_use]
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Raw id.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl From<i32> for PropertyId {
    fn from(raw: i32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{:#x}", self.0)
    }
}

/// Availability of a property on this vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    /// Status could not be determined.
    Unknown,
    /// Property is supported and readable.
    Success,
    /// Property is not implemented by the vehicle.
    Unimplemented,
    /// Property is implemented but currently unavailable.
    Unavailable,
}

impl PropertyStatus {
    /// Stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Success => "success",
            Self::Unimplemented => "unimplemented",
            Self::Unavailable => "unavailable",
        }
    }
}

/// Inclusive value bounds for a zone group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MinMax<T> {
    /// Lower bound.
    pub min: T,
    /// Upper bound.
    pub max: T,
}

impl<T> MinMax<T> {
    /// Create bounds.
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

impl<T> From<(T, T)> for MinMax<T> {
    fn from((min, max): (T, T)) -> Self {
        Self { min, max }
    }
}

/// Supported temperature bounds in one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemperatureRange {
    min: OrderedFloat<f32>,
    max: OrderedFloat<f32>,
}

impl TemperatureRange {
    /// Create a range.
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self {
            min: OrderedFloat(min),
            max: OrderedFloat(max),
        }
    }

    /// Lower bound.
    #[must_use]
    pub const fn min(self) -> f32 {
        self.min.0
    }

    /// Upper bound.
    #[must_use]
    pub const fn max(self) -> f32 {
        self.max.0
    }
}

impl From<(f32, f32)> for TemperatureRange {
    fn from((min, max): (f32, f32)) -> Self {
        Self::new(min, max)
    }
}

/// Upper bound on values produced by the `supported_*_values` helpers.
pub const MAX_SUPPORTED_VALUES: usize = 1024;

/// Immutable description of a property's supported zones and value ranges.
///
/// `T` is the property's value type, used for per-zone-group bounds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase", bound(serialize = "T: Serialize"))]
pub struct PropertyProfile<T> {
    property_id: PropertyId,
    status: PropertyStatus,
    car_zones: Vec<ZoneGroup>,
    #[serde(serialize_with = "serialize_zone_ranges")]
    car_zone_sets_to_min_max_range: Option<BTreeMap<ZoneGroup, MinMax<T>>>,
    celsius_range: Option<TemperatureRange>,
    fahrenheit_range: Option<TemperatureRange>,
    celsius_increment: Option<OrderedFloat<f32>>,
    fahrenheit_increment: Option<OrderedFloat<f32>>,
}

impl<T> PropertyProfile<T> {
    /// Start building a profile.
    pub fn builder() -> PropertyProfileBuilder<T> {
        PropertyProfileBuilder::new()
    }

    /// Property identifier.
    #[must_use]
    pub const fn property_id(&self) -> PropertyId {
        self.property_id
    }

    /// Property status.
    #[must_use]
    pub const fn status(&self) -> PropertyStatus {
        self.status
    }

    /// Zone groups the property can be controlled in. Never empty.
    #[must_use]
    pub fn car_zones(&self) -> &[ZoneGroup] {
        &self.car_zones
    }

    /// Per-zone-group bounds, when the property reports any.
    #[must_use]
    pub const fn car_zone_sets_to_min_max_range(&self) -> Option<&BTreeMap<ZoneGroup, MinMax<T>>> {
        self.car_zone_sets_to_min_max_range.as_ref()
    }

    /// Bounds for one zone group.
    #[must_use]
    pub fn min_max_for(&self, group: &ZoneGroup) -> Option<&MinMax<T>> {
        self.car_zone_sets_to_min_max_range
            .as_ref()
            .and_then(|ranges| ranges.get(group))
    }

    /// Celsius bounds.
    #[must_use]
    pub const fn celsius_range(&self) -> Option<TemperatureRange> {
        self.celsius_range
    }

    /// Fahrenheit bounds.
    #[must_use]
    pub const fn fahrenheit_range(&self) -> Option<TemperatureRange> {
        self.fahrenheit_range
    }

    /// Celsius step, when set.
    #[must_use]
    pub fn celsius_increment(&self) -> Option<f32> {
        self.celsius_increment.map(OrderedFloat::into_inner)
    }

    /// Fahrenheit step, when set.
    #[must_use]
    pub fn fahrenheit_increment(&self) -> Option<f32> {
        self.fahrenheit_increment.map(OrderedFloat::into_inner)
    }

    /// Celsius step, or [`UNSPECIFIED_INCREMENT`] when unset.
    #[must_use]
    pub fn celsius_increment_or_sentinel(&self) -> f32 {
        self.celsius_increment().unwrap_or(UNSPECIFIED_INCREMENT)
    }

    /// Fahrenheit step, or [`UNSPECIFIED_INCREMENT`] when unset.
    #[must_use]
    pub fn fahrenheit_increment_or_sentinel(&self) -> f32 {
        self.fahrenheit_increment().unwrap_or(UNSPECIFIED_INCREMENT)
    }

    /// Celsius values reachable from the range minimum by whole increments.
    ///
    /// Returns `None` unless both the range and the increment are set. At most
    /// [`MAX_SUPPORTED_VALUES`] values are produced.
    #[must_use]
    pub fn supported_celsius_values(&self) -> Option<Vec<f32>> {
        stepped_values(self.celsius_range?, self.celsius_increment()?)
    }

    /// Fahrenheit counterpart of [`PropertyProfile::supported_celsius_values`].
    #[must_use]
    pub fn supported_fahrenheit_values(&self) -> Option<Vec<f32>> {
        stepped_values(self.fahrenheit_range?, self.fahrenheit_increment()?)
    }
}

fn stepped_values(range: TemperatureRange, increment: f32) -> Option<Vec<f32>> {
    let tolerance = increment * 1e-3;
    let mut values = Vec::new();
    let mut step: u16 = 0;
    while values.len() < MAX_SUPPORTED_VALUES {
        let value = f32::from(step).mul_add(increment, range.min());
        if value > range.max() + tolerance {
            break;
        }
        values.push(value);
        step = step.checked_add(1)?;
    }
    Some(values)
}

#[derive(Serialize)]
struct ZoneRangeEntry<'a, T> {
    zones: &'a ZoneGroup,
    min: &'a T,
    max: &'a T,
}

// JSON objects need string keys, so the map is written as a list of entries.
fn serialize_zone_ranges<S, T>(
    ranges: &Option<BTreeMap<ZoneGroup, MinMax<T>>>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    ranges
        .as_ref()
        .map(|ranges| {
            ranges
                .iter()
                .map(|(zones, bounds)| ZoneRangeEntry {
                    zones,
                    min: &bounds.min,
                    max: &bounds.max,
                })
                .collect::<Vec<_>>()
        })
        .serialize(serializer)
}

/// Fluent builder for [`PropertyProfile`].
///
/// Setters consume and return the builder. `car_zones` defaults to a single
/// global group; optional fields default to absent.
#[derive(Debug, Clone)]
#[must_use]
pub struct PropertyProfileBuilder<T> {
    property_id: Option<PropertyId>,
    status: Option<PropertyStatus>,
    car_zones: Vec<ZoneGroup>,
    car_zone_sets_to_min_max_range: Option<BTreeMap<ZoneGroup, MinMax<T>>>,
    celsius_range: Option<TemperatureRange>,
    fahrenheit_range: Option<TemperatureRange>,
    celsius_increment: Option<f32>,
    fahrenheit_increment: Option<f32>,
}

impl<T> Default for PropertyProfileBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PropertyProfileBuilder<T> {
    /// Builder with defaults applied.
    pub fn new() -> Self {
        Self {
            property_id: None,
            status: None,
            car_zones: vec![ZoneGroup::global()],
            car_zone_sets_to_min_max_range: None,
            celsius_range: None,
            fahrenheit_range: None,
            celsius_increment: None,
            fahrenheit_increment: None,
        }
    }

    /// Set the property id. Required.
    pub fn property_id(mut self, property_id: impl Into<PropertyId>) -> Self {
        self.property_id = Some(property_id.into());
        self
    }

    /// Set the property status. Required.
    pub fn status(mut self, status: PropertyStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Replace the zone groups.
    pub fn car_zones(mut self, car_zones: impl IntoIterator<Item = ZoneGroup>) -> Self {
        self.car_zones = car_zones.into_iter().collect();
        self
    }

    /// Set per-zone-group bounds. Later entries for the same group win.
    pub fn car_zone_sets_to_min_max_range(
        mut self,
        ranges: impl IntoIterator<Item = (ZoneGroup, MinMax<T>)>,
    ) -> Self {
        self.car_zone_sets_to_min_max_range = Some(ranges.into_iter().collect());
        self
    }

    /// Drop any per-zone-group bounds.
    pub fn clear_car_zone_sets_to_min_max_range(mut self) -> Self {
        self.car_zone_sets_to_min_max_range = None;
        self
    }

    /// Set Celsius bounds.
    pub fn celsius_range(mut self, range: impl Into<TemperatureRange>) -> Self {
        self.celsius_range = Some(range.into());
        self
    }

    /// Drop Celsius bounds.
    pub fn clear_celsius_range(mut self) -> Self {
        self.celsius_range = None;
        self
    }

    /// Set Fahrenheit bounds.
    pub fn fahrenheit_range(mut self, range: impl Into<TemperatureRange>) -> Self {
        self.fahrenheit_range = Some(range.into());
        self
    }

    /// Drop Fahrenheit bounds.
    pub fn clear_fahrenheit_range(mut self) -> Self {
        self.fahrenheit_range = None;
        self
    }

    /// Set the Celsius step. [`UNSPECIFIED_INCREMENT`] means unset.
    pub fn celsius_increment(mut self, increment: f32) -> Self {
        self.celsius_increment = Some(increment);
        self
    }

    /// Set the Fahrenheit step. [`UNSPECIFIED_INCREMENT`] means unset.
    pub fn fahrenheit_increment(mut self, increment: f32) -> Self {
        self.fahrenheit_increment = Some(increment);
        self
    }

    /// Validate and produce the profile.
    pub fn build(self) -> Result<PropertyProfile<T>, ProfileError> {
        let property_id = self.property_id.ok_or(ProfileError::MissingField {
            field: "property_id",
        })?;
        let status = self
            .status
            .ok_or(ProfileError::MissingField { field: "status" })?;

        if self.car_zones.is_empty() {
            return Err(ProfileError::EmptyCarZones);
        }
        if let Some(index) = self.car_zones.iter().position(ZoneGroup::is_empty) {
            return Err(ProfileError::EmptyZoneGroup {
                field: "car_zones",
                index,
            });
        }
        if let Some(index) = self
            .car_zone_sets_to_min_max_range
            .as_ref()
            .and_then(|ranges| ranges.keys().position(ZoneGroup::is_empty))
        {
            return Err(ProfileError::EmptyZoneGroup {
                field: "car_zone_sets_to_min_max_range",
                index,
            });
        }

        let celsius_increment = normalize_increment("celsius_increment", self.celsius_increment)?;
        let fahrenheit_increment =
            normalize_increment("fahrenheit_increment", self.fahrenheit_increment)?;

        Ok(PropertyProfile {
            property_id,
            status,
            car_zones: self.car_zones,
            car_zone_sets_to_min_max_range: self.car_zone_sets_to_min_max_range,
            celsius_range: self.celsius_range,
            fahrenheit_range: self.fahrenheit_range,
            celsius_increment,
            fahrenheit_increment,
        })
    }
}

fn normalize_increment(
    field: &'static str,
    value: Option<f32>,
) -> Result<Option<OrderedFloat<f32>>, ProfileError> {
    match value {
        None => Ok(None),
        Some(value) if value.to_bits() == UNSPECIFIED_INCREMENT.to_bits() => Ok(None),
        Some(value) if value.is_finite() && value > 0.0 => Ok(Some(OrderedFloat(value))),
        Some(value) => Err(ProfileError::InvalidIncrement { field, value }),
    }
}

/// Parsed profile description, as read from JSON or TOML input.
///
/// Mirrors the builder: absent fields take builder defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProfileInput<T> {
    /// Property id.
    #[serde(default)]
    pub property_id: Option<i32>,
    /// Property status.
    #[serde(default)]
    pub status: Option<PropertyStatus>,
    /// Zone groups.
    #[serde(default)]
    pub car_zones: Option<Vec<ZoneGroup>>,
    /// Per-zone-group bounds.
    #[serde(default)]
    pub car_zone_sets_to_min_max_range: Option<Vec<ZoneRangeInput<T>>>,
    /// Celsius bounds.
    #[serde(default)]
    pub celsius_range: Option<TemperatureRange>,
    /// Fahrenheit bounds.
    #[serde(default)]
    pub fahrenheit_range: Option<TemperatureRange>,
    /// Celsius step.
    #[serde(default)]
    pub celsius_increment: Option<f32>,
    /// Fahrenheit step.
    #[serde(default)]
    pub fahrenheit_increment: Option<f32>,
}

/// One per-zone-group bound entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZoneRangeInput<T> {
    /// Zones in the group.
    pub zones: ZoneGroup,
    /// Lower bound.
    pub min: T,
    /// Upper bound.
    pub max: T,
}

impl<T> ProfileInput<T> {
    /// Feed the input through [`PropertyProfileBuilder`].
    pub fn into_profile(self) -> Result<PropertyProfile<T>, ProfileError> {
        let mut builder = PropertyProfile::builder();
        if let Some(property_id) = self.property_id {
            builder = builder.property_id(property_id);
        }
        if let Some(status) = self.status {
            builder = builder.status(status);
        }
        if let Some(car_zones) = self.car_zones {
            builder = builder.car_zones(car_zones);
        }
        if let Some(ranges) = self.car_zone_sets_to_min_max_range {
            builder = builder.car_zone_sets_to_min_max_range(
                ranges
                    .into_iter()
                    .map(|entry| (entry.zones, MinMax::new(entry.min, entry.max))),
            );
        }
        if let Some(range) = self.celsius_range {
            builder = builder.celsius_range(range);
        }
        if let Some(range) = self.fahrenheit_range {
            builder = builder.fahrenheit_range(range);
        }
        if let Some(increment) = self.celsius_increment {
            builder = builder.celsius_increment(increment);
        }
        if let Some(increment) = self.fahrenheit_increment {
            builder = builder.fahrenheit_increment(increment);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_error_maps_to_envelope() {
        let envelope: ErrorEnvelope = ProfileError::MissingField { field: "status" }.into();
        assert_eq!(envelope.code, ErrorCode::new("profile", "missing_field"));
        assert_eq!(envelope.metadata_value("field"), Some("status"));
        assert_eq!(envelope.message, "Missing required properties: status");

        let envelope: ErrorEnvelope = ProfileError::InvalidIncrement {
            field: "celsius_increment",
            value: 0.0,
        }
        .into();
        assert_eq!(envelope.code.code(), "invalid_increment");
        assert_eq!(envelope.metadata_value("value"), Some("0"));
    }

    #[test]
    fn sentinel_increment_normalizes_to_absent() {
        assert_eq!(normalize_increment("x", Some(-1.0)), Ok(None));
        assert_eq!(normalize_increment("x", Some(0.5)), Ok(Some(OrderedFloat(0.5))));
        assert!(normalize_increment("x", Some(f32::NAN)).is_err());
        assert!(normalize_increment("x", Some(-0.5)).is_err());
    }

    #[test]
    fn stepped_values_include_both_bounds() {
        let values = stepped_values(TemperatureRange::new(16.0, 18.0), 0.5);
        assert_eq!(values, Some(vec![16.0, 16.5, 17.0, 17.5, 18.0]));
    }

    #[test]
    fn stepped_values_are_capped() {
        let values = stepped_values(TemperatureRange::new(0.0, 1.0e6), 0.1).unwrap_or_default();
        assert_eq!(values.len(), MAX_SUPPORTED_VALUES);
    }

    #[test]
    fn property_id_displays_as_hex() {
        assert_eq!(PropertyId::new(0x1140_0503).to_string(), "0x11400503");
    }
}
