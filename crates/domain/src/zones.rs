//! Vehicle cabin zones.
//!
//! A [`CarZone`] is a seat position (row, column). A [`ZoneGroup`] is a set of
//! zones that are controlled together by a single property value.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Seat row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneRow {
    /// Every row.
    All,
    /// Front row.
    First,
    /// Second row.
    Second,
    /// Third row.
    Third,
}

/// Seat column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneColumn {
    /// Every column.
    All,
    /// Left side.
    Left,
    /// Center.
    Center,
    /// Right side.
    Right,
    /// Driver side.
    Driver,
    /// Passenger side.
    Passenger,
}

/// A location inside the vehicle cabin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CarZone {
    /// Seat row.
    pub row: ZoneRow,
    /// Seat column.
    pub column: ZoneColumn,
}

impl CarZone {
    /// The zone covering the whole vehicle.
    pub const GLOBAL: Self = Self::new(ZoneRow::All, ZoneColumn::All);

    /// Create a zone.
    #[must_use]
    pub const fn new(row: ZoneRow, column: ZoneColumn) -> Self {
        Self { row, column }
    }

    /// Returns true for [`CarZone::GLOBAL`].
    #[must_use]
    pub const fn is_global(self) -> bool {
        matches!(self.row, ZoneRow::All) && matches!(self.column, ZoneColumn::All)
    }
}

impl fmt::Display for CarZone {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{:?}:{:?}", self.row, self.column)
    }
}

/// Set of zones controlled together. Iteration order is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneGroup(BTreeSet<CarZone>);

impl ZoneGroup {
    /// Group containing only [`CarZone::GLOBAL`].
    #[must_use]
    pub fn global() -> Self {
        Self::single(CarZone::GLOBAL)
    }

    /// Group containing one zone.
    #[must_use]
    pub fn single(zone: CarZone) -> Self {
        Self(BTreeSet::from([zone]))
    }

    /// Number of zones in the group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when the group has no zones.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true when the group contains `zone`.
    #[must_use]
    pub fn contains(&self, zone: CarZone) -> bool {
        self.0.contains(&zone)
    }

    /// Iterate zones in order.
    pub fn iter(&self) -> impl Iterator<Item = CarZone> + '_ {
        self.0.iter().copied()
    }

    /// Borrow the underlying set.
    #[must_use]
    pub const fn as_set(&self) -> &BTreeSet<CarZone> {
        &self.0
    }
}

impl FromIterator<CarZone> for ZoneGroup {
    fn from_iter<I: IntoIterator<Item = CarZone>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[CarZone; N]> for ZoneGroup {
    fn from(zones: [CarZone; N]) -> Self {
        zones.into_iter().collect()
    }
}

impl fmt::Display for ZoneGroup {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("{")?;
        for (position, zone) in self.iter().enumerate() {
            if position > 0 {
                formatter.write_str(", ")?;
            }
            write!(formatter, "{zone}")?;
        }
        formatter.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DRIVER: CarZone = CarZone::new(ZoneRow::First, ZoneColumn::Driver);
    const PASSENGER: CarZone = CarZone::new(ZoneRow::First, ZoneColumn::Passenger);

    #[test]
    fn global_zone_is_recognized() {
        assert!(CarZone::GLOBAL.is_global());
        assert!(!DRIVER.is_global());
        assert!(ZoneGroup::global().contains(CarZone::GLOBAL));
    }

    #[test]
    fn group_order_ignores_insertion_order() {
        let left = ZoneGroup::from([DRIVER, PASSENGER]);
        let right = ZoneGroup::from([PASSENGER, DRIVER, DRIVER]);
        assert_eq!(left, right);
        assert_eq!(left.len(), 2);
    }

    #[test]
    fn group_display_is_ordered() {
        let group = ZoneGroup::from([PASSENGER, DRIVER]);
        assert_eq!(group.to_string(), "{First:Driver, First:Passenger}");
    }

    #[test]
    fn group_serializes_as_array() -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(ZoneGroup::global())?;
        assert_eq!(value, serde_json::json!([{ "row": "all", "column": "all" }]));
        Ok(())
    }
}
