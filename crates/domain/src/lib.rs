//! # opstats-domain
//!
//! Value types for operational stats and vehicle property profiles.
//!
//! - **Stats** - the seven stats payloads and the `StatsRecord` union
//! - **Zones** - `CarZone`, `ZoneGroup`
//! - **Profile** - `PropertyProfile` and its builder
//!
//! ## Dependency Rules
//!
//! - Depends only on `shared` crate
//! - No I/O

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub use opstats_shared::shared_crate_version;

// =============================================================================
// DOMAIN MODULES
// =============================================================================

pub mod profile;
pub mod stats;
pub mod zones;

pub use profile::{
    MAX_SUPPORTED_VALUES, MinMax, ProfileError, ProfileInput, PropertyId, PropertyProfile,
    PropertyProfileBuilder, PropertyStatus, TemperatureRange, UNSPECIFIED_INCREMENT,
    ZoneRangeInput,
};
pub use stats::{
    CallStats, CallType, DeleteType, DocumentStoreDataStatus, InitializeStats, OptimizeStats,
    PutDocumentStats, RankingStrategy, RecoveryCause, RemoveStats, ResultCode, SearchStats,
    SetSchemaStats, StatsKind, StatsRecord, VisibilityScope,
};
pub use zones::{CarZone, ZoneColumn, ZoneGroup, ZoneRow};

/// Returns the domain crate version.
#[must_use]
pub const fn domain_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
