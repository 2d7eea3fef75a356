//! # opstats-ports
//!
//! Port traits for the opstats hexagonal architecture.
//!
//! This crate defines the interfaces between the domain and the adapters. It
//! depends only on `domain` and `shared`.

/// Returns the ports crate version.
#[must_use]
pub const fn ports_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub mod stats_logger;
pub mod telemetry;

pub use stats_logger::*;
pub use telemetry::*;

// Re-export the record types used in port signatures, so adapter crates can
// implement ports without naming `opstats-domain` for the common cases.
pub use opstats_domain::{StatsKind, StatsRecord};
