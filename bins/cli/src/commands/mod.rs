//! CLI command handlers.

pub mod config;
pub mod info;
pub mod profile;
pub mod replay;

pub use config::run_config_show;
pub use info::run_info;
pub use profile::run_profile;
pub use replay::{ReplayCommandInput, run_replay};
