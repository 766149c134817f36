//! CLI command implementations

pub mod config;
pub mod profile;
pub mod run;
pub mod sync;
