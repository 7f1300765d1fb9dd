//! Sightline CLI
//!
//! Inspection tooling for baseline libraries and engine configuration.

pub mod commands;
pub mod output;
