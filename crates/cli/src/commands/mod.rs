//! CLI Commands

pub mod baselines;
pub mod config;
