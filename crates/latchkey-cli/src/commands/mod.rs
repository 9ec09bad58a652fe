//! CLI command implementations

pub mod cards;
pub mod check_config;
pub mod log;
pub mod simulate;
