//! CLI subcommand implementations.

pub mod code;
pub mod config;
pub mod fingerprint;
pub mod simulate;
