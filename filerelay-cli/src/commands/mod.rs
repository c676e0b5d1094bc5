//! Subcommand implementations.

pub mod ls;
pub mod run;
pub mod sweep;
