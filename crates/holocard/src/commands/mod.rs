//! CLI subcommands

pub mod caps;
pub mod preview;
