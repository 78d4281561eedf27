//! Command-line interface for feedback.fm.
//!
//! Sign-in commands plus one command per dashboard view. View commands
//! print once by default and keep polling with `--watch`.

mod commands;
mod render;

pub use commands::{Cli, Commands, run_command};
