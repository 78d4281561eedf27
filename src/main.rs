//! feedback.fm - listening statistics in the terminal.
//!
//! Signs in against the feedback.fm backend and shows the dashboard views
//! (top artists and songs, now playing, history, playlists, albums), either
//! once or kept live with `--watch`.

pub mod accent;
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod poll;
pub mod projection;
pub mod session;
pub mod views;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Used when `RUST_LOG` is unset
const DEFAULT_LOG_FILTER: &str = "feedback_fm=info,poll=info,api=info,session=info";

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging; stderr keeps rendered views on stdout clean
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();

    cli::run_command(&args)
}
