//! CLI command definitions and dispatch.
//!
//! Each group of subcommands lives in its own submodule:
//! - `auth`: sign-in, sign-out and token maintenance
//! - `views`: one-shot and `--watch` rendering of the dashboard views

mod auth;
mod views;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;

use crate::api::{DashboardApi, FeedbackClient, TimeRange};
use crate::config::{self, Config, ConfigError};
use crate::projection::SortCriterion;
use crate::session::{FileSessionStore, Session};

pub use auth::{cmd_login, cmd_logout, cmd_refresh_token, cmd_whoami};
pub use views::{
    cmd_albums, cmd_artists, cmd_dashboard, cmd_history, cmd_now_playing, cmd_playlists,
    cmd_profile, cmd_songs, cmd_stats,
};

/// feedback.fm in the terminal
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Backend base URL, overriding the config file
    #[arg(long, global = true, env = "FEEDBACK_FM_API_URL")]
    pub api_url: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Shared flag for view commands
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct WatchArgs {
    /// Keep polling and re-render on every change until Ctrl-C
    #[arg(short, long)]
    pub watch: bool,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Sign in (prints the authorization URL, or exchanges --code)
    Login {
        /// Code from the OAuth callback
        #[arg(long)]
        code: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Trade the stored refresh token for a new access token
    RefreshToken,
    /// Show who is signed in
    Whoami,
    /// Print the effective configuration, or write it to disk with --init
    Config {
        /// Create the config file if it does not exist yet
        #[arg(long)]
        init: bool,
    },
    /// Profile, now playing and recently played in one screen
    Dashboard {
        #[command(flatten)]
        watch: WatchArgs,
    },
    /// Your profile
    Profile {
        #[command(flatten)]
        watch: WatchArgs,
    },
    /// Listening statistics
    Stats {
        #[command(flatten)]
        watch: WatchArgs,
    },
    /// Top artists
    Artists {
        /// Aggregation window (defaults to the configured one)
        #[arg(short, long, value_enum)]
        time_range: Option<TimeRange>,
        #[arg(short, long, value_enum, default_value_t)]
        sort: SortCriterion,
        /// Only show artists whose name contains this text
        #[arg(short, long)]
        filter: Option<String>,
        #[command(flatten)]
        watch: WatchArgs,
    },
    /// Top songs
    Songs {
        /// Aggregation window (defaults to the configured one)
        #[arg(short, long, value_enum)]
        time_range: Option<TimeRange>,
        #[arg(short, long, value_enum, default_value_t)]
        sort: SortCriterion,
        /// Only show songs whose title or artist contains this text
        #[arg(short, long)]
        filter: Option<String>,
        #[command(flatten)]
        watch: WatchArgs,
    },
    /// The track playing right now
    NowPlaying {
        #[command(flatten)]
        watch: WatchArgs,
    },
    /// Recently played tracks
    History {
        /// Number of tracks, 1 to 100 (defaults to the configured one)
        #[arg(short, long)]
        limit: Option<u32>,
        #[command(flatten)]
        watch: WatchArgs,
    },
    /// Your playlists, or the songs of one
    Playlists {
        /// Show the songs of this playlist
        #[arg(long)]
        id: Option<String>,
        #[command(flatten)]
        watch: WatchArgs,
    },
    /// Albums, one album's songs, or a search
    Albums {
        /// Show the songs of this album
        #[arg(long)]
        id: Option<String>,
        /// Search albums by name
        #[arg(long, conflicts_with = "id")]
        search: Option<String>,
        #[command(flatten)]
        watch: WatchArgs,
    },
}

/// Everything a command needs: settings, session and backend client.
pub struct Context {
    pub config: Config,
    pub session: Session,
    pub client: Arc<FeedbackClient>,
}

impl Context {
    fn load(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = match &cli.config {
            Some(path) => config::load_from(path),
            None => config::load(),
        };
        if let Some(url) = &cli.api_url {
            config.api.base_url = url.clone();
        }

        let store = FileSessionStore::default_location()?;
        tracing::debug!(target: "session", "Session file: {}", store.path().display());
        let session = Session::restore(store);
        let client = Arc::new(FeedbackClient::new(&config.api, session.clone())?);

        Ok(Self {
            config,
            session,
            client,
        })
    }

    pub fn api(&self) -> Arc<dyn DashboardApi> {
        self.client.clone()
    }
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let rt = Runtime::new()?;
    let ctx = Context::load(cli)?;

    match &cli.command {
        Commands::Login { code } => cmd_login(&rt, &ctx, code.as_deref()),
        Commands::Logout => cmd_logout(&ctx),
        Commands::RefreshToken => cmd_refresh_token(&rt, &ctx),
        Commands::Whoami => cmd_whoami(&rt, &ctx),
        Commands::Config { init } => cmd_config(cli, &ctx, *init),
        Commands::Dashboard { watch } => cmd_dashboard(&rt, &ctx, watch.watch),
        Commands::Profile { watch } => cmd_profile(&rt, &ctx, watch.watch),
        Commands::Stats { watch } => cmd_stats(&rt, &ctx, watch.watch),
        Commands::Artists {
            time_range,
            sort,
            filter,
            watch,
        } => {
            let range = time_range.unwrap_or(ctx.config.views.default_time_range);
            cmd_artists(&rt, &ctx, range, *sort, filter.as_deref(), watch.watch)
        }
        Commands::Songs {
            time_range,
            sort,
            filter,
            watch,
        } => {
            let range = time_range.unwrap_or(ctx.config.views.default_time_range);
            cmd_songs(&rt, &ctx, range, *sort, filter.as_deref(), watch.watch)
        }
        Commands::NowPlaying { watch } => cmd_now_playing(&rt, &ctx, watch.watch),
        Commands::History { limit, watch } => {
            let limit = limit.unwrap_or(ctx.config.views.history_limit);
            cmd_history(&rt, &ctx, limit, watch.watch)
        }
        Commands::Playlists { id, watch } => cmd_playlists(&rt, &ctx, id.as_deref(), watch.watch),
        Commands::Albums { id, search, watch } => cmd_albums(
            &rt,
            &ctx,
            id.as_deref(),
            search.as_deref(),
            watch.watch,
        ),
    }
}

/// Show or initialize the config file.
pub fn cmd_config(cli: &Cli, ctx: &Context, init: bool) -> anyhow::Result<()> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => config::config_path().ok_or(ConfigError::NoConfigDir)?,
    };

    if !init {
        println!("# {}\n{}", path.display(), toml::to_string_pretty(&ctx.config)?);
        return Ok(());
    }

    if path.exists() {
        println!("Config already exists at {}", path.display());
        return Ok(());
    }
    config::save_to(&ctx.config, &path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_view_flags() {
        let cli = Cli::try_parse_from([
            "feedback-fm",
            "artists",
            "--time-range",
            "long_term",
            "--sort",
            "popularity",
            "--filter",
            "bow",
            "--watch",
        ])
        .unwrap();

        match cli.command {
            Commands::Artists {
                time_range,
                sort,
                filter,
                watch,
            } => {
                assert_eq!(time_range, Some(TimeRange::LongTerm));
                assert_eq!(sort, SortCriterion::Popularity);
                assert_eq!(filter.as_deref(), Some("bow"));
                assert!(watch.watch);
            }
            _ => panic!("expected artists"),
        }
    }

    #[test]
    fn test_cli_global_api_url() {
        let cli = Cli::try_parse_from([
            "feedback-fm",
            "history",
            "--limit",
            "20",
            "--api-url",
            "http://backend:9000/api",
        ])
        .unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://backend:9000/api"));
        assert!(matches!(
            cli.command,
            Commands::History {
                limit: Some(20),
                ..
            }
        ));
    }

    #[test]
    fn test_album_search_conflicts_with_id() {
        let result = Cli::try_parse_from([
            "feedback-fm",
            "albums",
            "--id",
            "1",
            "--search",
            "blue",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_login_code() {
        let cli = Cli::try_parse_from(["feedback-fm", "login", "--code", "abc"]).unwrap();
        assert!(matches!(cli.command, Commands::Login { code: Some(ref c) } if c == "abc"));
    }
}
