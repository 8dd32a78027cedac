//! CLI subcommand definitions and handlers.
//!
//! Uses clap derive to define the subcommand hierarchy:
//! - `feed` (default) -- print the merged activity feed
//! - `tasks` -- print the task board with status counts
//! - `tally <poll>` / `vote <poll>` -- poll results and voting
//! - `events` -- upcoming events or one calendar day
//! - `config show|get|path` -- inspect configuration
//! - `version` -- print build/version info
//!
//! Content commands run against a JSON5 workspace snapshot given with
//! `--snapshot`; without one the workspace starts empty.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Workplace activity feed and polls.
#[derive(Parser, Debug)]
#[command(
    name = "teamfeed",
    version = env!("CARGO_PKG_VERSION"),
    about = "teamfeed: workplace activity feed and poll voting"
)]
pub struct Cli {
    #[command(flatten)]
    pub snapshot: SnapshotArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug, Default)]
pub struct SnapshotArgs {
    /// Workspace snapshot file (JSON5).
    #[arg(long, global = true)]
    pub snapshot: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the merged feed, newest first (default when no subcommand is given).
    Feed {
        /// Only include these kinds (repeatable): message, task, event, poll.
        #[arg(short, long = "kind")]
        kinds: Vec<ContentKind>,

        /// Only items created before this RFC 3339 timestamp.
        #[arg(long)]
        before: Option<DateTime<Utc>>,

        /// Items to skip.
        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Page size (0 = unlimited; default: from config).
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Print the task board.
    Tasks {
        /// all, pending, in_progress or completed.
        #[arg(short, long, default_value = "all")]
        status: StatusFilter,

        /// low, medium or high.
        #[arg(short, long)]
        priority: Option<TaskPriority>,

        /// Case-insensitive text to look for in title, description and tags.
        #[arg(long)]
        search: Option<String>,
    },

    /// Print the current results of a poll.
    Tally {
        poll_id: String,
    },

    /// Vote in a poll and write the snapshot back.
    Vote {
        poll_id: String,

        /// Voter user ID.
        #[arg(long)]
        voter: String,

        /// Zero-based option index.
        #[arg(long)]
        option: usize,
    },

    /// Print upcoming events, or the events of one day.
    Events {
        /// Calendar day (YYYY-MM-DD, UTC) instead of upcoming events.
        #[arg(long)]
        on: Option<NaiveDate>,

        /// Maximum number of upcoming events (0 = unlimited).
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },

    /// Inspect configuration.
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Print version, build date, and git commit information.
    Version,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the fully loaded configuration as JSON.
    Show,

    /// Print a specific configuration value by dot-notation path.
    Get {
        /// Dot-notation key (e.g. "feed.defaultLimit").
        key: String,
    },

    /// Print the resolved configuration file path.
    Path,
}

// ---------------------------------------------------------------------------
// Subcommand handlers
// ---------------------------------------------------------------------------

use crate::config::{self, Config};
use crate::content::{ContentKind, TaskPriority};
use crate::feed::FeedQuery;
use crate::snapshot::Snapshot;
use crate::tasks::{StatusFilter, TaskQuery};
use crate::workspace::Workspace;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Dispatch a parsed command line
pub fn run(cli: Cli, cfg: &Config) -> CliResult {
    let snapshot = cli.snapshot.snapshot;
    match cli.command.unwrap_or(Command::Feed {
        kinds: Vec::new(),
        before: None,
        offset: 0,
        limit: None,
    }) {
        Command::Feed {
            kinds,
            before,
            offset,
            limit,
        } => {
            let mut query = FeedQuery::new().with_kinds(kinds).offset(offset);
            if let Some(before) = before {
                query = query.before(before);
            }
            if let Some(limit) = limit {
                query = query.limit(limit);
            }
            handle_feed(snapshot.as_deref(), cfg, &query)
        }
        Command::Tasks {
            status,
            priority,
            search,
        } => {
            let query = TaskQuery {
                status,
                priority,
                search,
            };
            handle_tasks(snapshot.as_deref(), cfg, &query)
        }
        Command::Tally { poll_id } => handle_tally(snapshot.as_deref(), cfg, &poll_id),
        Command::Vote {
            poll_id,
            voter,
            option,
        } => handle_vote(snapshot.as_deref(), cfg, &poll_id, &voter, option),
        Command::Events { on, limit } => handle_events(snapshot.as_deref(), cfg, on, limit),
        Command::Config(ConfigCommand::Show) => handle_config_show(cfg),
        Command::Config(ConfigCommand::Get { key }) => handle_config_get(cfg, &key),
        Command::Config(ConfigCommand::Path) => {
            handle_config_path();
            Ok(())
        }
        Command::Version => {
            handle_version();
            Ok(())
        }
    }
}

fn load_snapshot(path: Option<&std::path::Path>) -> Result<Snapshot, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(Snapshot::load(path)?),
        None => Ok(Snapshot::default()),
    }
}

fn open_workspace(
    path: Option<&std::path::Path>,
    cfg: &Config,
) -> Result<Workspace, Box<dyn std::error::Error>> {
    Ok(load_snapshot(path)?.into_workspace(cfg)?)
}

fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Run the `feed` subcommand.
pub fn handle_feed(snapshot: Option<&std::path::Path>, cfg: &Config, query: &FeedQuery) -> CliResult {
    let page = open_workspace(snapshot, cfg)?.feed(query)?;
    for rejected in &page.rejected {
        eprintln!(
            "skipped {} {}: {}",
            rejected.kind,
            rejected.id.as_deref().unwrap_or("(no id)"),
            rejected.error
        );
    }
    print_json(&page)
}

/// Run the `tasks` subcommand.
pub fn handle_tasks(snapshot: Option<&std::path::Path>, cfg: &Config, query: &TaskQuery) -> CliResult {
    print_json(&open_workspace(snapshot, cfg)?.task_board(query)?)
}

/// Run the `tally <poll>` subcommand.
pub fn handle_tally(snapshot: Option<&std::path::Path>, cfg: &Config, poll_id: &str) -> CliResult {
    let workspace = open_workspace(snapshot, cfg)?;
    let tally = workspace.tally(poll_id)?;
    let open = workspace.is_poll_open(poll_id, Utc::now())?;

    println!("{} ({})", poll_id, if open { "open" } else { "closed" });
    for (option, whole) in tally.options.iter().zip(tally.whole_percentages()) {
        println!("  [{}] {:<30} {:>4} votes {:>3}%", option.index, option.text, option.votes, whole);
    }
    println!("  total: {}", tally.total_votes);
    Ok(())
}

/// Run the `vote <poll>` subcommand.
pub fn handle_vote(
    snapshot: Option<&std::path::Path>,
    cfg: &Config,
    poll_id: &str,
    voter: &str,
    option: usize,
) -> CliResult {
    let path = snapshot.ok_or("vote needs --snapshot to record the vote")?;
    let mut data = Snapshot::load(path)?;
    let workspace = data.clone().into_workspace(cfg)?;

    let tally = workspace.submit_vote(poll_id, voter, option)?;
    data.replace_votes(poll_id, workspace.votes(poll_id)?);
    data.save(path)?;

    print_json(&tally)
}

/// Run the `events` subcommand.
pub fn handle_events(
    snapshot: Option<&std::path::Path>,
    cfg: &Config,
    on: Option<NaiveDate>,
    limit: usize,
) -> CliResult {
    let workspace = open_workspace(snapshot, cfg)?;
    let events = match on {
        Some(date) => workspace.events_on(date)?,
        None => workspace.upcoming_events(Utc::now(), limit)?,
    };
    print_json(&events)
}

/// Run the `config show` subcommand.
pub fn handle_config_show(cfg: &Config) -> CliResult {
    print_json(cfg)
}

/// Run the `config get <key>` subcommand.
pub fn handle_config_get(cfg: &Config, key: &str) -> CliResult {
    match config::get_value_at_path(cfg, key) {
        Some(value) => print_json(&value),
        None => Err(format!("Key not found: {}", key).into()),
    }
}

/// Run the `config path` subcommand.
pub fn handle_config_path() {
    println!("{}", config::get_config_path().display());
}

/// Run the `version` subcommand.
pub fn handle_version() {
    println!("teamfeed {}", env!("CARGO_PKG_VERSION"));
    println!("  Build date: {}", env!("TEAMFEED_BUILD_DATE"));
    println!("  Git commit: {}", env!("TEAMFEED_GIT_HASH"));
    println!(
        "  Platform:   {} ({})",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
