mod cmd_claim;
mod cmd_config;
mod cmd_init;
mod cmd_view;
mod cmd_watch;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use baton_coord::{render, Board, CoordError};
use baton_store::BatonPaths;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "baton", version, about = "File-claim coordination for agents")]
struct Cli {
    /// Agent identity to act as
    #[arg(long, global = true, env = "BATON_AGENT")]
    agent: Option<String>,
    /// Debug logging (overridden by BATON_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create .baton/ with a default config and idle agent records
    Init,
    /// Claim files for a task
    Start {
        /// Files to claim (comma-separated or repeated)
        #[arg(long, value_delimiter = ',', required = true)]
        files: Vec<String>,
        /// What you are about to do
        #[arg(long)]
        task: String,
        /// Take files from live owners too
        #[arg(long)]
        force: bool,
    },
    /// Finish the current claim and hand its files off
    Complete,
    /// Abandon the current claim, or part of it
    Release {
        /// Why the work is being handed off
        #[arg(long, default_value = "manual")]
        reason: String,
        /// Release only these files (comma-separated)
        #[arg(long, value_delimiter = ',')]
        files: Vec<String>,
    },
    /// Report progress on the current claim
    Progress {
        /// Percentage done; clamped to 0..=100
        #[arg(long, allow_negative_numbers = true)]
        percentage: i64,
        /// Short status message
        #[arg(long)]
        message: Option<String>,
    },
    /// Keep the current claim alive
    Heartbeat,
    /// Show own status, other agents, file ownership and conflicts
    Check {
        /// Print the unified view as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rebuild and save the unified view
    Update,
    /// Rebuild the unified view periodically and print changes
    Watch {
        /// Seconds between rebuilds
        #[arg(long, default_value_t = 2)]
        interval: u64,
    },
    /// Rank agents for taking over files
    Suggest {
        /// Files to hand over (comma-separated)
        #[arg(long, value_delimiter = ',', required = true)]
        files: Vec<String>,
        /// Task description
        #[arg(long, default_value = "")]
        task: String,
    },
    /// Show recent handoffs, newest first
    Handoffs {
        /// Maximum entries to show
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Read or change .baton/config.json
    Config {
        #[command(subcommand)]
        cmd: cmd_config::ConfigCmd,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("warning: {e:#}");
    }
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::from(exit_code(&e))
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let root = BatonPaths::find_root(&cwd).unwrap_or(cwd);
    tracing::debug!(root = %root.display(), "workspace root");
    let agent = cli.agent.as_deref();

    match cli.cmd {
        Command::Init => cmd_init::execute(&root),
        Command::Start { files, task, force } => {
            cmd_claim::start(&root, require_agent(agent)?, &files, &task, force)
        }
        Command::Complete => cmd_claim::complete(&root, require_agent(agent)?),
        Command::Release { reason, files } => {
            cmd_claim::release(&root, require_agent(agent)?, &reason, &files)
        }
        Command::Progress {
            percentage,
            message,
        } => cmd_claim::progress(&root, require_agent(agent)?, percentage, message.as_deref()),
        Command::Heartbeat => cmd_claim::heartbeat(&root, require_agent(agent)?),
        Command::Check { json } => cmd_view::check(&root, require_agent(agent)?, json),
        Command::Update => cmd_view::update(&root),
        Command::Watch { interval } => cmd_watch::execute(&root, interval),
        Command::Suggest { files, task } => cmd_view::suggest(&root, &files, &task),
        Command::Handoffs { limit } => cmd_view::handoffs(&root, limit),
        Command::Config { cmd } => cmd_config::run(cmd, &root),
    }
}

/// Open the board of the workspace at `repo_root`.
pub(crate) fn open_board(repo_root: &Path) -> anyhow::Result<Board> {
    let paths = BatonPaths::discover(repo_root);
    Board::open(&paths).with_context(|| format!("opening {}", paths.baton_dir.display()))
}

pub(crate) fn config_path(repo_root: &Path) -> PathBuf {
    BatonPaths::discover(repo_root).config_json
}

fn require_agent(agent: Option<&str>) -> anyhow::Result<&str> {
    match agent.map(str::trim) {
        Some(a) if !a.is_empty() => Ok(a),
        _ => anyhow::bail!("no agent given: pass --agent <name> or set BATON_AGENT"),
    }
}

fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_env("BATON_LOG")
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(fallback))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| anyhow::anyhow!("{e}"))
}

fn report(e: &anyhow::Error) {
    match e.downcast_ref::<CoordError>() {
        Some(CoordError::ClaimConflict { conflicts }) => {
            eprintln!("{}", render::render_conflicts(conflicts))
        }
        _ => eprintln!("error: {e:#}"),
    }
}

/// Claim conflicts and missing work get their own codes so scripts can branch.
fn exit_code(e: &anyhow::Error) -> u8 {
    match e.downcast_ref::<CoordError>() {
        Some(CoordError::ClaimConflict { .. }) => 2,
        Some(CoordError::NoActiveWork { .. }) => 3,
        _ => 1,
    }
}
