mod cmd_run;
mod cmd_seed;
mod cmd_trigger;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "lookout",
    version,
    about = "Uptime probe with status history and GitHub issue incidents"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one monitoring cycle: check, record history, reconcile incidents
    Run {
        /// Status repository root (defaults to the current directory)
        #[arg(long)]
        root: Option<PathBuf>,
        /// Monitor registry file (defaults to <root>/monitor.config.json)
        #[arg(long)]
        registry: Option<PathBuf>,
        /// History file (defaults to <root>/status-data.json)
        #[arg(long)]
        history: Option<PathBuf>,
        /// Skip incident reconciliation even if GITHUB_TOKEN is set
        #[arg(long)]
        no_reconcile: bool,
    },
    /// Ask GitHub Actions to run a cycle now (repository_dispatch)
    Trigger {
        /// Repository owner (defaults to the owner in GITHUB_REPOSITORY)
        #[arg(long)]
        owner: Option<String>,
        /// Repository name (defaults to the name in GITHUB_REPOSITORY)
        #[arg(long)]
        repo: Option<String>,
        /// Dispatch event type the workflow listens for
        #[arg(long, default_value = lookout_tracker::trigger::DISPATCH_EVENT)]
        event_type: String,
        /// Request timeout in seconds
        #[arg(long, default_value_t = 10)]
        timeout: u64,
    },
    /// Write synthetic demo history for every registered monitor
    Seed {
        /// Status repository root (defaults to the current directory)
        #[arg(long)]
        root: Option<PathBuf>,
        /// Days of history to generate
        #[arg(long, default_value_t = 90)]
        days: u32,
        /// Minutes between generated samples
        #[arg(long, default_value_t = 60)]
        interval_minutes: u32,
        /// RNG seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cwd = std::env::current_dir()?;

    match cli.cmd {
        Command::Run {
            root,
            registry,
            history,
            no_reconcile,
        } => cmd_run::execute(
            &root.unwrap_or(cwd),
            registry.as_deref(),
            history.as_deref(),
            no_reconcile,
        ),
        Command::Trigger {
            owner,
            repo,
            event_type,
            timeout,
        } => cmd_trigger::execute(owner, repo, &event_type, timeout),
        Command::Seed {
            root,
            days,
            interval_minutes,
            seed,
        } => cmd_seed::execute(&root.unwrap_or(cwd), days, interval_minutes, seed),
    }
}
