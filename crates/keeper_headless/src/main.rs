//! Headless keeper session runner.
//!
//! # Usage
//!
//! ```bash
//! # Run a level for ten seconds and print a summary
//! cargo run -p keeper_headless -- run --config levels/sample.ron --seconds 10
//!
//! # Same, but dump the full report as RON on stdout
//! cargo run -p keeper_headless -- run --config levels/sample.ron --report
//!
//! # Query one path
//! cargo run -p keeper_headless -- path --config levels/sample.ron --from 1,1 --to 14,3 --diagonal
//! ```
//!
//! Logs go to stderr and honour `RUST_LOG`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use keeper_core::config::SessionConfig;
use keeper_core::map::{PlayerId, TilePos};
use keeper_core::navigable::Capability;
use keeper_headless::runner::{parse_tile, query_path, run_for, HeadlessError};

#[derive(Parser)]
#[command(name = "keeper_headless")]
#[command(about = "Headless session runner for navigation and loop verification")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a level for a fixed wall-clock time
    Run {
        /// Level file to load
        #[arg(short, long)]
        config: PathBuf,

        /// How long to run, in seconds
        #[arg(short, long, default_value = "5")]
        seconds: u64,

        /// Print the full report as RON on stdout
        #[arg(long)]
        report: bool,
    },

    /// Find a single path on a level
    Path {
        /// Level file to load
        #[arg(short, long)]
        config: PathBuf,

        /// Start tile as x,y
        #[arg(long, value_parser = parse_tile)]
        from: TilePos,

        /// Goal tile as x,y
        #[arg(long, value_parser = parse_tile)]
        to: TilePos,

        /// Owning player of the mover
        #[arg(long, default_value = "1")]
        owner: u8,

        /// Mover flies over all terrain
        #[arg(long)]
        fly: bool,

        /// Mover may cut corners
        #[arg(long)]
        diagonal: bool,

        /// Mover may wade through water
        #[arg(long)]
        water: bool,

        /// Mover may cross lava
        #[arg(long)]
        lava: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let result = match cli.command {
        Commands::Run {
            config,
            seconds,
            report,
        } => cmd_run(&config, seconds, report),
        Commands::Path {
            config,
            from,
            to,
            owner,
            fly,
            diagonal,
            water,
            lava,
        } => {
            let capability = Capability {
                owner: PlayerId(owner),
                can_fly: fly,
                can_walk_on_water: water,
                can_walk_on_lava: lava,
                can_move_diagonally: diagonal,
            };
            cmd_path(&config, from, to, &capability)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            eprintln!("FATAL: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Run a level and print a summary.
fn cmd_run(path: &Path, seconds: u64, report: bool) -> Result<(), HeadlessError> {
    let config = SessionConfig::load(path)?;
    tracing::info!(level = %path.display(), seconds, "loading level");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_time()
        .build()?;
    let summary = runtime.block_on(run_for(&config, Duration::from_secs(seconds)))?;

    if report {
        println!("{}", summary.to_ron()?);
        return Ok(());
    }

    eprintln!("\n{}", "=".repeat(50));
    eprintln!("SESSION COMPLETE ({:.1}s)", summary.seconds);
    eprintln!("{}", "=".repeat(50));
    for loop_report in &summary.loops {
        eprintln!(
            "  {:<10} {:>6} ticks  {}",
            loop_report.kind.to_string(),
            loop_report.ticks,
            loop_report.status
        );
    }
    eprintln!(
        "Path queries: {} ({} found, {} failed)",
        summary.stats.path_requests, summary.stats.paths_found, summary.stats.paths_failed
    );
    eprintln!(
        "Steps taken: {} ({} routes abandoned)",
        summary.stats.steps, summary.stats.routes_abandoned
    );
    for creature in &summary.creatures {
        eprintln!(
            "  {:<12} at {}  {} steps",
            creature.name, creature.position, creature.steps
        );
    }
    Ok(())
}

/// Answer one path query and print the route.
fn cmd_path(
    path: &Path,
    from: TilePos,
    to: TilePos,
    capability: &Capability,
) -> Result<(), HeadlessError> {
    let config = SessionConfig::load(path)?;
    let answer = query_path(&config, from, to, capability)?;

    match answer.cost {
        Some(cost) => {
            let route: Vec<String> = answer.tiles.iter().map(ToString::to_string).collect();
            println!("{} steps, cost {cost}", answer.tiles.len().saturating_sub(1));
            println!("{}", route.join(" -> "));
        }
        None => println!("no path from {from} to {to}"),
    }
    Ok(())
}
