//! # labflow CLI entry point
//!
//! Parses command-line arguments, builds the shared context, and
//! dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use labflow_cli::assay::{run_assay, AssayArgs};
use labflow_cli::context::Context;
use labflow_cli::inspect::{
    run_capabilities, run_check, run_states, run_transitions, CapabilitiesArgs, CheckArgs,
    StatesArgs, TransitionsArgs,
};
use labflow_cli::project::{run_project, ProjectArgs};

/// labflow: laboratory project and assay workflow.
///
/// Inspects state graphs, answers role permission questions, and moves
/// projects and assays through their lifecycles.
#[derive(Parser, Debug)]
#[command(name = "labflow", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the JSON store.
    #[arg(long, global = true, default_value = ".labflow")]
    state_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the states of a lifecycle kind with their metadata.
    States(StatesArgs),

    /// List the targets reachable from a state, optionally for one role.
    Transitions(TransitionsArgs),

    /// Decide whether a role may take one transition (exit 0 or 3).
    Check(CheckArgs),

    /// Show the capabilities held by a role.
    Capabilities(CapabilitiesArgs),

    /// Project lifecycle (create, update, transition, status, list).
    Project(ProjectArgs),

    /// Assay workflow (create, transition, novelty, reassign, status, list).
    Assay(AssayArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(state_dir = %cli.state_dir.display(), "labflow starting");

    let result = Context::load(cli.config.as_deref(), &cli.state_dir).and_then(|ctx| {
        match &cli.command {
            Commands::States(args) => run_states(args, &ctx),
            Commands::Transitions(args) => run_transitions(args, &ctx),
            Commands::Check(args) => run_check(args, &ctx),
            Commands::Capabilities(args) => run_capabilities(args, &ctx),
            Commands::Project(args) => run_project(args, &ctx),
            Commands::Assay(args) => run_assay(args, &ctx),
        }
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
