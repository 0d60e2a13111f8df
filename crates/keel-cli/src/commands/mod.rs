//! CLI command definitions and dispatch.

pub mod check;
pub mod plan;

use clap::{Parser, Subcommand};

/// keel — validate and plan component systems.
#[derive(Parser, Debug)]
#[command(name = keel_common::constants::BIN_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the start and stop order of a manifest.
    Plan(plan::PlanArgs),
    /// Validate a manifest without printing a plan.
    Check(check::CheckArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Plan(args) => plan::execute(&args),
        Command::Check(args) => check::execute(&args),
    }
}
