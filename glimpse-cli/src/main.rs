//! Glimpse: capture a still image whenever a security event hits the log.
//!
//! # Usage
//!
//! ```text
//! glimpse run [--config <path>] [--log-json]
//! glimpse config [--config <path>] [--json]
//! glimpse artifacts [--config <path>] [--json]
//! glimpse capture [--config <path>]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    artifacts::ArtifactsArgs, capture::CaptureArgs, config::ConfigArgs, run::RunArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "glimpse",
    version,
    about = "Capture a still image whenever a security event appears in the system log",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the capture daemon in the foreground.
    Run(RunArgs),

    /// Print the resolved configuration.
    Config(ConfigArgs),

    /// List captured artifacts, newest first.
    Artifacts(ArtifactsArgs),

    /// Take one capture now, bypassing trigger and debounce.
    Capture(CaptureArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => args.run(),
        Commands::Config(args) => args.run(),
        Commands::Artifacts(args) => args.run(),
        Commands::Capture(args) => args.run(),
    }
}
