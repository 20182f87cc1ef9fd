//! `glimpse run`: the long-running daemon.

use anyhow::{Context, Result};
use clap::Args;

use glimpse_daemon::{start_blocking, LogFormat};

use super::ConfigSource;

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: ConfigSource,

    /// Emit daemon logs as JSON lines instead of text.
    #[arg(long)]
    pub log_json: bool,
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        let config = self.source.load()?;
        let format = if self.log_json {
            LogFormat::Json
        } else {
            LogFormat::Text
        };
        start_blocking(config, format).context("daemon exited with error")
    }
}
