//! `glimpse capture`: one manual capture, for checking the camera setup.

use anyhow::{bail, Context, Result};
use clap::Args;

use glimpse_daemon::{capture_once, CaptureOutcome};

use super::ConfigSource;

#[derive(Args, Debug)]
pub struct CaptureArgs {
    #[command(flatten)]
    pub source: ConfigSource,
}

impl CaptureArgs {
    pub fn run(self) -> Result<()> {
        let config = self.source.load()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to start async runtime")?;
        let outcome = runtime
            .block_on(capture_once(&config))
            .context("capture setup failed")?;

        match outcome {
            CaptureOutcome::Success { path, elapsed } => {
                println!("captured {} in {}ms", path.display(), elapsed.as_millis());
                Ok(())
            }
            CaptureOutcome::TimedOut { after } => {
                bail!("capture timed out after {}s and was killed", after.as_secs())
            }
            CaptureOutcome::ExitedNonZero { code, stderr } => {
                let code = code.map_or_else(|| "signal".to_string(), |c| c.to_string());
                bail!("capture command failed (exit {code}): {stderr}")
            }
            CaptureOutcome::MissingOutput { path } => {
                bail!("capture command succeeded but wrote no file at {}", path.display())
            }
            CaptureOutcome::SpawnFailed { program, error } => {
                bail!("could not start capture command '{program}': {error}")
            }
        }
    }
}
