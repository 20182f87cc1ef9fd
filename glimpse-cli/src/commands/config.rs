//! `glimpse config`: show the configuration the daemon would run with.

use anyhow::{Context, Result};
use clap::Args;

use glimpse_core::config::to_yaml;

use super::ConfigSource;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub source: ConfigSource,

    /// Emit JSON instead of YAML.
    #[arg(long)]
    pub json: bool,
}

impl ConfigArgs {
    pub fn run(self) -> Result<()> {
        let config = self.source.load()?;
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&config).context("failed to render config JSON")?
            );
        } else {
            print!("{}", to_yaml(&config).context("failed to render config YAML")?);
        }
        Ok(())
    }
}
