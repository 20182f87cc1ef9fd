pub mod artifacts;
pub mod capture;
pub mod config;
pub mod run;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use glimpse_core::{
    config::{self as core_config, DEFAULT_CONFIG_PATH},
    Config,
};

/// `--config` flag shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct ConfigSource {
    /// Path to config.yaml. Without it, the default path is used when it
    /// exists and built-in defaults otherwise.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl ConfigSource {
    pub fn load(&self) -> Result<Config> {
        match self.config.as_deref() {
            Some(path) => core_config::load_at(path)
                .with_context(|| format!("failed to load config from {}", path.display())),
            None => core_config::load_or_default_at(Path::new(DEFAULT_CONFIG_PATH))
                .with_context(|| format!("failed to load config from {DEFAULT_CONFIG_PATH}")),
        }
    }
}
