//! YAML configuration loading.
//!
//! # File layout
//!
//! ```text
//! /etc/glimpse/config.yaml   (default; every key optional)
//! ```
//!
//! # API pattern
//!
//! - `load_at(path)`: the file must exist; used for an explicit `--config`
//! - `load_or_default_at(path)`: a missing file yields [`Config::default`]
//!
//! Both validate before returning, so callers never see a config the daemon
//! would refuse to run with.

use std::path::Path;

use crate::error::ConfigError;
use crate::types::Config;

// ---------------------------------------------------------------------------
// 1. Defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_CONFIG_PATH: &str = "/etc/glimpse/config.yaml";

pub const DEFAULT_TRIGGER: &str = "authentication failure";
pub const DEFAULT_DEBOUNCE_SECS: u64 = 4;
pub const DEFAULT_CAPTURE_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_CAPTURE_DEVICE: &str = "/dev/video0";

pub const DEFAULT_ARTIFACT_DIR: &str = "/var/lib/glimpse/captures";
pub const DEFAULT_ARTIFACT_PREFIX: &str = "failed-login";
pub const DEFAULT_ARTIFACT_EXTENSION: &str = "jpg";

/// Substituted with the capture device in `capture.command`.
pub const DEVICE_PLACEHOLDER: &str = "{device}";
/// Substituted with the artifact path in `capture.command`.
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

// ---------------------------------------------------------------------------
// 2. Load
// ---------------------------------------------------------------------------

/// Load and validate the config at `path`.
///
/// Returns `ConfigError::NotFound` if absent, `ConfigError::Parse` (with path
/// and line context) if malformed, `ConfigError::Invalid` on a bad value.
pub fn load_at(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse(&contents, path)?;
    validate(&config)?;
    Ok(config)
}

/// Like [`load_at`], but a missing file yields the built-in defaults.
pub fn load_or_default_at(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        let config = Config::default();
        validate(&config)?;
        return Ok(config);
    }
    load_at(path)
}

fn parse(contents: &str, path: &Path) -> Result<Config, ConfigError> {
    // An empty file is a valid "all defaults" config; serde_yaml rejects it.
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// 3. Validate / render
// ---------------------------------------------------------------------------

/// Reject values the daemon cannot run with.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.trigger.as_str().is_empty() {
        return Err(ConfigError::invalid(
            "trigger",
            "must not be empty (an empty trigger matches every line)",
        ));
    }
    if config.log_source.command.is_empty() || config.log_source.command[0].trim().is_empty() {
        return Err(ConfigError::invalid(
            "log_source.command",
            "must name a program",
        ));
    }
    if config.capture.command.is_empty() || config.capture.command[0].trim().is_empty() {
        return Err(ConfigError::invalid("capture.command", "must name a program"));
    }
    if !config
        .capture
        .command
        .iter()
        .any(|arg| arg.contains(OUTPUT_PLACEHOLDER))
    {
        return Err(ConfigError::invalid(
            "capture.command",
            format!("must contain the {OUTPUT_PLACEHOLDER} placeholder"),
        ));
    }
    if config.capture.timeout_secs == 0 {
        return Err(ConfigError::invalid("capture.timeout_secs", "must be at least 1"));
    }
    validate_name_part("artifacts.prefix", &config.artifacts.prefix)?;
    validate_name_part("artifacts.extension", &config.artifacts.extension)?;
    if config.artifacts.dir.as_os_str().is_empty() {
        return Err(ConfigError::invalid("artifacts.dir", "must not be empty"));
    }
    Ok(())
}

fn validate_name_part(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::invalid(field, "must not be empty"));
    }
    if value.contains('/') || value.contains('\0') {
        return Err(ConfigError::invalid(
            field,
            format!("'{value}' must be a plain file-name fragment"),
        ));
    }
    Ok(())
}

/// Render `config` back to YAML (used by `glimpse config`).
pub fn to_yaml(config: &Config) -> Result<String, ConfigError> {
    Ok(serde_yaml::to_string(config)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Trigger;

    #[test]
    fn default_config_is_valid() {
        validate(&Config::default()).expect("defaults must validate");
    }

    #[test]
    fn empty_trigger_is_rejected() {
        let config = Config {
            trigger: Trigger::from(""),
            ..Config::default()
        };
        let err = validate(&config).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "trigger", .. }), "got: {err}");
    }

    #[test]
    fn empty_file_parses_to_defaults() {
        let parsed = parse("\n  \n", Path::new("config.yaml")).expect("parse");
        assert_eq!(parsed, Config::default());
    }
}
