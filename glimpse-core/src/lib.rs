//! Glimpse core library: configuration types, loading, errors.
//!
//! - [`types`]: newtypes and config structs
//! - [`error`]: [`ConfigError`]
//! - [`config`]: load / validate / render

pub mod config;
pub mod error;
pub mod types;

pub use error::ConfigError;
pub use types::{
    ArtifactsConfig, CaptureConfig, Config, LogSourceConfig, OwnerConfig, Trigger,
};
