//! `glimpse artifacts`: what has been captured so far.

use std::time::SystemTime;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use glimpse_daemon::{Artifact, ArtifactStore, Ownership};

use super::ConfigSource;

#[derive(Args, Debug)]
pub struct ArtifactsArgs {
    #[command(flatten)]
    pub source: ConfigSource,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl ArtifactsArgs {
    pub fn run(self) -> Result<()> {
        let config = self.source.load()?;
        let owner = Ownership::resolve(&config.owner).context("failed to resolve artifact owner")?;
        let store = ArtifactStore::from_config(&config.artifacts, owner);
        let artifacts = store
            .list()
            .with_context(|| format!("failed to read {}", store.dir().display()))?;

        if self.json {
            print_json(&owner, &artifacts)?;
        } else {
            print_table(&store, &owner, &artifacts);
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct ArtifactJson {
    file: String,
    path: String,
    modified_at: String,
    age_secs: u64,
    mode: String,
    uid: u32,
    gid: u32,
    finalized: bool,
}

#[derive(Tabled)]
struct ArtifactTableRow {
    #[tabled(rename = "artifact")]
    file: String,
    #[tabled(rename = "captured")]
    captured: String,
    #[tabled(rename = "age")]
    age: String,
    #[tabled(rename = "owner")]
    owner: String,
    #[tabled(rename = "mode")]
    mode: String,
}

fn print_json(owner: &Ownership, artifacts: &[Artifact]) -> Result<()> {
    let payload: Vec<ArtifactJson> = artifacts
        .iter()
        .map(|a| ArtifactJson {
            file: a.file_name.clone(),
            path: a.path.display().to_string(),
            modified_at: DateTime::<Local>::from(a.modified).to_rfc3339(),
            age_secs: age_secs(a.modified),
            mode: format!("{:04o}", a.mode),
            uid: a.uid,
            gid: a.gid,
            finalized: a.is_finalized(owner),
        })
        .collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize artifacts JSON")?
    );
    Ok(())
}

fn print_table(store: &ArtifactStore, owner: &Ownership, artifacts: &[Artifact]) {
    println!(
        "Glimpse v{} | {} artifacts | {}",
        env!("CARGO_PKG_VERSION"),
        artifacts.len(),
        store.dir().display(),
    );
    if artifacts.is_empty() {
        println!("No artifacts captured yet.");
        return;
    }

    let rows: Vec<ArtifactTableRow> = artifacts
        .iter()
        .map(|a| ArtifactTableRow {
            file: a.file_name.clone(),
            captured: DateTime::<Local>::from(a.modified)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            age: format_seconds(age_secs(a.modified)),
            owner: format!("{}:{}", a.uid, a.gid),
            mode: finalized_label(a, owner),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

fn finalized_label(artifact: &Artifact, owner: &Ownership) -> String {
    let octal = format!("{:04o}", artifact.mode);
    if artifact.is_finalized(owner) {
        octal.green().to_string()
    } else {
        format!("{} (not finalized)", octal.yellow().bold())
    }
}

fn age_secs(modified: SystemTime) -> u64 {
    SystemTime::now()
        .duration_since(modified)
        .unwrap_or_default()
        .as_secs()
}

fn format_seconds(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{seconds}s");
    }
    if seconds < 60 * 60 {
        return format!("{}m", seconds / 60);
    }
    if seconds < 60 * 60 * 24 {
        return format!("{}h", seconds / (60 * 60));
    }
    format!("{}d", seconds / (60 * 60 * 24))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_format_to_largest_unit() {
        assert_eq!(format_seconds(0), "0s");
        assert_eq!(format_seconds(65), "1m");
        assert_eq!(format_seconds(2 * 60 * 60 + 5), "2h");
        assert_eq!(format_seconds(3 * 24 * 60 * 60), "3d");
    }

    #[test]
    fn future_mtime_has_zero_age() {
        let future = SystemTime::now() + std::time::Duration::from_secs(60);
        assert_eq!(age_secs(future), 0);
    }
}
