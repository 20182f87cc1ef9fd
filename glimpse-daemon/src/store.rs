//! Artifact directory management.
//!
//! # Layout
//!
//! ```text
//! <dir>/                                        (mode 0750, owner:group)
//!   failed-login_2026-10-17_06-24-03.jpg        (mode 0400 once finalized)
//!   failed-login_2026-10-17_06-24-03_1.jpg      (same-second collision)
//! ```
//!
//! The directory's contents are the only persisted state: the debounce gate
//! derives "time of last capture" from the newest matching file's mtime.

use std::fs;
use std::io::ErrorKind;
use std::os::unix::fs::{DirBuilderExt, MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use nix::unistd::chown;

use glimpse_core::ArtifactsConfig;

use crate::error::{io_err, DaemonError};
use crate::ownership::Ownership;

/// Owner and group access, no world access.
pub const DIR_MODE: u32 = 0o750;
/// Owner read-only.
pub const ARTIFACT_MODE: u32 = 0o400;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
const TIMESTAMP_LEN: usize = "2026-01-01_00-00-00".len();

// ---------------------------------------------------------------------------
// Naming
// ---------------------------------------------------------------------------

/// Deterministic artifact file names: `<prefix>_<timestamp>[_<n>].<extension>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNaming {
    prefix: String,
    extension: String,
}

impl ArtifactNaming {
    pub fn new(prefix: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            extension: extension.into(),
        }
    }

    pub fn file_name<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        format!(
            "{}_{}.{}",
            self.prefix,
            at.format(TIMESTAMP_FORMAT),
            self.extension
        )
    }

    /// Name used when `file_name(at)` is already taken; `n` starts at 1.
    pub fn collision_name<Tz: TimeZone>(&self, at: &DateTime<Tz>, n: u32) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        format!(
            "{}_{}_{}.{}",
            self.prefix,
            at.format(TIMESTAMP_FORMAT),
            n,
            self.extension
        )
    }

    /// Capture timestamp encoded in `file_name`, or `None` if the name does
    /// not follow the artifact pattern.
    pub fn timestamp_of(&self, file_name: &str) -> Option<NaiveDateTime> {
        let rest = file_name.strip_prefix(&self.prefix)?.strip_prefix('_')?;
        let stem = rest
            .strip_suffix(&self.extension)?
            .strip_suffix('.')?;
        if stem.len() < TIMESTAMP_LEN || !stem.is_char_boundary(TIMESTAMP_LEN) {
            return None;
        }
        let (stamp, suffix) = stem.split_at(TIMESTAMP_LEN);
        if !suffix.is_empty() {
            let digits = suffix.strip_prefix('_')?;
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
        }
        NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.timestamp_of(file_name).is_some()
    }
}

impl From<&ArtifactsConfig> for ArtifactNaming {
    fn from(config: &ArtifactsConfig) -> Self {
        Self::new(config.prefix.clone(), config.extension.clone())
    }
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

/// A capture output file found in the artifact directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub file_name: String,
    pub modified: SystemTime,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
}

impl Artifact {
    /// Mode `0400` and owned by `owner`.
    pub fn is_finalized(&self, owner: &Ownership) -> bool {
        self.mode == ARTIFACT_MODE
            && self.uid == owner.uid.as_raw()
            && self.gid == owner.gid.as_raw()
    }
}

/// The capture output directory and everything in it.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
    naming: ArtifactNaming,
    owner: Ownership,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>, naming: ArtifactNaming, owner: Ownership) -> Self {
        Self {
            dir: dir.into(),
            naming,
            owner,
        }
    }

    pub fn from_config(config: &ArtifactsConfig, owner: Ownership) -> Self {
        Self::new(config.dir.clone(), ArtifactNaming::from(config), owner)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn naming(&self) -> &ArtifactNaming {
        &self.naming
    }

    pub fn owner(&self) -> Ownership {
        self.owner
    }

    /// Create the directory (mode `0750`, configured owner) if absent; when
    /// present, re-assert ownership and mode. Existing contents are never
    /// touched. Already-correct state is left as is.
    pub fn ensure_directory(&self) -> Result<(), DaemonError> {
        match fs::metadata(&self.dir) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(DaemonError::NotADirectory(self.dir.clone())),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                // Missing parents get the default mode; only the leaf is restricted.
                if let Some(parent) = self.dir.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
                }
                match fs::DirBuilder::new().mode(DIR_MODE).create(&self.dir) {
                    Ok(()) => {}
                    Err(err) if err.kind() == ErrorKind::AlreadyExists && self.dir.is_dir() => {}
                    Err(err) => return Err(io_err(&self.dir, err)),
                }
                tracing::info!(dir = %self.dir.display(), "created artifact directory");
            }
            Err(err) => return Err(io_err(&self.dir, err)),
        }

        let meta = fs::metadata(&self.dir).map_err(|e| io_err(&self.dir, e))?;
        if !self.owner.owns(&meta) {
            chown(&self.dir, Some(self.owner.uid), Some(self.owner.gid)).map_err(|source| {
                DaemonError::Chown {
                    path: self.dir.clone(),
                    source,
                }
            })?;
            tracing::info!(
                dir = %self.dir.display(),
                uid = %self.owner.uid,
                gid = %self.owner.gid,
                "corrected artifact directory ownership",
            );
        }
        // DirBuilder's mode is filtered through the umask.
        if meta.permissions().mode() & 0o7777 != DIR_MODE {
            fs::set_permissions(&self.dir, fs::Permissions::from_mode(DIR_MODE))
                .map_err(|e| io_err(&self.dir, e))?;
        }
        Ok(())
    }

    /// All artifacts, newest first.
    pub fn list(&self) -> Result<Vec<Artifact>, DaemonError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(err) => return Err(io_err(&self.dir, err)),
        };

        let mut artifacts = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| io_err(&self.dir, e))?;
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if !self.naming.matches(&file_name) {
                continue;
            }
            let meta = match entry.metadata() {
                Ok(meta) => meta,
                // Raced with an external removal.
                Err(err) if err.kind() == ErrorKind::NotFound => continue,
                Err(err) => return Err(io_err(entry.path(), err)),
            };
            if !meta.is_file() {
                continue;
            }
            let modified = meta.modified().map_err(|e| io_err(entry.path(), e))?;
            artifacts.push(Artifact {
                path: entry.path(),
                file_name,
                modified,
                mode: meta.permissions().mode() & 0o7777,
                uid: meta.uid(),
                gid: meta.gid(),
            });
        }
        artifacts.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| b.file_name.cmp(&a.file_name))
        });
        Ok(artifacts)
    }

    /// The artifact with the greatest mtime, or `None` when there is none or
    /// the directory cannot be read right now.
    pub fn most_recent(&self) -> Option<Artifact> {
        match self.list() {
            Ok(artifacts) => artifacts.into_iter().next(),
            Err(err) => {
                tracing::debug!(error = %err, "artifact lookup failed; treating as empty");
                None
            }
        }
    }

    /// Path for a capture taken at `at`. Never returns an existing path:
    /// same-second collisions get a numeric suffix.
    pub fn next_artifact_path(&self, at: &DateTime<Local>) -> PathBuf {
        let base = self.dir.join(self.naming.file_name(at));
        if !base.exists() {
            return base;
        }
        (1u32..)
            .map(|n| self.dir.join(self.naming.collision_name(at, n)))
            .find(|candidate| !candidate.exists())
            .unwrap_or(base)
    }

    /// Lock down a freshly captured file: mode `0400`, then configured
    /// owner/group. Permissions go first so the file is never readable by
    /// group or world after the ownership change.
    pub fn finalize(&self, path: &Path) -> Result<(), DaemonError> {
        fs::set_permissions(path, fs::Permissions::from_mode(ARTIFACT_MODE))
            .map_err(|e| io_err(path, e))?;
        chown(path, Some(self.owner.uid), Some(self.owner.gid)).map_err(|source| {
            DaemonError::Chown {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Ok(())
    }

    /// Remove whatever a failed capture left at `path`.
    pub fn discard_partial(&self, path: &Path) {
        match fs::remove_file(path) {
            Ok(()) => {
                tracing::warn!(path = %path.display(), "removed partial capture output")
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "could not remove partial capture output")
            }
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
