//! Resolution of the configured capture-owner identity.
//!
//! The installer is expected to have created the user and group; this module
//! only turns names into ids. Resolution happens once at startup and a
//! failure there is fatal.

use std::fs::Metadata;
use std::os::unix::fs::MetadataExt;

use nix::unistd::{Gid, Group, Uid, User};

use glimpse_core::OwnerConfig;

use crate::error::DaemonError;

/// Owner uid/gid applied to the artifact directory and finalized artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ownership {
    pub uid: Uid,
    pub gid: Gid,
}

impl Ownership {
    pub fn new(uid: Uid, gid: Gid) -> Self {
        Self { uid, gid }
    }

    /// The daemon's own effective identity.
    pub fn current() -> Self {
        Self {
            uid: Uid::effective(),
            gid: Gid::effective(),
        }
    }

    /// Resolve `config` against the system user database.
    ///
    /// A named user without a named group uses that user's primary group.
    pub fn resolve(config: &OwnerConfig) -> Result<Self, DaemonError> {
        let user = match config.user.as_deref() {
            Some(name) => Some(lookup_user(name)?),
            None => None,
        };

        let uid = user.as_ref().map(|u| u.uid).unwrap_or_else(Uid::effective);
        let gid = match config.group.as_deref() {
            Some(name) => lookup_group(name)?.gid,
            None => user.as_ref().map(|u| u.gid).unwrap_or_else(Gid::effective),
        };

        Ok(Self { uid, gid })
    }

    /// `true` when `meta` is already owned by this identity.
    pub fn owns(&self, meta: &Metadata) -> bool {
        meta.uid() == self.uid.as_raw() && meta.gid() == self.gid.as_raw()
    }
}

fn lookup_user(name: &str) -> Result<User, DaemonError> {
    User::from_name(name)
        .map_err(|err| DaemonError::Identity(format!("looking up user '{name}': {err}")))?
        .ok_or_else(|| DaemonError::Identity(format!("unknown user '{name}'")))
}

fn lookup_group(name: &str) -> Result<Group, DaemonError> {
    Group::from_name(name)
        .map_err(|err| DaemonError::Identity(format!("looking up group '{name}': {err}")))?
        .ok_or_else(|| DaemonError::Identity(format!("unknown group '{name}'")))
}
