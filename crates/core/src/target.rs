//! Sync targets and modes.

use std::path::{Component, Path, PathBuf};

use crate::errors::SyncError;

/// How a [`SyncTarget`] is brought up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Update an existing checkout in place, cloning it first if missing.
    IncrementalPull,
    /// Delete the directory and clone the requested revision afresh.
    FullReplace,
}

/// One directory to bring in line with an upstream repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    /// Destination, relative to the project root.
    pub local_path: PathBuf,
    /// Upstream repository. An incremental pull of an existing checkout may
    /// leave this empty to use the checkout's default path.
    pub remote_location: Option<String>,
    /// Revision to check out. Required for a full replace.
    pub revision_tag: Option<String>,
    /// Globs removed from the snapshot after a full replace.
    pub exclusion_globs: Vec<String>,
}

impl SyncTarget {
    /// Create a target for `local_path`, which must be relative to the
    /// project root and must not climb out of it.
    pub fn new(local_path: impl Into<PathBuf>) -> Result<Self, SyncError> {
        let local_path = local_path.into();
        ensure_relative(&local_path)?;
        Ok(Self {
            local_path,
            remote_location: None,
            revision_tag: None,
            exclusion_globs: Vec::new(),
        })
    }

    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote_location = Some(remote.into());
        self
    }

    pub fn with_revision(mut self, tag: impl Into<String>) -> Self {
        self.revision_tag = Some(tag.into());
        self
    }

    pub fn with_exclusions(mut self, globs: Vec<String>) -> Self {
        self.exclusion_globs = globs;
        self
    }
}

/// Reject absolute paths, paths containing `..`, and paths that name the
/// project root itself (empty or only `.` components).
pub fn ensure_relative(path: &Path) -> Result<(), SyncError> {
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    let names_subdir = path.components().any(|c| matches!(c, Component::Normal(_)));
    if escapes || !names_subdir {
        return Err(SyncError::PathOutsideRoot(path.display().to_string()));
    }
    Ok(())
}
