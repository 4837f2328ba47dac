//! Error types for the vendorsync core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them for callers that want a single
//! error type.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Vcs(#[from] VcsError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl CoreError {
    /// Exit code of the external command that caused this error, if any.
    pub fn command_exit_code(&self) -> Option<i32> {
        match self {
            Self::Vcs(e) => e.exit_code(),
            Self::Sync(SyncError::Vcs(e)) => e.exit_code(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Version-control errors
// ---------------------------------------------------------------------------

/// Errors from invoking an external version-control binary.
#[derive(Debug, Error)]
pub enum VcsError {
    /// The binary was not found on `$PATH` (or at the configured location).
    #[error("{0} binary not found")]
    BinaryNotFound(String),

    /// The command exited with a non-zero status.
    #[error("{program} command failed (exit {exit_code}): {stderr}")]
    CommandFailed {
        program: String,
        exit_code: i32,
        stderr: String,
    },

    /// Generic I/O wrapper.
    #[error("vcs I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl VcsError {
    /// Exit code of the failed command. `None` when the process never ran or
    /// was killed by a signal.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::CommandFailed { exit_code, .. } if *exit_code > 0 => Some(*exit_code),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Sync errors
// ---------------------------------------------------------------------------

/// Errors from the repository syncer.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The destination still existed right before the clone step.
    #[error("destination '{0}' still exists after removal")]
    LeftoverCheckout(String),

    /// A sync target path was absolute or escaped the project root.
    #[error("path '{0}' must be relative to the project root")]
    PathOutsideRoot(String),

    /// An incremental pull needs a remote to clone from.
    #[error("'{0}' does not exist and no repository was given to clone from")]
    MissingRemote(String),

    /// A full replace needs a revision to clone.
    #[error("no revision given for '{0}'")]
    MissingRevision(String),

    /// An exclusion pattern is not a valid glob.
    #[error("invalid exclusion pattern '{pattern}': {detail}")]
    InvalidExclusion { pattern: String, detail: String },

    /// Filesystem error while replacing or filtering a tree.
    #[error("filesystem error at '{path}': {source}")]
    Filesystem {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Underlying version-control error.
    #[error("sync vcs error: {0}")]
    Vcs(#[from] VcsError),
}

impl SyncError {
    pub(crate) fn fs(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.display().to_string(),
            source,
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
