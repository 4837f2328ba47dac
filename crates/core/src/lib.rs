//! vendorsync core library.
//!
//! Pulls pinned snapshots of third-party subsystems from upstream
//! version-control repositories into the local source tree: configuration,
//! the registry of vendored dependencies, wrappers for the `hg` and `cvs`
//! binaries, exclusion filtering, the trailing blank-line fixup, and the
//! [`RepositorySyncer`] tying them together.

pub mod blank_line;
pub mod config;
pub mod dependencies;
pub mod errors;
pub mod exclusions;
pub mod syncer;
pub mod tag_info;
pub mod target;
pub mod vcs;

// Re-exports for convenience.
pub use blank_line::BlankLineState;
pub use config::VendorConfig;
pub use dependencies::Dependency;
pub use syncer::RepositorySyncer;
pub use target::{SyncMode, SyncTarget};
