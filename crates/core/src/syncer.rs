//! Brings vendored directories in line with their upstream repositories.
//!
//! [`RepositorySyncer`] runs every step sequentially: each external command
//! is awaited before the next one starts, and the first failure is returned
//! to the caller untouched. Directories created by a clone or export that
//! fails are removed by a drop guard; exclusion filtering is never rolled
//! back.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::blank_line::{self, FixupOutcome};
use crate::dependencies::{hg_exclusions, CvsModule, Dependency, Strategy};
use crate::errors::SyncError;
use crate::exclusions;
use crate::tag_info;
use crate::target::{ensure_relative, SyncMode, SyncTarget};
use crate::vcs::{CvsClient, HgClient};

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Result of [`RepositorySyncer::sync_with_blank_line_fixup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlankLineSyncReport {
    pub fixup: FixupOutcome,
    /// Paths removed by exclusion filtering.
    pub removed: Vec<PathBuf>,
    /// The `TAG-INFO` marker that was written.
    pub tag_file: PathBuf,
}

/// Result of [`RepositorySyncer::sync`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Node id the checkout was updated to.
    Pulled { revision: String },
    /// Paths removed by exclusion filtering.
    Replaced { removed: Vec<PathBuf> },
}

/// Result of [`RepositorySyncer::update_dependency`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateReport {
    BlankLineFixup(BlankLineSyncReport),
    Replaced { removed: Vec<PathBuf> },
    Exported { directories: Vec<PathBuf> },
}

// ---------------------------------------------------------------------------
// Cleanup guard
// ---------------------------------------------------------------------------

/// Removes a directory on drop unless disarmed. Held while an external
/// command populates the directory.
struct PartialDirGuard {
    path: PathBuf,
    armed: bool,
}

impl PartialDirGuard {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PartialDirGuard {
    fn drop(&mut self) {
        if self.armed && self.path.exists() {
            warn!(path = %self.path.display(), "removing partially populated directory");
            if let Err(e) = std::fs::remove_dir_all(&self.path) {
                warn!(path = %self.path.display(), error = %e, "cleanup failed");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// RepositorySyncer
// ---------------------------------------------------------------------------

/// Syncs directories below a project root from upstream repositories.
#[derive(Debug, Clone)]
pub struct RepositorySyncer {
    topsrcdir: PathBuf,
    hg: HgClient,
    cvs: CvsClient,
}

impl RepositorySyncer {
    pub fn new(topsrcdir: impl Into<PathBuf>, hg: HgClient, cvs: CvsClient) -> Self {
        Self {
            topsrcdir: topsrcdir.into(),
            hg,
            cvs,
        }
    }

    pub fn topsrcdir(&self) -> &Path {
        &self.topsrcdir
    }

    pub fn hg(&self) -> &HgClient {
        &self.hg
    }

    pub fn cvs(&self) -> &CvsClient {
        &self.cvs
    }

    /// Absolute location of a project-relative path.
    pub fn resolve(&self, local_path: &Path) -> Result<PathBuf, SyncError> {
        ensure_relative(local_path)?;
        Ok(self.topsrcdir.join(local_path))
    }

    /// Clone `remote` into `local_path` if it does not exist, otherwise pull
    /// and update it (from `remote`, or the checkout's default path).
    ///
    /// Returns the node id of the updated working directory.
    #[instrument(skip(self), fields(local_path = %local_path.display()))]
    pub async fn incremental_pull(
        &self,
        local_path: &Path,
        remote: Option<&str>,
    ) -> Result<String, SyncError> {
        let fulldir = self.resolve(local_path)?;

        if !fulldir.exists() {
            let remote =
                remote.ok_or_else(|| SyncError::MissingRemote(fulldir.display().to_string()))?;
            create_parent(&fulldir)?;
            let guard = PartialDirGuard::new(&fulldir);
            self.hg.clone_repo(remote, &fulldir).await?;
            guard.disarm();
        } else {
            self.hg.pull_update(&fulldir, remote).await?;
        }

        let revision = self.hg.parent_node(&fulldir).await?;
        debug!(revision = revision.as_str(), "working directory updated");
        Ok(revision)
    }

    /// Replace `local_path` with a fresh clone of `remote` at `tag`, then
    /// delete everything matching `exclusions`.
    ///
    /// Returns the paths removed by the exclusions.
    #[instrument(skip(self, exclusions), fields(local_path = %local_path.display()))]
    pub async fn full_replace(
        &self,
        local_path: &Path,
        remote: &str,
        tag: &str,
        exclusions: &[String],
    ) -> Result<Vec<PathBuf>, SyncError> {
        let fulldir = self.resolve(local_path)?;

        if fulldir.exists() {
            info!(path = %fulldir.display(), "removing existing directory");
            std::fs::remove_dir_all(&fulldir).map_err(|e| SyncError::fs(&fulldir, e))?;
        }
        if fulldir.exists() {
            return Err(SyncError::LeftoverCheckout(fulldir.display().to_string()));
        }

        create_parent(&fulldir)?;
        let guard = PartialDirGuard::new(&fulldir);
        self.hg.clone_at(remote, tag, &fulldir).await?;
        guard.disarm();

        exclusions::remove_excluded(&fulldir, exclusions)
    }

    /// Full replace of `destination` that keeps the trailing blank line of
    /// `tracked_file` from drifting, then records `tag` in `TAG-INFO`.
    ///
    /// `tracked_file` is first reverted to its committed version in the
    /// consuming tree to capture the pre-sync state. After the replace, the
    /// blank line is toggled only if the state did not change.
    #[instrument(skip(self), fields(tracked_file = %tracked_file.display(), destination = %destination.display()))]
    pub async fn sync_with_blank_line_fixup(
        &self,
        tag: &str,
        tracked_file: &Path,
        destination: &Path,
        remote: &str,
    ) -> Result<BlankLineSyncReport, SyncError> {
        let tracked_full = self.resolve(tracked_file)?;

        info!("reverting to the committed version to get its blank line state");
        self.hg
            .revert(&self.topsrcdir, &tracked_file.to_string_lossy())
            .await?;
        let old_state = blank_line::detect(&tracked_full)?;
        info!(state = %old_state, "old blank line state");

        let removed = self
            .full_replace(destination, remote, tag, &hg_exclusions())
            .await?;

        let fixup = blank_line::apply_fixup(&tracked_full, old_state)?;
        let tag_file = tag_info::write(&self.resolve(destination)?, tag)?;
        info!(tag, path = %tag_file.display(), "recorded vendored tag");

        Ok(BlankLineSyncReport {
            fixup,
            removed,
            tag_file,
        })
    }

    /// Export each CVS module at `tag` from `cvsroot` into its local path,
    /// replacing whatever was there. Modules are processed one at a time.
    #[instrument(skip(self, modules))]
    pub async fn cvs_export(
        &self,
        modules: &[CvsModule],
        tag: &str,
        cvsroot: &str,
    ) -> Result<Vec<PathBuf>, SyncError> {
        let mut exported = Vec::with_capacity(modules.len());

        for module in modules {
            let fullpath = self.resolve(&module.local_path)?;
            if fullpath.exists() {
                info!("Removing '{}'", fullpath.display());
                std::fs::remove_dir_all(&fullpath).map_err(|e| SyncError::fs(&fullpath, e))?;
            }

            let parent = fullpath
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.topsrcdir.clone());
            let leaf = fullpath
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .ok_or_else(|| SyncError::PathOutsideRoot(module.local_path.display().to_string()))?;
            std::fs::create_dir_all(&parent).map_err(|e| SyncError::fs(&parent, e))?;

            info!("CVS export begin: {}", utc_timestamp());
            let guard = PartialDirGuard::new(&fullpath);
            self.cvs
                .export(cvsroot, tag, &leaf, &module.upstream_module, &parent)
                .await?;
            guard.disarm();
            info!("CVS export end: {}", utc_timestamp());

            exported.push(fullpath);
        }

        Ok(exported)
    }

    /// Bring `target` up to date using `mode`.
    pub async fn sync(&self, target: &SyncTarget, mode: SyncMode) -> Result<SyncOutcome, SyncError> {
        match mode {
            SyncMode::IncrementalPull => {
                let revision = self
                    .incremental_pull(&target.local_path, target.remote_location.as_deref())
                    .await?;
                Ok(SyncOutcome::Pulled { revision })
            }
            SyncMode::FullReplace => {
                let location = target.local_path.display().to_string();
                let remote = target
                    .remote_location
                    .as_deref()
                    .ok_or_else(|| SyncError::MissingRemote(location.clone()))?;
                let tag = target
                    .revision_tag
                    .as_deref()
                    .ok_or(SyncError::MissingRevision(location))?;
                let removed = self
                    .full_replace(&target.local_path, remote, tag, &target.exclusion_globs)
                    .await?;
                Ok(SyncOutcome::Replaced { removed })
            }
        }
    }

    /// Update a registered dependency to `tag` from `upstream` (a repository
    /// URL, or a CVSROOT for CVS-exported dependencies).
    pub async fn update_dependency(
        &self,
        dep: Dependency,
        tag: &str,
        upstream: &str,
    ) -> Result<UpdateReport, SyncError> {
        info!(dependency = %dep, tag, upstream, "updating dependency");
        match dep.strategy() {
            Strategy::BlankLineFixup { tracked_file } => {
                let report = self
                    .sync_with_blank_line_fixup(tag, &tracked_file, &dep.local_dir(), upstream)
                    .await?;
                Ok(UpdateReport::BlankLineFixup(report))
            }
            Strategy::HgReplace { exclusions } => {
                let removed = self
                    .full_replace(&dep.local_dir(), upstream, tag, &exclusions)
                    .await?;
                Ok(UpdateReport::Replaced { removed })
            }
            Strategy::CvsExport { modules } => {
                let directories = self.cvs_export(&modules, tag, upstream).await?;
                Ok(UpdateReport::Exported { directories })
            }
        }
    }

    /// Vendored tag recorded for `dep`, if any.
    pub fn vendored_tag(&self, dep: Dependency) -> Result<Option<String>, SyncError> {
        tag_info::read(&self.resolve(&dep.local_dir())?)
    }
}

fn create_parent(path: &Path) -> Result<(), SyncError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| SyncError::fs(parent, e))?;
    }
    Ok(())
}

fn utc_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn syncer(root: &Path) -> RepositorySyncer {
        RepositorySyncer::new(root, HgClient::new("hg"), CvsClient::new("cvs"))
    }

    #[test]
    fn test_resolve_joins_topsrcdir() {
        let s = syncer(Path::new("/src/mozilla"));
        assert_eq!(
            s.resolve(Path::new("security/nss")).unwrap(),
            PathBuf::from("/src/mozilla/security/nss")
        );
        assert!(s.resolve(Path::new("/abs")).is_err());
    }

    #[test]
    fn test_guard_removes_directory_unless_disarmed() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("partial");
        std::fs::create_dir_all(dir.join("sub")).unwrap();
        {
            let _guard = PartialDirGuard::new(&dir);
        }
        assert!(!dir.exists());

        std::fs::create_dir_all(&dir).unwrap();
        PartialDirGuard::new(&dir).disarm();
        assert!(dir.exists());
    }

    #[test]
    fn test_utc_timestamp_format() {
        let ts = utc_timestamp();
        assert!(ts.ends_with(" UTC"));
        assert_eq!(ts.len(), "2014-01-01 00:00:00 UTC".len());
    }

    #[tokio::test]
    async fn test_full_replace_requires_revision() {
        let tmp = tempfile::tempdir().unwrap();
        let target = SyncTarget::new("dom/bindings/parser")
            .unwrap()
            .with_remote("https://hg.example.org/parser");
        let err = syncer(tmp.path())
            .sync(&target, SyncMode::FullReplace)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::MissingRevision(_)));
    }

    #[tokio::test]
    async fn test_full_replace_of_project_root_is_refused() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("unrelated")).unwrap();
        std::fs::write(tmp.path().join("unrelated/keep.c"), "int x;\n").unwrap();

        for root in [".", "./."] {
            let err = syncer(tmp.path())
                .full_replace(Path::new(root), "https://hg.example.org/x", "tip", &[])
                .await
                .unwrap_err();
            assert!(matches!(err, SyncError::PathOutsideRoot(_)), "{root}");
        }
        assert!(tmp.path().join("unrelated/keep.c").exists());
    }

    #[tokio::test]
    async fn test_pull_of_missing_checkout_requires_remote() {
        let tmp = tempfile::tempdir().unwrap();
        let err = syncer(tmp.path())
            .incremental_pull(Path::new("nsprpub"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::MissingRemote(_)));
    }
}
