//! Mercurial CLI client.

use std::path::Path;

use tracing::{info, instrument};

use super::command::{run_tool, tool_version};
use crate::errors::VcsError;

/// Client for the `hg` binary.
#[derive(Debug, Clone)]
pub struct HgClient {
    binary: String,
}

impl HgClient {
    /// Create a client invoking `binary` (a name on `$PATH` or a full path).
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// `hg clone <repository> <dest>`
    #[instrument(skip(self), fields(dest = %dest.display()))]
    pub async fn clone_repo(&self, repository: &str, dest: &Path) -> Result<(), VcsError> {
        let dest_str = dest.to_string_lossy().to_string();
        self.run(&["clone", repository, &dest_str], None).await?;
        info!("hg clone completed");
        Ok(())
    }

    /// `hg clone -u <tag> <repository> <dest>`: clone and update the working
    /// directory to `tag`.
    #[instrument(skip(self), fields(dest = %dest.display()))]
    pub async fn clone_at(&self, repository: &str, tag: &str, dest: &Path) -> Result<(), VcsError> {
        let dest_str = dest.to_string_lossy().to_string();
        self.run(&["clone", "-u", tag, repository, &dest_str], None)
            .await?;
        info!("hg clone completed");
        Ok(())
    }

    /// `hg pull -u -R <checkout> [repository]`. Without a repository the
    /// checkout's default path is used.
    #[instrument(skip(self), fields(checkout = %checkout.display()))]
    pub async fn pull_update(&self, checkout: &Path, repository: Option<&str>) -> Result<(), VcsError> {
        let checkout_str = checkout.to_string_lossy().to_string();
        let mut args = vec!["pull", "-u", "-R", checkout_str.as_str()];
        if let Some(repo) = repository {
            args.push(repo);
        }
        self.run(&args, None).await?;
        info!("hg pull completed");
        Ok(())
    }

    /// Node id of the working directory's parent revision.
    pub async fn parent_node(&self, checkout: &Path) -> Result<String, VcsError> {
        let checkout_str = checkout.to_string_lossy().to_string();
        let out = self
            .run(&["parent", "-R", &checkout_str, "--template={node}"], None)
            .await?;
        Ok(out.trim().to_string())
    }

    /// `hg revert <file>` run from `cwd`, restoring the committed version.
    #[instrument(skip(self), fields(cwd = %cwd.display()))]
    pub async fn revert(&self, cwd: &Path, file: &str) -> Result<(), VcsError> {
        self.run(&["revert", file], Some(cwd)).await?;
        Ok(())
    }

    /// First line of `hg --version`.
    pub async fn version(&self) -> Result<String, VcsError> {
        tool_version(&self.binary).await
    }

    async fn run(&self, args: &[&str], cwd: Option<&Path>) -> Result<String, VcsError> {
        run_tool(&self.binary, args, cwd).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_construction() {
        let client = HgClient::new("/opt/hg/bin/hg");
        assert_eq!(client.binary(), "/opt/hg/bin/hg");
    }

    #[tokio::test]
    async fn test_missing_binary_is_reported() {
        let client = HgClient::new("vendorsync-missing-hg");
        let err = client.version().await.unwrap_err();
        assert!(matches!(err, VcsError::BinaryNotFound(ref b) if b == "vendorsync-missing-hg"));
    }
}
