//! CVS CLI client.

use std::path::Path;

use tracing::{info, instrument};

use super::command::{run_tool, tool_version};
use crate::errors::VcsError;

/// Client for the `cvs` binary.
#[derive(Debug, Clone)]
pub struct CvsClient {
    binary: String,
}

impl CvsClient {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// `cvs -d <cvsroot> export -r <tag> -d <leaf> <module>` run inside
    /// `parent`, producing `parent/leaf` without CVS metadata.
    #[instrument(skip(self), fields(parent = %parent.display()))]
    pub async fn export(
        &self,
        cvsroot: &str,
        tag: &str,
        leaf: &str,
        module: &str,
        parent: &Path,
    ) -> Result<(), VcsError> {
        run_tool(
            &self.binary,
            &["-d", cvsroot, "export", "-r", tag, "-d", leaf, module],
            Some(parent),
        )
        .await?;
        info!("cvs export completed");
        Ok(())
    }

    /// First line of `cvs --version`.
    pub async fn version(&self) -> Result<String, VcsError> {
        tool_version(&self.binary).await
    }
}
