//! `update_*` and `pull` commands.

use std::path::Path;

use anyhow::{Context, Result};

use vendorsync_core::dependencies::Dependency;
use vendorsync_core::syncer::UpdateReport;
use vendorsync_core::RepositorySyncer;

use crate::style;

/// Update `dep` to `tag` from `upstream` and summarize what happened.
pub async fn run_update(
    syncer: &RepositorySyncer,
    dep: Dependency,
    tag: &str,
    upstream: &str,
) -> Result<()> {
    let report = syncer
        .update_dependency(dep, tag, upstream)
        .await
        .with_context(|| format!("failed to update {} to {}", dep, tag))?;

    println!("{}", style::success(&format!("{} updated to {}", dep, tag)));
    match report {
        UpdateReport::BlankLineFixup(report) => {
            let fixup = &report.fixup;
            println!("  old blank line state: {}", fixup.old_state);
            println!("  new blank line state: {}", fixup.new_state);
            if fixup.toggled {
                println!("  toggled trailing blank line");
            }
            println!("  excluded paths removed: {}", report.removed.len());
            println!("  wrote {}", report.tag_file.display());
        }
        UpdateReport::Replaced { removed } => {
            println!("  excluded paths removed: {}", removed.len());
        }
        UpdateReport::Exported { directories } => {
            for dir in directories {
                println!("  exported {}", dir.display());
            }
        }
    }
    Ok(())
}

/// Clone or pull `dir` and print the revision it ended up at.
pub async fn run_pull(syncer: &RepositorySyncer, dir: &Path, repo: Option<&str>) -> Result<()> {
    let revision = syncer
        .incremental_pull(dir, repo)
        .await
        .with_context(|| format!("failed to pull {}", dir.display()))?;
    println!("{}", pull_summary(&revision));
    Ok(())
}

fn pull_summary(revision: &str) -> String {
    format!("Updated to revision {}.", revision)
}
