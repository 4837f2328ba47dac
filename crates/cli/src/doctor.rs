//! Health check for the vendoring setup.

use anyhow::Result;

use vendorsync_core::{RepositorySyncer, VendorConfig};

use crate::style;

/// Check the configuration, the project root and the external binaries.
pub async fn run_doctor(syncer: &RepositorySyncer, config: &VendorConfig) -> Result<()> {
    println!();
    println!("{}", style::header("vendorsync doctor"));
    println!("{}", "═".repeat(17));
    println!();

    let mut issues = Vec::new();

    // 1. Configuration
    match config.validate() {
        Ok(()) => println!("  {}", style::success("Configuration     Valid")),
        Err(e) => {
            println!("  {}", style::error(&format!("Configuration     {}", e)));
            issues.push("Fix configuration errors".to_string());
        }
    }

    // 2. Project root
    let root = syncer.topsrcdir();
    if root.is_dir() {
        println!(
            "  {}",
            style::success(&format!("Source Directory  {}", root.display()))
        );
    } else {
        println!(
            "  {}",
            style::error(&format!("Source Directory  {} (missing)", root.display()))
        );
        issues.push("Pass --topsrcdir pointing at the source tree".to_string());
    }

    // 3. Mercurial
    match syncer.hg().version().await {
        Ok(v) => println!("  {}", style::success(&format!("Mercurial         {}", v))),
        Err(e) => {
            println!("  {}", style::error(&format!("Mercurial         {}", e)));
            issues.push(format!(
                "Install Mercurial or point --hg / $HG at it (tried '{}')",
                syncer.hg().binary()
            ));
        }
    }

    // 4. CVS (only needed for libffi)
    match syncer.cvs().version().await {
        Ok(v) => println!("  {}", style::success(&format!("CVS               {}", v))),
        Err(e) => {
            println!("  {}", style::warn(&format!("CVS               {}", e)));
            issues.push(format!(
                "Install CVS or point --cvs / $CVS at it to update libffi (tried '{}')",
                syncer.cvs().binary()
            ));
        }
    }

    println!();
    if issues.is_empty() {
        println!("{}", style::success("All checks passed"));
        println!();
        return Ok(());
    }

    println!("{}", style::header("Issues"));
    for (i, issue) in issues.iter().enumerate() {
        println!("  {}. {}", i + 1, issue);
    }
    println!();
    anyhow::bail!("{} issue(s) found", issues.len())
}
