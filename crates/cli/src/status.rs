//! Table of vendored dependencies and the upstream tags they are at.

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

use vendorsync_core::dependencies::{Dependency, Strategy};
use vendorsync_core::{RepositorySyncer, VendorConfig};

use crate::style;

/// Print one row per registered dependency.
pub fn run_status(syncer: &RepositorySyncer, config: &VendorConfig) -> Result<()> {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Dependency", "Directory", "Strategy", "Upstream", "Vendored tag"]);

    for dep in Dependency::ALL {
        let dir = dep.local_dir();
        let tag = vendored_tag_label(syncer, dep)?;

        table.add_row(vec![
            Cell::new(dep.name()),
            Cell::new(dir.display()),
            Cell::new(strategy_label(&dep.strategy())),
            Cell::new(config.upstream.for_dependency(dep)),
            Cell::new(tag),
        ]);
    }

    println!();
    println!("{}", style::header("Vendored dependencies"));
    println!("{}", style::dim(&syncer.topsrcdir().display().to_string()));
    println!("{table}");
    Ok(())
}

/// Recorded tag, `none` without a `TAG-INFO`, `missing` without the directory.
fn vendored_tag_label(syncer: &RepositorySyncer, dep: Dependency) -> Result<String> {
    if !syncer.topsrcdir().join(dep.local_dir()).exists() {
        return Ok("missing".to_string());
    }
    Ok(syncer
        .vendored_tag(dep)?
        .unwrap_or_else(|| "none".to_string()))
}

fn strategy_label(strategy: &Strategy) -> &'static str {
    match strategy {
        Strategy::BlankLineFixup { .. } => "hg replace + blank line fixup",
        Strategy::HgReplace { .. } => "hg replace",
        Strategy::CvsExport { .. } => "cvs export",
    }
}
