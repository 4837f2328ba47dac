//! Exclusion filtering for freshly cloned snapshots.
//!
//! Each exclusion is a shell-style glob relative to the snapshot root
//! (e.g. `.hg`, `ply`, `test/*.orig`). `*` never crosses a `/`, and a
//! wildcard only matches dot-files when the pattern itself spells the dot.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use tracing::{debug, info};

use crate::errors::SyncError;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Expand `pattern` against the contents of `root`.
///
/// Returns every existing path that matches, sorted. A missing `root`
/// yields no matches.
pub fn expand(root: &Path, pattern: &str) -> Result<Vec<PathBuf>, SyncError> {
    let pattern = pattern.trim_start_matches("./");
    if pattern.is_empty() || pattern == "." {
        return Ok(Vec::new());
    }

    let full = format!("{}/{}", Pattern::escape(&root.to_string_lossy()), pattern);
    let paths = glob::glob_with(&full, MATCH_OPTIONS).map_err(|e| SyncError::InvalidExclusion {
        pattern: pattern.to_string(),
        detail: e.msg.to_string(),
    })?;

    let mut matches = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => matches.push(path),
            Err(e) => {
                let path = e.path().to_path_buf();
                return Err(SyncError::fs(&path, e.into_error()));
            }
        }
    }
    matches.sort();
    Ok(matches)
}

/// Delete everything under `root` matching any of `exclusions`.
///
/// Directories are removed recursively, everything else individually.
/// Returns the removed paths in removal order. There is no rollback: an
/// error part-way through leaves the tree partially filtered.
pub fn remove_excluded(root: &Path, exclusions: &[String]) -> Result<Vec<PathBuf>, SyncError> {
    let mut removed = Vec::new();

    for pattern in exclusions {
        let matches = expand(root, pattern)?;
        if matches.is_empty() {
            debug!(pattern = pattern.as_str(), "exclusion matched nothing");
        }
        for path in matches {
            let meta = path
                .symlink_metadata()
                .map_err(|e| SyncError::fs(&path, e))?;
            if meta.is_dir() {
                std::fs::remove_dir_all(&path).map_err(|e| SyncError::fs(&path, e))?;
            } else {
                std::fs::remove_file(&path).map_err(|e| SyncError::fs(&path, e))?;
            }
            debug!(path = %path.display(), pattern = pattern.as_str(), "removed excluded path");
            removed.push(path);
        }
    }

    info!(root = %root.display(), count = removed.len(), "applied exclusions");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn tree(files: &[&str], dirs: &[&str]) -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        for d in dirs {
            fs::create_dir_all(tmp.path().join(d)).unwrap();
        }
        for f in files {
            let p = tmp.path().join(f);
            fs::create_dir_all(p.parent().unwrap()).unwrap();
            fs::write(p, "x\n").unwrap();
        }
        tmp
    }

    fn names(root: &Path) -> Vec<String> {
        let mut out: Vec<String> = fs::read_dir(root)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        out.sort();
        out
    }

    #[test]
    fn test_only_exact_matches_are_removed() {
        let tmp = tree(&["a.hg", "b.txt", ".hgignore", ".hg/store/data"], &[]);
        let removed =
            remove_excluded(tmp.path(), &[".hg".to_string(), ".hgignore".to_string()]).unwrap();

        assert_eq!(removed.len(), 2);
        assert_eq!(names(tmp.path()), vec!["a.hg", "b.txt"]);
    }

    #[test]
    fn test_directory_removed_wholesale() {
        let tmp = tree(&["ply/lex.py", "ply/yacc.py", "WebIDL.py"], &[]);
        remove_excluded(tmp.path(), &["ply".to_string()]).unwrap();
        assert_eq!(names(tmp.path()), vec!["WebIDL.py"]);
    }

    #[test]
    fn test_wildcard_skips_dotfiles() {
        let tmp = tree(&[".hgtags", "a.orig", "b.orig", "c.py"], &[]);
        let matches = expand(tmp.path(), "*").unwrap();
        let found: Vec<_> = matches
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(found, vec!["a.orig", "b.orig", "c.py"]);

        let dotted = expand(tmp.path(), ".hg*").unwrap();
        assert_eq!(dotted, vec![tmp.path().join(".hgtags")]);
    }

    #[test]
    fn test_nested_pattern() {
        let tmp = tree(&["tests/a.orig", "tests/a.py", "b.orig"], &[]);
        remove_excluded(tmp.path(), &["tests/*.orig".to_string()]).unwrap();

        assert!(tmp.path().join("b.orig").exists());
        assert!(tmp.path().join("tests/a.py").exists());
        assert!(!tmp.path().join("tests/a.orig").exists());
    }

    #[test]
    fn test_missing_matches_are_not_errors() {
        let tmp = tree(&["README"], &[]);
        let removed = remove_excluded(tmp.path(), &[".hgtags".to_string(), "*.rej".to_string()]).unwrap();
        assert!(removed.is_empty());
        assert_eq!(names(tmp.path()), vec!["README"]);
    }

    #[test]
    fn test_missing_root_expands_to_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let gone = tmp.path().join("absent");
        assert!(expand(&gone, "*").unwrap().is_empty());
        assert!(expand(&gone, ".hg").unwrap().is_empty());
    }

    #[test]
    fn test_braces_are_literal() {
        let tmp = tree(&["{x}", "x"], &[]);
        let removed = remove_excluded(tmp.path(), &["{x}".to_string()]).unwrap();
        assert_eq!(removed, vec![tmp.path().join("{x}")]);
        assert_eq!(names(tmp.path()), vec!["x"]);
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let tmp = tree(&["README"], &[]);
        let err = expand(tmp.path(), "[").unwrap_err();
        assert!(matches!(err, SyncError::InvalidExclusion { .. }));
    }
}
