//! The `TAG-INFO` marker recording which upstream revision is vendored.

use std::path::{Path, PathBuf};

use crate::errors::SyncError;

/// Name of the marker file inside a vendored directory.
pub const TAG_INFO_FILE: &str = "TAG-INFO";

/// Write `tag` into `dir/TAG-INFO`, replacing any previous marker.
pub fn write(dir: &Path, tag: &str) -> Result<PathBuf, SyncError> {
    let path = dir.join(TAG_INFO_FILE);
    std::fs::write(&path, format!("{}\n", tag)).map_err(|e| SyncError::fs(&path, e))?;
    Ok(path)
}

/// Read the vendored tag from `dir/TAG-INFO`. `None` when there is no marker.
pub fn read(dir: &Path) -> Result<Option<String>, SyncError> {
    let path = dir.join(TAG_INFO_FILE);
    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(Some(contents.trim().to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(SyncError::fs(&path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "NSS_3_15_RTM").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "NSS_3_15_RTM\n");
        assert_eq!(read(dir.path()).unwrap().as_deref(), Some("NSS_3_15_RTM"));

        write(dir.path(), "NSS_3_16_RTM").unwrap();
        assert_eq!(read(dir.path()).unwrap().as_deref(), Some("NSS_3_16_RTM"));
    }

    #[test]
    fn test_read_missing_marker() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read(dir.path()).unwrap(), None);
    }
}
