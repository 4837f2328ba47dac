//! Trailing blank-line handling for dependency-tracking files.
//!
//! Upstream snapshot tooling for some projects flips whether a dependency
//! file (e.g. `coreconf.dep`) ends with a blank line from one release to the
//! next. To keep diffs quiet, the syncer records the state before a sync and
//! forces a flip when the sync left it unchanged. See [`apply_fixup`].
//!
//! A "line" is a run of bytes terminated by `\n` (or the unterminated tail
//! of the file). The last line is blank when it is whitespace-only.

use std::fmt;
use std::path::Path;

use tracing::{info, warn};

use crate::errors::SyncError;

/// Whether a file's last line is blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlankLineState {
    HasBlankLine,
    NoBlankLine,
}

impl BlankLineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HasBlankLine => "has blank line",
            Self::NoBlankLine => "no blank line",
        }
    }
}

impl fmt::Display for BlankLineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of `contents`, or `None` when there are no lines at all.
pub fn state_of(contents: &[u8]) -> Option<BlankLineState> {
    let last = contents.split_inclusive(|b| *b == b'\n').last()?;
    if last.iter().all(u8::is_ascii_whitespace) {
        Some(BlankLineState::HasBlankLine)
    } else {
        Some(BlankLineState::NoBlankLine)
    }
}

/// `contents` with its trailing blank line removed, or with a `\n` appended
/// when the last line is not blank. `None` for empty input.
///
/// Applying this twice gives back the original bytes whenever the final
/// line of the input is newline-terminated.
pub fn toggled(contents: &[u8]) -> Option<Vec<u8>> {
    let last = contents.split_inclusive(|b| *b == b'\n').last()?;
    let mut out = contents.to_vec();
    if last.iter().all(u8::is_ascii_whitespace) {
        out.truncate(contents.len() - last.len());
    } else {
        out.push(b'\n');
    }
    Some(out)
}

/// Read the blank-line state of `path`.
///
/// An empty file has no lines, so it logs a warning and reports
/// [`BlankLineState::NoBlankLine`].
pub fn detect(path: &Path) -> Result<BlankLineState, SyncError> {
    let contents = std::fs::read(path).map_err(|e| SyncError::fs(path, e))?;
    Ok(state_of(&contents).unwrap_or_else(|| {
        warn!(path = %path.display(), "unexpected short file");
        BlankLineState::NoBlankLine
    }))
}

/// Flip the trailing blank line of `path` in place.
///
/// Returns `false` (after logging a warning) when the file is empty and
/// nothing could be toggled.
pub fn toggle(path: &Path) -> Result<bool, SyncError> {
    let contents = std::fs::read(path).map_err(|e| SyncError::fs(path, e))?;
    match toggled(&contents) {
        Some(updated) => {
            std::fs::write(path, updated).map_err(|e| SyncError::fs(path, e))?;
            Ok(true)
        }
        None => {
            warn!(path = %path.display(), "unexpected short file");
            Ok(false)
        }
    }
}

/// Outcome of [`apply_fixup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixupOutcome {
    pub old_state: BlankLineState,
    pub new_state: BlankLineState,
    pub toggled: bool,
}

/// Compare the post-sync state of `path` with `old_state` and toggle the
/// trailing blank line only when the two are equal.
pub fn apply_fixup(path: &Path, old_state: BlankLineState) -> Result<FixupOutcome, SyncError> {
    let new_state = detect(path)?;
    info!(path = %path.display(), state = %new_state, "new blank line state");

    let toggled = if old_state == new_state {
        info!(path = %path.display(), "toggling blank line");
        toggle(path)?
    } else {
        false
    };

    Ok(FixupOutcome {
        old_state,
        new_state,
        toggled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &tempfile::TempDir, contents: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join("coreconf.dep");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_state_of() {
        assert_eq!(state_of(b""), None);
        assert_eq!(state_of(b"#error x\n"), Some(BlankLineState::NoBlankLine));
        assert_eq!(state_of(b"#error x\n\n"), Some(BlankLineState::HasBlankLine));
        assert_eq!(state_of(b"#error x\n  \t\n"), Some(BlankLineState::HasBlankLine));
        assert_eq!(state_of(b"#error x"), Some(BlankLineState::NoBlankLine));
        assert_eq!(state_of(b"\n"), Some(BlankLineState::HasBlankLine));
    }

    #[test]
    fn test_toggle_is_an_involution() {
        let samples: [&[u8]; 4] = [
            b"#error x\n",
            b"#error x\n\n",
            b"a\nb\n\n",
            b"/* dep */\r\n",
        ];
        for sample in samples {
            let once = toggled(sample).unwrap();
            assert_ne!(once.as_slice(), sample);
            let twice = toggled(&once).unwrap();
            assert_eq!(twice.as_slice(), sample, "sample {:?}", String::from_utf8_lossy(sample));
        }
    }

    #[test]
    fn test_toggled_empty_is_none() {
        assert_eq!(toggled(b""), None);
    }

    #[test]
    fn test_detect_empty_file_is_no_blank_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, b"");
        assert_eq!(detect(&path).unwrap(), BlankLineState::NoBlankLine);
    }

    #[test]
    fn test_toggle_empty_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, b"");
        assert!(!toggle(&path).unwrap());
        assert_eq!(std::fs::read(&path).unwrap(), b"");
    }

    #[test]
    fn test_fixup_toggles_when_state_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, b"#error \"do not bump\"\n");

        let outcome = apply_fixup(&path, BlankLineState::NoBlankLine).unwrap();
        assert_eq!(outcome.new_state, BlankLineState::NoBlankLine);
        assert!(outcome.toggled);
        assert_eq!(std::fs::read(&path).unwrap(), b"#error \"do not bump\"\n\n");
    }

    #[test]
    fn test_fixup_leaves_file_when_state_changed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, b"#error \"do not bump\"\n");

        let outcome = apply_fixup(&path, BlankLineState::HasBlankLine).unwrap();
        assert!(!outcome.toggled);
        assert_eq!(std::fs::read(&path).unwrap(), b"#error \"do not bump\"\n");
    }

    #[test]
    fn test_fixup_on_empty_file_does_not_fail() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, b"");

        let outcome = apply_fixup(&path, BlankLineState::NoBlankLine).unwrap();
        assert_eq!(outcome.new_state, BlankLineState::NoBlankLine);
        assert!(!outcome.toggled);
    }

    #[test]
    fn test_display() {
        assert_eq!(BlankLineState::HasBlankLine.to_string(), "has blank line");
        assert_eq!(BlankLineState::NoBlankLine.to_string(), "no blank line");
    }
}
