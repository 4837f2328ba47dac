//! The fixed set of vendored third-party dependencies.
//!
//! Each [`Dependency`] knows where it lives in the source tree, where it is
//! fetched from by default, and which [`Strategy`] brings it up to date.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Version-control metadata stripped from every Mercurial snapshot.
pub const HG_EXCLUSIONS: &[&str] = &[".hg", ".hgignore", ".hgtags"];

/// Extra paths stripped from the web IDL parser snapshot.
const WEBIDL_PARSER_EXTRA_EXCLUSIONS: &[&str] = &[".gitignore", "ply"];

pub const NSPR_REPO: &str = "https://hg.mozilla.org/projects/nspr";
pub const NSS_REPO: &str = "https://hg.mozilla.org/projects/nss";
pub const WEBIDL_PARSER_REPO: &str = "https://hg.mozilla.org/users/khuey_mozilla.com/webidl-parser";
pub const LIBFFI_CVSROOT: &str = ":pserver:anoncvs@sources.redhat.com:/cvs/libffi";

/// [`HG_EXCLUSIONS`] as owned patterns.
pub fn hg_exclusions() -> Vec<String> {
    HG_EXCLUSIONS.iter().map(|s| s.to_string()).collect()
}

/// A local directory populated by `cvs export` of an upstream module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CvsModule {
    /// Destination, relative to the project root.
    pub local_path: PathBuf,
    /// Name of the module on the CVS server.
    pub upstream_module: String,
}

impl CvsModule {
    pub fn new(local_path: impl Into<PathBuf>, upstream_module: impl Into<String>) -> Self {
        Self {
            local_path: local_path.into(),
            upstream_module: upstream_module.into(),
        }
    }
}

/// How a dependency is brought up to date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Full replace with [`HG_EXCLUSIONS`], preserving the trailing blank
    /// line convention of `tracked_file`.
    BlankLineFixup { tracked_file: PathBuf },
    /// Full replace with the given exclusions.
    HgReplace { exclusions: Vec<String> },
    /// `cvs export` of each module.
    CvsExport { modules: Vec<CvsModule> },
}

/// A vendored dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dependency {
    /// Platform runtime library.
    Nspr,
    /// Security library.
    Nss,
    /// FFI library.
    Libffi,
    /// Interface-definition-language parser.
    WebIdlParser,
}

impl Dependency {
    pub const ALL: [Dependency; 4] = [
        Dependency::Nspr,
        Dependency::Nss,
        Dependency::Libffi,
        Dependency::WebIdlParser,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Nspr => "nspr",
            Self::Nss => "nss",
            Self::Libffi => "libffi",
            Self::WebIdlParser => "webidlparser",
        }
    }

    /// Directory holding the vendored copy, relative to the project root.
    pub fn local_dir(&self) -> PathBuf {
        match self {
            Self::Nspr => PathBuf::from("nsprpub"),
            Self::Nss => PathBuf::from("security/nss"),
            Self::Libffi => PathBuf::from("js/ctypes/libffi"),
            Self::WebIdlParser => PathBuf::from("dom/bindings/parser"),
        }
    }

    /// Built-in upstream location: a repository URL, or a CVSROOT for
    /// CVS-exported dependencies.
    pub fn default_upstream(&self) -> &'static str {
        match self {
            Self::Nspr => NSPR_REPO,
            Self::Nss => NSS_REPO,
            Self::Libffi => LIBFFI_CVSROOT,
            Self::WebIdlParser => WEBIDL_PARSER_REPO,
        }
    }

    pub fn strategy(&self) -> Strategy {
        match self {
            Self::Nspr => Strategy::BlankLineFixup {
                tracked_file: PathBuf::from("nsprpub/config/prdepend.h"),
            },
            Self::Nss => Strategy::BlankLineFixup {
                tracked_file: PathBuf::from("security/nss/coreconf/coreconf.dep"),
            },
            Self::Libffi => Strategy::CvsExport {
                modules: vec![CvsModule::new("js/ctypes/libffi", "libffi")],
            },
            Self::WebIdlParser => {
                let mut exclusions = hg_exclusions();
                exclusions.extend(WEBIDL_PARSER_EXTRA_EXCLUSIONS.iter().map(|s| s.to_string()));
                Strategy::HgReplace { exclusions }
            }
        }
    }

    /// Whether the upstream is a CVS server rather than a Mercurial repo.
    pub fn uses_cvs(&self) -> bool {
        matches!(self.strategy(), Strategy::CvsExport { .. })
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dependency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown dependency '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_line_files_live_inside_their_dependency() {
        for dep in Dependency::ALL {
            if let Strategy::BlankLineFixup { tracked_file } = dep.strategy() {
                assert!(
                    tracked_file.starts_with(dep.local_dir()),
                    "{} tracks {}",
                    dep,
                    tracked_file.display()
                );
            }
        }
    }

    #[test]
    fn test_webidl_parser_exclusions() {
        let Strategy::HgReplace { exclusions } = Dependency::WebIdlParser.strategy() else {
            panic!("webidlparser must be an hg replace");
        };
        assert_eq!(exclusions, vec![".hg", ".hgignore", ".hgtags", ".gitignore", "ply"]);
    }

    #[test]
    fn test_libffi_is_cvs() {
        assert!(Dependency::Libffi.uses_cvs());
        assert!(!Dependency::Nss.uses_cvs());
        let Strategy::CvsExport { modules } = Dependency::Libffi.strategy() else {
            panic!("libffi must be a cvs export");
        };
        assert_eq!(modules, vec![CvsModule::new("js/ctypes/libffi", "libffi")]);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("nss".parse::<Dependency>().unwrap(), Dependency::Nss);
        assert_eq!("WebIDLParser".parse::<Dependency>().unwrap(), Dependency::WebIdlParser);
        assert!("mozilla".parse::<Dependency>().is_err());
    }
}
