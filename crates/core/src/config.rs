//! TOML-based configuration for vendorsync.
//!
//! Every field is optional in the file. Values are layered as: command-line
//! flag, then environment variable (`HG`, `CVS`), then the config file,
//! then the built-in defaults. Flags are applied by the CLI; this module
//! handles the last three layers.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dependencies::{Dependency, LIBFFI_CVSROOT, NSPR_REPO, NSS_REPO, WEBIDL_PARSER_REPO};
use crate::errors::ConfigError;

/// File name looked up in the project root when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "vendorsync.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorConfig {
    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Locations of the external version-control binaries.
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Upstream locations of each vendored dependency.
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            tools: ToolsConfig::default(),
            upstream: UpstreamConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tools
// ---------------------------------------------------------------------------

/// External binaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Mercurial binary (default `hg`).
    #[serde(default = "default_hg")]
    pub hg: String,

    /// CVS binary (default `cvs`).
    #[serde(default = "default_cvs")]
    pub cvs: String,
}

fn default_hg() -> String {
    "hg".into()
}
fn default_cvs() -> String {
    "cvs".into()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            hg: default_hg(),
            cvs: default_cvs(),
        }
    }
}

// ---------------------------------------------------------------------------
// Upstreams
// ---------------------------------------------------------------------------

/// Upstream repository locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_nspr")]
    pub nspr: String,

    #[serde(default = "default_nss")]
    pub nss: String,

    #[serde(default = "default_webidlparser")]
    pub webidlparser: String,

    /// CVSROOT the libffi module is exported from.
    #[serde(default = "default_libffi_cvsroot")]
    pub libffi_cvsroot: String,
}

fn default_nspr() -> String {
    NSPR_REPO.into()
}
fn default_nss() -> String {
    NSS_REPO.into()
}
fn default_webidlparser() -> String {
    WEBIDL_PARSER_REPO.into()
}
fn default_libffi_cvsroot() -> String {
    LIBFFI_CVSROOT.into()
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            nspr: default_nspr(),
            nss: default_nss(),
            webidlparser: default_webidlparser(),
            libffi_cvsroot: default_libffi_cvsroot(),
        }
    }
}

impl UpstreamConfig {
    /// Configured upstream for `dep`.
    pub fn for_dependency(&self, dep: Dependency) -> &str {
        match dep {
            Dependency::Nspr => &self.nspr,
            Dependency::Nss => &self.nss,
            Dependency::Libffi => &self.libffi_cvsroot,
            Dependency::WebIdlParser => &self.webidlparser,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl VendorConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from TOML text.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: VendorConfig =
            toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    ///
    /// Used for the implicit `vendorsync.toml` in the project root, which is
    /// optional.
    pub fn load_optional<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load_from_file(path)
        } else {
            debug!(path = %path.display(), "no configuration file, using defaults");
            Ok(Self::default())
        }
    }

    /// Override tool locations from the `HG` and `CVS` environment variables.
    pub fn resolve_env_vars(&mut self) {
        self.apply_env(|var| std::env::var(var).ok());
    }

    /// Same as [`resolve_env_vars`](Self::resolve_env_vars) with a custom
    /// variable lookup.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(hg) = lookup("HG").filter(|v| !v.is_empty()) {
            debug!(hg = hg.as_str(), "hg binary taken from environment");
            self.tools.hg = hg;
        }
        if let Some(cvs) = lookup("CVS").filter(|v| !v.is_empty()) {
            debug!(cvs = cvs.as_str(), "cvs binary taken from environment");
            self.tools.cvs = cvs;
        }
    }

    /// Check that all values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_empty = [
            ("tools.hg", &self.tools.hg),
            ("tools.cvs", &self.tools.cvs),
            ("upstream.nspr", &self.upstream.nspr),
            ("upstream.nss", &self.upstream.nss),
            ("upstream.webidlparser", &self.upstream.webidlparser),
            ("upstream.libffi_cvsroot", &self.upstream.libffi_cvsroot),
        ];
        for (field, value) in non_empty {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: field.into(),
                    detail: "must not be empty".into(),
                });
            }
        }

        validate_log_level("log_level", &self.log_level)
    }

    /// Default TOML config template.
    pub fn default_template() -> &'static str {
        r#"# vendorsync configuration
# Every value is optional; the defaults are shown.

log_level = "info"

[tools]
# Overridden by the HG / CVS environment variables and --hg / --cvs.
hg = "hg"
cvs = "cvs"

[upstream]
nspr = "https://hg.mozilla.org/projects/nspr"
nss = "https://hg.mozilla.org/projects/nss"
webidlparser = "https://hg.mozilla.org/users/khuey_mozilla.com/webidl-parser"
libffi_cvsroot = ":pserver:anoncvs@sources.redhat.com:/cvs/libffi"
"#
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Check that `level` names a tracing level; `field` names its origin.
pub fn validate_log_level(field: &str, level: &str) -> Result<(), ConfigError> {
    if !LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
        return Err(ConfigError::InvalidValue {
            field: field.into(),
            detail: format!("must be one of {}", LOG_LEVELS.join(", ")),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = VendorConfig::parse("").unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.tools.hg, "hg");
        assert_eq!(config.tools.cvs, "cvs");
        assert_eq!(config.upstream.for_dependency(Dependency::Nss), NSS_REPO);
        assert_eq!(config.upstream.for_dependency(Dependency::Libffi), LIBFFI_CVSROOT);
    }

    #[test]
    fn test_partial_override() {
        let config = VendorConfig::parse(
            r#"
[tools]
hg = "/usr/local/bin/hg"

[upstream]
nspr = "https://hg.example.org/nspr"
"#,
        )
        .unwrap();
        assert_eq!(config.tools.hg, "/usr/local/bin/hg");
        assert_eq!(config.tools.cvs, "cvs");
        assert_eq!(config.upstream.nspr, "https://hg.example.org/nspr");
        assert_eq!(config.upstream.nss, NSS_REPO);
    }

    #[test]
    fn test_default_template_round_trips() {
        let config = VendorConfig::parse(VendorConfig::default_template()).unwrap();
        config.validate().unwrap();
        assert_eq!(config.upstream.webidlparser, WEBIDL_PARSER_REPO);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = VendorConfig::parse("[tools]\nhg = \"file-hg\"\n").unwrap();
        config.apply_env(|var| match var {
            "HG" => Some("/opt/hg".into()),
            "CVS" => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.tools.hg, "/opt/hg");
        // Empty variables are ignored.
        assert_eq!(config.tools.cvs, "cvs");
    }

    #[test]
    fn test_validate_rejects_empty_values() {
        let mut config = VendorConfig::default();
        config.upstream.nss = "  ".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("upstream.nss"));

        let mut config = VendorConfig::default();
        config.log_level = "loud".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_level_check() {
        assert!(validate_log_level("--log-level", "DEBUG").is_ok());
        let err = validate_log_level("--log-level", "loud").unwrap_err();
        assert!(err.to_string().contains("--log-level"));
    }

    #[test]
    fn test_parse_error() {
        let err = VendorConfig::parse("[tools\nhg = 1").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_optional_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = VendorConfig::load_optional(dir.path().join(DEFAULT_CONFIG_FILE)).unwrap();
        assert_eq!(config.tools.hg, "hg");

        let err = VendorConfig::load_from_file(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }
}
