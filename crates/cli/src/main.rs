//! vendorsync command-line tool.
//!
//! Updates the vendored copies of third-party subsystems in the source tree
//! to a pinned upstream revision, and reports on what is currently vendored.

mod doctor;
mod status;
mod style;
mod update;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use vendorsync_core::config::{validate_log_level, DEFAULT_CONFIG_FILE};
use vendorsync_core::errors::VcsError;
use vendorsync_core::vcs::{CvsClient, HgClient};
use vendorsync_core::{Dependency, RepositorySyncer, VendorConfig};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Sync vendored third-party code with its upstream repositories.
#[derive(Parser, Debug)]
#[command(name = "vendorsync", version, arg_required_else_help = true)]
struct Cli {
    /// Root of the source tree that vendored directories are relative to.
    #[arg(long, global = true, default_value = ".")]
    topsrcdir: PathBuf,

    /// Path to the TOML configuration file (default: <topsrcdir>/vendorsync.toml).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// The location of the hg binary (overrides $HG).
    #[arg(long, global = true)]
    hg: Option<String>,

    /// The location of the cvs binary (overrides $CVS).
    #[arg(long, global = true)]
    cvs: Option<String>,

    /// The CVSROOT for libffi.
    #[arg(long, global = true)]
    cvsroot: Option<String>,

    /// The repo to update from (default: upstream repo).
    #[arg(long, global = true)]
    repo: Option<String>,

    /// Log level: trace, debug, info, warn, error. RUST_LOG takes precedence.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Obsolete, ignored.
    #[arg(long, global = true, hide = true)]
    skip_mozilla: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Update nsprpub to an NSPR release tag.
    #[command(name = "update_nspr")]
    UpdateNspr { tag: String },

    /// Update security/nss to an NSS release tag.
    #[command(name = "update_nss")]
    UpdateNss { tag: String },

    /// Update js/ctypes/libffi via cvs export.
    #[command(name = "update_libffi")]
    UpdateLibffi { tag: String },

    /// Update dom/bindings/parser to a web IDL parser revision.
    #[command(name = "update_webidlparser")]
    UpdateWebidlparser { tag: String },

    /// Clone a directory from --repo, or pull and update it if it exists.
    Pull {
        /// Directory relative to the source root.
        dir: PathBuf,
    },

    /// Obsolete; does nothing.
    #[command(alias = "co")]
    Checkout,

    /// Show each vendored dependency and its recorded tag.
    Status,

    /// Check the configuration and the external tools.
    Doctor,

    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        output: PathBuf,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_code_for(&e)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    check_log_level_flag(&cli)?;

    if let Commands::Init { output } = &cli.command {
        init_logging(cli.log_level.as_deref().unwrap_or("info"));
        return cmd_init(output);
    }

    let config = load_config(&cli)?;
    init_logging(cli.log_level.as_deref().unwrap_or(&config.log_level));

    if cli.skip_mozilla {
        warn!("--skip-mozilla is obsolete and has no effect");
    }

    let syncer = RepositorySyncer::new(
        &cli.topsrcdir,
        HgClient::new(cli.hg.clone().unwrap_or_else(|| config.tools.hg.clone())),
        CvsClient::new(cli.cvs.clone().unwrap_or_else(|| config.tools.cvs.clone())),
    );

    match cli.command {
        Commands::UpdateNspr { ref tag } => update_dep(&syncer, &cli, &config, Dependency::Nspr, tag).await,
        Commands::UpdateNss { ref tag } => update_dep(&syncer, &cli, &config, Dependency::Nss, tag).await,
        Commands::UpdateLibffi { ref tag } => update_dep(&syncer, &cli, &config, Dependency::Libffi, tag).await,
        Commands::UpdateWebidlparser { ref tag } => {
            update_dep(&syncer, &cli, &config, Dependency::WebIdlParser, tag).await
        }
        Commands::Pull { ref dir } => update::run_pull(&syncer, dir, cli.repo.as_deref()).await,
        Commands::Checkout => {
            warn!("checkout is obsolete; nothing to do");
            Ok(())
        }
        Commands::Status => status::run_status(&syncer, &config),
        Commands::Doctor => doctor::run_doctor(&syncer, &config).await,
        Commands::Init { ref output } => cmd_init(output),
    }
}

async fn update_dep(
    syncer: &RepositorySyncer,
    cli: &Cli,
    config: &VendorConfig,
    dep: Dependency,
    tag: &str,
) -> Result<()> {
    let upstream = upstream_for(cli, config, dep);
    update::run_update(syncer, dep, tag, &upstream).await
}

/// `--cvsroot` for CVS dependencies, `--repo` for the others, then config.
fn upstream_for(cli: &Cli, config: &VendorConfig, dep: Dependency) -> String {
    let flag = if dep.uses_cvs() { &cli.cvsroot } else { &cli.repo };
    flag.clone()
        .unwrap_or_else(|| config.upstream.for_dependency(dep).to_string())
}

/// Exit with the failing external command's status when there is one.
fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    failed_command_status(err)
        .map(ExitCode::from)
        .unwrap_or(ExitCode::FAILURE)
}

fn failed_command_status(err: &anyhow::Error) -> Option<u8> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<VcsError>())
        .and_then(VcsError::exit_code)
        .and_then(|code| u8::try_from(code).ok())
}

fn check_log_level_flag(cli: &Cli) -> Result<()> {
    if let Some(level) = &cli.log_level {
        validate_log_level("--log-level", level)?;
    }
    Ok(())
}

fn init_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

fn load_config(cli: &Cli) -> Result<VendorConfig> {
    let mut config = match &cli.config {
        Some(path) => VendorConfig::load_from_file(path).context("failed to load configuration file")?,
        None => VendorConfig::load_optional(cli.topsrcdir.join(DEFAULT_CONFIG_FILE))
            .context("failed to load configuration file")?,
    };
    config.resolve_env_vars();
    // doctor reports validation problems itself
    if !matches!(cli.command, Commands::Doctor) {
        config.validate().context("invalid configuration")?;
    }
    Ok(config)
}

fn cmd_init(output: &Path) -> Result<()> {
    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }
    std::fs::write(output, VendorConfig::default_template())
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("{}", style::success(&format!("Wrote {}", output.display())));
    Ok(())
}
