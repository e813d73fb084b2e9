use checks::prelude::*;
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

/// Exit status when a pre-flight check fails
pub const EXIT_CHECK_FAILED: u8 = 1;
/// Exit status for unusable configuration, matching clap's usage errors
pub const EXIT_CONFIG_ERROR: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "preflight")]
#[command(about = "Check that a repository is ready to deploy, then print the deployment steps")]
pub struct Args {
    /// Repository directory to check
    #[arg(short = 'C', long = "dir", default_value = ".")]
    pub dir: PathBuf,
    /// Config file (default: preflight.toml in the checked directory, when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Deployment profile: fullstack (main, Render + GitHub Pages) or backend (master, Render)
    #[arg(short, long)]
    pub profile: Option<Profile>,
    /// Branch deploys must run from, overriding the profile and config file
    #[arg(short, long)]
    pub branch: Option<String>,
    /// How git is queried: git2 (libgit2) or cli (the git executable)
    #[arg(long, default_value = "git2")]
    pub git_backend: ProbeBackend,
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to write output: {0}")]
    Output(#[from] io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Config(_) => EXIT_CONFIG_ERROR,
            CliError::Output(_) => EXIT_CHECK_FAILED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Passed,
    Failed(CheckFailure),
}

impl RunOutcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::Passed => 0,
            RunOutcome::Failed(_) => EXIT_CHECK_FAILED,
        }
    }
}

/// Profile defaults, then the config file, then command-line overrides
pub fn resolve_config(args: &Args) -> Result<PreflightConfig, ConfigError> {
    let file = match &args.config {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::discover(&args.dir)?.unwrap_or_default(),
    };

    let mut config = PreflightConfig::from_layers(file, args.profile);
    if let Some(branch) = &args.branch {
        config = config.with_expected_branch(branch);
    }

    config.validate()?;
    Ok(config)
}

pub fn execute(args: &Args, out: &mut impl Write) -> Result<RunOutcome, CliError> {
    let config = resolve_config(args)?;
    info!(
        profile = %config.profile,
        branch = %config.expected_branch,
        backend = %args.git_backend,
        "Checking {}",
        args.dir.display()
    );
    debug!(?config, "Resolved configuration");

    let probe = args.git_backend.probe(&args.dir);
    let ctx = CheckContext::new(&args.dir, probe.as_ref());
    let report = Validator::from_config(&config).run(&ctx);

    writeln!(
        out,
        "Deploy pre-flight checks ({} profile, branch {})",
        config.profile, config.expected_branch
    )?;
    report.render(out)?;

    if let Some(failure) = report.failure() {
        writeln!(out, "Pre-flight failed. Fix the problem above and run again.")?;
        return Ok(RunOutcome::Failed(failure.clone()));
    }

    writeln!(out, "All pre-flight checks passed.")?;
    writeln!(out)?;
    DeployInstructions::for_config(&config).render(out)?;

    Ok(RunOutcome::Passed)
}
