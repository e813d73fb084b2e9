//! Individual pre-flight checks and the ordered pipeline that holds them

use crate::config::PreflightConfig;
use crate::probe::RepositoryProbe;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The reason a pre-flight run stopped
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckFailure {
    #[error("Required file {} is missing", .path.display())]
    MissingArtifact { path: PathBuf },

    #[error("Secrets file {} not found", .path.display())]
    MissingSecrets { path: PathBuf, template: PathBuf },

    #[error("Working tree has uncommitted changes ({summary})")]
    DirtyWorkingTree { summary: String },

    #[error(
        "Deploys must run from branch '{expected}', but HEAD is on {}",
        describe_head(.actual)
    )]
    WrongBranch {
        expected: String,
        actual: Option<String>,
    },

    #[error("Could not query the repository: {reason}")]
    RepositoryUnavailable { reason: String },
}

impl CheckFailure {
    /// Stable name of the failure kind
    pub fn kind(&self) -> &'static str {
        match self {
            CheckFailure::MissingArtifact { .. } => "MissingArtifact",
            CheckFailure::MissingSecrets { .. } => "MissingSecrets",
            CheckFailure::DirtyWorkingTree { .. } => "DirtyWorkingTree",
            CheckFailure::WrongBranch { .. } => "WrongBranch",
            CheckFailure::RepositoryUnavailable { .. } => "RepositoryUnavailable",
        }
    }

    /// What the operator should do before re-running
    pub fn remediation(&self) -> String {
        match self {
            CheckFailure::MissingArtifact { path } => {
                format!("Add {} to the repository before deploying.", path.display())
            }
            CheckFailure::MissingSecrets { path, template } => format!(
                "Create it from the template and fill in your keys: cp {} {}",
                template.display(),
                path.display()
            ),
            CheckFailure::DirtyWorkingTree { .. } => {
                "Commit or stash your changes, then run the checks again.".to_string()
            }
            CheckFailure::WrongBranch { expected, .. } => {
                format!("Switch branches with: git checkout {}", expected)
            }
            CheckFailure::RepositoryUnavailable { .. } => {
                "Run from inside a git repository with git installed.".to_string()
            }
        }
    }
}

fn describe_head(branch: &Option<String>) -> String {
    match branch {
        Some(name) => format!("'{}'", name),
        None => "a detached commit".to_string(),
    }
}

/// Success message on pass, the failure otherwise
pub type CheckOutcome = Result<String, CheckFailure>;

/// What a check may look at
pub struct CheckContext<'a> {
    pub root: &'a Path,
    pub probe: &'a dyn RepositoryProbe,
}

impl<'a> CheckContext<'a> {
    pub fn new(root: &'a Path, probe: &'a dyn RepositoryProbe) -> Self {
        Self { root, probe }
    }
}

pub trait Check {
    fn name(&self) -> &str;
    fn run(&self, ctx: &CheckContext<'_>) -> CheckOutcome;
}

/// A required artifact must exist as a regular file
pub struct ArtifactCheck {
    name: String,
    path: PathBuf,
}

impl ArtifactCheck {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: format!("file:{}", path.display()),
            path,
        }
    }
}

impl Check for ArtifactCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, ctx: &CheckContext<'_>) -> CheckOutcome {
        if ctx.root.join(&self.path).is_file() {
            Ok(format!("{} found", self.path.display()))
        } else {
            Err(CheckFailure::MissingArtifact {
                path: self.path.clone(),
            })
        }
    }
}

pub struct SecretsCheck {
    path: PathBuf,
    template: PathBuf,
}

impl SecretsCheck {
    pub fn new(path: impl Into<PathBuf>, template: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            template: template.into(),
        }
    }
}

impl Check for SecretsCheck {
    fn name(&self) -> &str {
        "secrets"
    }

    fn run(&self, ctx: &CheckContext<'_>) -> CheckOutcome {
        if ctx.root.join(&self.path).is_file() {
            Ok(format!("{} found", self.path.display()))
        } else {
            Err(CheckFailure::MissingSecrets {
                path: self.path.clone(),
                template: self.template.clone(),
            })
        }
    }
}

pub struct CleanTreeCheck;

impl Check for CleanTreeCheck {
    fn name(&self) -> &str {
        "clean-tree"
    }

    fn run(&self, ctx: &CheckContext<'_>) -> CheckOutcome {
        let status = ctx
            .probe
            .working_tree_status()
            .map_err(|e| CheckFailure::RepositoryUnavailable {
                reason: e.to_string(),
            })?;

        if status.is_clean() {
            Ok("No uncommitted changes".to_string())
        } else {
            Err(CheckFailure::DirtyWorkingTree {
                summary: status.summary(),
            })
        }
    }
}

pub struct BranchCheck {
    expected: String,
}

impl BranchCheck {
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
        }
    }
}

impl Check for BranchCheck {
    fn name(&self) -> &str {
        "branch"
    }

    fn run(&self, ctx: &CheckContext<'_>) -> CheckOutcome {
        let branch = ctx
            .probe
            .current_branch()
            .map_err(|e| CheckFailure::RepositoryUnavailable {
                reason: e.to_string(),
            })?;

        match branch {
            Some(name) if name == self.expected => Ok(format!("On branch {}", name)),
            actual => Err(CheckFailure::WrongBranch {
                expected: self.expected.clone(),
                actual,
            }),
        }
    }
}

/// Checks in the order they must run
pub struct CheckPipeline {
    checks: Vec<Box<dyn Check>>,
}

impl CheckPipeline {
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// Required files in listed order, then secrets, clean tree and branch
    pub fn from_config(config: &PreflightConfig) -> Self {
        let mut pipeline = Self::new();
        for path in &config.required_files {
            pipeline.push(Box::new(ArtifactCheck::new(path)));
        }
        pipeline.push(Box::new(SecretsCheck::new(
            &config.secrets_file,
            &config.secrets_template,
        )));
        pipeline.push(Box::new(CleanTreeCheck));
        pipeline.push(Box::new(BranchCheck::new(&config.expected_branch)));
        pipeline
    }

    pub fn push(&mut self, check: Box<dyn Check>) {
        self.checks.push(check);
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Check> {
        self.checks.iter().map(|c| c.as_ref())
    }
}

impl Default for CheckPipeline {
    fn default() -> Self {
        Self::new()
    }
}
