//! Read-only queries against the repository's version control state
//!
//! Two backends answer the same questions: [`Git2Probe`] goes through libgit2,
//! [`GitCliProbe`] runs the `git` binary and parses its porcelain output.
//! Both open the repository lazily, on each query, so constructing a probe
//! never fails even when the directory is not a repository.

pub mod cli;
pub mod libgit;
pub mod status;

pub use cli::{parse_porcelain, GitCliProbe};
pub use libgit::Git2Probe;
pub use status::{ChangeKind, StatusEntry, WorkingTreeStatus};

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur while querying the repository
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Command `{command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("Invalid UTF-8 in git data: {0}")]
    InvalidUtf8(String),

    #[error("Unexpected git output: {0}")]
    UnexpectedOutput(String),
}

pub type ProbeResult<T> = Result<T, ProbeError>;

/// Source of working tree and branch facts for a repository
pub trait RepositoryProbe {
    /// Pending changes, untracked files included and ignored files excluded
    fn working_tree_status(&self) -> ProbeResult<WorkingTreeStatus>;

    /// The checked-out branch, or `None` when HEAD is detached
    fn current_branch(&self) -> ProbeResult<Option<String>>;

    fn backend_name(&self) -> &'static str;
}

/// Which probe implementation to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeBackend {
    #[default]
    Git2,
    Cli,
}

impl ProbeBackend {
    pub fn probe(&self, root: impl AsRef<Path>) -> Box<dyn RepositoryProbe> {
        match self {
            ProbeBackend::Git2 => Box::new(Git2Probe::new(root)),
            ProbeBackend::Cli => Box::new(GitCliProbe::new(root)),
        }
    }
}

impl fmt::Display for ProbeBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeBackend::Git2 => f.write_str("git2"),
            ProbeBackend::Cli => f.write_str("cli"),
        }
    }
}

impl FromStr for ProbeBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "git2" | "libgit2" => Ok(ProbeBackend::Git2),
            "cli" | "git" => Ok(ProbeBackend::Cli),
            other => Err(format!(
                "unknown git backend '{}', expected 'git2' or 'cli'",
                other
            )),
        }
    }
}
