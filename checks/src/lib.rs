//! Pre-flight validation for deploying a repository
//!
//! A run walks an ordered [`CheckPipeline`]: required files, the secrets file,
//! a clean working tree and the expected branch. It stops at the first
//! failure. Only a fully passing run should be followed by the printed
//! [`DeployInstructions`].
//!
//! ```no_run
//! use checks::prelude::*;
//! use std::path::Path;
//!
//! let config = PreflightConfig::for_profile(Profile::Fullstack);
//! let probe = Git2Probe::new(".");
//! let report = Validator::from_config(&config).run(&CheckContext::new(Path::new("."), &probe));
//! if report.is_success() {
//!     DeployInstructions::for_config(&config)
//!         .render(&mut std::io::stdout())
//!         .unwrap();
//! }
//! ```

pub mod check;
pub mod config;
pub mod instructions;
pub mod probe;
pub mod validator;

pub use check::{
    ArtifactCheck, BranchCheck, Check, CheckContext, CheckFailure, CheckOutcome, CheckPipeline,
    CleanTreeCheck, SecretsCheck,
};
pub use config::{ConfigError, ConfigFile, ConfigResult, PreflightConfig, Profile};
pub use instructions::{DeployInstructions, InstructionStep};
pub use probe::{
    Git2Probe, GitCliProbe, ProbeBackend, ProbeError, ProbeResult, RepositoryProbe,
    WorkingTreeStatus,
};
pub use validator::{FailedCheck, PassedCheck, ValidationReport, Validator};

pub mod prelude {
    pub use crate::check::*;
    pub use crate::config::*;
    pub use crate::instructions::*;
    pub use crate::probe::*;
    pub use crate::validator::*;
}
