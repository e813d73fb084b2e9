//! Short-circuit evaluation of a check pipeline

use crate::check::{CheckContext, CheckFailure, CheckPipeline};
use crate::config::PreflightConfig;
use std::io::{self, Write};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassedCheck {
    pub name: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedCheck {
    pub name: String,
    pub failure: CheckFailure,
}

/// Result of one run: every check that passed, in order, and the first
/// failure if there was one. Checks after the failure are never recorded
/// because they never ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub passed: Vec<PassedCheck>,
    pub failure: Option<FailedCheck>,
}

impl ValidationReport {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn failure(&self) -> Option<&CheckFailure> {
        self.failure.as_ref().map(|f| &f.failure)
    }

    /// Write one line per passed check and, on failure, the failing check
    /// with its remediation
    pub fn render(&self, out: &mut impl Write) -> io::Result<()> {
        for check in &self.passed {
            writeln!(out, "✓ {}", check.message)?;
        }

        if let Some(failed) = &self.failure {
            writeln!(out, "✗ {}", failed.failure)?;
            writeln!(out, "  {}", failed.failure.remediation())?;
        }

        Ok(())
    }
}

pub struct Validator {
    pipeline: CheckPipeline,
}

impl Validator {
    pub fn new(pipeline: CheckPipeline) -> Self {
        Self { pipeline }
    }

    pub fn from_config(config: &PreflightConfig) -> Self {
        Self::new(CheckPipeline::from_config(config))
    }

    pub fn pipeline(&self) -> &CheckPipeline {
        &self.pipeline
    }

    pub fn run(&self, ctx: &CheckContext<'_>) -> ValidationReport {
        let mut report = ValidationReport::default();

        for check in self.pipeline.iter() {
            debug!(check = check.name(), "Running check");

            match check.run(ctx) {
                Ok(message) => {
                    debug!(check = check.name(), "Check passed");
                    report.passed.push(PassedCheck {
                        name: check.name().to_string(),
                        message,
                    });
                }
                Err(failure) => {
                    warn!(check = check.name(), kind = failure.kind(), "{}", failure);
                    report.failure = Some(FailedCheck {
                        name: check.name().to_string(),
                        failure,
                    });
                    break;
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::{Check, CheckOutcome};
    use crate::probe::{ProbeResult, RepositoryProbe, WorkingTreeStatus};
    use std::cell::Cell;
    use std::path::Path;
    use std::rc::Rc;

    struct NoRepo;

    impl RepositoryProbe for NoRepo {
        fn working_tree_status(&self) -> ProbeResult<WorkingTreeStatus> {
            Ok(WorkingTreeStatus::new())
        }

        fn current_branch(&self) -> ProbeResult<Option<String>> {
            Ok(None)
        }

        fn backend_name(&self) -> &'static str {
            "none"
        }
    }

    /// Passes or fails as told and counts how often it ran
    struct Scripted {
        name: &'static str,
        fail: bool,
        runs: Rc<Cell<usize>>,
    }

    impl Check for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        fn run(&self, _ctx: &CheckContext<'_>) -> CheckOutcome {
            self.runs.set(self.runs.get() + 1);
            if self.fail {
                Err(CheckFailure::MissingArtifact {
                    path: self.name.into(),
                })
            } else {
                Ok(format!("{} ok", self.name))
            }
        }
    }

    #[test]
    fn test_stops_at_first_failure() {
        let counters: Vec<Rc<Cell<usize>>> = (0..3).map(|_| Rc::new(Cell::new(0))).collect();
        let mut pipeline = CheckPipeline::new();
        for (i, (name, fail)) in [("a", false), ("b", true), ("c", false)]
            .into_iter()
            .enumerate()
        {
            pipeline.push(Box::new(Scripted {
                name,
                fail,
                runs: counters[i].clone(),
            }));
        }

        let probe = NoRepo;
        let report = Validator::new(pipeline).run(&CheckContext::new(Path::new("."), &probe));

        assert!(!report.is_success());
        assert_eq!(report.passed.len(), 1);
        assert_eq!(report.failure.as_ref().unwrap().name, "b");
        assert_eq!(counters[0].get(), 1);
        assert_eq!(counters[1].get(), 1);
        assert_eq!(counters[2].get(), 0);
    }

    #[test]
    fn test_empty_pipeline_succeeds() {
        let probe = NoRepo;
        let report =
            Validator::new(CheckPipeline::new()).run(&CheckContext::new(Path::new("."), &probe));
        assert!(report.is_success());
        assert!(report.passed.is_empty());
    }

    #[test]
    fn test_render_failure() {
        let report = ValidationReport {
            passed: vec![PassedCheck {
                name: "file:app.py".to_string(),
                message: "app.py found".to_string(),
            }],
            failure: Some(FailedCheck {
                name: "branch".to_string(),
                failure: CheckFailure::WrongBranch {
                    expected: "main".to_string(),
                    actual: Some("feature".to_string()),
                },
            }),
        };

        let mut out = Vec::new();
        report.render(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(
            text,
            "✓ app.py found\n\
             ✗ Deploys must run from branch 'main', but HEAD is on 'feature'\n  \
             Switch branches with: git checkout main\n"
        );
    }
}
