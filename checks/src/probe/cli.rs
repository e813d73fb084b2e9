//! Probe backed by the `git` executable
//!
//! Runs the same two queries a shell pre-flight script would:
//! `git status --porcelain` (in its NUL-separated `-z` form) and
//! `git branch --show-current`.

use super::status::{ChangeKind, StatusEntry, WorkingTreeStatus};
use super::{ProbeError, ProbeResult, RepositoryProbe};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

pub struct GitCliProbe {
    root: PathBuf,
}

impl GitCliProbe {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn git(&self, args: &[&str]) -> ProbeResult<String> {
        debug!("Running git {} in {}", args.join(" "), self.root.display());

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()?;

        if !output.status.success() {
            return Err(ProbeError::CommandFailed {
                command: format!("git {}", args.join(" ")),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout)
            .map_err(|_| ProbeError::InvalidUtf8(format!("output of git {}", args.join(" "))))
    }
}

impl RepositoryProbe for GitCliProbe {
    fn working_tree_status(&self) -> ProbeResult<WorkingTreeStatus> {
        let output = self.git(&["status", "--porcelain", "-z", "--untracked-files=normal"])?;
        parse_porcelain(&output)
    }

    fn current_branch(&self) -> ProbeResult<Option<String>> {
        let output = self.git(&["branch", "--show-current"])?;
        let branch = output.trim();
        if branch.is_empty() {
            Ok(None)
        } else {
            Ok(Some(branch.to_string()))
        }
    }

    fn backend_name(&self) -> &'static str {
        "cli"
    }
}

/// Parse `git status --porcelain -z` output
///
/// Records are NUL-terminated `XY PATH`. Renames and copies carry the
/// original path as an extra record right after the new one. Paths are
/// never quoted in this form. Ignored entries (`!!`) are skipped.
pub fn parse_porcelain(output: &str) -> ProbeResult<WorkingTreeStatus> {
    let mut status = WorkingTreeStatus::new();
    let mut records = output.split('\0').filter(|r| !r.is_empty());

    while let Some(record) = records.next() {
        let bytes = record.as_bytes();
        if bytes.len() < 4 || bytes[2] != b' ' {
            return Err(ProbeError::UnexpectedOutput(record.to_string()));
        }

        let (x, y) = (bytes[0] as char, bytes[1] as char);
        if is_rename_or_copy(x, y) && records.next().is_none() {
            return Err(ProbeError::UnexpectedOutput(format!(
                "{} (missing original path)",
                record
            )));
        }
        if x == '!' && y == '!' {
            continue;
        }

        let index = ChangeKind::from_porcelain(x)
            .ok_or_else(|| ProbeError::UnexpectedOutput(record.to_string()))?;
        let worktree = ChangeKind::from_porcelain(y)
            .ok_or_else(|| ProbeError::UnexpectedOutput(record.to_string()))?;

        // Unmerged pairs like AA/DD/AU are conflicts regardless of the letters
        let (index, worktree) = if is_unmerged(x, y) {
            (ChangeKind::Conflicted, ChangeKind::Conflicted)
        } else {
            (index, worktree)
        };

        status.add(StatusEntry::new(&record[3..], index, worktree));
    }

    Ok(status)
}

fn is_rename_or_copy(x: char, y: char) -> bool {
    matches!(x, 'R' | 'C') || matches!(y, 'R' | 'C')
}

fn is_unmerged(x: char, y: char) -> bool {
    x == 'U' || y == 'U' || (x == 'A' && y == 'A') || (x == 'D' && y == 'D')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_output_is_clean() {
        let status = parse_porcelain("").unwrap();
        assert!(status.is_clean());
    }

    #[test]
    fn test_parse_mixed_output() {
        let output = "M  app.py\0 M requirements.txt\0A  static/app.js\0?? notes.md\0";
        let status = parse_porcelain(output).unwrap();

        assert_eq!(status.entries().len(), 4);
        assert_eq!(status.staged().count(), 2);
        assert_eq!(status.unstaged().count(), 1);
        assert_eq!(status.untracked().count(), 1);
        assert_eq!(status.entries()[3].path, "notes.md");
    }

    #[test]
    fn test_parse_rename_uses_new_path() {
        let status = parse_porcelain("R  app.py\0old_app.py\0?? notes.md\0").unwrap();
        assert_eq!(status.entries().len(), 2);

        let entry = &status.entries()[0];
        assert_eq!(entry.path, "app.py");
        assert_eq!(entry.index, ChangeKind::Renamed);
        assert_eq!(entry.worktree, ChangeKind::Unmodified);
        assert_eq!(status.entries()[1].path, "notes.md");
    }

    #[test]
    fn test_parse_keeps_paths_verbatim() {
        let output = "?? h\u{e9}llo -> there.txt\0?? say \"hi\".txt\0 M with space.txt\0";
        let status = parse_porcelain(output).unwrap();
        let paths: Vec<&str> = status.entries().iter().map(|e| e.path.as_str()).collect();

        assert_eq!(
            paths,
            vec!["h\u{e9}llo -> there.txt", "say \"hi\".txt", "with space.txt"]
        );
        assert_eq!(status.untracked().count(), 2);
    }

    #[test]
    fn test_parse_conflicts() {
        let status = parse_porcelain("UU app.py\0AA both_added.py\0").unwrap();
        assert_eq!(status.conflicted().count(), 2);
        assert_eq!(status.summary(), "2 conflicted");
    }

    #[test]
    fn test_parse_skips_ignored_entries() {
        let status = parse_porcelain("!! target/\0").unwrap();
        assert!(status.is_clean());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_porcelain("not porcelain"),
            Err(ProbeError::UnexpectedOutput(_))
        ));
        assert!(parse_porcelain("XY\0").is_err());
        // Rename without its original path
        assert!(parse_porcelain("R  app.py\0").is_err());
    }

    #[test]
    fn test_outside_repository_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let probe = GitCliProbe::new(dir.path());
        // Either git is missing (Io) or it refuses to run outside a repository
        assert!(probe.working_tree_status().is_err());
    }
}
