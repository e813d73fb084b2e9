//! Probe backed by libgit2 through git2-rs

use super::status::{ChangeKind, StatusEntry, WorkingTreeStatus};
use super::{ProbeError, ProbeResult, RepositoryProbe};
use git2::{ErrorCode, Repository, Status, StatusOptions};
use std::path::{Path, PathBuf};

pub struct Git2Probe {
    path: PathBuf,
}

impl Git2Probe {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    // Discover rather than open, so running from a subdirectory behaves like the git CLI
    fn repository(&self) -> ProbeResult<Repository> {
        Ok(Repository::discover(&self.path)?)
    }
}

impl RepositoryProbe for Git2Probe {
    fn working_tree_status(&self) -> ProbeResult<WorkingTreeStatus> {
        let repo = self.repository()?;

        let mut options = StatusOptions::new();
        options
            .include_untracked(true)
            .include_ignored(false)
            .renames_head_to_index(true);

        let statuses = repo.statuses(Some(&mut options))?;
        let mut wt = WorkingTreeStatus::new();

        for entry in statuses.iter() {
            let status = entry.status();
            if status.is_ignored() {
                continue;
            }

            // entry.path() is the pre-rename path; report where the file went
            let renamed_to = if status.is_index_renamed() {
                entry
                    .head_to_index()
                    .and_then(|delta| delta.new_file().path())
                    .map(|p| {
                        p.to_str()
                            .ok_or_else(|| ProbeError::InvalidUtf8("file path".to_string()))
                    })
                    .transpose()?
            } else {
                None
            };

            let path = match renamed_to {
                Some(path) => path,
                None => entry
                    .path()
                    .ok_or_else(|| ProbeError::InvalidUtf8("file path".to_string()))?,
            };

            wt.add(classify(path, status));
        }

        Ok(wt)
    }

    fn current_branch(&self) -> ProbeResult<Option<String>> {
        let repo = self.repository()?;

        let head = match repo.head() {
            Ok(head) => head,
            // Fresh repository: HEAD points at a branch with no commits yet
            Err(e) if e.code() == ErrorCode::UnbornBranch => {
                let head = repo.find_reference("HEAD")?;
                return Ok(head
                    .symbolic_target()
                    .and_then(|target| target.strip_prefix("refs/heads/"))
                    .map(str::to_string));
            }
            Err(e) => return Err(e.into()),
        };

        if !head.is_branch() {
            return Ok(None);
        }

        let name = head
            .shorthand()
            .ok_or_else(|| ProbeError::InvalidUtf8("branch name".to_string()))?;
        Ok(Some(name.to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "git2"
    }
}

fn classify(path: &str, status: Status) -> StatusEntry {
    if status.is_conflicted() {
        return StatusEntry::new(path, ChangeKind::Conflicted, ChangeKind::Conflicted);
    }
    if status.is_wt_new() && !status.is_index_new() {
        return StatusEntry::untracked(path);
    }

    let index = match status {
        s if s.is_index_new() => ChangeKind::Added,
        s if s.is_index_modified() => ChangeKind::Modified,
        s if s.is_index_deleted() => ChangeKind::Deleted,
        s if s.is_index_renamed() => ChangeKind::Renamed,
        s if s.is_index_typechange() => ChangeKind::TypeChange,
        _ => ChangeKind::Unmodified,
    };

    let worktree = match status {
        s if s.is_wt_modified() => ChangeKind::Modified,
        s if s.is_wt_deleted() => ChangeKind::Deleted,
        s if s.is_wt_renamed() => ChangeKind::Renamed,
        s if s.is_wt_typechange() => ChangeKind::TypeChange,
        _ => ChangeKind::Unmodified,
    };

    StatusEntry::new(path, index, worktree)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_untracked() {
        let entry = classify("notes.md", Status::WT_NEW);
        assert!(entry.is_untracked());
    }

    #[test]
    fn test_classify_staged_and_modified() {
        let entry = classify("app.py", Status::INDEX_MODIFIED | Status::WT_MODIFIED);
        assert_eq!(entry.index, ChangeKind::Modified);
        assert_eq!(entry.worktree, ChangeKind::Modified);
        assert!(entry.is_staged());
        assert!(entry.is_unstaged());
    }

    #[test]
    fn test_classify_conflict() {
        let entry = classify("app.py", Status::CONFLICTED);
        assert!(entry.is_conflicted());
    }

    #[test]
    fn test_invalid_repository_path() {
        let dir = tempfile::tempdir().unwrap();
        let probe = Git2Probe::new(dir.path().join("missing"));
        match probe.current_branch() {
            Err(ProbeError::Git(_)) => {}
            other => panic!("Expected ProbeError::Git, got {:?}", other),
        }
    }
}
