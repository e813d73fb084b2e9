//! Working tree status model shared by the probe backends

use std::fmt;

/// State of one side (index or worktree) of a status entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Unmodified,
    Added,
    Modified,
    Deleted,
    Renamed,
    Copied,
    TypeChange,
    Untracked,
    Conflicted,
}

impl ChangeKind {
    /// Map a porcelain v1 status column
    pub fn from_porcelain(code: char) -> Option<Self> {
        let kind = match code {
            ' ' => ChangeKind::Unmodified,
            'A' => ChangeKind::Added,
            'M' => ChangeKind::Modified,
            'D' => ChangeKind::Deleted,
            'R' => ChangeKind::Renamed,
            'C' => ChangeKind::Copied,
            'T' => ChangeKind::TypeChange,
            '?' => ChangeKind::Untracked,
            'U' => ChangeKind::Conflicted,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_change(&self) -> bool {
        !matches!(self, ChangeKind::Unmodified)
    }
}

/// A path with pending changes, split into index and worktree columns
/// the way `git status --porcelain` reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub path: String,
    pub index: ChangeKind,
    pub worktree: ChangeKind,
}

impl StatusEntry {
    pub fn new(path: impl Into<String>, index: ChangeKind, worktree: ChangeKind) -> Self {
        Self {
            path: path.into(),
            index,
            worktree,
        }
    }

    pub fn untracked(path: impl Into<String>) -> Self {
        Self::new(path, ChangeKind::Untracked, ChangeKind::Untracked)
    }

    pub fn is_untracked(&self) -> bool {
        self.index == ChangeKind::Untracked
    }

    pub fn is_conflicted(&self) -> bool {
        self.index == ChangeKind::Conflicted || self.worktree == ChangeKind::Conflicted
    }

    pub fn is_staged(&self) -> bool {
        !self.is_untracked() && !self.is_conflicted() && self.index.is_change()
    }

    pub fn is_unstaged(&self) -> bool {
        !self.is_untracked() && !self.is_conflicted() && self.worktree.is_change()
    }
}

/// Pending changes in a working tree. Ignored files are never recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingTreeStatus {
    entries: Vec<StatusEntry>,
}

impl WorkingTreeStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry; entries with no change on either side are dropped
    pub fn add(&mut self, entry: StatusEntry) {
        if entry.index.is_change() || entry.worktree.is_change() {
            self.entries.push(entry);
        }
    }

    pub fn entries(&self) -> &[StatusEntry] {
        &self.entries
    }

    pub fn is_clean(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn staged(&self) -> impl Iterator<Item = &StatusEntry> {
        self.entries.iter().filter(|e| e.is_staged())
    }

    pub fn unstaged(&self) -> impl Iterator<Item = &StatusEntry> {
        self.entries.iter().filter(|e| e.is_unstaged())
    }

    pub fn untracked(&self) -> impl Iterator<Item = &StatusEntry> {
        self.entries.iter().filter(|e| e.is_untracked())
    }

    pub fn conflicted(&self) -> impl Iterator<Item = &StatusEntry> {
        self.entries.iter().filter(|e| e.is_conflicted())
    }

    /// Human-readable counts, e.g. "2 staged, 1 modified, 3 untracked"
    pub fn summary(&self) -> String {
        if self.is_clean() {
            return "clean".to_string();
        }

        let counts = [
            (self.staged().count(), "staged"),
            (self.unstaged().count(), "modified"),
            (self.untracked().count(), "untracked"),
            (self.conflicted().count(), "conflicted"),
        ];

        counts
            .iter()
            .filter(|(count, _)| *count > 0)
            .map(|(count, label)| format!("{} {}", count, label))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for WorkingTreeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

impl FromIterator<StatusEntry> for WorkingTreeStatus {
    fn from_iter<I: IntoIterator<Item = StatusEntry>>(iter: I) -> Self {
        let mut status = Self::new();
        for entry in iter {
            status.add(entry);
        }
        status
    }
}
