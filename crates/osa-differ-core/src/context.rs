use osa_differ_git::CommitEntry;
use serde::Serialize;

use crate::updater::{DependencyReport, DependencyStatus};

/// Everything a report needs about one comparison
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonContext {
    /// Older top-level ref, after any flip
    pub old_ref: String,
    /// Newer top-level ref, after any flip
    pub new_ref: String,
    /// The refs were given in reverse order and swapped
    pub flipped: bool,
    /// URL of the top-level repository
    pub repo_url: String,
    /// Top-level commits in the range, newest first
    pub commits: Vec<CommitEntry>,
    pub projects: Vec<DependencyReport>,
    pub roles: Vec<DependencyReport>,
}

impl ComparisonContext {
    pub fn new(old_ref: String, new_ref: String, repo_url: String) -> Self {
        Self {
            old_ref,
            new_ref,
            flipped: false,
            repo_url,
            commits: Vec::new(),
            projects: Vec::new(),
            roles: Vec::new(),
        }
    }

    pub fn with_flipped(mut self, flipped: bool) -> Self {
        self.flipped = flipped;
        self
    }

    pub fn dependency_count(&self) -> usize {
        self.projects.len() + self.roles.len()
    }

    pub fn has_dependency_changes(&self) -> bool {
        self.dependency_count() > 0
    }

    /// Dependencies whose history could not be read
    pub fn unchecked(&self) -> impl Iterator<Item = &DependencyReport> {
        self.projects
            .iter()
            .chain(self.roles.iter())
            .filter(|report| matches!(report.status, DependencyStatus::Unchecked { .. }))
    }
}
