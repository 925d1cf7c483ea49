use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// One commit in a listed range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitEntry {
    pub sha: String,
    pub author: String,
    pub date: DateTime<Utc>,
    pub subject: String,
    pub is_merge: bool,
}

impl CommitEntry {
    pub(crate) fn from_commit(commit: &git2::Commit<'_>) -> Self {
        let author = commit.author();
        let date = Utc
            .timestamp_opt(commit.time().seconds(), 0)
            .single()
            .unwrap_or_default();

        Self {
            sha: commit.id().to_string(),
            author: author.name().unwrap_or("unknown").to_string(),
            date,
            subject: commit.summary().unwrap_or("").to_string(),
            is_merge: commit.parent_count() > 1,
        }
    }

    /// Abbreviated hash used in reports
    pub fn short_sha(&self) -> &str {
        let end = self.sha.len().min(7);
        &self.sha[..end]
    }
}
