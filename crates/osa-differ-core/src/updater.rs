use osa_differ_git::{CommitEntry, GitError, GitRepo, RangeCheck};
use osa_differ_logging::{LogEvent, Logger};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::pins::{PinChange, PinDelta};

/// What happened to one dependency between the two commits
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DependencyStatus {
    /// Only present in the newer manifest
    Added { version: String },
    /// Only present in the older manifest
    Removed { version: String },
    Changed {
        old_version: String,
        new_version: String,
        /// Newest first
        commits: Vec<CommitEntry>,
        /// The pinned versions went backwards and were compared in reverse
        flipped: bool,
    },
    /// Version changed but the history could not be read
    Unchecked {
        old_version: String,
        new_version: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyReport {
    pub name: String,
    pub repo_url: String,
    #[serde(flatten)]
    pub status: DependencyStatus,
}

/// Clones or fetches changed dependencies and lists their commits
pub struct DependencyUpdater {
    storage_dir: PathBuf,
    hide_merges: bool,
    logger: Arc<Logger>,
}

impl DependencyUpdater {
    pub fn new(storage_dir: PathBuf, logger: Arc<Logger>) -> Self {
        Self {
            storage_dir,
            hide_merges: false,
            logger,
        }
    }

    pub fn with_hide_merges(mut self, hide: bool) -> Self {
        self.hide_merges = hide;
        self
    }

    /// Local clone location for a dependency
    pub fn storage_path(&self, name: &str) -> PathBuf {
        storage_path(&self.storage_dir, name)
    }

    /// Build a report entry for every added, removed or changed pin, sorted by name.
    ///
    /// Added and removed pins are reported without touching the network.
    pub fn check_all(&self, delta: &PinDelta) -> Vec<DependencyReport> {
        let mut reports: Vec<DependencyReport> = delta
            .added
            .iter()
            .map(|pin| DependencyReport {
                name: pin.name.clone(),
                repo_url: pin.repo_url.clone(),
                status: DependencyStatus::Added {
                    version: pin.version.clone(),
                },
            })
            .chain(delta.removed.iter().map(|pin| DependencyReport {
                name: pin.name.clone(),
                repo_url: pin.repo_url.clone(),
                status: DependencyStatus::Removed {
                    version: pin.version.clone(),
                },
            }))
            .collect();

        reports.extend(delta.changed.iter().map(|change| self.check(change)));
        reports.sort_by(|a, b| a.name.cmp(&b.name));

        reports
    }

    /// Fetch one changed dependency and list its commits.
    ///
    /// Failures are recorded on the returned report instead of aborting.
    pub fn check(&self, change: &PinChange) -> DependencyReport {
        let status = match self.list_changes(change) {
            Ok((commits, flipped)) => {
                self.logger.log(&LogEvent::DependencyChecked {
                    name: change.name.clone(),
                    commits: commits.len(),
                    flipped,
                });
                DependencyStatus::Changed {
                    old_version: change.old_version.clone(),
                    new_version: change.new_version.clone(),
                    commits,
                    flipped,
                }
            }
            Err(e) => {
                warn!(dependency = %change.name, error = %e, "Could not check dependency");
                self.logger.log(&LogEvent::DependencySkipped {
                    name: change.name.clone(),
                    reason: e.to_string(),
                });
                DependencyStatus::Unchecked {
                    old_version: change.old_version.clone(),
                    new_version: change.new_version.clone(),
                    reason: e.to_string(),
                }
            }
        };

        DependencyReport {
            name: change.name.clone(),
            repo_url: change.repo_url.clone(),
            status,
        }
    }

    fn list_changes(&self, change: &PinChange) -> Result<(Vec<CommitEntry>, bool), GitError> {
        let path = self.storage_path(&change.name);
        let repo = GitRepo::update(&path, &change.repo_url, true)?;

        self.logger.log(&LogEvent::RepositoryReady {
            name: change.name.clone(),
            path: path.clone(),
            fetched: true,
        });

        let (old, new, flipped) =
            match repo.validate_range(&change.old_version, &change.new_version)? {
                RangeCheck::Valid => (&change.old_version, &change.new_version, false),
                RangeCheck::Flip => {
                    self.logger.log(&LogEvent::RangeFlipped {
                        name: change.name.clone(),
                        old_ref: change.old_version.clone(),
                        new_ref: change.new_version.clone(),
                    });
                    (&change.new_version, &change.old_version, true)
                }
            };

        let commits = repo
            .list_commits(old, new, self.hide_merges)?
            .collect::<Result<Vec<_>, _>>()?;

        debug!(dependency = %change.name, commits = commits.len(), flipped, "Listed commits");

        Ok((commits, flipped))
    }
}

/// Directory name for a dependency; anything outside `[A-Za-z0-9._-]` becomes `_`
pub(crate) fn storage_path(storage_dir: &Path, name: &str) -> PathBuf {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    // Keep "." and ".." from escaping the storage directory
    let sanitized = if sanitized.chars().all(|c| c == '.') {
        sanitized.replace('.', "_")
    } else {
        sanitized
    };

    storage_dir.join(sanitized)
}
