use git2::{ErrorCode, ObjectType, Oid, Repository, Revwalk, Sort};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::CommitEntry;

/// Refspecs fetched on update: every branch as a remote-tracking ref, plus tags.
const FETCH_REFSPECS: [&str; 2] = [
    "+refs/heads/*:refs/remotes/origin/*",
    "+refs/tags/*:refs/tags/*",
];

#[derive(Error, Debug)]
pub enum GitError {
    #[error("Failed to clone {url} into {}: {source}", .path.display())]
    CloneFailed {
        url: String,
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    #[error("Failed to fetch from {url}: {source}")]
    FetchFailed {
        url: String,
        #[source]
        source: git2::Error,
    },

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Invalid commit range: {old}..{new}")]
    InvalidRange { old: String, new: String },

    #[error("Git operation failed: {0}")]
    GitOperationFailed(#[from] git2::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Outcome of validating an `old..new` range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeCheck {
    /// `new` is ahead of `old`
    Valid,
    /// `new` is behind `old`; swap the refs and carry on
    Flip,
}

/// A local repository opened for reading history
pub struct GitRepo {
    repo: Repository,
    path: PathBuf,
}

impl GitRepo {
    /// Open an existing repository
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = Repository::open(path)?;
        Ok(Self {
            repo,
            path: path.to_path_buf(),
        })
    }

    /// Clone `url` into `dest`, creating parent directories as needed
    pub fn clone_remote(url: &str, dest: &Path) -> Result<Self, GitError> {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!(url, path = %dest.display(), "Cloning repository");

        let repo = Repository::clone(url, dest).map_err(|source| GitError::CloneFailed {
            url: url.to_string(),
            path: dest.to_path_buf(),
            source,
        })?;

        Ok(Self {
            repo,
            path: dest.to_path_buf(),
        })
    }

    /// Make sure a usable clone exists at `repo_path`.
    ///
    /// Clones when the path holds no repository. Otherwise fetches from
    /// `remote_url` if `fetch` is set; the working tree is never merged into.
    pub fn update(repo_path: &Path, remote_url: &str, fetch: bool) -> Result<Self, GitError> {
        match Repository::open(repo_path) {
            Ok(repo) => {
                let repo = Self {
                    repo,
                    path: repo_path.to_path_buf(),
                };
                if fetch {
                    repo.fetch(remote_url)?;
                }
                Ok(repo)
            }
            Err(e) => {
                debug!(path = %repo_path.display(), error = %e, "No repository found, cloning");
                Self::clone_remote(remote_url, repo_path)
            }
        }
    }

    fn fetch(&self, remote_url: &str) -> Result<(), GitError> {
        debug!(url = remote_url, path = %self.path.display(), "Fetching");

        let mut remote = self.repo.remote_anonymous(remote_url)?;
        remote
            .fetch(&FETCH_REFSPECS, None, None)
            .map_err(|source| GitError::FetchFailed {
                url: remote_url.to_string(),
                source,
            })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve a reference to a commit id.
    ///
    /// Branch names resolve through `refs/remotes/origin/<name>` first.
    /// Fetching never moves the local heads a clone starts with, so the
    /// remote-tracking ref is the current one.
    pub fn validate_ref(&self, reference: &str) -> Result<Oid, GitError> {
        let remote_tracking = format!("refs/remotes/origin/{}", reference);
        for spec in [remote_tracking.as_str(), reference] {
            if let Ok(object) = self.repo.revparse_single(spec) {
                if let Ok(commit) = object.peel_to_commit() {
                    return Ok(commit.id());
                }
            }
        }
        Err(GitError::InvalidReference(reference.to_string()))
    }

    /// Check that `old..new` is a usable range.
    ///
    /// Returns [`RangeCheck::Flip`] when `new` is behind `old`, and an
    /// error when neither side has commits the other lacks.
    pub fn validate_range(&self, old_ref: &str, new_ref: &str) -> Result<RangeCheck, GitError> {
        let old = self.validate_ref(old_ref)?;
        let new = self.validate_ref(new_ref)?;

        if self.has_commits_between(old, new)? {
            return Ok(RangeCheck::Valid);
        }
        if self.has_commits_between(new, old)? {
            debug!(old = old_ref, new = new_ref, "Range is inverted");
            return Ok(RangeCheck::Flip);
        }

        Err(GitError::InvalidRange {
            old: old_ref.to_string(),
            new: new_ref.to_string(),
        })
    }

    fn has_commits_between(&self, hide: Oid, push: Oid) -> Result<bool, GitError> {
        let mut walk = self.repo.revwalk()?;
        walk.push(push)?;
        walk.hide(hide)?;
        Ok(walk.next().transpose()?.is_some())
    }

    /// Commits reachable from `new_ref` but not from `old_ref`, newest first
    pub fn list_commits(
        &self,
        old_ref: &str,
        new_ref: &str,
        hide_merges: bool,
    ) -> Result<CommitLog<'_>, GitError> {
        let old = self.validate_ref(old_ref)?;
        let new = self.validate_ref(new_ref)?;

        let mut walk = self.repo.revwalk()?;
        walk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        walk.push(new)?;
        walk.hide(old)?;

        Ok(CommitLog {
            repo: &self.repo,
            walk,
            hide_merges,
        })
    }

    /// Read a file as it existed at `reference`.
    ///
    /// Returns `Ok(None)` when the commit has no such file.
    pub fn read_file_at(&self, reference: &str, path: &Path) -> Result<Option<String>, GitError> {
        let oid = self.validate_ref(reference)?;
        let tree = self.repo.find_commit(oid)?.tree()?;

        let entry = match tree.get_path(path) {
            Ok(entry) => entry,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if entry.kind() != Some(ObjectType::Blob) {
            return Ok(None);
        }

        let blob = self.repo.find_blob(entry.id())?;
        Ok(Some(String::from_utf8_lossy(blob.content()).into_owned()))
    }

    /// Files directly under `dir` at `reference`, sorted by path.
    ///
    /// A missing directory yields an empty list.
    pub fn list_files_at(&self, reference: &str, dir: &Path) -> Result<Vec<PathBuf>, GitError> {
        let oid = self.validate_ref(reference)?;
        let root = self.repo.find_commit(oid)?.tree()?;

        let tree = if dir.as_os_str().is_empty() {
            root
        } else {
            match root.get_path(dir) {
                Ok(entry) if entry.kind() == Some(ObjectType::Tree) => {
                    self.repo.find_tree(entry.id())?
                }
                Ok(_) => return Ok(Vec::new()),
                Err(e) if e.code() == ErrorCode::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(e.into()),
            }
        };

        let mut files: Vec<PathBuf> = tree
            .iter()
            .filter(|entry| entry.kind() == Some(ObjectType::Blob))
            .filter_map(|entry| entry.name().map(|name| dir.join(name)))
            .collect();
        files.sort();

        Ok(files)
    }
}

/// Lazy walk over the commits of a range.
///
/// Built fresh by every [`GitRepo::list_commits`] call.
pub struct CommitLog<'repo> {
    repo: &'repo Repository,
    walk: Revwalk<'repo>,
    hide_merges: bool,
}

impl Iterator for CommitLog<'_> {
    type Item = Result<CommitEntry, GitError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let oid = match self.walk.next()? {
                Ok(oid) => oid,
                Err(e) => return Some(Err(e.into())),
            };
            let commit = match self.repo.find_commit(oid) {
                Ok(commit) => commit,
                Err(e) => return Some(Err(e.into())),
            };
            if self.hide_merges && commit.parent_count() > 1 {
                continue;
            }
            return Some(Ok(CommitEntry::from_commit(&commit)));
        }
    }
}
