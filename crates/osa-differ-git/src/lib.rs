//! # osa-differ-git
//!
//! Git repository access for osa-differ.
//!
//! This crate wraps the handful of git operations the differ needs:
//! cloning and fetching dependency repositories, validating references and
//! ranges, listing the commits in a range, and reading manifest files as
//! they existed at a given commit.
//!
//! ## Key Types
//!
//! - [`GitRepo`] - An opened local repository
//! - [`CommitLog`] - Lazy iterator over the commits of a range
//! - [`CommitEntry`] - One row of history
//! - [`RangeCheck`] - Result of validating a commit range
//!
//! ## Usage
//!
//! ```rust,ignore
//! use osa_differ_git::{GitRepo, RangeCheck};
//! use std::path::Path;
//!
//! let repo = GitRepo::update(
//!     Path::new("/tmp/osa-differ/nova"),
//!     "https://github.com/openstack/nova",
//!     true,
//! )?;
//!
//! let (old, new) = match repo.validate_range("abc123", "def456")? {
//!     RangeCheck::Valid => ("abc123", "def456"),
//!     RangeCheck::Flip => ("def456", "abc123"),
//! };
//!
//! for entry in repo.list_commits(old, new, false)? {
//!     let entry = entry?;
//!     println!("{} {}", entry.short_sha(), entry.subject);
//! }
//! ```
//!
//! ## Working Tree
//!
//! Nothing here checks out files. Manifest content is read straight from
//! the object database, so the caller's working tree and HEAD never move.

mod commit;
mod repo;

pub use commit::CommitEntry;
pub use git2::Oid;
pub use repo::{CommitLog, GitError, GitRepo, RangeCheck};
