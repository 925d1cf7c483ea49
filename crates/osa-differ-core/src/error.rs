use osa_differ_git::GitError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a comparison before any dependency is checked
#[derive(Error, Debug)]
pub enum DiffError {
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Invalid commit range: {old}..{new} contains no commits in either direction")]
    InvalidRange { old: String, new: String },

    #[error("Cannot create storage directory {}: {source}", .path.display())]
    StorageDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Repository error: {0}")]
    Repository(#[from] GitError),
}
