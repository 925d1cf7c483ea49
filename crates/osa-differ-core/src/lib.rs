//! # osa-differ-core
//!
//! Comparison pipeline for osa-differ.
//!
//! Given two commits of an OpenStack-Ansible checkout, this crate reads the
//! pinned project and role versions at each, works out which pins moved,
//! and collects the commits behind every moved pin.
//!
//! ## Key Types
//!
//! - [`Differ`] - Runs a whole comparison
//! - [`ManifestResolver`] - Reads pins at a commit
//! - [`PinDelta`] - Added / removed / changed pins
//! - [`DependencyUpdater`] - Fetches dependencies and lists their commits
//! - [`ComparisonContext`] - Result handed to the report renderer

mod context;
mod error;
pub mod manifest;
pub mod pins;
mod runner;
mod updater;

pub use context::ComparisonContext;
pub use error::DiffError;
pub use manifest::{ManifestKind, ManifestResolver, ManifestSources, ResolvedPins};
pub use pins::{diff, Pin, PinChange, PinDelta, PinList};
pub use runner::{
    Differ, DifferConfig, DEFAULT_OSA_REPO_URL, OSA_REPO_DIR, PROJECTS_DIR, ROLES_DIR,
};
pub use updater::{DependencyReport, DependencyStatus, DependencyUpdater};
