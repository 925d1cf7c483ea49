//! # osa-differ-report
//!
//! Turns a [`ComparisonContext`](osa_differ_core::ComparisonContext) into a
//! reStructuredText report and sends it where it was asked to go.
//!
//! - [`ReportRenderer`] - Builds the report text
//! - [`ReportPublisher`] - Writes to stdout, a file, or a gist
//! - [`GistClient`] - Minimal client for the gist API

mod gist;
mod publish;
mod render;
pub mod url;

pub use gist::{GistClient, DEFAULT_GIST_ENDPOINT};
pub use publish::{PublishError, ReportPublisher};
pub use render::{commit_count_phrase, ReportRenderer};
