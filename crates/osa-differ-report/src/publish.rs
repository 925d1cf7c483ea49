use std::io::{self, Write};
use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::gist::GistClient;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Failed to write report: {0}")]
    Io(#[from] io::Error),

    #[error("Gist request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gist service returned {status}: {body}")]
    Service { status: u16, body: String },

    #[error("Gist service response did not include a URL")]
    MissingUrl,
}

/// Sends a rendered report to stdout, a file and/or a gist.
///
/// Each sink is independent; any combination may be enabled.
#[derive(Debug, Clone, Default)]
pub struct ReportPublisher {
    quiet: bool,
    file: Option<PathBuf>,
    gist: Option<GistClient>,
}

impl ReportPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn with_file(mut self, file: Option<PathBuf>) -> Self {
        self.file = file;
        self
    }

    pub fn with_gist(mut self, gist: Option<GistClient>) -> Self {
        self.gist = gist;
        self
    }

    /// Publish to stdout and the configured sinks.
    ///
    /// Returns the confirmation lines for the file and gist sinks.
    pub async fn publish(
        &self,
        report: &str,
        old_ref: &str,
        new_ref: &str,
    ) -> Result<String, PublishError> {
        let mut out = io::stdout();
        self.publish_to(&mut out, report, old_ref, new_ref).await
    }

    pub async fn publish_to<W: Write>(
        &self,
        out: &mut W,
        report: &str,
        old_ref: &str,
        new_ref: &str,
    ) -> Result<String, PublishError> {
        let mut confirmations = Vec::new();

        if !self.quiet {
            out.write_all(report.as_bytes())?;
            out.flush()?;
        }

        if let Some(path) = &self.file {
            std::fs::write(path, report)?;
            info!(path = %path.display(), "Report written");
            confirmations.push(format!("Report written to {}", path.display()));
        }

        if let Some(gist) = &self.gist {
            let url = gist.post(report, old_ref, new_ref).await?;
            info!(url = %url, "Gist created");
            confirmations.push(url);
        }

        Ok(confirmations.join("\n"))
    }
}
