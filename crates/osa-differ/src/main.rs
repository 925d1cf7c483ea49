mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;

use osa_differ_core::{
    Differ, DifferConfig, ManifestResolver, ManifestSources, DEFAULT_OSA_REPO_URL,
};
use osa_differ_logging::{init_tracing, LogEvent, LogFormat, Logger};
use osa_differ_report::{GistClient, ReportPublisher, ReportRenderer, DEFAULT_GIST_ENDPOINT};

use config::OsaDifferConfig;

#[derive(Parser, Debug)]
#[command(
    name = "osa-differ",
    about = "Report what changed between two OpenStack-Ansible commits",
    version,
    author
)]
struct Cli {
    /// Older OpenStack-Ansible commit, tag or branch
    old_commit: String,

    /// Newer OpenStack-Ansible commit, tag or branch
    new_commit: String,

    /// Do not print the report to stdout
    #[arg(short, long)]
    quiet: bool,

    /// Also write the report to this file
    #[arg(long)]
    file: Option<PathBuf>,

    /// Also post the report as a gist
    #[arg(long)]
    gist: bool,

    /// Leave merge commits out of the report
    #[arg(long, conflicts_with = "include_merges")]
    hide_merges: bool,

    /// Keep merge commits in the report (default)
    #[arg(long)]
    include_merges: bool,

    /// Storage directory for cloned repositories (default: ~/.osa-differ)
    #[arg(short = 'd', long)]
    directory: Option<PathBuf>,

    /// Only scan roles
    #[arg(long, conflicts_with = "skip_roles")]
    skip_projects: bool,

    /// Only scan projects
    #[arg(long)]
    skip_roles: bool,

    /// Fetch the OpenStack-Ansible repository before comparing
    #[arg(long)]
    update: bool,

    /// OpenStack-Ansible repository URL
    #[arg(long)]
    osa_repo_url: Option<String>,

    /// Role requirements file inside the repository
    #[arg(long)]
    role_requirements: Option<PathBuf>,

    /// Emit nothing when no dependency changed
    #[arg(long)]
    skip_empty: bool,

    /// Enable debug tracing
    #[arg(long)]
    debug: bool,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty")]
    log_format: LogFormatChoice,

    /// Also append JSON log events to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

impl Cli {
    fn hide_merges(&self, config: &OsaDifferConfig) -> bool {
        if self.include_merges {
            return false;
        }
        OsaDifferConfig::flag(self.hide_merges, config.hide_merges)
    }

    fn sources(&self) -> ManifestSources {
        ManifestSources {
            projects: !self.skip_projects,
            roles: !self.skip_roles,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_format: LogFormat = cli.log_format.into();
    init_tracing(if cli.debug { "debug" } else { "warn" }, log_format);

    let working_dir = std::env::current_dir().context("Failed to get current directory")?;
    let project_config = OsaDifferConfig::load(&working_dir)?.unwrap_or_default();

    let logger = match &cli.log_file {
        Some(path) => Logger::with_file(log_format, path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?,
        None => Logger::new(log_format),
    };
    let logger = Arc::new(logger);

    let mut differ_config =
        DifferConfig::new(project_config.storage_dir(cli.directory.as_deref())?);
    differ_config.osa_repo_url = cli
        .osa_repo_url
        .clone()
        .or_else(|| project_config.osa_repo_url.clone())
        .unwrap_or_else(|| DEFAULT_OSA_REPO_URL.to_string());
    differ_config.update_osa_repo = cli.update;
    differ_config.hide_merges = cli.hide_merges(&project_config);

    let mut resolver = ManifestResolver::new().with_sources(cli.sources());
    if let Some(dir) = &project_config.project_pins_dir {
        resolver = resolver.with_project_pins_dir(dir);
    }
    if let Some(path) = cli
        .role_requirements
        .as_ref()
        .or(project_config.role_requirements.as_ref())
    {
        resolver = resolver.with_role_requirements(path);
    }

    let differ = Differ::new(differ_config, resolver, logger.clone());
    let context = differ
        .run(&cli.old_commit, &cli.new_commit)
        .context("Comparison failed")?;

    let skip_empty = OsaDifferConfig::flag(cli.skip_empty, project_config.report.skip_empty);
    let report = ReportRenderer::new()
        .with_skip_empty(skip_empty)
        .render(&context);

    let gist = cli.gist.then(|| {
        let endpoint = project_config
            .gist
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_GIST_ENDPOINT.to_string());
        GistClient::new(endpoint).with_token(project_config.gist_token())
    });

    let publisher = ReportPublisher::new()
        .with_quiet(cli.quiet)
        .with_file(cli.file.clone())
        .with_gist(gist);
    let confirmation = publisher
        .publish(&report, &context.old_ref, &context.new_ref)
        .await
        .context("Failed to publish report")?;

    for line in confirmation.lines() {
        logger.log(&LogEvent::ReportPublished {
            destination: line.to_string(),
        });
    }
    if !confirmation.is_empty() && matches!(log_format, LogFormat::Pretty) {
        eprintln!();
        eprintln!("{}", confirmation.bold());
    }

    let unchecked = context.unchecked().count();
    if unchecked > 0 {
        eprintln!(
            "{}",
            format!("{} dependencies could not be checked", unchecked).yellow()
        );
    }

    Ok(())
}
