use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Structured log events for a comparison run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    ComparisonStarted {
        old_ref: String,
        new_ref: String,
        storage_dir: PathBuf,
    },
    /// A local clone is present and (optionally) fetched
    RepositoryReady {
        name: String,
        path: PathBuf,
        fetched: bool,
    },
    RangeFlipped {
        name: String,
        old_ref: String,
        new_ref: String,
    },
    PinsResolved {
        commit: String,
        projects: usize,
        roles: usize,
    },
    PinsDiffed {
        changed: usize,
        added: usize,
        removed: usize,
        unchanged: usize,
    },
    DependencyChecked {
        name: String,
        commits: usize,
        flipped: bool,
    },
    DependencySkipped {
        name: String,
        reason: String,
    },
    ComparisonCompleted {
        dependencies: usize,
        duration_secs: f64,
    },
    ReportPublished {
        destination: String,
    },
}

impl LogEvent {
    /// Add a timestamp to serialize with the event
    fn with_timestamp(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "timestamp".to_string(),
                serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        value
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors
    #[default]
    Pretty,
    /// JSON lines format for machine consumption
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Logger for osa-differ events - handles both console output and file logging
pub struct Logger {
    format: LogFormat,
    file_writer: Option<Mutex<File>>,
}

impl Logger {
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            file_writer: None,
        }
    }

    /// Create a logger with file output in addition to console
    pub fn with_file(format: LogFormat, log_path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        Ok(Self {
            format,
            file_writer: Some(Mutex::new(file)),
        })
    }

    pub fn log(&self, event: &LogEvent) {
        // File output is always JSON
        if let Some(ref writer) = self.file_writer {
            if let Ok(mut file) = writer.lock() {
                let json = event.with_timestamp();
                let _ = writeln!(file, "{}", json);
            }
        }

        let mut stderr = std::io::stderr();
        match self.format {
            LogFormat::Json => {
                if let Ok(json) = serde_json::to_string(event) {
                    let _ = writeln!(stderr, "{}", json);
                }
            }
            LogFormat::Pretty => {
                if let Some(line) = Self::pretty_line(event) {
                    let _ = writeln!(stderr, "{}", line);
                }
            }
            LogFormat::Compact => {
                let timestamp = chrono::Utc::now().format("%H:%M:%S");
                let _ = writeln!(stderr, "[{}] {}", timestamp, Self::compact_line(event));
            }
        }
    }

    fn pretty_line(event: &LogEvent) -> Option<String> {
        let line = match event {
            LogEvent::ComparisonStarted {
                old_ref,
                new_ref,
                storage_dir,
            } => format!(
                "{} {} {}\n  {} {}",
                "▶".bright_blue(),
                "Comparing".bold(),
                format!("{}..{}", old_ref, new_ref).bright_white(),
                "Storage:".dimmed(),
                storage_dir.display().to_string().dimmed()
            ),
            LogEvent::RepositoryReady {
                name,
                path,
                fetched,
            } => format!(
                "  {} {} {}",
                "📁".dimmed(),
                name,
                if *fetched {
                    format!("(fetched into {})", path.display()).dimmed()
                } else {
                    format!("({})", path.display()).dimmed()
                }
            ),
            LogEvent::RangeFlipped {
                name,
                old_ref,
                new_ref,
            } => format!(
                "  {} {}: {} is behind {}, comparing in reverse",
                "⚠".bright_yellow(),
                name,
                new_ref,
                old_ref
            ),
            LogEvent::PinsResolved {
                commit,
                projects,
                roles,
            } => format!(
                "  {} {}: {} {}, {} {}",
                "→".bright_cyan(),
                commit,
                projects,
                if *projects == 1 { "project" } else { "projects" },
                roles,
                if *roles == 1 { "role" } else { "roles" }
            ),
            LogEvent::PinsDiffed {
                changed,
                added,
                removed,
                ..
            } => format!(
                "  {} {} changed, {} added, {} removed",
                "→".bright_cyan(),
                changed.to_string().bright_yellow(),
                added.to_string().green(),
                removed.to_string().red()
            ),
            LogEvent::DependencyChecked { name, commits, .. } => format!(
                "    {} {} ({} {})",
                "✓".bright_green(),
                name,
                commits,
                if *commits == 1 { "commit" } else { "commits" }
            ),
            LogEvent::DependencySkipped { name, reason } => format!(
                "    {} {}: {}",
                "✗".bright_red(),
                name,
                reason.bright_red()
            ),
            LogEvent::ComparisonCompleted {
                dependencies,
                duration_secs,
            } => format!(
                "{} Checked {} {} ({:.1}s)",
                "✓".bright_green(),
                dependencies,
                if *dependencies == 1 {
                    "dependency"
                } else {
                    "dependencies"
                },
                duration_secs
            ),
            // The binary prints publish confirmations itself
            LogEvent::ReportPublished { .. } => return None,
        };
        Some(line)
    }

    fn compact_line(event: &LogEvent) -> String {
        match event {
            LogEvent::ComparisonStarted {
                old_ref, new_ref, ..
            } => format!("compare:start {}..{}", old_ref, new_ref),
            LogEvent::RepositoryReady { name, fetched, .. } => {
                format!("repo:ready {} fetched={}", name, fetched)
            }
            LogEvent::RangeFlipped { name, .. } => format!("range:flip {}", name),
            LogEvent::PinsResolved {
                commit,
                projects,
                roles,
            } => format!("pins:{} p={} r={}", commit, projects, roles),
            LogEvent::PinsDiffed {
                changed,
                added,
                removed,
                unchanged,
            } => format!(
                "pins:diff ~{} +{} -{} ={}",
                changed, added, removed, unchanged
            ),
            LogEvent::DependencyChecked { name, commits, .. } => {
                format!("dep:ok {} {}", name, commits)
            }
            LogEvent::DependencySkipped { name, reason } => {
                format!("dep:skip {} {}", name, reason)
            }
            LogEvent::ComparisonCompleted {
                dependencies,
                duration_secs,
            } => format!("compare:done {} {:.1}s", dependencies, duration_secs),
            LogEvent::ReportPublished { destination } => {
                format!("report:published {}", destination)
            }
        }
    }
}
