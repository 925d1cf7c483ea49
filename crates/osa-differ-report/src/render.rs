use osa_differ_core::{ComparisonContext, DependencyReport, DependencyStatus};
use osa_differ_git::CommitEntry;

use crate::url::{commit_link, commit_url};

const TITLE: &str = "OpenStack-Ansible Diff";
const TOP_LEVEL_SECTION: &str = "OpenStack-Ansible";
const PROJECTS_SECTION: &str = "OpenStack Projects";
const ROLES_SECTION: &str = "OpenStack-Ansible Roles";

/// Renders a [`ComparisonContext`] as reStructuredText
#[derive(Debug, Clone, Default)]
pub struct ReportRenderer {
    /// Return an empty report when no dependency changed
    skip_empty: bool,
}

impl ReportRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_skip_empty(mut self, skip_empty: bool) -> Self {
        self.skip_empty = skip_empty;
        self
    }

    pub fn render(&self, context: &ComparisonContext) -> String {
        if self.skip_empty && !context.has_dependency_changes() {
            return String::new();
        }

        let mut report = Self::header(context);

        report.push_str(&heading(TOP_LEVEL_SECTION, '-'));
        report.push_str(&format!(
            "{} in `{} <{}>`__ from ``{}`` to ``{}``.\n\n",
            commit_count_phrase(context.commits.len()),
            TOP_LEVEL_SECTION,
            commit_url(&context.repo_url),
            context.old_ref,
            context.new_ref
        ));
        report.push_str(&commit_list(&context.repo_url, &context.commits));

        for (title, dependencies) in [
            (PROJECTS_SECTION, &context.projects),
            (ROLES_SECTION, &context.roles),
        ] {
            if dependencies.is_empty() {
                continue;
            }
            report.push_str(&heading(title, '-'));
            for dependency in dependencies {
                report.push_str(&dependency_section(dependency));
            }
        }

        report
    }

    fn header(context: &ComparisonContext) -> String {
        let mut header = heading(TITLE, '=');
        header.push_str(&format!(
            "Changes between ``{}`` and ``{}``.\n\n",
            context.old_ref, context.new_ref
        ));
        if context.flipped {
            header.push_str(
                "The references were given newest first and have been swapped.\n\n",
            );
        }
        header
    }
}

/// `1 commit was found`, `N commits were found`
pub fn commit_count_phrase(count: usize) -> String {
    match count {
        0 => "No commits were found".to_string(),
        1 => "1 commit was found".to_string(),
        n => format!("{} commits were found", n),
    }
}

fn heading(title: &str, underline: char) -> String {
    let rule: String = std::iter::repeat(underline)
        .take(title.chars().count())
        .collect();
    format!("{}\n{}\n\n", title, rule)
}

/// Bullet list of commits, oldest first
fn commit_list(repo_url: &str, commits: &[CommitEntry]) -> String {
    if commits.is_empty() {
        return String::new();
    }

    let mut list = String::new();
    for commit in commits.iter().rev() {
        list.push_str(&format!(
            "- `{} <{}>`_ {}\n",
            commit.short_sha(),
            commit_link(repo_url, &commit.sha),
            commit.subject
        ));
    }
    list.push('\n');
    list
}

fn dependency_section(dependency: &DependencyReport) -> String {
    let mut section = heading(&dependency.name, '~');
    let link = format!(
        "`{} <{}>`__",
        dependency.name,
        commit_url(&dependency.repo_url)
    );

    match &dependency.status {
        DependencyStatus::Added { version } => {
            section.push_str(&format!(
                "{} was newly added at ``{}``.\n\n",
                link, version
            ));
        }
        DependencyStatus::Removed { version } => {
            section.push_str(&format!(
                "{} was removed (previously ``{}``).\n\n",
                link, version
            ));
        }
        DependencyStatus::Changed {
            old_version,
            new_version,
            commits,
            flipped,
        } => {
            section.push_str(&format!(
                "{} moved from ``{}`` to ``{}``.\n\n",
                link, old_version, new_version
            ));
            if *flipped {
                section.push_str(
                    "The pinned version went backwards; these commits were removed.\n\n",
                );
            }
            section.push_str(&format!("{}:\n\n", commit_count_phrase(commits.len())));
            section.push_str(&commit_list(&dependency.repo_url, commits));
        }
        DependencyStatus::Unchecked {
            old_version,
            new_version,
            reason,
        } => {
            section.push_str(&format!(
                "{} moved from ``{}`` to ``{}`` but could not be checked: {}\n\n",
                link, old_version, new_version, reason
            ));
        }
    }

    section
}
