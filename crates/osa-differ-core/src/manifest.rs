//! Manifest parsing.
//!
//! Two document shapes declare pins. Project pins are a flat mapping where
//! each project contributes `<name>_git_repo`, `<name>_git_install_branch`
//! and `<name>_git_project_group`. Role requirements are a list of records
//! carrying `name`, `scm`, `src` and `version`. Both normalize to [`Pin`].

use osa_differ_git::{GitError, GitRepo};
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::pins::{Pin, PinList};

pub const DEFAULT_PROJECT_PINS_DIR: &str = "playbooks/defaults/repo_packages";
pub const DEFAULT_ROLE_REQUIREMENTS: &str = "ansible-role-requirements.yml";

const REPO_SUFFIX: &str = "_git_repo";
const BRANCH_SUFFIX: &str = "_git_install_branch";

/// Which parser a manifest file needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    ProjectPins,
    RoleRequirements,
}

impl ManifestKind {
    /// Pick the parser from the file name
    pub fn from_path(path: &Path) -> Self {
        let is_roles = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.contains("role-requirements"));

        if is_roles {
            ManifestKind::RoleRequirements
        } else {
            ManifestKind::ProjectPins
        }
    }

    pub fn parse(self, content: &str) -> Result<PinList, serde_yaml::Error> {
        match self {
            ManifestKind::ProjectPins => Ok(project_pins(&load_mapping(content)?)),
            ManifestKind::RoleRequirements => parse_role_requirements(content),
        }
    }
}

/// Stringify YAML scalars; versions like `1.0` arrive as numbers
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn load_mapping(content: &str) -> Result<Mapping, serde_yaml::Error> {
    match serde_yaml::from_str::<Value>(content)? {
        Value::Mapping(mapping) => Ok(mapping),
        _ => Ok(Mapping::new()),
    }
}

fn project_pins(mapping: &Mapping) -> PinList {
    let mut pins = PinList::new();

    for (key, value) in mapping {
        let Some(key) = key.as_str() else { continue };
        let Some(name) = key.strip_suffix(REPO_SUFFIX) else {
            continue;
        };
        if name.is_empty() {
            continue;
        }

        let repo_url = scalar(value);
        let version = mapping
            .get(format!("{}{}", name, BRANCH_SUFFIX).as_str())
            .and_then(scalar);

        match (repo_url, version) {
            (Some(repo_url), Some(version)) => pins.push(Pin::new(name, repo_url, version)),
            _ => debug!(project = name, "Skipping project without repo and branch"),
        }
    }

    pins
}

fn parse_role_requirements(content: &str) -> Result<PinList, serde_yaml::Error> {
    let records = match serde_yaml::from_str::<Value>(content)? {
        Value::Sequence(records) => records,
        _ => return Ok(PinList::new()),
    };

    let mut pins = PinList::new();
    for record in &records {
        let Some(record) = record.as_mapping() else {
            continue;
        };
        let field = |name: &str| record.get(name).and_then(scalar);

        if let Some(scm) = field("scm") {
            if scm != "git" {
                debug!(scm = %scm, "Skipping role with unsupported scm");
                continue;
            }
        }

        match (field("name"), field("src"), field("version")) {
            (Some(name), Some(src), Some(version)) => pins.push(Pin::new(name, src, version)),
            (name, _, _) => debug!(role = ?name, "Skipping role without name, src and version"),
        }
    }

    Ok(pins)
}

/// Which manifests to scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManifestSources {
    pub projects: bool,
    pub roles: bool,
}

impl Default for ManifestSources {
    fn default() -> Self {
        Self {
            projects: true,
            roles: true,
        }
    }
}

/// Pins declared at one commit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedPins {
    pub projects: PinList,
    pub roles: PinList,
}

/// Reads manifests out of a repository's history
#[derive(Debug, Clone)]
pub struct ManifestResolver {
    project_pins_dir: PathBuf,
    role_requirements: PathBuf,
    sources: ManifestSources,
}

impl Default for ManifestResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestResolver {
    pub fn new() -> Self {
        Self {
            project_pins_dir: PathBuf::from(DEFAULT_PROJECT_PINS_DIR),
            role_requirements: PathBuf::from(DEFAULT_ROLE_REQUIREMENTS),
            sources: ManifestSources::default(),
        }
    }

    pub fn with_project_pins_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.project_pins_dir = dir.into();
        self
    }

    pub fn with_role_requirements(mut self, path: impl Into<PathBuf>) -> Self {
        self.role_requirements = path.into();
        self
    }

    pub fn with_sources(mut self, sources: ManifestSources) -> Self {
        self.sources = sources;
        self
    }

    /// Resolve every enabled manifest at `commit_ref`.
    ///
    /// Missing or unparseable manifests contribute no pins; only an
    /// unresolvable commit is an error.
    pub fn resolve_pins(&self, repo: &GitRepo, commit_ref: &str) -> Result<ResolvedPins, GitError> {
        let mut resolved = ResolvedPins::default();

        if self.sources.projects {
            resolved.projects = self.resolve_projects(repo, commit_ref)?;
        }
        if self.sources.roles {
            resolved.roles = self.resolve_roles(repo, commit_ref)?;
        }

        debug!(
            commit = commit_ref,
            projects = resolved.projects.len(),
            roles = resolved.roles.len(),
            "Resolved pins"
        );

        Ok(resolved)
    }

    fn resolve_projects(&self, repo: &GitRepo, commit_ref: &str) -> Result<PinList, GitError> {
        let files = repo.list_files_at(commit_ref, &self.project_pins_dir)?;

        // Later files override earlier keys, so merge before extracting pins
        let mut merged = Mapping::new();
        for path in files.iter().filter(|path| is_yaml(path)) {
            if ManifestKind::from_path(path) != ManifestKind::ProjectPins {
                continue;
            }
            let Some(content) = repo.read_file_at(commit_ref, path)? else {
                continue;
            };
            match load_mapping(&content) {
                Ok(mapping) => merged.extend(mapping),
                Err(e) => warn!(
                    path = %path.display(),
                    commit = commit_ref,
                    error = %e,
                    "Ignoring unparseable manifest"
                ),
            }
        }

        Ok(project_pins(&merged))
    }

    fn resolve_roles(&self, repo: &GitRepo, commit_ref: &str) -> Result<PinList, GitError> {
        let Some(content) = repo.read_file_at(commit_ref, &self.role_requirements)? else {
            debug!(
                path = %self.role_requirements.display(),
                commit = commit_ref,
                "No role requirements at commit"
            );
            return Ok(PinList::new());
        };

        match ManifestKind::RoleRequirements.parse(&content) {
            Ok(pins) => Ok(pins),
            Err(e) => {
                warn!(
                    path = %self.role_requirements.display(),
                    commit = commit_ref,
                    error = %e,
                    "Ignoring unparseable manifest"
                );
                Ok(PinList::new())
            }
        }
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yml") | Some("yaml")
    )
}
