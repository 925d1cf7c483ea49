use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use osa_differ_git::{GitError, GitRepo, RangeCheck};
use osa_differ_logging::{LogEvent, Logger};

use crate::context::ComparisonContext;
use crate::error::DiffError;
use crate::manifest::{ManifestResolver, ResolvedPins};
use crate::pins::{self, PinDelta};
use crate::updater::DependencyUpdater;

pub const DEFAULT_OSA_REPO_URL: &str = "https://github.com/openstack/openstack-ansible";

/// Directory under the storage dir holding the top-level clone
pub const OSA_REPO_DIR: &str = "openstack-ansible";

/// Directories under the storage dir holding project and role clones
pub const PROJECTS_DIR: &str = "projects";
pub const ROLES_DIR: &str = "roles";

/// Settings for a comparison run
#[derive(Debug, Clone)]
pub struct DifferConfig {
    /// Where all clones live
    pub storage_dir: PathBuf,
    pub osa_repo_url: String,
    /// Fetch the top-level repository before comparing
    pub update_osa_repo: bool,
    pub hide_merges: bool,
}

impl DifferConfig {
    pub fn new(storage_dir: PathBuf) -> Self {
        Self {
            storage_dir,
            osa_repo_url: DEFAULT_OSA_REPO_URL.to_string(),
            update_osa_repo: false,
            hide_merges: false,
        }
    }

    pub fn osa_repo_path(&self) -> PathBuf {
        self.storage_dir.join(OSA_REPO_DIR)
    }

    pub fn projects_dir(&self) -> PathBuf {
        self.storage_dir.join(PROJECTS_DIR)
    }

    pub fn roles_dir(&self) -> PathBuf {
        self.storage_dir.join(ROLES_DIR)
    }
}

/// Runs a comparison from two top-level refs to a [`ComparisonContext`]
pub struct Differ {
    config: DifferConfig,
    resolver: ManifestResolver,
    logger: Arc<Logger>,
}

impl Differ {
    pub fn new(config: DifferConfig, resolver: ManifestResolver, logger: Arc<Logger>) -> Self {
        Self {
            config,
            resolver,
            logger,
        }
    }

    /// Compare `old_ref` with `new_ref`.
    ///
    /// Top-level refs are validated before any dependency work. Problems
    /// with individual dependencies end up in the context, not as errors.
    pub fn run(&self, old_ref: &str, new_ref: &str) -> Result<ComparisonContext, DiffError> {
        let started_at = Instant::now();

        self.logger.log(&LogEvent::ComparisonStarted {
            old_ref: old_ref.to_string(),
            new_ref: new_ref.to_string(),
            storage_dir: self.config.storage_dir.clone(),
        });

        self.prepare_storage()?;

        let repo_path = self.config.osa_repo_path();
        let repo = GitRepo::update(
            &repo_path,
            &self.config.osa_repo_url,
            self.config.update_osa_repo,
        )?;
        self.logger.log(&LogEvent::RepositoryReady {
            name: OSA_REPO_DIR.to_string(),
            path: repo_path,
            fetched: self.config.update_osa_repo,
        });

        for reference in [old_ref, new_ref] {
            repo.validate_ref(reference)
                .map_err(|_| DiffError::InvalidReference(reference.to_string()))?;
        }

        let (old_ref, new_ref, flipped) = match repo.validate_range(old_ref, new_ref) {
            Ok(RangeCheck::Valid) => (old_ref, new_ref, false),
            Ok(RangeCheck::Flip) => {
                info!(old = old_ref, new = new_ref, "Swapping inverted range");
                self.logger.log(&LogEvent::RangeFlipped {
                    name: OSA_REPO_DIR.to_string(),
                    old_ref: old_ref.to_string(),
                    new_ref: new_ref.to_string(),
                });
                (new_ref, old_ref, true)
            }
            Err(GitError::InvalidRange { old, new }) => {
                return Err(DiffError::InvalidRange { old, new })
            }
            Err(e) => return Err(e.into()),
        };

        let mut context = ComparisonContext::new(
            old_ref.to_string(),
            new_ref.to_string(),
            self.config.osa_repo_url.clone(),
        )
        .with_flipped(flipped);

        context.commits = repo
            .list_commits(old_ref, new_ref, self.config.hide_merges)?
            .collect::<Result<Vec<_>, _>>()?;
        debug!(commits = context.commits.len(), "Listed top-level commits");

        let old_pins = self.resolve(&repo, old_ref)?;
        let new_pins = self.resolve(&repo, new_ref)?;

        let project_delta = pins::diff(&old_pins.projects, &new_pins.projects);
        let role_delta = pins::diff(&old_pins.roles, &new_pins.roles);
        self.log_delta(&project_delta, &role_delta);

        // Separate clone roots keep a project and a role of the same name apart
        context.projects = self
            .updater(self.config.projects_dir())
            .check_all(&project_delta);
        context.roles = self
            .updater(self.config.roles_dir())
            .check_all(&role_delta);

        self.logger.log(&LogEvent::ComparisonCompleted {
            dependencies: context.dependency_count(),
            duration_secs: started_at.elapsed().as_secs_f64(),
        });

        Ok(context)
    }

    fn updater(&self, storage_dir: PathBuf) -> DependencyUpdater {
        DependencyUpdater::new(storage_dir, self.logger.clone())
            .with_hide_merges(self.config.hide_merges)
    }

    fn prepare_storage(&self) -> Result<(), DiffError> {
        let path = &self.config.storage_dir;
        std::fs::create_dir_all(path).map_err(|source| DiffError::StorageDirectory {
            path: path.clone(),
            source,
        })
    }

    fn resolve(&self, repo: &GitRepo, commit_ref: &str) -> Result<ResolvedPins, DiffError> {
        let resolved = self.resolver.resolve_pins(repo, commit_ref)?;
        self.logger.log(&LogEvent::PinsResolved {
            commit: commit_ref.to_string(),
            projects: resolved.projects.len(),
            roles: resolved.roles.len(),
        });
        Ok(resolved)
    }

    fn log_delta(&self, projects: &PinDelta, roles: &PinDelta) {
        self.logger.log(&LogEvent::PinsDiffed {
            changed: projects.changed.len() + roles.changed.len(),
            added: projects.added.len() + roles.added.len(),
            removed: projects.removed.len() + roles.removed.len(),
            unchanged: projects.unchanged.len() + roles.unchanged.len(),
        });
    }
}
