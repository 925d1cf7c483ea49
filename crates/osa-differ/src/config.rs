//! Project configuration file support for osa-differ.
//!
//! Loads configuration from `osa-differ.toml` in the working directory.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Project-level configuration loaded from `osa-differ.toml`
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct OsaDifferConfig {
    /// Where repositories are cloned
    pub storage_dir: Option<PathBuf>,
    pub osa_repo_url: Option<String>,
    /// Role requirements file inside the repository
    pub role_requirements: Option<PathBuf>,
    /// Directory of project pin files inside the repository
    pub project_pins_dir: Option<PathBuf>,
    pub hide_merges: Option<bool>,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub gist: GistConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    /// Emit nothing when no dependency changed
    pub skip_empty: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct GistConfig {
    pub endpoint: Option<String>,
    pub token: Option<String>,
}

/// The config file name
pub const CONFIG_FILE_NAME: &str = "osa-differ.toml";

/// Environment variable consulted when no gist token is configured
pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

const DEFAULT_STORAGE_DIR: &str = ".osa-differ";

impl OsaDifferConfig {
    /// Load configuration from the working directory.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if file exists and parses successfully
    /// - `Ok(None)` if file does not exist
    /// - `Err(...)` if file exists but fails to parse (hard error)
    pub fn load(working_dir: &Path) -> Result<Option<Self>> {
        let config_path = working_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: OsaDifferConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Ok(Some(config))
    }

    /// Storage directory.
    /// Priority: CLI > config > `~/.osa-differ`
    pub fn storage_dir(&self, cli: Option<&Path>) -> Result<PathBuf> {
        if let Some(dir) = cli.map(Path::to_path_buf).or_else(|| self.storage_dir.clone()) {
            return Ok(dir);
        }
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(DEFAULT_STORAGE_DIR))
    }

    /// Gist token.
    /// Priority: [gist].token > `GITHUB_TOKEN` > None
    pub fn gist_token(&self) -> Option<String> {
        self.gist
            .token
            .clone()
            .or_else(|| std::env::var(TOKEN_ENV_VAR).ok())
            .filter(|token| !token.is_empty())
    }

    /// A CLI switch wins when set, otherwise the config value, otherwise off.
    pub fn flag(cli: bool, config: Option<bool>) -> bool {
        cli || config.unwrap_or(false)
    }
}
