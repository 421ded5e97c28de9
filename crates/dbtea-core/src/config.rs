//! Configuration schema (dbtea.toml)
//!
//! One table per dbt project under `[projects.<name>]`. Keys prefixed with
//! `looker_sdk_` are written out to the Looker SDK ini file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use crate::error::{DbteaError, Result};

/// Default config file name inside the profiles directory
pub const DEFAULT_CONFIG_FILE: &str = "dbtea.toml";

/// Default Looker SDK ini section
pub const DEFAULT_LOOKER_SECTION: &str = "looker";

/// Prefix marking settings forwarded to the Looker SDK ini file
pub const LOOKER_SDK_PREFIX: &str = "looker_sdk_";

/// Directory holding dbt profiles (`~/.dbt`)
pub fn default_profiles_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_default().join(".dbt")
}

/// Path of the dbtea config file inside `profiles_dir`
pub fn config_path(profiles_dir: &Path) -> PathBuf {
    profiles_dir.join(DEFAULT_CONFIG_FILE)
}

fn default_base_branch() -> String {
    "main".to_string()
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

/// Git hosting settings for pull request automation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitConfig {
    /// Organization (or user) owning the repository
    pub organization: String,

    /// Repository name
    pub repository: String,

    /// Branch pull requests are opened against
    #[serde(default = "default_base_branch")]
    pub base_branch: String,

    /// Environment variable holding the API token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Override for the API base URL (GitHub Enterprise)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

/// Per-project settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Root of the dbt project
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dbt_project_dir: Option<PathBuf>,

    /// Where generated LookML files are written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookml_output_dir: Option<PathBuf>,

    /// Looker project id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub looker_project: Option<String>,

    /// Looker SDK ini file (default: `<profiles-dir>/looker.ini`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub looker_config_path: Option<PathBuf>,

    /// Section written in the Looker SDK ini file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub looker_config_section: Option<String>,

    /// Free-form settings, including `looker_sdk_*` keys
    #[serde(flatten)]
    pub settings: BTreeMap<String, toml::Value>,

    /// Pull request settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitConfig>,
}

impl ProjectConfig {
    /// Looker SDK ini path, falling back to `<profiles_dir>/looker.ini`
    pub fn looker_config_path(&self, profiles_dir: &Path) -> PathBuf {
        self.looker_config_path
            .clone()
            .unwrap_or_else(|| profiles_dir.join("looker.ini"))
    }

    pub fn looker_section(&self) -> &str {
        self.looker_config_section
            .as_deref()
            .unwrap_or(DEFAULT_LOOKER_SECTION)
    }

    /// `looker_sdk_*` settings with the prefix stripped, sorted by key
    pub fn looker_sdk_settings(&self) -> Vec<(String, String)> {
        self.settings
            .iter()
            .filter_map(|(key, value)| {
                let stripped = key.strip_prefix(LOOKER_SDK_PREFIX)?;
                let rendered = match value {
                    toml::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Some((stripped.to_string(), rendered))
            })
            .collect()
    }

    /// Render the Looker SDK ini file contents
    pub fn render_looker_ini(&self) -> String {
        let mut ini = format!("[{}]\n", self.looker_section());
        for (key, value) in self.looker_sdk_settings() {
            ini.push_str(&format!("{} = {}\n", key, value));
        }
        ini
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DbteaConfig {
    /// Settings per dbt project
    #[serde(default)]
    pub projects: BTreeMap<String, ProjectConfig>,
}

impl DbteaConfig {
    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(DbteaError::missing_resource(
                "invalid-dbtea-config-file-local-path",
                "Specified dbtea config path does not exist",
                format!(
                    "No dbtea config file at {}; run `dbtea config init` or check the --profiles-dir setting",
                    path.display()
                ),
            ));
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| DbteaError::io(path, e))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self> {
        toml::from_str(toml).map_err(|e| {
            DbteaError::invalid_input(
                "invalid-dbtea-config",
                "Could not parse dbtea config",
                e.to_string(),
            )
        })
    }

    /// Load config if the file exists, otherwise start empty
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.is_file() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to TOML file, creating parent directories
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let toml = toml::to_string_pretty(self).map_err(|e| {
            DbteaError::invalid_input("invalid-dbtea-config", "Could not serialize dbtea config", e.to_string())
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DbteaError::io(parent, e))?;
        }

        std::fs::write(path, toml).map_err(|e| DbteaError::io(path, e))
    }

    /// Write config to `path`.
    ///
    /// Returns `Ok(false)` without touching the file when it already holds
    /// project data and `replace_if_exists` is false.
    pub fn write(&self, path: &Path, replace_if_exists: bool) -> Result<bool> {
        if !replace_if_exists && path.is_file() {
            let existing = Self::from_file(path)?;
            if !existing.projects.is_empty() {
                tracing::warn!(
                    "dbtea config file already exists at {}, skipping write",
                    path.display()
                );
                return Ok(false);
            }
        }

        tracing::info!("Writing dbtea config file at {}", path.display());
        self.save_to_file(path)?;
        Ok(true)
    }

    /// Look up a project's settings
    pub fn project(&self, name: &str) -> Result<&ProjectConfig> {
        self.projects.get(name).ok_or_else(|| {
            DbteaError::invalid_input(
                "unknown-dbtea-project",
                "Project not configured",
                format!(
                    "No [projects.{}] table in dbtea config; configured projects: {}",
                    name,
                    self.projects.keys().cloned().collect::<Vec<_>>().join(", ")
                ),
            )
        })
    }

    /// Insert or replace a project's settings
    pub fn upsert_project(&mut self, name: impl Into<String>, project: ProjectConfig) {
        self.projects.insert(name.into(), project);
    }

    /// Write the Looker SDK ini file for `name`
    pub fn write_looker_config(&self, name: &str, profiles_dir: &Path) -> Result<PathBuf> {
        let project = self.project(name)?;
        let path = project.looker_config_path(profiles_dir);

        tracing::info!("Writing Looker config file at {}", path.display());
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DbteaError::io(parent, e))?;
        }
        std::fs::write(&path, project.render_looker_ini())
            .map_err(|e| DbteaError::io(&path, e))?;

        Ok(path)
    }
}
