//! dbt project discovery, settings and artifacts

use dbtea_core::{DbteaError, ModelSchema, Result};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::manifest::Manifest;
use crate::runner::DbtRunner;
use crate::schema_files::model_schemas_from_yaml;

/// Project file marking a dbt project root
pub const DBT_PROJECT_FILE: &str = "dbt_project.yml";

/// Find the dbt project root
///
/// A custom directory must itself hold `dbt_project.yml`. Without one, the
/// current working directory and each of its parents are searched.
pub fn locate_project(custom_dir: Option<&Path>) -> Result<PathBuf> {
    let cwd = std::env::current_dir().map_err(|e| DbteaError::io(Path::new("."), e))?;
    locate_project_from(&cwd, custom_dir)
}

/// [`locate_project`] starting from `start` instead of the working directory
pub fn locate_project_from(start: &Path, custom_dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(custom) = custom_dir {
        if custom.join(DBT_PROJECT_FILE).is_file() {
            return Ok(custom.to_path_buf());
        }
        return Err(DbteaError::invalid_input(
            "invalid-custom-dbt-project-directory",
            "No dbt project found at supplied custom directory",
            format!(
                "No {} file found at supplied custom project directory {}, confirm your \
                 custom project directory is valid",
                DBT_PROJECT_FILE,
                custom.display()
            ),
        ));
    }

    for dir in start.ancestors() {
        if dir.join(DBT_PROJECT_FILE).is_file() {
            tracing::info!("Running dbtea against dbt project at path: {}", dir.display());
            return Ok(dir.to_path_buf());
        }
    }

    Err(DbteaError::missing_resource(
        "missing-dbt-project",
        "No dbt project found",
        format!(
            "No {} file found in {} or any parent directory. Run dbtea from within a dbt \
             project or supply a custom project directory",
            DBT_PROJECT_FILE,
            start.display()
        ),
    ))
}

/// dbt-generated artifact files under the target path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    Catalog,
    Manifest,
    RunResults,
    Sources,
}

impl Artifact {
    pub const ALL: &'static [Artifact] = &[
        Artifact::Catalog,
        Artifact::Manifest,
        Artifact::RunResults,
        Artifact::Sources,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Catalog => "catalog.json",
            Self::Manifest => "manifest.json",
            Self::RunResults => "run_results.json",
            Self::Sources => "sources.json",
        }
    }
}

impl std::fmt::Display for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Keys read from dbt_project.yml
#[derive(Debug, Deserialize)]
struct ProjectFile {
    name: String,
    #[serde(default)]
    profile: Option<String>,
    #[serde(default, rename = "target-path")]
    target_path: Option<String>,
    #[serde(default, rename = "log-path")]
    log_path: Option<String>,
    #[serde(default, rename = "model-paths")]
    model_paths: Option<Vec<String>>,
    #[serde(default, rename = "source-paths")]
    source_paths: Option<Vec<String>>,
}

/// A dbt project on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbtProject {
    /// Directory holding dbt_project.yml
    pub root: PathBuf,

    pub name: String,

    pub profile: Option<String>,

    /// Relative to `root`
    pub target_path: PathBuf,

    /// Relative to `root`
    pub log_path: PathBuf,

    /// Relative to `root`
    pub model_paths: Vec<PathBuf>,
}

impl DbtProject {
    /// Read dbt_project.yml from `root`
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(DBT_PROJECT_FILE);
        let contents = std::fs::read_to_string(&path).map_err(|e| DbteaError::io(&path, e))?;
        let file: ProjectFile = serde_yaml::from_str(&contents).map_err(|e| {
            DbteaError::invalid_input(
                "invalid-dbt-project-file",
                "Failed to parse dbt project file",
                format!("{}: {}", path.display(), e),
            )
        })?;

        let model_paths = file
            .model_paths
            .or(file.source_paths)
            .unwrap_or_else(|| vec!["models".to_string()]);

        Ok(Self {
            root: root.to_path_buf(),
            name: file.name,
            profile: file.profile,
            target_path: PathBuf::from(file.target_path.unwrap_or_else(|| "target".to_string())),
            log_path: PathBuf::from(file.log_path.unwrap_or_else(|| "logs".to_string())),
            model_paths: model_paths.into_iter().map(PathBuf::from).collect(),
        })
    }

    /// Locate and load the project
    pub fn discover(custom_dir: Option<&Path>) -> Result<Self> {
        Self::load(&locate_project(custom_dir)?)
    }

    pub fn target_dir(&self) -> PathBuf {
        self.root.join(&self.target_path)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.root.join(&self.log_path)
    }

    pub fn model_dirs(&self) -> Vec<PathBuf> {
        self.model_paths.iter().map(|p| self.root.join(p)).collect()
    }

    pub fn packages_file(&self) -> PathBuf {
        self.root.join(crate::packages::PACKAGES_FILE)
    }

    pub fn artifact_path(&self, artifact: Artifact) -> PathBuf {
        self.target_dir().join(artifact.file_name())
    }

    /// Path of an artifact that must already exist
    fn existing_artifact(&self, artifact: Artifact) -> Result<PathBuf> {
        let path = self.artifact_path(artifact);
        if path.is_file() {
            return Ok(path);
        }
        Err(DbteaError::missing_resource(
            "artifact-file-missing",
            format!("Artifact file {} is missing", artifact),
            format!(
                "There is no artifact {} at path {}. You may not have yet generated this \
                 artifact and need to run models, source freshness or docs generation",
                artifact,
                path.display()
            ),
        ))
    }

    /// Parse an artifact as JSON
    pub fn parse_artifact(&self, artifact: Artifact) -> Result<Value> {
        let path = self.existing_artifact(artifact)?;
        let contents = std::fs::read_to_string(&path).map_err(|e| DbteaError::io(&path, e))?;
        serde_json::from_str(&contents).map_err(|e| {
            DbteaError::invalid_input(
                "invalid-json-file",
                "Failed to parse JSON file",
                format!("{}: {}", path.display(), e),
            )
        })
    }

    /// The typed manifest artifact
    pub fn manifest(&self) -> Result<Manifest> {
        Manifest::from_file(&self.existing_artifact(Artifact::Manifest)?)
    }

    /// Models documented in the project's schema files
    pub fn schema_file_models(&self) -> Result<Vec<ModelSchema>> {
        model_schemas_from_yaml(&self.model_dirs())
    }

    /// A runner executing dbt in this project's root
    pub fn runner(&self) -> DbtRunner {
        DbtRunner::new(&self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbtea_core::ErrorKind;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const FIXTURE: &str = "../../fixtures/jaffle-shop";

    #[test]
    fn locates_project_in_parent() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(DBT_PROJECT_FILE), "name: p\n").unwrap();
        let nested = dir.path().join("models").join("staging");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(locate_project_from(&nested, None).unwrap(), dir.path());
    }

    #[test]
    fn missing_project_is_missing_resource() {
        let dir = TempDir::new().unwrap();
        let err = locate_project_from(dir.path(), None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingResource);
        assert_eq!(err.name, "missing-dbt-project");
    }

    #[test]
    fn custom_dir_must_hold_project_file() {
        let dir = TempDir::new().unwrap();
        let err = locate_project_from(Path::new("/"), Some(dir.path())).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
        assert_eq!(err.name, "invalid-custom-dbt-project-directory");

        std::fs::write(dir.path().join(DBT_PROJECT_FILE), "name: p\n").unwrap();
        assert_eq!(locate_project_from(Path::new("/"), Some(dir.path())).unwrap(), dir.path());
    }

    #[test]
    fn loads_project_settings() {
        let project = DbtProject::load(Path::new(FIXTURE)).unwrap();
        assert_eq!(project.name, "jaffle_shop");
        assert_eq!(project.profile.as_deref(), Some("jaffle_shop"));
        assert_eq!(project.target_dir(), Path::new(FIXTURE).join("target"));
        assert_eq!(project.model_dirs(), vec![Path::new(FIXTURE).join("models")]);
    }

    #[test]
    fn defaults_and_legacy_source_paths() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(DBT_PROJECT_FILE),
            "name: legacy\nsource-paths: [\"src\"]\n",
        )
        .unwrap();

        let project = DbtProject::load(dir.path()).unwrap();
        assert_eq!(project.target_path, PathBuf::from("target"));
        assert_eq!(project.log_path, PathBuf::from("logs"));
        assert_eq!(project.model_paths, vec![PathBuf::from("src")]);
    }

    #[test]
    fn missing_artifact() {
        let project = DbtProject::load(Path::new(FIXTURE)).unwrap();
        let err = project.parse_artifact(Artifact::Catalog).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingResource);
        assert_eq!(err.name, "artifact-file-missing");
        assert_eq!(err.title, "Artifact file catalog.json is missing");
    }

    #[test]
    fn reads_manifest_artifact() {
        let project = DbtProject::load(Path::new(FIXTURE)).unwrap();
        let raw = project.parse_artifact(Artifact::Manifest).unwrap();
        assert_eq!(raw["metadata"]["dbt_version"], "1.7.0");
        assert_eq!(project.manifest().unwrap().model_schemas().len(), 2);
    }
}
