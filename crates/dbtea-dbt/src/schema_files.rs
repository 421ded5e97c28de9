//! dbt schema YAML files (`models:` entries)

use dbtea_core::{DbteaError, ModelSchema, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Default, Deserialize)]
struct SchemaFile {
    #[serde(default)]
    models: Vec<ModelSchema>,
}

/// Parse a YAML file; an empty file is `Null`
pub fn parse_yaml_file(path: &Path) -> Result<serde_yaml::Value> {
    if !path.is_file() {
        return Err(DbteaError::missing_resource(
            "missing-yaml-file",
            "YAML file set to parse is missing",
            format!(
                "Attempted to parse YAML file at path {}, however this path is not a file",
                path.display()
            ),
        ));
    }

    let contents = std::fs::read_to_string(path).map_err(|e| DbteaError::io(path, e))?;
    serde_yaml::from_str(&contents).map_err(|e| invalid_yaml(path, e))
}

fn invalid_yaml(path: &Path, err: serde_yaml::Error) -> DbteaError {
    DbteaError::invalid_input(
        "invalid-yaml-file",
        "Failed to parse YAML file",
        format!("{}: {}", path.display(), err),
    )
}

/// Model entries declared in one schema file
pub fn models_in_file(path: &Path) -> Result<Vec<ModelSchema>> {
    let value = parse_yaml_file(path)?;
    if value.is_null() {
        return Ok(Vec::new());
    }

    let file: SchemaFile = serde_yaml::from_value(value).map_err(|e| invalid_yaml(path, e))?;
    Ok(file.models)
}

/// `.yml`/`.yaml` files under `dirs`, sorted by path within each directory
pub fn schema_files(dirs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for dir in dirs {
        for entry in WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let is_yaml = entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == "yml" || ext == "yaml");
            if is_yaml {
                files.push(entry.path().to_path_buf());
            }
        }
    }
    files
}

/// Every model documented in schema files under `dirs`, in file order
pub fn model_schemas_from_yaml(dirs: &[PathBuf]) -> Result<Vec<ModelSchema>> {
    let mut models = Vec::new();
    for file in schema_files(dirs) {
        let found = models_in_file(&file)?;
        tracing::debug!("Found {} model(s) in {}", found.len(), file.display());
        models.extend(found);
    }
    Ok(models)
}
