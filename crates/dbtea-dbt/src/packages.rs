//! packages.yml checks

use dbtea_core::{DbteaError, Result};
use serde::Deserialize;
use std::path::Path;

use crate::schema_files::parse_yaml_file;

pub const PACKAGES_FILE: &str = "packages.yml";

/// Hub names the codegen package has been published under
pub const CODEGEN_PACKAGES: &[&str] = &["dbt-labs/codegen", "fishtown-analytics/codegen"];

#[derive(Debug, Default, Deserialize)]
struct PackagesFile {
    #[serde(default)]
    packages: Vec<PackageEntry>,
}

#[derive(Debug, Deserialize)]
struct PackageEntry {
    #[serde(default)]
    package: Option<String>,
}

/// Hub package names declared in a packages.yml
pub fn declared_packages(path: &Path) -> Result<Vec<String>> {
    let value = parse_yaml_file(path)?;
    if value.is_null() {
        return Ok(Vec::new());
    }

    let file: PackagesFile = serde_yaml::from_value(value).map_err(|e| {
        DbteaError::invalid_input(
            "invalid-yaml-file",
            "Failed to parse YAML file",
            format!("{}: {}", path.display(), e),
        )
    })?;
    Ok(file.packages.into_iter().filter_map(|p| p.package).collect())
}

/// Fail unless the project at `root` pulls in the codegen package
pub fn require_codegen(root: &Path) -> Result<()> {
    let path = root.join(PACKAGES_FILE);
    if !path.is_file() {
        return Err(DbteaError::invalid_input(
            "missing-packages-file",
            "No packages.yml file in dbt project",
            format!("You must have a {} file specified in your project", path.display()),
        ));
    }

    let packages = declared_packages(&path)?;
    if packages.iter().any(|p| CODEGEN_PACKAGES.contains(&p.as_str())) {
        return Ok(());
    }

    Err(DbteaError::invalid_input(
        "missing-codegen-package",
        "codegen package is not installed",
        format!(
            "You must include the package '{}' in {} to codegen in bulk",
            CODEGEN_PACKAGES[0],
            path.display()
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbtea_core::ErrorKind;
    use tempfile::TempDir;

    #[test]
    fn fixture_declares_codegen() {
        let root = Path::new("../../fixtures/jaffle-shop");
        assert!(require_codegen(root).is_ok());
        assert_eq!(
            declared_packages(&root.join(PACKAGES_FILE)).unwrap(),
            vec!["dbt-labs/codegen", "dbt-labs/dbt_utils"]
        );
    }

    #[test]
    fn legacy_codegen_name_accepted() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(PACKAGES_FILE),
            "packages:\n  - package: fishtown-analytics/codegen\n    version: 0.3.2\n",
        )
        .unwrap();
        assert!(require_codegen(dir.path()).is_ok());
    }

    #[test]
    fn missing_codegen() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(PACKAGES_FILE),
            "packages:\n  - git: https://github.com/example/pkg.git\n  - package: dbt-labs/dbt_utils\n",
        )
        .unwrap();

        let err = require_codegen(dir.path()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
        assert_eq!(err.name, "missing-codegen-package");
    }

    #[test]
    fn missing_packages_file() {
        let dir = TempDir::new().unwrap();
        let err = require_codegen(dir.path()).unwrap_err();
        assert_eq!(err.name, "missing-packages-file");
    }
}
