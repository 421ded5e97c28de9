//! dbt project access
//!
//! This crate handles:
//! - Locating the dbt project and reading dbt_project.yml
//! - Parsing target artifacts (manifest.json and friends)
//! - Collecting model schemas from schema YAML files
//! - Running dbt CLI commands

pub mod manifest;
pub mod packages;
pub mod project;
pub mod runner;
pub mod schema_files;

pub use manifest::{ColumnDefinition, Manifest, ManifestMetadata, ManifestNode, NodeConfig};
pub use packages::{declared_packages, require_codegen, CODEGEN_PACKAGES, PACKAGES_FILE};
pub use project::{locate_project, locate_project_from, Artifact, DbtProject, DBT_PROJECT_FILE};
pub use runner::{DbtCommand, DbtFlag, DbtOutput, DbtRunner};
pub use schema_files::{model_schemas_from_yaml, models_in_file, parse_yaml_file};
