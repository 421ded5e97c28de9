//! dbt manifest.json parsing
//!
//! Parses the dbt-generated manifest.json to extract model nodes and their
//! documented columns.

use dbtea_core::{ColumnSchema, DbteaError, ModelSchema, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// dbt manifest.json structure (subset of fields we care about)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Metadata about the manifest
    #[serde(default)]
    pub metadata: ManifestMetadata,

    /// Model, test, seed and snapshot nodes keyed by unique_id
    #[serde(default)]
    pub nodes: BTreeMap<String, ManifestNode>,
}

impl Manifest {
    /// Load manifest from file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| DbteaError::io(path, e))?;

        Self::from_json(&contents).map_err(|mut e| {
            e.detail = format!("{}: {}", path.display(), e.detail);
            e
        })
    }

    /// Parse manifest from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            DbteaError::invalid_input(
                "invalid-dbt-manifest",
                "Failed to parse dbt manifest",
                e.to_string(),
            )
        })
    }

    /// Model nodes, in unique_id order
    pub fn models(&self) -> impl Iterator<Item = &ManifestNode> {
        self.nodes.values().filter(|node| node.is_model())
    }

    /// Get a specific node by unique_id
    pub fn get_node(&self, unique_id: &str) -> Option<&ManifestNode> {
        self.nodes.get(unique_id)
    }

    /// Schema records for every enabled model, in unique_id order
    pub fn model_schemas(&self) -> Vec<ModelSchema> {
        self.models()
            .filter(|node| node.config.enabled)
            .map(ManifestNode::to_model_schema)
            .collect()
    }
}

/// Manifest metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestMetadata {
    #[serde(default)]
    pub dbt_schema_version: String,
    #[serde(default)]
    pub dbt_version: String,
    #[serde(default)]
    pub generated_at: String,
    #[serde(default)]
    pub invocation_id: Option<String>,
}

/// A node in the manifest (model, test, snapshot, etc.)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestNode {
    /// Unique identifier (e.g., "model.my_project.users")
    pub unique_id: String,

    /// Node name (e.g., "users")
    pub name: String,

    /// Resource type (model, test, snapshot, etc.)
    pub resource_type: String,

    /// Package name
    #[serde(default)]
    pub package_name: String,

    /// Original file path
    #[serde(default)]
    pub original_file_path: String,

    /// Database name
    #[serde(default)]
    pub database: Option<String>,

    /// Schema name
    #[serde(default)]
    pub schema: Option<String>,

    /// Alias (output table name)
    #[serde(default)]
    pub alias: Option<String>,

    /// Node configuration
    #[serde(default)]
    pub config: NodeConfig,

    /// Description
    #[serde(default)]
    pub description: String,

    /// Node-level meta
    #[serde(default)]
    pub meta: Map<String, Value>,

    /// Column definitions, in declaration order
    #[serde(default, deserialize_with = "ordered_columns")]
    pub columns: Vec<ColumnDefinition>,

    /// Fully qualified name
    #[serde(default)]
    pub fqn: Vec<String>,
}

impl ManifestNode {
    pub fn is_model(&self) -> bool {
        self.resource_type == "model"
    }

    /// Node meta overlaid with `config.meta`
    pub fn merged_meta(&self) -> Map<String, Value> {
        let mut meta = self.meta.clone();
        for (key, value) in &self.config.meta {
            meta.insert(key.clone(), value.clone());
        }
        meta
    }

    /// The node as a schema record
    ///
    /// `database`/`schema` are carried as extra properties so table names can
    /// be qualified later.
    pub fn to_model_schema(&self) -> ModelSchema {
        let mut model = ModelSchema::new(self.name.clone());
        model.alias = self.alias.clone().filter(|alias| !alias.is_empty());

        if !self.description.is_empty() {
            model = model.with_property("description", self.description.clone());
        }
        if let Some(database) = &self.database {
            model = model.with_property("database", database.clone());
        }
        if let Some(schema) = &self.schema {
            model = model.with_property("schema", schema.clone());
        }

        let meta = self.merged_meta();
        if !meta.is_empty() {
            model.meta = Some(meta);
        }

        if !self.columns.is_empty() {
            model.columns = Some(self.columns.iter().map(ColumnDefinition::to_column_schema).collect());
        }
        model
    }
}

/// Manifest columns are a JSON object; keep them as an ordered list
fn ordered_columns<'de, D>(deserializer: D) -> std::result::Result<Vec<ColumnDefinition>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Map::<String, Value>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(_, value)| serde_json::from_value(value).map_err(serde::de::Error::custom))
        .collect()
}

/// Node configuration (from dbt_project.yml or model config)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Whether the node is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Materialization type
    #[serde(default)]
    pub materialized: Option<String>,

    /// Config-level meta
    #[serde(default)]
    pub meta: Map<String, Value>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            materialized: None,
            meta: Map::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Column definition from manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Column name
    pub name: String,

    /// Description
    #[serde(default)]
    pub description: String,

    /// Warehouse data type, when declared or documented
    #[serde(default)]
    pub data_type: Option<String>,

    #[serde(default)]
    pub meta: Map<String, Value>,

    #[serde(default)]
    pub tags: Vec<String>,
}

impl ColumnDefinition {
    pub fn to_column_schema(&self) -> ColumnSchema {
        let mut column = ColumnSchema::new(self.name.clone());
        if let Some(data_type) = &self.data_type {
            column = column.with_property("data_type", data_type.clone());
        }
        if !self.description.is_empty() {
            column = column.with_property("description", self.description.clone());
        }
        column
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbtea_core::ErrorKind;
    use pretty_assertions::assert_eq;

    const FIXTURE: &str = "../../fixtures/jaffle-shop/target/manifest.json";

    #[test]
    fn parse_fixture_manifest() {
        let manifest = Manifest::from_file(Path::new(FIXTURE)).unwrap();

        assert_eq!(manifest.metadata.dbt_version, "1.7.0");
        assert_eq!(manifest.models().count(), 3);

        let orders = manifest.get_node("model.jaffle_shop.orders").unwrap();
        assert_eq!(orders.alias.as_deref(), Some("fct_orders"));
        let names: Vec<&str> = orders.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["order_id", "status", "ordered_at"]);
    }

    #[test]
    fn model_schemas_skip_disabled_and_tests() {
        let manifest = Manifest::from_file(Path::new(FIXTURE)).unwrap();
        let schemas = manifest.model_schemas();

        let names: Vec<&str> = schemas.iter().filter_map(|m| m.name.as_deref()).collect();
        assert_eq!(names, vec!["orders", "stg_customers"]);

        let orders = &schemas[0];
        assert_eq!(orders.alias.as_deref(), Some("fct_orders"));
        assert_eq!(orders.extra.get("schema"), Some(&Value::from("marts")));

        let meta = orders.meta.as_ref().unwrap();
        assert_eq!(meta.get("looker_label"), Some(&Value::from("Orders")));
        assert_eq!(meta.get("owner"), Some(&Value::from("analytics")));

        let status = orders.find_column("status").unwrap();
        assert_eq!(status.data_type(), Some("varchar"));
        assert_eq!(status.extra.get("description"), Some(&Value::from("Current order status")));
    }

    #[test]
    fn config_meta_wins() {
        let node: ManifestNode = serde_json::from_str(
            r#"{
                "unique_id": "model.p.m", "name": "m", "resource_type": "model",
                "meta": {"looker_label": "Node"},
                "config": {"meta": {"looker_label": "Config"}}
            }"#,
        )
        .unwrap();

        assert_eq!(node.merged_meta().get("looker_label"), Some(&Value::from("Config")));
        assert!(node.config.enabled);
    }

    #[test]
    fn invalid_json_is_invalid_input() {
        let err = Manifest::from_json("{ not json").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
        assert_eq!(err.name, "invalid-dbt-manifest");
    }
}
