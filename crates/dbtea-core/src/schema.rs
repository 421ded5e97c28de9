//! dbt model schema records
//!
//! These mirror the `models:` entries of a dbt schema file. Known keys are
//! typed; everything else is carried verbatim, in document order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A column declared on a dbt model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Column name
    pub name: String,

    /// Physical or LookML type name
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub column_type: Option<String>,

    /// Any other keys (description, data_type, tests, meta, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: None,
            extra: Map::new(),
        }
    }

    pub fn with_type(mut self, column_type: impl Into<String>) -> Self {
        self.column_type = Some(column_type.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Warehouse data type declared via `data_type`, if any
    pub fn data_type(&self) -> Option<&str> {
        self.extra.get("data_type").and_then(Value::as_str)
    }
}

/// A dbt model as described in schema files or the manifest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSchema {
    /// Model name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Physical table name override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    /// Declared columns, in order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<ColumnSchema>>,

    /// Namespaced metadata (`looker_*` / `lookml_*` keys are LookML hints)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,

    /// Any other keys
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ModelSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_columns(mut self, columns: Vec<ColumnSchema>) -> Self {
        self.columns = Some(columns);
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Find a column by name
    pub fn find_column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.as_ref()?.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn deserialize_keeps_unknown_keys_in_order() {
        let json = r#"{
            "name": "orders",
            "description": "All orders",
            "columns": [
                {"name": "id", "type": "integer", "tests": ["unique"], "description": "pk"}
            ],
            "meta": {"looker_label": "Orders"},
            "config": {"materialized": "table"}
        }"#;

        let model: ModelSchema = serde_json::from_str(json).unwrap();
        assert_eq!(model.name.as_deref(), Some("orders"));
        assert_eq!(model.extra.keys().collect::<Vec<_>>(), vec!["description", "config"]);

        let id = model.find_column("id").unwrap();
        assert_eq!(id.column_type.as_deref(), Some("integer"));
        assert_eq!(id.extra.keys().collect::<Vec<_>>(), vec!["tests", "description"]);
    }

    #[test]
    fn column_without_type() {
        let column: ColumnSchema =
            serde_json::from_str(r#"{"name": "amount", "data_type": "numeric"}"#).unwrap();
        assert!(column.column_type.is_none());
        assert_eq!(column.data_type(), Some("numeric"));
    }
}
