//! dbt model schema to LookML view translation
//!
//! Each model becomes one view record. Columns are split into dimensions and
//! dimension groups, every field gets a `${TABLE}.<column>` SQL reference,
//! `looker_*`/`lookml_*` meta keys are promoted to view properties, and
//! anything LookML would reject is dropped and reported.
//!
//! Output records are built fresh from borrowed input; the input slice is
//! never modified.

use dbtea_core::{ColumnSchema, Diagnostic, DiagnosticCode, ModelSchema, Severity};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::properties::{is_dimension_group_type, DimensionProperty, ViewProperty};
use crate::types::{is_time_data_type, lookml_type_for};

/// Prefix of every synthesized field SQL reference
pub const TABLE_REFERENCE: &str = "${TABLE}.";

/// Meta key prefixes promoted to view properties
pub const META_PREFIXES: &[&str] = &["looker_", "lookml_"];

/// The one warehouse type grouped by default; matched exactly
pub const TIMESTAMP_FIELD_TYPE: &str = "timestamp";

/// Receives diagnostics as the translator produces them
pub trait TranslationObserver {
    fn observe(&mut self, diagnostic: &Diagnostic);
}

impl<F: FnMut(&Diagnostic)> TranslationObserver for F {
    fn observe(&mut self, diagnostic: &Diagnostic) {
        self(diagnostic)
    }
}

/// Forwards diagnostics to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl TranslationObserver for TracingObserver {
    fn observe(&mut self, diagnostic: &Diagnostic) {
        match diagnostic.severity {
            Severity::Info => tracing::debug!(code = %diagnostic.code, "{}", diagnostic.message),
            Severity::Warn => tracing::warn!(code = %diagnostic.code, "{}", diagnostic.message),
            Severity::Error => tracing::error!(code = %diagnostic.code, "{}", diagnostic.message),
        }
    }
}

/// A dimension or dimension group
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldRecord {
    properties: Map<String, Value>,
}

impl FieldRecord {
    pub fn get(&self, property: DimensionProperty) -> Option<&Value> {
        self.properties.get(property.as_str())
    }

    pub fn name(&self) -> Option<&str> {
        self.get(DimensionProperty::Name).and_then(Value::as_str)
    }

    pub fn sql(&self) -> Option<&str> {
        self.get(DimensionProperty::Sql).and_then(Value::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }
}

/// A LookML view
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ViewRecord {
    properties: Map<String, Value>,
}

impl ViewRecord {
    pub fn get(&self, property: ViewProperty) -> Option<&Value> {
        self.properties.get(property.as_str())
    }

    pub fn name(&self) -> Option<&str> {
        self.get(ViewProperty::Name).and_then(Value::as_str)
    }

    pub fn sql_table_name(&self) -> Option<&str> {
        self.get(ViewProperty::SqlTableName).and_then(Value::as_str)
    }

    /// Field records listed under `dimensions`
    pub fn dimensions(&self) -> Vec<&Map<String, Value>> {
        self.field_list(ViewProperty::Dimensions)
    }

    /// Field records listed under `dimension_groups`
    pub fn dimension_groups(&self) -> Vec<&Map<String, Value>> {
        self.field_list(ViewProperty::DimensionGroups)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// View as a JSON object
    pub fn to_value(&self) -> Value {
        Value::Object(self.properties.clone())
    }

    fn field_list(&self, property: ViewProperty) -> Vec<&Map<String, Value>> {
        self.get(property)
            .and_then(Value::as_array)
            .map(|fields| fields.iter().filter_map(Value::as_object).collect())
            .unwrap_or_default()
    }
}

/// Result of a translation run
///
/// Serializes as `{"views": [...]}`; diagnostics stay out of the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Translation {
    /// Views, in input order
    pub views: Vec<ViewRecord>,

    /// Every property dropped or decision taken along the way
    #[serde(skip)]
    pub diagnostics: Vec<Diagnostic>,
}

impl Translation {
    /// `{"views": [...]}` document
    pub fn to_value(&self) -> Value {
        let views = self.views.iter().map(ViewRecord::to_value).collect();
        let mut document = Map::new();
        document.insert("views".to_string(), Value::Array(views));
        Value::Object(document)
    }

    /// Properties that were dropped for failing an allow-list
    pub fn stripped_properties(&self) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.code.is_stripped_property())
            .collect()
    }
}

/// Translation switches; all off by default
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslateOptions {
    /// Derive a LookML `type` from `data_type` for columns without one
    pub infer_types: bool,

    /// Treat zip/postal code columns as `zipcode` when inferring types
    pub include_postal_code: bool,

    /// Prefix `sql_table_name` with the model's `database`/`schema`
    pub qualify_table_names: bool,

    /// Also bucket warehouse time types (`datetime`, `TIMESTAMP_NTZ`,
    /// `timestamp(6)`, ...) into `dimension_groups`
    pub group_warehouse_time_types: bool,
}

/// Converts dbt model schemas into LookML view records
#[derive(Debug, Clone, Default)]
pub struct SchemaTranslator {
    options: TranslateOptions,
}

impl SchemaTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: TranslateOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> TranslateOptions {
        self.options
    }

    /// Translate `models` into views, reporting each diagnostic to `observer`
    pub fn translate(
        &self,
        models: &[ModelSchema],
        observer: &mut dyn TranslationObserver,
    ) -> Translation {
        let mut diagnostics = Vec::new();
        let mut emit = |diagnostic: Diagnostic| {
            observer.observe(&diagnostic);
            diagnostics.push(diagnostic);
        };

        let mut seen = HashSet::new();
        let mut views = Vec::with_capacity(models.len());

        for model in models {
            if let Some(name) = model.name.as_deref() {
                if !seen.insert(name) {
                    emit(
                        Diagnostic::new(
                            DiagnosticCode::LookmlDuplicateViewName,
                            Severity::Warn,
                            format!("Multiple models translate to a view named {}", name),
                        )
                        .with_view(Some(name)),
                    );
                }
            }

            views.push(self.translate_model(model, &mut emit));
        }

        Translation { views, diagnostics }
    }

    fn translate_model(&self, model: &ModelSchema, emit: &mut dyn FnMut(Diagnostic)) -> ViewRecord {
        let view_name = model.name.as_deref();
        let mut candidate = Map::new();

        if let Some(name) = &model.name {
            candidate.insert("name".to_string(), Value::String(name.clone()));
        }
        if let Some(table) = self.sql_table_name(model) {
            candidate.insert("sql_table_name".to_string(), Value::String(table));
        }
        if let Some(alias) = &model.alias {
            candidate.insert("alias".to_string(), Value::String(alias.clone()));
        }
        for (key, value) in &model.extra {
            if !candidate.contains_key(key) {
                candidate.insert(key.clone(), value.clone());
            }
        }
        if let Some(meta) = &model.meta {
            candidate.insert("meta".to_string(), Value::Object(meta.clone()));
        }

        if let Some(columns) = &model.columns {
            let mut dimensions = Vec::new();
            let mut dimension_groups = Vec::new();

            for column in columns {
                let (field, is_group) = self.translate_column(column, view_name, emit);
                if is_group {
                    dimension_groups.push(Value::Object(field.properties));
                } else {
                    dimensions.push(Value::Object(field.properties));
                }
            }

            candidate.insert("dimensions".to_string(), Value::Array(dimensions));
            candidate.insert("dimension_groups".to_string(), Value::Array(dimension_groups));
        }

        if let Some(meta) = &model.meta {
            for (key, value) in meta {
                if let Some(property) = strip_meta_prefix(key) {
                    candidate.insert(property.to_string(), value.clone());
                }
            }
        }

        let mut properties = Map::new();
        for (key, value) in candidate {
            if ViewProperty::is_valid(&key) {
                properties.insert(key, value);
            } else {
                emit(
                    Diagnostic::new(
                        DiagnosticCode::LookmlInvalidViewProperty,
                        Severity::Info,
                        format!(
                            "Removing property invalid for LookML for view {}: {}",
                            view_name.unwrap_or("<unnamed>"),
                            key
                        ),
                    )
                    .with_view(view_name)
                    .with_property(key),
                );
            }
        }

        ViewRecord { properties }
    }

    fn translate_column(
        &self,
        column: &ColumnSchema,
        view_name: Option<&str>,
        emit: &mut dyn FnMut(Diagnostic),
    ) -> (FieldRecord, bool) {
        let mut properties = Map::new();
        properties.insert("name".to_string(), Value::String(column.name.clone()));

        let field_type = match (&column.column_type, column.data_type()) {
            (Some(explicit), _) => Some(explicit.clone()),
            (None, Some(data_type)) if self.options.infer_types => {
                let inferred =
                    lookml_type_for(&column.name, data_type, self.options.include_postal_code);
                emit(
                    Diagnostic::new(
                        DiagnosticCode::LookmlInferredFieldType,
                        Severity::Info,
                        format!(
                            "Field {} with data type {} mapped to LookML type {}",
                            column.name, data_type, inferred
                        ),
                    )
                    .with_view(view_name)
                    .with_field(column.name.clone()),
                );
                Some(inferred.to_string())
            }
            _ => None,
        };
        if let Some(field_type) = &field_type {
            properties.insert("type".to_string(), Value::String(field_type.clone()));
        }

        for (key, value) in &column.extra {
            if DimensionProperty::is_valid(key) {
                properties.insert(key.clone(), value.clone());
            } else {
                emit(
                    Diagnostic::new(
                        DiagnosticCode::LookmlInvalidDimensionProperty,
                        Severity::Info,
                        format!(
                            "Removing property invalid for LookML for dimension {}.{}: {}",
                            view_name.unwrap_or("<unnamed>"),
                            column.name,
                            key
                        ),
                    )
                    .with_view(view_name)
                    .with_field(column.name.clone())
                    .with_property(key.clone()),
                );
            }
        }

        properties.insert(
            "sql".to_string(),
            Value::String(format!("{}{}", TABLE_REFERENCE, column.name)),
        );

        let is_group = field_type
            .as_deref()
            .is_some_and(|t| self.buckets_as_dimension_group(t));
        (FieldRecord { properties }, is_group)
    }

    /// `time`/`duration`, the exact `timestamp` type, and with
    /// `group_warehouse_time_types` any warehouse time type
    fn buckets_as_dimension_group(&self, field_type: &str) -> bool {
        is_dimension_group_type(field_type)
            || field_type == TIMESTAMP_FIELD_TYPE
            || (self.options.group_warehouse_time_types && is_time_data_type(field_type))
    }

    /// `alias`, falling back to `name`; optionally schema-qualified
    fn sql_table_name(&self, model: &ModelSchema) -> Option<String> {
        let table = model.alias.as_ref().or(model.name.as_ref())?;

        if !self.options.qualify_table_names {
            return Some(table.clone());
        }

        let parts: Vec<&str> = ["database", "schema"]
            .iter()
            .filter_map(|key| model.extra.get(*key).and_then(Value::as_str))
            .filter(|part| !part.is_empty())
            .chain(std::iter::once(table.as_str()))
            .collect();
        Some(parts.join("."))
    }
}


/// `looker_label` -> `label`; `None` for keys without a LookML prefix
fn strip_meta_prefix(key: &str) -> Option<&str> {
    META_PREFIXES
        .iter()
        .find_map(|prefix| key.strip_prefix(prefix))
}

/// Translate with default options, logging diagnostics through `tracing`
pub fn translate(models: &[ModelSchema]) -> Translation {
    SchemaTranslator::new().translate(models, &mut TracingObserver)
}
