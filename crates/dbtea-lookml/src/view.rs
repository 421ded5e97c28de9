//! Hand-assembled LookML views and models

use dbtea_core::{DbteaError, Result};
use serde_json::{Map, Value};

use crate::emit::dump;
use crate::properties::ViewProperty;

fn insert_list(map: &mut Map<String, Value>, key: &str, items: &[Value]) {
    if !items.is_empty() {
        map.insert(key.to_string(), Value::Array(items.to_vec()));
    }
}

fn insert_str(map: &mut Map<String, Value>, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        map.insert(key.to_string(), Value::String(value.clone()));
    }
}

/// Builder for a single LookML view
#[derive(Debug, Clone, PartialEq)]
pub struct LookmlView {
    pub name: String,
    pub label: Option<String>,
    pub extends: Option<String>,
    pub extension_is_required: bool,
    pub sql_table_name: Option<String>,
    pub derived_table: Option<Value>,
    pub required_access_grants: Vec<String>,
    pub include_suggestions: bool,
    pub parameters: Vec<Value>,
    pub dimensions: Vec<Value>,
    pub dimension_groups: Vec<Value>,
    pub measures: Vec<Value>,
    pub sets: Vec<Value>,
}

impl LookmlView {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            extends: None,
            extension_is_required: false,
            sql_table_name: None,
            derived_table: None,
            required_access_grants: Vec::new(),
            include_suggestions: true,
            parameters: Vec::new(),
            dimensions: Vec::new(),
            dimension_groups: Vec::new(),
            measures: Vec::new(),
            sets: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_extends(mut self, extends: impl Into<String>) -> Self {
        self.extends = Some(extends.into());
        self
    }

    pub fn extension_required(mut self) -> Self {
        self.extension_is_required = true;
        self
    }

    pub fn with_sql_table_name(mut self, table: impl Into<String>) -> Self {
        self.sql_table_name = Some(table.into());
        self
    }

    pub fn with_derived_table(mut self, derived_table: Value) -> Self {
        self.derived_table = Some(derived_table);
        self
    }

    pub fn with_required_access_grants(mut self, grants: Vec<String>) -> Self {
        self.required_access_grants = grants;
        self
    }

    pub fn without_suggestions(mut self) -> Self {
        self.include_suggestions = false;
        self
    }

    pub fn with_parameters(mut self, parameters: Vec<Value>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_dimensions(mut self, dimensions: Vec<Value>) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn with_dimension_groups(mut self, dimension_groups: Vec<Value>) -> Self {
        self.dimension_groups = dimension_groups;
        self
    }

    pub fn with_measures(mut self, measures: Vec<Value>) -> Self {
        self.measures = measures;
        self
    }

    pub fn with_sets(mut self, sets: Vec<Value>) -> Self {
        self.sets = sets;
        self
    }

    /// View properties as a JSON object
    ///
    /// A view must name its source through `sql_table_name`, `derived_table`
    /// or `extends`.
    pub fn assemble(&self) -> Result<Value> {
        tracing::info!("Creating LookML View: {}", self.name);

        if self.sql_table_name.is_none() && self.derived_table.is_none() && self.extends.is_none() {
            return Err(DbteaError::invalid_input(
                "missing-lookml-view-properties",
                "Missing Necessary LookML View Properties",
                format!(
                    "View {} must specify either a `sql_table_name`, `derived_table` or `extends` \
                     in order to properly specify the view source",
                    self.name
                ),
            ));
        }

        let mut view = Map::new();
        view.insert(ViewProperty::Name.to_string(), Value::String(self.name.clone()));
        insert_str(&mut view, ViewProperty::Label.as_str(), &self.label);
        insert_str(&mut view, ViewProperty::Extends.as_str(), &self.extends);
        if self.extension_is_required {
            view.insert(ViewProperty::Extension.to_string(), Value::String("required".to_string()));
        }
        insert_str(&mut view, ViewProperty::SqlTableName.as_str(), &self.sql_table_name);
        if let Some(derived_table) = &self.derived_table {
            view.insert(ViewProperty::DerivedTable.to_string(), derived_table.clone());
        }
        if !self.required_access_grants.is_empty() {
            let grants = self
                .required_access_grants
                .iter()
                .cloned()
                .map(Value::String)
                .collect();
            view.insert(ViewProperty::RequiredAccessGrants.to_string(), Value::Array(grants));
        }
        if !self.include_suggestions {
            view.insert(ViewProperty::Suggestions.to_string(), Value::String("no".to_string()));
        }

        insert_list(&mut view, ViewProperty::Parameters.as_str(), &self.parameters);
        insert_list(&mut view, ViewProperty::Dimensions.as_str(), &self.dimensions);
        insert_list(&mut view, ViewProperty::DimensionGroups.as_str(), &self.dimension_groups);
        insert_list(&mut view, ViewProperty::Measures.as_str(), &self.measures);
        insert_list(&mut view, ViewProperty::Sets.as_str(), &self.sets);

        Ok(Value::Object(view))
    }

    /// `{"views": [view]}` document
    pub fn document(&self) -> Result<Value> {
        let mut document = Map::new();
        document.insert("views".to_string(), Value::Array(vec![self.assemble()?]));
        Ok(Value::Object(document))
    }

    /// Rendered LookML text
    pub fn to_lookml(&self) -> Result<String> {
        Ok(dump(&self.document()?))
    }
}

/// Builder for a LookML model file
#[derive(Debug, Clone, PartialEq)]
pub struct LookmlModel {
    pub name: String,
    pub connection: Option<String>,
    pub label: Option<String>,
    pub includes: Vec<String>,
    pub persist_for: Option<String>,
    pub persist_with: Option<String>,
    pub fiscal_month_offset: Option<i64>,
    pub week_start_day: Option<String>,
    pub case_sensitive: bool,
    pub datagroups: Vec<Value>,
    pub access_grants: Vec<Value>,
    pub explores: Vec<Value>,
    pub named_value_formats: Vec<Value>,
    pub map_layers: Vec<Value>,
    pub tests: Vec<Value>,
}

impl LookmlModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            connection: None,
            label: None,
            includes: Vec::new(),
            persist_for: None,
            persist_with: None,
            fiscal_month_offset: None,
            week_start_day: None,
            case_sensitive: true,
            datagroups: Vec::new(),
            access_grants: Vec::new(),
            explores: Vec::new(),
            named_value_formats: Vec::new(),
            map_layers: Vec::new(),
            tests: Vec::new(),
        }
    }

    pub fn with_connection(mut self, connection: impl Into<String>) -> Self {
        self.connection = Some(connection.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_includes(mut self, includes: Vec<String>) -> Self {
        self.includes = includes;
        self
    }

    pub fn with_persist_for(mut self, persist_for: impl Into<String>) -> Self {
        self.persist_for = Some(persist_for.into());
        self
    }

    pub fn with_persist_with(mut self, datagroup: impl Into<String>) -> Self {
        self.persist_with = Some(datagroup.into());
        self
    }

    pub fn with_fiscal_month_offset(mut self, offset: i64) -> Self {
        self.fiscal_month_offset = Some(offset);
        self
    }

    pub fn with_week_start_day(mut self, day: impl Into<String>) -> Self {
        self.week_start_day = Some(day.into());
        self
    }

    pub fn case_insensitive(mut self) -> Self {
        self.case_sensitive = false;
        self
    }

    pub fn with_datagroups(mut self, datagroups: Vec<Value>) -> Self {
        self.datagroups = datagroups;
        self
    }

    pub fn with_access_grants(mut self, access_grants: Vec<Value>) -> Self {
        self.access_grants = access_grants;
        self
    }

    pub fn with_explores(mut self, explores: Vec<Value>) -> Self {
        self.explores = explores;
        self
    }

    pub fn with_named_value_formats(mut self, formats: Vec<Value>) -> Self {
        self.named_value_formats = formats;
        self
    }

    pub fn with_map_layers(mut self, map_layers: Vec<Value>) -> Self {
        self.map_layers = map_layers;
        self
    }

    pub fn with_tests(mut self, tests: Vec<Value>) -> Self {
        self.tests = tests;
        self
    }

    /// Model document: settings first, then body lists
    pub fn assemble(&self) -> Value {
        tracing::info!("Creating LookML Model: {}", self.name);

        let mut model = Map::new();
        insert_str(&mut model, "connection", &self.connection);
        insert_str(&mut model, "label", &self.label);
        if !self.includes.is_empty() {
            let includes = self.includes.iter().cloned().map(Value::String).collect();
            model.insert("includes".to_string(), Value::Array(includes));
        }
        insert_str(&mut model, "persist_for", &self.persist_for);
        insert_str(&mut model, "persist_with", &self.persist_with);
        if let Some(offset) = self.fiscal_month_offset.filter(|o| *o != 0) {
            model.insert("fiscal_month_offset".to_string(), Value::from(offset));
        }
        insert_str(&mut model, "week_start_day", &self.week_start_day);
        if !self.case_sensitive {
            model.insert("case_sensitive".to_string(), Value::String("no".to_string()));
        }

        insert_list(&mut model, "datagroups", &self.datagroups);
        insert_list(&mut model, "access_grants", &self.access_grants);
        insert_list(&mut model, "explores", &self.explores);
        insert_list(&mut model, "named_value_formats", &self.named_value_formats);
        insert_list(&mut model, "map_layers", &self.map_layers);
        insert_list(&mut model, "tests", &self.tests);

        Value::Object(model)
    }

    pub fn to_lookml(&self) -> String {
        dump(&self.assemble())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbtea_core::ErrorKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn view_requires_a_source() {
        let err = LookmlView::new("orphan").with_label("Orphan").assemble().unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
        assert_eq!(err.name, "missing-lookml-view-properties");
        assert_eq!(err.exit_code(), 100);
    }

    #[test]
    fn view_properties_in_lookml_order() {
        let view = LookmlView::new("orders")
            .with_sets(vec![json!({"name": "detail", "fields": ["id"]})])
            .with_dimensions(vec![json!({"name": "id", "type": "number", "sql": "${TABLE}.id"})])
            .with_sql_table_name("analytics.orders")
            .with_extends("base_orders")
            .extension_required()
            .without_suggestions()
            .with_label("Orders");

        assert_eq!(
            view.assemble().unwrap(),
            json!({
                "name": "orders",
                "label": "Orders",
                "extends": "base_orders",
                "extension": "required",
                "sql_table_name": "analytics.orders",
                "suggestions": "no",
                "dimensions": [{"name": "id", "type": "number", "sql": "${TABLE}.id"}],
                "sets": [{"name": "detail", "fields": ["id"]}]
            })
        );
    }

    #[test]
    fn extends_alone_is_a_source() {
        let text = LookmlView::new("child").with_extends("parent").to_lookml().unwrap();
        assert_eq!(text, "view: child {\n  extends: parent\n}\n");
    }

    #[test]
    fn model_settings_and_body() {
        let model = LookmlModel::new("ecommerce")
            .with_connection("warehouse")
            .with_includes(vec!["/views/*.view.lkml".to_string()])
            .with_explores(vec![json!({"name": "orders"})])
            .with_fiscal_month_offset(0)
            .case_insensitive();

        assert_eq!(
            model.assemble(),
            json!({
                "connection": "warehouse",
                "includes": ["/views/*.view.lkml"],
                "case_sensitive": "no",
                "explores": [{"name": "orders"}]
            })
        );
        assert!(model.to_lookml().contains("explore: orders {\n}"));
    }
}
