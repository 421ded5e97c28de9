//! End-to-end tests: dbt schema records through translation to LookML text

use dbtea_core::{ColumnSchema, Diagnostic, DiagnosticCode, ModelSchema, Severity};
use dbtea_lookml::{dump, load, SchemaTranslator, TranslateOptions};
use pretty_assertions::assert_eq;
use serde_json::json;

fn orders_model() -> ModelSchema {
    ModelSchema::new("orders")
        .with_alias("fct_orders")
        .with_property("description", "One row per order")
        .with_meta("looker_label", "Orders")
        .with_meta("owner", "analytics")
        .with_columns(vec![
            ColumnSchema::new("id")
                .with_type("number")
                .with_property("primary_key", true)
                .with_property("tests", json!(["unique", "not_null"])),
            ColumnSchema::new("created_at").with_property("data_type", "timestamp_ntz"),
            ColumnSchema::new("is_paid").with_property("data_type", "boolean"),
        ])
}

#[test]
fn schema_to_lookml_text() {
    let translator = SchemaTranslator::with_options(TranslateOptions {
        infer_types: true,
        ..TranslateOptions::default()
    });

    let mut seen: Vec<Diagnostic> = Vec::new();
    let mut observer = |d: &Diagnostic| seen.push(d.clone());
    let translation = translator.translate(&[orders_model()], &mut observer);

    let expected = "\
view: orders {
  sql_table_name: fct_orders ;;

  dimension: id {
    type: number
    primary_key: yes
    sql: ${TABLE}.id ;;
  }

  dimension: is_paid {
    type: yesno
    sql: ${TABLE}.is_paid ;;
  }

  dimension_group: created_at {
    type: time
    sql: ${TABLE}.created_at ;;
  }

  label: \"Orders\"
}
";
    assert_eq!(dump(&translation.to_value()), expected);

    assert_eq!(seen, translation.diagnostics);
    let stripped: Vec<&str> = translation
        .stripped_properties()
        .iter()
        .filter_map(|d| d.property.as_deref())
        .collect();
    assert!(stripped.contains(&"description"));
    assert!(stripped.contains(&"alias"));
    assert!(stripped.contains(&"meta"));
    assert!(stripped.contains(&"tests"));
    assert!(stripped.contains(&"data_type"));
    assert!(translation
        .diagnostics
        .iter()
        .any(|d| d.code == DiagnosticCode::LookmlInferredFieldType && d.severity == Severity::Info));
}

#[test]
fn rendered_views_parse_back() {
    let models = vec![
        orders_model(),
        ModelSchema::new("users").with_columns(vec![ColumnSchema::new("email").with_type("string")]),
    ];
    let translation = dbtea_lookml::translate(&models);

    let parsed = load(&dump(&translation.to_value())).unwrap();
    let views = parsed["views"].as_array().unwrap();

    assert_eq!(views.len(), 2);
    assert_eq!(views[0]["name"], "orders");
    assert_eq!(views[0]["dimensions"][0]["primary_key"], "yes");
    assert_eq!(views[1]["dimensions"], json!([
        {"name": "email", "type": "string", "sql": "${TABLE}.email"}
    ]));
}

#[test]
fn input_is_left_untouched() {
    let models = vec![orders_model()];
    let before = models.clone();
    let _ = dbtea_lookml::translate(&models);
    assert_eq!(models, before);
}
