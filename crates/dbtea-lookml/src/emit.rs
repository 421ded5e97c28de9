//! LookML text serializer
//!
//! Renders the document shape produced by translation (and by [`crate::load`])
//! as LookML: plural keys expand to repeated named blocks, SQL-like values
//! are terminated with `;;`, booleans become `yes`/`no`.

use serde_json::{Map, Value};

use crate::syntax::{is_bare_literal, is_expression_key, is_quoted_key, singular_of};

const INDENT: &str = "  ";

/// Render a LookML document
///
/// Non-object documents render as an empty string; `null` values are skipped.
pub fn dump(document: &Value) -> String {
    let Some(map) = document.as_object() else {
        return String::new();
    };

    let mut out = render_pairs(map, 0);
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

/// A rendered key/value, remembering whether it spans a block
struct Item {
    text: String,
    block: bool,
}

fn render_pairs(map: &Map<String, Value>, depth: usize) -> String {
    let mut items = Vec::new();
    for (key, value) in map {
        render_pair(key, value, depth, &mut items);
    }

    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            let previous_block = items[i - 1].block;
            out.push_str(if previous_block || item.block { "\n\n" } else { "\n" });
        }
        out.push_str(&item.text);
    }
    out
}

fn render_pair(key: &str, value: &Value, depth: usize, items: &mut Vec<Item>) {
    let indent = INDENT.repeat(depth);

    match value {
        Value::Null => {}
        Value::Array(values) => match singular_of(key) {
            Some(singular) => {
                for value in values {
                    render_pair(singular, value, depth, items);
                }
            }
            None => items.push(Item {
                text: format!("{}{}: {}", indent, key, render_list(key, values)),
                block: false,
            }),
        },
        Value::Object(fields) => {
            let name = fields.get("name").and_then(Value::as_str);
            let body: Map<String, Value> = fields
                .iter()
                .filter(|(k, _)| name.is_none() || k.as_str() != "name")
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();

            let header = match name {
                Some(name) => format!("{}{}: {} {{", indent, key, name),
                None => format!("{}{}: {{", indent, key),
            };
            let inner = render_pairs(&body, depth + 1);
            let text = if inner.is_empty() {
                format!("{}\n{}}}", header, indent)
            } else {
                format!("{}\n{}\n{}}}", header, inner, indent)
            };
            items.push(Item { text, block: true });
        }
        scalar => items.push(Item {
            text: format!("{}{}: {}", indent, key, render_scalar(key, scalar)),
            block: false,
        }),
    }
}

fn render_scalar(key: &str, value: &Value) -> String {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "yes".to_string(),
        Value::Bool(false) => "no".to_string(),
        other => other.to_string(),
    };

    if is_expression_key(key) {
        format!("{} ;;", text)
    } else if is_quoted_key(key) || !is_bare_literal(&text) {
        quote(&text)
    } else {
        text
    }
}

fn render_list(key: &str, values: &[Value]) -> String {
    let rendered: Vec<String> = values
        .iter()
        .filter(|v| !v.is_null())
        .map(|value| {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            if is_quoted_key(key) || !is_bare_literal(&text) {
                quote(&text)
            } else {
                text
            }
        })
        .collect();
    format!("[{}]", rendered.join(", "))
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}
