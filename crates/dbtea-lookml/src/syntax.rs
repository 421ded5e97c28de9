//! LookML key classes shared by the serializer and the parser

/// Plural document keys and the repeated LookML key each one collects
pub const PLURAL_KEYS: &[(&str, &str)] = &[
    ("views", "view"),
    ("explores", "explore"),
    ("dimensions", "dimension"),
    ("dimension_groups", "dimension_group"),
    ("measures", "measure"),
    ("filters", "filter"),
    ("parameters", "parameter"),
    ("sets", "set"),
    ("joins", "join"),
    ("datagroups", "datagroup"),
    ("access_grants", "access_grant"),
    ("access_filters", "access_filter"),
    ("named_value_formats", "named_value_format"),
    ("map_layers", "map_layer"),
    ("tests", "test"),
    ("includes", "include"),
    ("links", "link"),
    ("actions", "action"),
    ("allowed_values", "allowed_value"),
    ("aggregate_tables", "aggregate_table"),
    ("constants", "constant"),
    ("columns", "column"),
    ("derived_columns", "derived_column"),
];

/// Keys whose scalar values are always written as quoted strings
const QUOTED_KEYS: &[&str] = &[
    "label",
    "view_label",
    "group_label",
    "group_item_label",
    "description",
    "value_format",
    "connection",
    "include",
    "persist_for",
    "max_cache_age",
    "suggest_persist_for",
    "default_value",
    "timezone",
    "url",
    "icon_url",
    "tags",
    "value",
    "file",
];

/// Singular LookML key collected under `plural`
pub fn singular_of(plural: &str) -> Option<&'static str> {
    PLURAL_KEYS
        .iter()
        .find(|(p, _)| *p == plural)
        .map(|(_, s)| *s)
}

/// Plural document key for a repeated LookML key
pub fn plural_of(singular: &str) -> Option<&'static str> {
    PLURAL_KEYS
        .iter()
        .find(|(_, s)| *s == singular)
        .map(|(p, _)| *p)
}

/// Keys whose values are raw SQL/HTML terminated by `;;`
pub fn is_expression_key(key: &str) -> bool {
    key.starts_with("sql") || key == "html" || key.starts_with("expression")
}

pub fn is_quoted_key(key: &str) -> bool {
    QUOTED_KEYS.contains(&key)
}

/// Whether `value` can be written without quotes
pub fn is_bare_literal(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '-' | '+' | '/' | '*'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plural_lookup_both_ways() {
        assert_eq!(singular_of("dimension_groups"), Some("dimension_group"));
        assert_eq!(plural_of("view"), Some("views"));
        assert_eq!(singular_of("label"), None);
    }

    #[test]
    fn key_classes() {
        assert!(is_expression_key("sql"));
        assert!(is_expression_key("sql_table_name"));
        assert!(is_expression_key("html"));
        assert!(!is_expression_key("type"));
        assert!(is_quoted_key("label"));
        assert!(!is_quoted_key("type"));
        assert!(is_bare_literal("snake_case_1"));
        assert!(!is_bare_literal("Orders Table"));
        assert!(!is_bare_literal(""));
    }
}
