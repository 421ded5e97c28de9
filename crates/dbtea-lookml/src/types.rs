//! Warehouse data type to LookML field type mapping

pub const LOOKML_TYPE_STRING: &str = "string";
pub const LOOKML_TYPE_NUMBER: &str = "number";
pub const LOOKML_TYPE_DATE: &str = "date";
pub const LOOKML_TYPE_DATETIME: &str = "time";
pub const LOOKML_TYPE_BOOL: &str = "yesno";
pub const LOOKML_TYPE_ZIP: &str = "zipcode";

const ZIPCODE_FIELD_NAMES: &[&str] = &["zipcode", "zip", "zip_code", "postalcode", "postal_code"];

const YESNO_DATA_TYPES: &[&str] = &["bit", "bool", "boolean"];

const TIME_DATA_TYPES: &[&str] = &[
    "timestamp",
    "timestamp_tz",
    "timestamp_ltz",
    "timestamp_ntz",
    "datetime",
];

const DATE_DATA_TYPES: &[&str] = &["date"];

const NUMBER_DATA_TYPES: &[&str] = &[
    "int",
    "tinyint",
    "smallint",
    "bigint",
    "integer",
    "numeric",
    "number",
    "decimal",
    "float",
    "real",
    "serial",
    "int64",
    "double",
    "double precision",
];

/// Base type name: lowercase, parameters removed (`NUMERIC(10, 2)` -> `numeric`)
fn base_type(data_type: &str) -> String {
    let normalized = data_type.trim().to_lowercase();
    normalized
        .split('(')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Whether a warehouse type carries a time of day
pub fn is_time_data_type(data_type: &str) -> bool {
    TIME_DATA_TYPES.contains(&base_type(data_type).as_str())
}

/// Map a warehouse column type onto a LookML field type.
///
/// Parameterised types (`numeric(10, 2)`, `varchar(255)`) are matched on
/// their base name. Anything unrecognised is a `string`.
pub fn lookml_type_for(field_name: &str, data_type: &str, include_postal_code: bool) -> &'static str {
    let base = base_type(data_type);
    let base = base.as_str();

    let lookml_type = if include_postal_code && ZIPCODE_FIELD_NAMES.contains(&field_name) {
        LOOKML_TYPE_ZIP
    } else if YESNO_DATA_TYPES.contains(&base) {
        LOOKML_TYPE_BOOL
    } else if TIME_DATA_TYPES.contains(&base) {
        LOOKML_TYPE_DATETIME
    } else if DATE_DATA_TYPES.contains(&base) {
        LOOKML_TYPE_DATE
    } else if NUMBER_DATA_TYPES.contains(&base) {
        LOOKML_TYPE_NUMBER
    } else {
        LOOKML_TYPE_STRING
    };

    tracing::debug!(
        "Field: {} with data type: {} was mapped to LookML type: {}",
        field_name,
        data_type,
        lookml_type
    );
    lookml_type
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_types() {
        assert_eq!(lookml_type_for("is_active", "BOOLEAN", false), "yesno");
        assert_eq!(lookml_type_for("created_at", "timestamp_ntz", false), "time");
        assert_eq!(lookml_type_for("order_date", "date", false), "date");
        assert_eq!(lookml_type_for("amount", "numeric(10, 2)", false), "number");
        assert_eq!(lookml_type_for("amount", "double precision", false), "number");
        assert_eq!(lookml_type_for("email", "varchar(255)", false), "string");
    }

    #[test]
    fn time_data_types() {
        assert!(is_time_data_type("TIMESTAMP_NTZ"));
        assert!(is_time_data_type("datetime"));
        assert!(is_time_data_type("timestamp(6)"));
        assert!(!is_time_data_type("date"));
        assert!(!is_time_data_type("time"));
    }

    #[test]
    fn postal_codes_only_when_requested() {
        assert_eq!(lookml_type_for("zip", "varchar", true), "zipcode");
        assert_eq!(lookml_type_for("zip", "varchar", false), "string");
        assert_eq!(lookml_type_for("postal_code", "integer", true), "zipcode");
    }
}
