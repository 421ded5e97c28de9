//! Translation diagnostics
//!
//! Codes serialize as stable SCREAMING_SNAKE_CASE strings and end up in
//! saved reports, so existing names must not change.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    /// Model-level key outside the view allow-list; removed from the view
    LookmlInvalidViewProperty,

    /// Column-level key outside the dimension allow-list; removed from the field
    LookmlInvalidDimensionProperty,

    /// A later model produced a view name already in the output
    LookmlDuplicateViewName,

    /// Field `type` filled in from the column's warehouse `data_type`
    LookmlInferredFieldType,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LookmlInvalidViewProperty => "LOOKML_INVALID_VIEW_PROPERTY",
            Self::LookmlInvalidDimensionProperty => "LOOKML_INVALID_DIMENSION_PROPERTY",
            Self::LookmlDuplicateViewName => "LOOKML_DUPLICATE_VIEW_NAME",
            Self::LookmlInferredFieldType => "LOOKML_INFERRED_FIELD_TYPE",
        }
    }

    /// Codes reporting a property that was stripped from the output
    pub fn is_stripped_property(&self) -> bool {
        matches!(
            self,
            Self::LookmlInvalidViewProperty | Self::LookmlInvalidDimensionProperty
        )
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered so that `severity >= Severity::Warn` selects what needs review
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        })
    }
}

/// Something the translator noticed about one view, field or property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,

    /// Name of the view being built, when it has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            view: None,
            field: None,
            property: None,
        }
    }

    pub fn with_view(mut self, view: Option<&str>) -> Self {
        self.view = view.map(str::to_string);
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.message, self.code)?;
        match (&self.view, &self.field) {
            (Some(view), Some(field)) => write!(f, " at {}.{}", view, field),
            (Some(view), None) => write!(f, " at {}", view),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_serialize_as_stable_names() {
        let json = serde_json::to_string(&DiagnosticCode::LookmlDuplicateViewName).unwrap();
        assert_eq!(json, "\"LOOKML_DUPLICATE_VIEW_NAME\"");
        assert_eq!(
            DiagnosticCode::LookmlInferredFieldType.to_string(),
            "LOOKML_INFERRED_FIELD_TYPE"
        );
    }

    #[test]
    fn stripped_property_codes() {
        assert!(DiagnosticCode::LookmlInvalidViewProperty.is_stripped_property());
        assert!(DiagnosticCode::LookmlInvalidDimensionProperty.is_stripped_property());
        assert!(!DiagnosticCode::LookmlDuplicateViewName.is_stripped_property());
    }

    #[test]
    fn display_names_the_field() {
        let diag = Diagnostic::new(
            DiagnosticCode::LookmlInvalidDimensionProperty,
            Severity::Info,
            "Removing tests from dimension",
        )
        .with_view(Some("orders"))
        .with_field("id")
        .with_property("tests");

        assert_eq!(
            diag.to_string(),
            "Removing tests from dimension [LOOKML_INVALID_DIMENSION_PROPERTY] at orders.id"
        );

        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["property"], "tests");
        assert_eq!(json["severity"], "info");
    }

    #[test]
    fn severity_order() {
        assert!(Severity::Error > Severity::Warn);
        assert!(Severity::Warn > Severity::Info);
    }
}
