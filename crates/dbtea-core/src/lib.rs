//! dbtea core
//!
//! Shared domain model: dbt model schema records, the error taxonomy,
//! diagnostics, reports and configuration.
//! Never rename diagnostic codes - they are part of the public API.

pub mod config;
pub mod diagnostic;
pub mod error;
pub mod report;
pub mod schema;
pub mod timing;

pub use config::{DbteaConfig, GitConfig, ProjectConfig};
pub use diagnostic::{Diagnostic, DiagnosticCode, Severity};
pub use error::{DbteaError, ErrorKind, Result};
pub use report::{Report, ReportSummary, REPORT_FORMAT_VERSION};
pub use schema::{ColumnSchema, ModelSchema};
