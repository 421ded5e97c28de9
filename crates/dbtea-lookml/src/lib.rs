//! dbtea LookML layer
//!
//! This crate turns dbt model schemas into LookML:
//! - Schema to view translation with property allow-lists
//! - Warehouse type inference
//! - View and model assembly
//! - LookML text serialization and parsing
//! - File naming and output routing

pub mod emit;
pub mod file;
pub mod parse;
pub mod properties;
pub mod syntax;
pub mod translate;
pub mod types;
pub mod view;

pub use emit::dump;
pub use file::{to_lookml, view_files, write_view_files, LookmlFile, LookmlFileKind, OutputTarget};
pub use parse::{load, load_file};
pub use properties::{DimensionProperty, ViewProperty};
pub use translate::{
    translate, FieldRecord, SchemaTranslator, TracingObserver, TranslateOptions, Translation,
    TranslationObserver, ViewRecord,
};
pub use types::lookml_type_for;
pub use view::{LookmlModel, LookmlView};
