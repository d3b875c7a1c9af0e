//! ingestro-core: Core library for ingesting flat JSON record files
//!
//! This library provides functionality to:
//! - Parse a JSON array of flat records into a typed table
//! - Infer column types (string, number, boolean, date) from the values
//! - Validate cells with composable per-column rules
//! - Hold the table in an observable store that re-validates on edit
//! - Apply text edits and export the result as JSON or CSV

pub mod edit;
pub mod error;
pub mod export;
pub mod parser;
pub mod rules;
pub mod scanner;
pub mod schema;
pub mod store;
pub mod table;
pub mod validator;

pub use edit::{apply_edits, CellEdit, EditReport};
pub use error::{Error, Result};
pub use export::{export_table, write_csv, write_json, ExportFormat};
pub use parser::{
    is_flat_record, parse_bytes, parse_bytes_with, parse_json, parse_json_with, parse_reader,
    ParseOptions, DEFAULT_MAX_SIZE_BYTES,
};
pub use rules::RuleSet;
pub use scanner::{scan_directory, ScanResult, ScannedFile};
pub use schema::{infer_type, parse_date, SchemaBuilder};
pub use store::{Store, Subscriber, SubscriptionId};
pub use table::{CellValue, ColumnDefinition, ColumnType, DataRow, Table};
pub use validator::{
    compose, custom, is_boolean, is_date, is_number, is_string, range, required, ValidationResult,
    ValidationRule,
};
