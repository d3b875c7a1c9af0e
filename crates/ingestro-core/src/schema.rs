//! Column type inference

use crate::table::{CellValue, ColumnDefinition, ColumnType};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::collections::HashMap;
use tracing::warn;

/// Date-time layouts accepted after the `YYYY-MM-DD` prefix
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Infer the semantic type of a single value
///
/// Strings are dates only when they start with `YYYY-MM-DD` and the whole
/// string parses as a calendar date (see [`parse_date`]).
pub fn infer_type(value: &CellValue) -> ColumnType {
    match value {
        CellValue::Absent => ColumnType::Unknown,
        CellValue::String(s) if parse_date(s).is_some() => ColumnType::Date,
        CellValue::String(_) => ColumnType::String,
        CellValue::Number(_) => ColumnType::Number,
        CellValue::Boolean(_) => ColumnType::Boolean,
        CellValue::Date(_) => ColumnType::Date,
    }
}

/// Check for the `YYYY-MM-DD` prefix (digits only, no calendar check)
pub fn has_iso_date_prefix(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() < 10 {
        return false;
    }
    bytes[..10].iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        _ => b.is_ascii_digit(),
    })
}

/// Parse a `YYYY-MM-DD`-prefixed string as a calendar date
///
/// Accepts a plain date, an RFC 3339 timestamp, or a local date-time with
/// `T` or space separator (interpreted as UTC). Returns `None` when the
/// prefix is missing or the date does not exist (e.g. `2024-02-30`).
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if !has_iso_date_prefix(s) {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Accumulates column definitions while records are scanned in order
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    columns: Vec<ColumnDefinition>,
    index: HashMap<String, usize>,
}

impl SchemaBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observed `(key, value)` pair
    ///
    /// New keys are appended with the inferred type. A column still typed
    /// `unknown` takes the first concrete type seen later; a concrete type
    /// is never replaced, even when a later value disagrees.
    pub fn observe(&mut self, key: &str, value: &CellValue) {
        let inferred = infer_type(value);

        let Some(idx) = self.index.get(key).copied() else {
            self.index.insert(key.to_string(), self.columns.len());
            self.columns.push(ColumnDefinition::new(key, inferred));
            return;
        };

        let column = &mut self.columns[idx];
        if !column.column_type.is_known() {
            column.column_type = inferred;
        } else if inferred.is_known() && inferred != column.column_type {
            warn!(
                column = key,
                kept = %column.column_type,
                seen = %inferred,
                "mixed value types in column, keeping first type"
            );
        }
    }

    /// Finish and return the columns in first-seen order
    pub fn build(self) -> Vec<ColumnDefinition> {
        self.columns
    }
}
