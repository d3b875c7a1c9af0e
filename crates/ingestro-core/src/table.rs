//! Core table types for representing parsed record data

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

static ABSENT: CellValue = CellValue::Absent;

/// A parsed table: ordered columns plus ordered rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Column definitions, in first-seen order
    pub columns: Vec<ColumnDefinition>,
    /// Row data, in source order
    pub rows: Vec<DataRow>,
}

impl Table {
    /// Create a new empty table
    pub const fn empty() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has neither columns nor rows
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }

    /// Find a column by id
    pub fn find_column(&self, id: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.id == id)
    }

    /// Find a row by id
    pub fn find_row(&self, id: &str) -> Option<&DataRow> {
        self.rows.iter().find(|r| r.id == id)
    }

    /// Find a row by id for mutation
    pub fn find_row_mut(&mut self, id: &str) -> Option<&mut DataRow> {
        self.rows.iter_mut().find(|r| r.id == id)
    }

    /// Total number of cells with an active validation error
    pub fn error_count(&self) -> usize {
        self.rows.iter().map(|r| r.errors.len()).sum()
    }

    /// Rows that carry at least one validation error
    pub fn invalid_rows(&self) -> impl Iterator<Item = &DataRow> {
        self.rows.iter().filter(|r| r.has_errors())
    }
}

/// Semantic type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Number,
    Boolean,
    Date,
    /// Every value seen so far was absent
    Unknown,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Number => "number",
            ColumnType::Boolean => "boolean",
            ColumnType::Date => "date",
            ColumnType::Unknown => "unknown",
        }
    }

    /// Whether this is a concrete (non-provisional) type
    pub fn is_known(&self) -> bool {
        !matches!(self, ColumnType::Unknown)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Stable key, taken from the source field name
    pub id: String,
    /// Display label
    pub name: String,
    /// Inferred type
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl ColumnDefinition {
    /// Create a column whose display name matches its id
    pub fn new(id: impl Into<String>, column_type: ColumnType) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            column_type,
        }
    }
}

/// A row of data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRow {
    /// Synthetic id (`row-<index>`)
    pub id: String,
    /// Cell values keyed by column id; need not cover every column
    pub data: BTreeMap<String, CellValue>,
    /// Validation messages keyed by column id, only for failing cells
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, String>,
}

impl DataRow {
    /// Create a new row without errors
    pub fn new(id: impl Into<String>, data: BTreeMap<String, CellValue>) -> Self {
        Self {
            id: id.into(),
            data,
            errors: BTreeMap::new(),
        }
    }

    /// Synthetic id for the row at `index` in source order
    pub fn id_for_index(index: usize) -> String {
        format!("row-{index}")
    }

    /// Get a cell value; a missing key reads as [`CellValue::Absent`]
    pub fn value(&self, column_id: &str) -> &CellValue {
        self.data.get(column_id).unwrap_or(&ABSENT)
    }

    /// Get the validation error for a column, if any
    pub fn error(&self, column_id: &str) -> Option<&str> {
        self.errors.get(column_id).map(String::as_str)
    }

    /// Set or clear the validation error for a column
    pub fn set_error(&mut self, column_id: &str, error: Option<String>) {
        match error {
            Some(message) => {
                self.errors.insert(column_id.to_string(), message);
            }
            None => {
                self.errors.remove(column_id);
            }
        }
    }

    /// Whether any cell in this row failed validation
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// A single cell value
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
    /// Explicit null
    Absent,
}

impl CellValue {
    /// Map a decoded JSON value into a cell value.
    ///
    /// Returns `None` for arrays and objects, which cannot be cells.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(CellValue::Absent),
            Value::Bool(b) => Some(CellValue::Boolean(*b)),
            Value::Number(n) => n.as_f64().map(CellValue::Number),
            Value::String(s) => Some(CellValue::String(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Convert back into a JSON value
    pub fn to_json(&self) -> Value {
        match self {
            CellValue::String(s) => Value::String(s.clone()),
            CellValue::Number(n) => number_to_json(*n),
            CellValue::Boolean(b) => Value::Bool(*b),
            CellValue::Date(d) => Value::String(d.to_rfc3339()),
            CellValue::Absent => Value::Null,
        }
    }

    /// Convert text typed into a cell editor, guided by the column type.
    ///
    /// Number columns parse the whole trimmed text strictly: `"12abc"` is
    /// kept as the string `"12abc"` (not read as `12` the way a lenient
    /// prefix parse would) so that the validator can flag it. Boolean
    /// columns treat anything but `"true"` as false.
    pub fn from_input(input: &str, column_type: ColumnType) -> Self {
        match column_type {
            ColumnType::Number => input
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(CellValue::Number)
                .unwrap_or_else(|| CellValue::String(input.to_string())),
            ColumnType::Boolean => CellValue::Boolean(input == "true"),
            _ => CellValue::String(input.to_string()),
        }
    }

    /// Check if the cell is absent
    pub fn is_absent(&self) -> bool {
        matches!(self, CellValue::Absent)
    }

    /// Get the numeric value, if this is a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the string value, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert to a display string
    pub fn to_string_value(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{}", s),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Boolean(b) => write!(f, "{}", b),
            CellValue::Date(d) => write!(f, "{}", d.to_rfc3339()),
            CellValue::Absent => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::String(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::String(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Boolean(value)
    }
}

impl From<DateTime<Utc>> for CellValue {
    fn from(value: DateTime<Utc>) -> Self {
        CellValue::Date(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Absent)
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::String(s) => serializer.serialize_str(s),
            CellValue::Number(n) => number_to_json(*n).serialize(serializer),
            CellValue::Boolean(b) => serializer.serialize_bool(*b),
            CellValue::Date(d) => serializer.serialize_str(&d.to_rfc3339()),
            CellValue::Absent => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        CellValue::from_json(&value)
            .ok_or_else(|| D::Error::custom("nested objects/arrays are not supported"))
    }
}

// Whole numbers go out as integers so `25` does not come back as `25.0`.
fn number_to_json(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}
