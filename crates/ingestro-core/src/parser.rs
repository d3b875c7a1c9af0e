//! JSON parser for flat record arrays

use crate::error::{Error, Result};
use crate::schema::SchemaBuilder;
use crate::table::{CellValue, DataRow, Table};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Default upper bound on input size (10 MiB)
pub const DEFAULT_MAX_SIZE_BYTES: u64 = 10 * 1024 * 1024;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Options controlling a parse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Inputs larger than this are rejected before decoding
    pub max_size_bytes: u64,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
        }
    }
}

impl ParseOptions {
    /// Set the maximum accepted input size
    pub fn with_max_size(mut self, max_size_bytes: u64) -> Self {
        self.max_size_bytes = max_size_bytes;
        self
    }
}

/// Parse a JSON file into a Table using default options
pub fn parse_json<P: AsRef<Path>>(path: P) -> Result<Table> {
    parse_json_with(path, &ParseOptions::default())
}

/// Parse a JSON file into a Table
///
/// The size limit is checked against file metadata before anything is read.
pub fn parse_json_with<P: AsRef<Path>>(path: P, options: &ParseOptions) -> Result<Table> {
    let path = path.as_ref();
    let metadata = fs::metadata(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    check_size(metadata.len(), options)?;

    let file = File::open(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    debug!(path = %path.display(), size = metadata.len(), "reading input file");

    parse_reader(file, options)
}

/// Parse JSON from any reader
///
/// At most `max_size_bytes + 1` bytes are read, so an oversized stream is
/// rejected without being buffered in full.
pub fn parse_reader<R: Read>(reader: R, options: &ParseOptions) -> Result<Table> {
    let mut content = Vec::new();
    reader
        .take(options.max_size_bytes.saturating_add(1))
        .read_to_end(&mut content)?;
    parse_bytes_with(&content, options)
}

/// Parse JSON bytes into a Table using default options
pub fn parse_bytes(content: &[u8]) -> Result<Table> {
    parse_bytes_with(content, &ParseOptions::default())
}

/// Parse JSON bytes into a Table
///
/// A leading UTF-8 byte-order mark is skipped; the size limit applies to
/// the raw input.
pub fn parse_bytes_with(content: &[u8], options: &ParseOptions) -> Result<Table> {
    check_size(content.len() as u64, options)?;

    let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);
    let value: Value = serde_json::from_slice(content).map_err(Error::Decode)?;

    let Value::Array(records) = value else {
        return Err(Error::NotAnArray);
    };

    if records.is_empty() {
        return Err(Error::EmptyArray);
    }

    if let Some(index) = records.iter().position(|r| !is_flat_record(r)) {
        return Err(Error::UnsupportedShape { index });
    }

    let table = build_table(records)?;
    debug!(
        rows = table.row_count(),
        columns = table.column_count(),
        "parsed records"
    );
    Ok(table)
}

/// Check whether a decoded value is a flat record
///
/// A flat record is an object (possibly empty) whose values are all null
/// or scalars. Arrays and nested objects anywhere as a member make it
/// non-flat; anything that is not an object at the top level is rejected.
pub fn is_flat_record(value: &Value) -> bool {
    match value {
        Value::Object(map) => map
            .values()
            .all(|v| !matches!(v, Value::Array(_) | Value::Object(_))),
        _ => false,
    }
}

fn check_size(size: u64, options: &ParseOptions) -> Result<()> {
    if size > options.max_size_bytes {
        return Err(Error::SizeExceeded {
            size,
            max: options.max_size_bytes,
        });
    }
    if size == 0 {
        return Err(Error::EmptyInput);
    }
    Ok(())
}

fn build_table(records: Vec<Value>) -> Result<Table> {
    let mut schema = SchemaBuilder::new();
    let mut rows = Vec::with_capacity(records.len());

    for (index, record) in records.into_iter().enumerate() {
        let Value::Object(map) = record else {
            return Err(Error::UnsupportedShape { index });
        };

        let mut data = BTreeMap::new();
        for (key, value) in map {
            let cell = CellValue::from_json(&value).ok_or(Error::UnsupportedShape { index })?;
            schema.observe(&key, &cell);
            data.insert(key, cell);
        }

        rows.push(DataRow::new(DataRow::id_for_index(index), data));
    }

    Ok(Table {
        columns: schema.build(),
        rows,
    })
}
