//! Export a table to JSON or CSV

use crate::error::{Error, Result};
use crate::table::Table;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Full table (columns, rows, errors) as pretty JSON
    Json,
    /// Header of column ids, one line per row; absent cells are empty
    Csv,
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Write a table in the given format to a file
pub fn export_table<P: AsRef<Path>>(table: &Table, path: P, format: ExportFormat) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    match format {
        ExportFormat::Json => write_json(table, &mut writer)?,
        ExportFormat::Csv => write_csv(table, &mut writer)?,
    }
    writer.flush()?;
    Ok(())
}

/// Write the table as pretty JSON
pub fn write_json<W: Write>(table: &Table, mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, table)?;
    writeln!(writer)?;
    Ok(())
}

/// Write the table as CSV, columns in table order
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(table.columns.iter().map(|c| c.id.as_str()))?;
    for row in &table.rows {
        csv_writer.write_record(
            table
                .columns
                .iter()
                .map(|c| row.value(&c.id).to_string_value()),
        )?;
    }

    csv_writer.flush()?;
    Ok(())
}
