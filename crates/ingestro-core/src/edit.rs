//! Cell edits entered as text, applied through a [`Store`]
//!
//! An edit is written as `row_id:column:value` (for example
//! `row-3:age:42`). The value text is converted with
//! [`CellValue::from_input`] using the column's inferred type, the same way
//! a grid editor converts what the user typed.

use crate::error::{Error, Result};
use crate::store::Store;
use crate::table::CellValue;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A single edit to a cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellEdit {
    /// Row id (must match a row in the table)
    pub row_id: String,
    /// Column id
    pub column: String,
    /// New value as typed
    pub value: String,
}

impl CellEdit {
    /// Create a new edit
    pub fn new(
        row_id: impl Into<String>,
        column: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            row_id: row_id.into(),
            column: column.into(),
            value: value.into(),
        }
    }

    /// Parse `row_id:column:value`; the value may itself contain `:`
    pub fn parse(text: &str) -> Result<Self> {
        let parts: Vec<&str> = text.splitn(3, ':').collect();
        match parts.as_slice() {
            [row_id, column, value] if !row_id.is_empty() && !column.is_empty() => {
                Ok(Self::new(*row_id, *column, *value))
            }
            _ => Err(Error::InvalidCellInput {
                input: text.to_string(),
                message: "expected 'row_id:column:value'".to_string(),
            }),
        }
    }
}

/// Outcome of applying a batch of edits
#[derive(Debug, Clone, Default)]
pub struct EditReport {
    /// Number of edits applied
    pub applied: usize,
    /// Edits that were skipped, with the reason
    pub skipped: Vec<(CellEdit, String)>,
}

/// Apply edits in order, one `update_cell` (and one notification) each
///
/// Edits naming a column or row that does not exist are skipped and
/// reported rather than creating new keys.
pub fn apply_edits(store: &mut Store, edits: &[CellEdit]) -> EditReport {
    let mut report = EditReport::default();

    for edit in edits {
        let Some(column) = store.get_data().find_column(&edit.column) else {
            let reason = Error::UnknownColumn(edit.column.clone()).to_string();
            warn!(row_id = %edit.row_id, column = %edit.column, "skipping edit: {reason}");
            report.skipped.push((edit.clone(), reason));
            continue;
        };

        let value = CellValue::from_input(&edit.value, column.column_type);
        if store.update_cell(&edit.row_id, &edit.column, value) {
            report.applied += 1;
        } else {
            let reason = format!("row '{}' not found", edit.row_id);
            warn!(row_id = %edit.row_id, column = %edit.column, "skipping edit: {reason}");
            report.skipped.push((edit.clone(), reason));
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParseOptions;
    use crate::rules::RuleSet;
    use crate::validator::is_number;

    fn loaded_store() -> Store {
        let mut store = Store::with_rules(RuleSet::new().with("age", is_number()));
        store
            .load_bytes(
                br#"[{"name": "Borta", "age": 37, "active": true}]"#,
                &ParseOptions::default(),
            )
            .unwrap();
        store
    }

    #[test]
    fn test_edit_parse() {
        let edit = CellEdit::parse("row-0:time:12:30").unwrap();
        assert_eq!(edit, CellEdit::new("row-0", "time", "12:30"));

        let empty_value = CellEdit::parse("row-0:name:").unwrap();
        assert_eq!(empty_value.value, "");
    }

    #[test]
    fn test_edit_parse_invalid() {
        assert!(matches!(
            CellEdit::parse("row-0:age"),
            Err(Error::InvalidCellInput { .. })
        ));
        assert!(CellEdit::parse(":age:1").is_err());
    }

    #[test]
    fn test_apply_edits_coerces_by_column_type() {
        let mut store = loaded_store();
        let report = apply_edits(
            &mut store,
            &[
                CellEdit::new("row-0", "age", "41"),
                CellEdit::new("row-0", "active", "false"),
            ],
        );

        assert_eq!(report.applied, 2);
        let row = store.get_data().find_row("row-0").unwrap();
        assert_eq!(row.value("age"), &CellValue::Number(41.0));
        assert_eq!(row.value("active"), &CellValue::Boolean(false));
    }

    #[test]
    fn test_apply_edits_non_numeric_text_is_flagged() {
        let mut store = loaded_store();
        apply_edits(&mut store, &[CellEdit::new("row-0", "age", "forty")]);

        let row = store.get_data().find_row("row-0").unwrap();
        assert_eq!(row.value("age"), &CellValue::from("forty"));
        assert_eq!(row.error("age"), Some("Value must be a number"));
    }

    #[test]
    fn test_apply_edits_reports_skips() {
        let mut store = loaded_store();
        let report = apply_edits(
            &mut store,
            &[
                CellEdit::new("row-9", "age", "1"),
                CellEdit::new("row-0", "height", "180"),
            ],
        );

        assert_eq!(report.applied, 0);
        assert_eq!(report.skipped.len(), 2);
        assert!(report.skipped[0].1.contains("row-9"));
        assert!(report.skipped[1].1.contains("height"));
    }
}
