//! Rule sets: the column id to rule mapping a store validates with
//!
//! Rule sets can be stored as JSON:
//!
//! ```json
//! {
//!   "name": { "rule": "required" },
//!   "age": { "rule": "compose", "rules": [{ "rule": "is_number" }, { "rule": "range", "min": 0, "max": 120 }] }
//! }
//! ```

use crate::error::{Error, Result};
use crate::table::{ColumnType, Table};
use crate::validator::{self, ValidationRule};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Rules keyed by column id; columns without an entry are never validated
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: BTreeMap<String, ValidationRule>,
}

impl RuleSet {
    /// Create an empty rule set
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, column_id: impl Into<String>, rule: ValidationRule) -> Self {
        self.insert(column_id, rule);
        self
    }

    /// Set the rule for a column, replacing any previous one
    pub fn insert(&mut self, column_id: impl Into<String>, rule: ValidationRule) {
        self.rules.insert(column_id.into(), rule);
    }

    /// Get the rule for a column
    pub fn get(&self, column_id: &str) -> Option<&ValidationRule> {
        self.rules.get(column_id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate over `(column id, rule)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValidationRule)> {
        self.rules.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Rule keys that name no column of `table`
    pub fn unmatched_columns<'a>(&'a self, table: &'a Table) -> impl Iterator<Item = &'a str> {
        self.rules
            .keys()
            .map(String::as_str)
            .filter(move |column_id| table.find_column(column_id).is_none())
    }

    /// Build a starting rule set from a table's inferred column types
    ///
    /// Each typed column gets the matching type check; `unknown` columns
    /// are left out.
    pub fn template_for(table: &Table) -> Self {
        table
            .columns
            .iter()
            .filter_map(|column| {
                let rule = match column.column_type {
                    ColumnType::String => validator::is_string(),
                    ColumnType::Number => validator::is_number(),
                    ColumnType::Boolean => validator::is_boolean(),
                    ColumnType::Date => validator::is_date(),
                    ColumnType::Unknown => return None,
                };
                Some((column.id.clone(), rule))
            })
            .collect()
    }

    /// Parse a rule set from a JSON string
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(Error::Json)
    }

    /// Load a rule set from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        Self::from_json_str(&content)
    }

    /// Save the rule set to a JSON file
    ///
    /// Fails if the set contains closure rules.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

impl FromIterator<(String, ValidationRule)> for RuleSet {
    fn from_iter<I: IntoIterator<Item = (String, ValidationRule)>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_bytes;
    use crate::table::CellValue;
    use crate::validator::{compose, custom, is_number, range, required, ValidationResult};

    #[test]
    fn test_unmatched_columns() {
        let table = parse_bytes(br#"[{"email": "x", "age": 3}]"#).unwrap();
        let rules = RuleSet::new()
            .with("emial", required())
            .with("age", is_number())
            .with("zip", required());

        let unmatched: Vec<&str> = rules.unmatched_columns(&table).collect();
        assert_eq!(unmatched, vec!["emial", "zip"]);
        assert_eq!(RuleSet::template_for(&table).unmatched_columns(&table).count(), 0);
    }

    #[test]
    fn test_rule_set_lookup() {
        let rules = RuleSet::new()
            .with("age", compose([required(), is_number()]))
            .with("name", required());

        assert_eq!(rules.len(), 2);
        assert!(rules.get("age").is_some());
        assert!(rules.get("email").is_none());
    }

    #[test]
    fn test_rule_set_from_json() {
        let json = r#"{
            "name": {"rule": "required"},
            "age": {"rule": "compose", "rules": [{"rule": "is_number"}, {"rule": "range", "min": 0, "max": 120}]}
        }"#;
        let rules = RuleSet::from_json_str(json).unwrap();

        let age = rules.get("age").unwrap();
        assert!(age.evaluate(&CellValue::Number(40.0), None).valid);
        assert!(!age.evaluate(&CellValue::Number(140.0), None).valid);
        assert!(!age.evaluate(&CellValue::from("40"), None).valid);
    }

    #[test]
    fn test_rule_set_unknown_rule_rejected() {
        let result = RuleSet::from_json_str(r#"{"age": {"rule": "is_prime"}}"#);
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[test]
    fn test_rule_set_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");

        let rules = RuleSet::new().with("score", range(0.0, 10.0));
        rules.save(&path).unwrap();

        let loaded = RuleSet::load(&path).unwrap();
        let score = loaded.get("score").unwrap();
        assert_eq!(score.name(), "range");
        assert!(!score.evaluate(&CellValue::Number(11.0), None).valid);
    }

    #[test]
    fn test_rule_set_with_custom_rule_cannot_be_saved() {
        let dir = tempfile::tempdir().unwrap();
        let rules = RuleSet::new().with("x", custom("noop", |_, _| ValidationResult::ok()));
        assert!(rules.save(dir.path().join("rules.json")).is_err());
    }

    #[test]
    fn test_template_for_table() {
        let json = r#"[{"name": "a", "age": 1, "active": true, "joined": "2024-01-05", "note": null}]"#;
        let table = parse_bytes(json.as_bytes()).unwrap();
        let rules = RuleSet::template_for(&table);

        let names: Vec<(&str, &str)> = rules.iter().map(|(col, rule)| (col, rule.name())).collect();
        assert_eq!(
            names,
            vec![
                ("active", "is_boolean"),
                ("age", "is_number"),
                ("joined", "is_date"),
                ("name", "is_string"),
            ]
        );
    }
}
