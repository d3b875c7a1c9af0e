//! Per-cell validation rules
//!
//! Rules are plain values: a small set of built-in checks plus
//! [`ValidationRule::Compose`], which runs child rules in order and stops at
//! the first failure. Arbitrary checks that need the owning row can be
//! supplied with [`custom`].

use crate::schema::parse_date;
use crate::table::{CellValue, DataRow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub const REQUIRED_MESSAGE: &str = "This field is required!";
pub const NUMBER_MESSAGE: &str = "Value must be a number";
pub const BOOLEAN_MESSAGE: &str = "Value must be a boolean";
pub const STRING_MESSAGE: &str = "Must be a string";
pub const DATE_FORMAT_MESSAGE: &str = "Value must be a date string (YYYY-MM-DD)";
pub const DATE_INVALID_MESSAGE: &str = "Value must be a valid date (YYYY-MM-DD)";

/// Outcome of evaluating a rule against one cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationResult {
    /// A passing result
    pub fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    /// A failing result with a message
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(message.into()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Message to store in the row's error map, `None` when valid
    pub fn into_error(self) -> Option<String> {
        if self.valid {
            None
        } else {
            Some(self.error.unwrap_or_default())
        }
    }
}

/// Signature of a closure-backed rule
pub type RuleFn = dyn Fn(&CellValue, Option<&DataRow>) -> ValidationResult + Send + Sync;

/// A named closure rule
#[derive(Clone)]
pub struct CustomRule {
    name: String,
    check: Arc<RuleFn>,
}

impl CustomRule {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for CustomRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomRule")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A validation rule for the cells of one column
///
/// Built-in variants (de)serialize as `{"rule": "<name>", ...}` so rule sets
/// can live in configuration files. `Custom` rules exist only in process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ValidationRule {
    /// Fails on absent values and empty strings
    Required,
    IsNumber,
    IsBoolean,
    IsString,
    /// String with a `YYYY-MM-DD` prefix that parses as a calendar date
    IsDate,
    /// Number within `min..=max`
    Range { min: f64, max: f64 },
    /// Children evaluated left to right; first failure wins
    Compose { rules: Vec<ValidationRule> },
    #[serde(skip)]
    Custom(CustomRule),
}

impl ValidationRule {
    /// Evaluate this rule against a cell value and, optionally, its row
    pub fn evaluate(&self, value: &CellValue, row: Option<&DataRow>) -> ValidationResult {
        match self {
            ValidationRule::Required => match value {
                CellValue::Absent => ValidationResult::fail(REQUIRED_MESSAGE),
                CellValue::String(s) if s.is_empty() => ValidationResult::fail(REQUIRED_MESSAGE),
                _ => ValidationResult::ok(),
            },
            ValidationRule::IsNumber => match value {
                CellValue::Number(_) => ValidationResult::ok(),
                _ => ValidationResult::fail(NUMBER_MESSAGE),
            },
            ValidationRule::IsBoolean => match value {
                CellValue::Boolean(_) => ValidationResult::ok(),
                _ => ValidationResult::fail(BOOLEAN_MESSAGE),
            },
            ValidationRule::IsString => match value {
                CellValue::String(_) => ValidationResult::ok(),
                _ => ValidationResult::fail(STRING_MESSAGE),
            },
            ValidationRule::IsDate => match value {
                CellValue::String(s) if parse_date(s).is_some() => ValidationResult::ok(),
                CellValue::String(_) => ValidationResult::fail(DATE_INVALID_MESSAGE),
                _ => ValidationResult::fail(DATE_FORMAT_MESSAGE),
            },
            ValidationRule::Range { min, max } => match value {
                CellValue::Number(n) if *n < *min || *n > *max => {
                    ValidationResult::fail(format!("Value must be between {} and {}", min, max))
                }
                CellValue::Number(_) => ValidationResult::ok(),
                _ => ValidationResult::fail(NUMBER_MESSAGE),
            },
            ValidationRule::Compose { rules } => rules
                .iter()
                .map(|rule| rule.evaluate(value, row))
                .find(|result| !result.valid)
                .unwrap_or_else(ValidationResult::ok),
            ValidationRule::Custom(custom) => (custom.check)(value, row),
        }
    }

    /// Short name used in logs and templates
    pub fn name(&self) -> &str {
        match self {
            ValidationRule::Required => "required",
            ValidationRule::IsNumber => "is_number",
            ValidationRule::IsBoolean => "is_boolean",
            ValidationRule::IsString => "is_string",
            ValidationRule::IsDate => "is_date",
            ValidationRule::Range { .. } => "range",
            ValidationRule::Compose { .. } => "compose",
            ValidationRule::Custom(custom) => custom.name(),
        }
    }
}

pub fn required() -> ValidationRule {
    ValidationRule::Required
}

pub fn is_number() -> ValidationRule {
    ValidationRule::IsNumber
}

pub fn is_boolean() -> ValidationRule {
    ValidationRule::IsBoolean
}

pub fn is_string() -> ValidationRule {
    ValidationRule::IsString
}

pub fn is_date() -> ValidationRule {
    ValidationRule::IsDate
}

/// Inclusive numeric range
pub fn range(min: f64, max: f64) -> ValidationRule {
    ValidationRule::Range { min, max }
}

/// Sequential composition; the first failing child decides the result
pub fn compose(rules: impl IntoIterator<Item = ValidationRule>) -> ValidationRule {
    ValidationRule::Compose {
        rules: rules.into_iter().collect(),
    }
}

/// Wrap a closure as a rule
///
/// The closure receives the cell value and the row that owns it, which is
/// how checks involving other columns of the same row are expressed.
pub fn custom<F>(name: impl Into<String>, check: F) -> ValidationRule
where
    F: Fn(&CellValue, Option<&DataRow>) -> ValidationResult + Send + Sync + 'static,
{
    ValidationRule::Custom(CustomRule {
        name: name.into(),
        check: Arc::new(check),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_required() {
        let rule = required();
        assert!(rule.evaluate(&CellValue::from("hello"), None).valid);
        assert!(rule.evaluate(&CellValue::Number(0.0), None).valid);
        assert!(rule.evaluate(&CellValue::Boolean(false), None).valid);

        let result = rule.evaluate(&CellValue::Absent, None);
        assert!(!result.valid);
        assert_eq!(result.error.as_deref(), Some(REQUIRED_MESSAGE));
        assert!(!rule.evaluate(&CellValue::from(""), None).valid);
    }

    #[test]
    fn test_type_checks() {
        assert!(is_number().evaluate(&CellValue::Number(42.0), None).valid);
        assert!(!is_number().evaluate(&CellValue::from("not a number"), None).valid);

        assert!(is_boolean().evaluate(&CellValue::Boolean(true), None).valid);
        assert_eq!(
            is_boolean().evaluate(&CellValue::from("true"), None).error.as_deref(),
            Some(BOOLEAN_MESSAGE)
        );

        assert!(is_string().evaluate(&CellValue::from("hello"), None).valid);
        assert!(!is_string().evaluate(&CellValue::Number(42.0), None).valid);
        assert!(!is_string().evaluate(&CellValue::Absent, None).valid);
    }

    #[test]
    fn test_is_date() {
        let rule = is_date();
        assert!(rule.evaluate(&CellValue::from("2024-01-05"), None).valid);
        assert!(rule.evaluate(&CellValue::from("2024-01-05T12:00:00Z"), None).valid);

        let bad_format = rule.evaluate(&CellValue::from("05/01/2024"), None);
        assert_eq!(bad_format.error.as_deref(), Some(DATE_INVALID_MESSAGE));

        let bad_calendar = rule.evaluate(&CellValue::from("2024-13-45"), None);
        assert_eq!(bad_calendar.error.as_deref(), Some(DATE_INVALID_MESSAGE));

        let not_string = rule.evaluate(&CellValue::Number(20240105.0), None);
        assert_eq!(not_string.error.as_deref(), Some(DATE_FORMAT_MESSAGE));
    }

    #[test]
    fn test_range_boundaries() {
        let rule = range(0.0, 100.0);
        assert!(rule.evaluate(&CellValue::Number(50.0), None).valid);
        assert!(rule.evaluate(&CellValue::Number(0.0), None).valid);
        assert!(rule.evaluate(&CellValue::Number(100.0), None).valid);

        let low = rule.evaluate(&CellValue::Number(-1.0), None);
        assert!(!low.valid);
        assert!(low.error.as_deref().unwrap().contains('0'));

        let high = rule.evaluate(&CellValue::Number(101.0), None);
        assert!(!high.valid);
        assert!(high.error.as_deref().unwrap().contains("100"));
    }

    #[test]
    fn test_range_non_numeric() {
        let result = range(0.0, 100.0).evaluate(&CellValue::from("50"), None);
        assert_eq!(result.error.as_deref(), Some(NUMBER_MESSAGE));
    }

    #[test]
    fn test_compose_first_failure_wins() {
        let rule = compose([required(), is_number()]);

        assert!(rule.evaluate(&CellValue::Number(5.0), None).valid);

        let absent = rule.evaluate(&CellValue::Absent, None);
        assert_eq!(absent.error.as_deref(), Some(REQUIRED_MESSAGE));

        let text = rule.evaluate(&CellValue::from("abc"), None);
        assert_eq!(text.error.as_deref(), Some(NUMBER_MESSAGE));
    }

    #[test]
    fn test_compose_empty_is_valid() {
        assert!(compose(Vec::new()).evaluate(&CellValue::Absent, None).valid);
    }

    #[test]
    fn test_compose_nested() {
        let rule = compose([required(), compose([is_number(), range(1.0, 5.0)])]);
        let result = rule.evaluate(&CellValue::Number(9.0), None);
        assert_eq!(result.error.as_deref(), Some("Value must be between 1 and 5"));
    }

    #[test]
    fn test_custom_rule_sees_row() {
        let rule = custom("end_after_start", |value, row| {
            let start = row.and_then(|r| r.value("start").as_number());
            match (value.as_number(), start) {
                (Some(end), Some(start)) if end < start => {
                    ValidationResult::fail("end must not precede start")
                }
                _ => ValidationResult::ok(),
            }
        });

        let mut data = BTreeMap::new();
        data.insert("start".to_string(), CellValue::Number(10.0));
        let row = DataRow::new("row-0", data);

        assert!(!rule.evaluate(&CellValue::Number(5.0), Some(&row)).valid);
        assert!(rule.evaluate(&CellValue::Number(15.0), Some(&row)).valid);
        assert!(rule.evaluate(&CellValue::Number(5.0), None).valid);
        assert_eq!(rule.name(), "end_after_start");
    }

    #[test]
    fn test_rule_deserializes_from_config() {
        let json = r#"{"rule": "compose", "rules": [{"rule": "required"}, {"rule": "range", "min": 0, "max": 120}]}"#;
        let rule: ValidationRule = serde_json::from_str(json).unwrap();

        assert_eq!(rule.name(), "compose");
        assert!(rule.evaluate(&CellValue::Number(30.0), None).valid);
        assert!(!rule.evaluate(&CellValue::Number(130.0), None).valid);
    }

    #[test]
    fn test_custom_rule_cannot_be_serialized() {
        let rule = custom("always", |_, _| ValidationResult::ok());
        assert!(serde_json::to_string(&rule).is_err());
    }

    #[test]
    fn test_into_error() {
        assert_eq!(ValidationResult::ok().into_error(), None);
        assert_eq!(
            ValidationResult::fail("nope").into_error(),
            Some("nope".to_string())
        );
    }
}
