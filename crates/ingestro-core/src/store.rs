//! Observable table store
//!
//! The store owns the live [`Table`], validates it against a fixed
//! [`RuleSet`] whenever it is loaded or edited, and calls every subscriber
//! synchronously, in registration order, once per successful mutation.

use crate::error::Result;
use crate::parser::{self, ParseOptions};
use crate::rules::RuleSet;
use crate::table::{CellValue, DataRow, Table};
use std::fmt;
use std::path::Path;
use tracing::{debug, trace, warn};

static EMPTY_TABLE: Table = Table::empty();

/// Callback invoked with the full table after every change
pub type Subscriber = Box<dyn FnMut(&Table)>;

/// Handle returned by [`Store::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Owns the current table, its validation rules and its subscribers
#[derive(Default)]
pub struct Store {
    table: Option<Table>,
    rules: RuleSet,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl Store {
    /// Create a store that performs no validation
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that validates with `rules` for its whole lifetime
    pub fn with_rules(rules: RuleSet) -> Self {
        Self {
            rules,
            ..Self::default()
        }
    }

    /// The rules this store validates with
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Whether a table has been loaded
    pub fn is_loaded(&self) -> bool {
        self.table.is_some()
    }

    /// Replace the current table, validate every ruled cell, then notify
    ///
    /// For each row and each column that has a rule, the error entry is set
    /// when the rule fails and removed when it passes. Rules for columns the
    /// table lacks still run against `Absent` and are logged once each.
    pub fn load_data(&mut self, mut table: Table) {
        for column_id in self.rules.unmatched_columns(&table) {
            warn!(column = column_id, "rule names a column missing from the table");
        }
        validate_table(&self.rules, &mut table);
        debug!(
            rows = table.row_count(),
            columns = table.column_count(),
            invalid_cells = table.error_count(),
            "loaded table"
        );
        self.table = Some(table);
        self.notify();
    }

    /// Parse bytes and load the result
    ///
    /// On a parse error the store is left untouched and nobody is notified.
    pub fn load_bytes(&mut self, content: &[u8], options: &ParseOptions) -> Result<()> {
        let table = parser::parse_bytes_with(content, options)?;
        self.load_data(table);
        Ok(())
    }

    /// Parse a JSON file and load the result
    ///
    /// On a parse error the store is left untouched and nobody is notified.
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P, options: &ParseOptions) -> Result<()> {
        let table = parser::parse_json_with(path, options)?;
        self.load_data(table);
        Ok(())
    }

    /// The current table, or an empty table before the first load
    pub fn get_data(&self) -> &Table {
        self.table.as_ref().unwrap_or(&EMPTY_TABLE)
    }

    /// Set one cell, re-validate only that cell, then notify
    ///
    /// Unknown row ids (and calls before any load) are ignored without
    /// notifying. Returns whether the edit was applied.
    pub fn update_cell(
        &mut self,
        row_id: &str,
        column_id: &str,
        value: impl Into<CellValue>,
    ) -> bool {
        let Some(table) = self.table.as_mut() else {
            debug!(row_id, column_id, "update ignored, no table loaded");
            return false;
        };
        let Some(row) = table.find_row_mut(row_id) else {
            debug!(row_id, column_id, "update ignored, row not found");
            return false;
        };

        row.data.insert(column_id.to_string(), value.into());
        if let Some(rule) = self.rules.get(column_id) {
            let error = rule.evaluate(row.value(column_id), Some(&*row)).into_error();
            debug!(row_id, column_id, valid = error.is_none(), "cell updated");
            row.set_error(column_id, error);
        }

        self.notify();
        true
    }

    /// Re-run every rule against every cell, then notify
    ///
    /// Does nothing before the first load.
    pub fn validate_all(&mut self) {
        let Some(table) = self.table.as_mut() else {
            return;
        };
        validate_table(&self.rules, table);
        self.notify();
    }

    /// Register a callback for every future change
    ///
    /// Registering the same closure twice creates two independent
    /// subscriptions.
    pub fn subscribe<F>(&mut self, subscriber: F) -> SubscriptionId
    where
        F: FnMut(&Table) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    /// Remove exactly one subscription; returns whether it was registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
        self.subscribers.len() != before
    }

    /// Number of active subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn notify(&mut self) {
        let Some(table) = self.table.as_ref() else {
            return;
        };
        trace!(subscribers = self.subscribers.len(), "notifying subscribers");
        for (_, subscriber) in &mut self.subscribers {
            subscriber(table);
        }
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("table", &self.table)
            .field("rules", &self.rules)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

fn validate_table(rules: &RuleSet, table: &mut Table) {
    if rules.is_empty() {
        return;
    }
    for row in &mut table.rows {
        validate_row(rules, row);
    }
}

fn validate_row(rules: &RuleSet, row: &mut DataRow) {
    for (column_id, rule) in rules.iter() {
        let error = rule.evaluate(row.value(column_id), Some(&*row)).into_error();
        row.set_error(column_id, error);
    }
}
