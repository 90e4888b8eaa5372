//! Immutable ledger views

use serde::Serialize;

use crate::model::Row;
use crate::model::RowState;

/// A point-in-time view of the ledger.
///
/// Snapshots are immutable and shared behind an `Arc`; iterating one never
/// blocks writers and never observes a half-applied batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerSnapshot {
    version: u64,
    rows: Vec<Row>,
}

impl LedgerSnapshot {
    pub(crate) fn empty() -> Self {
        Self {
            version: 0,
            rows: Vec::new(),
        }
    }

    pub(crate) fn new(version: u64, rows: Vec<Row>) -> Self {
        Self { version, rows }
    }

    /// Monotonic version, bumped by every committed change.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The rows in ledger order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Returns the row at `index`.
    pub fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Returns the last row.
    pub fn last(&self) -> Option<&Row> {
        self.rows.last()
    }

    /// Returns the row count.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterates rows in ledger order.
    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// Display numbers in ledger order.
    pub fn numbers(&self) -> Vec<u64> {
        self.rows.iter().map(Row::row_number).collect()
    }

    /// Derived state of every row, in ledger order.
    pub fn states(&self) -> Vec<RowState> {
        let len = self.rows.len();
        self.rows.iter().map(|row| row.state(len)).collect()
    }

    /// Returns `true` if the last row exists and is empty.
    pub fn has_trailing_empty(&self) -> bool {
        self.rows.last().is_some_and(|row| row.is_empty())
    }
}

impl<'a> IntoIterator for &'a LedgerSnapshot {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
