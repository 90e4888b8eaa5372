//! Ledger transactions

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::DateTime;
use chrono::Utc;
use tokio::sync::MutexGuard;

use super::LedgerSnapshot;
use super::RowLedger;
use crate::error::RowError;
use crate::model::Row;
use crate::model::RowContent;
use crate::model::RowPayload;

/// An open write transaction on a [`RowLedger`].
///
/// Holds the ledger's critical section for its whole lifetime. Changes are
/// made on a private working copy (cloned on first write) and become visible
/// only when [`commit`](Self::commit) publishes them as one new version.
/// Dropping the transaction without committing discards everything.
pub struct LedgerTxn<'a> {
    ledger: &'a RowLedger,
    _guard: MutexGuard<'a, ()>,
    base: Arc<LedgerSnapshot>,
    working: Option<Vec<Row>>,
    now: DateTime<Utc>,
}

impl<'a> LedgerTxn<'a> {
    pub(super) fn new(
        ledger: &'a RowLedger,
        guard: MutexGuard<'a, ()>,
        base: Arc<LedgerSnapshot>,
    ) -> Self {
        Self {
            ledger,
            _guard: guard,
            base,
            working: None,
            now: Utc::now(),
        }
    }

    /// Version of the snapshot this transaction started from.
    pub fn base_version(&self) -> u64 {
        self.base.version()
    }

    /// Timestamp stamped on rows created or modified by this transaction.
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Current rows, including uncommitted changes.
    pub fn rows(&self) -> &[Row] {
        match &self.working {
            Some(rows) => rows,
            None => self.base.rows(),
        }
    }

    /// Current row count, including uncommitted changes.
    pub fn len(&self) -> usize {
        self.rows().len()
    }

    /// Returns `true` if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }

    /// Returns `true` if anything was written.
    pub fn is_dirty(&self) -> bool {
        self.working.is_some()
    }

    fn rows_mut(&mut self) -> &mut Vec<Row> {
        let base = &self.base;
        self.working.get_or_insert_with(|| base.rows().to_vec())
    }

    fn check_index(&self, index: usize) -> Result<(), RowError> {
        let len = self.len();
        if index >= len {
            return Err(RowError::index_out_of_range(index, len));
        }
        Ok(())
    }

    // =========================================================================
    // Structural changes
    // =========================================================================

    /// Appends rows in order with fresh ids. Returns the count appended.
    pub fn append_range(&mut self, contents: impl IntoIterator<Item = RowContent>) -> usize {
        let now = self.now;
        let mut contents = contents.into_iter().peekable();
        if contents.peek().is_none() {
            return 0;
        }
        let rows = self.rows_mut();
        let before = rows.len();
        for content in contents {
            let index = rows.len();
            rows.push(Row::new(index, content, now));
        }
        rows.len() - before
    }

    /// Appends `count` empty rows.
    pub fn append_empty(&mut self, count: usize) -> usize {
        self.append_range(std::iter::repeat_with(RowContent::new).take(count))
    }

    /// Removes every row in `indices`; survivors compact downward.
    ///
    /// Checks all indices first, so an out-of-range index removes nothing.
    pub fn remove_at(&mut self, indices: &BTreeSet<usize>) -> Result<usize, RowError> {
        if let Some(&max) = indices.last() {
            self.check_index(max)?;
        } else {
            return Ok(0);
        }
        let rows = self.rows_mut();
        let before = rows.len();
        let mut position = 0;
        rows.retain(|_| {
            let keep = !indices.contains(&position);
            position += 1;
            keep
        });
        reindex(rows);
        Ok(before - rows.len())
    }

    /// Removes every row. Returns the count removed.
    pub fn clear(&mut self) -> usize {
        if self.is_empty() {
            return 0;
        }
        let rows = self.rows_mut();
        let removed = rows.len();
        rows.clear();
        removed
    }

    // =========================================================================
    // In-place changes
    // =========================================================================

    /// Replaces a row's content. Id, index and number are untouched.
    pub fn replace_content(&mut self, index: usize, content: RowContent) -> Result<(), RowError> {
        self.check_index(index)?;
        if self.rows()[index].content == content {
            return Ok(());
        }
        let now = self.now;
        let row = &mut self.rows_mut()[index];
        row.content = content;
        row.modified_at = now;
        Ok(())
    }

    /// Sets a row's checked flag.
    pub fn set_checked(&mut self, index: usize, checked: bool) -> Result<(), RowError> {
        self.check_index(index)?;
        if self.rows()[index].checked == checked {
            return Ok(());
        }
        let now = self.now;
        let row = &mut self.rows_mut()[index];
        row.checked = checked;
        row.modified_at = now;
        Ok(())
    }

    /// Sets or clears a row's validation message.
    pub fn set_validation_message(
        &mut self,
        index: usize,
        message: Option<String>,
    ) -> Result<(), RowError> {
        self.check_index(index)?;
        if self.rows()[index].validation_message == message {
            return Ok(());
        }
        self.rows_mut()[index].validation_message = message;
        Ok(())
    }

    /// Applies one visibility flag per row. Returns how many flags changed.
    pub fn set_visibility(&mut self, visibility: &[bool]) -> Result<usize, RowError> {
        let len = self.len();
        if visibility.len() != len {
            return Err(RowError::VisibilityLengthMismatch {
                expected: len,
                actual: visibility.len(),
            });
        }
        let changed: Vec<usize> = self
            .rows()
            .iter()
            .zip(visibility)
            .filter(|(row, visible)| row.visible != **visible)
            .map(|(row, _)| row.index)
            .collect();
        if changed.is_empty() {
            return Ok(0);
        }
        let rows = self.rows_mut();
        for &index in &changed {
            rows[index].visible = visibility[index];
        }
        Ok(changed.len())
    }

    /// Writes display numbers, one per row in ledger order.
    ///
    /// Only rows whose number differs are touched. Returns that count.
    pub fn apply_numbers(&mut self, numbers: &[u64]) -> Result<usize, RowError> {
        let len = self.len();
        if numbers.len() != len {
            return Err(RowError::unexpected(format!(
                "number plan covers {} rows, ledger has {}",
                numbers.len(),
                len
            )));
        }
        let changed: Vec<usize> = self
            .rows()
            .iter()
            .zip(numbers)
            .filter(|(row, number)| row.row_number != **number)
            .map(|(row, _)| row.index)
            .collect();
        if changed.is_empty() {
            return Ok(0);
        }
        let rows = self.rows_mut();
        for &index in &changed {
            rows[index].row_number = numbers[index];
        }
        Ok(changed.len())
    }

    /// Sets a single row's display number.
    pub fn set_number(&mut self, index: usize, number: u64) -> Result<(), RowError> {
        self.check_index(index)?;
        if self.rows()[index].row_number != number {
            self.rows_mut()[index].row_number = number;
        }
        Ok(())
    }

    /// Installs payloads row by row, leaving ids, indices and numbers in
    /// place. Returns how many rows changed.
    pub(crate) fn rewrite_payloads(
        &mut self,
        payloads: Vec<RowPayload>,
    ) -> Result<usize, RowError> {
        let len = self.len();
        if payloads.len() != len {
            return Err(RowError::unexpected(format!(
                "payload plan covers {} rows, ledger has {}",
                payloads.len(),
                len
            )));
        }
        let changed: Vec<(usize, RowPayload)> = self
            .rows()
            .iter()
            .zip(payloads)
            .filter(|(row, payload)| row.payload() != *payload)
            .map(|(row, payload)| (row.index, payload))
            .collect();
        if changed.is_empty() {
            return Ok(0);
        }
        let count = changed.len();
        let now = self.now;
        let rows = self.rows_mut();
        for (index, payload) in changed {
            rows[index].put_payload(payload, now);
        }
        Ok(count)
    }

    // =========================================================================
    // Commit
    // =========================================================================

    /// Publishes the working copy as the next version and leaves the
    /// critical section.
    ///
    /// A transaction that wrote nothing publishes nothing and returns the
    /// snapshot it started from.
    pub fn commit(self) -> Arc<LedgerSnapshot> {
        match self.working {
            Some(mut rows) => {
                reindex(&mut rows);
                let version = self.base.version() + 1;
                log::debug!("Ledger commit: v{} ({} rows)", version, rows.len());
                self.ledger.publish(LedgerSnapshot::new(version, rows))
            }
            None => self.base,
        }
    }
}

fn reindex(rows: &mut [Row]) {
    for (index, row) in rows.iter_mut().enumerate() {
        row.index = index;
    }
}
