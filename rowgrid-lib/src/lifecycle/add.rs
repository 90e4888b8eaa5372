//! Smart add and import

use super::Change;
use super::RowLifecycleManager;
use super::renumber;
use crate::config::RowManagementConfiguration;
use crate::error::RowError;
use crate::ledger::LedgerTxn;
use crate::model::RowContent;
use crate::result::RowManagementResult;

/// How imported rows combine with rows already in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportMode {
    /// Add after the last non-empty row.
    #[default]
    Append,
    /// Discard every existing row first, in the same transition.
    Replace,
}

impl RowLifecycleManager {
    /// Adds `data` after the last non-empty row.
    ///
    /// Empty rows at the end of the ledger are dropped, the data appended,
    /// then one trailing empty row. If that leaves fewer than
    /// `minimum_rows`, empty rows pad up to the floor, so the final count is
    /// `max(body + k + 1, minimum_rows)`. Rows are renumbered in ledger order.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let config = RowManagementConfiguration::default().with_minimum_rows(14);
    ///
    /// let result = manager.add_rows(six_rows, &config).await;
    /// assert_eq!(result.final_row_count, 14);
    ///
    /// let result = manager.import_rows(twenty_rows, &config, ImportMode::Replace).await;
    /// assert_eq!(result.final_row_count, 21);
    /// ```
    pub async fn add_rows(
        &self,
        data: Vec<RowContent>,
        config: &RowManagementConfiguration,
    ) -> RowManagementResult {
        self.import_rows(data, config, ImportMode::Append).await
    }

    /// [`add_rows`](Self::add_rows) with a choice of [`ImportMode`].
    pub async fn import_rows(
        &self,
        data: Vec<RowContent>,
        config: &RowManagementConfiguration,
        mode: ImportMode,
    ) -> RowManagementResult {
        self.run_infallible("smart add", config, |txn| smart_add(txn, data, config, mode))
            .await
    }
}

fn smart_add(
    txn: &mut LedgerTxn<'_>,
    data: Vec<RowContent>,
    config: &RowManagementConfiguration,
    mode: ImportMode,
) -> Result<Change, RowError> {
    let mut change = Change::default();

    if mode == ImportMode::Replace {
        let cleared = txn.clear();
        if cleared > 0 {
            change.note(format!("Replaced {} existing rows", cleared));
        }
    }

    if !data.is_empty() {
        let body = txn
            .rows()
            .iter()
            .rposition(|row| !row.is_empty())
            .map_or(0, |last| last + 1);
        let len = txn.len();
        let dropped = txn.remove_at(&(body..len).collect())?;
        if dropped > 0 {
            log::debug!("Smart add: dropped {} empty rows after row {}", dropped, body);
        }

        change.processed = txn.append_range(data);
        if config.always_keep_last_empty {
            txn.append_empty(1);
        }
    }

    let len = txn.len();
    if len < config.minimum_rows {
        let padded = txn.append_empty(config.minimum_rows - len);
        change.note(format!(
            "Padded {} empty rows to reach the minimum of {}",
            padded, config.minimum_rows
        ));
    }
    if config.always_keep_last_empty && !txn.rows().last().is_some_and(|row| row.is_empty()) {
        txn.append_empty(1);
        change.note("Appended trailing empty row");
    }

    renumber(txn)?;
    Ok(change)
}
