//! Smart delete

use std::collections::BTreeSet;

use super::Change;
use super::RowLifecycleManager;
use super::settle;
use crate::config::RowManagementConfiguration;
use crate::error::RowError;
use crate::ledger::LedgerTxn;
use crate::model::RowPayload;
use crate::result::RowManagementResult;

impl RowLifecycleManager {
    /// Deletes the rows at `indices`, respecting the floor.
    ///
    /// - At or below `minimum_rows`, nothing is removed: the targeted rows
    ///   are cleared and the rows below shift up, so the cleared slots end up
    ///   at the bottom and the row count is unchanged.
    /// - Above the floor, the rows are removed. A trailing empty row is
    ///   appended if the new last row holds data, and empty rows pad back up
    ///   to the floor if the removal went below it.
    /// - The trailing empty row itself is never deleted.
    ///
    /// Returns `Err` without touching the ledger if any index is out of range.
    pub async fn delete_rows(
        &self,
        indices: impl IntoIterator<Item = usize>,
        config: &RowManagementConfiguration,
    ) -> Result<RowManagementResult, RowError> {
        let targets: BTreeSet<usize> = indices.into_iter().collect();
        self.run("smart delete", config, |txn| smart_delete(txn, targets, config))
            .await
    }

    /// Smart-deletes every checked row.
    pub async fn delete_checked(&self, config: &RowManagementConfiguration) -> RowManagementResult {
        self.run_infallible("delete checked", config, |txn| {
            let targets = txn
                .rows()
                .iter()
                .filter(|row| row.is_checked())
                .map(|row| row.index())
                .collect();
            smart_delete(txn, targets, config)
        })
        .await
    }
}

fn smart_delete(
    txn: &mut LedgerTxn<'_>,
    mut targets: BTreeSet<usize>,
    config: &RowManagementConfiguration,
) -> Result<Change, RowError> {
    let len = txn.len();
    if let Some(&max) = targets.last() {
        if max >= len {
            return Err(RowError::index_out_of_range(max, len));
        }
    }

    let mut change = Change::default();
    let last = len.saturating_sub(1);
    let protects_last =
        config.always_keep_last_empty && txn.rows().last().is_some_and(|row| row.is_empty());
    if protects_last && targets.remove(&last) {
        change.note("Trailing empty row kept");
    }
    if targets.is_empty() {
        settle(txn, config, &mut change)?;
        return Ok(change);
    }

    if config.enable_smart_delete && len <= config.minimum_rows {
        change.processed = clear_and_shift(txn, &targets, config.enable_row_shifting)?;
        change.note(format!(
            "At the minimum of {} rows: cleared {} rows instead of removing them",
            config.minimum_rows, change.processed
        ));
    } else {
        change.processed = txn.remove_at(&targets)?;
    }

    settle(txn, config, &mut change)?;
    Ok(change)
}

/// Clears the targeted rows' payloads. With `shift`, the surviving payloads
/// move up to fill the holes and the cleared ones collect at the bottom;
/// without, they are cleared where they stand.
fn clear_and_shift(
    txn: &mut LedgerTxn<'_>,
    targets: &BTreeSet<usize>,
    shift: bool,
) -> Result<usize, RowError> {
    let rows = txn.rows();
    let payloads: Vec<RowPayload> = if shift {
        rows.iter()
            .filter(|row| !targets.contains(&row.index()))
            .map(|row| row.payload())
            .chain(std::iter::repeat_with(RowPayload::default).take(targets.len()))
            .collect()
    } else {
        rows.iter()
            .map(|row| {
                if targets.contains(&row.index()) {
                    RowPayload::default()
                } else {
                    row.payload()
                }
            })
            .collect()
    };
    txn.rewrite_payloads(payloads)?;
    Ok(targets.len())
}
