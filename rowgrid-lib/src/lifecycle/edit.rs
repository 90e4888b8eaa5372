//! Edits and auto-expand

use super::Change;
use super::RowLifecycleManager;
use super::renumber;
use crate::config::RowManagementConfiguration;
use crate::error::RowError;
use crate::ledger::LedgerTxn;
use crate::model::RowContent;
use crate::result::RowManagementResult;

impl RowLifecycleManager {
    /// Appends an empty row if the last row holds data.
    ///
    /// Does nothing when `enable_auto_expand` is off or the last row is
    /// already empty.
    pub async fn auto_expand_trailing_empty(
        &self,
        config: &RowManagementConfiguration,
    ) -> RowManagementResult {
        self.run_infallible("auto-expand", config, |txn| {
            if !config.enable_auto_expand {
                return Ok(Change::default());
            }
            Ok(append_trailing(txn)?.unwrap_or_default())
        })
        .await
    }

    /// Replaces the content of the row at `index`.
    ///
    /// When the edited row is the last row and the edit gives it data, an
    /// empty row is appended in the same transition. This happens when
    /// either `enable_auto_expand` or `always_keep_last_empty` is on.
    pub async fn edit_row(
        &self,
        index: usize,
        content: RowContent,
        config: &RowManagementConfiguration,
    ) -> Result<RowManagementResult, RowError> {
        self.run("edit", config, |txn| {
            txn.replace_content(index, content)?;
            let mut change = Change {
                processed: 1,
                ..Change::default()
            };
            let keeps_trailing = config.enable_auto_expand || config.always_keep_last_empty;
            if keeps_trailing && index + 1 == txn.len() {
                if let Some(expanded) = append_trailing(txn)? {
                    change.messages.extend(expanded.messages);
                }
            }
            Ok(change)
        })
        .await
    }

    /// Sets the checked flag of the row at `index`.
    pub async fn set_checked(&self, index: usize, checked: bool) -> Result<(), RowError> {
        let mut txn = self.ledger.begin().await;
        txn.set_checked(index, checked)?;
        txn.commit();
        Ok(())
    }

    /// Sets or clears the validation message of the row at `index`.
    pub async fn set_validation_message(
        &self,
        index: usize,
        message: Option<String>,
    ) -> Result<(), RowError> {
        let mut txn = self.ledger.begin().await;
        txn.set_validation_message(index, message)?;
        txn.commit();
        Ok(())
    }
}

/// Appends one empty row when the last row holds data (or there are no
/// rows). Returns `None` when nothing was appended.
fn append_trailing(txn: &mut LedgerTxn<'_>) -> Result<Option<Change>, RowError> {
    if txn.rows().last().is_some_and(|row| row.is_empty()) {
        return Ok(None);
    }
    let mut change = Change {
        processed: txn.append_empty(1),
        ..Change::default()
    };
    change.note("Auto-expanded: appended empty row");
    renumber(txn)?;
    Ok(Some(change))
}
