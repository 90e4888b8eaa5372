//! Entry points for the import, filter and export collaborators
//!
//! These are the call sites external collaborators use to keep the number
//! sequence consistent around their own work:
//!
//! - import: smart add, then regenerate in ledger order
//! - filter: apply visibility, then compact so visible rows are contiguous
//! - export: validate, and repair (keeping user order) if invalid

use std::sync::Arc;

use crate::config::RowManagementConfiguration;
use crate::error::RowError;
use crate::ledger::RowLedger;
use crate::lifecycle::ImportMode;
use crate::lifecycle::RowLifecycleManager;
use crate::model::RowContent;
use crate::result::RowManagementResult;
use crate::result::ValidationResult;
use crate::sequencer::RowNumberSequencer;
use crate::sequencer::plan;
use crate::sequencer::validation_result;

/// Outcome of the pre-export check.
#[derive(Debug, Clone)]
pub struct ExportCheck {
    /// `true` if the sequence was invalid and got repaired.
    pub repaired: bool,
    /// Validation of the sequence as it will be exported.
    pub validation: ValidationResult,
}

impl ExportCheck {
    /// Returns `true` if the sequence is valid and export can proceed.
    pub fn is_ready(&self) -> bool {
        self.validation.is_valid
    }
}

/// Adapters invoked by the import, filter and export collaborators.
#[derive(Debug, Clone)]
pub struct IntegrationTriggers {
    ledger: Arc<RowLedger>,
    lifecycle: RowLifecycleManager,
    sequencer: RowNumberSequencer,
}

impl IntegrationTriggers {
    /// Creates triggers over `ledger`.
    pub fn new(ledger: Arc<RowLedger>) -> Self {
        Self {
            lifecycle: RowLifecycleManager::new(Arc::clone(&ledger)),
            sequencer: RowNumberSequencer::new(Arc::clone(&ledger)),
            ledger,
        }
    }

    /// Called once the import collaborator has materialized its rows.
    pub async fn after_import(
        &self,
        rows: Vec<RowContent>,
        config: &RowManagementConfiguration,
        mode: ImportMode,
    ) -> RowManagementResult {
        let imported = rows.len();
        let mut result = self.lifecycle.import_rows(rows, config, mode).await;
        if !result.is_success() {
            return result;
        }
        let validation = self.sequencer.regenerate_all(true).await;
        if validation.renumbered_rows > 0 {
            result
                .messages
                .push(format!("Renumbered {} rows after import", validation.renumbered_rows));
        }
        log::info!("Imported {} rows, grid now has {}", imported, result.final_row_count);
        result
    }

    /// Called once the filter collaborator has recomputed visibility.
    ///
    /// `visibility` holds one flag per row in ledger order. Visibility and
    /// the compacted numbers are published together.
    pub async fn after_filter(&self, visibility: &[bool]) -> Result<ValidationResult, RowError> {
        let mut txn = self.ledger.begin().await;
        let toggled = txn.set_visibility(visibility)?;
        let numbers = plan::compact_visible(txn.rows(), plan::Checkpoint::none())?;
        let renumbered = txn.apply_numbers(&numbers)?;
        let committed = txn.commit();

        let visible = committed.iter().filter(|row| row.is_visible()).count();
        log::info!(
            "Filter applied: {} of {} rows visible ({} toggled, {} renumbered)",
            visible,
            committed.len(),
            toggled,
            renumbered
        );
        Ok(validation_result(&plan::scan(committed.rows()), committed.len(), renumbered))
    }

    /// Shows every row again and renumbers in ledger order.
    pub async fn clear_filter(&self) -> Result<ValidationResult, RowError> {
        let mut txn = self.ledger.begin().await;
        let all_visible = vec![true; txn.len()];
        txn.set_visibility(&all_visible)?;
        let numbers = plan::regenerate(txn.rows(), true, plan::Checkpoint::none())?;
        let renumbered = txn.apply_numbers(&numbers)?;
        let committed = txn.commit();
        log::info!("Filter cleared ({} renumbered)", renumbered);
        Ok(validation_result(&plan::scan(committed.rows()), committed.len(), renumbered))
    }

    /// Called by the export collaborator before it serializes rows.
    pub async fn before_export(&self) -> ExportCheck {
        let validation = self.sequencer.validate();
        if validation.is_valid {
            return ExportCheck {
                repaired: false,
                validation,
            };
        }
        log::warn!(
            "Export requested on an invalid sequence ({} gaps, {} duplicates), repairing",
            validation.gap_count,
            validation.duplicate_numbers.len()
        );
        ExportCheck {
            repaired: true,
            validation: self.sequencer.repair(true).await,
        }
    }
}
