//! Main RowEngine

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::RowManagementConfiguration;
use crate::error::RowError;
use crate::integration::ExportCheck;
use crate::integration::IntegrationTriggers;
use crate::ledger::LedgerSnapshot;
use crate::ledger::RowLedger;
use crate::lifecycle::ImportMode;
use crate::lifecycle::RowLifecycleManager;
use crate::model::RowContent;
use crate::model::RowState;
use crate::result::RowManagementResult;
use crate::result::RowManagementStatistics;
use crate::result::ValidationResult;
use crate::sequencer::RowNumberSequencer;

/// The row engine behind one grid.
///
/// Bundles a ledger with its sequencer, lifecycle manager and integration
/// triggers. Cheap to clone (uses `Arc` internally) and safe to share across
/// tasks; all clones operate on the same ledger.
///
/// # Example
///
/// ```ignore
/// use rowgrid_lib::RowEngine;
/// use rowgrid_lib::config::RowManagementConfiguration;
/// use rowgrid_lib::model::RowContent;
///
/// let engine = RowEngine::new();
/// let config = RowManagementConfiguration::default().with_minimum_rows(5);
///
/// engine.add_rows(vec![RowContent::new().set("name", "a")], &config).await;
/// assert_eq!(engine.snapshot().len(), 5);
/// assert!(engine.validate_sequence().is_valid);
/// ```
#[derive(Debug, Clone)]
pub struct RowEngine {
    inner: Arc<RowEngineInner>,
}

#[derive(Debug)]
struct RowEngineInner {
    ledger: Arc<RowLedger>,
    sequencer: RowNumberSequencer,
    lifecycle: RowLifecycleManager,
    triggers: IntegrationTriggers,
}

impl RowEngine {
    /// Creates an engine over a new, empty ledger.
    pub fn new() -> Self {
        Self::with_ledger(Arc::new(RowLedger::new()))
    }

    /// Creates an engine over an existing ledger.
    pub fn with_ledger(ledger: Arc<RowLedger>) -> Self {
        Self {
            inner: Arc::new(RowEngineInner {
                sequencer: RowNumberSequencer::new(Arc::clone(&ledger)),
                lifecycle: RowLifecycleManager::new(Arc::clone(&ledger)),
                triggers: IntegrationTriggers::new(Arc::clone(&ledger)),
                ledger,
            }),
        }
    }

    /// Returns the underlying ledger.
    pub fn ledger(&self) -> &Arc<RowLedger> {
        &self.inner.ledger
    }

    /// Returns the sequencer.
    pub fn sequencer(&self) -> &RowNumberSequencer {
        &self.inner.sequencer
    }

    /// Returns the lifecycle manager.
    pub fn lifecycle(&self) -> &RowLifecycleManager {
        &self.inner.lifecycle
    }

    /// Returns the collaborator triggers.
    pub fn triggers(&self) -> &IntegrationTriggers {
        &self.inner.triggers
    }

    /// Returns a point-in-time view of the rows.
    pub fn snapshot(&self) -> Arc<LedgerSnapshot> {
        self.inner.ledger.snapshot()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Smart add. See [`RowLifecycleManager::add_rows`].
    pub async fn add_rows(
        &self,
        data: Vec<RowContent>,
        config: &RowManagementConfiguration,
    ) -> RowManagementResult {
        self.inner.lifecycle.add_rows(data, config).await
    }

    /// Import through the import trigger: smart add, then regenerate.
    pub async fn import_rows(
        &self,
        data: Vec<RowContent>,
        config: &RowManagementConfiguration,
        mode: ImportMode,
    ) -> RowManagementResult {
        self.inner.triggers.after_import(data, config, mode).await
    }

    /// Smart delete. See [`RowLifecycleManager::delete_rows`].
    pub async fn delete_rows(
        &self,
        indices: impl IntoIterator<Item = usize>,
        config: &RowManagementConfiguration,
    ) -> Result<RowManagementResult, RowError> {
        self.inner.lifecycle.delete_rows(indices, config).await
    }

    /// Smart-deletes every checked row.
    pub async fn delete_checked(&self, config: &RowManagementConfiguration) -> RowManagementResult {
        self.inner.lifecycle.delete_checked(config).await
    }

    /// Appends an empty row if the last row holds data.
    pub async fn auto_expand_trailing_empty(
        &self,
        config: &RowManagementConfiguration,
    ) -> RowManagementResult {
        self.inner.lifecycle.auto_expand_trailing_empty(config).await
    }

    /// Edits a row, auto-expanding if it was the trailing empty row.
    pub async fn edit_row(
        &self,
        index: usize,
        content: RowContent,
        config: &RowManagementConfiguration,
    ) -> Result<RowManagementResult, RowError> {
        self.inner.lifecycle.edit_row(index, content, config).await
    }

    /// Sets a row's checked flag.
    pub async fn set_checked(&self, index: usize, checked: bool) -> Result<(), RowError> {
        self.inner.lifecycle.set_checked(index, checked).await
    }

    // =========================================================================
    // Sequencing
    // =========================================================================

    /// Assigns a number to one row.
    pub async fn assign_number(
        &self,
        index: usize,
        explicit: Option<u64>,
    ) -> Result<u64, RowError> {
        self.inner.sequencer.assign_number(index, explicit).await
    }

    /// Renumbers every row `1..=N`.
    pub async fn regenerate_numbers(&self, preserve_order: bool) -> ValidationResult {
        self.inner.sequencer.regenerate_all(preserve_order).await
    }

    /// Renumbers every row, honoring `cancel` until the write-back starts.
    pub async fn regenerate_numbers_with_cancel(
        &self,
        preserve_order: bool,
        cancel: &CancellationToken,
    ) -> Result<ValidationResult, RowError> {
        self.inner
            .sequencer
            .regenerate_all_with_cancel(preserve_order, cancel)
            .await
    }

    /// Closes gaps, keeping relative order.
    pub async fn compact_numbers(&self) -> ValidationResult {
        self.inner.sequencer.compact().await
    }

    /// Checks the sequence.
    pub fn validate_sequence(&self) -> ValidationResult {
        self.inner.sequencer.validate()
    }

    /// Repairs the sequence if invalid.
    pub async fn repair_sequence(&self, preserve_user_assignments: bool) -> ValidationResult {
        self.inner.sequencer.repair(preserve_user_assignments).await
    }

    /// Summarizes rows and numbers.
    pub fn statistics(&self) -> RowManagementStatistics {
        self.inner.sequencer.statistics()
    }

    /// Indices of rows currently in `state`.
    pub fn rows_in_state(&self, state: RowState) -> Vec<usize> {
        let snapshot = self.snapshot();
        let len = snapshot.len();
        snapshot
            .iter()
            .filter(|row| row.state(len) == state)
            .map(|row| row.index())
            .collect()
    }

    // =========================================================================
    // Collaborator triggers
    // =========================================================================

    /// Applies a filter's visibility and compacts the visible rows.
    pub async fn apply_filter(&self, visibility: &[bool]) -> Result<ValidationResult, RowError> {
        self.inner.triggers.after_filter(visibility).await
    }

    /// Removes any filter and renumbers in ledger order.
    pub async fn clear_filter(&self) -> Result<ValidationResult, RowError> {
        self.inner.triggers.clear_filter().await
    }

    /// Validates (and if needed repairs) before export.
    pub async fn prepare_export(&self) -> ExportCheck {
        self.inner.triggers.before_export().await
    }
}

impl Default for RowEngine {
    fn default() -> Self {
        Self::new()
    }
}
