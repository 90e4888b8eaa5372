//! Display-number sequencing
//!
//! Assigns, validates, regenerates, compacts and repairs the 1-based
//! display numbers of the ledger's rows.
//!
//! Batch renumbering plans on a snapshot outside the ledger's critical
//! section, then takes the lock only to write the finished plan back. If
//! another writer committed in between, the plan is recomputed under the
//! lock so it is never applied to rows it was not computed for.

pub mod plan;

pub use plan::SequenceHealth;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::RowError;
use crate::ledger::LedgerSnapshot;
use crate::ledger::RowLedger;
use crate::model::Row;
use crate::model::RowState;
use crate::result::RowManagementStatistics;
use crate::result::ValidationResult;
use plan::Checkpoint;

/// Maintains the integrity of the display-number sequence.
///
/// Cheap to clone; holds only a handle to the ledger and never caches rows.
#[derive(Debug, Clone)]
pub struct RowNumberSequencer {
    ledger: Arc<RowLedger>,
}

impl RowNumberSequencer {
    /// Creates a sequencer over `ledger`.
    pub fn new(ledger: Arc<RowLedger>) -> Self {
        Self { ledger }
    }

    /// Assigns a number to the row at `index`.
    ///
    /// Uses `explicit` when it is at least 1 and no other row carries it,
    /// otherwise one past the current maximum. Fails with
    /// [`RowError::NumberSpaceExhausted`] if that maximum is `u64::MAX`.
    pub async fn assign_number(
        &self,
        index: usize,
        explicit: Option<u64>,
    ) -> Result<u64, RowError> {
        let mut txn = self.ledger.begin().await;
        if index >= txn.len() {
            return Err(RowError::index_out_of_range(index, txn.len()));
        }
        let number = plan::pick_number(txn.rows(), index, explicit)?;
        if explicit.is_some_and(|wanted| wanted != number) {
            log::debug!(
                "Number {:?} unavailable for row {}, assigned {}",
                explicit,
                index,
                number
            );
        }
        txn.set_number(index, number)?;
        txn.commit();
        Ok(number)
    }

    /// Renumbers every row `1..=N`.
    pub async fn regenerate_all(&self, preserve_order: bool) -> ValidationResult {
        self.regenerate_all_with_cancel(preserve_order, &CancellationToken::new())
            .await
            .unwrap_or_else(failure)
    }

    /// [`regenerate_all`](Self::regenerate_all), honoring `cancel` while
    /// planning and while waiting for the critical section.
    pub async fn regenerate_all_with_cancel(
        &self,
        preserve_order: bool,
        cancel: &CancellationToken,
    ) -> Result<ValidationResult, RowError> {
        self.renumber("regenerate", Some(cancel), |rows, cp| {
            plan::regenerate(rows, preserve_order, cp)
        })
        .await
    }

    /// Closes gaps without changing relative order. Only rows whose number
    /// changes are written.
    pub async fn compact(&self) -> ValidationResult {
        self.compact_with_cancel(&CancellationToken::new())
            .await
            .unwrap_or_else(failure)
    }

    /// [`compact`](Self::compact), honoring `cancel` while planning and while
    /// waiting for the critical section.
    pub async fn compact_with_cancel(
        &self,
        cancel: &CancellationToken,
    ) -> Result<ValidationResult, RowError> {
        self.renumber("compact", Some(cancel), plan::compact).await
    }

    /// Compacts so visible rows are numbered `1..=V` and hidden rows follow.
    pub async fn compact_visible(&self) -> ValidationResult {
        self.renumber("compact visible", None, plan::compact_visible)
            .await
            .unwrap_or_else(failure)
    }

    /// Checks the sequence for gaps, duplicates and unnumbered rows.
    pub fn validate(&self) -> ValidationResult {
        let snapshot = self.ledger.snapshot();
        let health = plan::scan(snapshot.rows());
        validation_result(&health, snapshot.len(), 0)
    }

    /// Repairs an invalid sequence.
    ///
    /// With `preserve_user_assignments` the sequence is compacted, keeping
    /// the relative order users gave it. Without, it is regenerated and the
    /// conflicting numbers are discarded: rows are renumbered by creation
    /// time, ties broken by index. A valid sequence is left untouched.
    pub async fn repair(&self, preserve_user_assignments: bool) -> ValidationResult {
        let current = self.validate();
        if current.is_valid {
            return current;
        }
        log::warn!(
            "Repairing row numbers ({} gaps, {} duplicates, {} unnumbered) by {}",
            current.gap_count,
            current.duplicate_numbers.len(),
            current.unnumbered_rows.len(),
            if preserve_user_assignments { "compaction" } else { "regeneration" }
        );
        if preserve_user_assignments {
            self.compact().await
        } else {
            self.regenerate_all(false).await
        }
    }

    /// Summarizes the ledger and its number sequence.
    pub fn statistics(&self) -> RowManagementStatistics {
        statistics(&self.ledger.snapshot())
    }

    async fn renumber<F>(
        &self,
        operation: &'static str,
        cancel: Option<&CancellationToken>,
        planner: F,
    ) -> Result<ValidationResult, RowError>
    where
        F: Fn(&[Row], Checkpoint<'_>) -> Result<Vec<u64>, RowError>,
    {
        let checkpoint = Checkpoint::new(cancel);
        let snapshot = self.ledger.snapshot();
        let mut numbers = planner(snapshot.rows(), checkpoint)?;
        checkpoint.check()?;

        let mut txn = match cancel {
            Some(token) => tokio::select! {
                txn = self.ledger.begin() => txn,
                _ = token.cancelled() => return Err(RowError::Cancelled),
            },
            None => self.ledger.begin().await,
        };
        // No await past this point: the write-back always runs to completion.
        if txn.base_version() != snapshot.version() {
            log::debug!(
                "Ledger moved from v{} to v{} while planning {}, re-planning",
                snapshot.version(),
                txn.base_version(),
                operation
            );
            numbers = planner(txn.rows(), Checkpoint::none())?;
        }
        let renumbered = txn.apply_numbers(&numbers)?;
        let committed = txn.commit();

        log::info!("{}: {} of {} rows renumbered", operation, renumbered, committed.len());
        let health = plan::scan(committed.rows());
        Ok(validation_result(&health, committed.len(), renumbered))
    }
}

pub(crate) fn validation_result(
    health: &SequenceHealth,
    processed: usize,
    renumbered: usize,
) -> ValidationResult {
    ValidationResult {
        is_valid: health.is_valid(),
        processed_rows: processed,
        total_rows: health.total_rows,
        renumbered_rows: renumbered,
        gap_count: health.gap_count,
        gap_locations: health.gaps.clone(),
        duplicate_numbers: health.duplicates.clone(),
        unnumbered_rows: health.unnumbered.clone(),
        error: None,
    }
}

fn failure(error: RowError) -> ValidationResult {
    ValidationResult {
        error: Some(error.to_string()),
        ..ValidationResult::default()
    }
}

pub(crate) fn statistics(snapshot: &LedgerSnapshot) -> RowManagementStatistics {
    let health = plan::scan(snapshot.rows());
    let total = snapshot.len();

    let integrity_percentage = if total == 0 {
        100.0
    } else {
        let faults = health.gap_count as f64
            + health.duplicates.len() as f64
            + health.unnumbered.len() as f64;
        ((total as f64 - faults) / total as f64 * 100.0).clamp(0.0, 100.0)
    };
    let range_efficiency = if total == 0 {
        100.0
    } else if health.max_number == 0 {
        0.0
    } else {
        (total as f64 / health.max_number as f64 * 100.0).clamp(0.0, 100.0)
    };

    let mut stats = RowManagementStatistics {
        total_rows: total,
        min_number: health.min_number,
        max_number: health.max_number,
        gap_count: health.gap_count,
        duplicate_count: health.duplicates.len(),
        integrity_percentage,
        range_efficiency,
        ..RowManagementStatistics::default()
    };
    for row in snapshot {
        match row.state(total) {
            RowState::Empty | RowState::LastEmpty => stats.empty_rows += 1,
            RowState::Filled => stats.filled_rows += 1,
            RowState::Partial => stats.partial_rows += 1,
        }
        if row.visible {
            stats.visible_rows += 1;
        }
        if row.checked {
            stats.checked_rows += 1;
        }
    }
    stats
}
