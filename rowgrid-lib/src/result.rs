//! Operation results and sequence statistics

use std::time::Duration;

use serde::Serialize;

use crate::error::RowError;

/// How a lifecycle operation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The change was committed.
    Applied,
    /// Nothing needed to change. Not a failure.
    Unchanged,
    /// Rejected before any mutation (bad configuration).
    Rejected(RowError),
    /// Failed while computing the change. Nothing was committed.
    Failed(RowError),
}

impl Outcome {
    /// Returns `true` for `Applied` and `Unchanged`.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Applied | Self::Unchanged)
    }

    /// Returns the error for `Rejected` and `Failed`.
    pub fn error(&self) -> Option<&RowError> {
        match self {
            Self::Rejected(e) | Self::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Result of an add, delete or expand operation.
///
/// # Example
///
/// ```ignore
/// let result = engine.add_rows(rows, &config).await;
///
/// if result.is_success() {
///     println!("{} rows in grid", result.final_row_count);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RowManagementResult {
    /// How the operation ended.
    pub outcome: Outcome,
    /// Row count after the operation (unchanged count on failure).
    pub final_row_count: usize,
    /// Rows the operation touched: added, cleared or removed.
    pub rows_processed: usize,
    /// Wall time spent in the operation.
    pub duration: Duration,
    /// Human-readable notes about decisions taken.
    pub messages: Vec<String>,
}

impl RowManagementResult {
    pub(crate) fn applied(final_row_count: usize, rows_processed: usize) -> Self {
        Self {
            outcome: Outcome::Applied,
            final_row_count,
            rows_processed,
            duration: Duration::ZERO,
            messages: Vec::new(),
        }
    }

    pub(crate) fn unchanged(final_row_count: usize) -> Self {
        Self {
            outcome: Outcome::Unchanged,
            final_row_count,
            rows_processed: 0,
            duration: Duration::ZERO,
            messages: Vec::new(),
        }
    }

    pub(crate) fn rejected(error: RowError, final_row_count: usize) -> Self {
        Self {
            messages: vec![error.to_string()],
            outcome: Outcome::Rejected(error),
            final_row_count,
            rows_processed: 0,
            duration: Duration::ZERO,
        }
    }

    pub(crate) fn failed(error: RowError, final_row_count: usize) -> Self {
        Self {
            messages: vec![error.to_string()],
            outcome: Outcome::Failed(error),
            final_row_count,
            rows_processed: 0,
            duration: Duration::ZERO,
        }
    }

    pub(crate) fn with_messages(mut self, messages: Vec<String>) -> Self {
        self.messages.extend(messages);
        self
    }

    pub(crate) fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Returns `true` if the operation applied or had nothing to do.
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// Returns `true` if a change was committed.
    pub fn is_applied(&self) -> bool {
        matches!(self.outcome, Outcome::Applied)
    }
}

/// Health of the display-number sequence, plus what a renumber did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    /// No gaps, no duplicates, no unnumbered rows.
    pub is_valid: bool,
    /// Rows examined (or renumbered, for mutating operations).
    pub processed_rows: usize,
    /// Rows in the ledger.
    pub total_rows: usize,
    /// Rows whose number actually changed.
    pub renumbered_rows: usize,
    /// Exact count of integers in `[1, max]` no row carries.
    pub gap_count: usize,
    /// Those integers, ascending, truncated at
    /// [`MAX_REPORTED_GAPS`](crate::sequencer::plan::MAX_REPORTED_GAPS).
    pub gap_locations: Vec<u64>,
    /// Numbers carried by more than one row, ascending.
    pub duplicate_numbers: Vec<u64>,
    /// Indices of rows with no number (`0`).
    pub unnumbered_rows: Vec<usize>,
    /// Error message, if the sequence could not be examined.
    pub error: Option<String>,
}

impl ValidationResult {
    /// Returns `true` if any gap or duplicate was found.
    pub fn is_corrupted(&self) -> bool {
        self.gap_count > 0 || !self.duplicate_numbers.is_empty()
    }
}

/// Summary of the ledger and its number sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RowManagementStatistics {
    pub total_rows: usize,
    pub min_number: u64,
    pub max_number: u64,
    pub gap_count: usize,
    pub duplicate_count: usize,
    /// `(total - gaps - duplicates - unnumbered) / total * 100`, clamped to
    /// `[0, 100]`. 100 for an empty ledger.
    pub integrity_percentage: f64,
    /// `total / max * 100`, clamped to `[0, 100]`. 100 for an empty ledger,
    /// 0 when rows exist but none is numbered.
    pub range_efficiency: f64,
    pub empty_rows: usize,
    pub filled_rows: usize,
    pub partial_rows: usize,
    pub visible_rows: usize,
    pub checked_rows: usize,
}
