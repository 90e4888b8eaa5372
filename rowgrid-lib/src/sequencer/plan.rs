//! Pure numbering math
//!
//! Everything here reads a slice of rows and returns a plan; nothing writes.
//! Plans are applied by the caller in a single ledger commit.

use std::collections::BTreeMap;

use tokio_util::sync::CancellationToken;

use crate::error::RowError;
use crate::model::Row;

/// Upper bound on the gap locations listed in a [`SequenceHealth`].
///
/// A single corrupted number near `u64::MAX` would otherwise produce a
/// list of billions of gaps. The gap *count* is always exact.
pub const MAX_REPORTED_GAPS: usize = 10_000;

/// Cooperative cancellation check used between row-level units of work.
#[derive(Clone, Copy)]
pub(crate) struct Checkpoint<'a> {
    token: Option<&'a CancellationToken>,
}

impl<'a> Checkpoint<'a> {
    pub(crate) fn new(token: Option<&'a CancellationToken>) -> Self {
        Self { token }
    }

    pub(crate) fn none() -> Self {
        Self { token: None }
    }

    pub(crate) fn check(&self) -> Result<(), RowError> {
        match self.token {
            Some(token) if token.is_cancelled() => Err(RowError::Cancelled),
            _ => Ok(()),
        }
    }
}

// =============================================================================
// Health scan
// =============================================================================

/// Health of a display-number sequence. Derived, never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceHealth {
    pub total_rows: usize,
    /// Smallest assigned number (0 if none).
    pub min_number: u64,
    /// Largest assigned number (0 if none).
    pub max_number: u64,
    /// Exact count of integers in `[1, max]` no row carries.
    pub gap_count: usize,
    /// Missing integers, ascending, truncated at [`MAX_REPORTED_GAPS`].
    pub gaps: Vec<u64>,
    /// Numbers carried by more than one row, ascending.
    pub duplicates: Vec<u64>,
    /// Indices of rows with number `0`.
    pub unnumbered: Vec<usize>,
}

impl SequenceHealth {
    /// No gaps, duplicates or unnumbered rows.
    pub fn is_valid(&self) -> bool {
        self.gap_count == 0 && self.duplicates.is_empty() && self.unnumbered.is_empty()
    }

    /// Numbers are exactly a permutation of `1..=total_rows`.
    pub fn is_permutation(&self) -> bool {
        self.is_valid() && self.max_number as usize == self.total_rows
    }
}

/// Scans the numbers of `rows` once.
pub fn scan(rows: &[Row]) -> SequenceHealth {
    scan_with(rows, Checkpoint::none()).unwrap_or_default()
}

pub(crate) fn scan_with(
    rows: &[Row],
    checkpoint: Checkpoint<'_>,
) -> Result<SequenceHealth, RowError> {
    let mut counts: BTreeMap<u64, usize> = BTreeMap::new();
    let mut unnumbered = Vec::new();
    for row in rows {
        checkpoint.check()?;
        if row.row_number == 0 {
            unnumbered.push(row.index);
        } else {
            *counts.entry(row.row_number).or_default() += 1;
        }
    }

    let min_number = counts.keys().next().copied().unwrap_or(0);
    let max_number = counts.keys().next_back().copied().unwrap_or(0);
    let gap_count = (max_number as usize).saturating_sub(counts.len());

    let mut gaps = Vec::new();
    let mut expected = 1u64;
    'outer: for &number in counts.keys() {
        while expected < number {
            if gaps.len() == MAX_REPORTED_GAPS {
                break 'outer;
            }
            gaps.push(expected);
            expected += 1;
        }
        expected = number + 1;
    }

    let duplicates = counts
        .iter()
        .filter(|(_, count)| **count > 1)
        .map(|(number, _)| *number)
        .collect();

    Ok(SequenceHealth {
        total_rows: rows.len(),
        min_number,
        max_number,
        gap_count,
        gaps,
        duplicates,
        unnumbered,
    })
}

// =============================================================================
// Renumber plans
// =============================================================================

/// Target numbers for a regenerate: `1..=N` in the chosen order.
///
/// With `preserve_order` the ledger order wins. Without it, existing numbers
/// decide the order when they already form a permutation of `1..=N`;
/// otherwise rows are ordered by creation time, ties broken by index.
pub(crate) fn regenerate(
    rows: &[Row],
    preserve_order: bool,
    checkpoint: Checkpoint<'_>,
) -> Result<Vec<u64>, RowError> {
    if preserve_order {
        checkpoint.check()?;
        return Ok((1..=rows.len() as u64).collect());
    }

    let health = scan_with(rows, checkpoint)?;
    if health.is_permutation() {
        return Ok(rows.iter().map(|row| row.row_number).collect());
    }

    log::debug!(
        "Regenerate: {} duplicates, {} unnumbered, max {} for {} rows; ordering by creation time",
        health.duplicates.len(),
        health.unnumbered.len(),
        health.max_number,
        rows.len()
    );
    let mut order: Vec<&Row> = rows.iter().collect();
    order.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.index.cmp(&b.index)));
    assign_in_order(rows.len(), order, checkpoint)
}

/// Target numbers for a compact: current relative order, contiguous `1..=N`.
///
/// Rows are ranked by `(number, index)`; unnumbered rows rank last.
pub(crate) fn compact(rows: &[Row], checkpoint: Checkpoint<'_>) -> Result<Vec<u64>, RowError> {
    let mut order: Vec<&Row> = rows.iter().collect();
    order.sort_by_key(|row| number_rank(row));
    assign_in_order(rows.len(), order, checkpoint)
}

/// Like [`compact`], but visible rows take `1..=V` and hidden rows follow.
pub(crate) fn compact_visible(
    rows: &[Row],
    checkpoint: Checkpoint<'_>,
) -> Result<Vec<u64>, RowError> {
    let mut order: Vec<&Row> = rows.iter().collect();
    order.sort_by_key(|row| (!row.visible, number_rank(row)));
    assign_in_order(rows.len(), order, checkpoint)
}

fn number_rank(row: &Row) -> (bool, u64, usize) {
    (row.row_number == 0, row.row_number, row.index)
}

fn assign_in_order(
    len: usize,
    order: Vec<&Row>,
    checkpoint: Checkpoint<'_>,
) -> Result<Vec<u64>, RowError> {
    let mut numbers = vec![0; len];
    for (rank, row) in order.into_iter().enumerate() {
        checkpoint.check()?;
        numbers[row.index] = rank as u64 + 1;
    }
    Ok(numbers)
}

/// Picks the number for one row: `explicit` when it is free, otherwise one
/// past the largest number carried by any other row.
///
/// Fails when that largest number is already `u64::MAX`.
pub(crate) fn pick_number(
    rows: &[Row],
    index: usize,
    explicit: Option<u64>,
) -> Result<u64, RowError> {
    let others = rows.iter().filter(|row| row.index != index);
    if let Some(wanted) = explicit.filter(|n| *n > 0) {
        if !others.clone().any(|row| row.row_number == wanted) {
            return Ok(wanted);
        }
    }
    others
        .map(|row| row.row_number)
        .max()
        .unwrap_or(0)
        .checked_add(1)
        .ok_or(RowError::NumberSpaceExhausted { index })
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use chrono::Utc;

    use super::*;
    use crate::model::RowContent;

    fn rows_with_numbers(numbers: &[u64]) -> Vec<Row> {
        let now = Utc::now();
        numbers
            .iter()
            .enumerate()
            .map(|(index, &number)| {
                let created = now + Duration::milliseconds(index as i64);
                let mut row = Row::new(index, RowContent::new(), created);
                row.row_number = number;
                row
            })
            .collect()
    }

    #[test]
    fn test_scan_reports_gaps_and_duplicates() {
        let health = scan(&rows_with_numbers(&[1, 1, 5, 7]));
        assert!(!health.is_valid());
        assert_eq!(health.duplicates, vec![1]);
        assert_eq!(health.gaps, vec![2, 3, 4, 6]);
        assert_eq!(health.gap_count, 4);
        assert_eq!(health.min_number, 1);
        assert_eq!(health.max_number, 7);
    }

    #[test]
    fn test_scan_valid_sequence() {
        let health = scan(&rows_with_numbers(&[3, 1, 2]));
        assert!(health.is_valid());
        assert!(health.is_permutation());
        assert!(health.gaps.is_empty());
    }

    #[test]
    fn test_scan_unnumbered_rows() {
        let health = scan(&rows_with_numbers(&[1, 0, 2, 0]));
        assert_eq!(health.unnumbered, vec![1, 3]);
        assert_eq!(health.gap_count, 0);
        assert!(!health.is_valid());
    }

    #[test]
    fn test_scan_empty() {
        let health = scan(&[]);
        assert!(health.is_valid());
        assert_eq!(health.max_number, 0);
    }

    #[test]
    fn test_scan_caps_reported_gaps() {
        let health = scan(&rows_with_numbers(&[1, 1_000_000]));
        assert_eq!(health.gap_count, 999_998);
        assert_eq!(health.gaps.len(), MAX_REPORTED_GAPS);
        assert_eq!(health.gaps[0], 2);
    }

    #[test]
    fn test_regenerate_preserve_order() {
        let rows = rows_with_numbers(&[9, 4, 4]);
        assert_eq!(regenerate(&rows, true, Checkpoint::none()).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_regenerate_keeps_valid_permutation() {
        let rows = rows_with_numbers(&[2, 3, 1]);
        assert_eq!(regenerate(&rows, false, Checkpoint::none()).unwrap(), vec![2, 3, 1]);
    }

    #[test]
    fn test_regenerate_falls_back_to_creation_order() {
        let mut rows = rows_with_numbers(&[1, 1, 5]);
        // Row 2 was created first.
        rows[2].created_at = rows[0].created_at - Duration::seconds(10);
        assert_eq!(regenerate(&rows, false, Checkpoint::none()).unwrap(), vec![2, 3, 1]);
    }

    #[test]
    fn test_regenerate_creation_tie_breaks_on_index() {
        let mut rows = rows_with_numbers(&[0, 0, 0]);
        let now = Utc::now();
        for row in &mut rows {
            row.created_at = now;
        }
        assert_eq!(regenerate(&rows, false, Checkpoint::none()).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_compact_preserves_relative_order() {
        let rows = rows_with_numbers(&[10, 3, 7, 0]);
        assert_eq!(compact(&rows, Checkpoint::none()).unwrap(), vec![3, 1, 2, 4]);
    }

    #[test]
    fn test_compact_breaks_duplicate_ties_by_index() {
        let rows = rows_with_numbers(&[1, 1, 5, 7]);
        assert_eq!(compact(&rows, Checkpoint::none()).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_compact_visible_puts_hidden_last() {
        let mut rows = rows_with_numbers(&[1, 2, 3, 4]);
        rows[1].visible = false;
        assert_eq!(compact_visible(&rows, Checkpoint::none()).unwrap(), vec![1, 4, 2, 3]);
    }

    #[test]
    fn test_pick_number() {
        let rows = rows_with_numbers(&[1, 2, 5]);
        assert_eq!(pick_number(&rows, 0, Some(3)), Ok(3));
        assert_eq!(pick_number(&rows, 0, Some(2)), Ok(6));
        assert_eq!(pick_number(&rows, 2, None), Ok(3));
        assert_eq!(pick_number(&rows, 1, Some(0)), Ok(6));
    }

    #[test]
    fn test_pick_number_at_top_of_range() {
        let rows = rows_with_numbers(&[u64::MAX, 0]);
        assert_eq!(
            pick_number(&rows, 1, None),
            Err(RowError::NumberSpaceExhausted { index: 1 })
        );
        // The row holding the maximum can still be renumbered.
        assert_eq!(pick_number(&rows, 0, None), Ok(1));
        assert_eq!(pick_number(&rows, 1, Some(7)), Ok(7));
    }

    #[test]
    fn test_cancelled_checkpoint() {
        let token = CancellationToken::new();
        token.cancel();
        let rows = rows_with_numbers(&[1, 2]);
        assert_eq!(
            compact(&rows, Checkpoint::new(Some(&token))),
            Err(RowError::Cancelled)
        );
    }
}
