//! Shared helpers for the integration tests.

#![allow(dead_code)]

use rowgrid_lib::RowEngine;
use rowgrid_lib::config::RowManagementConfiguration;
use rowgrid_lib::ledger::LedgerSnapshot;
use rowgrid_lib::model::RowContent;

/// `count` filled rows named `row-0`, `row-1`, ...
pub fn data_rows(count: usize) -> Vec<RowContent> {
    (0..count)
        .map(|i| RowContent::new().set("name", format!("row-{}", i)).set("qty", i as i64))
        .collect()
}

pub fn config(minimum_rows: usize) -> RowManagementConfiguration {
    RowManagementConfiguration::default().with_minimum_rows(minimum_rows)
}

/// An engine holding `filled` data rows plus whatever the floor requires.
pub async fn engine_with(filled: usize, minimum_rows: usize) -> RowEngine {
    let engine = RowEngine::new();
    let result = engine.add_rows(data_rows(filled), &config(minimum_rows)).await;
    assert!(result.is_success());
    engine
}

/// Value of the `name` column per row, `None` for empty rows.
pub fn names(snapshot: &LedgerSnapshot) -> Vec<Option<String>> {
    snapshot
        .iter()
        .map(|row| {
            row.content()
                .get("name")
                .and_then(|v| v.as_text())
                .map(str::to_string)
        })
        .collect()
}

/// Overwrites display numbers directly, bypassing the sequencer.
pub async fn force_numbers(engine: &RowEngine, numbers: &[u64]) {
    let mut txn = engine.ledger().begin().await;
    for (index, &number) in numbers.iter().enumerate() {
        txn.set_number(index, number).unwrap();
    }
    txn.commit();
}

pub fn assert_structure(snapshot: &LedgerSnapshot, minimum_rows: usize) {
    assert!(
        snapshot.len() >= minimum_rows,
        "{} rows is below the floor of {}",
        snapshot.len(),
        minimum_rows
    );
    assert!(snapshot.has_trailing_empty(), "last row must be empty");
    let expected: Vec<u64> = (1..=snapshot.len() as u64).collect();
    assert_eq!(snapshot.numbers(), expected);
    for (position, row) in snapshot.iter().enumerate() {
        assert_eq!(row.index(), position);
    }
}
