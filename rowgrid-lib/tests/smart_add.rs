//! Smart add and import behavior.

mod common;

use common::*;
use rowgrid_lib::Outcome;
use rowgrid_lib::RowEngine;
use rowgrid_lib::config::RowManagementConfiguration;
use rowgrid_lib::error::RowError;
use rowgrid_lib::lifecycle::ImportMode;
use rowgrid_lib::model::RowContent;
use rowgrid_lib::model::RowState;

#[tokio::test]
async fn test_import_at_least_minimum_adds_one_trailing_row() {
    let engine = RowEngine::new();
    let result = engine
        .import_rows(data_rows(20), &config(14), ImportMode::Append)
        .await;

    assert!(result.is_applied());
    assert_eq!(result.final_row_count, 21);
    assert_eq!(result.rows_processed, 20);

    let snapshot = engine.snapshot();
    assert_structure(&snapshot, 14);
    assert_eq!(engine.rows_in_state(RowState::Filled).len(), 20);
    assert_eq!(engine.rows_in_state(RowState::LastEmpty), vec![20]);
}

#[tokio::test]
async fn test_import_below_minimum_pads_to_minimum() {
    let engine = RowEngine::new();
    let result = engine
        .import_rows(data_rows(6), &config(14), ImportMode::Append)
        .await;

    assert_eq!(result.final_row_count, 14);
    let snapshot = engine.snapshot();
    assert_structure(&snapshot, 14);
    assert_eq!(engine.rows_in_state(RowState::Filled), (0..6).collect::<Vec<_>>());
    assert_eq!(engine.rows_in_state(RowState::Empty).len(), 7);
    assert_eq!(engine.rows_in_state(RowState::LastEmpty), vec![13]);
}

#[tokio::test]
async fn test_import_one_below_minimum_meets_floor_exactly() {
    let engine = RowEngine::new();
    let result = engine.add_rows(data_rows(13), &config(14)).await;
    assert_eq!(result.final_row_count, 14);

    let engine = RowEngine::new();
    let result = engine.add_rows(data_rows(14), &config(14)).await;
    assert_eq!(result.final_row_count, 15);
}

#[tokio::test]
async fn test_add_appends_after_last_filled_row() {
    let engine = engine_with(3, 10).await;
    assert_eq!(engine.snapshot().len(), 10);

    let result = engine.add_rows(data_rows(2), &config(10)).await;
    assert!(result.is_applied());

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.len(), 10);
    let names = names(&snapshot);
    assert_eq!(names[2].as_deref(), Some("row-2"));
    assert_eq!(names[3].as_deref(), Some("row-0"));
    assert_eq!(names[4].as_deref(), Some("row-1"));
    assert!(names[5..].iter().all(Option::is_none));
    assert_structure(&snapshot, 10);
}

#[tokio::test]
async fn test_add_keeps_ids_of_existing_rows() {
    let engine = engine_with(3, 1).await;
    let before: Vec<_> = engine.snapshot().iter().take(3).map(|r| r.id()).collect();

    engine.add_rows(data_rows(5), &config(1)).await;

    let after: Vec<_> = engine.snapshot().iter().take(3).map(|r| r.id()).collect();
    assert_eq!(before, after);
    assert_eq!(engine.snapshot().len(), 9);
}

#[tokio::test]
async fn test_replace_import_discards_existing_rows() {
    let engine = engine_with(30, 5).await;
    let result = engine
        .import_rows(data_rows(4), &config(5), ImportMode::Replace)
        .await;

    assert!(result.is_applied());
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.len(), 5);
    assert_eq!(names(&snapshot)[0].as_deref(), Some("row-0"));
    assert!(result.messages.iter().any(|m| m.contains("Replaced 31")));
    assert_structure(&snapshot, 5);
}

#[tokio::test]
async fn test_empty_add_on_empty_ledger_builds_floor() {
    let engine = RowEngine::new();
    let result = engine.add_rows(Vec::new(), &config(3)).await;

    assert!(result.is_applied());
    assert_eq!(result.rows_processed, 0);
    assert_structure(&engine.snapshot(), 3);
}

#[tokio::test]
async fn test_empty_add_on_settled_ledger_is_unchanged() {
    let engine = engine_with(4, 2).await;
    let version = engine.ledger().version();

    let result = engine.add_rows(Vec::new(), &config(2)).await;

    assert_eq!(result.outcome, Outcome::Unchanged);
    assert!(result.is_success());
    assert_eq!(engine.ledger().version(), version);
}

#[tokio::test]
async fn test_invalid_configuration_rejected_without_side_effects() {
    let engine = engine_with(2, 3).await;
    let version = engine.ledger().version();

    let bad = RowManagementConfiguration::default().with_minimum_rows(0);
    let result = engine.add_rows(data_rows(5), &bad).await;

    assert!(!result.is_success());
    assert!(matches!(
        result.outcome,
        Outcome::Rejected(RowError::InvalidConfiguration { .. })
    ));
    assert_eq!(result.final_row_count, 3);
    assert_eq!(engine.ledger().version(), version);
    assert_eq!(engine.snapshot().len(), 3);
}

#[tokio::test]
async fn test_add_without_trailing_row() {
    let engine = RowEngine::new();
    let config = config(2).with_keep_last_empty(false);
    let result = engine.add_rows(data_rows(4), &config).await;

    assert_eq!(result.final_row_count, 4);
    assert!(!engine.snapshot().has_trailing_empty());
}

#[tokio::test]
async fn test_added_rows_are_partial_or_filled() {
    let engine = RowEngine::new();
    let rows = vec![
        RowContent::new().set("name", "full").set("qty", 1i64),
        RowContent::new().set("name", "half").set("qty", ""),
    ];
    engine.add_rows(rows, &config(1)).await;

    let states = engine.snapshot().states();
    assert_eq!(states, vec![RowState::Filled, RowState::Partial, RowState::LastEmpty]);
}
