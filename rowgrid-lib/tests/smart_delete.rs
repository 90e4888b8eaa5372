//! Smart delete behavior at and above the floor.

mod common;

use common::*;
use rowgrid_lib::Outcome;
use rowgrid_lib::RowEngine;
use rowgrid_lib::error::RowError;
use rowgrid_lib::model::RowContent;

#[tokio::test]
async fn test_delete_at_floor_clears_and_shifts() {
    // 4 data rows + trailing empty = 5 = minimum.
    let engine = engine_with(4, 5).await;
    let ids_before: Vec<_> = engine.snapshot().iter().map(|r| r.id()).collect();

    let result = engine.delete_rows([2], &config(5)).await.unwrap();

    assert!(result.is_applied());
    assert_eq!(result.final_row_count, 5);
    assert_eq!(result.rows_processed, 1);

    let snapshot = engine.snapshot();
    assert_eq!(
        names(&snapshot),
        vec![
            Some("row-0".to_string()),
            Some("row-1".to_string()),
            Some("row-3".to_string()),
            None,
            None,
        ]
    );
    let ids_after: Vec<_> = snapshot.iter().map(|r| r.id()).collect();
    assert_eq!(ids_before, ids_after);
    assert_structure(&snapshot, 5);
}

#[tokio::test]
async fn test_delete_at_floor_moves_checked_flag_with_content() {
    let engine = engine_with(4, 5).await;
    engine.set_checked(3, true).await.unwrap();

    engine.delete_rows([1], &config(5)).await.unwrap();

    let snapshot = engine.snapshot();
    assert!(snapshot.get(2).unwrap().is_checked());
    assert!(!snapshot.get(3).unwrap().is_checked());
}

#[tokio::test]
async fn test_delete_at_floor_without_shifting_clears_in_place() {
    let engine = engine_with(4, 5).await;
    let config = config(5).with_row_shifting(false);

    engine.delete_rows([1], &config).await.unwrap();

    let names = names(&engine.snapshot());
    assert_eq!(names[0].as_deref(), Some("row-0"));
    assert_eq!(names[1], None);
    assert_eq!(names[2].as_deref(), Some("row-2"));
}

#[tokio::test]
async fn test_delete_above_floor_removes_rows() {
    // 9 data rows + trailing empty = 10.
    let engine = engine_with(9, 5).await;
    assert_eq!(engine.snapshot().len(), 10);

    let result = engine.delete_rows([1, 4], &config(5)).await.unwrap();

    assert_eq!(result.final_row_count, 8);
    assert_eq!(result.rows_processed, 2);
    let snapshot = engine.snapshot();
    assert_structure(&snapshot, 5);
    assert_eq!(snapshot.iter().filter(|r| r.is_empty()).count(), 1);
    let names = names(&snapshot);
    assert!(!names.contains(&Some("row-1".to_string())));
    assert!(!names.contains(&Some("row-4".to_string())));
}

#[tokio::test]
async fn test_delete_above_floor_never_drops_below_floor() {
    let engine = engine_with(6, 5).await;
    assert_eq!(engine.snapshot().len(), 7);

    let result = engine.delete_rows(0..6, &config(5)).await.unwrap();

    assert_eq!(result.final_row_count, 5);
    assert_structure(&engine.snapshot(), 5);
    assert!(engine.snapshot().iter().all(|r| r.is_empty()));
}

#[tokio::test]
async fn test_delete_trailing_row_is_noop() {
    let engine = engine_with(3, 2).await;
    let before = engine.snapshot();

    let result = engine.delete_rows([3], &config(2)).await.unwrap();

    assert_eq!(result.outcome, Outcome::Unchanged);
    assert!(result.messages.iter().any(|m| m.contains("Trailing empty row kept")));
    let after = engine.snapshot();
    assert_eq!(before.version(), after.version());
    assert_eq!(after.len(), 4);
    assert!(after.has_trailing_empty());
}

#[tokio::test]
async fn test_delete_trailing_with_others_only_removes_others() {
    let engine = engine_with(5, 1).await;

    let result = engine.delete_rows([0, 5], &config(1)).await.unwrap();

    assert_eq!(result.rows_processed, 1);
    assert_eq!(result.final_row_count, 5);
    assert_structure(&engine.snapshot(), 1);
}

#[tokio::test]
async fn test_delete_last_data_row_keeps_single_trailing_row() {
    let engine = engine_with(5, 1).await;

    engine.delete_rows([4], &config(1)).await.unwrap();

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.len(), 5);
    assert_eq!(snapshot.iter().filter(|r| r.is_empty()).count(), 1);
}

#[tokio::test]
async fn test_delete_out_of_range_fails_without_mutation() {
    let engine = engine_with(3, 2).await;
    let version = engine.ledger().version();

    let error = engine.delete_rows([1, 99], &config(2)).await.unwrap_err();

    assert_eq!(error, RowError::index_out_of_range(99, 4));
    assert!(error.is_contract_violation());
    assert_eq!(engine.ledger().version(), version);
}

#[tokio::test]
async fn test_delete_with_invalid_configuration_is_rejected() {
    let engine = engine_with(3, 2).await;
    let bad = config(0);

    let result = engine.delete_rows([0], &bad).await.unwrap();

    assert!(matches!(result.outcome, Outcome::Rejected(_)));
    assert_eq!(engine.snapshot().len(), 4);
}

#[tokio::test]
async fn test_smart_delete_disabled_removes_then_pads() {
    let engine = engine_with(4, 5).await;
    let config = config(5).with_smart_delete(false);
    let id_of_row_3 = engine.snapshot().get(3).unwrap().id();

    engine.delete_rows([2], &config).await.unwrap();

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.len(), 5);
    assert_eq!(snapshot.get(2).unwrap().id(), id_of_row_3);
    assert_structure(&snapshot, 5);
}

#[tokio::test]
async fn test_delete_checked_rows() {
    let engine = engine_with(8, 3).await;
    engine.set_checked(1, true).await.unwrap();
    engine.set_checked(6, true).await.unwrap();

    let result = engine.delete_checked(&config(3)).await;

    assert!(result.is_applied());
    assert_eq!(result.final_row_count, 7);
    let snapshot = engine.snapshot();
    assert!(snapshot.iter().all(|r| !r.is_checked()));
    assert_structure(&snapshot, 3);
}

#[tokio::test]
async fn test_edit_trailing_row_auto_expands() {
    let engine = engine_with(2, 1).await;
    assert_eq!(engine.snapshot().len(), 3);

    let result = engine
        .edit_row(2, RowContent::new().set("name", "typed"), &config(1))
        .await
        .unwrap();

    assert!(result.messages.iter().any(|m| m.contains("Auto-expanded")));
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.len(), 4);
    assert_structure(&snapshot, 1);
}

#[tokio::test]
async fn test_edit_without_auto_expand_or_trailing_row() {
    let engine = engine_with(2, 1).await;
    let config = config(1).with_auto_expand(false).with_keep_last_empty(false);

    engine
        .edit_row(2, RowContent::new().set("name", "typed"), &config)
        .await
        .unwrap();

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.len(), 3);
    assert!(!snapshot.has_trailing_empty());

    // A later expand with auto-expand on restores the trailing row.
    let result = engine.auto_expand_trailing_empty(&common::config(1)).await;
    assert!(result.is_applied());
    assert_structure(&engine.snapshot(), 1);
}

#[tokio::test]
async fn test_edit_keeps_trailing_row_when_auto_expand_is_off() {
    let engine = engine_with(2, 1).await;
    let config = config(1).with_auto_expand(false);

    let result = engine
        .edit_row(2, RowContent::new().set("name", "typed"), &config)
        .await
        .unwrap();

    assert!(result.is_applied());
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.len(), 4);
    assert_structure(&snapshot, 1);

    // The explicit expand call still honors the flag.
    let result = engine.auto_expand_trailing_empty(&config).await;
    assert_eq!(result.outcome, Outcome::Unchanged);
}

#[tokio::test]
async fn test_auto_expand_on_settled_grid_is_unchanged() {
    let engine = engine_with(2, 1).await;
    let result = engine.auto_expand_trailing_empty(&config(1)).await;
    assert_eq!(result.outcome, Outcome::Unchanged);
}

#[tokio::test]
async fn test_edit_middle_row_keeps_identity() {
    let engine = engine_with(3, 1).await;
    let before = engine.snapshot().get(1).unwrap().clone();

    engine
        .edit_row(1, RowContent::new().set("name", "changed"), &config(1))
        .await
        .unwrap();

    let after = engine.snapshot().get(1).unwrap().clone();
    assert_eq!(after.id(), before.id());
    assert_eq!(after.row_number(), before.row_number());
    assert_eq!(after.created_at(), before.created_at());
    assert!(after.modified_at() >= before.modified_at());
    assert_eq!(engine.snapshot().len(), 4);
}

#[tokio::test]
async fn test_edit_out_of_range() {
    let engine = RowEngine::new();
    let error = engine
        .edit_row(0, RowContent::new(), &config(1))
        .await
        .unwrap_err();
    assert!(matches!(error, RowError::IndexOutOfRange { index: 0, len: 0 }));
}

#[tokio::test]
async fn test_delete_at_floor_moves_validation_message() {
    let engine = engine_with(3, 4).await;
    engine
        .lifecycle()
        .set_validation_message(2, Some("qty must be positive".to_string()))
        .await
        .unwrap();

    engine.delete_rows([0], &config(4)).await.unwrap();

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.get(1).unwrap().validation_message(), Some("qty must be positive"));
    assert_eq!(snapshot.get(2).unwrap().validation_message(), None);
}
