use std::fs::File;

use rowgrid_lib::RowEngine;
use rowgrid_lib::config::RowManagementConfiguration;
use rowgrid_lib::error::RowError;
use rowgrid_lib::lifecycle::ImportMode;
use rowgrid_lib::model::CellValue;
use rowgrid_lib::model::RowContent;
use rowgrid_lib::result::RowManagementResult;
use simplelog::{Config, LevelFilter, WriteLogger};

fn sample_rows(count: usize) -> Vec<RowContent> {
    (0..count)
        .map(|i| {
            RowContent::new()
                .set("sku", format!("SKU-{:04}", i + 1))
                .set("quantity", (i as i64 + 1) * 3)
                .set("active", i % 4 != 0)
        })
        .collect()
}

fn report(step: &str, engine: &RowEngine, result: &RowManagementResult) {
    println!(
        "{:<10} {:?} -> {} rows ({} processed, {:?})",
        step, result.outcome, result.final_row_count, result.rows_processed, result.duration
    );
    for message in &result.messages {
        println!("{:<10}   {}", "", message);
    }
    log::debug!("{} left version {}", step, engine.ledger().version());
}

async fn session(engine: &RowEngine, config: &RowManagementConfiguration) -> Result<(), RowError> {
    let result = engine.import_rows(sample_rows(6), config, ImportMode::Replace).await;
    report("import", engine, &result);

    let last = engine.snapshot().len() - 1;
    let result = engine
        .edit_row(last, RowContent::new().set("sku", "SKU-TYPED").set("quantity", 1i64), config)
        .await?;
    report("edit", engine, &result);

    let result = engine.delete_rows([1, 3], config).await?;
    report("delete", engine, &result);

    let visibility: Vec<bool> = engine
        .snapshot()
        .iter()
        .map(|row| !matches!(row.content().get("active"), Some(CellValue::Bool(false))))
        .collect();
    let validation = engine.apply_filter(&visibility).await?;
    println!("{:<10} visible rows renumbered: {}", "filter", validation.renumbered_rows);
    engine.clear_filter().await?;

    let check = engine.prepare_export().await;
    println!("{:<10} ready: {} (repaired: {})", "export", check.is_ready(), check.repaired);

    let stats = engine.statistics();
    println!(
        "{:<10} {} rows, numbers {}..={}, {} gaps, {} duplicates, integrity {:.1}%",
        "stats",
        stats.total_rows,
        stats.min_number,
        stats.max_number,
        stats.gap_count,
        stats.duplicate_count,
        stats.integrity_percentage
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    let log_file = File::create("rowgrid-cli.log").expect("Failed to create log file");
    WriteLogger::init(LevelFilter::Debug, Config::default(), log_file)
        .expect("Failed to initialize logger");

    let config = RowManagementConfiguration::default().with_minimum_rows(14);
    let engine = RowEngine::new();

    if let Err(e) = session(&engine, &config).await {
        log::error!("Session failed: {}", e);
        eprintln!("Error: {}", e);
    }
}
