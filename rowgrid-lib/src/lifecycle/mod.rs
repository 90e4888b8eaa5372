//! Row lifecycle management
//!
//! Smart add, smart delete and auto-expand on top of the ledger. Every
//! operation runs in a single ledger transaction: the structural change,
//! the floor and trailing-empty repairs and the renumbering are computed on
//! the transaction's working copy and published by one commit, so callers
//! and concurrent readers see either all of it or none of it.

mod add;
mod delete;
mod edit;

pub use add::*;

use std::sync::Arc;

use tokio::time::Instant;

use crate::config::RowManagementConfiguration;
use crate::error::RowError;
use crate::ledger::LedgerTxn;
use crate::ledger::RowLedger;
use crate::result::RowManagementResult;
use crate::sequencer::plan;

/// Orchestrates structural changes to the ledger.
///
/// Cheap to clone; holds only a handle to the ledger. The configuration is
/// supplied with every call.
#[derive(Debug, Clone)]
pub struct RowLifecycleManager {
    ledger: Arc<RowLedger>,
}

/// What an operation did inside its transaction.
#[derive(Debug, Default)]
struct Change {
    processed: usize,
    messages: Vec<String>,
}

impl Change {
    fn note(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }
}

impl RowLifecycleManager {
    /// Creates a manager over `ledger`.
    pub fn new(ledger: Arc<RowLedger>) -> Self {
        Self { ledger }
    }

    /// Returns the ledger this manager mutates.
    pub fn ledger(&self) -> &Arc<RowLedger> {
        &self.ledger
    }

    /// Validates `config`, opens a transaction, runs `apply` and commits.
    ///
    /// Nothing is committed unless `apply` succeeds. Contract violations are
    /// returned as `Err`; any other error becomes a failed result.
    async fn run<F>(
        &self,
        operation: &'static str,
        config: &RowManagementConfiguration,
        apply: F,
    ) -> Result<RowManagementResult, RowError>
    where
        F: FnOnce(&mut LedgerTxn<'_>) -> Result<Change, RowError>,
    {
        let started = Instant::now();
        if let Err(error) = config.validate() {
            log::warn!("{} rejected: {}", operation, error);
            let result = RowManagementResult::rejected(error, self.ledger.len());
            return Ok(result.with_duration(started.elapsed()));
        }

        let mut txn = self.ledger.begin().await;
        let before = txn.len();
        let change = match apply(&mut txn) {
            Ok(change) => change,
            Err(error) if error.is_contract_violation() => return Err(error),
            Err(error) => {
                log::warn!("{} failed, nothing committed: {}", operation, error);
                let result = RowManagementResult::failed(error, before);
                return Ok(result.with_duration(started.elapsed()));
            }
        };
        let dirty = txn.is_dirty();
        let committed = txn.commit();

        let result = if dirty {
            log::info!(
                "{}: {} -> {} rows ({} processed)",
                operation,
                before,
                committed.len(),
                change.processed
            );
            RowManagementResult::applied(committed.len(), change.processed)
        } else {
            log::debug!("{}: nothing to change", operation);
            RowManagementResult::unchanged(committed.len())
        };
        Ok(result
            .with_messages(change.messages)
            .with_duration(started.elapsed()))
    }

    /// Like [`run`](Self::run) for operations that take no caller indices.
    async fn run_infallible<F>(
        &self,
        operation: &'static str,
        config: &RowManagementConfiguration,
        apply: F,
    ) -> RowManagementResult
    where
        F: FnOnce(&mut LedgerTxn<'_>) -> Result<Change, RowError>,
    {
        match self.run(operation, config, apply).await {
            Ok(result) => result,
            Err(error) => RowManagementResult::failed(error, self.ledger.len()),
        }
    }
}

/// Restores the trailing empty row and the floor, then renumbers in ledger
/// order. Runs inside the caller's transaction.
fn settle(
    txn: &mut LedgerTxn<'_>,
    config: &RowManagementConfiguration,
    change: &mut Change,
) -> Result<(), RowError> {
    if config.always_keep_last_empty && !txn.rows().last().is_some_and(|row| row.is_empty()) {
        txn.append_empty(1);
        change.note("Appended trailing empty row");
    }
    if txn.len() < config.minimum_rows {
        let padded = txn.append_empty(config.minimum_rows - txn.len());
        change.note(format!(
            "Padded {} empty rows to reach the minimum of {}",
            padded, config.minimum_rows
        ));
    }
    renumber(txn)
}

fn renumber(txn: &mut LedgerTxn<'_>) -> Result<(), RowError> {
    let numbers = plan::regenerate(txn.rows(), true, plan::Checkpoint::none())?;
    txn.apply_numbers(&numbers)?;
    Ok(())
}
