//! Authoritative row collection
//!
//! The ledger owns the canonical rows. Readers take lock-free snapshots;
//! writers go through a single exclusive critical section per ledger and
//! publish their whole batch at once.
//!
//! # Example
//!
//! ```ignore
//! use rowgrid_lib::ledger::RowLedger;
//! use rowgrid_lib::model::RowContent;
//!
//! let ledger = RowLedger::new();
//! ledger.append_range(vec![RowContent::new().set("name", "a")]).await;
//!
//! let snapshot = ledger.snapshot();
//! assert_eq!(snapshot.len(), 1);
//! assert_eq!(snapshot.version(), 1);
//! ```

mod snapshot;
mod txn;

pub use snapshot::*;
pub use txn::*;

use std::collections::BTreeSet;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::Mutex;

use crate::error::RowError;
use crate::model::RowContent;

/// The canonical, versioned row collection.
///
/// Mutations are serialized through one `tokio::sync::Mutex` (FIFO fair, so
/// concurrent writers apply in the order they asked for the lock). Snapshots
/// are published through an [`ArcSwap`] and never require the lock.
pub struct RowLedger {
    current: ArcSwap<LedgerSnapshot>,
    write_lock: Mutex<()>,
}

impl RowLedger {
    /// Creates an empty ledger at version 0.
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(LedgerSnapshot::empty()),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the current point-in-time view. Never blocks.
    pub fn snapshot(&self) -> Arc<LedgerSnapshot> {
        self.current.load_full()
    }

    /// Returns the version of the current snapshot.
    pub fn version(&self) -> u64 {
        self.current.load().version()
    }

    /// Returns the current row count.
    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    /// Returns `true` if the ledger holds no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Enters the critical section and opens a transaction on the latest state.
    ///
    /// Waits for any in-flight writer to finish. Nothing is published until
    /// [`LedgerTxn::commit`]; dropping the transaction discards its changes.
    pub async fn begin(&self) -> LedgerTxn<'_> {
        let guard = self.write_lock.lock().await;
        let base = self.current.load_full();
        LedgerTxn::new(self, guard, base)
    }

    pub(crate) fn publish(&self, snapshot: LedgerSnapshot) -> Arc<LedgerSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.current.store(Arc::clone(&snapshot));
        snapshot
    }

    // =========================================================================
    // Single-call primitives
    // =========================================================================

    /// Appends rows in order, each with a fresh id. Returns the count appended.
    pub async fn append_range(&self, contents: impl IntoIterator<Item = RowContent>) -> usize {
        let mut txn = self.begin().await;
        let appended = txn.append_range(contents);
        txn.commit();
        appended
    }

    /// Removes a set of rows in one transition. Survivors compact downward.
    ///
    /// Fails without removing anything if any index is out of range.
    pub async fn remove_at(
        &self,
        indices: impl IntoIterator<Item = usize>,
    ) -> Result<usize, RowError> {
        let indices: BTreeSet<usize> = indices.into_iter().collect();
        let mut txn = self.begin().await;
        let removed = txn.remove_at(&indices)?;
        txn.commit();
        Ok(removed)
    }

    /// Replaces a row's content in place. Id, index and number are kept.
    pub async fn replace_content(&self, index: usize, content: RowContent) -> Result<(), RowError> {
        let mut txn = self.begin().await;
        txn.replace_content(index, content)?;
        txn.commit();
        Ok(())
    }
}

impl Default for RowLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RowLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let current = self.current.load();
        f.debug_struct("RowLedger")
            .field("version", &current.version())
            .field("rows", &current.len())
            .finish_non_exhaustive()
    }
}
