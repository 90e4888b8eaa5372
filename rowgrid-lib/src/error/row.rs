//! Row engine error types

/// Errors produced by the row engine.
///
/// Expected failure modes (a bad configuration, a corrupted sequence) are
/// reported inside [`RowManagementResult`](crate::result::RowManagementResult)
/// and [`ValidationResult`](crate::result::ValidationResult). Contract
/// violations such as an out-of-range index are returned as `Err`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    /// The supplied configuration failed validation.
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Why the configuration was rejected.
        reason: String,
    },

    /// A row index does not exist in the ledger.
    #[error("Row index {index} out of range (row count {len})")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Row count at the time of the call.
        len: usize,
    },

    /// A visibility vector does not cover every row exactly once.
    #[error("Visibility vector has {actual} entries, expected {expected}")]
    VisibilityLengthMismatch {
        /// Row count of the ledger.
        expected: usize,
        /// Length of the supplied vector.
        actual: usize,
    },

    /// No number above the current maximum is left to assign.
    #[error("No display number left for row {index}: the maximum is already in use")]
    NumberSpaceExhausted {
        /// The row that needed a number.
        index: usize,
    },

    /// The operation was cancelled before entering the critical section.
    #[error("Operation cancelled")]
    Cancelled,

    /// An unexpected failure while computing a change. Nothing was committed.
    #[error("Unexpected failure: {0}")]
    Unexpected(String),
}

impl RowError {
    /// Creates a new invalid configuration error.
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    /// Creates a new index out of range error.
    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    /// Creates a new unexpected failure error.
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Returns `true` if the error was caused by the caller's arguments
    /// rather than by the engine.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::IndexOutOfRange { .. } | Self::VisibilityLengthMismatch { .. }
        )
    }
}
