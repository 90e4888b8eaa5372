//! Row management configuration

use serde::Deserialize;
use serde::Serialize;

use crate::error::RowError;

/// Structural rules applied by add, delete and expand operations.
///
/// Passed explicitly with every call; the engine keeps no "current"
/// configuration between calls.
///
/// # Example
///
/// ```
/// use rowgrid_lib::config::RowManagementConfiguration;
///
/// let config = RowManagementConfiguration::default()
///     .with_minimum_rows(14)
///     .with_auto_expand(true);
///
/// assert!(config.validate().is_ok());
/// assert!(RowManagementConfiguration::new().with_minimum_rows(0).validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowManagementConfiguration {
    /// Lower bound on the number of rows.
    ///
    /// Default: 1
    pub minimum_rows: usize,

    /// Append an empty row when the trailing empty row receives data.
    ///
    /// Also gates the explicit `auto_expand_trailing_empty` call.
    ///
    /// Default: true
    pub enable_auto_expand: bool,

    /// Clear-and-shift instead of removing rows when at the floor.
    ///
    /// Default: true
    pub enable_smart_delete: bool,

    /// Keep an empty row at the end of the grid.
    ///
    /// Adds, deletes and edits restore the trailing empty row while this is
    /// on, independent of `enable_auto_expand`, and deletes never remove it.
    ///
    /// Default: true
    pub always_keep_last_empty: bool,

    /// Shift content upward into cleared slots at the floor.
    ///
    /// Default: true
    pub enable_row_shifting: bool,
}

impl Default for RowManagementConfiguration {
    fn default() -> Self {
        Self {
            minimum_rows: 1,
            enable_auto_expand: true,
            enable_smart_delete: true,
            always_keep_last_empty: true,
            enable_row_shifting: true,
        }
    }
}

impl RowManagementConfiguration {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset for large imports: a bigger floor, everything else default.
    pub fn bulk_import() -> Self {
        Self::default().with_minimum_rows(100)
    }

    /// Sets the row floor.
    pub fn with_minimum_rows(mut self, minimum_rows: usize) -> Self {
        self.minimum_rows = minimum_rows;
        self
    }

    /// Enables or disables auto-expand.
    pub fn with_auto_expand(mut self, enabled: bool) -> Self {
        self.enable_auto_expand = enabled;
        self
    }

    /// Enables or disables smart delete.
    pub fn with_smart_delete(mut self, enabled: bool) -> Self {
        self.enable_smart_delete = enabled;
        self
    }

    /// Enables or disables the trailing empty row.
    pub fn with_keep_last_empty(mut self, enabled: bool) -> Self {
        self.always_keep_last_empty = enabled;
        self
    }

    /// Enables or disables content shifting at the floor.
    pub fn with_row_shifting(mut self, enabled: bool) -> Self {
        self.enable_row_shifting = enabled;
        self
    }

    /// Checks the configuration before any mutation uses it.
    pub fn validate(&self) -> Result<(), RowError> {
        if self.minimum_rows == 0 {
            return Err(RowError::invalid_configuration(
                "minimum_rows must be greater than 0",
            ));
        }
        Ok(())
    }
}
