//! Ordered cell content of a row

use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;

use super::CellValue;

/// The cells of a row, keyed by column name in insertion order.
///
/// # Example
///
/// ```
/// use rowgrid_lib::model::RowContent;
///
/// let content = RowContent::new()
///     .set("name", "Widget")
///     .set("qty", 3i64);
///
/// assert_eq!(content.len(), 2);
/// assert!(!content.is_blank());
/// assert!(RowContent::new().set("name", "  ").is_blank());
/// assert_eq!(content.columns().collect::<Vec<_>>(), ["name", "qty"]);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowContent {
    cells: IndexMap<String, CellValue>,
}

impl RowContent {
    /// Creates new content with no cells.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a cell value (builder pattern).
    pub fn set(mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.cells.insert(column.into(), value.into());
        self
    }

    /// Inserts a cell value, returning the previous one.
    pub fn insert(
        &mut self,
        column: impl Into<String>,
        value: impl Into<CellValue>,
    ) -> Option<CellValue> {
        self.cells.insert(column.into(), value.into())
    }

    /// Removes a cell, keeping the order of the others.
    pub fn remove(&mut self, column: &str) -> Option<CellValue> {
        self.cells.shift_remove(column)
    }

    /// Returns a reference to the cell value, if the column exists.
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column)
    }

    /// Returns the number of cells, blank ones included.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if there are no cells at all.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns `true` if every cell is blank (or there are none).
    pub fn is_blank(&self) -> bool {
        self.cells.values().all(CellValue::is_blank)
    }

    /// Returns `true` if there is at least one cell and none is blank.
    pub fn is_filled(&self) -> bool {
        !self.cells.is_empty() && self.cells.values().all(|v| !v.is_blank())
    }

    /// Removes every cell.
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Iterates column names in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    /// Iterates `(column, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<CellValue>> FromIterator<(K, V)> for RowContent {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            cells: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
