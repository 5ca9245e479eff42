//! DataSet records and versioned cells.

use crate::value::Value;

/// A cell: the primary value followed by any alternate versions.
///
/// Index 0 is always present and is the cell's own value. Versions with
/// index >= 1 are contributed when several source rows collapse onto the same
/// key, and are flattened into extra columns by denormalization.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    versions: Vec<Value>,
}

impl Cell {
    /// Creates a cell holding a single primary value.
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self {
            versions: vec![value],
        }
    }

    /// Primary value.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.versions[0]
    }

    /// Replaces the primary value, keeping alternate versions.
    pub fn set_value(&mut self, value: Value) {
        self.versions[0] = value;
    }

    /// All versions, primary first.
    #[must_use]
    pub fn versions(&self) -> &[Value] {
        &self.versions
    }

    /// Number of versions, always at least 1.
    #[must_use]
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Always `false`; a cell has at least its primary value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    fn into_primary(mut self) -> Value {
        self.versions.swap_remove(0)
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::new(Value::Null)
    }
}

/// One DataSet row, index-aligned with the DataSet's field list.
#[derive(Debug, Clone, Default)]
pub struct Record {
    cells: Vec<Cell>,
}

impl Record {
    /// Creates a record from primary values.
    #[must_use]
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            cells: values.into_iter().map(Cell::new).collect(),
        }
    }

    /// Creates a record with `len` NULL cells.
    #[must_use]
    pub fn with_len(len: usize) -> Self {
        Self::new(vec![Value::Null; len])
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` when the record has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Primary value of a cell.
    #[must_use]
    pub fn value(&self, col: usize) -> Option<&Value> {
        self.cells.get(col).map(Cell::value)
    }

    /// Replaces the primary value of a cell. Returns `false` when `col` is out
    /// of range.
    pub fn set_value(&mut self, col: usize, value: Value) -> bool {
        match self.cells.get_mut(col) {
            Some(cell) => {
                cell.set_value(value);
                true
            }
            None => false,
        }
    }

    /// Iterates over primary values.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.cells.iter().map(Cell::value)
    }

    /// Consumes the record, returning primary values.
    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.cells.into_iter().map(Cell::into_primary).collect()
    }

    /// The cell at `col`.
    #[must_use]
    pub fn cell(&self, col: usize) -> Option<&Cell> {
        self.cells.get(col)
    }

    /// Appends a cell.
    pub fn push(&mut self, cell: Cell) {
        self.cells.push(cell);
    }

    /// Inserts a cell at `col`, shifting later cells right.
    pub fn insert_cell(&mut self, col: usize, value: Value) {
        let col = col.min(self.cells.len());
        self.cells.insert(col, Cell::new(value));
    }

    /// Removes the cell at `col`.
    pub fn remove_cell(&mut self, col: usize) -> Option<Cell> {
        (col < self.cells.len()).then(|| self.cells.remove(col))
    }

    /// Pads with NULL or truncates to exactly `len` cells.
    pub fn resize(&mut self, len: usize) {
        self.cells.resize_with(len, Cell::default);
    }

    /// Appends an alternate version to a cell. Returns `false` when `col` is
    /// out of range.
    pub fn add_version(&mut self, col: usize, value: Value) -> bool {
        match self.cells.get_mut(col) {
            Some(cell) => {
                cell.versions.push(value);
                true
            }
            None => false,
        }
    }

    /// Returns version `idx` of a cell; version 0 is the primary value.
    #[must_use]
    pub fn version(&self, col: usize, idx: usize) -> Option<&Value> {
        self.cells.get(col)?.versions.get(idx)
    }

    /// Removes version `idx` of a cell and returns it.
    ///
    /// Version 0 is the primary value and is never removed; asking for it, or
    /// for an index past the end, leaves the cell untouched and returns
    /// `None`.
    pub fn remove_version(&mut self, col: usize, idx: usize) -> Option<Value> {
        let cell = self.cells.get_mut(col)?;
        (idx > 0 && idx < cell.versions.len()).then(|| cell.versions.remove(idx))
    }

    /// Drops every alternate version of a cell.
    pub fn clear_versions(&mut self, col: usize) {
        if let Some(cell) = self.cells.get_mut(col) {
            cell.versions.truncate(1);
        }
    }

    /// Number of versions of a cell; 0 only when `col` does not exist.
    #[must_use]
    pub fn number_of_versions(&self, col: usize) -> usize {
        self.cells.get(col).map_or(0, Cell::len)
    }

    /// Checks whether any version of a cell matches `value`.
    ///
    /// When `case_sensitive` is `false` both sides are compared
    /// case-insensitively; when `trimmed` is `true` surrounding whitespace is
    /// ignored on both sides. Non-text values are compared through their
    /// text form. NULL matches only NULL.
    #[must_use]
    pub fn contains(&self, col: usize, value: &Value, case_sensitive: bool, trimmed: bool) -> bool {
        let Some(cell) = self.cells.get(col) else {
            return false;
        };
        let Some(needle) = value.as_text() else {
            return cell.versions.iter().any(Value::is_null);
        };
        let needle = normalize(&needle, case_sensitive, trimmed);
        cell.versions.iter().any(|v| {
            v.as_text()
                .is_some_and(|text| normalize(&text, case_sensitive, trimmed) == needle)
        })
    }
}

fn normalize(text: &str, case_sensitive: bool, trimmed: bool) -> String {
    let text = if trimmed { text.trim() } else { text };
    if case_sensitive {
        text.to_string()
    } else {
        text.to_lowercase()
    }
}

/// Records are equal when their primary values are equal positionally;
/// alternate versions do not take part.
impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.values().eq(other.values())
    }
}

impl From<Vec<Value>> for Record {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

impl FromIterator<Value> for Record {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
