//! Ordered record storage owned by a DataSet.

use crate::record::Record;

/// The ordered rows of a DataSet. Row order is insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSetData {
    records: Vec<Record>,
}

impl DataSetData {
    /// Creates empty storage.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when there are no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    /// Mutable record at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Record> {
        self.records.get_mut(index)
    }

    pub(crate) fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub(crate) fn insert(&mut self, index: usize, record: Record) {
        self.records.insert(index, record);
    }

    pub(crate) fn remove(&mut self, index: usize) -> Record {
        self.records.remove(index)
    }

    pub(crate) fn replace(&mut self, index: usize, record: Record) -> Record {
        std::mem::replace(&mut self.records[index], record)
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [Record] {
        &mut self.records
    }

    /// Iterates over records in row order.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, Record> {
        self.records.iter_mut()
    }
}

impl<'a> IntoIterator for &'a DataSetData {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for DataSetData {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl FromIterator<Record> for DataSetData {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}
