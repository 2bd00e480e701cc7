//! Offset cells
//!
//! An offset cell is a named, user-editable numeric slot. Adjusted cells
//! reference it instead of embedding the adjustment, so editing the slot
//! moves every dependent price without touching the stored literals.

use serde::{Deserialize, Serialize};

/// Stable handle for an offset cell within one workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OffsetId(pub usize);

/// A named adjustment slot and where it lives in the workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffsetCell {
    pub id: OffsetId,
    /// Display name (case-insensitive for lookups, original case preserved)
    pub name: String,
    pub sheet: usize,
    pub row: usize,
    pub col: usize,
    pub value: f64,
}

impl OffsetCell {
    /// Absolute A1 reference, e.g. `$B$3`.
    pub fn absolute_reference(&self) -> String {
        format!("${}${}", col_to_letter(self.col), self.row + 1)
    }
}

/// Storage for the offset cells of one workbook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OffsetStore {
    cells: Vec<OffsetCell>,
}

impl OffsetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new offset and return its id. Ids are dense and never reused.
    pub fn add(&mut self, name: impl Into<String>, sheet: usize, row: usize, col: usize, value: f64) -> OffsetId {
        let id = OffsetId(self.cells.len());
        self.cells.push(OffsetCell {
            id,
            name: name.into(),
            sheet,
            row,
            col,
            value,
        });
        id
    }

    pub fn get(&self, id: OffsetId) -> Option<&OffsetCell> {
        self.cells.get(id.0)
    }

    /// First offset whose name matches, case-insensitively.
    pub fn by_name(&self, name: &str) -> Option<&OffsetCell> {
        let lower = name.to_lowercase();
        self.cells.iter().find(|c| c.name.to_lowercase() == lower)
    }

    pub fn set_value(&mut self, id: OffsetId, value: f64) -> bool {
        match self.cells.get_mut(id.0) {
            Some(cell) => {
                cell.value = value;
                true
            }
            None => false,
        }
    }

    pub fn value(&self, id: OffsetId) -> Option<f64> {
        self.get(id).map(|c| c.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OffsetCell> {
        self.cells.iter()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Convert column index to letter(s) (0 = A, 25 = Z, 26 = AA, etc.)
pub fn col_to_letter(col: usize) -> String {
    let mut result = String::new();
    let mut n = col;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_col_to_letter() {
        assert_eq!(col_to_letter(0), "A");
        assert_eq!(col_to_letter(25), "Z");
        assert_eq!(col_to_letter(26), "AA");
        assert_eq!(col_to_letter(27), "AB");
        assert_eq!(col_to_letter(701), "ZZ");
        assert_eq!(col_to_letter(702), "AAA");
    }

    #[test]
    fn test_absolute_reference() {
        let mut store = OffsetStore::new();
        let id = store.add("Margin", 0, 1, 16, 0.0);
        assert_eq!(store.get(id).unwrap().absolute_reference(), "$Q$2");
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut store = OffsetStore::new();
        store.add("Guro 1", 0, 0, 1, 0.0);
        let id = store.add("Sindorim", 0, 1, 1, 3.0);
        assert_eq!(store.by_name("SINDORIM").map(|c| c.id), Some(id));
        assert!(store.by_name("Mapo").is_none());
    }

    #[test]
    fn test_set_value() {
        let mut store = OffsetStore::new();
        let id = store.add("Global", 1, 0, 1, 0.0);
        assert!(store.set_value(id, 2.5));
        assert_eq!(store.value(id), Some(2.5));
        assert!(!store.set_value(OffsetId(9), 1.0));
    }
}
