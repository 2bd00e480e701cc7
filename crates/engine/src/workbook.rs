use crate::cell::{CellFormat, CellValue};
use crate::offset::{OffsetCell, OffsetId, OffsetStore};
use crate::sheet::{sanitize_sheet_name, Sheet};

/// A workbook containing multiple sheets and the offset cells they share.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    sheets: Vec<Sheet>,
    offsets: OffsetStore,
}

impl Workbook {
    /// Create an empty workbook (no sheets).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn sheet(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    pub fn sheet_mut(&mut self, index: usize) -> Option<&mut Sheet> {
        self.sheets.get_mut(index)
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Case-insensitive, like Excel.
    pub fn sheet_name_exists(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.sheets.iter().any(|s| s.name.to_lowercase() == lower)
    }

    pub fn sheet_by_name(&self, name: &str) -> Option<&Sheet> {
        let lower = name.to_lowercase();
        self.sheets.iter().find(|s| s.name.to_lowercase() == lower)
    }

    /// Append a sheet and return its index. The name is sanitized and, on
    /// collision, suffixed with ` (2)`, ` (3)`, ... so it is always unique.
    pub fn add_sheet_named(&mut self, name: &str) -> usize {
        let base = sanitize_sheet_name(name);
        let mut candidate = base.clone();
        let mut n = 2;
        while self.sheet_name_exists(&candidate) {
            let suffix = format!(" ({})", n);
            let room = crate::sheet::MAX_SHEET_NAME_LEN.saturating_sub(suffix.chars().count());
            let stem: String = base.chars().take(room).collect();
            candidate = format!("{}{}", stem, suffix);
            n += 1;
        }
        self.sheets.push(Sheet::new(candidate));
        self.sheets.len() - 1
    }

    pub fn offsets(&self) -> &OffsetStore {
        &self.offsets
    }

    /// Create an offset cell at `(row, col)` on `sheet`, write its slot, and
    /// return the handle. Returns `None` if the sheet does not exist.
    pub fn add_offset(
        &mut self,
        sheet: usize,
        row: usize,
        col: usize,
        name: impl Into<String>,
        value: f64,
        format: CellFormat,
    ) -> Option<OffsetId> {
        let target = self.sheets.get_mut(sheet)?;
        let id = self.offsets.add(name, sheet, row, col, value);
        target.set_with_format(row, col, CellValue::Offset { id }, format);
        Some(id)
    }

    pub fn offset(&self, id: OffsetId) -> Option<&OffsetCell> {
        self.offsets.get(id)
    }

    pub fn offset_by_name(&self, name: &str) -> Option<&OffsetCell> {
        self.offsets.by_name(name)
    }

    /// Change an offset's value. Every adjusted cell that references it
    /// evaluates against the new value; stored literals are untouched.
    pub fn set_offset_value(&mut self, id: OffsetId, value: f64) -> bool {
        self.offsets.set_value(id, value)
    }

    /// Numeric value of a cell. Text, empty and absent cells have none.
    pub fn evaluate(&self, sheet: usize, row: usize, col: usize) -> Option<f64> {
        let sheet = self.sheets.get(sheet)?;
        self.evaluate_value(sheet.value(row, col))
    }

    pub fn evaluate_value(&self, value: &CellValue) -> Option<f64> {
        match value {
            CellValue::Number { value } => Some(*value),
            CellValue::Offset { id } => self.offsets.value(*id),
            CellValue::Adjusted { base, offset, op } => {
                Some(op.apply(*base, self.offsets.value(*offset)?))
            }
            CellValue::Empty | CellValue::Text { .. } | CellValue::Absent => None,
        }
    }

    /// Display string with offsets resolved.
    pub fn get_cell_display(&self, sheet: usize, row: usize, col: usize) -> String {
        let Some(s) = self.sheets.get(sheet) else {
            return String::new();
        };
        match s.value(row, col) {
            v @ (CellValue::Offset { .. } | CellValue::Adjusted { .. }) => self
                .evaluate_value(v)
                .map(crate::cell::format_number)
                .unwrap_or_else(|| "#REF!".to_string()),
            v => v.raw_display(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::OffsetOp;

    #[test]
    fn test_add_sheet_named_is_unique() {
        let mut wb = Workbook::new();
        assert_eq!(wb.add_sheet_named("Raw"), 0);
        assert_eq!(wb.add_sheet_named("raw"), 1);
        assert_eq!(wb.add_sheet_named("Raw"), 2);
        assert_eq!(wb.sheet_names(), vec!["Raw", "raw (2)", "Raw (3)"]);
    }

    #[test]
    fn test_add_sheet_named_truncates_before_suffix() {
        let mut wb = Workbook::new();
        let long = "y".repeat(40);
        wb.add_sheet_named(&long);
        wb.add_sheet_named(&long);
        let second = &wb.sheet(1).unwrap().name;
        assert!(second.ends_with(" (2)"));
        assert_eq!(second.chars().count(), 31);
    }

    #[test]
    fn test_offset_edit_propagates() {
        let mut wb = Workbook::new();
        let s = wb.add_sheet_named("Best");
        let id = wb.add_offset(s, 0, 1, "Guro", 0.0, CellFormat::default()).unwrap();
        wb.sheet_mut(s).unwrap().set(3, 1, CellValue::Adjusted { base: 45.0, offset: id, op: OffsetOp::Add });
        wb.sheet_mut(s).unwrap().set(4, 1, CellValue::Adjusted { base: 30.0, offset: id, op: OffsetOp::Add });

        assert_eq!(wb.evaluate(s, 3, 1), Some(45.0));
        assert!(wb.set_offset_value(id, 5.0));
        assert_eq!(wb.evaluate(s, 3, 1), Some(50.0));
        assert_eq!(wb.evaluate(s, 4, 1), Some(35.0));
        assert_eq!(wb.evaluate(s, 0, 1), Some(5.0));
        assert_eq!(wb.get_cell_display(s, 4, 1), "35");
    }

    #[test]
    fn test_subtract_offset() {
        let mut wb = Workbook::new();
        let s = wb.add_sheet_named("Quote");
        let id = wb.add_offset(s, 1, 16, "Margin", 3.0, CellFormat::default()).unwrap();
        wb.sheet_mut(s).unwrap().set(2, 1, CellValue::Adjusted { base: 10.0, offset: id, op: OffsetOp::Subtract });
        assert_eq!(wb.evaluate(s, 2, 1), Some(7.0));
    }

    #[test]
    fn test_add_offset_on_missing_sheet() {
        let mut wb = Workbook::new();
        assert!(wb.add_offset(0, 0, 0, "x", 0.0, CellFormat::default()).is_none());
        assert!(wb.offsets().is_empty());
    }

    #[test]
    fn test_non_numeric_cells_do_not_evaluate() {
        let mut wb = Workbook::new();
        let s = wb.add_sheet_named("Best");
        wb.sheet_mut(s).unwrap().set(0, 0, CellValue::Absent);
        wb.sheet_mut(s).unwrap().set(0, 1, CellValue::text("Galaxy S24"));
        assert_eq!(wb.evaluate(s, 0, 0), None);
        assert_eq!(wb.evaluate(s, 0, 1), None);
        assert_eq!(wb.evaluate(s, 9, 9), None);
        assert_eq!(wb.get_cell_display(s, 0, 0), "-");
    }
}
