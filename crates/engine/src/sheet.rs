use std::collections::BTreeMap;

use crate::cell::{Cell, CellFormat, CellValue};

/// Excel's hard limit on sheet name length.
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// A rectangular merged region. Start is the origin cell; both corners inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergedRegion {
    pub start: (usize, usize),
    pub end: (usize, usize),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    cells: BTreeMap<(usize, usize), Cell>,
    pub merged_regions: Vec<MergedRegion>,
    /// Column widths in character units, only for columns that set one.
    pub column_widths: BTreeMap<usize, f64>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn set(&mut self, row: usize, col: usize, value: CellValue) {
        self.cells.entry((row, col)).or_default().value = value;
    }

    pub fn set_with_format(&mut self, row: usize, col: usize, value: CellValue, format: CellFormat) {
        self.cells.insert((row, col), Cell::with_format(value, format));
    }

    pub fn set_format(&mut self, row: usize, col: usize, format: CellFormat) {
        self.cells.entry((row, col)).or_default().format = format;
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    pub fn value(&self, row: usize, col: usize) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.cells.get(&(row, col)).map(|c| &c.value).unwrap_or(&EMPTY)
    }

    pub fn get_display(&self, row: usize, col: usize) -> String {
        self.value(row, col).raw_display()
    }

    /// Iterate cells in row-major order.
    pub fn cells_iter(&self) -> impl Iterator<Item = (&(usize, usize), &Cell)> {
        self.cells.iter()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// One past the last occupied row.
    pub fn row_count(&self) -> usize {
        self.cells.keys().map(|(r, _)| r + 1).max().unwrap_or(0)
    }

    pub fn merge(&mut self, start: (usize, usize), end: (usize, usize)) {
        self.merged_regions.push(MergedRegion { start, end });
    }

    /// True for cells covered by a merge but not its origin.
    pub fn is_merge_hidden(&self, row: usize, col: usize) -> bool {
        self.merged_regions.iter().any(|m| {
            row >= m.start.0
                && row <= m.end.0
                && col >= m.start.1
                && col <= m.end.1
                && (row, col) != m.start
        })
    }

    pub fn set_column_width(&mut self, col: usize, width: f64) {
        self.column_widths.insert(col, width);
    }
}

/// Make `raw` usable as a sheet name: strip characters Excel forbids,
/// trim surrounding quotes, and cap the length. Never returns an empty name.
pub fn sanitize_sheet_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .collect();
    let cleaned = cleaned.trim().trim_matches('\'').trim();
    let truncated: String = cleaned.chars().take(MAX_SHEET_NAME_LEN).collect();
    if truncated.is_empty() {
        "Sheet".to_string()
    } else {
        truncated
    }
}
