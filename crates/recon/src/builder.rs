//! Workbook builder: renders a [`MergedMatrix`] and its sources into a
//! [`Workbook`].
//!
//! Winning prices are written as `Adjusted` cells tied to the winning
//! vendor's offset, raw vendor sheets tie every number to one per-sheet
//! offset. Nothing here knows about spreadsheet formula syntax; the xlsx
//! adapter decides that.

use std::collections::HashMap;

use log::{debug, warn};
use pricegrid_engine::cell::{CellFormat, CellValue, OffsetOp, Rgb};
use pricegrid_engine::offset::OffsetId;
use pricegrid_engine::workbook::Workbook;
use serde_json::Value;

use crate::model::{Category, MergedMatrix, PriceCell, Source};

pub const MERGED_SHEET_NAME: &str = "Best Prices";
pub const RAW_SHEET_PREFIX: &str = "Raw - ";
pub const HEADER_FILL: Rgb = Rgb(0xDD, 0xDD, 0xDD);

/// Merged sheet: vendor offsets start here, one row per source.
const OFFSET_HEADER_ROW: usize = 0;
/// Width of a note block in the notes section.
const NOTE_BLOCK_COLS: usize = 10;
const NOTE_BLOCK_ROWS: usize = 3;

fn header_format() -> CellFormat {
    CellFormat::bold().with_fill(HEADER_FILL).centered().with_border()
}

fn body_format() -> CellFormat {
    CellFormat::default().centered().with_border()
}

/// Free-form notes as display text. Never fails: strings are used as-is,
/// arrays become one line per element, anything else is serialized.
pub fn note_text(notes: &Value) -> String {
    match notes {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(note_text).collect::<Vec<_>>().join("\n"),
        other => other.to_string(),
    }
}

/// Build the merged sheet, one raw sheet per source, and the notes section.
pub fn build(matrix: &MergedMatrix, sources: &[Source]) -> Workbook {
    let mut wb = Workbook::new();
    let merged = wb.add_sheet_named(MERGED_SHEET_NAME);

    let vendor_offsets = write_vendor_offsets(&mut wb, merged, sources);
    let next_row = write_matrix(&mut wb, merged, matrix, &vendor_offsets);
    write_notes_section(&mut wb, merged, next_row + 1, sources);

    for source in sources {
        write_raw_sheet(&mut wb, source);
    }

    debug!(
        "built workbook: {} sheet(s), {} offset cell(s)",
        wb.sheet_count(),
        wb.offsets().len()
    );
    wb
}

/// One row per source: colored name, then its offset slot (default 0).
/// Offsets are keyed by source name, so `sources` need not be in
/// reconcile order.
fn write_vendor_offsets<'a>(
    wb: &mut Workbook,
    sheet: usize,
    sources: &'a [Source],
) -> HashMap<&'a str, OffsetId> {
    if let Some(s) = wb.sheet_mut(sheet) {
        s.set_with_format(OFFSET_HEADER_ROW, 0, CellValue::text("Vendor"), header_format());
        s.set_with_format(OFFSET_HEADER_ROW, 1, CellValue::text("Offset"), header_format());
    }

    let mut ids = HashMap::with_capacity(sources.len());
    for (i, source) in sources.iter().enumerate() {
        let row = OFFSET_HEADER_ROW + 1 + i;
        if let Some(s) = wb.sheet_mut(sheet) {
            s.set_with_format(
                row,
                0,
                CellValue::text(&source.name),
                CellFormat::bold().with_fill(source.color).with_border(),
            );
        }
        if let Some(id) = wb.add_offset(sheet, row, 1, &source.name, 0.0, body_format()) {
            ids.insert(source.name.as_str(), id);
        }
    }
    ids
}

/// Header plus one row per model. Returns the first free row.
fn write_matrix(
    wb: &mut Workbook,
    sheet: usize,
    matrix: &MergedMatrix,
    offsets: &HashMap<&str, OffsetId>,
) -> usize {
    let header_row = OFFSET_HEADER_ROW + matrix.sources.len().max(offsets.len()) + 2;
    let Some(s) = wb.sheet_mut(sheet) else {
        return header_row;
    };

    s.set_with_format(header_row, 0, CellValue::text("Model"), header_format());
    s.set_column_width(0, 20.0);
    for category in Category::ALL {
        let col = price_col(category);
        s.set_with_format(header_row, col, CellValue::text(category.label()), header_format());
        s.set_with_format(header_row, col + 1, CellValue::text("Plan"), header_format());
        s.set_column_width(col, 16.0);
        s.set_column_width(col + 1, 14.0);
    }

    let mut row = header_row + 1;
    for (model, cells) in matrix.rows() {
        s.set_with_format(row, 0, CellValue::text(model), CellFormat::default().with_border());
        for cell in cells {
            let col = price_col(cell.category);
            let winner = cell
                .best
                .as_ref()
                .and_then(|w| offsets.get(w.source_name.as_str()).map(|id| (w, *id)));
            match winner {
                Some((w, offset)) => {
                    s.set_with_format(
                        row,
                        col,
                        CellValue::Adjusted { base: w.price, offset, op: OffsetOp::Add },
                        body_format().with_fill(w.color),
                    );
                    s.set_with_format(row, col + 1, CellValue::text(&w.plan_label), body_format());
                }
                None => {
                    s.set_with_format(row, col, CellValue::Absent, body_format());
                    s.set_with_format(row, col + 1, CellValue::Empty, body_format());
                }
            }
        }
        row += 1;
    }
    row
}

fn price_col(category: Category) -> usize {
    1 + category.index() * 2
}

/// Every source's notes, ordered by source name.
fn write_notes_section(wb: &mut Workbook, sheet: usize, start_row: usize, sources: &[Source]) {
    let Some(s) = wb.sheet_mut(sheet) else {
        return;
    };
    let mut row = start_row;
    s.set_with_format(
        row,
        0,
        CellValue::text("Conditions"),
        CellFormat { font_size: Some(12.0), ..CellFormat::bold() },
    );
    row += 1;

    let mut ordered: Vec<&Source> = sources.iter().collect();
    ordered.sort_by(|a, b| a.name.cmp(&b.name));

    for source in ordered {
        s.set_with_format(
            row,
            0,
            CellValue::text(format!("■ {}", source.name)),
            CellFormat::bold().with_fill(source.color),
        );
        s.merge((row, 0), (row, 4));
        row += 1;

        s.set_with_format(row, 0, CellValue::text(note_text(&source.notes)), CellFormat::default().wrapped());
        s.merge((row, 0), (row + NOTE_BLOCK_ROWS - 1, NOTE_BLOCK_COLS - 1));
        row += NOTE_BLOCK_ROWS;
    }
}

/// The source's full, unfiltered table. Numbers are tied to one global
/// offset for the sheet; text cells are copied; empty cells stay empty.
fn write_raw_sheet(wb: &mut Workbook, source: &Source) {
    let sheet = wb.add_sheet_named(&format!("{RAW_SHEET_PREFIX}{}", source.name));
    let Some(offset) = wb.add_offset(sheet, 0, 1, format!("{} (raw)", source.name), 0.0, body_format())
    else {
        return;
    };
    let Some(s) = wb.sheet_mut(sheet) else {
        return;
    };

    s.set_with_format(0, 0, CellValue::text("Offset"), header_format());

    let header_row = 2;
    s.set_with_format(header_row, 0, CellValue::text("Model"), header_format());
    s.set_column_width(0, 20.0);
    for (i, column) in source.columns.iter().enumerate() {
        s.set_with_format(header_row, i + 1, CellValue::text(&column.label), header_format());
        s.set_column_width(i + 1, 12.0);
    }

    let mut row = header_row + 1;
    for price_row in &source.rows {
        if price_row.prices.len() > source.columns.len() {
            warn!(
                "{}: row '{}' has {} cell(s) for {} column(s), extra cells left off the raw sheet",
                source.name,
                price_row.model,
                price_row.prices.len(),
                source.columns.len()
            );
        }
        s.set_with_format(row, 0, CellValue::text(&price_row.model), CellFormat::default().with_border());
        for i in 0..source.columns.len() {
            let value = match price_row.cell(i) {
                PriceCell::Number(n) if n.is_finite() => {
                    CellValue::Adjusted { base: *n, offset, op: OffsetOp::Add }
                }
                PriceCell::Number(_) | PriceCell::Empty => CellValue::Empty,
                PriceCell::Text(t) => CellValue::text(t),
            };
            s.set_with_format(row, i + 1, value, body_format());
        }
        row += 1;
    }

    row += 1;
    s.set_with_format(row, 0, CellValue::text("Conditions"), CellFormat::bold());
    row += 1;
    s.set_with_format(row, 0, CellValue::text(note_text(&source.notes)), CellFormat::default().wrapped());
    s.merge((row, 0), (row + NOTE_BLOCK_ROWS - 1, NOTE_BLOCK_COLS - 1));
}
