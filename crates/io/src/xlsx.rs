// Excel (.xlsx) output

use std::path::Path;

use log::debug;
use pricegrid_engine::cell::{Alignment, CellFormat, CellValue};
use pricegrid_engine::offset::OffsetId;
use pricegrid_engine::sheet::Sheet;
use pricegrid_engine::workbook::Workbook;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Formula, Workbook as XlsxWorkbook, Worksheet};

use crate::error::{write_bytes, IoError};

/// Written in place of a missing best price.
pub const ABSENT_MARKER: &str = "-";

/// Last zero-based row and column an xlsx sheet can hold.
const XLSX_MAX_ROW: usize = 1_048_575;
const XLSX_MAX_COL: usize = 16_383;

/// Serialize a workbook to xlsx bytes.
pub fn to_bytes(workbook: &Workbook) -> Result<Vec<u8>, IoError> {
    let mut xlsx = XlsxWorkbook::new();
    let mut formulas = 0;

    for (sheet_idx, sheet) in workbook.sheets().iter().enumerate() {
        let worksheet = xlsx
            .add_worksheet()
            .set_name(&sheet.name)
            .map_err(|e| IoError::Xlsx(format!("failed to create sheet '{}': {}", sheet.name, e)))?;

        // Merges first: merge_range() blanks the whole range, then the origin
        // cell is overwritten with its typed value below.
        for merge in &sheet.merged_regions {
            if merge.start == merge.end {
                continue;
            }
            let format = sheet
                .get(merge.start.0, merge.start.1)
                .map(|c| build_excel_format(&c.format))
                .unwrap_or_default();
            let (first_row, first_col) = xlsx_cell(sheet, merge.start.0, merge.start.1)?;
            let (last_row, last_col) = xlsx_cell(sheet, merge.end.0, merge.end.1)?;
            worksheet.merge_range(first_row, first_col, last_row, last_col, "", &format)?;
        }

        formulas += export_sheet_cells(workbook, sheet_idx, sheet, worksheet)?;

        for (&col, &width) in &sheet.column_widths {
            let (_, col) = xlsx_cell(sheet, 0, col)?;
            worksheet.set_column_width(col, width)?;
        }
    }

    debug!("xlsx: {} sheet(s), {formulas} formula cell(s)", workbook.sheet_count());
    Ok(xlsx.save_to_buffer()?)
}

/// Write a workbook to `path` as xlsx.
pub fn save(workbook: &Workbook, path: &Path) -> Result<(), IoError> {
    let bytes = to_bytes(workbook)?;
    write_bytes(path, &bytes)
}

/// Returns the number of formula cells written.
fn export_sheet_cells(
    workbook: &Workbook,
    sheet_idx: usize,
    sheet: &Sheet,
    worksheet: &mut Worksheet,
) -> Result<usize, IoError> {
    let mut formulas = 0;

    for (&(row, col), cell) in sheet.cells_iter() {
        if sheet.is_merge_hidden(row, col) {
            continue;
        }
        let (row32, col16) = xlsx_cell(sheet, row, col)?;
        let format = build_excel_format(&cell.format);

        match &cell.value {
            CellValue::Empty => {
                if !cell.format.is_default() {
                    worksheet.write_blank(row32, col16, &format)?;
                }
            }
            CellValue::Text { text } => {
                worksheet.write_string_with_format(row32, col16, text, &format)?;
            }
            CellValue::Number { value } => {
                worksheet.write_number_with_format(row32, col16, *value, &format)?;
            }
            CellValue::Absent => {
                worksheet.write_string_with_format(row32, col16, ABSENT_MARKER, &format)?;
            }
            CellValue::Offset { id } => {
                let value = workbook.offset(*id).map(|o| o.value).unwrap_or(0.0);
                worksheet.write_number_with_format(row32, col16, value, &format)?;
            }
            CellValue::Adjusted { .. } => {
                let text = formula_text(workbook, sheet_idx, &cell.value)
                    .ok_or_else(|| IoError::Xlsx(format!("'{}' {}: dangling offset reference", sheet.name, cell_address(row, col))))?;
                let mut formula = Formula::new(text);
                if let Some(result) = workbook.evaluate_value(&cell.value) {
                    formula = formula.set_result(result.to_string());
                }
                worksheet.write_formula_with_format(row32, col16, formula, &format)?;
                formulas += 1;
            }
        }
    }

    Ok(formulas)
}

/// Spreadsheet formula for an `Adjusted` cell on `sheet_idx`, e.g.
/// `=45+$B$3`, or `=45+'Best Prices'!$B$3` when the offset lives on
/// another sheet. `None` for other values or a dangling offset.
pub fn formula_text(workbook: &Workbook, sheet_idx: usize, value: &CellValue) -> Option<String> {
    let CellValue::Adjusted { base, offset, op } = value else {
        return None;
    };
    Some(format!("={}{}{}", base, op.symbol(), offset_reference(workbook, sheet_idx, *offset)?))
}

fn offset_reference(workbook: &Workbook, from_sheet: usize, id: OffsetId) -> Option<String> {
    let offset = workbook.offset(id)?;
    let reference = offset.absolute_reference();
    if offset.sheet == from_sheet {
        return Some(reference);
    }
    let name = &workbook.sheet(offset.sheet)?.name;
    Some(format!("'{}'!{}", name.replace('\'', "''"), reference))
}

/// Narrow a cell position to xlsx coordinates, rejecting anything past
/// the sheet limits instead of wrapping.
fn xlsx_cell(sheet: &Sheet, row: usize, col: usize) -> Result<(u32, u16), IoError> {
    if row > XLSX_MAX_ROW || col > XLSX_MAX_COL {
        return Err(IoError::Xlsx(format!(
            "'{}' row {}, column {}: outside the xlsx grid",
            sheet.name,
            row + 1,
            col + 1
        )));
    }
    Ok((row as u32, col as u16))
}

fn cell_address(row: usize, col: usize) -> String {
    format!("{}{}", pricegrid_engine::offset::col_to_letter(col), row + 1)
}

fn build_excel_format(cell_format: &CellFormat) -> Format {
    let mut format = Format::new();

    if cell_format.bold {
        format = format.set_bold();
    }
    if let Some(size) = cell_format.font_size {
        format = format.set_font_size(size as f64);
    }
    if let Some(color) = cell_format.font_color {
        format = format.set_font_color(Color::RGB(color.to_u32()));
    }

    format = match cell_format.alignment {
        Alignment::General => format,
        Alignment::Left => format.set_align(FormatAlign::Left),
        Alignment::Center => format
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter),
        Alignment::Right => format.set_align(FormatAlign::Right),
    };

    if cell_format.wrap {
        format = format.set_text_wrap().set_align(FormatAlign::Top);
    }
    if let Some(color) = cell_format.background_color {
        format = format.set_background_color(Color::RGB(color.to_u32()));
    }
    if cell_format.border {
        format = format.set_border(FormatBorder::Thin);
    }

    format
}
