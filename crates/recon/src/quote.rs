//! Single-vendor quote sheet.
//!
//! A fixed layout: a price table whose carrier columns subtract one margin
//! offset, a notice row, a condition table with merged spans, and footer
//! lines. The margin slot sits to the right of the table.

use pricegrid_engine::cell::{CellFormat, CellValue, OffsetOp, Rgb};
use pricegrid_engine::workbook::Workbook;
use serde::Deserialize;
use serde_json::Value;

use crate::builder::{note_text, HEADER_FILL};

pub const QUOTE_SHEET_NAME: &str = "Quote";

pub const TOP_HEADERS: [&str; 15] = [
    "Model",
    "Factory price",
    "Public subsidy",
    "SK port-in",
    "SK change",
    "SK card port-in",
    "SK card change",
    "KT port-in",
    "KT change",
    "KT card port-in",
    "KT card change",
    "LG port-in",
    "LG change",
    "LG card port-in",
    "LG card change",
];

/// Leading columns copied verbatim; the rest are margin-adjusted prices.
pub const VERBATIM_COLS: usize = 3;

pub const BOTTOM_HEADERS: [&str; 5] = ["Carrier", "Service condition", "Monthly fee", "Duration", "Penalty"];

/// Inclusive column span of each condition-table field.
pub const BOTTOM_SPANS: [(usize, usize); 5] = [(0, 2), (3, 7), (8, 9), (10, 11), (12, 14)];

pub const NOTICE: &str = "Prices shown are paid-in-full cash prices. Card payment is also available.";

/// Margin label and slot: Q1 / Q2.
pub const MARGIN_COL: usize = 16;
pub const MARGIN_LABEL: &str = "Extra margin";

const CONDITION_FILL: Rgb = Rgb(0xE2, 0xEF, 0xDA);
const FOOTER_FILL: Rgb = Rgb(0xF2, 0xF2, 0xF2);
const FOOTER_FONT: Rgb = Rgb(0x33, 0x33, 0x33);

/// The extraction payload for a quote sheet.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QuoteSheet {
    #[serde(default)]
    pub top_data: Vec<Vec<Value>>,
    #[serde(default)]
    pub bottom_data: Vec<Vec<Value>>,
    /// Any JSON value; non-strings are shown as their text.
    #[serde(default)]
    pub footer_lines: Vec<Value>,
}

/// A number, or a string of digits with an optional leading minus.
fn as_price(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            let digits = s.strip_prefix('-').unwrap_or(s);
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                s.parse().ok()
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Plain copy of a payload value.
fn as_cell(value: &Value) -> CellValue {
    match value {
        Value::Null => CellValue::Empty,
        Value::Number(n) => n.as_f64().map(CellValue::number).unwrap_or(CellValue::Empty),
        Value::String(s) if s.is_empty() => CellValue::Empty,
        Value::String(s) => CellValue::text(s),
        other => CellValue::text(other.to_string()),
    }
}

pub fn build_quote(quote: &QuoteSheet, margin: f64) -> Workbook {
    let mut wb = Workbook::new();
    let sheet = wb.add_sheet_named(QUOTE_SHEET_NAME);
    let last_col = TOP_HEADERS.len() - 1;
    let border = CellFormat::default().centered().with_border();

    let margin_format = CellFormat { font_size: Some(14.0), ..CellFormat::bold().centered() };
    let Some(margin_id) = wb.add_offset(sheet, 1, MARGIN_COL, MARGIN_LABEL, margin, margin_format) else {
        return wb;
    };
    let Some(s) = wb.sheet_mut(sheet) else {
        return wb;
    };

    s.set_with_format(
        0,
        MARGIN_COL,
        CellValue::text(MARGIN_LABEL),
        CellFormat { font_color: Some(Rgb::WHITE), ..CellFormat::bold().with_fill(Rgb::RED) },
    );
    s.set_column_width(MARGIN_COL, 20.0);

    for (col, header) in TOP_HEADERS.iter().enumerate() {
        s.set_with_format(0, col, CellValue::text(*header), CellFormat::bold().with_fill(HEADER_FILL).centered().with_border());
    }

    let mut row = 1;
    for data in &quote.top_data {
        for col in 0..TOP_HEADERS.len() {
            let value = data.get(col).unwrap_or(&Value::Null);
            let cell = if col < VERBATIM_COLS {
                as_cell(value)
            } else {
                match as_price(value) {
                    Some(base) => CellValue::Adjusted { base, offset: margin_id, op: OffsetOp::Subtract },
                    None => as_cell(value),
                }
            };
            s.set_with_format(row, col, cell, border.clone());
        }
        row += 1;
    }

    row += 1;
    s.set_with_format(
        row,
        0,
        CellValue::text(NOTICE),
        CellFormat { font_size: Some(14.0), font_color: Some(Rgb::RED), ..CellFormat::bold().centered() },
    );
    s.merge((row, 0), (row, last_col));
    row += 2;

    for (idx, (start, end)) in BOTTOM_SPANS.iter().enumerate() {
        s.set_with_format(
            row,
            *start,
            CellValue::text(BOTTOM_HEADERS[idx]),
            CellFormat::bold().with_fill(CONDITION_FILL).centered().with_border(),
        );
        s.merge((row, *start), (row, *end));
    }
    row += 1;

    for data in &quote.bottom_data {
        for (idx, (start, end)) in BOTTOM_SPANS.iter().enumerate() {
            let value = data.get(idx).unwrap_or(&Value::Null);
            s.set_with_format(row, *start, as_cell(value), border.clone());
            s.merge((row, *start), (row, *end));
        }
        row += 1;
    }

    row += 1;
    let footer_format = CellFormat {
        font_size: Some(9.0),
        font_color: Some(FOOTER_FONT),
        ..CellFormat::default().with_fill(FOOTER_FILL).centered().wrapped().with_border()
    };
    for line in &quote.footer_lines {
        s.set_with_format(row, 0, CellValue::text(note_text(line)), footer_format.clone());
        s.merge((row, 0), (row, last_col));
        row += 1;
    }

    wb
}
