//! Extraction payload decoding.
//!
//! The image-reading collaborator hands back JSON in one of two shapes:
//!
//! - grid: `{"table": [[header...], [row...], ...], "footer": <any>}`, the
//!   first header cell naming the model column;
//! - descriptor: `{"columns": [{sub_group, contract, acquisition, plan, label}],
//!   "rows": [{"model": "...", "prices": [...]}], "notes": <any>}`.
//!
//! Either may arrive wrapped in a ```json fence. Shape violations are
//! reported as [`IoError::Payload`]; cell-level oddities are not errors.

use std::path::Path;

use log::{debug, warn};
use pricegrid_engine::cell::Rgb;
use pricegrid_recon::model::{PriceCell, PriceRow, Selection, Source};
use pricegrid_recon::quote::QuoteSheet;
use pricegrid_recon::taxonomy::{RawColumn, RuleTable};
use serde::Deserialize;
use serde_json::Value;

use crate::catalog::ReferenceCatalog;
use crate::error::{read_to_string, IoError};

/// A decoded payload, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub columns: Vec<RawColumn>,
    pub rows: Vec<ExtractedRow>,
    pub notes: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedRow {
    pub model: String,
    pub cells: Vec<PriceCell>,
}

#[derive(Deserialize)]
struct GridPayload {
    table: Vec<Vec<Value>>,
    #[serde(default)]
    footer: Value,
}

#[derive(Deserialize)]
struct DescriptorPayload {
    columns: Vec<RawColumn>,
    #[serde(default)]
    rows: Vec<DescriptorRow>,
    #[serde(default)]
    notes: Value,
}

#[derive(Deserialize)]
struct DescriptorRow {
    #[serde(default)]
    model: Value,
    #[serde(default)]
    prices: Vec<Value>,
}

/// Drop a surrounding ```json ... ``` fence, if any.
pub fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").or_else(|| rest.strip_prefix("JSON")).unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Price cell from a payload value. Numbers and numeric strings (commas
/// allowed) are prices; null and blank are empty; anything else is text.
pub fn coerce_cell(value: &Value) -> PriceCell {
    match value {
        Value::Null => PriceCell::Empty,
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.is_finite() => PriceCell::Number(f),
            _ => PriceCell::Text(n.to_string()),
        },
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return PriceCell::Empty;
            }
            match s.replace(',', "").parse::<f64>() {
                Ok(f) if f.is_finite() => PriceCell::Number(f),
                _ => PriceCell::Text(s.to_string()),
            }
        }
        other => PriceCell::Text(other.to_string()),
    }
}

/// Text of a header or model cell.
fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn payload_error(source: &str, message: impl Into<String>) -> IoError {
    IoError::Payload { source: source.to_string(), message: message.into() }
}

/// Decode a payload. `source` names it in error messages.
pub fn parse_payload(text: &str, source: &str) -> Result<Extraction, IoError> {
    let value: Value =
        serde_json::from_str(strip_fences(text)).map_err(|e| payload_error(source, e.to_string()))?;

    let (is_grid, is_descriptor) = match &value {
        Value::Object(map) => (map.contains_key("table"), map.contains_key("columns")),
        _ => return Err(payload_error(source, "expected a JSON object")),
    };

    if is_grid {
        let grid: GridPayload =
            serde_json::from_value(value).map_err(|e| payload_error(source, e.to_string()))?;
        from_grid(grid, source)
    } else if is_descriptor {
        let desc: DescriptorPayload =
            serde_json::from_value(value).map_err(|e| payload_error(source, e.to_string()))?;
        Ok(from_descriptor(desc))
    } else {
        Err(payload_error(source, "expected a \"table\" or \"columns\" key"))
    }
}

fn from_grid(grid: GridPayload, source: &str) -> Result<Extraction, IoError> {
    let mut table = grid.table.into_iter();
    let header = table.next().ok_or_else(|| payload_error(source, "table has no header row"))?;
    if header.len() < 2 {
        return Err(payload_error(source, "header needs a model column and at least one price column"));
    }

    let columns: Vec<RawColumn> =
        header[1..].iter().map(|h| RawColumn::from_label(value_text(h))).collect();
    let rows = table
        .filter(|r| !r.is_empty())
        .map(|r| {
            let model = value_text(&r[0]);
            if r.len() > header.len() {
                warn!(
                    "{source}: row '{model}' has {} cell(s) past the {} header column(s)",
                    r.len() - header.len(),
                    columns.len()
                );
            }
            ExtractedRow { model, cells: r[1..].iter().map(coerce_cell).collect() }
        })
        .collect();

    Ok(Extraction { columns, rows, notes: grid.footer })
}

fn from_descriptor(desc: DescriptorPayload) -> Extraction {
    let rows = desc
        .rows
        .into_iter()
        .map(|r| ExtractedRow {
            model: value_text(&r.model),
            cells: r.prices.iter().map(coerce_cell).collect(),
        })
        .collect();
    Extraction { columns: desc.columns, rows, notes: desc.notes }
}

pub fn load_payload(path: &Path) -> Result<Extraction, IoError> {
    parse_payload(&read_to_string(path)?, &path.display().to_string())
}

impl Extraction {
    /// Normalize columns, canonicalize model ids, and wrap the result as a
    /// [`Source`] with an "everything" selection.
    pub fn into_source(
        self,
        name: &str,
        color: Rgb,
        rules: &RuleTable,
        catalog: Option<&ReferenceCatalog>,
    ) -> Source {
        let columns: Vec<_> = self.columns.iter().map(|c| rules.normalize(c)).collect();
        for c in columns.iter().filter(|c| c.category().is_none()) {
            warn!("source '{name}': column '{}' has no acquisition type, raw sheet only", c.label);
        }

        let mut renamed = 0;
        let mut text_cells = 0;
        let rows = self
            .rows
            .into_iter()
            .map(|r| {
                let model = match catalog.and_then(|c| c.canonical_model(&r.model)) {
                    Some(canonical) if canonical != r.model => {
                        renamed += 1;
                        canonical.to_string()
                    }
                    _ => r.model,
                };
                text_cells += r.cells.iter().filter(|c| matches!(c, PriceCell::Text(_))).count();
                PriceRow::new(model, r.cells)
            })
            .collect::<Vec<_>>();

        debug!(
            "source '{name}': {} column(s), {} row(s), {renamed} model id(s) canonicalized, {text_cells} text cell(s)",
            columns.len(),
            rows.len()
        );

        Source::new(name, color, columns)
            .with_rows(rows)
            .with_notes(self.notes)
            .with_selection(Selection::all())
    }
}

pub fn parse_quote(text: &str, source: &str) -> Result<QuoteSheet, IoError> {
    serde_json::from_str(strip_fences(text)).map_err(|e| payload_error(source, e.to_string()))
}

pub fn load_quote(path: &Path) -> Result<QuoteSheet, IoError> {
    parse_quote(&read_to_string(path)?, &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricegrid_recon::model::{AcquisitionType, ContractType};
    use serde_json::json;

    #[test]
    fn fences_are_stripped() {
        assert_eq!(strip_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_fences("  ```\n[]\n```  "), "[]");
        assert_eq!(strip_fences("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn cell_coercion() {
        assert_eq!(coerce_cell(&json!(45)), PriceCell::Number(45.0));
        assert_eq!(coerce_cell(&json!(-5.5)), PriceCell::Number(-5.5));
        assert_eq!(coerce_cell(&json!("1,155")), PriceCell::Number(1155.0));
        assert_eq!(coerce_cell(&json!(" -27 ")), PriceCell::Number(-27.0));
        assert_eq!(coerce_cell(&json!(null)), PriceCell::Empty);
        assert_eq!(coerce_cell(&json!("  ")), PriceCell::Empty);
        assert_eq!(coerce_cell(&json!("문의")), PriceCell::Text("문의".into()));
        assert_eq!(coerce_cell(&json!("NaN")), PriceCell::Text("NaN".into()));
        assert_eq!(coerce_cell(&json!(true)), PriceCell::Text("true".into()));
    }

    #[test]
    fn grid_payload() {
        let text = r#"```json
{"table": [["모델", "SK_번이", "SK_기변"], ["S24", 45, "30"], ["Flip7", null], []],
 "footer": "부가 3개월"}
```"#;
        let e = parse_payload(text, "guro.json").unwrap();
        assert_eq!(e.columns.len(), 2);
        assert_eq!(e.columns[0].label.as_deref(), Some("SK_번이"));
        assert_eq!(e.rows.len(), 2);
        assert_eq!(e.rows[0].cells, vec![PriceCell::Number(45.0), PriceCell::Number(30.0)]);
        assert_eq!(e.rows[1].model, "Flip7");
        assert_eq!(e.rows[1].cells, vec![PriceCell::Empty]);
        assert_eq!(e.notes, json!("부가 3개월"));
    }

    #[test]
    fn grid_row_longer_than_header_keeps_its_cells() {
        let e = parse_payload(r#"{"table": [["모델", "SK_번이"], ["S24", 45, 99]]}"#, "t").unwrap();
        assert_eq!(e.columns.len(), 1);
        assert_eq!(e.rows[0].cells, vec![PriceCell::Number(45.0), PriceCell::Number(99.0)]);
    }

    #[test]
    fn descriptor_payload() {
        let text = json!({
            "columns": [
                {"sub_group": "SK", "contract": "선택약정", "acquisition": "번호이동", "plan": "5GX_P"},
                {"label": "KT_기변"}
            ],
            "rows": [{"model": "S24", "prices": [50, "n/a"]}],
            "notes": ["a", "b"]
        })
        .to_string();
        let e = parse_payload(&text, "mapo.json").unwrap();
        let source = e.into_source("Mapo", Rgb::WHITE, &RuleTable::default(), None);
        assert_eq!(source.columns[0].contract, ContractType::SelectCommitment);
        assert_eq!(source.columns[0].acquisition, Some(AcquisitionType::PortIn));
        assert_eq!(source.columns[0].plan_label, "5GX 프라임");
        assert_eq!(source.columns[1].acquisition, Some(AcquisitionType::DeviceChange));
        assert_eq!(source.rows[0].prices[1], PriceCell::Text("n/a".into()));
        assert_eq!(source.notes, json!(["a", "b"]));
    }

    #[test]
    fn catalog_canonicalizes_models() {
        let catalog = ReferenceCatalog::from_json(
            r#"{"models": [{"name": "갤럭시 S24", "codes": ["S24", "SM-S921N"]}], "plans": []}"#,
        )
        .unwrap();
        let e = parse_payload(
            r#"{"table": [["model", "SK_번이"], ["s24", 1], ["Mystery", 2]]}"#,
            "t",
        )
        .unwrap();
        let source = e.into_source("A", Rgb::WHITE, &RuleTable::default(), Some(&catalog));
        assert_eq!(source.rows[0].model, "갤럭시 S24");
        assert_eq!(source.rows[1].model, "Mystery");
    }

    #[test]
    fn shape_violations() {
        assert!(matches!(parse_payload("not json", "x"), Err(IoError::Payload { .. })));
        assert!(matches!(parse_payload("[1, 2]", "x"), Err(IoError::Payload { .. })));
        assert!(matches!(parse_payload(r#"{"rows": []}"#, "x"), Err(IoError::Payload { .. })));
        assert!(matches!(parse_payload(r#"{"table": []}"#, "x"), Err(IoError::Payload { .. })));
        assert!(matches!(parse_payload(r#"{"table": [["model"]]}"#, "x"), Err(IoError::Payload { .. })));
        let err = parse_payload(r#"{"table": "nope"}"#, "guro.json").unwrap_err();
        assert!(err.to_string().starts_with("guro.json: invalid payload"));
    }

    #[test]
    fn quote_payload() {
        let q = parse_quote(
            "```json\n{\"top_data\": [[\"S24\", 1155]], \"footer_lines\": [\"x\"]}\n```",
            "quote.json",
        )
        .unwrap();
        assert_eq!(q.top_data.len(), 1);
        assert!(q.bottom_data.is_empty());
        assert_eq!(q.footer_lines, vec![json!("x")]);
    }
}
