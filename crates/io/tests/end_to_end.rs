//! Payloads on disk through to an xlsx file, read back with calamine.

use std::path::PathBuf;

use calamine::{open_workbook_auto, Data, DataType, Reader};
use pricegrid_engine::cell::Rgb;
use pricegrid_io::catalog::ReferenceCatalog;
use pricegrid_io::extraction::{load_payload, load_quote};
use pricegrid_io::{json, xlsx};
use pricegrid_recon::model::Source;
use pricegrid_recon::quote::{build_quote, MARGIN_COL};
use pricegrid_recon::{build, reconcile, RuleTable};
use tempfile::tempdir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn load_sources() -> Vec<Source> {
    let catalog = ReferenceCatalog::load(&fixture("reference_db.json")).unwrap();
    let rules = RuleTable::default();
    [
        ("Sindorim", "sindorim.json", Rgb(0xFF, 0xE4, 0xB5)),
        ("Guro 1", "guro1.json", Rgb(0xE0, 0xE0, 0xFF)),
        ("Mapo", "mapo.json", Rgb(0xE0, 0xFF, 0xE0)),
    ]
    .into_iter()
    .map(|(name, file, color)| {
        load_payload(&fixture(file))
            .unwrap()
            .into_source(name, color, &rules, Some(&catalog))
    })
    .collect()
}

#[test]
fn payloads_reconcile_across_shapes() {
    let sources = load_sources();
    let matrix = reconcile(&sources).unwrap();

    // SM-S921N and S24 both resolve to the catalog name; the sentinel is gone
    assert_eq!(matrix.models, vec!["A35", "Flip7", "갤럭시 S24"]);

    let cell = |model: &str, idx: usize| {
        matrix
            .cell(model, pricegrid_recon::Category::ALL[idx])
            .and_then(|c| c.best.as_ref())
            .map(|w| (w.price, w.source_name.as_str()))
    };
    assert_eq!(cell("갤럭시 S24", 0), Some((45.0, "Sindorim")));
    assert_eq!(cell("갤럭시 S24", 2), Some((35.0, "Guro 1")));
    assert_eq!(cell("갤럭시 S24", 3), Some((99.0, "Mapo")));
    assert_eq!(cell("A35", 0), Some((1060.0, "Mapo")));
    assert_eq!(cell("A35", 1), None);
    assert_eq!(cell("Flip7", 1), Some((-5.0, "Sindorim")));
    // "문의" is text, so Sindorim's empty cell leaves nothing
    assert_eq!(cell("Flip7", 2), None);

    let plan = &matrix.cell("갤럭시 S24", pricegrid_recon::Category::ALL[2]).unwrap().best;
    assert_eq!(plan.as_ref().unwrap().plan_label, "5GX 프라임");
}

#[test]
fn battle_workbook_reads_back() {
    let sources = load_sources();
    let matrix = reconcile(&sources).unwrap();
    let wb = build(&matrix, &sources);

    let dir = tempdir().unwrap();
    let path = dir.path().join("battle.xlsx");
    xlsx::save(&wb, &path).unwrap();

    let mut book = open_workbook_auto(&path).unwrap();
    assert_eq!(
        book.sheet_names(),
        vec!["Best Prices", "Raw - Sindorim", "Raw - Guro 1", "Raw - Mapo"]
    );

    let values = book.worksheet_range("Best Prices").unwrap();
    let formulas = book.worksheet_formula("Best Prices").unwrap();

    // vendor offsets in B2:B4, header on row 6, models from row 7
    assert_eq!(values.get_value((1, 0)), Some(&Data::String("Sindorim".into())));
    assert_eq!(values.get_value((3, 1)).and_then(|d| d.as_f64()), Some(0.0));
    assert_eq!(values.get_value((5, 0)), Some(&Data::String("Model".into())));
    assert_eq!(values.get_value((6, 0)), Some(&Data::String("A35".into())));

    // A35, subsidy / port-in: Mapo's 1060 tied to Mapo's offset
    assert_eq!(formulas.get_value((6, 1)).map(String::as_str), Some("1060+$B$4"));
    // negative winner keeps its sign in the formula
    assert_eq!(formulas.get_value((7, 3)).map(String::as_str), Some("-5+$B$2"));
    // absent cell
    assert_eq!(values.get_value((6, 3)), Some(&Data::String("-".into())));

    let raw_formulas = book.worksheet_formula("Raw - Guro 1").unwrap();
    assert_eq!(raw_formulas.get_value((3, 1)).map(String::as_str), Some("45+$B$1"));
    let raw_values = book.worksheet_range("Raw - Guro 1").unwrap();
    assert_eq!(raw_values.get_value((4, 2)), Some(&Data::String("문의".into())));
}

#[test]
fn quote_workbook_reads_back() {
    let quote = load_quote(&fixture("quote.json")).unwrap();
    let wb = build_quote(&quote, 3.0);

    let bytes = xlsx::to_bytes(&wb).unwrap();
    let dir = tempdir().unwrap();
    let path = dir.path().join("quote.xlsx");
    std::fs::write(&path, bytes).unwrap();

    let mut book = open_workbook_auto(&path).unwrap();
    let values = book.worksheet_range("Quote").unwrap();
    let formulas = book.worksheet_formula("Quote").unwrap();

    assert_eq!(values.get_value((1, MARGIN_COL as u32)).and_then(|d| d.as_f64()), Some(3.0));
    assert_eq!(values.get_value((1, 1)).and_then(|d| d.as_f64()), Some(1155.0));
    assert_eq!(formulas.get_value((1, 3)).map(String::as_str), Some("45-$Q$2"));
    assert_eq!(formulas.get_value((1, 5)).map(String::as_str), Some("-3-$Q$2"));
    assert_eq!(values.get_value((1, 6)), Some(&Data::String("call".into())));
    assert_eq!(formulas.get_value((2, 3)).map(String::as_str), Some("20-$Q$2"));
}

#[test]
fn matrix_json_names_winners() {
    let sources = load_sources();
    let matrix = reconcile(&sources).unwrap();
    let text = json::export_matrix(&matrix).unwrap();
    let v: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(v["sources"][2], "Mapo");
    assert_eq!(v["cells"][0]["best"]["source_name"], "Mapo");
    assert_eq!(v["cells"][0]["best"]["color"], "#E0FFE0");
}
