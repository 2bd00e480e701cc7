//! `pgrid convert`: one vendor's quote payload to a quote sheet.

use std::path::PathBuf;

use log::info;
use pricegrid_io::extraction::load_quote;
use pricegrid_io::xlsx;
use pricegrid_recon::quote::build_quote;

use crate::CliError;

pub fn cmd_convert(input: PathBuf, output: Option<PathBuf>, margin: f64) -> Result<(), CliError> {
    if !margin.is_finite() {
        return Err(CliError::args(format!("--margin must be a finite number, got {margin}")));
    }

    let quote = load_quote(&input)?;
    info!(
        "quote: {} price row(s), {} condition row(s), {} footer line(s)",
        quote.top_data.len(),
        quote.bottom_data.len(),
        quote.footer_lines.len()
    );

    let workbook = build_quote(&quote, margin);
    let output = output.unwrap_or_else(|| input.with_extension("xlsx"));
    xlsx::save(&workbook, &output)?;

    eprintln!("wrote {}", output.display());
    Ok(())
}
