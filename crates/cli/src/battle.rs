//! `pgrid battle`: config-driven price battle across vendors.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use log::info;
use pricegrid_io::catalog::ReferenceCatalog;
use pricegrid_io::extraction::load_payload;
use pricegrid_io::json::BattleReport;
use pricegrid_io::{xlsx, IoError};
use pricegrid_recon::model::{MergedMatrix, Source};
use pricegrid_recon::{build, reconcile, BattleConfig};

use crate::exit_codes::EXIT_USAGE;
use crate::CliError;

const PAYLOAD_HINT: &str = "a payload is {\"table\": [[...]]} or {\"columns\": [...], \"rows\": [...]}";

#[derive(Subcommand)]
pub enum BattleCommands {
    /// Reconcile the sources of a battle config into a workbook
    #[command(after_help = "\
Examples:
  pgrid battle run weekly.battle.toml
  pgrid battle run weekly.battle.toml -o best.xlsx
  pgrid battle run weekly.battle.toml --json > result.json
  pgrid battle run weekly.battle.toml --output-json result.json")]
    Run {
        /// Path to the .battle.toml config file
        config: PathBuf,

        /// Output workbook (default: next to the config, named after it)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Print the JSON report to stdout
        #[arg(long)]
        json: bool,

        /// Write the JSON report to a file
        #[arg(long)]
        output_json: Option<PathBuf>,
    },

    /// Validate a battle config without running
    #[command(after_help = "\
Examples:
  pgrid battle validate weekly.battle.toml")]
    Validate {
        /// Path to the .battle.toml config file
        config: PathBuf,
    },
}

pub fn cmd_battle(cmd: BattleCommands) -> Result<(), CliError> {
    match cmd {
        BattleCommands::Run { config, output, json, output_json } => {
            cmd_battle_run(config, output, json, output_json)
        }
        BattleCommands::Validate { config } => cmd_battle_validate(config),
    }
}

fn load_config(path: &Path) -> Result<BattleConfig, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::new(EXIT_USAGE, format!("cannot read config {}: {e}", path.display())))?;
    Ok(BattleConfig::from_toml(&text)?)
}

/// `weekly.battle.toml` -> `weekly.xlsx`, in the config's directory.
fn default_output(config_path: &Path) -> PathBuf {
    let file_name = config_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("battle");
    let stem = file_name.strip_suffix(".toml").unwrap_or(file_name);
    let stem = stem.strip_suffix(".battle").unwrap_or(stem);
    config_path.with_file_name(format!("{stem}.xlsx"))
}

/// Load every payload and turn it into a source, in config order.
fn load_sources(config: &BattleConfig, base_dir: &Path) -> Result<Vec<Source>, CliError> {
    let catalog = match &config.catalog {
        Some(file) => Some(ReferenceCatalog::load(&base_dir.join(file))?),
        None => None,
    };
    let rules = config.rule_table();
    let colors = config.source_colors();

    config
        .sources
        .iter()
        .zip(colors)
        .map(|(cfg, color)| -> Result<Source, CliError> {
            let extraction = load_payload(&base_dir.join(&cfg.file)).map_err(|e| {
                let is_payload = matches!(e, IoError::Payload { .. });
                let err = CliError::from(e);
                if is_payload { err.with_hint(PAYLOAD_HINT) } else { err }
            })?;
            let selection = match &catalog {
                Some(c) => c.canonical_selection(&cfg.selection()),
                None => cfg.selection(),
            };
            Ok(extraction
                .into_source(&cfg.name, color, &rules, catalog.as_ref())
                .with_selection(selection))
        })
        .collect()
}

fn summary_line(name: &str, matrix: &MergedMatrix) -> String {
    let s = matrix.summary();
    let wins = s
        .wins
        .iter()
        .map(|w| format!("{} {}", w.source, w.wins))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "battle '{name}': {} model(s), {} cell(s), {} absent; wins: {wins}",
        s.models, s.total_cells, s.absent
    )
}

fn cmd_battle_run(
    config_path: PathBuf,
    output: Option<PathBuf>,
    json_output: bool,
    output_json: Option<PathBuf>,
) -> Result<(), CliError> {
    let config = load_config(&config_path)?;

    // Payload paths are relative to the config file's directory
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let sources = load_sources(&config, base_dir)?;

    let matrix = reconcile(&sources)?;
    let workbook = build(&matrix, &sources);

    let xlsx_path = output.unwrap_or_else(|| default_output(&config_path));
    xlsx::save(&workbook, &xlsx_path)?;
    info!("wrote {} sheet(s) to {}", workbook.sheet_count(), xlsx_path.display());

    if json_output || output_json.is_some() {
        let report = BattleReport::new(&config.name, &matrix);
        if let Some(ref path) = output_json {
            report.save(path)?;
            eprintln!("wrote {}", path.display());
        }
        if json_output {
            println!("{}", report.to_json()?);
        }
    }

    eprintln!("{}", summary_line(&config.name, &matrix));
    eprintln!("wrote {}", xlsx_path.display());
    Ok(())
}

fn cmd_battle_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    eprintln!(
        "valid: battle '{}' with {} source(s){}",
        config.name,
        config.sources.len(),
        if config.catalog.is_some() { ", catalog" } else { "" },
    );
    Ok(())
}
