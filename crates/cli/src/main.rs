// pricegrid CLI - multi-vendor price battles from extracted vendor tables

mod battle;
mod catalog;
mod convert;
mod exit_codes;

use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use pricegrid_io::IoError;
use pricegrid_recon::ReconError;

use battle::BattleCommands;
use catalog::CatalogCommands;
use exit_codes::{io_exit_code, recon_exit_code, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "pgrid")]
#[command(about = "Reconcile vendor price tables into one best-price workbook")]
#[command(version)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile several vendors' price tables
    Battle {
        #[command(subcommand)]
        command: BattleCommands,
    },

    /// Turn one vendor's quote payload into a quote sheet
    #[command(after_help = "\
Examples:
  pgrid convert quote.json
  pgrid convert quote.json -o store.xlsx --margin 3")]
    Convert {
        /// Quote payload (JSON, optionally fenced)
        input: std::path::PathBuf,

        /// Output workbook (default: input with .xlsx extension)
        #[arg(long, short = 'o')]
        output: Option<std::path::PathBuf>,

        /// Initial value of the margin cell
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        margin: f64,
    },

    /// Reference catalog maintenance
    Catalog {
        #[command(subcommand)]
        command: CatalogCommands,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        None => {
            eprintln!("Usage: pgrid <command> [options]");
            eprintln!("       pgrid --help for more information");
            Ok(())
        }
        Some(Commands::Battle { command }) => battle::cmd_battle(command),
        Some(Commands::Convert { input, output, margin }) => convert::cmd_convert(input, output, margin),
        Some(Commands::Catalog { command }) => catalog::cmd_catalog(command),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<IoError> for CliError {
    fn from(err: IoError) -> Self {
        Self { code: io_exit_code(&err), message: err.to_string(), hint: None }
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::DuplicateSource(_) => Some("every [[sources]] entry needs its own name".to_string()),
            ReconError::InvalidColor { .. } => Some("colors look like \"#FFE4B5\"".to_string()),
            _ => None,
        };
        Self { code: recon_exit_code(&err), message: err.to_string(), hint }
    }
}
