//! `pgrid catalog`: reference catalog maintenance.

use std::path::PathBuf;

use clap::Subcommand;
use pricegrid_io::catalog::ReferenceCatalog;

use crate::CliError;

#[derive(Subcommand)]
pub enum CatalogCommands {
    /// Build a reference catalog from device and plan dumps
    #[command(after_help = "\
Examples:
  pgrid catalog build --devices devices.json --plans plans.json
  pgrid catalog build --devices devices.json --plans plans.json -o reference_db.json")]
    Build {
        /// JSON array of {model_name, device_name} records
        #[arg(long)]
        devices: PathBuf,

        /// JSON array of {plan_name} records
        #[arg(long)]
        plans: PathBuf,

        /// Output file
        #[arg(long, short = 'o', default_value = "reference_db.json")]
        output: PathBuf,
    },
}

pub fn cmd_catalog(cmd: CatalogCommands) -> Result<(), CliError> {
    match cmd {
        CatalogCommands::Build { devices, plans, output } => {
            let catalog = ReferenceCatalog::build_from_files(&devices, &plans)?;
            catalog.save(&output)?;
            eprintln!(
                "catalog: {} model(s), {} plan(s) -> {}",
                catalog.models.len(),
                catalog.plans.len(),
                output.display()
            );
            Ok(())
        }
    }
}
