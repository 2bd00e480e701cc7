//! `pricegrid-recon`: Multi-vendor price reconciliation.
//!
//! Pure engine crate: receives normalized sources, returns the best-price
//! matrix and the workbook built from it. No CLI or IO dependencies.

pub mod builder;
pub mod color;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod quote;
pub mod taxonomy;

pub use builder::build;
pub use config::BattleConfig;
pub use engine::reconcile;
pub use error::ReconError;
pub use model::{Category, ColumnDescriptor, MergedMatrix, ReconSummary, Source};
pub use taxonomy::{RawColumn, RuleTable};
