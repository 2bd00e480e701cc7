// JSON export of reconciliation results

use std::path::Path;

use pricegrid_recon::model::{MergedMatrix, ReconSummary};
use serde::Serialize;

use crate::error::{write_bytes, IoError};

/// The full result document: run metadata, summary, and every cell.
#[derive(Debug, Clone, Serialize)]
pub struct BattleReport<'a> {
    pub meta: ReportMeta,
    pub summary: ReconSummary,
    pub matrix: &'a MergedMatrix,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
}

impl<'a> BattleReport<'a> {
    pub fn new(config_name: impl Into<String>, matrix: &'a MergedMatrix) -> Self {
        Self {
            meta: ReportMeta {
                config_name: config_name.into(),
                engine_version: env!("CARGO_PKG_VERSION").to_string(),
                run_at: chrono::Utc::now().to_rfc3339(),
            },
            summary: matrix.summary(),
            matrix,
        }
    }

    pub fn to_json(&self) -> Result<String, IoError> {
        serde_json::to_string_pretty(self).map_err(|e| IoError::Json(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> Result<(), IoError> {
        write_bytes(path, self.to_json()?.as_bytes())
    }
}

/// The matrix alone. Stable for a given input: no timestamps.
pub fn export_matrix(matrix: &MergedMatrix) -> Result<String, IoError> {
    serde_json::to_string_pretty(matrix).map_err(|e| IoError::Json(e.to_string()))
}
