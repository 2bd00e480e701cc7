//! Reference catalog: canonical model names with their device codes, plus
//! the known plan names. Built from raw device/plan dumps and used to
//! canonicalize model ids before sources are constructed.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use log::info;
use pricegrid_recon::model::Selection;
use serde::{Deserialize, Serialize};

use crate::error::{read_to_string, write_bytes, IoError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogModel {
    pub name: String,
    pub codes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceCatalog {
    pub models: Vec<CatalogModel>,
    pub plans: Vec<String>,
}

/// One entry of a device dump. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceRecord {
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub device_name: Option<String>,
}

/// One entry of a plan dump. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanRecord {
    #[serde(default)]
    pub plan_name: Option<String>,
}

fn present(s: &Option<String>) -> Option<&str> {
    s.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl ReferenceCatalog {
    /// Models keep first-seen order with sorted, de-duplicated codes; a
    /// record needs both a model name and a device code to count. Plans
    /// are sorted and de-duplicated.
    pub fn build(devices: &[DeviceRecord], plans: &[PlanRecord]) -> Self {
        let mut order: Vec<&str> = Vec::new();
        let mut codes: HashMap<&str, BTreeSet<&str>> = HashMap::new();
        for d in devices {
            let (Some(model), Some(code)) = (present(&d.model_name), present(&d.device_name)) else {
                continue;
            };
            codes
                .entry(model)
                .or_insert_with(|| {
                    order.push(model);
                    BTreeSet::new()
                })
                .insert(code);
        }

        let models = order
            .into_iter()
            .map(|name| CatalogModel {
                name: name.to_string(),
                codes: codes
                    .get(name)
                    .map(|c| c.iter().map(|s| s.to_string()).collect())
                    .unwrap_or_default(),
            })
            .collect();

        let plans: BTreeSet<&str> = plans.iter().filter_map(|p| present(&p.plan_name)).collect();

        Self {
            models,
            plans: plans.into_iter().map(str::to_string).collect(),
        }
    }

    /// Read device and plan dumps (JSON arrays) and build a catalog.
    pub fn build_from_files(devices: &Path, plans: &Path) -> Result<Self, IoError> {
        let device_records: Vec<DeviceRecord> = parse_json(devices)?;
        let plan_records: Vec<PlanRecord> = parse_json(plans)?;
        let catalog = Self::build(&device_records, &plan_records);
        info!(
            "catalog: {} model(s) from {} device record(s), {} plan(s)",
            catalog.models.len(),
            device_records.len(),
            catalog.plans.len()
        );
        Ok(catalog)
    }

    pub fn from_json(text: &str) -> Result<Self, IoError> {
        serde_json::from_str(text).map_err(|e| IoError::Json(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, IoError> {
        parse_json(path)
    }

    pub fn to_json(&self) -> Result<String, IoError> {
        serde_json::to_string_pretty(self).map_err(|e| IoError::Json(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> Result<(), IoError> {
        write_bytes(path, self.to_json()?.as_bytes())
    }

    /// Canonical name for `id`: exact, case-insensitive match on a model
    /// name or any of its codes.
    pub fn canonical_model(&self, id: &str) -> Option<&str> {
        let needle = id.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.models
            .iter()
            .find(|m| {
                m.name.to_lowercase() == needle || m.codes.iter().any(|c| c.to_lowercase() == needle)
            })
            .map(|m| m.name.as_str())
    }

    /// `selection` with its model ids mapped the way row ids are, so a
    /// filter written with device codes still matches canonical rows.
    /// Unknown ids are kept as written.
    pub fn canonical_selection(&self, selection: &Selection) -> Selection {
        Selection {
            models: selection
                .models
                .iter()
                .map(|id| self.canonical_model(id).map_or_else(|| id.clone(), str::to_string))
                .collect(),
            columns: selection.columns.clone(),
        }
    }
}

fn parse_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, IoError> {
    let text = read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| IoError::Payload {
        source: path.display().to_string(),
        message: e.to_string(),
    })
}
