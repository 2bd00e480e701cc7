use std::collections::BTreeSet;
use std::fmt;

use pricegrid_engine::cell::Rgb;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Taxonomy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractType {
    PublicSubsidy,
    SelectCommitment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionType {
    PortIn,
    DeviceChange,
}

/// Unit of price comparison: contract type x acquisition type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Category {
    pub contract: ContractType,
    pub acquisition: AcquisitionType,
}

impl Category {
    /// The four categories in output column order.
    pub const ALL: [Category; 4] = [
        Category::new(ContractType::PublicSubsidy, AcquisitionType::PortIn),
        Category::new(ContractType::SelectCommitment, AcquisitionType::PortIn),
        Category::new(ContractType::PublicSubsidy, AcquisitionType::DeviceChange),
        Category::new(ContractType::SelectCommitment, AcquisitionType::DeviceChange),
    ];

    pub const fn new(contract: ContractType, acquisition: AcquisitionType) -> Self {
        Self { contract, acquisition }
    }

    /// Position in [`Category::ALL`].
    pub fn index(self) -> usize {
        match (self.contract, self.acquisition) {
            (ContractType::PublicSubsidy, AcquisitionType::PortIn) => 0,
            (ContractType::SelectCommitment, AcquisitionType::PortIn) => 1,
            (ContractType::PublicSubsidy, AcquisitionType::DeviceChange) => 2,
            (ContractType::SelectCommitment, AcquisitionType::DeviceChange) => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self.index() {
            0 => "Subsidy / Port-in",
            1 => "Commitment / Port-in",
            2 => "Subsidy / Change",
            _ => "Commitment / Change",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A vendor column after normalization.
///
/// `label` is the header text the vendor used; it identifies the column in
/// selections and raw sheets. A descriptor without an acquisition type has
/// no category and is left out of reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub label: String,
    pub sub_group: String,
    pub contract: ContractType,
    pub acquisition: Option<AcquisitionType>,
    pub plan_label: String,
}

impl ColumnDescriptor {
    pub fn category(&self) -> Option<Category> {
        self.acquisition.map(|a| Category::new(self.contract, a))
    }
}

// ---------------------------------------------------------------------------
// Source table
// ---------------------------------------------------------------------------

/// One cell of a vendor's price grid.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PriceCell {
    #[default]
    Empty,
    Number(f64),
    /// Non-numeric content. Kept for the raw sheet, never a price.
    Text(String),
}

impl PriceCell {
    /// The value if it can take part in max-selection.
    pub fn price(&self) -> Option<f64> {
        match self {
            PriceCell::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub model: String,
    /// Aligned with the source's columns. Missing trailing cells are empty.
    pub prices: Vec<PriceCell>,
}

impl PriceRow {
    pub fn new(model: impl Into<String>, prices: Vec<PriceCell>) -> Self {
        Self { model: model.into(), prices }
    }

    pub fn cell(&self, col: usize) -> &PriceCell {
        static EMPTY: PriceCell = PriceCell::Empty;
        self.prices.get(col).unwrap_or(&EMPTY)
    }
}

/// Inclusion filters. An empty set means "everything".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    #[serde(default)]
    pub models: BTreeSet<String>,
    /// Column header labels.
    #[serde(default)]
    pub columns: BTreeSet<String>,
}

impl Selection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn allows_model(&self, model: &str) -> bool {
        self.models.is_empty() || self.models.contains(model)
    }

    pub fn allows_column(&self, column: &ColumnDescriptor) -> bool {
        self.columns.is_empty() || self.columns.contains(&column.label)
    }
}

/// One vendor's normalized price table plus its inclusion filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub color: Rgb,
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<PriceRow>,
    /// Free-form condition notes, any JSON shape.
    #[serde(default)]
    pub notes: serde_json::Value,
    #[serde(default)]
    pub selection: Selection,
}

impl Source {
    pub fn new(name: impl Into<String>, color: Rgb, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            name: name.into(),
            color,
            columns,
            rows: Vec::new(),
            notes: serde_json::Value::Null,
            selection: Selection::all(),
        }
    }

    pub fn with_rows(mut self, rows: Vec<PriceRow>) -> Self {
        self.rows = rows;
        self
    }

    pub fn with_notes(mut self, notes: serde_json::Value) -> Self {
        self.notes = notes;
        self
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    /// Rows whose model passes the model filter.
    pub fn effective_rows(&self) -> impl Iterator<Item = &PriceRow> {
        self.rows.iter().filter(|r| self.selection.allows_model(&r.model))
    }

    /// Columns passing the column filter, with their index into each row.
    pub fn effective_columns(&self) -> impl Iterator<Item = (usize, &ColumnDescriptor)> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| self.selection.allows_column(c))
    }
}

// ---------------------------------------------------------------------------
// Reconciliation result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Winner {
    pub price: f64,
    /// Index of the winning source in the reconciled list.
    pub source: usize,
    pub source_name: String,
    pub color: Rgb,
    pub plan_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationCell {
    pub model: String,
    pub category: Category,
    /// `None` when no source has a valid price for this pair.
    pub best: Option<Winner>,
}

impl ReconciliationCell {
    pub fn is_absent(&self) -> bool {
        self.best.is_none()
    }
}

/// Sorted models x the four categories, one cell each.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedMatrix {
    /// Names of the reconciled sources, in input order.
    pub sources: Vec<String>,
    pub models: Vec<String>,
    /// Row-major: `cells[m * 4 + category.index()]`.
    pub cells: Vec<ReconciliationCell>,
}

impl MergedMatrix {
    pub fn cell(&self, model: &str, category: Category) -> Option<&ReconciliationCell> {
        let m = self.models.binary_search_by(|probe| probe.as_str().cmp(model)).ok()?;
        self.cells.get(m * Category::ALL.len() + category.index())
    }

    /// One slice of four cells per model, in model order.
    pub fn rows(&self) -> impl Iterator<Item = (&str, &[ReconciliationCell])> {
        self.models
            .iter()
            .map(String::as_str)
            .zip(self.cells.chunks(Category::ALL.len()))
    }

    pub fn summary(&self) -> ReconSummary {
        let mut wins: Vec<SourceWins> = self
            .sources
            .iter()
            .map(|s| SourceWins { source: s.clone(), wins: 0 })
            .collect();
        let mut absent = 0;
        for cell in &self.cells {
            match &cell.best {
                Some(w) => {
                    if let Some(entry) = wins.get_mut(w.source) {
                        entry.wins += 1;
                    }
                }
                None => absent += 1,
            }
        }
        ReconSummary {
            models: self.models.len(),
            total_cells: self.cells.len(),
            absent,
            wins,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceWins {
    pub source: String,
    pub wins: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub models: usize,
    pub total_cells: usize,
    pub absent: usize,
    /// In source order.
    pub wins: Vec<SourceWins>,
}
