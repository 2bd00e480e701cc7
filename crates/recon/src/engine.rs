use std::collections::{BTreeSet, HashSet};

use log::{debug, info};

use crate::error::ReconError;
use crate::model::{
    Category, ColumnDescriptor, MergedMatrix, PriceRow, ReconciliationCell, Source, Winner,
};

/// Model ids that mean "no model" (compared case-insensitively).
pub const MODEL_SENTINELS: &[&str] = &["unknown", "none", "nan", "null", "n/a", "-"];

/// A source's filters as read at the start of a run. Later edits to the
/// source's selection do not affect a run in progress.
struct Snapshot<'a> {
    source: &'a Source,
    rows: Vec<&'a PriceRow>,
    /// (row index, category, descriptor) for every categorized column in play.
    columns: Vec<(usize, Category, &'a ColumnDescriptor)>,
}

impl<'a> Snapshot<'a> {
    fn take(source: &'a Source) -> Self {
        let rows: Vec<&PriceRow> = source.effective_rows().collect();
        let columns: Vec<_> = source
            .effective_columns()
            .filter_map(|(i, c)| c.category().map(|cat| (i, cat, c)))
            .collect();
        debug!(
            "source '{}': {} of {} rows, {} categorized column(s) in play",
            source.name,
            rows.len(),
            source.rows.len(),
            columns.len()
        );
        Self { source, rows, columns }
    }
}

pub fn is_valid_model(model: &str) -> bool {
    let trimmed = model.trim();
    !trimmed.is_empty() && !MODEL_SENTINELS.iter().any(|s| trimmed.eq_ignore_ascii_case(s))
}

/// Reconcile sources into one best-price matrix.
///
/// For every model in any source's effective rows and every category, the
/// highest valid price wins. Ties keep the earlier source. Sources are not
/// modified; the result depends only on their content and order.
pub fn reconcile(sources: &[Source]) -> Result<MergedMatrix, ReconError> {
    if sources.is_empty() {
        return Err(ReconError::NoSources);
    }
    let mut seen = HashSet::new();
    for s in sources {
        if !seen.insert(s.name.as_str()) {
            return Err(ReconError::DuplicateSource(s.name.clone()));
        }
    }

    let snapshots: Vec<Snapshot> = sources.iter().map(Snapshot::take).collect();

    let models: BTreeSet<&str> = snapshots
        .iter()
        .flat_map(|s| s.rows.iter().map(|r| r.model.as_str()))
        .filter(|m| is_valid_model(m))
        .collect();

    let mut cells = Vec::with_capacity(models.len() * Category::ALL.len());
    for model in &models {
        for category in Category::ALL {
            cells.push(ReconciliationCell {
                model: model.to_string(),
                category,
                best: best_for(&snapshots, model, category),
            });
        }
    }

    let matrix = MergedMatrix {
        sources: sources.iter().map(|s| s.name.clone()).collect(),
        models: models.into_iter().map(str::to_string).collect(),
        cells,
    };
    let summary = matrix.summary();
    info!(
        "reconciled {} source(s): {} model(s), {} of {} cell(s) absent",
        sources.len(),
        summary.models,
        summary.absent,
        summary.total_cells
    );
    Ok(matrix)
}

fn best_for(snapshots: &[Snapshot], model: &str, category: Category) -> Option<Winner> {
    let mut best: Option<Winner> = None;
    for (idx, snap) in snapshots.iter().enumerate() {
        for row in snap.rows.iter().filter(|r| r.model == model) {
            for (col, cat, descriptor) in &snap.columns {
                if *cat != category {
                    continue;
                }
                let Some(price) = row.cell(*col).price() else {
                    continue;
                };
                // Strict: on a tie the earlier source keeps the cell.
                if best.as_ref().map_or(true, |b| price > b.price) {
                    best = Some(Winner {
                        price,
                        source: idx,
                        source_name: snap.source.name.clone(),
                        color: snap.source.color,
                        plan_label: descriptor.plan_label.clone(),
                    });
                }
            }
        }
    }
    best
}
