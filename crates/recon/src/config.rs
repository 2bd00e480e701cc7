use std::collections::HashSet;

use log::warn;
use pricegrid_engine::cell::Rgb;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;

use crate::color::random_pastel;
use crate::error::ReconError;
use crate::model::Selection;
use crate::taxonomy::{PlanRule, RuleTable};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// A reconciliation run, usually loaded from a `*.battle.toml` file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BattleConfig {
    pub name: String,
    /// Seeds generated colors so repeated runs look the same.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Reference catalog used to canonicalize model ids.
    #[serde(default)]
    pub catalog: Option<String>,
    /// Ordered; the order is the tie-break order.
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub taxonomy: TaxonomyConfig,
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub name: String,
    /// Extraction payload, relative to the config file.
    pub file: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub models: Vec<String>,
    /// Column header labels.
    #[serde(default)]
    pub columns: Vec<String>,
}

impl SourceConfig {
    pub fn selection(&self) -> Selection {
        Selection {
            models: self.models.iter().cloned().collect(),
            columns: self.columns.iter().cloned().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Taxonomy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaxonomyConfig {
    #[serde(default)]
    pub plan_rules: Vec<PlanRule>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl BattleConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: BattleConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.sources.is_empty() {
            return Err(ReconError::ConfigValidation(
                "at least 1 source is required".into(),
            ));
        }

        let mut names = HashSet::new();
        for source in &self.sources {
            if source.name.trim().is_empty() {
                return Err(ReconError::ConfigValidation("source name must not be empty".into()));
            }
            if !names.insert(source.name.as_str()) {
                return Err(ReconError::DuplicateSource(source.name.clone()));
            }
            if let Some(ref color) = source.color {
                if Rgb::parse_hex(color).is_none() {
                    return Err(ReconError::InvalidColor {
                        source: source.name.clone(),
                        value: color.clone(),
                    });
                }
            }
        }

        for (i, rule) in self.taxonomy.plan_rules.iter().enumerate() {
            if rule.pattern.is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "taxonomy.plan_rules[{i}]: pattern must not be empty"
                )));
            }
        }

        Ok(())
    }

    /// Built-in rules plus the configured plan rewrites.
    pub fn rule_table(&self) -> RuleTable {
        RuleTable::default().with_plan_rules(self.taxonomy.plan_rules.iter().cloned())
    }

    /// One color per source, in source order. Sources without a color get
    /// a generated pastel, reproducible when `seed` is set.
    pub fn source_colors(&self) -> Vec<Rgb> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.sources
            .iter()
            .map(|s| match s.color.as_deref().map(|c| (c, Rgb::parse_hex(c))) {
                Some((_, Some(rgb))) => rgb,
                Some((raw, None)) => {
                    warn!("source '{}': unparseable color '{raw}', generating one", s.name);
                    random_pastel(&mut rng)
                }
                None => random_pastel(&mut rng),
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::PASTEL_MIN;

    const VALID: &str = r##"
name = "Weekly battle"
seed = 7

[[sources]]
name = "Guro 1"
file = "guro1.json"
color = "#FFE4B5"
models = ["S24", "Flip7 256"]

[[sources]]
name = "Sindorim"
file = "sindorim.json"
columns = ["SK_번이"]

[[taxonomy.plan_rules]]
pattern = "T플랜"
replacement = "T Plan"
"##;

    #[test]
    fn parse_valid() {
        let config = BattleConfig::from_toml(VALID).unwrap();
        assert_eq!(config.name, "Weekly battle");
        assert_eq!(config.seed, Some(7));
        assert!(config.catalog.is_none());
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[0].name, "Guro 1");
        assert_eq!(config.sources[1].file, "sindorim.json");
        assert_eq!(config.taxonomy.plan_rules.len(), 1);
    }

    #[test]
    fn selection_from_lists() {
        let config = BattleConfig::from_toml(VALID).unwrap();
        let sel = config.sources[0].selection();
        assert!(sel.allows_model("S24"));
        assert!(!sel.allows_model("A35"));
        assert!(sel.columns.is_empty());

        let sel = config.sources[1].selection();
        assert!(sel.allows_model("anything"));
        assert!(sel.columns.contains("SK_번이"));
    }

    #[test]
    fn rule_table_keeps_builtin_rules() {
        let config = BattleConfig::from_toml(VALID).unwrap();
        let table = config.rule_table();
        assert_eq!(table.plans.len(), RuleTable::default().plans.len() + 1);
        assert_eq!(table.rewrite_plan("T플랜 맥스"), "T Plan 맥스");
        assert_eq!(table.rewrite_plan("5GX_P"), "5GX 프라임");
    }

    #[test]
    fn colors_are_parsed_or_generated() {
        let config = BattleConfig::from_toml(VALID).unwrap();
        let colors = config.source_colors();
        assert_eq!(colors[0], Rgb(0xFF, 0xE4, 0xB5));
        assert!(colors[1].0 >= PASTEL_MIN && colors[1].1 >= PASTEL_MIN && colors[1].2 >= PASTEL_MIN);
        // seeded: same colors every time
        assert_eq!(config.source_colors(), colors);
    }

    #[test]
    fn rejects_no_sources() {
        let err = BattleConfig::from_toml("name = \"x\"\nsources = []\n").unwrap_err();
        assert!(matches!(err, ReconError::ConfigValidation(_)));
    }

    #[test]
    fn rejects_missing_sources_key() {
        let err = BattleConfig::from_toml("name = \"x\"\n").unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn rejects_duplicate_names() {
        let input = r#"
name = "dup"
[[sources]]
name = "A"
file = "a.json"
[[sources]]
name = "A"
file = "b.json"
"#;
        assert_eq!(
            BattleConfig::from_toml(input).unwrap_err(),
            ReconError::DuplicateSource("A".into())
        );
    }

    #[test]
    fn rejects_bad_color() {
        let input = r##"
name = "c"
[[sources]]
name = "A"
file = "a.json"
color = "#12345"
"##;
        assert!(matches!(
            BattleConfig::from_toml(input).unwrap_err(),
            ReconError::InvalidColor { ref source, .. } if source == "A"
        ));
    }

    #[test]
    fn rejects_empty_plan_pattern() {
        let input = r#"
name = "p"
[[sources]]
name = "A"
file = "a.json"
[[taxonomy.plan_rules]]
pattern = ""
replacement = "x"
"#;
        assert!(matches!(
            BattleConfig::from_toml(input).unwrap_err(),
            ReconError::ConfigValidation(_)
        ));
    }

    #[test]
    fn rejects_unknown_keys() {
        let input = r##"
name = "u"
[[sources]]
name = "A"
file = "a.json"
colour = "#FFFFFF"
"##;
        assert!(matches!(
            BattleConfig::from_toml(input).unwrap_err(),
            ReconError::ConfigParse(_)
        ));
    }
}
