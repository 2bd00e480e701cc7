//! Column taxonomy normalization.
//!
//! Vendors label their price columns freely ("SK_번이", "KT 카드 기변",
//! "선약/MNP"). A [`RuleTable`] maps that text to a [`ColumnDescriptor`]
//! through keyword rules evaluated once per column. Normalization is total:
//! text that matches nothing degrades to defaults or to an uncategorized
//! column, never to an error.

use serde::{Deserialize, Serialize};

use crate::model::{AcquisitionType, ColumnDescriptor, ContractType};

/// Sub-group used when a column names none.
pub const COMMON_SUB_GROUP: &str = "common";

/// A column as the extraction step reported it. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawColumn {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub sub_group: Option<String>,
    #[serde(default)]
    pub contract: Option<String>,
    #[serde(default)]
    pub acquisition: Option<String>,
    #[serde(default)]
    pub plan: Option<String>,
}

impl RawColumn {
    /// A column known only by its header text.
    pub fn from_label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule<T> {
    /// Lower-case. Latin keywords match whole tokens of the lower-cased
    /// text; Hangul keywords match anywhere.
    pub keyword: String,
    pub value: T,
}

impl<T> KeywordRule<T> {
    fn new(keyword: &str, value: T) -> Self {
        Self { keyword: keyword.to_lowercase(), value }
    }
}

/// Literal rewrite applied to plan text, in table order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRule {
    pub pattern: String,
    pub replacement: String,
}

impl PlanRule {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self { pattern: pattern.into(), replacement: replacement.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
    pub contract: Vec<KeywordRule<ContractType>>,
    pub acquisition: Vec<KeywordRule<AcquisitionType>>,
    pub plans: Vec<PlanRule>,
}

impl Default for RuleTable {
    fn default() -> Self {
        use AcquisitionType::*;
        use ContractType::*;
        Self {
            contract: vec![
                KeywordRule::new("공시", PublicSubsidy),
                KeywordRule::new("public", PublicSubsidy),
                KeywordRule::new("subsidy", PublicSubsidy),
                KeywordRule::new("선택약정", SelectCommitment),
                KeywordRule::new("선약", SelectCommitment),
                KeywordRule::new("select", SelectCommitment),
                KeywordRule::new("commitment", SelectCommitment),
            ],
            acquisition: vec![
                KeywordRule::new("번호이동", PortIn),
                KeywordRule::new("번이", PortIn),
                KeywordRule::new("mnp", PortIn),
                KeywordRule::new("port", PortIn),
                KeywordRule::new("move", PortIn),
                KeywordRule::new("기기변경", DeviceChange),
                KeywordRule::new("기변", DeviceChange),
                KeywordRule::new("change", DeviceChange),
            ],
            // Longer codes first: "5GX_PL" must not be eaten by "5GX_P".
            plans: vec![
                PlanRule::new("5GX_PL", "5GX 플래티넘"),
                PlanRule::new("5GX_P", "5GX 프라임"),
                PlanRule::new("5GX_R", "5GX 레귤러"),
                PlanRule::new("5G_SL", "5G 슬림"),
            ],
        }
    }
}

impl RuleTable {
    /// Append extra plan rules after the built-in ones.
    pub fn with_plan_rules(mut self, rules: impl IntoIterator<Item = PlanRule>) -> Self {
        self.plans.extend(rules);
        self
    }

    pub fn normalize(&self, raw: &RawColumn) -> ColumnDescriptor {
        let label = raw.label.as_deref().map(str::trim).filter(|s| !s.is_empty());

        let classify_text = [raw.contract.as_deref(), raw.acquisition.as_deref(), label]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        let contract = self.contract_type(&classify_text);
        let acquisition = self.acquisition_type(&classify_text);

        // Non-keyword tokens of the label fill in missing sub-group and plan.
        let (label_group, label_plan) = match label {
            Some(l) => self.split_label(&self.rewrite_plan(l)),
            None => (None, None),
        };

        let sub_group = non_empty(raw.sub_group.as_deref())
            .map(str::to_string)
            .or(label_group)
            .unwrap_or_else(|| COMMON_SUB_GROUP.to_string());

        let plan_label = match non_empty(raw.plan.as_deref()) {
            Some(p) => self.rewrite_plan(p),
            None => label_plan.unwrap_or_default(),
        };

        let label = match label {
            Some(l) => l.to_string(),
            None => [
                raw.sub_group.as_deref(),
                raw.contract.as_deref(),
                raw.acquisition.as_deref(),
                raw.plan.as_deref(),
            ]
            .into_iter()
            .filter_map(non_empty)
            .collect::<Vec<_>>()
            .join("_"),
        };

        ColumnDescriptor {
            label,
            sub_group,
            contract,
            acquisition,
            plan_label,
        }
    }

    /// Select-commitment wins when both contract markers are present.
    fn contract_type(&self, text: &str) -> ContractType {
        let mut found = None;
        for rule in &self.contract {
            if keyword_positions(text, &rule.keyword).next().is_some() {
                if rule.value == ContractType::SelectCommitment {
                    return ContractType::SelectCommitment;
                }
                found = Some(rule.value);
            }
        }
        found.unwrap_or(ContractType::PublicSubsidy)
    }

    /// Earliest keyword in the text wins; at the same offset the longer one.
    fn acquisition_type(&self, text: &str) -> Option<AcquisitionType> {
        self.acquisition
            .iter()
            .filter_map(|rule| keyword_positions(text, &rule.keyword).next().map(|pos| (pos, rule)))
            .min_by(|(pa, ra), (pb, rb)| pa.cmp(pb).then(rb.keyword.len().cmp(&ra.keyword.len())))
            .map(|(_, rule)| rule.value)
    }

    pub fn rewrite_plan(&self, text: &str) -> String {
        let mut out = text.trim().to_string();
        for rule in &self.plans {
            if !rule.pattern.is_empty() && out.contains(&rule.pattern) {
                out = out.replace(&rule.pattern, &rule.replacement);
            }
        }
        out
    }

    fn is_keyword_token(&self, token: &str) -> bool {
        let lower = token.to_lowercase();
        let hit = |keyword: &str| keyword_positions(&lower, keyword).next().is_some();
        self.contract.iter().any(|r| hit(&r.keyword)) || self.acquisition.iter().any(|r| hit(&r.keyword))
    }

    /// First free token is the sub-group; the rest form the plan label.
    fn split_label(&self, label: &str) -> (Option<String>, Option<String>) {
        let mut free = label
            .split(is_separator)
            .filter(|t| !t.is_empty() && !self.is_keyword_token(t));
        let group = free.next().map(str::to_string);
        let rest: Vec<&str> = free.collect();
        let plan = if rest.is_empty() { None } else { Some(rest.join(" ")) };
        (group, plan)
    }
}

fn is_separator(c: char) -> bool {
    c == '_' || c == '/' || c == '-' || c.is_whitespace()
}

/// Byte offsets where `keyword` occurs in `text`. An ASCII keyword only
/// counts when it is a whole token, so "port" does not hit "PublicSupport".
fn keyword_positions<'a>(text: &'a str, keyword: &'a str) -> impl Iterator<Item = usize> + 'a {
    let whole_token = keyword.is_ascii();
    let at_edge = |c: Option<char>| c.map_or(true, is_separator);
    text.match_indices(keyword)
        .map(|(pos, _)| pos)
        .filter(move |&pos| {
            !keyword.is_empty()
                && (!whole_token
                    || (at_edge(text[..pos].chars().next_back())
                        && at_edge(text[pos + keyword.len()..].chars().next())))
        })
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
