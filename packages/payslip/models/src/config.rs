//! Pipeline configuration.
//!
//! [`PayslipConfig`] is built once (usually from TOML) and handed to the
//! pipeline constructor. Every field has a default so a partial file is
//! enough.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Top-level configuration for one pipeline instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayslipConfig {
    pub extraction: ExtractionConfig,
    pub analysis: AnalysisRules,
    pub plan: PlanConfig,
    /// Rules producing the `tabela` label, tried in order.
    pub table_rules: Vec<TableRule>,
}

impl PayslipConfig {
    /// The table rules to apply, falling back to the built-in rule set
    /// when none are configured.
    #[must_use]
    pub fn effective_table_rules(&self) -> Vec<TableRule> {
        if self.table_rules.is_empty() {
            TableRule::defaults()
        } else {
            self.table_rules.clone()
        }
    }
}

/// How codes are paired with amounts inside a rubric block.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PairingStrategy {
    /// Pair by position within each text line, preferring the last amount
    /// after a code.
    #[default]
    LineBased,
    /// Greedy nearest-following-amount over the whole block.
    ProximityBased,
    /// Split pages at their horizontal midpoint using word boxes, then pair
    /// line by line.
    ColumnSplit,
}

/// Text markers delimiting the earnings and deductions blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockMarkers {
    pub earnings_start: String,
    pub earnings_end: String,
    pub deductions_start: String,
    pub deductions_end: String,
}

impl Default for BlockMarkers {
    fn default() -> Self {
        Self {
            earnings_start: "VANTAGENS".to_owned(),
            earnings_end: "TOTAL DE VANTAGENS".to_owned(),
            deductions_start: "DESCONTOS".to_owned(),
            deductions_end: "TOTAL DE DESCONTOS".to_owned(),
        }
    }
}

/// Settings for the segmentation and pairing stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub strategy: PairingStrategy,
    pub markers: BlockMarkers,
    /// Regex a leading line token must match to be reported as an unknown
    /// code. `None` disables the unmatched channel.
    pub unknown_code_pattern: Option<String>,
    /// Periods before this year are skipped with a warning.
    pub min_year: i32,
    /// Periods after this year are skipped with a warning.
    pub max_year: i32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            strategy: PairingStrategy::default(),
            markers: BlockMarkers::default(),
            unknown_code_pattern: Some(r"^\d{4}$".to_owned()),
            min_year: 1990,
            max_year: 2100,
        }
    }
}

/// Rules for inferring how many people a deduction covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisRules {
    /// Codes that always cover exactly one person (titular, spouse).
    #[serde(alias = "rubricas_unicas")]
    pub single_beneficiary_codes: BTreeSet<String>,
    /// The code whose amount must be an exact multiple of a reference
    /// price.
    pub dependents_code: Option<String>,
    /// Known per-person prices by deduction code.
    #[serde(alias = "valores_referencia")]
    pub reference_values: BTreeMap<String, Vec<f64>>,
    /// Float comparison tolerance.
    pub tolerance: f64,
}

impl Default for AnalysisRules {
    fn default() -> Self {
        Self {
            single_beneficiary_codes: BTreeSet::new(),
            dependents_code: Some("7034".to_owned()),
            reference_values: BTreeMap::new(),
            tolerance: 0.01,
        }
    }
}

/// Sort order of report detail lines.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReportOrder {
    #[default]
    Code,
    AmountDesc,
}

/// The code subsets summarized by the plan report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    pub earnings_base: BTreeSet<String>,
    pub plan_deductions: BTreeSet<String>,
    pub order: ReportOrder,
}

/// Labels a document when `pattern` matches anywhere in its text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRule {
    pub label: String,
    pub pattern: String,
}

impl TableRule {
    /// Label used when no rule matches.
    pub const UNKNOWN: &'static str = "Desconhecida";

    /// Built-in rules: payslips citing state law 13.450/2015 use the 2015
    /// contribution tables.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![Self {
            label: "2015".to_owned(),
            pattern: r"(?i)Lei\s+n[ºo°]?\.?\s*13\.450,?\s*de\s*26\s*de\s*Outubro\s*de\s*2015"
                .to_owned(),
        }]
    }
}
