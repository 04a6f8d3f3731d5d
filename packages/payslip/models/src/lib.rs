#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Rubric definitions, billing periods and report types shared by the
//! payslip extraction pipeline.
//!
//! A *rubric* is one payroll line item (an earning or a deduction)
//! identified by a short code such as `7033`. The [`RubricTable`] is the
//! externally supplied vocabulary of codes; anything the pipeline finds
//! that is not in the table never reaches a [`MonthlyRecord`].

pub mod config;
pub mod period;
pub mod report;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use config::{
    AnalysisRules, BlockMarkers, ExtractionConfig, PairingStrategy, PayslipConfig, PlanConfig,
    ReportOrder, TableRule,
};
pub use period::{Month, ParsePeriodError, PeriodKey};
pub use report::{
    AnalysisEntry, AnalysisReport, DeductionsRow, DeductionsTable, DocumentFailure,
    EarningsSummaryRow, InferredCount, MonthlyRecord, PlanReport, ReportLine, ReportSection,
    ReportTables, UnmatchedEntry, Warning, WarningKind,
};

/// Which half of the payslip a rubric belongs to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RubricCategory {
    /// Earnings (`VANTAGENS` / `proventos`).
    Earning,
    /// Deductions (`DESCONTOS`).
    Deduction,
}

/// One entry of the rubric table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricDefinition {
    /// Short code, unique within its category.
    pub code: String,
    pub description: String,
    pub category: RubricCategory,
    /// Excluded from `total_earnings` when set.
    #[serde(default)]
    pub ignore_in_sum: bool,
    /// Optional classification, e.g. `"planserv"`.
    #[serde(default)]
    pub plan_tag: Option<String>,
}

/// Errors building a [`RubricTable`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RubricTableError {
    /// The same code was defined twice in one category.
    #[error("rubric code '{code}' defined twice as {category}")]
    DuplicateCode {
        code: String,
        category: RubricCategory,
    },

    /// A definition had a blank code.
    #[error("rubric definition with an empty code")]
    EmptyCode,
}

/// The immutable code vocabulary for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RubricTable {
    earnings: BTreeMap<String, RubricDefinition>,
    deductions: BTreeMap<String, RubricDefinition>,
}

impl RubricTable {
    /// Builds a table from definitions.
    ///
    /// # Errors
    ///
    /// * [`RubricTableError::EmptyCode`] if a code is blank
    /// * [`RubricTableError::DuplicateCode`] if a code repeats within a category
    pub fn new(
        definitions: impl IntoIterator<Item = RubricDefinition>,
    ) -> Result<Self, RubricTableError> {
        let mut table = Self::default();
        for mut def in definitions {
            def.code = def.code.trim().to_owned();
            if def.code.is_empty() {
                return Err(RubricTableError::EmptyCode);
            }
            let section = match def.category {
                RubricCategory::Earning => &mut table.earnings,
                RubricCategory::Deduction => &mut table.deductions,
            };
            if section.contains_key(&def.code) {
                return Err(RubricTableError::DuplicateCode {
                    code: def.code,
                    category: def.category,
                });
            }
            section.insert(def.code.clone(), def);
        }
        Ok(table)
    }

    fn section(&self, category: RubricCategory) -> &BTreeMap<String, RubricDefinition> {
        match category {
            RubricCategory::Earning => &self.earnings,
            RubricCategory::Deduction => &self.deductions,
        }
    }

    #[must_use]
    pub fn get(&self, category: RubricCategory, code: &str) -> Option<&RubricDefinition> {
        self.section(category).get(code)
    }

    /// Whether `code` is defined in either category.
    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.earnings.contains_key(code) || self.deductions.contains_key(code)
    }

    /// Codes of one category.
    #[must_use]
    pub fn codes(&self, category: RubricCategory) -> BTreeSet<String> {
        self.section(category).keys().cloned().collect()
    }

    /// Codes of both categories.
    #[must_use]
    pub fn all_codes(&self) -> BTreeSet<String> {
        self.earnings
            .keys()
            .chain(self.deductions.keys())
            .cloned()
            .collect()
    }

    /// Codes of one category carrying a plan tag.
    #[must_use]
    pub fn tagged_codes(&self, category: RubricCategory) -> BTreeSet<String> {
        self.section(category)
            .values()
            .filter(|def| def.plan_tag.is_some())
            .map(|def| def.code.clone())
            .collect()
    }

    /// Description of a code, falling back to the code itself.
    #[must_use]
    pub fn description<'a>(&'a self, category: RubricCategory, code: &'a str) -> &'a str {
        self.get(category, code)
            .map_or(code, |def| def.description.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.earnings.len() + self.deductions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.earnings.is_empty() && self.deductions.is_empty()
    }
}

// ── On-disk rubric table layout ──────────────────────────────────────────

/// The JSON layout rubric tables are distributed in:
///
/// ```json
/// {"rubricas": {"proventos": {"7033": {"descricao": "VENCIMENTO"}},
///               "descontos": {"7034": {"descricao": "PLANSERV DEPENDENTE"}}}}
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RubricTableFile {
    pub rubricas: RubricSections,
}

/// Earnings and deductions sections of a [`RubricTableFile`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RubricSections {
    #[serde(default)]
    pub proventos: BTreeMap<String, RubricEntry>,
    #[serde(default)]
    pub descontos: BTreeMap<String, RubricEntry>,
}

/// A single rubric as written in the JSON file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RubricEntry {
    #[serde(default, alias = "description")]
    pub descricao: String,
    #[serde(default, alias = "ignore_in_sum")]
    pub ignorar_soma: bool,
    #[serde(default, alias = "plan_tag")]
    pub plano: Option<String>,
}

impl TryFrom<RubricTableFile> for RubricTable {
    type Error = RubricTableError;

    fn try_from(file: RubricTableFile) -> Result<Self, Self::Error> {
        let to_def = |category: RubricCategory| {
            move |(code, entry): (String, RubricEntry)| RubricDefinition {
                code,
                description: entry.descricao,
                category,
                ignore_in_sum: entry.ignorar_soma,
                plan_tag: entry.plano,
            }
        };
        let RubricSections {
            proventos,
            descontos,
        } = file.rubricas;
        Self::new(
            proventos
                .into_iter()
                .map(to_def(RubricCategory::Earning))
                .chain(descontos.into_iter().map(to_def(RubricCategory::Deduction))),
        )
    }
}
