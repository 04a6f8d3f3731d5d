//! Output types of the pipeline.
//!
//! [`AnalysisReport`] is the whole contract handed to presentation layers.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use crate::{PeriodKey, RubricCategory};

/// Consolidated amounts for one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRecord {
    pub period: PeriodKey,
    pub earnings: BTreeMap<String, f64>,
    pub deductions: BTreeMap<String, f64>,
    /// Sum of earnings whose rubric is not flagged `ignore_in_sum`.
    pub total_earnings: f64,
}

impl MonthlyRecord {
    /// A record with no amounts, used to fill gaps in a series.
    #[must_use]
    pub const fn empty(period: PeriodKey) -> Self {
        Self {
            period,
            earnings: BTreeMap::new(),
            deductions: BTreeMap::new(),
            total_earnings: 0.0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.earnings.is_empty() && self.deductions.is_empty()
    }

    /// Amounts of one category.
    #[must_use]
    pub const fn amounts(&self, category: RubricCategory) -> &BTreeMap<String, f64> {
        match category {
            RubricCategory::Earning => &self.earnings,
            RubricCategory::Deduction => &self.deductions,
        }
    }
}

/// Estimated number of people a deduction covers.
///
/// Serializes as an integer, `"X"` or `"N/A"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InferredCount {
    Count(u32),
    /// The amount is not an exact multiple of any reference price and
    /// needs manual review.
    NonStandard,
    /// The amount was not numeric.
    NotApplicable,
}

impl fmt::Display for InferredCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{n}"),
            Self::NonStandard => f.write_str("X"),
            Self::NotApplicable => f.write_str("N/A"),
        }
    }
}

impl Serialize for InferredCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Count(n) => serializer.serialize_u32(*n),
            Self::NonStandard => serializer.serialize_str("X"),
            Self::NotApplicable => serializer.serialize_str("N/A"),
        }
    }
}

/// Amount and inferred beneficiary count for one `(period, code)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisEntry {
    pub amount: f64,
    pub inferred_count: InferredCount,
}

/// One code in a plan report section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportLine {
    pub code: String,
    pub description: String,
    pub total: f64,
}

/// Accumulated totals for one configured code set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportSection {
    pub total: f64,
    #[serde(rename = "detalhes")]
    pub details: Vec<ReportLine>,
}

/// Totals for the configured earnings base and plan deductions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlanReport {
    pub proventos: ReportSection,
    pub descontos: ReportSection,
    /// Contribution table the documents were classified under.
    pub tabela: String,
}

/// Earnings total of one period, numeric period label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EarningsSummaryRow {
    pub period: String,
    pub total: f64,
}

/// Per-code deduction amounts of one period, aligned with
/// [`DeductionsTable::codes`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeductionsRow {
    pub period: String,
    pub values: Vec<f64>,
}

/// One column per deduction code found, one row per period.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeductionsTable {
    /// Column headers (rubric descriptions).
    pub columns: Vec<String>,
    pub codes: Vec<String>,
    pub rows: Vec<DeductionsRow>,
}

/// Tabular views over the contiguous period series.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportTables {
    pub earnings_summary: Vec<EarningsSummaryRow>,
    pub deductions_detail: DeductionsTable,
}

/// A code-shaped token found in a block but absent from the rubric table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmatchedEntry {
    pub period: PeriodKey,
    pub category: RubricCategory,
    pub code: String,
    pub amount: f64,
}

/// Classes of non-fatal anomalies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// A code-shaped token not present in the rubric table.
    UnknownCode,
    /// A value that could not be parsed.
    UnparsableValue,
    /// A known code with no amount next to it.
    MissingValue,
    /// A period without an earnings or deductions block.
    MissingBlock,
    /// More candidate amounts than codes on a line; the heuristic picked one.
    AmbiguousPairing,
    /// A period header outside the configured year range; its chunk is
    /// skipped.
    PeriodOutOfRange,
}

/// A per-item warning. Never aborts a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub document: String,
    pub period: Option<PeriodKey>,
    pub kind: WarningKind,
    pub message: String,
}

/// A document that could not be processed at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentFailure {
    pub document: String,
    pub reason: String,
}

/// Everything a run produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// Documents that yielded at least one period.
    pub document_count: usize,
    /// Contiguous, chronologically sorted period series.
    pub periods: Vec<PeriodKey>,
    pub monthly: BTreeMap<PeriodKey, MonthlyRecord>,
    pub analysis: BTreeMap<PeriodKey, BTreeMap<String, AnalysisEntry>>,
    pub plan_report: PlanReport,
    pub tables: ReportTables,
    pub unmatched: Vec<UnmatchedEntry>,
    pub warnings: Vec<Warning>,
    pub failures: Vec<DocumentFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Month;

    #[test]
    fn inferred_count_serializes_as_number_or_sentinel() {
        let json = serde_json::to_string(&[
            InferredCount::Count(3),
            InferredCount::NonStandard,
            InferredCount::NotApplicable,
        ])
        .unwrap();
        assert_eq!(json, r#"[3,"X","N/A"]"#);
    }

    #[test]
    fn monthly_record_keys_by_period_label() {
        let period = PeriodKey::new(Month::January, 2023);
        let mut record = MonthlyRecord::empty(period);
        assert!(record.is_empty());
        record.earnings.insert("7033".to_owned(), 1185.54);

        let map = BTreeMap::from([(period, record)]);
        let value = serde_json::to_value(&map).unwrap();
        assert_eq!(value["Janeiro/2023"]["earnings"]["7033"], 1185.54);
        assert_eq!(value["Janeiro/2023"]["period"], "Janeiro/2023");
    }

    #[test]
    fn report_section_uses_detalhes_key() {
        let section = ReportSection {
            total: 10.0,
            details: vec![ReportLine {
                code: "7034".to_owned(),
                description: "DEP".to_owned(),
                total: 10.0,
            }],
        };
        let value = serde_json::to_value(&section).unwrap();
        assert_eq!(value["detalhes"][0]["code"], "7034");
    }
}
