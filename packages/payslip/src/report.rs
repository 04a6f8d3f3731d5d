//! Plan report, tabular summaries and contribution-table classification.

use std::collections::{BTreeMap, BTreeSet};

use payslip_models::{
    DeductionsRow, DeductionsTable, EarningsSummaryRow, MonthlyRecord, PlanConfig, PlanReport,
    ReportLine, ReportOrder, ReportSection, ReportTables, RubricCategory, RubricTable, TableRule,
};
use regex::Regex;

use crate::PayslipError;
use crate::value::round_cents;

/// Summarizes the configured earnings base and plan deductions across all
/// periods.
#[derive(Debug, Clone)]
pub struct PlanReporter<'a> {
    rubrics: &'a RubricTable,
    plan: &'a PlanConfig,
}

impl<'a> PlanReporter<'a> {
    #[must_use]
    pub const fn new(rubrics: &'a RubricTable, plan: &'a PlanConfig) -> Self {
        Self { rubrics, plan }
    }

    /// Builds the report. `tabela` is the contribution-table label the
    /// documents were classified under.
    ///
    /// With no plan deductions configured, the deduction codes the rubric
    /// table tags with a plan are summarized instead.
    #[must_use]
    pub fn report(&self, records: &[MonthlyRecord], tabela: &str) -> PlanReport {
        let tagged;
        let plan_deductions = if self.plan.plan_deductions.is_empty() {
            tagged = self.rubrics.tagged_codes(RubricCategory::Deduction);
            log::debug!("No plan deductions configured; using {} tagged code(s)", tagged.len());
            &tagged
        } else {
            &self.plan.plan_deductions
        };

        PlanReport {
            proventos: self.section(records, RubricCategory::Earning, &self.plan.earnings_base),
            descontos: self.section(records, RubricCategory::Deduction, plan_deductions),
            tabela: tabela.to_owned(),
        }
    }

    fn section(
        &self,
        records: &[MonthlyRecord],
        category: RubricCategory,
        codes: &BTreeSet<String>,
    ) -> ReportSection {
        let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
        for record in records {
            for (code, amount) in record.amounts(category) {
                if codes.contains(code) {
                    let slot = totals.entry(code.as_str()).or_insert(0.0);
                    *slot = round_cents(*slot + amount);
                }
            }
        }

        let mut details: Vec<ReportLine> = totals
            .into_iter()
            .filter(|(_, total)| *total != 0.0)
            .map(|(code, total)| ReportLine {
                code: code.to_owned(),
                description: self.rubrics.description(category, code).to_owned(),
                total,
            })
            .collect();

        match self.plan.order {
            ReportOrder::Code => details.sort_by(|a, b| a.code.cmp(&b.code)),
            ReportOrder::AmountDesc => details.sort_by(|a, b| {
                b.total.total_cmp(&a.total).then_with(|| a.code.cmp(&b.code))
            }),
        }

        let total = details
            .iter()
            .fold(0.0, |acc, line| round_cents(acc + line.total));

        ReportSection { total, details }
    }
}

/// Builds the earnings summary and the deductions detail table over a
/// contiguous series.
#[must_use]
pub fn build_tables(rubrics: &RubricTable, series: &[MonthlyRecord]) -> ReportTables {
    let earnings_summary = series
        .iter()
        .map(|record| EarningsSummaryRow {
            period: record.period.numeric(),
            total: record.total_earnings,
        })
        .collect();

    let codes: Vec<String> = series
        .iter()
        .flat_map(|record| record.deductions.keys().cloned())
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect();

    let columns = codes
        .iter()
        .map(|code| {
            rubrics
                .description(RubricCategory::Deduction, code)
                .to_owned()
        })
        .collect();

    let rows = series
        .iter()
        .map(|record| DeductionsRow {
            period: record.period.numeric(),
            values: codes
                .iter()
                .map(|code| record.deductions.get(code).copied().unwrap_or(0.0))
                .collect(),
        })
        .collect();

    ReportTables {
        earnings_summary,
        deductions_detail: DeductionsTable {
            columns,
            codes,
            rows,
        },
    }
}

/// Labels a document with the contribution table its text refers to.
#[derive(Debug, Clone)]
pub struct TableClassifier {
    rules: Vec<(String, Regex)>,
}

impl TableClassifier {
    /// Compiles the rules.
    ///
    /// # Errors
    ///
    /// Returns [`PayslipError::InvalidPattern`] if a rule pattern fails to
    /// compile.
    pub fn new(rules: &[TableRule]) -> Result<Self, PayslipError> {
        let rules = rules
            .iter()
            .map(|rule| Ok((rule.label.clone(), Regex::new(&rule.pattern)?)))
            .collect::<Result<Vec<_>, PayslipError>>()?;
        Ok(Self { rules })
    }

    /// Label of the first matching rule, or [`TableRule::UNKNOWN`].
    #[must_use]
    pub fn classify(&self, text: &str) -> &str {
        self.rules
            .iter()
            .find(|(_, re)| re.is_match(text))
            .map_or(TableRule::UNKNOWN, |(label, _)| label.as_str())
    }
}

#[cfg(test)]
mod tests {
    use payslip_models::{Month, PeriodKey, RubricDefinition};

    use super::*;

    fn rubrics() -> RubricTable {
        let def = |code: &str, description: &str, category| RubricDefinition {
            code: code.to_owned(),
            description: description.to_owned(),
            category,
            ignore_in_sum: false,
            plan_tag: None,
        };
        RubricTable::new([
            def("7033", "VENCIMENTO", RubricCategory::Earning),
            def("7033", "PLANSERV TITULAR", RubricCategory::Deduction),
            def("7034", "PLANSERV DEPENDENTE", RubricCategory::Deduction),
            def("8000", "IMPOSTO", RubricCategory::Deduction),
        ])
        .unwrap()
    }

    fn record(month: Month, earnings: &[(&str, f64)], deductions: &[(&str, f64)]) -> MonthlyRecord {
        let mut record = MonthlyRecord::empty(PeriodKey::new(month, 2023));
        record.earnings = earnings.iter().map(|(c, v)| ((*c).to_owned(), *v)).collect();
        record.deductions = deductions
            .iter()
            .map(|(c, v)| ((*c).to_owned(), *v))
            .collect();
        record
    }

    #[test]
    fn totals_plan_deductions_across_months() {
        let table = rubrics();
        let plan = PlanConfig {
            earnings_base: BTreeSet::from(["7033".to_owned()]),
            plan_deductions: BTreeSet::from(["7033".to_owned()]),
            order: ReportOrder::Code,
        };
        let records = [
            record(Month::January, &[("7033", 1000.0)], &[("7033", 100.0), ("8000", 50.0)]),
            record(Month::February, &[("7033", 1000.0)], &[("7033", 100.0)]),
            record(Month::March, &[], &[("7033", 100.0), ("7034", 150.0)]),
        ];

        let report = PlanReporter::new(&table, &plan).report(&records, "2015");

        assert_eq!(report.descontos.total, 300.0);
        assert_eq!(report.descontos.details.len(), 1);
        assert_eq!(report.descontos.details[0].code, "7033");
        assert_eq!(report.descontos.details[0].description, "PLANSERV TITULAR");
        assert_eq!(report.proventos.total, 2000.0);
        assert_eq!(report.proventos.details[0].description, "VENCIMENTO");
        assert_eq!(report.tabela, "2015");
    }

    #[test]
    fn falls_back_to_plan_tagged_deductions() {
        let tagged = |code: &str, description: &str| RubricDefinition {
            code: code.to_owned(),
            description: description.to_owned(),
            category: RubricCategory::Deduction,
            ignore_in_sum: false,
            plan_tag: Some("planserv".to_owned()),
        };
        let table = RubricTable::new([
            tagged("7034", "PLANSERV DEPENDENTE"),
            RubricDefinition {
                plan_tag: None,
                ..tagged("8000", "IMPOSTO")
            },
        ])
        .unwrap();
        let plan = PlanConfig::default();
        let records = [record(Month::January, &[], &[("7034", 450.0), ("8000", 50.0)])];

        let report = PlanReporter::new(&table, &plan).report(&records, "x");

        assert_eq!(report.descontos.total, 450.0);
        assert_eq!(report.descontos.details.len(), 1);
        assert_eq!(report.descontos.details[0].code, "7034");
    }

    #[test]
    fn drops_zero_lines_and_sorts_by_amount() {
        let table = rubrics();
        let plan = PlanConfig {
            earnings_base: BTreeSet::new(),
            plan_deductions: ["7033", "7034", "8000"]
                .iter()
                .map(|c| (*c).to_owned())
                .collect(),
            order: ReportOrder::AmountDesc,
        };
        let records = [record(
            Month::January,
            &[],
            &[("7033", 100.0), ("7034", 300.0), ("8000", 0.0)],
        )];

        let report = PlanReporter::new(&table, &plan).report(&records, "x");
        let codes: Vec<&str> = report
            .descontos
            .details
            .iter()
            .map(|l| l.code.as_str())
            .collect();
        assert_eq!(codes, ["7034", "7033"]);
        assert!(report.proventos.details.is_empty());
        assert_eq!(report.proventos.total, 0.0);
    }

    #[test]
    fn tables_cover_every_period_and_code() {
        let table = rubrics();
        let series = [
            record(Month::January, &[("7033", 10.0)], &[("7034", 150.0)]),
            MonthlyRecord::empty(PeriodKey::new(Month::February, 2023)),
            record(Month::March, &[], &[("9999", 5.0), ("7034", 300.0)]),
        ];
        let tables = build_tables(&table, &series);

        assert_eq!(tables.earnings_summary.len(), 3);
        assert_eq!(tables.earnings_summary[0].period, "01/2023");
        assert_eq!(tables.deductions_detail.codes, ["7034", "9999"]);
        assert_eq!(
            tables.deductions_detail.columns,
            ["PLANSERV DEPENDENTE", "9999"]
        );
        assert_eq!(tables.deductions_detail.rows[1].values, [0.0, 0.0]);
        assert_eq!(tables.deductions_detail.rows[2].values, [300.0, 5.0]);
    }

    #[test]
    fn classifies_by_law_citation() {
        let classifier = TableClassifier::new(&TableRule::defaults()).unwrap();
        assert_eq!(
            classifier.classify("conforme Lei nº 13.450, de 26 de outubro de 2015, art. 2"),
            "2015"
        );
        assert_eq!(classifier.classify("sem referência"), TableRule::UNKNOWN);
    }

    #[test]
    fn invalid_rule_pattern_is_an_error() {
        let rules = [TableRule {
            label: "bad".to_owned(),
            pattern: "(".to_owned(),
        }];
        assert!(matches!(
            TableClassifier::new(&rules),
            Err(PayslipError::InvalidPattern(_))
        ));
    }
}
