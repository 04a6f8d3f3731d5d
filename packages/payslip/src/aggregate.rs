//! Consolidates per-chunk results into one record per period.
//!
//! Chunks of the same period (several pages, several files) are summed
//! code by code. Amounts are snapped to whole cents after each addition so
//! the result does not depend on the order chunks arrive in.

use std::collections::BTreeMap;

use payslip_models::{MonthlyRecord, PeriodKey, RubricCategory, RubricTable};

use crate::value::round_cents;

/// Accumulates [`MonthlyRecord`]s for one run.
#[derive(Debug, Clone)]
pub struct MonthlyAggregator<'r> {
    rubrics: &'r RubricTable,
    records: BTreeMap<PeriodKey, MonthlyRecord>,
    dropped: usize,
}

impl<'r> MonthlyAggregator<'r> {
    #[must_use]
    pub const fn new(rubrics: &'r RubricTable) -> Self {
        Self {
            rubrics,
            records: BTreeMap::new(),
            dropped: 0,
        }
    }

    /// Adds one chunk's amounts to its period, creating the record on first
    /// sighting.
    ///
    /// Codes missing from the rubric table under the matching category are
    /// dropped; the number dropped is returned.
    pub fn merge(
        &mut self,
        period: PeriodKey,
        earnings: &BTreeMap<String, f64>,
        deductions: &BTreeMap<String, f64>,
    ) -> usize {
        let rubrics = self.rubrics;
        let record = self
            .records
            .entry(period)
            .or_insert_with(|| MonthlyRecord::empty(period));

        let dropped = add_known(rubrics, RubricCategory::Earning, &mut record.earnings, earnings)
            + add_known(
                rubrics,
                RubricCategory::Deduction,
                &mut record.deductions,
                deductions,
            );

        record.total_earnings = total_earnings(rubrics, &record.earnings);
        self.dropped += dropped;

        if dropped > 0 {
            log::debug!("Dropped {dropped} unknown code(s) for {period}");
        }
        dropped
    }

    #[must_use]
    pub fn get(&self, period: &PeriodKey) -> Option<&MonthlyRecord> {
        self.records.get(period)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of periods actually seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Total codes dropped so far because the rubric table lacks them.
    #[must_use]
    pub const fn dropped_codes(&self) -> usize {
        self.dropped
    }

    /// Every month from the first to the last period seen, gaps included.
    #[must_use]
    pub fn timeline(&self) -> Vec<PeriodKey> {
        match (self.records.keys().next(), self.records.keys().next_back()) {
            (Some(&first), Some(&last)) => PeriodKey::range_inclusive(first, last),
            _ => Vec::new(),
        }
    }

    /// Records for the whole [`timeline`](Self::timeline), with empty
    /// records standing in for months never seen.
    #[must_use]
    pub fn series(&self) -> Vec<MonthlyRecord> {
        self.timeline()
            .into_iter()
            .map(|period| {
                self.records
                    .get(&period)
                    .cloned()
                    .unwrap_or_else(|| MonthlyRecord::empty(period))
            })
            .collect()
    }
}

fn add_known(
    rubrics: &RubricTable,
    category: RubricCategory,
    target: &mut BTreeMap<String, f64>,
    amounts: &BTreeMap<String, f64>,
) -> usize {
    let mut dropped = 0;
    for (code, amount) in amounts {
        if rubrics.get(category, code).is_none() {
            dropped += 1;
            continue;
        }
        let slot = target.entry(code.clone()).or_insert(0.0);
        *slot = round_cents(*slot + amount);
    }
    dropped
}

/// Sum of earnings not flagged `ignore_in_sum`.
#[must_use]
pub fn total_earnings(rubrics: &RubricTable, earnings: &BTreeMap<String, f64>) -> f64 {
    earnings
        .iter()
        .filter(|(code, _)| {
            rubrics
                .get(RubricCategory::Earning, code)
                .is_some_and(|def| !def.ignore_in_sum)
        })
        .fold(0.0, |acc, (_, amount)| round_cents(acc + amount))
}

#[cfg(test)]
mod tests {
    use payslip_models::{Month, RubricDefinition};

    use super::*;

    fn rubrics() -> RubricTable {
        let def = |code: &str, category, ignore_in_sum| RubricDefinition {
            code: code.to_owned(),
            description: code.to_owned(),
            category,
            ignore_in_sum,
            plan_tag: None,
        };
        RubricTable::new([
            def("7033", RubricCategory::Earning, false),
            def("7040", RubricCategory::Earning, false),
            def("0150", RubricCategory::Earning, true),
            def("7034", RubricCategory::Deduction, false),
        ])
        .unwrap()
    }

    fn amounts(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(c, v)| ((*c).to_owned(), *v)).collect()
    }

    const JAN: PeriodKey = PeriodKey::new(Month::January, 2023);

    #[test]
    fn disjoint_chunks_union() {
        let table = rubrics();
        let mut agg = MonthlyAggregator::new(&table);
        agg.merge(JAN, &amounts(&[("7033", 1000.0)]), &BTreeMap::new());
        agg.merge(JAN, &amounts(&[("7040", 200.5)]), &amounts(&[("7034", 150.0)]));

        let record = agg.get(&JAN).unwrap();
        assert_eq!(record.earnings.len(), 2);
        assert_eq!(record.deductions["7034"], 150.0);
        assert_eq!(record.total_earnings, 1200.5);
    }

    #[test]
    fn overlapping_chunks_sum() {
        let table = rubrics();
        let mut agg = MonthlyAggregator::new(&table);
        agg.merge(JAN, &BTreeMap::new(), &amounts(&[("7034", 150.0)]));
        agg.merge(JAN, &BTreeMap::new(), &amounts(&[("7034", 300.0)]));
        assert_eq!(agg.get(&JAN).unwrap().deductions["7034"], 450.0);
    }

    #[test]
    fn total_excludes_ignored_codes() {
        let table = rubrics();
        let mut agg = MonthlyAggregator::new(&table);
        agg.merge(
            JAN,
            &amounts(&[("7033", 1185.54), ("0150", 99.99)]),
            &BTreeMap::new(),
        );
        let record = agg.get(&JAN).unwrap();
        assert_eq!(record.earnings["0150"], 99.99);
        assert_eq!(record.total_earnings, 1185.54);
    }

    #[test]
    fn unknown_codes_are_dropped() {
        let table = rubrics();
        let mut agg = MonthlyAggregator::new(&table);
        // 7034 is a deduction, so it is unknown as an earning.
        let dropped = agg.merge(
            JAN,
            &amounts(&[("9999", 1.0), ("7034", 2.0)]),
            &BTreeMap::new(),
        );
        assert_eq!(dropped, 2);
        assert_eq!(agg.dropped_codes(), 2);
        assert!(agg.get(&JAN).unwrap().is_empty());
    }

    #[test]
    fn result_does_not_depend_on_chunk_order() {
        let table = rubrics();
        let chunks = [
            amounts(&[("7033", 0.1)]),
            amounts(&[("7033", 0.2), ("7040", 10.01)]),
            amounts(&[("7033", 1185.54)]),
        ];

        let mut forward = MonthlyAggregator::new(&table);
        for chunk in &chunks {
            forward.merge(JAN, chunk, &BTreeMap::new());
        }
        let mut backward = MonthlyAggregator::new(&table);
        for chunk in chunks.iter().rev() {
            backward.merge(JAN, chunk, &BTreeMap::new());
        }

        assert_eq!(forward.get(&JAN), backward.get(&JAN));
        assert_eq!(forward.get(&JAN).unwrap().earnings["7033"], 1185.84);
    }

    #[test]
    fn series_fills_gap_months() {
        let table = rubrics();
        let mut agg = MonthlyAggregator::new(&table);
        let apr = PeriodKey::new(Month::April, 2023);
        agg.merge(apr, &amounts(&[("7033", 1.0)]), &BTreeMap::new());
        agg.merge(JAN, &amounts(&[("7033", 2.0)]), &BTreeMap::new());

        let series = agg.series();
        assert_eq!(agg.len(), 2);
        assert_eq!(series.len(), 4);
        assert_eq!(series[0].period, JAN);
        assert!(series[1].is_empty());
        assert!(series[2].is_empty());
        assert_eq!(series[3].period, apr);
        assert_eq!(series[3].total_earnings, 1.0);
    }
}
