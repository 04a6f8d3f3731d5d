//! Beneficiary-count inference.
//!
//! Deductions are billed as `unit price × people`. Given only the billed
//! amount and the known unit prices, [`BeneficiaryEstimator`] recovers the
//! number of people, or says it cannot ([`InferredCount::NonStandard`]).

use std::collections::BTreeMap;

use payslip_models::{AnalysisEntry, AnalysisRules, InferredCount, MonthlyRecord, PeriodKey};

use crate::value::parse_amount;

/// Infers covered-person counts from deduction amounts.
#[derive(Debug, Clone)]
pub struct BeneficiaryEstimator<'a> {
    rules: &'a AnalysisRules,
}

impl<'a> BeneficiaryEstimator<'a> {
    #[must_use]
    pub const fn new(rules: &'a AnalysisRules) -> Self {
        Self { rules }
    }

    /// Estimates how many people `amount` of `code` covers.
    ///
    /// * non-finite amounts are [`InferredCount::NotApplicable`]
    /// * single-beneficiary codes and codes without reference prices are `1`
    /// * the dependents code must be an exact multiple of a reference
    ///   price, otherwise [`InferredCount::NonStandard`]
    /// * any other code is rounded against its nearest reference price,
    ///   never below `1`
    #[must_use]
    pub fn estimate(&self, code: &str, amount: f64) -> InferredCount {
        if !amount.is_finite() {
            return InferredCount::NotApplicable;
        }
        if self.rules.single_beneficiary_codes.contains(code) {
            return InferredCount::Count(1);
        }
        let Some(references) = self
            .rules
            .reference_values
            .get(code)
            .filter(|refs| !refs.is_empty())
        else {
            return InferredCount::Count(1);
        };

        if self.rules.dependents_code.as_deref() == Some(code) {
            self.exact_multiple(amount, references)
        } else {
            self.nearest_reference(amount, references)
        }
    }

    /// Like [`estimate`](Self::estimate) for an amount still in text form.
    ///
    /// Accepts locale amounts (`450,00`) and plain decimals (`450.00`);
    /// anything else is [`InferredCount::NotApplicable`].
    #[must_use]
    pub fn estimate_raw(&self, code: &str, raw: &str) -> InferredCount {
        parse_amount(raw)
            .or_else(|| raw.trim().parse::<f64>().ok())
            .map_or(InferredCount::NotApplicable, |amount| {
                self.estimate(code, amount)
            })
    }

    fn exact_multiple(&self, amount: f64, references: &[f64]) -> InferredCount {
        let eps = self.rules.tolerance;
        for &reference in references {
            if (amount - reference).abs() < eps {
                return InferredCount::Count(1);
            }
            if reference > 0.0 {
                let ratio = amount / reference;
                let whole = ratio.round();
                if whole >= 1.0 && (ratio - whole).abs() < eps {
                    return InferredCount::Count(to_count(whole));
                }
            }
        }
        log::debug!("{amount:.2} is not a multiple of any reference price {references:?}");
        InferredCount::NonStandard
    }

    #[allow(clippy::unused_self)]
    fn nearest_reference(&self, amount: f64, references: &[f64]) -> InferredCount {
        let nearest = references
            .iter()
            .copied()
            .min_by(|a, b| (amount - a).abs().total_cmp(&(amount - b).abs()))
            .unwrap_or_default();
        if nearest <= 0.0 {
            return InferredCount::Count(1);
        }
        let count = (amount / nearest).round();
        InferredCount::Count(if count >= 1.0 { to_count(count) } else { 1 })
    }

    /// Estimates every positive deduction of every record.
    #[must_use]
    pub fn analyze(
        &self,
        records: &[MonthlyRecord],
    ) -> BTreeMap<PeriodKey, BTreeMap<String, AnalysisEntry>> {
        records
            .iter()
            .filter_map(|record| {
                let entries: BTreeMap<String, AnalysisEntry> = record
                    .deductions
                    .iter()
                    .filter(|(_, amount)| **amount > 0.0)
                    .map(|(code, &amount)| {
                        let entry = AnalysisEntry {
                            amount,
                            inferred_count: self.estimate(code, amount),
                        };
                        (code.clone(), entry)
                    })
                    .collect();
                (!entries.is_empty()).then_some((record.period, entries))
            })
            .collect()
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_count(value: f64) -> u32 {
    value.min(f64::from(u32::MAX)) as u32
}
