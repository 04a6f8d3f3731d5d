//! Code–value pairing.
//!
//! Extracted payslip text has no reliable column alignment, so no single
//! rule pairs codes with amounts correctly on every template. Each rule is
//! a [`CodeValuePairer`] selected per template through
//! [`PairingStrategy`]:
//!
//! - [`LineBasedPairer`]: pairs by position within each line, preferring
//!   the last amount after a code
//! - [`ProximityPairer`]: greedy nearest-following unconsumed amount
//! - [`ColumnSplitPairer`]: rebuilds each page as left column then right
//!   column from word boxes, then pairs line by line
//!
//! All strategies treat every known code (both categories) as a delimiter
//! but only report the requested target codes. A code defined in both
//! categories may appear twice on one dual-column row; [`Column`] says
//! which occurrence the current pass reads.

mod column;
mod line;
mod proximity;
mod tokens;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use payslip_models::PairingStrategy;

use crate::layout::Page;

pub use column::ColumnSplitPairer;
pub use line::LineBasedPairer;
pub use proximity::ProximityPairer;
pub use tokens::{Token, TokenKind, tokenize};

/// Side of a dual-column row a pairing pass reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Column {
    /// Earnings: the leftmost occurrence of a repeated code wins.
    Left,
    /// Deductions: the rightmost occurrence of a repeated code wins.
    #[default]
    Right,
}

/// The codes a pairing pass looks at.
#[derive(Debug, Clone, Copy)]
pub struct CodeSets<'a> {
    /// Codes whose amounts are reported.
    pub targets: &'a BTreeSet<String>,
    /// Every known code; non-target codes still claim their amounts.
    pub vocabulary: &'a BTreeSet<String>,
    /// Which occurrence wins when a line repeats a target code.
    pub column: Column,
}

/// Result of pairing one block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pairing {
    /// Amount per target code. When a code occurs more than once the last
    /// paired occurrence wins.
    pub amounts: BTreeMap<String, f64>,
    /// Target codes that occurred but were never paired with an amount.
    pub unpaired: BTreeSet<String>,
    /// Target codes whose amount was chosen among several candidates.
    pub ambiguous: BTreeSet<String>,
}

impl Pairing {
    pub(crate) fn record(&mut self, codes: &CodeSets<'_>, code: &str, amount: f64) {
        if !codes.targets.contains(code) {
            return;
        }
        log::trace!("Paired {code} with {amount:.2}");
        self.unpaired.remove(code);
        self.amounts.insert(code.to_owned(), amount);
    }

    /// Records the pairs found on one line, keeping only the occurrence
    /// [`CodeSets::column`] selects when a code repeats on the line.
    pub(crate) fn record_line(&mut self, codes: &CodeSets<'_>, pairs: &[(&str, f64)]) {
        let mut chosen: Vec<(&str, f64)> = Vec::with_capacity(pairs.len());
        for &(code, amount) in pairs {
            match chosen.iter().position(|(seen, _)| *seen == code) {
                Some(i) if codes.column == Column::Right => chosen[i].1 = amount,
                Some(_) => {}
                None => chosen.push((code, amount)),
            }
        }
        for (code, amount) in chosen {
            self.record(codes, code, amount);
        }
    }

    pub(crate) fn mark_unpaired(&mut self, codes: &CodeSets<'_>, code: &str) {
        if codes.targets.contains(code) && !self.amounts.contains_key(code) {
            self.unpaired.insert(code.to_owned());
        }
    }

    pub(crate) fn mark_ambiguous(&mut self, codes: &CodeSets<'_>, code: &str) {
        if codes.targets.contains(code) {
            self.ambiguous.insert(code.to_owned());
        }
    }
}

/// A code–value pairing rule.
pub trait CodeValuePairer: Send + Sync + fmt::Debug {
    /// The strategy this pairer implements.
    fn strategy(&self) -> PairingStrategy;

    /// Text of a page as this strategy wants to read it.
    fn page_text(&self, page: &Page) -> String {
        page.text.clone()
    }

    /// Pairs the target codes in `block` with their amounts.
    fn pair(&self, block: &str, codes: &CodeSets<'_>) -> Pairing;
}

/// Builds the pairer for a configured strategy.
#[must_use]
pub fn pairer_for(strategy: PairingStrategy) -> Box<dyn CodeValuePairer> {
    match strategy {
        PairingStrategy::LineBased => Box::new(LineBasedPairer),
        PairingStrategy::ProximityBased => Box::new(ProximityPairer),
        PairingStrategy::ColumnSplit => Box::new(ColumnSplitPairer::default()),
    }
}

/// Pairs `codes` with the trailing `amounts` in order: with more amounts
/// than codes the leading surplus is skipped, with fewer amounts the
/// trailing codes are left out.
pub(crate) fn pair_in_order<'c>(codes: &[&'c str], amounts: &[f64]) -> Vec<(&'c str, f64)> {
    let offset = amounts.len().saturating_sub(codes.len());
    codes
        .iter()
        .zip(&amounts[offset..])
        .map(|(code, amount)| (*code, *amount))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_requested_strategy() {
        for strategy in [
            PairingStrategy::LineBased,
            PairingStrategy::ProximityBased,
            PairingStrategy::ColumnSplit,
        ] {
            assert_eq!(pairer_for(strategy).strategy(), strategy);
        }
    }

    #[test]
    fn repeated_code_on_one_line_follows_column() {
        let targets = BTreeSet::from(["7033".to_owned()]);
        let pairs = [("7033", 1185.54), ("7033", 300.0)];
        for (column, expected) in [(Column::Left, 1185.54), (Column::Right, 300.0)] {
            let codes = CodeSets {
                targets: &targets,
                vocabulary: &targets,
                column,
            };
            let mut pairing = Pairing::default();
            pairing.record_line(&codes, &pairs);
            assert_eq!(pairing.amounts["7033"], expected);
        }
    }

    #[test]
    fn pair_in_order_prefers_trailing_amounts() {
        assert_eq!(
            pair_in_order(&["a", "b"], &[3.0, 100.0, 200.0]),
            [("a", 100.0), ("b", 200.0)]
        );
        assert_eq!(pair_in_order(&["a", "b"], &[5.0]), [("a", 5.0)]);
    }

    #[test]
    fn single_code_single_value_pairs_under_every_strategy() {
        let targets = BTreeSet::from(["7033".to_owned()]);
        let codes = CodeSets {
            targets: &targets,
            vocabulary: &targets,
            column: Column::Left,
        };
        let block = "ref. 12 noise text\n  7033 VENCIMENTO BASICO (30 dias) 1.185,54 \nmore noise\n";
        for strategy in [
            PairingStrategy::LineBased,
            PairingStrategy::ProximityBased,
            PairingStrategy::ColumnSplit,
        ] {
            let pairing = pairer_for(strategy).pair(block, &codes);
            assert_eq!(pairing.amounts["7033"], 1185.54, "{strategy}");
            assert!(pairing.unpaired.is_empty());
        }
    }
}
