//! Isolates the earnings and deductions blocks of a period section.

use payslip_models::BlockMarkers;
use regex::{Match, Regex};

use crate::PayslipError;

/// The two rubric blocks of one section, with their byte ranges in the
/// section. `None` when the section has no such block, which some payslip
/// variants legitimately omit.
///
/// On dual-column pages the two ranges overlap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RubricBlocks<'t> {
    pub earnings: Option<Match<'t>>,
    pub deductions: Option<Match<'t>>,
}

impl<'t> RubricBlocks<'t> {
    /// Earnings text, empty when absent.
    #[must_use]
    pub fn earnings_text(&self) -> &'t str {
        self.earnings.map_or("", |m| m.as_str())
    }

    /// Deductions text, empty when absent.
    #[must_use]
    pub fn deductions_text(&self) -> &'t str {
        self.deductions.map_or("", |m| m.as_str())
    }
}

/// Finds the text between each start marker and its end marker.
#[derive(Debug, Clone)]
pub struct BlockExtractor {
    earnings: Regex,
    deductions: Regex,
}

impl BlockExtractor {
    /// Compiles the marker pairs.
    ///
    /// Markers match case-insensitively and any run of whitespace inside a
    /// marker matches any run of whitespace (including line breaks) in the
    /// text.
    ///
    /// # Errors
    ///
    /// * [`PayslipError::InvalidConfig`] if a marker is blank
    /// * [`PayslipError::InvalidPattern`] if a pattern fails to compile
    pub fn new(markers: &BlockMarkers) -> Result<Self, PayslipError> {
        Ok(Self {
            earnings: block_regex(&markers.earnings_start, &markers.earnings_end)?,
            deductions: block_regex(&markers.deductions_start, &markers.deductions_end)?,
        })
    }

    /// Extracts both blocks from `section`.
    #[must_use]
    pub fn extract<'t>(&self, section: &'t str) -> RubricBlocks<'t> {
        let find = |re: &Regex| re.captures(section).and_then(|caps| caps.get(1));
        RubricBlocks {
            earnings: find(&self.earnings),
            deductions: find(&self.deductions),
        }
    }
}

fn block_regex(start: &str, end: &str) -> Result<Regex, PayslipError> {
    Ok(Regex::new(&format!(
        r"(?is)\b{}\b(.*?){}",
        marker_pattern(start)?,
        marker_pattern(end)?
    ))?)
}

fn marker_pattern(marker: &str) -> Result<String, PayslipError> {
    let words: Vec<String> = marker.split_whitespace().map(regex::escape).collect();
    if words.is_empty() {
        return Err(PayslipError::InvalidConfig(
            "block markers must not be blank".to_owned(),
        ));
    }
    Ok(words.join(r"\s+"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> BlockExtractor {
        BlockExtractor::new(&BlockMarkers::default()).unwrap()
    }

    #[test]
    fn finds_both_blocks() {
        let section = "HEADER\nVANTAGENS\n7033 VENCIMENTO 1.185,54\nTOTAL DE VANTAGENS 1.185,54\nDESCONTOS\n7034 DEP 450,00\nTOTAL DE DESCONTOS 450,00\n";
        let blocks = extractor().extract(section);
        assert_eq!(blocks.earnings_text().trim(), "7033 VENCIMENTO 1.185,54");
        assert_eq!(blocks.deductions_text().trim(), "7034 DEP 450,00");
    }

    #[test]
    fn missing_block_is_empty_not_error() {
        let blocks = extractor().extract("VANTAGENS\n7033 1,00\nTOTAL DE VANTAGENS\n");
        assert!(blocks.earnings.is_some());
        assert_eq!(blocks.deductions, None);
        assert_eq!(blocks.deductions_text(), "");
    }

    #[test]
    fn dual_column_blocks_overlap() {
        let section = "VANTAGENS DESCONTOS\n7033 1,00 7034 2,00\nTOTAL DE VANTAGENS 1,00 TOTAL DE DESCONTOS 2,00\n";
        let blocks = extractor().extract(section);
        let earnings = blocks.earnings.unwrap().range();
        let deductions = blocks.deductions.unwrap().range();
        let row = section.find("7033").unwrap();
        assert!(earnings.contains(&row));
        assert!(deductions.contains(&row));
    }

    #[test]
    fn tolerates_case_and_broken_whitespace() {
        let blocks = extractor().extract("Vantagens\n7033 1,00\nTotal de\n  Vantagens\n");
        assert_eq!(blocks.earnings_text().trim(), "7033 1,00");
    }

    #[test]
    fn rejects_blank_marker() {
        let markers = BlockMarkers {
            earnings_end: "   ".to_owned(),
            ..BlockMarkers::default()
        };
        assert!(matches!(
            BlockExtractor::new(&markers),
            Err(PayslipError::InvalidConfig(_))
        ));
    }
}
