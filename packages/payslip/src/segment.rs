//! Splits document text into per-period sections.
//!
//! A line starting with `Month/Year` (or `Month Year`) opens a new
//! section; every following line up to the next header belongs to it.
//! Repeated headers for the same period produce separate chunks so the
//! aggregator can sum them.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use payslip_models::{Month, PeriodKey};
use regex::Regex;

use crate::PayslipError;

/// Period header at the start of a line. Full names come before the
/// abbreviations so the leftmost-first alternation prefers them.
static PERIOD_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(janeiro|fevereiro|mar[cç]o|abril|maio|junho|julho|agosto|setembro|outubro|novembro|dezembro|jan|fev|mar|abr|mai|jun|jul|ago|set|out|nov|dez)\.?(?:\s*/\s*|\s+)(\d{4})\b",
    )
    .expect("valid regex")
});

/// Raw text chunks per period, in document order within each period.
pub type Sections = BTreeMap<PeriodKey, Vec<String>>;

/// Matches a period header at the start of `line`, returning the period
/// and the remainder of the line after the header.
#[must_use]
pub fn match_header(line: &str) -> Option<(PeriodKey, &str)> {
    let caps = PERIOD_HEADER_RE.captures(line)?;
    let month = Month::from_name(caps.get(1)?.as_str())?;
    let year = caps.get(2)?.as_str().parse::<i32>().ok()?;
    let end = caps.get(0)?.end();
    Some((PeriodKey::new(month, year), &line[end..]))
}

/// Splits `text` into sections keyed by period.
///
/// Lines before the first header are discarded. Text after a header on
/// the header's own line is kept as the first line of its section.
///
/// # Errors
///
/// Returns [`PayslipError::PeriodNotFound`] if no line carries a period
/// header.
pub fn segment(text: &str) -> Result<Sections, PayslipError> {
    let mut sections = Sections::new();
    let mut current: Option<(PeriodKey, String)> = None;

    for line in text.lines() {
        if let Some((period, rest)) = match_header(line) {
            if let Some((previous, chunk)) = current.take() {
                sections.entry(previous).or_default().push(chunk);
            }
            let mut chunk = String::new();
            let rest = rest.trim();
            if !rest.is_empty() {
                chunk.push_str(rest);
                chunk.push('\n');
            }
            log::trace!("Period header {period} opens a new section");
            current = Some((period, chunk));
        } else if let Some((_, chunk)) = current.as_mut() {
            chunk.push_str(line);
            chunk.push('\n');
        }
    }

    if let Some((period, chunk)) = current {
        sections.entry(period).or_default().push(chunk);
    }

    if sections.is_empty() {
        return Err(PayslipError::PeriodNotFound);
    }

    log::debug!(
        "Segmented document into {} period(s), {} chunk(s)",
        sections.len(),
        sections.values().map(Vec::len).sum::<usize>()
    );

    Ok(sections)
}
