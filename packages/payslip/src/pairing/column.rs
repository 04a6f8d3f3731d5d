use payslip_models::PairingStrategy;

use super::{CodeSets, CodeValuePairer, LineBasedPairer, Pairing};
use crate::layout::{Page, split_columns};
use crate::segment::match_header;

/// Reads each page as two independent columns, then pairs line by line.
///
/// Period header rows span both columns; the columns are split separately
/// under each header. Pages without word boxes fall back to their raw
/// text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnSplitPairer {
    lines: LineBasedPairer,
}

impl CodeValuePairer for ColumnSplitPairer {
    fn strategy(&self) -> PairingStrategy {
        PairingStrategy::ColumnSplit
    }

    fn page_text(&self, page: &Page) -> String {
        split_columns(page, |line| match_header(line).is_some()).unwrap_or_else(|| {
            log::debug!("Page has no word boxes; using raw text");
            page.text.clone()
        })
    }

    fn pair(&self, block: &str, codes: &CodeSets<'_>) -> Pairing {
        self.lines.pair(block, codes)
    }
}
