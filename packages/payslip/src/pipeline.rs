//! End-to-end driver: documents in, [`AnalysisReport`] out.
//!
//! A [`Pipeline`] is built once from an immutable rubric table and
//! configuration and may then analyze any number of document batches. All
//! per-run state lives inside [`Pipeline::analyze`].

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

use payslip_models::{
    AnalysisReport, DocumentFailure, PairingStrategy, PayslipConfig, PeriodKey, RubricCategory,
    RubricTable, TableRule, UnmatchedEntry, Warning, WarningKind,
};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::PayslipError;
use crate::aggregate::MonthlyAggregator;
use crate::blocks::{BlockExtractor, RubricBlocks};
use crate::estimate::BeneficiaryEstimator;
use crate::layout::Page;
use crate::pairing::{CodeSets, CodeValuePairer, Column, Pairing, pairer_for, tokenize};
use crate::report::{PlanReporter, TableClassifier, build_tables};
use crate::segment::segment;
use crate::value::is_malformed_amount;

/// Page separator in plain-text dumps.
pub const PAGE_BREAK: char = '\x0c';

/// One input document as rendered pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Name used in warnings and failures, usually the file name.
    pub name: String,
    pub pages: Vec<Page>,
}

impl Document {
    /// A document from plain text, one page per [`PAGE_BREAK`]-separated
    /// piece.
    #[must_use]
    pub fn from_text(name: impl Into<String>, text: &str) -> Self {
        Self {
            name: name.into(),
            pages: text.split(PAGE_BREAK).map(Page::from_text).collect(),
        }
    }

    /// Raw text of every page, one page after the other.
    #[must_use]
    pub fn full_text(&self) -> String {
        self.pages
            .iter()
            .map(|page| page.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Amounts paired in one period chunk of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkAmounts {
    pub period: PeriodKey,
    pub earnings: BTreeMap<String, f64>,
    pub deductions: BTreeMap<String, f64>,
}

/// Everything extracted from a single document, before aggregation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentExtraction {
    pub tabela: String,
    pub chunks: Vec<ChunkAmounts>,
    pub unmatched: Vec<UnmatchedEntry>,
    pub warnings: Vec<Warning>,
}

/// The configured extraction and analysis pipeline.
#[derive(Debug)]
pub struct Pipeline {
    rubrics: RubricTable,
    config: PayslipConfig,
    pairer: Box<dyn CodeValuePairer>,
    blocks: BlockExtractor,
    tables: TableClassifier,
    unknown_code: Option<Regex>,
    vocabulary: BTreeSet<String>,
    earning_codes: BTreeSet<String>,
    deduction_codes: BTreeSet<String>,
}

impl Pipeline {
    /// Validates the configuration and compiles its patterns.
    ///
    /// # Errors
    ///
    /// * [`PayslipError::InvalidPattern`] if a configured regex fails to
    ///   compile
    /// * [`PayslipError::InvalidConfig`] if a block marker is blank, the
    ///   tolerance is negative or not finite, or the year range is empty
    pub fn new(rubrics: RubricTable, config: PayslipConfig) -> Result<Self, PayslipError> {
        let tolerance = config.analysis.tolerance;
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(PayslipError::InvalidConfig(format!(
                "tolerance must be a non-negative number, got {tolerance}"
            )));
        }
        let (min_year, max_year) = (config.extraction.min_year, config.extraction.max_year);
        if min_year > max_year {
            return Err(PayslipError::InvalidConfig(format!(
                "min_year {min_year} is after max_year {max_year}"
            )));
        }
        if rubrics.is_empty() {
            log::warn!("Rubric table is empty; every amount will be dropped");
        }

        let blocks = BlockExtractor::new(&config.extraction.markers)?;
        let tables = TableClassifier::new(&config.effective_table_rules())?;
        let unknown_code = config
            .extraction
            .unknown_code_pattern
            .as_deref()
            .map(Regex::new)
            .transpose()?;
        let pairer = pairer_for(config.extraction.strategy);

        log::debug!(
            "Pipeline ready: {} rubric(s), strategy {}",
            rubrics.len(),
            pairer.strategy()
        );

        Ok(Self {
            vocabulary: rubrics.all_codes(),
            earning_codes: rubrics.codes(RubricCategory::Earning),
            deduction_codes: rubrics.codes(RubricCategory::Deduction),
            rubrics,
            config,
            pairer,
            blocks,
            tables,
            unknown_code,
        })
    }

    #[must_use]
    pub fn strategy(&self) -> PairingStrategy {
        self.pairer.strategy()
    }

    /// Segments one document and pairs every block of every period chunk.
    ///
    /// # Errors
    ///
    /// Returns [`PayslipError::PeriodNotFound`] if the document has no
    /// period header within the configured year range.
    pub fn extract_document(
        &self,
        document: &Document,
    ) -> Result<DocumentExtraction, PayslipError> {
        let text = document
            .pages
            .iter()
            .map(|page| self.pairer.page_text(page))
            .collect::<Vec<_>>()
            .join("\n");
        let sections = segment(&text)?;

        let mut extraction = DocumentExtraction {
            tabela: self.tables.classify(&document.full_text()).to_owned(),
            ..DocumentExtraction::default()
        };

        let years = self.config.extraction.min_year..=self.config.extraction.max_year;
        for (period, chunks) in &sections {
            if !years.contains(&period.year) {
                log::warn!("{}: skipping {period}, outside {years:?}", document.name);
                extraction.warnings.push(Warning {
                    document: document.name.clone(),
                    period: Some(*period),
                    kind: WarningKind::PeriodOutOfRange,
                    message: format!("{period} is outside {years:?}"),
                });
                continue;
            }
            for chunk in chunks {
                let blocks = self.blocks.extract(chunk);
                let mut report = |kind, message: String| {
                    extraction.warnings.push(Warning {
                        document: document.name.clone(),
                        period: Some(*period),
                        kind,
                        message,
                    });
                };
                if blocks.earnings.is_none() {
                    report(WarningKind::MissingBlock, "no earnings block".to_owned());
                }
                if blocks.deductions.is_none() {
                    report(WarningKind::MissingBlock, "no deductions block".to_owned());
                }

                let earnings = self.pair_block(
                    document,
                    *period,
                    RubricCategory::Earning,
                    blocks.earnings_text(),
                    &mut extraction,
                );
                let deductions = self.pair_block(
                    document,
                    *period,
                    RubricCategory::Deduction,
                    blocks.deductions_text(),
                    &mut extraction,
                );
                self.scan_lines(document, *period, chunk, &blocks, &mut extraction);

                extraction.chunks.push(ChunkAmounts {
                    period: *period,
                    earnings,
                    deductions,
                });
            }
        }

        if extraction.chunks.is_empty() {
            return Err(PayslipError::PeriodNotFound);
        }

        log::debug!(
            "{}: {} period(s), {} chunk(s), tabela {}",
            document.name,
            sections.len(),
            extraction.chunks.len(),
            extraction.tabela
        );

        Ok(extraction)
    }

    fn pair_block(
        &self,
        document: &Document,
        period: PeriodKey,
        category: RubricCategory,
        block: &str,
        extraction: &mut DocumentExtraction,
    ) -> BTreeMap<String, f64> {
        let (targets, column) = match category {
            RubricCategory::Earning => (&self.earning_codes, Column::Left),
            RubricCategory::Deduction => (&self.deduction_codes, Column::Right),
        };
        let Pairing {
            amounts,
            unpaired,
            ambiguous,
        } = self.pairer.pair(
            block,
            &CodeSets {
                targets,
                vocabulary: &self.vocabulary,
                column,
            },
        );

        let warn = |kind, message: String| Warning {
            document: document.name.clone(),
            period: Some(period),
            kind,
            message,
        };
        extraction.warnings.extend(
            unpaired
                .iter()
                .map(|code| warn(WarningKind::MissingValue, format!("{code} has no amount"))),
        );
        extraction.warnings.extend(ambiguous.iter().map(|code| {
            let amount = amounts.get(code).copied().unwrap_or_default();
            warn(
                WarningKind::AmbiguousPairing,
                format!("{code} paired with {amount:.2} among several candidates"),
            )
        }));

        amounts
    }

    /// Reports malformed amounts and codes missing from the rubric table.
    ///
    /// Each line of the chunk is read once, even where the earnings and
    /// deductions blocks share lines (dual-column pages). On such a line the
    /// leading item is an earning and later items are deductions. An unknown
    /// code takes the last amount before the next code on its line.
    fn scan_lines(
        &self,
        document: &Document,
        period: PeriodKey,
        chunk: &str,
        blocks: &RubricBlocks<'_>,
        extraction: &mut DocumentExtraction,
    ) {
        let ranges: Vec<(RubricCategory, Range<usize>)> = [
            (RubricCategory::Earning, blocks.earnings),
            (RubricCategory::Deduction, blocks.deductions),
        ]
        .into_iter()
        .filter_map(|(category, found)| Some((category, found?.range())))
        .collect();

        let warn = |kind, message: String| Warning {
            document: document.name.clone(),
            period: Some(period),
            kind,
            message,
        };

        let mut offset = 0;
        for raw in chunk.split_inclusive('\n') {
            let line_range = offset..offset + raw.len();
            offset = line_range.end;

            let sides: Vec<(RubricCategory, Range<usize>)> = ranges
                .iter()
                .filter(|(_, r)| r.start < line_range.end && line_range.start < r.end)
                .map(|(category, r)| {
                    let start = r.start.max(line_range.start);
                    (*category, start..r.end.min(line_range.end))
                })
                .collect();
            let (Some(start), Some(end)) = (
                sides.iter().map(|(_, r)| r.start).min(),
                sides.iter().map(|(_, r)| r.end).max(),
            ) else {
                continue;
            };
            let tokens = tokenize(&chunk[start..end], &self.vocabulary);

            for token in tokens.iter().filter(|t| is_malformed_amount(t.text)) {
                extraction.warnings.push(warn(
                    WarningKind::UnparsableValue,
                    format!("cannot read {:?} as an amount", token.text),
                ));
            }

            let Some(pattern) = &self.unknown_code else {
                continue;
            };
            // An item starts at the line start or right after an amount.
            let is_unknown = |i: usize| {
                let starts_item = i == 0 || tokens[i - 1].amount().is_some();
                starts_item && !tokens[i].is_code() && pattern.is_match(tokens[i].text)
            };

            for i in (0..tokens.len()).filter(|&i| is_unknown(i)) {
                let category = match sides.as_slice() {
                    [(only, _)] => *only,
                    _ if i == 0 => RubricCategory::Earning,
                    _ => RubricCategory::Deduction,
                };
                let code = tokens[i].text;
                extraction.warnings.push(warn(
                    WarningKind::UnknownCode,
                    format!("{code} is not a known {category} code"),
                ));

                let next = (i + 1..tokens.len())
                    .find(|&j| tokens[j].is_code() || is_unknown(j))
                    .unwrap_or(tokens.len());
                if let Some(amount) = tokens[i + 1..next].iter().rev().find_map(|t| t.amount()) {
                    extraction.unmatched.push(UnmatchedEntry {
                        period,
                        category,
                        code: code.to_owned(),
                        amount,
                    });
                }
            }
        }
    }

    /// Analyzes a batch of documents as one run.
    ///
    /// Documents that fail are listed in the report's `failures` and the
    /// rest are still analyzed.
    ///
    /// # Errors
    ///
    /// Returns [`PayslipError::NoUsableDocuments`] if no document yielded a
    /// period.
    pub fn analyze(&self, documents: &[Document]) -> Result<AnalysisReport, PayslipError> {
        let mut aggregator = MonthlyAggregator::new(&self.rubrics);
        let mut failures = Vec::new();
        let mut warnings = Vec::new();
        let mut unmatched = Vec::new();
        let mut tabela: Option<String> = None;
        let mut document_count = 0;

        for document in documents {
            match self.extract_document(document) {
                Ok(extraction) => {
                    document_count += 1;
                    for chunk in &extraction.chunks {
                        aggregator.merge(chunk.period, &chunk.earnings, &chunk.deductions);
                    }
                    if extraction.tabela != TableRule::UNKNOWN && tabela.is_none() {
                        tabela = Some(extraction.tabela);
                    }
                    warnings.extend(extraction.warnings);
                    unmatched.extend(extraction.unmatched);
                }
                Err(e) => {
                    log::warn!("Skipping {}: {e}", document.name);
                    failures.push(DocumentFailure {
                        document: document.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if document_count == 0 {
            return Err(PayslipError::NoUsableDocuments { failures });
        }

        if aggregator.dropped_codes() > 0 {
            log::warn!(
                "Dropped {} amount(s) for codes absent from the rubric table",
                aggregator.dropped_codes()
            );
        }
        if !unmatched.is_empty() {
            log::info!("{} unmatched code occurrence(s)", unmatched.len());
        }
        log::debug!(
            "{} period(s) seen across {document_count} document(s)",
            aggregator.len()
        );

        let series = aggregator.series();
        let tabela = tabela.unwrap_or_else(|| TableRule::UNKNOWN.to_owned());

        let report = AnalysisReport {
            document_count,
            periods: series.iter().map(|record| record.period).collect(),
            analysis: BeneficiaryEstimator::new(&self.config.analysis).analyze(&series),
            plan_report: PlanReporter::new(&self.rubrics, &self.config.plan)
                .report(&series, &tabela),
            tables: build_tables(&self.rubrics, &series),
            monthly: series
                .into_iter()
                .map(|record| (record.period, record))
                .collect(),
            unmatched,
            warnings,
            failures,
        };

        log::info!(
            "Analyzed {} of {} document(s): {} period(s), {} warning(s)",
            report.document_count,
            documents.len(),
            report.periods.len(),
            report.warnings.len()
        );

        Ok(report)
    }
}
