#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Rubric extraction and beneficiary inference for payslip text.
//!
//! Text recovered from payslip PDFs has no schema: columns collapse,
//! amounts drift away from their codes and one file may hold many months.
//! This crate turns that text into per-month earning and deduction amounts
//! and infers how many people each health-plan deduction covers.
//!
//! The stages, leaf first:
//!
//! 1. [`value`] parses `1.234,56` style amounts
//! 2. [`segment`] splits a document at `Month/Year` headers
//! 3. [`blocks`] isolates the earnings and deductions blocks
//! 4. [`pairing`] pairs rubric codes with amounts using a configurable
//!    [`PairingStrategy`](payslip_models::PairingStrategy)
//! 5. [`aggregate`] consolidates chunks into one record per month
//! 6. [`estimate`] infers beneficiary counts from reference prices
//! 7. [`report`] summarizes the configured plan codes
//!
//! [`Pipeline`] wires them together.

pub mod aggregate;
pub mod blocks;
pub mod estimate;
pub mod layout;
pub mod pairing;
pub mod pipeline;
pub mod report;
pub mod segment;
pub mod value;

use payslip_models::DocumentFailure;

pub use aggregate::MonthlyAggregator;
pub use estimate::BeneficiaryEstimator;
pub use layout::{Page, WordBox};
pub use pipeline::{Document, DocumentExtraction, Pipeline};
pub use report::{PlanReporter, TableClassifier};

/// Errors raised by the pipeline.
///
/// Per-line anomalies are never errors; they surface as
/// [`Warning`](payslip_models::Warning)s in the report.
#[derive(Debug, thiserror::Error)]
pub enum PayslipError {
    /// The document has no `Month/Year` header.
    #[error("No period header found in document")]
    PeriodNotFound,

    /// A configured regex pattern failed to compile.
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Every document of a run failed.
    #[error("No usable documents ({} failed)", failures.len())]
    NoUsableDocuments { failures: Vec<DocumentFailure> },
}
