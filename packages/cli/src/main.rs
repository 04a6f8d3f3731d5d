#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for payslip rubric extraction.
//!
//! `payslip analyze` reads payslip PDFs (or text dumps) and prints the
//! JSON analysis report. `payslip estimate` runs the beneficiary estimator
//! on a single amount.

mod config;
mod source;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use payslip::{BeneficiaryEstimator, Pipeline};
use payslip_models::PairingStrategy;

#[derive(Parser)]
#[command(name = "payslip", about = "Payslip rubric extraction and analysis")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract rubrics from payslips and print the analysis report as JSON
    Analyze {
        /// Rubric table (JSON, `{"rubricas": {"proventos": ..., "descontos": ...}}`)
        #[arg(long)]
        rubrics: PathBuf,
        /// Pipeline configuration (TOML). Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Pairing strategy, overriding the configured one
        /// (`line_based`, `proximity_based`, `column_split`)
        #[arg(long)]
        strategy: Option<PairingStrategy>,
        /// Write the report here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Payslip files (`.pdf`, or text with form feeds between pages)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Estimate how many people a deduction amount covers
    Estimate {
        /// Pipeline configuration (TOML) holding the reference prices
        #[arg(long)]
        config: Option<PathBuf>,
        /// Deduction code (e.g. "7034")
        code: String,
        /// Amount as printed (`450,00`) or plain (`450.00`)
        amount: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            rubrics,
            config,
            strategy,
            output,
            files,
        } => {
            let rubrics = config::load_rubrics(&rubrics)?;
            let mut config = config::load_config(config.as_deref())?;
            if let Some(strategy) = strategy {
                config.extraction.strategy = strategy;
            }
            let pipeline = Pipeline::new(rubrics, config)?;

            let mut documents = Vec::with_capacity(files.len());
            let mut unreadable = Vec::new();
            for path in &files {
                match source::load_document(path) {
                    Ok(document) => documents.push(document),
                    Err(e) => {
                        log::warn!("{e}");
                        unreadable.push(payslip_models::DocumentFailure {
                            document: path.display().to_string(),
                            reason: e.to_string(),
                        });
                    }
                }
            }

            log::info!(
                "Analyzing {} file(s) with the {} strategy",
                documents.len(),
                pipeline.strategy()
            );

            let mut report = match pipeline.analyze(&documents) {
                Ok(report) => report,
                Err(payslip::PayslipError::NoUsableDocuments { mut failures }) => {
                    failures.extend(unreadable);
                    for failure in &failures {
                        log::error!("{}: {}", failure.document, failure.reason);
                    }
                    return Err(payslip::PayslipError::NoUsableDocuments { failures }.into());
                }
                Err(e) => return Err(e.into()),
            };
            report.failures.extend(unreadable);

            let json = serde_json::to_string_pretty(&report)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    log::info!("Report written to {}", path.display());
                }
                None => println!("{json}"),
            }
        }
        Commands::Estimate {
            config,
            code,
            amount,
        } => {
            let config = config::load_config(config.as_deref())?;
            let estimator = BeneficiaryEstimator::new(&config.analysis);
            println!("{}", estimator.estimate_raw(&code, &amount));
        }
    }

    Ok(())
}
