//! Loading the rubric table and pipeline configuration from disk.
//!
//! Both loaders fail on any problem. A missing or malformed rubric table
//! would otherwise silently drop every amount.

use std::path::{Path, PathBuf};

use payslip_models::{PayslipConfig, RubricTable, RubricTableError, RubricTableFile};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid rubric table JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid rubric table: {0}")]
    Rubrics(#[from] RubricTableError),
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a rubric table in the `{"rubricas": {...}}` layout.
///
/// # Errors
///
/// Fails if the file cannot be read, is not valid JSON, or repeats a code
/// within a category.
pub fn load_rubrics(path: &Path) -> Result<RubricTable, ConfigError> {
    let table = parse_rubrics(&read(path)?)?;
    log::debug!("Loaded {} rubric(s) from {}", table.len(), path.display());
    Ok(table)
}

fn parse_rubrics(json: &str) -> Result<RubricTable, ConfigError> {
    let file: RubricTableFile = serde_json::from_str(json)?;
    Ok(RubricTable::try_from(file)?)
}

/// Reads the pipeline configuration, or the defaults when `path` is
/// `None`.
///
/// # Errors
///
/// Fails if the file cannot be read or is not valid TOML for
/// [`PayslipConfig`].
pub fn load_config(path: Option<&Path>) -> Result<PayslipConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(PayslipConfig::default());
    };
    Ok(toml::from_str(&read(path)?)?)
}
