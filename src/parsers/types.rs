use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// One QTL as described by a single row of the input table
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct QtlRow {
    /// Line of the input file this row was read from
    #[serde(skip)]
    pub line: u64,
    /// QTL label, used as both name and uniquename of the feature
    #[serde(rename = "qtl_label")]
    pub label: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub published_symbol: Option<String>,
    /// Name of the trait term within the trait vocabulary
    pub trait_name: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub experiment: Option<String>,
    pub linkage_group: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub peak_position: Option<f64>,
    pub start_position: f64,
    pub end_position: f64,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub lod: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub r2: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub additive_effect: Option<f64>,
}

impl QtlRow {
    /// Position stored on the map: the peak when known, otherwise the interval start
    pub fn map_position(&self) -> f64 {
        self.peak_position.unwrap_or(self.start_position)
    }

    /// Check the values serde cannot: non-empty text and a sane interval.
    pub fn check(&self) -> Result<(), String> {
        for (column, value) in [
            ("qtl_label", &self.label),
            ("trait_name", &self.trait_name),
            ("linkage_group", &self.linkage_group),
        ] {
            if value.trim().is_empty() {
                return Err(format!("missing value for '{}'", column));
            }
        }

        if !self.start_position.is_finite() || !self.end_position.is_finite() {
            return Err("interval positions must be finite".to_string());
        }
        if self.start_position > self.end_position {
            return Err(format!(
                "start position {} is after end position {}",
                self.start_position, self.end_position
            ));
        }
        if let Some(peak) = self.peak_position {
            if peak < self.start_position || peak > self.end_position {
                return Err(format!(
                    "peak position {} lies outside {}-{}",
                    peak, self.start_position, self.end_position
                ));
            }
        }
        Ok(())
    }
}

/// Errors that stop a whole file from being read
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("QTL file not found: {0}")]
    NotFound(PathBuf),

    #[error("QTL file {path} could not be read: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("QTL file {path} has an unreadable header: {source}")]
    BadHeader {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("QTL file {0} contains no header row")]
    EmptyFile(PathBuf),

    #[error("QTL file {path} is missing required columns: {}", columns.join(", "))]
    MissingColumns { path: PathBuf, columns: Vec<String> },

    #[error("QTL file {path} names these columns more than once: {}", columns.join(", "))]
    DuplicateColumns { path: PathBuf, columns: Vec<String> },
}

/// A row that could not be turned into a [`QtlRow`]
#[derive(Debug, Error)]
#[error("line {line}: {message}")]
pub struct RowError {
    pub line: u64,
    pub message: String,
}
