//! Error types surfaced by the pipeline.
//!
//! Every variant here halts the run. The two intentional default-to-zero
//! policies (missing optional numeric column, zero denominator) are not
//! errors and never show up in this module.
use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unsupported file extension for '{0}' (expected .csv, .xlsx or .xls)")]
    UnsupportedExtension(String),

    #[error("file '{name}' could not be read: {reason}")]
    Unreadable { name: String, reason: String },
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("{table} table has no '{field}' column (looked for: {aliases})")]
    MissingColumn {
        table: &'static str,
        field: &'static str,
        aliases: String,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum DateRangeError {
    #[error("date range needs both a start and an end date")]
    IncompleteDates,

    #[error("time-of-day window needs both a start and an end time")]
    IncompleteTimes,

    #[error("date range start {from} is after its end {to}")]
    Inverted { from: NaiveDate, to: NaiveDate },

    #[error("time-of-day window start {from} is after its end {to}")]
    InvertedTimes { from: NaiveTime, to: NaiveTime },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    DateRange(#[from] DateRangeError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
