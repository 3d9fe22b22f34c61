//! Error kinds raised by the data pipeline

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur while reshaping, repairing, aggregating,
/// forecasting or joining county time series
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("No county matches '{label}'")]
    EntityNotFound { label: String },

    #[error("'{label}' matches {matches} rows; county keys must be unique")]
    AmbiguousEntity { label: String, matches: usize },

    #[error("Column '{header}' is not a usable date column: {reason}")]
    MalformedDateColumn { header: String, reason: String },

    #[error("Invalid rolling window: {0}")]
    InvalidWindow(String),

    #[error("Need at least {required} observations to fit a forecast, got {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("The {model} model could not be fitted: {reason}")]
    ModelFit { model: String, reason: String },

    #[error("Metric '{metric}' is not available")]
    MissingMetric { metric: String },

    #[error("Malformed table: {0}")]
    MalformedTable(String),

    #[error("Column '{column}' holds a non-count value '{value}'")]
    MalformedCount { column: String, value: String },

    #[error("Date {date} is missing from the table")]
    DateNotFound { date: NaiveDate },
}

impl PipelineError {
    pub fn missing_metric(metric: impl Into<String>) -> Self {
        Self::MissingMetric {
            metric: metric.into(),
        }
    }

    pub fn entity_not_found(label: impl Into<String>) -> Self {
        Self::EntityNotFound {
            label: label.into(),
        }
    }
}
