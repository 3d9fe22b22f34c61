//! The forecasting capability seam

use crate::domain::errors::PipelineError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A defined observation handed to a model for fitting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// A point estimate with its uncertainty interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub date: NaiveDate,
    pub point_estimate: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

impl Prediction {
    /// Copy with every value clamped at zero
    pub fn floored_at_zero(&self) -> Self {
        Self {
            date: self.date,
            point_estimate: self.point_estimate.max(0.0),
            lower_bound: self.lower_bound.max(0.0),
            upper_bound: self.upper_bound.max(0.0),
        }
    }
}

/// A model that can be fitted to a history
pub trait ForecastModel: Send + Sync {
    /// Short name used in logs and presentation metadata
    fn name(&self) -> &'static str;

    /// Fewest training points `fit` accepts
    fn min_history(&self) -> usize;

    /// Fit once to an ascending-by-date history
    fn fit(&self, history: &[TrainingPoint]) -> Result<Box<dyn FittedModel>, PipelineError>;
}

/// A fitted model, ready to predict
pub trait FittedModel: Send + Sync {
    fn predict(&self, dates: &[NaiveDate]) -> Vec<Prediction>;
}
