//! Train/test split, fitting and scoring around a forecast model

use crate::domain::aggregation::AggregatedSeries;
use crate::domain::errors::PipelineError;
use crate::domain::forecast::model::{ForecastModel, Prediction, TrainingPoint};
use crate::domain::types::HorizonDays;
use crate::infrastructure::log_messages::pipeline as messages;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// How many recent points to withhold and how far past them to predict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastHorizons {
    pub test: HorizonDays,
    pub forecast: HorizonDays,
}

impl ForecastHorizons {
    pub fn total_days(&self) -> usize {
        self.test.days() + self.forecast.days()
    }
}

/// Presentation metadata carried through to the result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastLabels {
    pub dataset: String,
    pub entity: String,
}

/// A withheld ground-truth observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeldOutActual {
    pub date: NaiveDate,
    pub value: f64,
}

/// Accuracy of the predictions over the held-out dates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastScore {
    pub points: usize,
    pub mean_absolute_error: f64,
    pub root_mean_squared_error: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub title: String,
    pub dataset: String,
    pub entity: String,
    pub model: String,
    pub history: AggregatedSeries,
    pub training_end: NaiveDate,
    pub predicted: Vec<Prediction>,
    pub held_out_actuals: Option<Vec<HeldOutActual>>,
    pub score: Option<ForecastScore>,
}

impl ForecastResult {
    /// Presentation copy with predictions clamped at zero.
    ///
    /// Counts cannot be negative, but the model does not know that; this is
    /// applied only when displaying.
    pub fn floored_at_zero(&self) -> Self {
        Self {
            predicted: self
                .predicted
                .iter()
                .map(Prediction::floored_at_zero)
                .collect(),
            ..self.clone()
        }
    }
}

/// Runs one fit per invocation of a pluggable model
#[derive(Clone)]
pub struct Forecaster {
    model: Arc<dyn ForecastModel>,
}

impl Forecaster {
    pub fn new(model: Arc<dyn ForecastModel>) -> Self {
        Self { model }
    }

    /// Split, fit and predict.
    ///
    /// The last `test` defined observations are withheld; predictions cover
    /// every day from one past the last training date through
    /// `test + forecast` days ahead.
    pub fn forecast(
        &self,
        series: &AggregatedSeries,
        horizons: ForecastHorizons,
        labels: ForecastLabels,
    ) -> Result<ForecastResult, PipelineError> {
        let defined: Vec<TrainingPoint> = series
            .observations()
            .into_iter()
            .filter_map(|o| {
                o.value.map(|value| TrainingPoint {
                    date: o.date,
                    value,
                })
            })
            .collect();

        let test_days = horizons.test.days();
        let required = self.model.min_history();
        let train_len = defined.len().saturating_sub(test_days);
        if train_len < required || test_days > defined.len() {
            return Err(PipelineError::InsufficientHistory {
                required: required + test_days,
                available: defined.len(),
            });
        }
        let (train, test) = defined.split_at(train_len);
        let training_end = train
            .last()
            .map(|p| p.date)
            .ok_or(PipelineError::InsufficientHistory {
                required,
                available: 0,
            })?;

        debug!(
            model = self.model.name(),
            training_points = train.len(),
            held_out = test.len(),
            "{}",
            messages::FITTING_MODEL
        );
        let fitted = self.model.fit(train)?;

        let dates = future_dates(training_end, horizons.total_days());
        let predicted = fitted.predict(&dates);

        let held_out_actuals = (test_days > 0).then(|| {
            test.iter()
                .map(|p| HeldOutActual {
                    date: p.date,
                    value: p.value,
                })
                .collect::<Vec<_>>()
        });
        let score = held_out_actuals
            .as_deref()
            .and_then(|actuals| score(&predicted, actuals));

        Ok(ForecastResult {
            title: format!("{} forecast for {}", labels.dataset, labels.entity),
            dataset: labels.dataset,
            entity: labels.entity,
            model: self.model.name().to_string(),
            history: series.clone(),
            training_end,
            predicted,
            held_out_actuals,
            score,
        })
    }
}

/// Contiguous days following `after`
fn future_dates(after: NaiveDate, count: usize) -> Vec<NaiveDate> {
    (1..=count as u64)
        .map_while(|offset| after.checked_add_days(Days::new(offset)))
        .collect()
}

/// Mean absolute and root-mean-squared error over dates present in both
fn score(predicted: &[Prediction], actuals: &[HeldOutActual]) -> Option<ForecastScore> {
    let by_date: HashMap<NaiveDate, f64> = predicted
        .iter()
        .map(|p| (p.date, p.point_estimate))
        .collect();
    let errors: Vec<f64> = actuals
        .iter()
        .filter_map(|a| by_date.get(&a.date).map(|estimate| estimate - a.value))
        .collect();
    if errors.is_empty() {
        return None;
    }
    let n = errors.len() as f64;
    Some(ForecastScore {
        points: errors.len(),
        mean_absolute_error: errors.iter().map(|e| e.abs()).sum::<f64>() / n,
        root_mean_squared_error: (errors.iter().map(|e| e * e).sum::<f64>() / n).sqrt(),
    })
}
