//! Linear trend with additive day-of-week seasonality
//!
//! The regression is fitted with `linregress` on day offsets from the first
//! training date (`Y ~ X`). When at least two weeks of history exist, one
//! indicator column per observed weekday except the first is added, so the
//! weekday effects are measured against that baseline day. Prediction
//! intervals use the Student t distribution with the residual standard error
//! of the fit.

use crate::domain::errors::PipelineError;
use crate::domain::forecast::model::{FittedModel, ForecastModel, Prediction, TrainingPoint};
use crate::domain::types::ConfidenceLevel;
use chrono::{Datelike, NaiveDate};
use linregress::{FormulaRegressionBuilder, RegressionDataBuilder};
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Default fewest training points
pub const DEFAULT_MIN_HISTORY: usize = 4;

/// Below this the residual variance has no degrees of freedom
const ABSOLUTE_MIN_HISTORY: usize = 3;

const SEASON_LENGTH: usize = 7;

/// Weekly seasonality is only estimated from two full weeks or more
const MIN_SEASONAL_HISTORY: usize = 2 * SEASON_LENGTH;

/// Histories whose values vary less than this are treated as flat
const FLAT_VARIANCE: f64 = 1e-10;

const MODEL_NAME: &str = "trend_seasonal";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendSeasonalModel {
    confidence_level: ConfidenceLevel,
    min_history: usize,
    weekly_seasonality: bool,
}

impl TrendSeasonalModel {
    pub fn new(confidence_level: ConfidenceLevel) -> Self {
        Self {
            confidence_level,
            min_history: DEFAULT_MIN_HISTORY,
            weekly_seasonality: true,
        }
    }

    pub fn with_min_history(mut self, min_history: usize) -> Self {
        self.min_history = min_history.max(ABSOLUTE_MIN_HISTORY);
        self
    }

    pub fn with_weekly_seasonality(mut self, enabled: bool) -> Self {
        self.weekly_seasonality = enabled;
        self
    }

    fn interval_quantile(&self, degrees_of_freedom: usize) -> Result<f64, PipelineError> {
        let distribution = StudentsT::new(0.0, 1.0, degrees_of_freedom as f64)
            .map_err(|e| fit_failed(format!("t distribution: {e}")))?;
        let alpha = 1.0 - self.confidence_level.into_inner();
        Ok(distribution.inverse_cdf(1.0 - alpha / 2.0))
    }
}

impl ForecastModel for TrendSeasonalModel {
    fn name(&self) -> &'static str {
        MODEL_NAME
    }

    fn min_history(&self) -> usize {
        self.min_history
    }

    fn fit(&self, history: &[TrainingPoint]) -> Result<Box<dyn FittedModel>, PipelineError> {
        let n = history.len();
        let insufficient = || PipelineError::InsufficientHistory {
            required: self.min_history,
            available: n,
        };
        let origin = history.first().map(|p| p.date).ok_or_else(insufficient)?;
        if n < self.min_history {
            return Err(insufficient());
        }

        let xs: Vec<f64> = history
            .iter()
            .map(|p| (p.date - origin).num_days() as f64)
            .collect();
        let ys: Vec<f64> = history.iter().map(|p| p.value).collect();
        let n_f = n as f64;
        let x_mean = xs.iter().sum::<f64>() / n_f;
        let sum_sq_dev: f64 = xs.iter().map(|x| (x - x_mean).powi(2)).sum();

        let y_mean = ys.iter().sum::<f64>() / n_f;
        let y_variance = ys.iter().map(|y| (y - y_mean).powi(2)).sum::<f64>() / n_f;
        if y_variance < FLAT_VARIANCE {
            // A flat history is its own forecast
            return Ok(Box::new(FittedTrendSeasonal {
                origin,
                intercept: y_mean,
                slope: 0.0,
                profile: [0.0; SEASON_LENGTH],
                residual_se: 0.0,
                quantile: 0.0,
                n,
                x_mean,
                sum_sq_dev,
            }));
        }

        let weekdays: Vec<usize> = history.iter().map(|p| weekday_index(p.date)).collect();
        let seasonal_days = if self.weekly_seasonality && n >= MIN_SEASONAL_HISTORY {
            indicator_weekdays(&weekdays)
        } else {
            Vec::new()
        };

        let mut columns = vec![("Y".to_string(), ys), ("X".to_string(), xs)];
        for &day in &seasonal_days {
            let indicator = weekdays
                .iter()
                .map(|&w| if w == day { 1.0 } else { 0.0 })
                .collect();
            columns.push((weekday_column(day), indicator));
        }
        let formula = format!(
            "Y ~ {}",
            columns[1..]
                .iter()
                .map(|(name, _)| name.as_str())
                .collect::<Vec<_>>()
                .join(" + ")
        );

        let data = RegressionDataBuilder::new()
            .build_from(columns)
            .map_err(|e| fit_failed(format!("regression data: {e}")))?;
        let model = FormulaRegressionBuilder::new()
            .data(&data)
            .formula(formula)
            .fit()
            .map_err(|e| fit_failed(format!("least squares: {e}")))?;

        // parameters() is [intercept, slope, weekday effects...]
        let params = model.parameters();
        let (intercept, slope) = match (params.first(), params.get(1)) {
            (Some(&intercept), Some(&slope)) => (intercept, slope),
            _ => return Err(fit_failed("regression returned too few parameters")),
        };
        let mut profile = [0.0; SEASON_LENGTH];
        for (&day, &effect) in seasonal_days.iter().zip(params.iter().skip(2)) {
            profile[day] = effect;
        }

        let degrees_of_freedom = n.saturating_sub(2 + seasonal_days.len()).max(1);
        let residual_se = model.scale().max(0.0).sqrt();
        let quantile = self.interval_quantile(degrees_of_freedom)?;

        Ok(Box::new(FittedTrendSeasonal {
            origin,
            intercept,
            slope,
            profile,
            residual_se,
            quantile,
            n,
            x_mean,
            sum_sq_dev,
        }))
    }
}

#[derive(Debug, Clone)]
struct FittedTrendSeasonal {
    origin: NaiveDate,
    intercept: f64,
    slope: f64,
    profile: [f64; SEASON_LENGTH],
    residual_se: f64,
    quantile: f64,
    n: usize,
    x_mean: f64,
    sum_sq_dev: f64,
}

impl FittedModel for FittedTrendSeasonal {
    fn predict(&self, dates: &[NaiveDate]) -> Vec<Prediction> {
        dates
            .iter()
            .map(|&date| {
                let x = (date - self.origin).num_days() as f64;
                let point_estimate =
                    self.intercept + self.slope * x + self.profile[weekday_index(date)];
                let leverage = if self.sum_sq_dev > 0.0 {
                    (x - self.x_mean).powi(2) / self.sum_sq_dev
                } else {
                    0.0
                };
                let half_width = self.quantile
                    * self.residual_se
                    * (1.0 + 1.0 / self.n as f64 + leverage).sqrt();
                Prediction {
                    date,
                    point_estimate,
                    lower_bound: point_estimate - half_width,
                    upper_bound: point_estimate + half_width,
                }
            })
            .collect()
    }
}

fn fit_failed(reason: impl Into<String>) -> PipelineError {
    PipelineError::ModelFit {
        model: MODEL_NAME.to_string(),
        reason: reason.into(),
    }
}

fn weekday_index(date: NaiveDate) -> usize {
    date.weekday().num_days_from_monday() as usize
}

fn weekday_column(day: usize) -> String {
    format!("D{day}")
}

/// Observed weekdays after the first, which serves as the baseline
fn indicator_weekdays(weekdays: &[usize]) -> Vec<usize> {
    let mut seen = [false; SEASON_LENGTH];
    for &day in weekdays {
        seen[day] = true;
    }
    let baseline = weekdays.first().copied();
    (0..SEASON_LENGTH)
        .filter(|&day| seen[day] && Some(day) != baseline)
        .collect()
}
