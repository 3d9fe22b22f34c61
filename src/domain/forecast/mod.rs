//! Forecasting of aggregated county series
//!
//! The model is a pluggable capability: anything implementing
//! [`ForecastModel`] can be fitted once per request and asked for
//! predictions over future dates. [`Forecaster`] owns the train/test split,
//! horizon bookkeeping and scoring around it.

pub mod forecaster;
pub mod model;
pub mod trend_seasonal;

pub use forecaster::{
    ForecastHorizons, ForecastLabels, ForecastResult, ForecastScore, Forecaster, HeldOutActual,
};
pub use model::{FittedModel, ForecastModel, Prediction, TrainingPoint};
pub use trend_seasonal::TrendSeasonalModel;
