//! Request objects and the pipeline that serves them
//!
//! Every call recomputes its view from the read-only source tables; nothing
//! is cached between requests.

use crate::config::Settings;
use crate::domain::aggregation::{aggregate, AggregatedSeries, AggregationMode};
use crate::domain::correction::correct_records;
use crate::domain::demographics::DemographicsTable;
use crate::domain::entity::EntityKey;
use crate::domain::errors::PipelineError;
use crate::domain::forecast::{
    ForecastHorizons, ForecastLabels, ForecastResult, Forecaster, TrendSeasonalModel,
};
use crate::domain::reshape::SeriesReshaper;
use crate::domain::schema::SourceSchema;
use crate::domain::snapshot::{Metric, SnapshotJoiner, SnapshotView};
use crate::domain::table::WideTimeSeriesTable;
use crate::domain::types::{normalise_selection, UnknownOption};
use crate::infrastructure::log_messages::pipeline as messages;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// The source tables, loaded once and shared read-only
#[derive(Debug, Clone)]
pub struct SourceData {
    confirmed: WideTimeSeriesTable,
    deaths: WideTimeSeriesTable,
    demographics: Option<DemographicsTable>,
}

impl SourceData {
    pub fn new(
        confirmed: WideTimeSeriesTable,
        deaths: WideTimeSeriesTable,
        demographics: Option<DemographicsTable>,
    ) -> Self {
        Self {
            confirmed,
            deaths,
            demographics,
        }
    }

    pub fn confirmed(&self) -> &WideTimeSeriesTable {
        &self.confirmed
    }

    pub fn deaths(&self) -> &WideTimeSeriesTable {
        &self.deaths
    }

    pub fn demographics(&self) -> Option<&DemographicsTable> {
        self.demographics.as_ref()
    }

    pub fn table(&self, dataset: Dataset) -> &WideTimeSeriesTable {
        match dataset {
            Dataset::Cases => &self.confirmed,
            Dataset::Deaths => &self.deaths,
        }
    }
}

/// Which cumulative table a time series is drawn from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    Deaths,
    #[default]
    Cases,
}

impl FromStr for Dataset {
    type Err = UnknownOption;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalise_selection(value).as_str() {
            "deaths" => Ok(Self::Deaths),
            "cases" | "confirmed" | "confirmedcases" => Ok(Self::Cases),
            _ => Err(UnknownOption::new("dataset", value)),
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deaths => write!(f, "Deaths"),
            Self::Cases => write!(f, "Cases"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRequest {
    pub size: Metric,
    pub color: Metric,
    /// Restrict the returned rows to one county
    pub entity: Option<EntityKey>,
}

impl Default for SnapshotRequest {
    fn default() -> Self {
        Self {
            size: Metric::Deaths,
            color: Metric::FatalityRate,
            entity: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesRequest {
    pub entity: EntityKey,
    pub dataset: Dataset,
    pub mode: AggregationMode,
    /// `None` plots the aggregated series without forecasting
    pub forecast: Option<ForecastHorizons>,
}

/// What the time-series chart plots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "result", rename_all = "snake_case")]
pub enum TimeSeriesView {
    Series(AggregatedSeries),
    Forecast(ForecastResult),
}

/// Runs the snapshot and time-series pipelines over shared source data
#[derive(Clone)]
pub struct DashboardPipeline {
    sources: Arc<SourceData>,
    schema: SourceSchema,
    forecaster: Forecaster,
    floor_at_zero: bool,
}

impl DashboardPipeline {
    pub fn new(
        sources: Arc<SourceData>,
        schema: SourceSchema,
        forecaster: Forecaster,
        floor_at_zero: bool,
    ) -> Self {
        Self {
            sources,
            schema,
            forecaster,
            floor_at_zero,
        }
    }

    /// Pipeline with the configured schema and forecasting model
    pub fn from_settings(sources: Arc<SourceData>, settings: &Settings) -> Self {
        let forecast = &settings.forecast;
        let model = TrendSeasonalModel::new(forecast.confidence_level)
            .with_min_history(forecast.min_history)
            .with_weekly_seasonality(forecast.weekly_seasonality);
        Self::new(
            sources,
            settings.schema.source.clone(),
            Forecaster::new(Arc::new(model)),
            forecast.floor_at_zero,
        )
    }

    pub fn sources(&self) -> &SourceData {
        &self.sources
    }

    /// Labels for the county picker, in table order
    pub fn entity_labels(&self) -> Result<Vec<String>, PipelineError> {
        self.sources.confirmed().entity_labels(&self.schema)
    }

    /// The most-recent-date view of every county
    #[instrument(skip(self), fields(size = %request.size, color = %request.color))]
    pub fn snapshot(&self, request: &SnapshotRequest) -> Result<SnapshotView, PipelineError> {
        debug!("{}", messages::BUILDING_SNAPSHOT);
        let view = SnapshotJoiner::new(&self.schema).join(
            self.sources.confirmed(),
            self.sources.deaths(),
            self.sources.demographics(),
            request.size,
            request.color,
        )?;
        if view.degraded {
            warn!(
                size = %view.size_metric,
                color = ?view.color_metric,
                rows = view.rows.len(),
                "{}",
                messages::SNAPSHOT_DEGRADED
            );
        }
        match &request.entity {
            Some(key) => view.select(key),
            None => Ok(view),
        }
    }

    /// Reshape, repair and aggregate one county's series, forecasting it
    /// when horizons are supplied
    #[instrument(skip(self), fields(entity = %request.entity, dataset = %request.dataset))]
    pub fn time_series(&self, request: &TimeSeriesRequest) -> Result<TimeSeriesView, PipelineError> {
        debug!("{}", messages::BUILDING_SERIES);
        let records = SeriesReshaper::new(&self.schema)
            .reshape(self.sources.table(request.dataset), &request.entity)?;
        let corrected = correct_records(&records);
        let series = aggregate(&corrected, request.mode)?;

        let Some(horizons) = request.forecast else {
            return Ok(TimeSeriesView::Series(series));
        };

        let labels = ForecastLabels {
            dataset: request.dataset.to_string(),
            entity: request.entity.label(),
        };
        let result = self.forecaster.forecast(&series, horizons, labels)?;
        info!(
            model = %result.model,
            predicted = result.predicted.len(),
            mae = ?result.score.map(|s| s.mean_absolute_error),
            "{}",
            messages::FORECAST_COMPLETED
        );
        let result = if self.floor_at_zero {
            result.floored_at_zero()
        } else {
            result
        };
        Ok(TimeSeriesView::Forecast(result))
    }
}
