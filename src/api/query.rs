//! Query string parameters and their conversion into pipeline requests

use crate::api::error_response::ApiError;
use crate::application::pipeline::{Dataset, SnapshotRequest, TimeSeriesRequest};
use crate::domain::aggregation::{AggregationKind, AggregationMode};
use crate::domain::entity::EntityKey;
use crate::domain::forecast::ForecastHorizons;
use crate::domain::snapshot::Metric;
use crate::domain::types::HorizonDays;
use serde::Deserialize;

/// Window used when the rolling average is selected without one
pub const DEFAULT_ROLLING_WINDOW: usize = 7;

/// `GET /api/snapshot`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnapshotQuery {
    pub size: Option<String>,
    pub color: Option<String>,
    pub entity: Option<String>,
}

impl SnapshotQuery {
    pub fn into_request(self) -> Result<SnapshotRequest, ApiError> {
        let defaults = SnapshotRequest::default();
        Ok(SnapshotRequest {
            size: parse_or(self.size.as_deref(), defaults.size)?,
            color: parse_or(self.color.as_deref(), defaults.color)?,
            entity: self
                .entity
                .as_deref()
                .map(EntityKey::from_label)
                .transpose()?,
        })
    }
}

/// `GET /api/series`
#[derive(Debug, Clone, Deserialize)]
pub struct SeriesQuery {
    pub entity: String,
    pub dataset: Option<String>,
    pub mode: Option<String>,
    pub window: Option<usize>,
    #[serde(default)]
    pub forecast: bool,
    pub test_days: Option<u32>,
    pub forward_days: Option<u32>,
}

impl SeriesQuery {
    pub fn into_request(self) -> Result<TimeSeriesRequest, ApiError> {
        let entity = EntityKey::from_label(&self.entity)?;
        let dataset = match self.dataset.as_deref() {
            Some(raw) => raw.parse::<Dataset>()?,
            None => Dataset::default(),
        };
        let kind = match self.mode.as_deref() {
            Some(raw) => raw.parse::<AggregationKind>()?,
            None => AggregationKind::Cumulative,
        };
        let window = match kind {
            AggregationKind::DailyRollingAverage => {
                Some(self.window.unwrap_or(DEFAULT_ROLLING_WINDOW))
            }
            _ => self.window,
        };
        let mode = AggregationMode::new(kind, window)?;

        let forecast = if self.forecast {
            Some(ForecastHorizons {
                test: horizon("test_days", self.test_days)?,
                forecast: horizon("forward_days", self.forward_days)?,
            })
        } else {
            None
        };

        Ok(TimeSeriesRequest {
            entity,
            dataset,
            mode,
            forecast,
        })
    }
}

fn parse_or(raw: Option<&str>, default: Metric) -> Result<Metric, ApiError> {
    Ok(raw.map(str::parse::<Metric>).transpose()?.unwrap_or(default))
}

fn horizon(field: &str, days: Option<u32>) -> Result<HorizonDays, ApiError> {
    HorizonDays::try_new(days.unwrap_or(0)).map_err(|e| ApiError::invalid_query(field, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::PipelineError;

    fn series(entity: &str) -> SeriesQuery {
        SeriesQuery {
            entity: entity.to_string(),
            dataset: None,
            mode: None,
            window: None,
            forecast: false,
            test_days: None,
            forward_days: None,
        }
    }

    #[test]
    fn test_snapshot_defaults() {
        let request = SnapshotQuery::default().into_request().unwrap();
        assert_eq!(request, SnapshotRequest::default());
    }

    #[test]
    fn test_unknown_metric_is_rejected() {
        let query = SnapshotQuery {
            size: Some("Recovered".to_string()),
            ..SnapshotQuery::default()
        };
        assert!(matches!(
            query.into_request(),
            Err(ApiError::Pipeline(PipelineError::MissingMetric { .. }))
        ));
    }

    #[test]
    fn test_series_defaults_to_cumulative_cases() {
        let request = series("Autauga, Alabama").into_request().unwrap();
        assert_eq!(request.dataset, Dataset::Cases);
        assert_eq!(request.mode, AggregationMode::Cumulative);
        assert!(request.forecast.is_none());
    }

    #[test]
    fn test_rolling_average_gets_default_window() {
        let query = SeriesQuery {
            mode: Some("Daily Rolling Average".to_string()),
            ..series("Autauga, Alabama")
        };
        assert_eq!(
            query.into_request().unwrap().mode,
            AggregationMode::DailyRollingAverage {
                window: DEFAULT_ROLLING_WINDOW
            }
        );
    }

    #[test]
    fn test_window_without_rolling_average_is_invalid() {
        let query = SeriesQuery {
            mode: Some("daily".to_string()),
            window: Some(5),
            ..series("Autauga, Alabama")
        };
        assert!(matches!(
            query.into_request(),
            Err(ApiError::Pipeline(PipelineError::InvalidWindow(_)))
        ));
    }

    #[test]
    fn test_horizon_above_limit_is_invalid_query() {
        let query = SeriesQuery {
            forecast: true,
            forward_days: Some(5000),
            ..series("Autauga, Alabama")
        };
        assert!(matches!(
            query.into_request(),
            Err(ApiError::InvalidQuery { ref field, .. }) if field == "forward_days"
        ));
    }

    #[test]
    fn test_malformed_entity_label_is_not_found() {
        assert!(matches!(
            series("Autauga").into_request(),
            Err(ApiError::Pipeline(PipelineError::EntityNotFound { .. }))
        ));
    }
}
