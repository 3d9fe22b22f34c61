//! Route handlers

use crate::api::error_response::{ApiError, ApiRejection};
use crate::api::middleware::RequestId;
use crate::api::query::{SeriesQuery, SnapshotQuery};
use crate::application::pipeline::{DashboardPipeline, TimeSeriesView};
use crate::domain::snapshot::{CorrelationPoint, SnapshotTableRow, SnapshotView};
use crate::infrastructure::log_messages::pipeline as messages;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Extension, Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

pub type AppState = Arc<DashboardPipeline>;

pub mod paths {
    pub const HEALTH: &str = "/health";
    pub const ENTITIES: &str = "/api/entities";
    pub const SNAPSHOT: &str = "/api/snapshot";
    pub const SERIES: &str = "/api/series";
}

/// Snapshot plus its tabular and correlation projections
#[derive(Debug, Serialize)]
pub struct SnapshotResponse {
    pub title: String,
    #[serde(flatten)]
    pub view: SnapshotView,
    pub table: Vec<SnapshotTableRow>,
    pub correlation: Vec<CorrelationPoint>,
}

impl From<SnapshotView> for SnapshotResponse {
    fn from(view: SnapshotView) -> Self {
        Self {
            title: view.title(),
            table: view.table_rows(),
            correlation: view.correlation_points(),
            view,
        }
    }
}

pub async fn health() -> &'static str {
    "OK"
}

pub async fn entities(
    State(pipeline): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> Result<Json<Vec<String>>, ApiRejection> {
    pipeline
        .entity_labels()
        .map(Json)
        .map_err(|e| ApiError::from(e).for_request(&request_id))
}

pub async fn snapshot(
    State(pipeline): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    query: Result<Query<SnapshotQuery>, QueryRejection>,
) -> Result<Json<SnapshotResponse>, ApiRejection> {
    let reject = |e: ApiError| e.for_request(&request_id);
    let Query(query) = query.map_err(|e| reject(ApiError::invalid_query("query", e)))?;
    let request = query.into_request().map_err(reject)?;
    let view = pipeline
        .snapshot(&request)
        .map_err(|e| reject(e.into()))?;
    Ok(Json(SnapshotResponse::from(view)))
}

/// Aggregation and forecasting are CPU-bound, so they run on the blocking pool
pub async fn series(
    State(pipeline): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    query: Result<Query<SeriesQuery>, QueryRejection>,
) -> Result<Json<TimeSeriesView>, ApiRejection> {
    let reject = |e: ApiError| e.for_request(&request_id);
    let Query(query) = query.map_err(|e| reject(ApiError::invalid_query("query", e)))?;
    let request = query.into_request().map_err(reject)?;

    let view = tokio::task::spawn_blocking(move || pipeline.time_series(&request))
        .await
        .map_err(|e| {
            error!(error = %e, "{}", messages::FORECAST_TASK_FAILED);
            reject(ApiError::TaskFailed(e.to_string()))
        })?
        .map_err(|e| reject(e.into()))?;
    Ok(Json(view))
}
