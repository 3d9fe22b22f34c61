//! Application services and pipeline orchestration
//!
//! This module turns request parameters into pipeline invocations and owns
//! the lifecycle of the running service.

pub mod app;
pub mod pipeline;

pub use app::Application;
pub use pipeline::{
    DashboardPipeline, Dataset, SnapshotRequest, SourceData, TimeSeriesRequest, TimeSeriesView,
};
