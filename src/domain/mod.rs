//! Domain types and pipeline logic for the county dashboard
//!
//! Everything here is pure: tables in, derived read-only views out. Nothing
//! in this module performs I/O beyond parsing readers it is handed.

pub mod aggregation;
pub mod correction;
pub mod demographics;
pub mod entity;
pub mod errors;
pub mod forecast;
pub mod reshape;
pub mod schema;
pub mod snapshot;
pub mod table;
pub mod types;

pub use aggregation::{aggregate, AggregatedSeries, AggregationKind, AggregationMode};
pub use correction::{correct_cumulative, correct_records};
pub use demographics::{Demographics, DemographicsTable};
pub use entity::EntityKey;
pub use errors::PipelineError;
pub use reshape::{LongTimeSeriesRecord, SeriesReshaper};
pub use schema::{DemographicsSchema, SourceSchema};
pub use snapshot::{EntitySnapshot, Metric, SnapshotJoiner, SnapshotView, SummaryStatistics};
pub use table::WideTimeSeriesTable;
