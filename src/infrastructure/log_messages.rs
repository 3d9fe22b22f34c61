//! Log message constants for the dashboard service
//!
//! Message text lives here so that call sites only attach structured fields
//! and the wording stays consistent across layers.

/// Application startup and lifecycle messages
pub mod application {
    pub const STARTING: &str = "Starting COVID-19 dashboard";
    pub const STARTING_SERVER: &str = "Starting dashboard server";
    pub const STARTED_SUCCESSFULLY: &str = "Dashboard server started successfully";
    pub const SHUTTING_DOWN: &str = "Dashboard server shutting down";
}

/// Source table loading messages
pub mod data {
    pub const LOADING_TABLE: &str = "Loading source table";
    pub const TABLE_LOADED: &str = "Source table loaded";
    pub const DEMOGRAPHICS_DISABLED: &str =
        "No demographics table configured; snapshot demographics are disabled";
    pub const SOURCES_READY: &str = "Source data ready";
    pub const SKIPPED_KEYLESS_ROW: &str = "Skipping row without a county key";
    pub const SKIPPED_REPEATED_COUNTY: &str = "Skipping county listed more than once";
    pub const REPEATED_COUNTIES: &str = "Skipped counties with repeated keys";
}

/// Pipeline invocation messages
pub mod pipeline {
    pub const BUILDING_SNAPSHOT: &str = "Building county snapshot";
    pub const SNAPSHOT_DEGRADED: &str = "Snapshot served in degraded mode";
    pub const METRICS_UNAVAILABLE: &str =
        "Requested metrics cannot be plotted; retrying with a reduced metric set";
    pub const BUILDING_SERIES: &str = "Building county time series";
    pub const FITTING_MODEL: &str = "Fitting forecast model";
    pub const FORECAST_COMPLETED: &str = "Forecast completed";
    pub const FORECAST_TASK_FAILED: &str = "Forecast task failed to complete";
}

/// Request/response processing messages
pub mod request_processing {
    pub const REQUEST_RECEIVED: &str = "Incoming request";
    pub const REQUEST_COMPLETED: &str = "Request completed";
    pub const REQUEST_FAILED: &str = "Request failed";
}

/// Configuration messages
pub mod configuration {
    pub const CONFIG_LOADED: &str = "Configuration loaded successfully";
}
