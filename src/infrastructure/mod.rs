//! Infrastructure layer for the dashboard
//!
//! Loading of the source tables from disk, subscriber setup and the log
//! message catalogue.

pub mod log_messages;
pub mod source_loader;
pub mod telemetry;

pub use source_loader::load_sources;
pub use telemetry::init_tracing;
