//! COVID-19 county dashboard - data pipeline and HTTP service
//!
//! Reshapes wide cumulative case/death tables into per-county series,
//! repairs them, aggregates them, forecasts them, and joins the most recent
//! counts with county demographics for the map and table views.

pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use application::Application;
pub use error::{Error, Result};
