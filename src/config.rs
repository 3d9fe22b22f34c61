use crate::domain::schema::{DemographicsSchema, SourceSchema};
use crate::domain::types::ConfidenceLevel;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub data: DataSettings,
    #[serde(default)]
    pub schema: SchemaSettings,
    pub forecast: ForecastSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    pub environment: String,
}

/// Locations of the source tables
#[derive(Debug, Deserialize, Clone)]
pub struct DataSettings {
    pub confirmed_path: PathBuf,
    pub deaths_path: PathBuf,
    #[serde(default)]
    pub demographics_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SchemaSettings {
    #[serde(default)]
    pub source: SourceSchema,
    #[serde(default)]
    pub demographics: DemographicsSchema,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ForecastSettings {
    pub confidence_level: ConfidenceLevel,
    pub min_history: usize,
    pub weekly_seasonality: bool,
    /// Clamp predictions at zero when presenting them
    pub floor_at_zero: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with default values
            .set_default("application.host", "0.0.0.0")?
            .set_default("application.port", 8080)?
            .set_default("application.environment", environment.clone())?
            .set_default(
                "data.confirmed_path",
                "data/time_series_covid19_confirmed_US.csv",
            )?
            .set_default("data.deaths_path", "data/time_series_covid19_deaths_US.csv")?
            .set_default("forecast.confidence_level", 0.80)?
            .set_default("forecast.min_history", 4)?
            .set_default("forecast.weekly_seasonality", true)?
            .set_default("forecast.floor_at_zero", true)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            // Add configuration file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{environment}")).required(false))
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables with prefix
            .add_source(Environment::with_prefix("COVID_DASHBOARD").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_can_be_loaded() {
        let settings = Settings::new();
        assert!(settings.is_ok());
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::new().unwrap();
        assert_eq!(settings.forecast.min_history, 4);
        assert!(settings.forecast.floor_at_zero);
        assert_eq!(settings.forecast.confidence_level.into_inner(), 0.8);
        assert_eq!(settings.schema.source.county_column, "Admin2");
        assert_eq!(
            settings.schema.demographics.percent_65_plus_column,
            "Percent 65 and Older"
        );
        assert!(settings.data.demographics_path.is_none());
    }
}
