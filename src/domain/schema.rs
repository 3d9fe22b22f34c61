//! Column layout of the source tables
//!
//! The defaults describe the CSSE US time-series files and the county
//! demographics file; deployments can override any column name in config.

use serde::{Deserialize, Serialize};

/// Column names of a wide cumulative time-series table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSchema {
    pub county_column: String,
    pub state_column: String,
    pub latitude_column: String,
    pub longitude_column: String,
    /// Every non-date column; all remaining headers must be dates
    pub identity_columns: Vec<String>,
}

impl SourceSchema {
    pub fn is_identity_column(&self, header: &str) -> bool {
        self.identity_columns.iter().any(|c| c == header)
    }
}

impl Default for SourceSchema {
    fn default() -> Self {
        let identity_columns = [
            "UID",
            "iso2",
            "iso3",
            "code3",
            "FIPS",
            "Admin2",
            "Province_State",
            "Country_Region",
            "Lat",
            "Long_",
            "Combined_Key",
            "Population",
        ]
        .iter()
        .map(|c| c.to_string())
        .collect();

        Self {
            county_column: "Admin2".to_string(),
            state_column: "Province_State".to_string(),
            latitude_column: "Lat".to_string(),
            longitude_column: "Long_".to_string(),
            identity_columns,
        }
    }
}

/// Column names of the county demographics table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemographicsSchema {
    pub county_column: String,
    pub state_column: String,
    pub percent_65_plus_column: String,
    pub median_household_income_column: String,
    pub population_density_column: String,
}

impl Default for DemographicsSchema {
    fn default() -> Self {
        Self {
            county_column: "County".to_string(),
            state_column: "State".to_string(),
            percent_65_plus_column: "Percent 65 and Older".to_string(),
            median_household_income_column: "Median Household Income".to_string(),
            population_density_column: "Population Density".to_string(),
        }
    }
}
