//! County demographic attributes keyed by canonical county identity

use crate::domain::entity::EntityKey;
use crate::domain::errors::PipelineError;
use crate::domain::schema::DemographicsSchema;
use crate::infrastructure::log_messages::data as messages;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io;
use tracing::{debug, warn};

/// Demographic attributes of one county; unparseable cells are absent
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    pub percent_65_plus: Option<f64>,
    pub median_household_income: Option<f64>,
    pub population_density: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DemographicsTable {
    records: HashMap<EntityKey, Demographics>,
}

impl DemographicsTable {
    pub fn new(records: HashMap<EntityKey, Demographics>) -> Self {
        Self { records }
    }

    /// Parse the demographics CSV.
    ///
    /// Rows without a usable county or state are skipped; for a key that
    /// appears more than once the first row wins.
    pub fn from_reader<R: io::Read>(
        reader: R,
        schema: &DemographicsSchema,
    ) -> Result<Self, PipelineError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers = reader
            .headers()
            .map_err(|e| PipelineError::MalformedTable(e.to_string()))?
            .clone();
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);
        let required = |name: &str| {
            position(name).ok_or_else(|| {
                PipelineError::MalformedTable(format!(
                    "demographics table is missing column '{name}'"
                ))
            })
        };

        let county = required(&schema.county_column)?;
        let state = required(&schema.state_column)?;
        let percent_65_plus = position(&schema.percent_65_plus_column);
        let income = position(&schema.median_household_income_column);
        let density = position(&schema.population_density_column);

        let mut records = HashMap::new();
        let mut duplicates = 0usize;
        for (row_num, record) in reader.records().enumerate() {
            let record = record.map_err(|e| PipelineError::MalformedTable(e.to_string()))?;
            let cell = |index: Option<usize>| index.and_then(|i| record.get(i));
            let Some(key) = EntityKey::from_cells(
                cell(Some(county)).unwrap_or(""),
                cell(Some(state)).unwrap_or(""),
            ) else {
                debug!(
                    table = "demographics",
                    row = row_num + 1,
                    "{}",
                    messages::SKIPPED_KEYLESS_ROW
                );
                continue;
            };
            let demographics = Demographics {
                percent_65_plus: cell(percent_65_plus).and_then(parse_attribute),
                median_household_income: cell(income).and_then(parse_attribute),
                population_density: cell(density).and_then(parse_attribute),
            };
            if records.contains_key(&key) {
                duplicates += 1;
                continue;
            }
            records.insert(key, demographics);
        }

        if duplicates > 0 {
            warn!(table = "demographics", duplicates, "{}", messages::REPEATED_COUNTIES);
        }
        Ok(Self { records })
    }

    pub fn get(&self, key: &EntityKey) -> Option<&Demographics> {
        self.records.get(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parse a numeric attribute, tolerating "$", "%" and thousands separators
fn parse_attribute(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | '%'))
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const CSV: &str = "\
County,State,Percent 65 and Older,Median Household Income,Population Density
Autauga,Alabama,15.9,\"58,786\",93.5
Baldwin,Alabama,20.9,n/a,140.3
Autauga,Alabama,99,1,1
,Alabama,1,1,1
";

    #[test]
    fn test_rows_are_keyed_by_county_and_state() {
        let table = DemographicsTable::from_reader(CSV.as_bytes(), &DemographicsSchema::default())
            .unwrap();
        assert_eq!(table.len(), 2);

        let autauga = table
            .get(&EntityKey::from_label("Autauga, Alabama").unwrap())
            .unwrap();
        assert_eq!(autauga.percent_65_plus, Some(15.9));
        assert_eq!(autauga.median_household_income, Some(58786.0));
        assert_eq!(autauga.population_density, Some(93.5));
    }

    #[test]
    fn test_unparseable_cells_are_absent() {
        let table = DemographicsTable::from_reader(CSV.as_bytes(), &DemographicsSchema::default())
            .unwrap();
        let baldwin = table
            .get(&EntityKey::from_label("Baldwin, Alabama").unwrap())
            .unwrap();
        assert_eq!(baldwin.median_household_income, None);
    }

    #[test]
    fn test_missing_key_column_is_malformed() {
        let csv = "Name,State\nAutauga,Alabama\n";
        let result = DemographicsTable::from_reader(csv.as_bytes(), &DemographicsSchema::default());
        assert!(matches!(result, Err(PipelineError::MalformedTable(_))));
    }

    #[rstest]
    #[case("12.5", Some(12.5))]
    #[case(" $1,200 ", Some(1200.0))]
    #[case("17%", Some(17.0))]
    #[case("", None)]
    #[case("NaN", None)]
    fn test_parse_attribute(#[case] raw: &str, #[case] expected: Option<f64>) {
        assert_eq!(parse_attribute(raw), expected);
    }
}
