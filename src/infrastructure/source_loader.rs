//! Loading of the source tables from local CSV files

use crate::application::pipeline::SourceData;
use crate::config::{DataSettings, SchemaSettings};
use crate::domain::demographics::DemographicsTable;
use crate::domain::table::WideTimeSeriesTable;
use crate::infrastructure::log_messages::data as messages;
use crate::{Error, Result};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use tracing::{info, instrument};

/// Read the confirmed, deaths and optional demographics tables.
///
/// Date columns of both time-series tables are validated here so that a
/// malformed file is rejected at startup rather than on the first request.
#[instrument(skip(schema))]
pub fn load_sources(data: &DataSettings, schema: &SchemaSettings) -> Result<SourceData> {
    let confirmed = load_time_series(&data.confirmed_path)?;
    let deaths = load_time_series(&data.deaths_path)?;
    confirmed.date_columns(&schema.source)?;
    deaths.date_columns(&schema.source)?;

    let demographics = match &data.demographics_path {
        Some(path) => {
            info!(path = %path.display(), "{}", messages::LOADING_TABLE);
            let table = DemographicsTable::from_reader(open_source(path)?, &schema.demographics)?;
            info!(path = %path.display(), counties = table.len(), "{}", messages::TABLE_LOADED);
            Some(table)
        }
        None => {
            info!("{}", messages::DEMOGRAPHICS_DISABLED);
            None
        }
    };

    info!(
        confirmed_rows = confirmed.len(),
        deaths_rows = deaths.len(),
        demographics = demographics.is_some(),
        "{}",
        messages::SOURCES_READY
    );
    Ok(SourceData::new(confirmed, deaths, demographics))
}

fn load_time_series(path: &Path) -> Result<WideTimeSeriesTable> {
    info!(path = %path.display(), "{}", messages::LOADING_TABLE);
    let table = WideTimeSeriesTable::from_reader(open_source(path)?)?;
    info!(path = %path.display(), rows = table.len(), "{}", messages::TABLE_LOADED);
    Ok(table)
}

/// A missing file is a configuration mistake, so it is reported by path
fn open_source(path: &Path) -> Result<BufReader<File>> {
    match File::open(path) {
        Ok(file) => Ok(BufReader::new(file)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(Error::source_not_found(path)),
        Err(e) => Err(e.into()),
    }
}
