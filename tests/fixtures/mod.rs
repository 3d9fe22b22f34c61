//! Shared builders for wide source tables used by the integration tests

#![allow(dead_code)]

use chrono::NaiveDate;
use covid_dashboard::application::pipeline::{DashboardPipeline, SourceData};
use covid_dashboard::domain::demographics::DemographicsTable;
use covid_dashboard::domain::forecast::{Forecaster, TrendSeasonalModel};
use covid_dashboard::domain::schema::{DemographicsSchema, SourceSchema};
use covid_dashboard::domain::table::WideTimeSeriesTable;
use covid_dashboard::domain::types::ConfidenceLevel;
use std::sync::Arc;

/// One county row of a wide table
#[derive(Debug, Clone)]
pub struct CountyRow {
    pub county: String,
    pub state: String,
    pub latitude: f64,
    pub longitude: f64,
    pub counts: Vec<i64>,
}

impl CountyRow {
    pub fn new(county: &str, state: &str, latitude: f64, longitude: f64, counts: &[i64]) -> Self {
        Self {
            county: county.to_string(),
            state: state.to_string(),
            latitude,
            longitude,
            counts: counts.to_vec(),
        }
    }
}

pub fn dates(count: usize) -> Vec<NaiveDate> {
    NaiveDate::from_ymd_opt(2020, 3, 1)
        .unwrap()
        .iter_days()
        .take(count)
        .collect()
}

/// Render a CSSE-style wide table; deaths tables carry a population column
pub fn wide_csv(rows: &[CountyRow], with_population: bool) -> String {
    let days = rows.iter().map(|r| r.counts.len()).max().unwrap_or(0);
    let mut header = vec![
        "UID", "iso2", "iso3", "code3", "FIPS", "Admin2", "Province_State", "Country_Region",
        "Lat", "Long_", "Combined_Key",
    ]
    .into_iter()
    .map(str::to_string)
    .collect::<Vec<_>>();
    if with_population {
        header.push("Population".to_string());
    }
    header.extend(dates(days).iter().map(|d| d.format("%-m/%-d/%y").to_string()));

    let mut csv = header.join(",");
    csv.push('\n');
    for (i, row) in rows.iter().enumerate() {
        let mut cells = vec![
            (84000000 + i).to_string(),
            "US".to_string(),
            "USA".to_string(),
            "840".to_string(),
            (1000 + i).to_string(),
            row.county.clone(),
            row.state.clone(),
            "US".to_string(),
            row.latitude.to_string(),
            row.longitude.to_string(),
            format!("\"{}, {}, US\"", row.county, row.state),
        ];
        if with_population {
            cells.push("10000".to_string());
        }
        cells.extend(row.counts.iter().map(i64::to_string));
        csv.push_str(&cells.join(","));
        csv.push('\n');
    }
    csv
}

pub fn table(rows: &[CountyRow], with_population: bool) -> WideTimeSeriesTable {
    WideTimeSeriesTable::from_reader(wide_csv(rows, with_population).as_bytes()).unwrap()
}

pub fn demographics(csv: &str) -> DemographicsTable {
    DemographicsTable::from_reader(csv.as_bytes(), &DemographicsSchema::default()).unwrap()
}

pub fn pipeline(
    confirmed: &[CountyRow],
    deaths: &[CountyRow],
    demographics: Option<DemographicsTable>,
) -> DashboardPipeline {
    let sources = SourceData::new(table(confirmed, false), table(deaths, true), demographics);
    let model = TrendSeasonalModel::new(ConfidenceLevel::try_new(0.8).unwrap());
    DashboardPipeline::new(
        Arc::new(sources),
        SourceSchema::default(),
        Forecaster::new(Arc::new(model)),
        true,
    )
}

/// Three counties over three weeks
pub fn sample_pipeline() -> DashboardPipeline {
    let growing: Vec<i64> = (0..21).map(|i| 100 + i * 12).collect();
    let with_dip: Vec<i64> = (0..21)
        .map(|i| if i == 10 { 40 } else { 50 + i * 3 })
        .collect();
    let confirmed = vec![
        CountyRow::new("Autauga", "Alabama", 32.54, -86.64, &growing),
        CountyRow::new("Baldwin", "Alabama", 30.73, -87.72, &with_dip),
        CountyRow::new("Unassigned", "Alabama", 0.0, 0.0, &growing),
    ];
    let deaths_growing: Vec<i64> = (0..21).map(|i| 2 + i / 3).collect();
    let deaths = vec![
        CountyRow::new("Autauga", "Alabama", 32.54, -86.64, &deaths_growing),
        CountyRow::new("Baldwin", "Alabama", 30.73, -87.72, &deaths_growing),
        CountyRow::new("Unassigned", "Alabama", 0.0, 0.0, &deaths_growing),
    ];
    pipeline(&confirmed, &deaths, None)
}
