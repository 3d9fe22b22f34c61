//! Most-recent-date snapshot of every county
//!
//! Cases and deaths are read at the rightmost date column, joined on the
//! canonical county key and, when a demographics table is supplied, joined
//! against it as well. The requested size and color metrics are checked
//! before the view is returned; when either cannot be plotted as requested
//! the joiner falls back to a reduced, cleaned view flagged `degraded`.

use crate::domain::demographics::{Demographics, DemographicsTable};
use crate::domain::entity::EntityKey;
use crate::domain::errors::PipelineError;
use crate::domain::schema::SourceSchema;
use crate::domain::table::{
    count_change, DateColumn, IdentityIndex, WideRow, WideTimeSeriesTable,
};
use crate::domain::types::normalise_selection;
use crate::infrastructure::log_messages::{data as data_messages, pipeline as messages};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// A snapshot column that can drive marker size or color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    FatalityRate,
    Deaths,
    ConfirmedCases,
    DailyFatalityRate,
    DailyDeaths,
    PercentSixtyFivePlus,
    MedianHouseholdIncome,
    PopulationDensity,
}

impl Metric {
    pub const ALL: [Metric; 8] = [
        Metric::FatalityRate,
        Metric::Deaths,
        Metric::ConfirmedCases,
        Metric::DailyFatalityRate,
        Metric::DailyDeaths,
        Metric::PercentSixtyFivePlus,
        Metric::MedianHouseholdIncome,
        Metric::PopulationDensity,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::FatalityRate => "Fatality Rate",
            Self::Deaths => "Deaths",
            Self::ConfirmedCases => "Confirmed Cases",
            Self::DailyFatalityRate => "Daily Fatality Rate",
            Self::DailyDeaths => "Daily Deaths",
            Self::PercentSixtyFivePlus => "Percent 65 and Older",
            Self::MedianHouseholdIncome => "Median Household Income",
            Self::PopulationDensity => "Population Density",
        }
    }

    /// The metric's value for one row, if defined
    pub fn value(&self, row: &EntitySnapshot) -> Option<f64> {
        match self {
            Self::FatalityRate => Some(row.fatality_rate),
            Self::Deaths => Some(row.deaths as f64),
            Self::ConfirmedCases => Some(row.confirmed_cases as f64),
            Self::DailyFatalityRate => row.daily_fatality_rate,
            Self::DailyDeaths => row.daily_deaths.map(|d| d as f64),
            Self::PercentSixtyFivePlus => row.demographics.and_then(|d| d.percent_65_plus),
            Self::MedianHouseholdIncome => {
                row.demographics.and_then(|d| d.median_household_income)
            }
            Self::PopulationDensity => row.demographics.and_then(|d| d.population_density),
        }
    }

    fn is_daily(&self) -> bool {
        matches!(self, Self::DailyFatalityRate | Self::DailyDeaths)
    }

    fn is_demographic(&self) -> bool {
        matches!(
            self,
            Self::PercentSixtyFivePlus | Self::MedianHouseholdIncome | Self::PopulationDensity
        )
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Metric {
    type Err = PipelineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalise_selection(value).as_str() {
            "fatalityrate" => Ok(Self::FatalityRate),
            "deaths" => Ok(Self::Deaths),
            "confirmedcases" | "cases" => Ok(Self::ConfirmedCases),
            "dailyfatalityrate" => Ok(Self::DailyFatalityRate),
            "dailydeaths" => Ok(Self::DailyDeaths),
            "percent65andolder" | "percent65plus" | "percentsixtyfiveplus" => {
                Ok(Self::PercentSixtyFivePlus)
            }
            "medianhouseholdincome" => Ok(Self::MedianHouseholdIncome),
            "populationdensity" => Ok(Self::PopulationDensity),
            _ => Err(PipelineError::missing_metric(value)),
        }
    }
}

/// One county at the most recent observed date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    #[serde(flatten)]
    pub key: EntityKey,
    pub label: String,
    pub latitude: f64,
    pub longitude: f64,
    pub confirmed_cases: i64,
    pub deaths: i64,
    pub fatality_rate: f64,
    pub daily_cases: Option<i64>,
    pub daily_deaths: Option<i64>,
    pub daily_fatality_rate: Option<f64>,
    pub demographics: Option<Demographics>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub entities: usize,
    pub mean_fatality_rate: f64,
    pub median_fatality_rate: f64,
}

impl SummaryStatistics {
    /// Mean and median fatality rate, or `None` for an empty snapshot
    pub fn from_rows(rows: &[EntitySnapshot]) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }
        let mut rates: Vec<f64> = rows.iter().map(|r| r.fatality_rate).collect();
        rates.sort_by(f64::total_cmp);
        let n = rates.len();
        let median = if n % 2 == 0 {
            (rates[n / 2 - 1] + rates[n / 2]) / 2.0
        } else {
            rates[n / 2]
        };
        Some(Self {
            entities: n,
            mean_fatality_rate: rates.iter().sum::<f64>() / n as f64,
            median_fatality_rate: median,
        })
    }
}

/// Tabular projection of a snapshot row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotTableRow {
    pub county: String,
    pub state: String,
    pub confirmed_cases: i64,
    pub deaths: i64,
    pub fatality_rate: f64,
    pub percent_65_plus: Option<f64>,
    pub median_household_income: Option<f64>,
    pub population_density: Option<f64>,
}

/// Demographics against fatality rate for one county
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationPoint {
    pub label: String,
    pub percent_65_plus: f64,
    pub median_household_income: f64,
    pub population_density: f64,
    pub fatality_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotView {
    pub as_of: NaiveDate,
    /// The date header exactly as it appears in the source table
    pub as_of_label: String,
    pub rows: Vec<EntitySnapshot>,
    pub size_metric: Metric,
    /// `None` when the color scale had to be dropped
    pub color_metric: Option<Metric>,
    pub degraded: bool,
    pub summary: Option<SummaryStatistics>,
}

impl SnapshotView {
    pub fn title(&self) -> String {
        format!("COVID-19 Dashboard as of {}", self.as_of_label)
    }

    pub fn table_rows(&self) -> Vec<SnapshotTableRow> {
        self.rows
            .iter()
            .map(|row| {
                let demographics = row.demographics.unwrap_or_default();
                SnapshotTableRow {
                    county: row.key.county().to_string(),
                    state: row.key.state().to_string(),
                    confirmed_cases: row.confirmed_cases,
                    deaths: row.deaths,
                    fatality_rate: row.fatality_rate,
                    percent_65_plus: demographics.percent_65_plus,
                    median_household_income: demographics.median_household_income,
                    population_density: demographics.population_density,
                }
            })
            .collect()
    }

    /// Restrict the view to a single county; summary statistics still
    /// describe every county
    pub fn select(&self, key: &EntityKey) -> Result<SnapshotView, PipelineError> {
        let rows: Vec<EntitySnapshot> = self
            .rows
            .iter()
            .filter(|row| &row.key == key)
            .cloned()
            .collect();
        if rows.is_empty() {
            return Err(PipelineError::entity_not_found(key.label()));
        }
        Ok(SnapshotView {
            rows,
            ..self.clone()
        })
    }

    /// Rows with complete demographics, for the correlation scatter
    pub fn correlation_points(&self) -> Vec<CorrelationPoint> {
        self.rows
            .iter()
            .filter_map(|row| {
                let d = row.demographics?;
                Some(CorrelationPoint {
                    label: row.label.clone(),
                    percent_65_plus: d.percent_65_plus?,
                    median_household_income: d.median_household_income?,
                    population_density: d.population_density?,
                    fatality_rate: row.fatality_rate,
                })
            })
            .collect()
    }
}

/// Which snapshot columns exist for this join
#[derive(Debug, Clone, Copy)]
struct AvailableColumns {
    daily: bool,
    demographics: bool,
}

impl AvailableColumns {
    fn has(&self, metric: Metric) -> bool {
        (!metric.is_daily() || self.daily) && (!metric.is_demographic() || self.demographics)
    }
}

/// Builds the most-recent-date snapshot from the source tables
#[derive(Debug, Clone, Copy)]
pub struct SnapshotJoiner<'a> {
    schema: &'a SourceSchema,
}

impl<'a> SnapshotJoiner<'a> {
    pub fn new(schema: &'a SourceSchema) -> Self {
        Self { schema }
    }

    /// Join cases, deaths and optional demographics at the most recent date.
    ///
    /// Rows with no confirmed cases, no deaths or a (0, 0) location are
    /// filtered out. With demographics supplied, counties lacking a
    /// demographics row are dropped.
    pub fn join(
        &self,
        confirmed: &WideTimeSeriesTable,
        deaths: &WideTimeSeriesTable,
        demographics: Option<&DemographicsTable>,
        size: Metric,
        color: Metric,
    ) -> Result<SnapshotView, PipelineError> {
        let confirmed_index = confirmed.identity_index(self.schema)?;
        let deaths_index = deaths.identity_index(self.schema)?;
        let confirmed_dates = confirmed.date_columns(self.schema)?;
        let deaths_dates = deaths.date_columns(self.schema)?;

        let recent = confirmed_dates.last().ok_or_else(|| {
            PipelineError::MalformedTable("confirmed table has no date columns".to_string())
        })?;
        let previous = confirmed_dates
            .len()
            .checked_sub(2)
            .and_then(|i| confirmed_dates.get(i));
        let deaths_recent = find_date(&deaths_dates, recent.date)
            .ok_or(PipelineError::DateNotFound { date: recent.date })?;
        let deaths_previous = previous.and_then(|p| find_date(&deaths_dates, p.date));

        let confirmed_rows = unique_rows(confirmed, &confirmed_index, "confirmed");
        let deaths_rows = unique_rows(deaths, &deaths_index, "deaths");

        let mut rows = Vec::new();
        for row in confirmed.rows() {
            let Some(key) = row.entity_key(&confirmed_index) else {
                continue;
            };
            if !matches!(confirmed_rows.get(&key), Some(Some(_))) {
                continue;
            }
            let Some(Some(death_row)) = deaths_rows.get(&key) else {
                continue;
            };
            let Some((latitude, longitude)) = row.coordinates(&confirmed_index) else {
                continue;
            };
            if latitude == 0.0 && longitude == 0.0 {
                continue;
            }

            let confirmed_cases = row.count(recent)?;
            let death_count = death_row.count(deaths_recent)?;
            if confirmed_cases <= 0 || death_count <= 0 {
                continue;
            }

            let row_demographics = match demographics {
                Some(table) => match table.get(&key) {
                    Some(d) => Some(*d),
                    None => continue,
                },
                None => None,
            };

            let daily_cases = previous
                .map(|column| {
                    row.count(column)
                        .and_then(|p| count_change(confirmed_cases, p, &recent.header))
                })
                .transpose()?;
            let daily_deaths = deaths_previous
                .map(|column| {
                    death_row
                        .count(column)
                        .and_then(|p| count_change(death_count, p, &deaths_recent.header))
                })
                .transpose()?;
            let daily_fatality_rate = match (daily_cases, daily_deaths) {
                (Some(cases), Some(deaths)) if cases > 0 => {
                    Some(deaths as f64 / cases as f64 * 100.0)
                }
                _ => None,
            };

            rows.push(EntitySnapshot {
                label: key.label(),
                key,
                latitude,
                longitude,
                confirmed_cases,
                deaths: death_count,
                fatality_rate: death_count as f64 / confirmed_cases as f64 * 100.0,
                daily_cases,
                daily_deaths,
                daily_fatality_rate,
                demographics: row_demographics,
            });
        }

        let available = AvailableColumns {
            daily: previous.is_some() && deaths_previous.is_some(),
            demographics: demographics.is_some(),
        };

        let view = |rows: Vec<EntitySnapshot>, size, color, degraded| SnapshotView {
            as_of: recent.date,
            as_of_label: recent.header.clone(),
            summary: SummaryStatistics::from_rows(&rows),
            rows,
            size_metric: size,
            color_metric: color,
            degraded,
        };

        match check_metrics(&rows, available, size, color) {
            Ok(()) => Ok(view(rows, size, Some(color), false)),
            Err(reason) => {
                debug!(
                    %reason,
                    size = %size,
                    color = %color,
                    "{}",
                    messages::METRICS_UNAVAILABLE
                );
                let (rows, size, color) = degrade(rows, available, size, color);
                Ok(view(rows, size, color, true))
            }
        }
    }
}

fn find_date(columns: &[DateColumn], date: NaiveDate) -> Option<&DateColumn> {
    columns.iter().find(|c| c.date == date)
}

/// Index rows by key; keys seen more than once map to `None`
fn unique_rows<'t>(
    table: &'t WideTimeSeriesTable,
    index: &IdentityIndex,
    name: &str,
) -> HashMap<EntityKey, Option<WideRow<'t>>> {
    let mut rows: HashMap<EntityKey, Option<WideRow<'t>>> = HashMap::new();
    for row in table.rows() {
        let Some(key) = row.entity_key(index) else {
            continue;
        };
        rows.entry(key)
            .and_modify(|existing| {
                if existing.take().is_some() {
                    debug!(table = name, "{}", data_messages::SKIPPED_REPEATED_COUNTY);
                }
            })
            .or_insert(Some(row));
    }
    let duplicates = rows.values().filter(|r| r.is_none()).count();
    if duplicates > 0 {
        warn!(table = name, duplicates, "{}", data_messages::REPEATED_COUNTIES);
    }
    rows
}

/// Can the view be plotted exactly as requested?
fn check_metrics(
    rows: &[EntitySnapshot],
    available: AvailableColumns,
    size: Metric,
    color: Metric,
) -> Result<(), PipelineError> {
    for metric in [size, color] {
        if !available.has(metric) {
            return Err(PipelineError::missing_metric(metric.display_name()));
        }
        if rows.iter().any(|row| metric.value(row).is_none()) {
            return Err(PipelineError::missing_metric(format!(
                "{} (undefined for some counties)",
                metric.display_name()
            )));
        }
    }
    if rows
        .iter()
        .any(|row| size.value(row).is_some_and(|v| v < 0.0))
    {
        return Err(PipelineError::missing_metric(format!(
            "{} (negative sizes)",
            size.display_name()
        )));
    }
    Ok(())
}

/// Reduced view: substitute or drop unavailable metrics, clamp negative
/// daily fatality rates, then drop rows that still cannot be plotted
fn degrade(
    rows: Vec<EntitySnapshot>,
    available: AvailableColumns,
    size: Metric,
    color: Metric,
) -> (Vec<EntitySnapshot>, Metric, Option<Metric>) {
    let size = if available.has(size) {
        size
    } else {
        Metric::Deaths
    };
    let color = available.has(color).then_some(color);

    let rows = rows
        .into_iter()
        .map(|mut row| {
            row.daily_fatality_rate = row.daily_fatality_rate.map(|r| r.max(0.0));
            row
        })
        .filter(|row| size.value(row).is_some_and(|v| v >= 0.0))
        .filter(|row| color.is_none_or(|metric| metric.value(row).is_some()))
        .collect();
    (rows, size, color)
}
