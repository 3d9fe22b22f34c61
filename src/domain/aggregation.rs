//! Cumulative, daily and rolling-average views of a corrected series
//!
//! Each aggregation mode produces its own point shape so that callers never
//! have to guess which column holds the value being plotted.

use crate::domain::errors::PipelineError;
use crate::domain::reshape::LongTimeSeriesRecord;
use crate::domain::table::count_change;
use crate::domain::types::{normalise_selection, UnknownOption};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Smallest rolling window accepted
pub const MIN_ROLLING_WINDOW: usize = 2;

/// Which aggregation the caller selected, before any window is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationKind {
    Cumulative,
    Daily,
    DailyRollingAverage,
}

impl FromStr for AggregationKind {
    type Err = UnknownOption;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalise_selection(value).as_str() {
            "cumulative" => Ok(Self::Cumulative),
            "daily" => Ok(Self::Daily),
            "dailyrollingaverage" | "rollingaverage" => Ok(Self::DailyRollingAverage),
            _ => Err(UnknownOption::new("aggregation", value)),
        }
    }
}

impl fmt::Display for AggregationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cumulative => write!(f, "Cumulative"),
            Self::Daily => write!(f, "Daily"),
            Self::DailyRollingAverage => write!(f, "Daily Rolling Average"),
        }
    }
}

/// A fully specified aggregation; only the rolling average carries a window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AggregationMode {
    Cumulative,
    Daily,
    DailyRollingAverage { window: usize },
}

impl AggregationMode {
    /// Attach the window to a selected kind.
    ///
    /// A window is required for the rolling average and rejected otherwise.
    pub fn new(kind: AggregationKind, window: Option<usize>) -> Result<Self, PipelineError> {
        match (kind, window) {
            (AggregationKind::Cumulative, None) => Ok(Self::Cumulative),
            (AggregationKind::Daily, None) => Ok(Self::Daily),
            (AggregationKind::DailyRollingAverage, Some(window)) => {
                Ok(Self::DailyRollingAverage { window })
            }
            (AggregationKind::DailyRollingAverage, None) => Err(PipelineError::InvalidWindow(
                "a window is required for the daily rolling average".to_string(),
            )),
            (kind, Some(window)) => Err(PipelineError::InvalidWindow(format!(
                "window {window} does not apply to {kind} aggregation"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CumulativePoint {
    pub date: NaiveDate,
    pub cumulative: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub cumulative: i64,
    pub daily: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingPoint {
    pub date: NaiveDate,
    pub cumulative: i64,
    pub daily: i64,
    /// Absent until a full window of daily values exists
    pub rolling_average: Option<f64>,
}

/// The primary value of one aggregated row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

/// An aggregated series in the shape of its mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "data", rename_all = "snake_case")]
pub enum AggregatedSeries {
    Cumulative(Vec<CumulativePoint>),
    Daily(Vec<DailyPoint>),
    DailyRollingAverage {
        window: usize,
        points: Vec<RollingPoint>,
    },
}

impl AggregatedSeries {
    pub fn mode(&self) -> AggregationMode {
        match self {
            Self::Cumulative(_) => AggregationMode::Cumulative,
            Self::Daily(_) => AggregationMode::Daily,
            Self::DailyRollingAverage { window, .. } => {
                AggregationMode::DailyRollingAverage { window: *window }
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Cumulative(points) => points.len(),
            Self::Daily(points) => points.len(),
            Self::DailyRollingAverage { points, .. } => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The mode's primary column as (date, value) pairs
    pub fn observations(&self) -> Vec<Observation> {
        match self {
            Self::Cumulative(points) => points
                .iter()
                .map(|p| Observation {
                    date: p.date,
                    value: Some(p.cumulative as f64),
                })
                .collect(),
            Self::Daily(points) => points
                .iter()
                .map(|p| Observation {
                    date: p.date,
                    value: Some(p.daily as f64),
                })
                .collect(),
            Self::DailyRollingAverage { points, .. } => points
                .iter()
                .map(|p| Observation {
                    date: p.date,
                    value: p.rolling_average,
                })
                .collect(),
        }
    }
}

/// Derive the requested view from a corrected cumulative series.
///
/// Row `i` pairs `date[i]` and `cumulative[i]` with
/// `daily[i] = cumulative[i + 1] - cumulative[i]`; the final record has no
/// successor and is dropped, so the result is one row shorter than the input.
pub fn aggregate(
    corrected: &[LongTimeSeriesRecord],
    mode: AggregationMode,
) -> Result<AggregatedSeries, PipelineError> {
    let rows: Vec<DailyPoint> = corrected
        .windows(2)
        .map(|pair| {
            let daily = count_change(
                pair[1].cumulative_count,
                pair[0].cumulative_count,
                &pair[1].date.to_string(),
            )?;
            Ok(DailyPoint {
                date: pair[0].date,
                cumulative: pair[0].cumulative_count,
                daily,
            })
        })
        .collect::<Result<_, PipelineError>>()?;

    match mode {
        AggregationMode::Cumulative => Ok(AggregatedSeries::Cumulative(
            rows.iter()
                .map(|row| CumulativePoint {
                    date: row.date,
                    cumulative: row.cumulative,
                })
                .collect(),
        )),
        AggregationMode::Daily => Ok(AggregatedSeries::Daily(rows)),
        AggregationMode::DailyRollingAverage { window } => {
            let daily: Vec<i64> = rows.iter().map(|row| row.daily).collect();
            let averages = rolling_mean(&daily, window)?;
            let points = rows
                .iter()
                .zip(averages)
                .map(|(row, rolling_average)| RollingPoint {
                    date: row.date,
                    cumulative: row.cumulative,
                    daily: row.daily,
                    rolling_average,
                })
                .collect();
            Ok(AggregatedSeries::DailyRollingAverage { window, points })
        }
    }
}

/// Trailing simple moving mean; the first `window - 1` entries are undefined
pub fn rolling_mean(values: &[i64], window: usize) -> Result<Vec<Option<f64>>, PipelineError> {
    if window < MIN_ROLLING_WINDOW {
        return Err(PipelineError::InvalidWindow(format!(
            "window {window} is below the minimum of {MIN_ROLLING_WINDOW}"
        )));
    }
    if window > values.len() {
        return Err(PipelineError::InvalidWindow(format!(
            "window {window} exceeds the series length {}",
            values.len()
        )));
    }

    let mut averages = vec![None; window - 1];
    averages.extend(
        values
            .windows(window)
            .map(|w| Some(w.iter().map(|&v| v as f64).sum::<f64>() / window as f64)),
    );
    Ok(averages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn records(counts: &[i64]) -> Vec<LongTimeSeriesRecord> {
        let start = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        counts
            .iter()
            .zip(start.iter_days())
            .map(|(&cumulative_count, date)| LongTimeSeriesRecord {
                date,
                cumulative_count,
            })
            .collect()
    }

    #[test]
    fn test_daily_change_beyond_count_range_is_malformed() {
        let result = aggregate(&records(&[i64::MIN, i64::MAX]), AggregationMode::Daily);
        assert!(matches!(result, Err(PipelineError::MalformedCount { .. })));
    }

    #[test]
    fn test_rolling_mean_of_extreme_counts_does_not_overflow() {
        let averages = rolling_mean(&[i64::MAX, i64::MAX, i64::MAX], 2).unwrap();
        assert_eq!(averages, vec![None, Some(i64::MAX as f64), Some(i64::MAX as f64)]);
    }

    #[test]
    fn test_daily_drops_trailing_row() {
        let series = aggregate(&records(&[10, 10, 15, 20]), AggregationMode::Daily).unwrap();
        let AggregatedSeries::Daily(points) = series else {
            panic!("expected daily series");
        };
        let daily: Vec<i64> = points.iter().map(|p| p.daily).collect();
        assert_eq!(daily, vec![0, 5, 5]);
    }

    #[test]
    fn test_cumulative_is_truncated_input() {
        let series =
            aggregate(&records(&[10, 10, 15, 20]), AggregationMode::Cumulative).unwrap();
        let values: Vec<Option<f64>> = series.observations().iter().map(|o| o.value).collect();
        assert_eq!(values, vec![Some(10.0), Some(10.0), Some(15.0)]);
        assert_eq!(series.mode(), AggregationMode::Cumulative);
    }

    #[test]
    fn test_rolling_average_warm_up() {
        let series = aggregate(
            &records(&[0, 2, 6, 12, 20]),
            AggregationMode::DailyRollingAverage { window: 3 },
        )
        .unwrap();
        let values: Vec<Option<f64>> = series.observations().iter().map(|o| o.value).collect();
        // daily = [2, 4, 6, 8]
        assert_eq!(values, vec![None, None, Some(4.0), Some(6.0)]);
    }

    #[rstest]
    #[case(1)]
    #[case(0)]
    #[case(5)]
    fn test_invalid_windows(#[case] window: usize) {
        let result = aggregate(
            &records(&[0, 2, 6, 12, 20]),
            AggregationMode::DailyRollingAverage { window },
        );
        assert!(matches!(result, Err(PipelineError::InvalidWindow(_))));
    }

    #[test]
    fn test_short_series_aggregate_to_empty() {
        let series = aggregate(&records(&[3]), AggregationMode::Daily).unwrap();
        assert!(series.is_empty());
        let series = aggregate(&[], AggregationMode::Cumulative).unwrap();
        assert!(series.is_empty());
    }

    #[rstest]
    #[case("Cumulative", AggregationKind::Cumulative)]
    #[case("daily", AggregationKind::Daily)]
    #[case("Daily Rolling Average", AggregationKind::DailyRollingAverage)]
    #[case("daily_rolling_average", AggregationKind::DailyRollingAverage)]
    fn test_parse_kind(#[case] raw: &str, #[case] expected: AggregationKind) {
        assert_eq!(raw.parse::<AggregationKind>().unwrap(), expected);
    }

    #[test]
    fn test_window_only_with_rolling_average() {
        assert_eq!(
            AggregationMode::new(AggregationKind::DailyRollingAverage, Some(7)),
            Ok(AggregationMode::DailyRollingAverage { window: 7 })
        );
        assert!(AggregationMode::new(AggregationKind::DailyRollingAverage, None).is_err());
        assert!(AggregationMode::new(AggregationKind::Daily, Some(7)).is_err());
        assert_eq!(
            AggregationMode::new(AggregationKind::Cumulative, None),
            Ok(AggregationMode::Cumulative)
        );
    }
}
