//! Repair of non-monotonic cumulative counts
//!
//! Data-entry corrections in the source occasionally make a cumulative count
//! drop, which would show up as a negative daily count. Interior dips are
//! carried forward from the previous day in a single left-to-right pass;
//! the first point is clamped down to the second when it exceeds it. The
//! last point is never examined.

use crate::domain::reshape::LongTimeSeriesRecord;

/// Carry-forward repair of an ascending-by-date cumulative sequence
pub fn correct_cumulative(counts: &[i64]) -> Vec<i64> {
    let mut corrected = counts.to_vec();
    let n = corrected.len();
    if n < 2 {
        return corrected;
    }

    for i in 1..n - 1 {
        if corrected[i] < corrected[i - 1] {
            corrected[i] = corrected[i - 1];
        }
    }

    if corrected[0] > corrected[1] {
        corrected[0] = corrected[1];
    }

    corrected
}

/// Apply [`correct_cumulative`] to a reshaped series, keeping its dates
pub fn correct_records(records: &[LongTimeSeriesRecord]) -> Vec<LongTimeSeriesRecord> {
    let counts: Vec<i64> = records.iter().map(|r| r.cumulative_count).collect();
    records
        .iter()
        .zip(correct_cumulative(&counts))
        .map(|(record, cumulative_count)| LongTimeSeriesRecord {
            date: record.date,
            cumulative_count,
        })
        .collect()
}
