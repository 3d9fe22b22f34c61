//! Wide-to-long reshaping of a single county's cumulative counts

use crate::domain::entity::EntityKey;
use crate::domain::errors::PipelineError;
use crate::domain::schema::SourceSchema;
use crate::domain::table::WideTimeSeriesTable;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of a county's cumulative count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongTimeSeriesRecord {
    pub date: NaiveDate,
    pub cumulative_count: i64,
}

/// Converts one row of a wide table into a date-ordered long series
#[derive(Debug, Clone, Copy)]
pub struct SeriesReshaper<'a> {
    schema: &'a SourceSchema,
}

impl<'a> SeriesReshaper<'a> {
    pub fn new(schema: &'a SourceSchema) -> Self {
        Self { schema }
    }

    /// Reshape the row for `key`, sorted ascending by date.
    ///
    /// Exactly one row must match; zero matches is `EntityNotFound` and more
    /// than one is `AmbiguousEntity`.
    pub fn reshape(
        &self,
        table: &WideTimeSeriesTable,
        key: &EntityKey,
    ) -> Result<Vec<LongTimeSeriesRecord>, PipelineError> {
        let index = table.identity_index(self.schema)?;
        let mut matches = table.rows_for(&index, key);
        let row = matches
            .next()
            .ok_or_else(|| PipelineError::entity_not_found(key.label()))?;
        let extra = matches.count();
        if extra > 0 {
            return Err(PipelineError::AmbiguousEntity {
                label: key.label(),
                matches: extra + 1,
            });
        }

        let mut records = table
            .date_columns(self.schema)?
            .iter()
            .map(|column| {
                Ok(LongTimeSeriesRecord {
                    date: column.date,
                    cumulative_count: row.count(column)?,
                })
            })
            .collect::<Result<Vec<_>, PipelineError>>()?;
        records.sort_by_key(|record| record.date);
        Ok(records)
    }
}
