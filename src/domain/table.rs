//! Wide-format cumulative time-series tables
//!
//! One row per county, a fixed set of identity columns, then one column per
//! calendar date holding the cumulative count as of that date.

use crate::domain::entity::EntityKey;
use crate::domain::errors::PipelineError;
use crate::domain::schema::SourceSchema;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::io;

/// Header formats accepted for date columns, tried in order
const DATE_HEADER_FORMATS: [&str; 3] = ["%m/%d/%y", "%m/%d/%Y", "%Y-%m-%d"];

/// A raw wide table; cells are kept as text and parsed on demand
#[derive(Debug, Clone, PartialEq)]
pub struct WideTimeSeriesTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// A date column resolved from its header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateColumn {
    pub index: usize,
    pub date: NaiveDate,
    pub header: String,
}

/// Positions of the identity columns the pipeline reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityIndex {
    county: usize,
    state: usize,
    latitude: Option<usize>,
    longitude: Option<usize>,
}

/// Borrowed view of one table row
#[derive(Debug, Clone, Copy)]
pub struct WideRow<'a> {
    headers: &'a [String],
    cells: &'a [String],
}

impl WideTimeSeriesTable {
    /// Build a table, rejecting rows whose width differs from the header
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, PipelineError> {
        if let Some((position, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != headers.len())
        {
            return Err(PipelineError::MalformedTable(format!(
                "row {} has {} cells, expected {}",
                position + 1,
                row.len(),
                headers.len()
            )));
        }
        Ok(Self { headers, rows })
    }

    /// Parse a CSV document with a header row
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, PipelineError> {
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers = reader
            .headers()
            .map_err(|e| PipelineError::MalformedTable(e.to_string()))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let rows = reader
            .records()
            .map(|record| {
                record
                    .map(|r| r.iter().map(str::to_string).collect())
                    .map_err(|e| PipelineError::MalformedTable(e.to_string()))
            })
            .collect::<Result<Vec<Vec<String>>, _>>()?;
        Self::new(headers, rows)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn rows(&self) -> impl Iterator<Item = WideRow<'_>> + '_ {
        self.rows.iter().map(|cells| WideRow {
            headers: &self.headers,
            cells,
        })
    }

    /// Locate the identity columns named by the schema
    pub fn identity_index(&self, schema: &SourceSchema) -> Result<IdentityIndex, PipelineError> {
        let required = |name: &str| {
            self.column_index(name).ok_or_else(|| {
                PipelineError::MalformedTable(format!("missing identity column '{name}'"))
            })
        };
        Ok(IdentityIndex {
            county: required(&schema.county_column)?,
            state: required(&schema.state_column)?,
            latitude: self.column_index(&schema.latitude_column),
            longitude: self.column_index(&schema.longitude_column),
        })
    }

    /// Parse every non-identity header as a date.
    ///
    /// Date columns must be strictly ascending left to right, so the last
    /// entry is always the most recent observation.
    pub fn date_columns(&self, schema: &SourceSchema) -> Result<Vec<DateColumn>, PipelineError> {
        let mut columns: Vec<DateColumn> = Vec::new();
        for (index, header) in self.headers.iter().enumerate() {
            if schema.is_identity_column(header) {
                continue;
            }
            let date = parse_date_header(header).ok_or_else(|| {
                PipelineError::MalformedDateColumn {
                    header: header.clone(),
                    reason: "header is not a date".to_string(),
                }
            })?;
            if let Some(previous) = columns.last() {
                if date <= previous.date {
                    return Err(PipelineError::MalformedDateColumn {
                        header: header.clone(),
                        reason: format!("does not follow {}", previous.header),
                    });
                }
            }
            columns.push(DateColumn {
                index,
                date,
                header: header.clone(),
            });
        }
        Ok(columns)
    }

    /// Rows whose canonical key equals `key`
    pub fn rows_for<'a>(
        &'a self,
        index: &'a IdentityIndex,
        key: &'a EntityKey,
    ) -> impl Iterator<Item = WideRow<'a>> + 'a {
        self.rows()
            .filter(move |row| row.entity_key(index).as_ref() == Some(key))
    }

    /// Display labels of every keyed row, in table order, without repeats
    pub fn entity_labels(&self, schema: &SourceSchema) -> Result<Vec<String>, PipelineError> {
        let index = self.identity_index(schema)?;
        let mut seen = HashSet::new();
        Ok(self
            .rows()
            .filter_map(|row| row.entity_key(&index))
            .filter(|key| seen.insert(key.clone()))
            .map(|key| key.label())
            .collect())
    }
}

impl<'a> WideRow<'a> {
    pub fn cell(&self, index: usize) -> &'a str {
        self.cells.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn entity_key(&self, index: &IdentityIndex) -> Option<EntityKey> {
        EntityKey::from_cells(self.cell(index.county), self.cell(index.state))
    }

    /// Latitude and longitude, or `None` when either is absent or unparseable
    pub fn coordinates(&self, index: &IdentityIndex) -> Option<(f64, f64)> {
        let latitude = self.cell(index.latitude?).trim().parse::<f64>().ok()?;
        let longitude = self.cell(index.longitude?).trim().parse::<f64>().ok()?;
        (latitude.is_finite() && longitude.is_finite()).then_some((latitude, longitude))
    }

    /// Cumulative count in a date column
    pub fn count(&self, column: &DateColumn) -> Result<i64, PipelineError> {
        let raw = self.cell(column.index);
        parse_count(raw).ok_or_else(|| PipelineError::MalformedCount {
            column: self
                .headers
                .get(column.index)
                .cloned()
                .unwrap_or_else(|| column.header.clone()),
            value: raw.to_string(),
        })
    }
}

/// `later - earlier`, rejecting a change too large to hold as a count
pub fn count_change(later: i64, earlier: i64, column: &str) -> Result<i64, PipelineError> {
    later
        .checked_sub(earlier)
        .ok_or_else(|| PipelineError::MalformedCount {
            column: column.to_string(),
            value: format!("{later} after {earlier}"),
        })
}

/// Parse a date column header such as "1/22/20"
pub fn parse_date_header(header: &str) -> Option<NaiveDate> {
    let header = header.trim();
    DATE_HEADER_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(header, format).ok())
}

/// Parse a count cell; blanks are zero and integral floats are accepted
fn parse_count(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(0);
    }
    if let Ok(value) = raw.parse::<i64>() {
        return Some(value);
    }
    let value = raw.parse::<f64>().ok()?;
    (value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64)
        .then_some(value as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const CSV: &str = "\
UID,Admin2,Province_State,Lat,Long_,1/1/20,1/2/20,1/3/20
1,Autauga,Alabama,32.5,-86.6,10,8,15
2,Baldwin,Alabama,30.7,-87.7,1,2,3
3,,Alabama,0,0,0,0,0
";

    fn table() -> WideTimeSeriesTable {
        WideTimeSeriesTable::from_reader(CSV.as_bytes()).unwrap()
    }

    #[test]
    fn test_from_reader_keeps_all_rows() {
        let table = table();
        assert_eq!(table.len(), 3);
        assert_eq!(table.column_index("Admin2"), Some(1));
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let result = WideTimeSeriesTable::new(
            vec!["Admin2".to_string(), "Province_State".to_string()],
            vec![vec!["Autauga".to_string()]],
        );
        assert!(matches!(result, Err(PipelineError::MalformedTable(_))));
    }

    #[test]
    fn test_date_columns_skip_identity_columns() {
        let columns = table().date_columns(&SourceSchema::default()).unwrap();
        let dates: Vec<_> = columns.iter().map(|c| c.header.as_str()).collect();
        assert_eq!(dates, vec!["1/1/20", "1/2/20", "1/3/20"]);
        assert_eq!(columns[0].date, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
    }

    #[test]
    fn test_unknown_column_is_malformed_date() {
        let csv = "Admin2,Province_State,Notes,1/1/20\nA,B,x,1\n";
        let table = WideTimeSeriesTable::from_reader(csv.as_bytes()).unwrap();
        let error = table.date_columns(&SourceSchema::default()).unwrap_err();
        assert!(
            matches!(error, PipelineError::MalformedDateColumn { ref header, .. } if header == "Notes")
        );
    }

    #[test]
    fn test_out_of_order_dates_are_malformed() {
        let csv = "Admin2,Province_State,1/2/20,1/1/20\nA,B,1,2\n";
        let table = WideTimeSeriesTable::from_reader(csv.as_bytes()).unwrap();
        assert!(matches!(
            table.date_columns(&SourceSchema::default()),
            Err(PipelineError::MalformedDateColumn { .. })
        ));
    }

    #[rstest]
    #[case("1/22/20", 2020, 1, 22)]
    #[case("12/31/2021", 2021, 12, 31)]
    #[case("2022-03-04", 2022, 3, 4)]
    fn test_parse_date_header(#[case] header: &str, #[case] y: i32, #[case] m: u32, #[case] d: u32) {
        assert_eq!(
            parse_date_header(header),
            NaiveDate::from_ymd_opt(y, m, d)
        );
    }

    #[rstest]
    #[case("12", Some(12))]
    #[case(" 7.0 ", Some(7))]
    #[case("", Some(0))]
    #[case("-3", Some(-3))]
    #[case("2.5", None)]
    #[case("n/a", None)]
    fn test_parse_count(#[case] raw: &str, #[case] expected: Option<i64>) {
        assert_eq!(parse_count(raw), expected);
    }

    #[test]
    fn test_rows_without_county_have_no_key() {
        let table = table();
        let index = table.identity_index(&SourceSchema::default()).unwrap();
        let keys: Vec<_> = table.rows().map(|r| r.entity_key(&index)).collect();
        assert!(keys[0].is_some());
        assert!(keys[2].is_none());
    }

    #[test]
    fn test_entity_labels_in_table_order() {
        let labels = table().entity_labels(&SourceSchema::default()).unwrap();
        assert_eq!(labels, vec!["Autauga, Alabama", "Baldwin, Alabama"]);
    }

    #[test]
    fn test_missing_identity_column() {
        let csv = "County,State,1/1/20\nA,B,1\n";
        let table = WideTimeSeriesTable::from_reader(csv.as_bytes()).unwrap();
        assert!(matches!(
            table.identity_index(&SourceSchema::default()),
            Err(PipelineError::MalformedTable(_))
        ));
    }

    #[test]
    fn test_count_change_rejects_overflow() {
        assert_eq!(count_change(15, 10, "1/3/20"), Ok(5));
        assert_eq!(
            count_change(i64::MAX, -1, "1/3/20"),
            Err(PipelineError::MalformedCount {
                column: "1/3/20".to_string(),
                value: format!("{} after -1", i64::MAX),
            })
        );
    }
}
