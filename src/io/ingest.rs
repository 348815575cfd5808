//! CSV ingest for price files and FRED rate exports.
//!
//! Two layouts are understood:
//!
//! - price files: a `date` column plus `adj close`, `close` or `value`
//!   (e.g. the ICE index export `Date,Close`)
//! - FRED downloads: `DATE` or `observation_date` plus one column named after
//!   the series (e.g. `USD1MTD156N`), where holidays hold `"."`
//!
//! Rows that cannot be used are skipped and reported, never fatal.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::StringRecord;
use tracing::{debug, warn};

use crate::data::{PriceSource, RateSource};
use crate::domain::{PriceSeries, RawRateRow, TimeSeries};
use crate::error::AppError;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];
const DATE_COLUMNS: [&str; 3] = ["date", "observation_date", "i"];
const PRICE_COLUMNS: [&str; 5] = ["adj close", "adj_close", "adjclose", "close", "value"];

/// A row-level problem encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct PriceIngest {
    pub series: PriceSeries,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Load a price CSV.
pub fn load_price_csv(path: &Path) -> Result<PriceIngest, AppError> {
    let (headers, mut reader) = open_csv(path)?;
    let header_map = build_header_map(&headers);
    let date_idx = find_column(&header_map, &DATE_COLUMNS)
        .ok_or_else(|| AppError::new(2, format!("'{}' has no date column.", path.display())))?;
    let price_idx = find_column(&header_map, &PRICE_COLUMNS).ok_or_else(|| {
        AppError::new(
            2,
            format!("'{}' needs one of: {}.", path.display(), PRICE_COLUMNS.join(", ")),
        )
    })?;

    let mut by_date = BTreeMap::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        rows_read += 1;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let parsed = parse_date(record.get(date_idx).unwrap_or(""))
            .and_then(|d| parse_price(record.get(price_idx).unwrap_or("")).map(|p| (d, p)));
        match parsed {
            Ok((date, price)) => {
                if by_date.insert(date, price).is_some() {
                    row_errors.push(RowError {
                        line,
                        message: format!("duplicate date {date}; keeping the later row"),
                    });
                }
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if !row_errors.is_empty() {
        warn!(path = %path.display(), skipped = row_errors.len(), "skipped price rows");
    }
    debug!(path = %path.display(), rows_read, kept = by_date.len(), "loaded price CSV");

    Ok(PriceIngest {
        series: TimeSeries::from_ordered(by_date.into_iter().collect()),
        row_errors,
        rows_read,
    })
}

/// Load a FRED-style rate CSV. Values are kept as published.
///
/// `series_id` selects the value column; without it the first non-date column is used.
pub fn load_rate_csv(path: &Path, series_id: Option<&str>) -> Result<Vec<RawRateRow>, AppError> {
    let (headers, mut reader) = open_csv(path)?;
    let header_map = build_header_map(&headers);
    let date_idx = find_column(&header_map, &DATE_COLUMNS)
        .ok_or_else(|| AppError::new(2, format!("'{}' has no DATE column.", path.display())))?;

    let value_idx = match series_id.map(normalize_header_name) {
        Some(name) if header_map.contains_key(&name) => header_map[&name],
        _ => (0..headers.len()).find(|&i| i != date_idx).ok_or_else(|| {
            AppError::new(2, format!("'{}' has no rate column.", path.display()))
        })?,
    };

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        let record = result
            .map_err(|e| AppError::new(2, format!("'{}' line {line}: {e}", path.display())))?;
        let date = match parse_date(record.get(date_idx).unwrap_or("")) {
            Ok(d) => d,
            Err(message) => {
                debug!(line, %message, "skipping rate row");
                continue;
            }
        };
        rows.push(RawRateRow::new(date, record.get(value_idx).unwrap_or("")));
    }
    debug!(path = %path.display(), rows = rows.len(), "loaded rate CSV");
    Ok(rows)
}

/// Price source backed by a single CSV file; the ticker is ignored.
pub struct CsvPriceSource {
    path: PathBuf,
}

impl CsvPriceSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PriceSource for CsvPriceSource {
    fn fetch_prices(
        &self,
        _ticker: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<PriceSeries, AppError> {
        Ok(load_price_csv(&self.path)?.series.between(start, end))
    }
}

/// Rate source backed by a FRED CSV download.
pub struct CsvRateSource {
    path: PathBuf,
}

impl CsvRateSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RateSource for CsvRateSource {
    fn fetch_rates(
        &self,
        series_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<RawRateRow>, AppError> {
        let rows = load_rate_csv(&self.path, Some(series_id))?;
        Ok(rows
            .into_iter()
            .filter(|r| start.is_none_or(|s| r.date >= s) && end.is_none_or(|e| r.date <= e))
            .collect())
    }
}

fn open_csv(path: &Path) -> Result<(StringRecord, csv::Reader<File>), AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();

    Ok((headers, reader))
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn find_column(header_map: &HashMap<String, usize>, candidates: &[&str]) -> Option<usize> {
    candidates.iter().find_map(|c| header_map.get(*c).copied())
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    let raw = raw.trim();
    // Some exports carry a time component ("2021-09-01 00:00:00").
    let day = raw.split([' ', 'T']).next().unwrap_or(raw);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(day, fmt).ok())
        .ok_or_else(|| format!("invalid date '{raw}'"))
}

fn parse_price(raw: &str) -> Result<f64, String> {
    let v: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid price '{}'", raw.trim()))?;
    if v.is_finite() && v > 0.0 {
        Ok(v)
    } else {
        Err(format!("price {v} must be > 0"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn price_csv_prefers_adjusted_close_and_skips_bad_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "qqq.csv",
            "\u{feff}Date,Open,Close,Adj Close\n\
             2021-08-30,1,2,100.5\n\
             2021-08-27,1,2,99.0\n\
             2021-08-31,1,2,\n\
             not-a-date,1,2,101\n\
             2021-09-01,1,2,-3\n",
        );
        let ingest = load_price_csv(&path).unwrap();
        assert_eq!(ingest.rows_read, 5);
        assert_eq!(ingest.row_errors.len(), 3);
        let points = ingest.series.into_points();
        assert_eq!(
            points,
            vec![
                (NaiveDate::from_ymd_opt(2021, 8, 27).unwrap(), 99.0),
                (NaiveDate::from_ymd_opt(2021, 8, 30).unwrap(), 100.5),
            ]
        );
    }

    #[test]
    fn ice_export_layout_is_supported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "XIUSA000ML.csv", "Date,Close\n2009-04-16,310.2\n2009-04-17,308.9\n");
        let source = CsvPriceSource::new(path);
        let s = source.fetch_prices("XIUSA000ML", None, None).unwrap();
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn fred_csv_keeps_placeholders() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "USD1MTD156N.csv",
            "DATE,USD1MTD156N\n2021-09-03,0.08000\n2021-09-06,.\n2021-09-07,0.08750\n",
        );
        let rows = load_rate_csv(&path, Some("USD1MTD156N")).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].value, ".");

        let source = CsvRateSource::new(path);
        let later = NaiveDate::from_ymd_opt(2021, 9, 6);
        let rows = source.fetch_rates("USD1MTD156N", later, None).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn missing_columns_are_usage_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "bad.csv", "when,price\n2021-01-04,1\n");
        assert_eq!(load_price_csv(&path).unwrap_err().exit_code(), 2);
        assert_eq!(
            load_price_csv(&dir.path().join("missing.csv")).unwrap_err().exit_code(),
            2
        );
    }
}
