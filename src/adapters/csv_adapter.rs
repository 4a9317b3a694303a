//! CSV file price data adapter.
//!
//! Reads `<base_path>/<SYMBOL>.csv` with a header row, as exported by most
//! market data providers. The price column is the adjusted close when one is
//! present, otherwise the close.

use crate::domain::error::RebalancerError;
use crate::domain::price::PriceObservation;
use crate::ports::data_port::PriceDataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

const ADJUSTED_CLOSE_HEADERS: &[&str] = &["adjclose", "adjustedclose"];
const CLOSE_HEADERS: &[&str] = &["close", "price"];

pub struct CsvPriceAdapter {
    base_path: PathBuf,
}

impl CsvPriceAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn source_error(symbol: &str, reason: impl Into<String>) -> RebalancerError {
        RebalancerError::PriceSource {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }

    /// Reads every row of the symbol's file, unfiltered and unsorted.
    fn read_all(&self, symbol: &str) -> Result<Vec<PriceObservation>, RebalancerError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| {
            Self::source_error(symbol, format!("failed to read {}: {}", path.display(), e))
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| Self::source_error(symbol, format!("CSV header error: {}", e)))?
            .clone();

        let date_col = find_column(&headers, &["date", "timestamp"])
            .ok_or_else(|| Self::source_error(symbol, "missing date column"))?;
        let price_col = find_column(&headers, ADJUSTED_CLOSE_HEADERS)
            .or_else(|| find_column(&headers, CLOSE_HEADERS))
            .ok_or_else(|| {
                Self::source_error(symbol, "no adjusted close or close column in header")
            })?;

        let mut observations = Vec::new();
        for result in rdr.records() {
            let record = result
                .map_err(|e| Self::source_error(symbol, format!("CSV parse error: {}", e)))?;

            let date_str = record
                .get(date_col)
                .ok_or_else(|| Self::source_error(symbol, "missing date value"))?;
            let date = parse_date(date_str).ok_or_else(|| {
                Self::source_error(symbol, format!("invalid date format: {}", date_str))
            })?;

            let price = parse_price(record.get(price_col).unwrap_or("")).ok_or_else(|| {
                Self::source_error(symbol, format!("invalid price value on {}", date))
            })?;

            observations.push(PriceObservation::new(date, price));
        }

        Ok(observations)
    }
}

impl PriceDataPort for CsvPriceAdapter {
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceObservation>, RebalancerError> {
        let mut observations: Vec<PriceObservation> = self
            .read_all(symbol)?
            .into_iter()
            .filter(|o| o.date >= start_date && o.date <= end_date)
            .collect();

        observations.sort_by_key(|o| o.date);
        Ok(observations)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, RebalancerError> {
        let present: Vec<NaiveDate> = self
            .read_all(symbol)?
            .into_iter()
            .filter(|o| o.is_present())
            .map(|o| o.date)
            .collect();

        match (present.iter().min(), present.iter().max()) {
            (Some(&min), Some(&max)) => Ok(Some((min, max, present.len()))),
            _ => Ok(None),
        }
    }
}

/// Header lookup ignoring case, spaces and underscores ("Adj Close" == "adj_close").
fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers.iter().position(|h| {
        let normalized: String = h
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        names.contains(&normalized.as_str())
    })
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time component.
fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let day = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Blank, `null` and `NaN` cells are missing prices (NaN); anything else
/// must parse as a finite number.
fn parse_price(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty()
        || value.eq_ignore_ascii_case("null")
        || value.eq_ignore_ascii_case("nan")
    {
        return Some(f64::NAN);
    }
    value.parse::<f64>().ok().filter(|p| p.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        fs::write(
            path.join("SPY.csv"),
            "Date,Open,High,Low,Close,Adj Close,Volume\n\
             2024-01-03,470.0,472.0,468.0,471.0,465.5,1000\n\
             2024-01-02,468.0,471.0,466.0,470.0,464.5,1000\n\
             2024-01-04,471.0,473.0,469.0,472.0,,1000\n",
        )
        .unwrap();
        fs::write(
            path.join("BTC-USD.csv"),
            "date,close\n\
             2024-01-01 00:00:00,42000.5\n\
             2024-01-02 00:00:00,43000.0\n\
             2024-01-03 00:00:00,NaN\n",
        )
        .unwrap();
        fs::write(path.join("BAD.csv"), "date,open,volume\n2024-01-02,1.0,5\n").unwrap();
        fs::write(path.join("JUNK.csv"), "date,close\n2024-01-02,abc\n").unwrap();
        fs::write(path.join("EMPTY.csv"), "date,close\n").unwrap();
        fs::write(path.join("HUGE.csv"), "date,close\n2024-01-02,1e400\n").unwrap();
        fs::write(path.join("INF.csv"), "date,close\n2024-01-02,100.0\n2024-01-03,inf\n").unwrap();

        (dir, path)
    }

    #[test]
    fn prefers_adjusted_close_and_sorts() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);

        let prices = adapter
            .fetch_prices("SPY", d("2024-01-01"), d("2024-01-31"))
            .unwrap();

        assert_eq!(prices.len(), 3);
        assert_eq!(prices[0].date, d("2024-01-02"));
        assert_eq!(prices[0].price, 464.5);
        assert_eq!(prices[1].price, 465.5);
        assert!(!prices[2].is_present());
    }

    #[test]
    fn falls_back_to_close_and_reads_timestamps() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);

        let prices = adapter
            .fetch_prices("BTC-USD", d("2024-01-01"), d("2024-01-31"))
            .unwrap();

        assert_eq!(prices.len(), 3);
        assert_eq!(prices[0].date, d("2024-01-01"));
        assert_eq!(prices[0].price, 42000.5);
        assert!(prices[2].price.is_nan());
    }

    #[test]
    fn filters_by_date() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);

        let prices = adapter
            .fetch_prices("SPY", d("2024-01-03"), d("2024-01-03"))
            .unwrap();

        assert_eq!(prices.len(), 1);
        assert_eq!(prices[0].date, d("2024-01-03"));
    }

    #[test]
    fn missing_price_column_is_an_error() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);

        let err = adapter
            .fetch_prices("BAD", d("2024-01-01"), d("2024-01-31"))
            .unwrap_err();
        assert!(matches!(err, RebalancerError::PriceSource { symbol, .. } if symbol == "BAD"));
    }

    #[test]
    fn unparsable_price_is_an_error() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);

        let result = adapter.fetch_prices("JUNK", d("2024-01-01"), d("2024-01-31"));
        assert!(result.is_err());
    }

    #[test]
    fn overflowing_and_infinite_prices_are_errors() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);

        for symbol in ["HUGE", "INF"] {
            let err = adapter
                .fetch_prices(symbol, d("2024-01-01"), d("2024-01-31"))
                .unwrap_err();
            assert!(matches!(err, RebalancerError::PriceSource { symbol: s, .. } if s == symbol));
        }
    }

    #[test]
    fn parse_price_keeps_only_finite_numbers() {
        assert_eq!(parse_price(" 101.25 "), Some(101.25));
        assert!(parse_price("NULL").unwrap().is_nan());
        assert_eq!(parse_price("inf"), None);
        assert_eq!(parse_price("-infinity"), None);
        assert_eq!(parse_price("1e400"), None);
    }

    #[test]
    fn missing_file_is_an_error() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);

        let result = adapter.fetch_prices("XYZ", d("2024-01-01"), d("2024-01-31"));
        assert!(result.is_err());
    }

    #[test]
    fn data_range_counts_present_rows() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);

        let range = adapter.get_data_range("SPY").unwrap();
        assert_eq!(range, Some((d("2024-01-02"), d("2024-01-03"), 2)));

        assert_eq!(adapter.get_data_range("EMPTY").unwrap(), None);
    }

    #[test]
    fn header_matching_is_loose() {
        let headers = csv::StringRecord::from(vec!["Date", "adj_close", "CLOSE"]);
        assert_eq!(find_column(&headers, ADJUSTED_CLOSE_HEADERS), Some(1));
        assert_eq!(find_column(&headers, CLOSE_HEADERS), Some(2));
        assert_eq!(find_column(&headers, &["volume"]), None);
    }
}
