//! Equity curve CSV writer.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::RebalancerError;
use crate::domain::portfolio::PortfolioState;
use crate::ports::report_port::ReportPort;
use std::io;
use std::path::Path;

pub const EQUITY_CURVE_HEADER: [&str; 11] = [
    "date",
    "price_stable",
    "price_volatile",
    "units_stable",
    "units_volatile",
    "value_stable",
    "value_volatile",
    "portfolio_value",
    "is_rebalance",
    "weight_stable",
    "weight_volatile",
];

/// Writes one row per aligned trading day.
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn write_to<W: io::Write>(
        &self,
        states: &[PortfolioState],
        writer: W,
    ) -> Result<(), RebalancerError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(EQUITY_CURVE_HEADER)?;

        for s in states {
            wtr.write_record(&[
                s.date.format("%Y-%m-%d").to_string(),
                s.stable_price.to_string(),
                s.volatile_price.to_string(),
                s.stable_units.to_string(),
                s.volatile_units.to_string(),
                s.stable_value.to_string(),
                s.volatile_value.to_string(),
                s.portfolio_value.to_string(),
                s.is_rebalance.to_string(),
                s.stable_weight.to_string(),
                s.volatile_weight.to_string(),
            ])?;
        }

        wtr.flush()?;
        Ok(())
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, result: &BacktestResult, output_path: &Path) -> Result<(), RebalancerError> {
        let file = std::fs::File::create(output_path)?;
        self.write_to(&result.states, file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::alignment::AlignedRow;
    use crate::domain::portfolio::Holdings;
    use chrono::NaiveDate;

    fn state(day: u32, rebalance: bool) -> PortfolioState {
        let row = AlignedRow {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            stable_price: 100.0,
            volatile_price: 20_000.0,
        };
        let holdings = Holdings {
            stable_units: 75.0,
            volatile_units: 0.125,
        };
        PortfolioState::snapshot(&row, holdings, 10_000.0, rebalance, 0.0)
    }

    #[test]
    fn writes_header_and_rows() {
        let mut buf = Vec::new();
        CsvReportAdapter
            .write_to(&[state(2, true), state(3, false)], &mut buf)
            .unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], EQUITY_CURVE_HEADER.join(","));
        assert_eq!(
            lines[1],
            "2024-01-02,100,20000,75,0.125,7500,2500,10000,true,0.75,0.25"
        );
        assert!(lines[2].starts_with("2024-01-03,"));
        assert!(lines[2].contains(",false,"));
    }

    #[test]
    fn empty_history_writes_header_only() {
        let mut buf = Vec::new();
        CsvReportAdapter.write_to(&[], &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap().lines().count(), 1);
    }
}
