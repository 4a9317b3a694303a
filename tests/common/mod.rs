#![allow(dead_code)]

use chrono::NaiveDate;
use rebalancer::domain::backtest::BacktestConfig;
use rebalancer::domain::error::RebalancerError;
pub use rebalancer::domain::price::{PriceObservation, PriceSeries};
use rebalancer::ports::data_port::PriceDataPort;
use std::cell::RefCell;
use std::collections::HashMap;

/// In-memory price source. Records every symbol it was asked for.
pub struct MockPriceDataPort {
    pub data: HashMap<String, Vec<PriceObservation>>,
    pub errors: HashMap<String, String>,
    pub requests: RefCell<Vec<String>>,
}

impl MockPriceDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn with_prices(mut self, symbol: &str, observations: Vec<PriceObservation>) -> Self {
        self.data.insert(symbol.to_string(), observations);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    fn check_error(&self, symbol: &str) -> Result<(), RebalancerError> {
        match self.errors.get(symbol) {
            Some(reason) => Err(RebalancerError::PriceSource {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl PriceDataPort for MockPriceDataPort {
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceObservation>, RebalancerError> {
        self.requests.borrow_mut().push(symbol.to_string());
        self.check_error(symbol)?;
        Ok(self
            .data
            .get(symbol)
            .map(|obs| {
                obs.iter()
                    .filter(|o| o.date >= start_date && o.date <= end_date)
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, RebalancerError> {
        self.check_error(symbol)?;
        match self.data.get(symbol) {
            Some(obs) if !obs.is_empty() => {
                let min = obs.iter().map(|o| o.date).min().unwrap();
                let max = obs.iter().map(|o| o.date).max().unwrap();
                Ok(Some((min, max, obs.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn obs(s: &str, price: f64) -> PriceObservation {
    PriceObservation::new(parse_date(s), price)
}

pub fn series(symbol: &str, points: &[(&str, f64)]) -> PriceSeries {
    PriceSeries::new(symbol, points.iter().map(|&(d, p)| obs(d, p)).collect())
}

/// Consecutive calendar days starting at `start`, one observation per price.
pub fn daily_series(symbol: &str, start: NaiveDate, prices: &[f64]) -> PriceSeries {
    PriceSeries::new(
        symbol,
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| PriceObservation::new(start + chrono::Duration::days(i as i64), p))
            .collect(),
    )
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig {
        start_date: date(2024, 1, 1),
        end_date: Some(date(2024, 12, 31)),
        fee_bps: 0.0,
        ..BacktestConfig::default()
    }
}
