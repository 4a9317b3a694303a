//! Calendar alignment of the stable and volatile price series.
//!
//! Only dates present in both series survive. No interpolation is done for
//! gaps: a holiday on one calendar removes that date from the table.

use crate::domain::error::RebalancerError;
use crate::domain::price::PriceSeries;
use chrono::NaiveDate;
use std::collections::BTreeMap;

pub const MIN_ALIGNED_ROWS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedRow {
    pub date: NaiveDate,
    pub stable_price: f64,
    pub volatile_price: f64,
}

/// Date-intersected joint price table. Rows are strictly increasing by date
/// and there are always at least [`MIN_ALIGNED_ROWS`] of them.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedTable {
    rows: Vec<AlignedRow>,
}

impl AlignedTable {
    /// Builds a table from pre-joined rows, enforcing valid prices, ordering
    /// and length.
    pub fn from_rows(mut rows: Vec<AlignedRow>) -> Result<Self, RebalancerError> {
        for row in &rows {
            check_price("stable", row.date, row.stable_price)?;
            check_price("volatile", row.date, row.volatile_price)?;
        }
        rows.sort_by_key(|r| r.date);
        if let Some(pair) = rows.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(RebalancerError::DuplicateDate {
                symbol: "aligned table".to_string(),
                date: pair[0].date,
            });
        }
        if rows.len() < MIN_ALIGNED_ROWS {
            return Err(RebalancerError::InsufficientOverlap {
                rows: rows.len(),
                minimum: MIN_ALIGNED_ROWS,
            });
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[AlignedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.rows.iter().map(|r| r.date)
    }

    pub fn first_date(&self) -> NaiveDate {
        self.rows[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.rows[self.rows.len() - 1].date
    }
}

fn check_price(symbol: &str, date: NaiveDate, price: f64) -> Result<(), RebalancerError> {
    if price.is_finite() && price > 0.0 {
        Ok(())
    } else {
        Err(RebalancerError::InvalidPrice {
            symbol: symbol.to_string(),
            date,
            price,
        })
    }
}

/// Drops missing (NaN) prices, rejects infinite or non-positive prices and
/// duplicate dates, and returns the series keyed by date.
fn clean_series(series: &PriceSeries) -> Result<BTreeMap<NaiveDate, f64>, RebalancerError> {
    let mut cleaned = BTreeMap::new();

    for obs in series.observations.iter().filter(|o| o.is_present()) {
        check_price(&series.symbol, obs.date, obs.price)?;
        if cleaned.insert(obs.date, obs.price).is_some() {
            return Err(RebalancerError::DuplicateDate {
                symbol: series.symbol.clone(),
                date: obs.date,
            });
        }
    }

    if cleaned.is_empty() {
        return Err(RebalancerError::NoData {
            symbol: series.symbol.clone(),
        });
    }

    let dropped = series.len() - cleaned.len();
    if dropped > 0 {
        tracing::warn!("{}: dropped {} missing observations", series.symbol, dropped);
    }

    Ok(cleaned)
}

/// Inner-joins the two series on date.
pub fn align(stable: &PriceSeries, volatile: &PriceSeries) -> Result<AlignedTable, RebalancerError> {
    let stable_prices = clean_series(stable)?;
    let volatile_prices = clean_series(volatile)?;

    let rows: Vec<AlignedRow> = stable_prices
        .iter()
        .filter_map(|(&date, &stable_price)| {
            volatile_prices.get(&date).map(|&volatile_price| AlignedRow {
                date,
                stable_price,
                volatile_price,
            })
        })
        .collect();

    tracing::debug!(
        "aligned {} rows ({} {} dates, {} {} dates)",
        rows.len(),
        stable.symbol,
        stable_prices.len(),
        volatile.symbol,
        volatile_prices.len(),
    );

    AlignedTable::from_rows(rows)
}
