//! Daily price observations for a single symbol.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceObservation {
    pub date: NaiveDate,
    /// NaN marks a missing price, dropped during alignment. Any other value
    /// must be finite and positive.
    pub price: f64,
}

impl PriceObservation {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        PriceObservation { date, price }
    }

    /// A missing observation, as reported by providers for holidays or gaps.
    pub fn missing(date: NaiveDate) -> Self {
        PriceObservation {
            date,
            price: f64::NAN,
        }
    }

    pub fn is_present(&self) -> bool {
        !self.price.is_nan()
    }
}

/// The raw series returned by a price source for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub symbol: String,
    pub observations: Vec<PriceObservation>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, observations: Vec<PriceObservation>) -> Self {
        PriceSeries {
            symbol: symbol.into(),
            observations,
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}
