//! Portfolio holdings and the per-day state snapshot.

use crate::domain::alignment::AlignedRow;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

/// Units held in each leg. Never negative: no shorting or leverage.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Holdings {
    pub stable_units: f64,
    pub volatile_units: f64,
}

impl Holdings {
    pub fn stable_value(&self, row: &AlignedRow) -> f64 {
        self.stable_units * row.stable_price
    }

    pub fn volatile_value(&self, row: &AlignedRow) -> f64 {
        self.volatile_units * row.volatile_price
    }

    pub fn market_value(&self, row: &AlignedRow) -> f64 {
        self.stable_value(row) + self.volatile_value(row)
    }
}

/// Snapshot of the portfolio at the close of one aligned trading day.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioState {
    pub date: NaiveDate,
    pub stable_price: f64,
    pub volatile_price: f64,
    pub stable_units: f64,
    pub volatile_units: f64,
    pub stable_value: f64,
    pub volatile_value: f64,
    pub portfolio_value: f64,
    pub is_rebalance: bool,
    pub stable_weight: f64,
    pub volatile_weight: f64,
    /// Mark-to-market value of the holdings carried into the day.
    pub pre_trade_value: f64,
    pub transaction_cost: f64,
}

impl PortfolioState {
    pub(crate) fn snapshot(
        row: &AlignedRow,
        holdings: Holdings,
        pre_trade_value: f64,
        is_rebalance: bool,
        transaction_cost: f64,
    ) -> Self {
        let stable_value = holdings.stable_value(row);
        let volatile_value = holdings.volatile_value(row);
        let portfolio_value = stable_value + volatile_value;

        let (stable_weight, volatile_weight) = if portfolio_value > 0.0 {
            (
                stable_value / portfolio_value,
                volatile_value / portfolio_value,
            )
        } else {
            (0.0, 0.0)
        };

        PortfolioState {
            date: row.date,
            stable_price: row.stable_price,
            volatile_price: row.volatile_price,
            stable_units: holdings.stable_units,
            volatile_units: holdings.volatile_units,
            stable_value,
            volatile_value,
            portfolio_value,
            is_rebalance,
            stable_weight,
            volatile_weight,
            pre_trade_value,
            transaction_cost,
        }
    }

    pub fn equity_point(&self) -> EquityPoint {
        EquityPoint {
            date: self.date,
            equity: self.portfolio_value,
        }
    }
}
