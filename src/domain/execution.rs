//! Rebalance execution and transaction cost model.
//!
//! A rebalance sizes both legs at target weights, charges a proportional fee
//! on the traded notional, then resizes both legs against the fee-adjusted
//! base so the post-trade weights match the targets exactly.

use crate::domain::alignment::AlignedRow;
use crate::domain::error::RebalancerError;
use crate::domain::portfolio::Holdings;

/// Absolute tolerance for the weights summing to one (numpy `isclose` defaults).
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-8 + 1e-5;

pub const BASIS_POINTS_PER_UNIT: f64 = 10_000.0;

/// Capital, target weights and fee rate for a simulation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RebalancePolicy {
    pub initial_capital: f64,
    pub stable_weight: f64,
    pub volatile_weight: f64,
    /// Fraction of traded notional charged as cost (10 bps = 0.001).
    pub fee_rate: f64,
}

impl Default for RebalancePolicy {
    fn default() -> Self {
        RebalancePolicy {
            initial_capital: 10_000.0,
            stable_weight: 0.75,
            volatile_weight: 0.25,
            fee_rate: 10.0 / BASIS_POINTS_PER_UNIT,
        }
    }
}

impl RebalancePolicy {
    pub fn validate(&self) -> Result<(), RebalancerError> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(RebalancerError::invalid(
                "backtest",
                "initial_capital",
                "initial_capital must be positive",
            ));
        }
        for (key, weight) in [
            ("stable_weight", self.stable_weight),
            ("volatile_weight", self.volatile_weight),
        ] {
            if !(0.0..=1.0).contains(&weight) {
                return Err(RebalancerError::invalid(
                    "backtest",
                    key,
                    format!("{key} must be between 0 and 1"),
                ));
            }
        }
        if ((self.stable_weight + self.volatile_weight) - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(RebalancerError::invalid(
                "backtest",
                "volatile_weight",
                format!(
                    "stable_weight + volatile_weight must equal 1.0 (got {})",
                    self.stable_weight + self.volatile_weight
                ),
            ));
        }
        if !self.fee_rate.is_finite() || self.fee_rate < 0.0 {
            return Err(RebalancerError::invalid(
                "backtest",
                "fee_bps",
                "fee must be non-negative",
            ));
        }
        Ok(())
    }

    /// Units of each leg that put `base` at the target weights.
    pub fn target_holdings(&self, base: f64, row: &AlignedRow) -> Holdings {
        Holdings {
            stable_units: base * self.stable_weight / row.stable_price,
            volatile_units: base * self.volatile_weight / row.volatile_price,
        }
    }
}

/// Sum over both legs of |unit delta| * price.
pub fn traded_notional(current: &Holdings, desired: &Holdings, row: &AlignedRow) -> f64 {
    (desired.stable_units - current.stable_units).abs() * row.stable_price
        + (desired.volatile_units - current.volatile_units).abs() * row.volatile_price
}

pub fn calculate_transaction_cost(notional: f64, fee_rate: f64) -> f64 {
    notional * fee_rate
}

/// Outcome of a single rebalance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RebalanceFill {
    pub holdings: Holdings,
    pub traded_notional: f64,
    pub transaction_cost: f64,
}

/// Resets `current` to target weights against `base`, net of costs.
pub fn rebalance(
    current: &Holdings,
    base: f64,
    row: &AlignedRow,
    policy: &RebalancePolicy,
) -> Result<RebalanceFill, RebalancerError> {
    let desired = policy.target_holdings(base, row);
    let notional = traded_notional(current, &desired, row);
    let cost = calculate_transaction_cost(notional, policy.fee_rate);

    let net_base = base - cost;
    if net_base < 0.0 {
        return Err(RebalancerError::NegativeInvestableValue {
            date: row.date,
            base,
            cost,
        });
    }

    Ok(RebalanceFill {
        holdings: policy.target_holdings(net_base, row),
        traded_notional: notional,
        transaction_cost: cost,
    })
}
