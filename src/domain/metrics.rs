//! Performance metrics over the simulated equity curve.

use super::error::RebalancerError;
use super::portfolio::EquityPoint;
use chrono::NaiveDate;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const DAYS_PER_YEAR: f64 = 365.25;
const MIN_YEARS: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestMetrics {
    pub total_return: f64,
    pub final_value: f64,
    pub cagr: f64,
    pub annual_volatility: f64,
    /// Risk-free rate fixed at zero.
    pub sharpe_ratio: f64,
    /// Most negative `value / running_max - 1`; never positive.
    pub max_drawdown: f64,
    pub max_drawdown_start: NaiveDate,
    pub max_drawdown_end: NaiveDate,
    pub num_rebalances: usize,
}

/// Simple returns between consecutive points. The first entry is `None`, as
/// is any entry whose previous value is not positive.
pub fn daily_returns(equity_curve: &[EquityPoint]) -> Vec<Option<f64>> {
    let mut returns = Vec::with_capacity(equity_curve.len());
    if equity_curve.is_empty() {
        return returns;
    }
    returns.push(None);
    returns.extend(equity_curve.windows(2).map(|w| {
        let prev = w[0].equity;
        if prev > 0.0 {
            Some(w[1].equity / prev - 1.0)
        } else {
            None
        }
    }));
    returns
}

pub fn compute_metrics(
    equity_curve: &[EquityPoint],
    daily_returns: &[Option<f64>],
    initial_capital: f64,
    num_rebalances: usize,
) -> Result<BacktestMetrics, RebalancerError> {
    let values: Vec<EquityPoint> = equity_curve
        .iter()
        .filter(|p| p.equity.is_finite())
        .copied()
        .collect();
    let (first, last) = match (values.first(), values.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Err(RebalancerError::EmptySeries),
    };

    let returns: Vec<f64> = daily_returns
        .iter()
        .flatten()
        .copied()
        .filter(|r| r.is_finite())
        .collect();

    let final_value = last.equity;
    let growth = final_value / initial_capital;
    let total_return = growth - 1.0;

    let elapsed_days = (last.date - first.date).num_days() as f64;
    let years = (elapsed_days / DAYS_PER_YEAR).max(MIN_YEARS);
    let cagr = growth.powf(1.0 / years) - 1.0;

    let (annual_volatility, sharpe_ratio) = compute_risk_adjusted(&returns);
    let (max_drawdown, max_drawdown_start, max_drawdown_end) = compute_drawdown(&values);

    Ok(BacktestMetrics {
        total_return,
        final_value,
        cagr,
        annual_volatility,
        sharpe_ratio,
        max_drawdown,
        max_drawdown_start,
        max_drawdown_end,
        num_rebalances,
    })
}

/// Returns (annualized volatility, Sharpe). The Sharpe numerator is the
/// geometric annualization of the mean daily return.
fn compute_risk_adjusted(returns: &[f64]) -> (f64, f64) {
    if returns.len() < 2 {
        return (0.0, 0.0);
    }

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;
    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let annual_volatility = variance.sqrt() * TRADING_DAYS_PER_YEAR.sqrt();

    let annual_return = (1.0 + mean).powf(TRADING_DAYS_PER_YEAR) - 1.0;
    let sharpe = if annual_volatility > 0.0 {
        annual_return / annual_volatility
    } else {
        0.0
    };

    (annual_volatility, sharpe)
}

/// Returns (max drawdown, peak date, trough date). The trough is the first
/// point reaching the minimum drawdown; the peak is the last point at or
/// before it whose value equals the running maximum.
fn compute_drawdown(values: &[EquityPoint]) -> (f64, NaiveDate, NaiveDate) {
    let mut running_max = f64::NEG_INFINITY;
    let mut peak_date = values[0].date;
    let mut max_dd = 0.0_f64;
    let mut dd_start = values[0].date;
    let mut dd_end = values[0].date;

    for point in values {
        if point.equity >= running_max {
            running_max = point.equity;
            peak_date = point.date;
        }
        let dd = if running_max > 0.0 {
            point.equity / running_max - 1.0
        } else {
            0.0
        };
        if dd < max_dd {
            max_dd = dd;
            dd_start = peak_date;
            dd_end = point.date;
        }
    }

    (max_dd, dd_start, dd_end)
}
