//! Configuration validation.
//!
//! Runs before any price is fetched or any simulation work starts.

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::RebalancerError;

pub fn validate_backtest_config(config: &BacktestConfig) -> Result<(), RebalancerError> {
    validate_symbols(config)?;
    validate_dates(config)?;
    validate_fee(config)?;
    config.policy().validate()?;
    Ok(())
}

fn validate_symbols(config: &BacktestConfig) -> Result<(), RebalancerError> {
    for (key, symbol) in [
        ("stable_symbol", &config.stable_symbol),
        ("volatile_symbol", &config.volatile_symbol),
    ] {
        if symbol.trim().is_empty() {
            return Err(RebalancerError::ConfigMissing {
                section: "backtest".to_string(),
                key: key.to_string(),
            });
        }
    }
    if config.stable_symbol.eq_ignore_ascii_case(&config.volatile_symbol) {
        return Err(RebalancerError::invalid(
            "backtest",
            "volatile_symbol",
            "stable and volatile symbols must differ",
        ));
    }
    Ok(())
}

/// An unset end date means today, so a future start is rejected either way.
fn validate_dates(config: &BacktestConfig) -> Result<(), RebalancerError> {
    let end_date = config.resolved_end_date();
    if config.start_date > end_date {
        let reason = match config.end_date {
            Some(_) => "start_date must not be after end_date".to_string(),
            None => format!("start_date is after today ({end_date})"),
        };
        return Err(RebalancerError::invalid("backtest", "start_date", reason));
    }
    Ok(())
}

fn validate_fee(config: &BacktestConfig) -> Result<(), RebalancerError> {
    if !config.fee_bps.is_finite() || config.fee_bps < 0.0 {
        return Err(RebalancerError::invalid(
            "backtest",
            "fee_bps",
            "fee_bps must be non-negative",
        ));
    }
    Ok(())
}
