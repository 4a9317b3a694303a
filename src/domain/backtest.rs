//! Backtest configuration and the end-to-end pipeline.
//!
//! Pipeline: fetch both series, align, derive the schedule, simulate, then
//! compute metrics. Each stage runs once over the data.

use chrono::{Local, NaiveDate};

use crate::domain::alignment::align;
use crate::domain::config_validation::validate_backtest_config;
use crate::domain::error::RebalancerError;
use crate::domain::execution::{RebalancePolicy, BASIS_POINTS_PER_UNIT};
use crate::domain::metrics::{compute_metrics, daily_returns, BacktestMetrics};
use crate::domain::portfolio::PortfolioState;
use crate::domain::price::PriceSeries;
use crate::domain::schedule::{RebalanceFrequency, RebalanceSchedule};
use crate::domain::simulation::simulate;
use crate::ports::data_port::PriceDataPort;

pub const DEFAULT_START_DATE: &str = "2015-01-01";
pub const DEFAULT_STABLE_SYMBOL: &str = "SPY";
pub const DEFAULT_VOLATILE_SYMBOL: &str = "BTC-USD";

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    /// `None` runs through today.
    pub end_date: Option<NaiveDate>,
    pub stable_symbol: String,
    pub volatile_symbol: String,
    pub initial_capital: f64,
    pub stable_weight: f64,
    pub volatile_weight: f64,
    pub rebalance_frequency: RebalanceFrequency,
    pub fee_bps: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            start_date: NaiveDate::from_ymd_opt(2015, 1, 1).unwrap_or_default(),
            end_date: None,
            stable_symbol: DEFAULT_STABLE_SYMBOL.to_string(),
            volatile_symbol: DEFAULT_VOLATILE_SYMBOL.to_string(),
            initial_capital: 10_000.0,
            stable_weight: 0.75,
            volatile_weight: 0.25,
            rebalance_frequency: RebalanceFrequency::Monthly,
            fee_bps: 10.0,
        }
    }
}

impl BacktestConfig {
    pub fn fee_rate(&self) -> f64 {
        self.fee_bps / BASIS_POINTS_PER_UNIT
    }

    pub fn policy(&self) -> RebalancePolicy {
        RebalancePolicy {
            initial_capital: self.initial_capital,
            stable_weight: self.stable_weight,
            volatile_weight: self.volatile_weight,
            fee_rate: self.fee_rate(),
        }
    }

    pub fn resolved_end_date(&self) -> NaiveDate {
        self.end_date.unwrap_or_else(|| Local::now().date_naive())
    }
}

/// Everything a run produces. The states are owned here; the simulator keeps
/// nothing once it returns.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub states: Vec<PortfolioState>,
    pub metrics: BacktestMetrics,
    pub total_fees: f64,
}

/// Runs the backtest over prices already fetched for both symbols.
pub fn run_backtest_on_series(
    stable: &PriceSeries,
    volatile: &PriceSeries,
    config: &BacktestConfig,
) -> Result<BacktestResult, RebalancerError> {
    validate_backtest_config(config)?;
    run_validated(stable, volatile, config)
}

/// Align, schedule, simulate and measure. `config` is already validated.
fn run_validated(
    stable: &PriceSeries,
    volatile: &PriceSeries,
    config: &BacktestConfig,
) -> Result<BacktestResult, RebalancerError> {
    let table = align(stable, volatile)?;
    let schedule = RebalanceSchedule::derive(&table, config.rebalance_frequency);
    tracing::info!(
        "Aligned {} trading days ({} to {}), {} scheduled {} rebalances",
        table.len(),
        table.first_date(),
        table.last_date(),
        schedule.len(),
        config.rebalance_frequency,
    );
    tracing::trace!(
        "rebalance dates: {:?}",
        schedule.dates().collect::<Vec<_>>()
    );

    let simulation = simulate(&table, &config.policy(), &schedule)?;
    let equity_curve = simulation.equity_curve();
    let returns = daily_returns(&equity_curve);
    let metrics = compute_metrics(
        &equity_curve,
        &returns,
        config.initial_capital,
        simulation.rebalance_count,
    )?;

    Ok(BacktestResult {
        states: simulation.states,
        metrics,
        total_fees: simulation.total_fees,
    })
}

/// Fetches both series from `data_port` and runs the backtest.
pub fn run_backtest(
    data_port: &dyn PriceDataPort,
    config: &BacktestConfig,
) -> Result<BacktestResult, RebalancerError> {
    validate_backtest_config(config)?;

    let end_date = config.resolved_end_date();
    let mut series = Vec::with_capacity(2);
    for symbol in [&config.stable_symbol, &config.volatile_symbol] {
        tracing::info!("Fetching {} from {} to {}", symbol, config.start_date, end_date);
        let observations = data_port.fetch_prices(symbol, config.start_date, end_date)?;
        tracing::debug!("{}: {} observations", symbol, observations.len());
        series.push(PriceSeries::new(symbol.as_str(), observations));
    }

    run_validated(&series[0], &series[1], config)
}
