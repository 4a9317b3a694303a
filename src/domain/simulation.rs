//! Day-by-day rebalancing simulation over an aligned price table.

use crate::domain::alignment::AlignedTable;
use crate::domain::error::RebalancerError;
use crate::domain::execution::{rebalance, RebalancePolicy};
use crate::domain::portfolio::{EquityPoint, Holdings, PortfolioState};
use crate::domain::schedule::RebalanceSchedule;

/// Full history of a simulation run. One state per aligned row, same order.
#[derive(Debug, Clone, PartialEq)]
pub struct Simulation {
    pub states: Vec<PortfolioState>,
    pub rebalance_count: usize,
    pub total_fees: f64,
}

impl Simulation {
    pub fn equity_curve(&self) -> Vec<EquityPoint> {
        self.states.iter().map(PortfolioState::equity_point).collect()
    }
}

/// Walks the table once. The first row always rebalances from
/// `initial_capital`; later rows rebalance from their pre-trade value when
/// their date is scheduled.
pub fn simulate(
    table: &AlignedTable,
    policy: &RebalancePolicy,
    schedule: &RebalanceSchedule,
) -> Result<Simulation, RebalancerError> {
    policy.validate()?;

    let mut holdings = Holdings::default();
    let mut states = Vec::with_capacity(table.len());
    let mut rebalance_count = 0usize;
    let mut total_fees = 0.0_f64;
    let mut total_traded = 0.0_f64;

    for (idx, row) in table.rows().iter().enumerate() {
        let pre_trade_value = holdings.market_value(row);
        let is_first_day = idx == 0;
        let is_rebalance = is_first_day || schedule.contains(row.date);

        let mut transaction_cost = 0.0;
        if is_rebalance {
            let base = if is_first_day {
                policy.initial_capital
            } else {
                pre_trade_value
            };
            let fill = rebalance(&holdings, base, row, policy)?;
            holdings = fill.holdings;
            transaction_cost = fill.transaction_cost;
            total_fees += transaction_cost;
            total_traded += fill.traded_notional;
            rebalance_count += 1;
        }

        states.push(PortfolioState::snapshot(
            row,
            holdings,
            pre_trade_value,
            is_rebalance,
            transaction_cost,
        ));
    }

    tracing::debug!(
        "simulated {} days, {} rebalances, {:.2} traded, {:.2} in fees",
        states.len(),
        rebalance_count,
        total_traded,
        total_fees
    );

    Ok(Simulation {
        states,
        rebalance_count,
        total_fees,
    })
}
