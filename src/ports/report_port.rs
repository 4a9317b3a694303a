//! Report generation port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::RebalancerError;
use std::path::Path;

/// Port for writing backtest output.
pub trait ReportPort {
    fn write(&self, result: &BacktestResult, output_path: &Path) -> Result<(), RebalancerError>;
}
