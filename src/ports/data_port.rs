//! Price data access port trait.

use crate::domain::error::RebalancerError;
use crate::domain::price::PriceObservation;
use chrono::NaiveDate;

/// External source of daily prices, one series per symbol.
///
/// Implementations decide which provider column is the real price
/// (adjusted close, close, ...) and fail if none can be found.
pub trait PriceDataPort {
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceObservation>, RebalancerError>;

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, RebalancerError>;
}
