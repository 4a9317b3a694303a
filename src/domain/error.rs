//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for rebalancer.
#[derive(Debug, thiserror::Error)]
pub enum RebalancerError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no price data for {symbol}")]
    NoData { symbol: String },

    #[error("invalid price for {symbol} on {date}: {price}")]
    InvalidPrice {
        symbol: String,
        date: NaiveDate,
        price: f64,
    },

    #[error("duplicate date {date} in price series for {symbol}")]
    DuplicateDate { symbol: String, date: NaiveDate },

    #[error("insufficient overlapping price history: have {rows} common dates, need {minimum}")]
    InsufficientOverlap { rows: usize, minimum: usize },

    #[error("price source error for {symbol}: {reason}")]
    PriceSource { symbol: String, reason: String },

    #[error(
        "transaction costs exceeded portfolio value on {date} (base {base:.2}, cost {cost:.2})"
    )]
    NegativeInvestableValue { date: NaiveDate, base: f64, cost: f64 },

    #[error("portfolio value series is empty after cleaning")]
    EmptySeries,

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RebalancerError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        RebalancerError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&RebalancerError> for std::process::ExitCode {
    fn from(err: &RebalancerError) -> Self {
        let code: u8 = match err {
            RebalancerError::Io(_) | RebalancerError::Csv(_) => 1,
            RebalancerError::ConfigParse { .. }
            | RebalancerError::ConfigMissing { .. }
            | RebalancerError::ConfigInvalid { .. } => 2,
            RebalancerError::NoData { .. }
            | RebalancerError::InvalidPrice { .. }
            | RebalancerError::DuplicateDate { .. }
            | RebalancerError::InsufficientOverlap { .. }
            | RebalancerError::PriceSource { .. } => 5,
            RebalancerError::NegativeInvestableValue { .. } => 6,
            RebalancerError::EmptySeries => 7,
        };
        std::process::ExitCode::from(code)
    }
}
