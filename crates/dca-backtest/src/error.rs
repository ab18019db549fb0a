//! Error Types for DCA Backtesting

use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BacktestError>;

#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("Price series is empty")]
    EmptySeries,

    #[error("Invalid price at row {index}: {price}")]
    InvalidPrice { index: usize, price: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("No capital invested by {strategy}")]
    NoCapitalInvested { strategy: String },

    #[error("Arithmetic overflow: {0}")]
    Overflow(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BacktestError {
    /// Shorthand for a parameter that must not be negative
    pub fn negative(name: &str, value: Decimal) -> Self {
        Self::InvalidParameter(format!("{name} must not be negative (got {value})"))
    }

    pub fn overflow(context: impl Into<String>) -> Self {
        Self::Overflow(context.into())
    }
}
