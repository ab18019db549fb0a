//! # dca-backtest
//!
//! Dollar-cost averaging strategy simulator. Replays a price history under
//! several buying rules and compares what each would have returned.
//!
//! ## Strategies
//!
//! | Strategy          | Buys each period                                   |
//! |-------------------|----------------------------------------------------|
//! | Fixed DCA         | the same amount                                    |
//! | Value Averaging   | whatever tops the portfolio up to a growing target |
//! | Increasing Amount | a geometrically growing amount                     |
//! | Signal-Based RSI  | a fixed amount while the 14-period RSI is low      |
//! | Double Down       | twice the amount after a large drop                |
//! | Lump Sum Hybrid   | a lump sum up front, then a fixed amount           |
//!
//! ## Example
//!
//! ```
//! use dca_backtest::{PriceSeries, compare_dca_strategies};
//! use rust_decimal_macros::dec;
//!
//! let series = PriceSeries::from_prices(&[dec!(100), dec!(90), dec!(110)])?;
//! let table = compare_dca_strategies(&series, dec!(50), dec!(0.02))?;
//! println!("{table}");
//! # Ok::<(), dca_backtest::BacktestError>(())
//! ```
//!
//! Results carry `total_invested`, `total_shares`, `final_price`,
//! `final_value`, `profit_loss`, `roi_percent` and `sharpe_ratio`, all as
//! rounded `Decimal`s.

pub mod compare;
pub mod config;
pub mod error;
pub mod indicator;
pub mod metrics;
pub mod model;
pub mod strategy;

pub use compare::{ComparisonRow, ComparisonTable, compare_dca_strategies, compare_strategies};
pub use config::{ComparisonConfig, RunOptions};
pub use error::{BacktestError, Result};
pub use model::{PricePoint, PriceSeries, SimulationState, StrategyResult};
pub use strategy::StrategyKind;
