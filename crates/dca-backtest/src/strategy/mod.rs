//! Investment Strategies
//!
//! Every strategy walks the price series once, buying whatever its
//! per-period rule decides, then hands the final state to the metrics step.

mod simulators;

pub use simulators::{
    double_down, fixed, increasing, lump_sum_hybrid, signal_based, value_averaging,
};

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{ComparisonConfig, RunOptions};
use crate::error::{BacktestError, Result};
use crate::metrics;
use crate::model::{PricePoint, PriceSeries, SimulationState, StrategyResult};

/// The available DCA strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Fixed,
    ValueAveraging,
    IncreasingAmount,
    #[serde(rename = "signal_rsi")]
    SignalBasedRsi,
    DoubleDown,
    LumpSumHybrid,
}

impl StrategyKind {
    pub const ALL: [Self; 6] = [
        Self::Fixed,
        Self::ValueAveraging,
        Self::IncreasingAmount,
        Self::SignalBasedRsi,
        Self::DoubleDown,
        Self::LumpSumHybrid,
    ];

    /// Strategies compared by default (everything except increasing amount)
    pub const fn default_comparison() -> &'static [Self] {
        &[
            Self::Fixed,
            Self::ValueAveraging,
            Self::SignalBasedRsi,
            Self::DoubleDown,
            Self::LumpSumHybrid,
        ]
    }

    /// Display name used in reports and comparison tables
    pub const fn label(self) -> &'static str {
        match self {
            Self::Fixed => "Fixed DCA",
            Self::ValueAveraging => "Value Averaging",
            Self::IncreasingAmount => "Increasing Amount",
            Self::SignalBasedRsi => "Signal-Based RSI",
            Self::DoubleDown => "Double Down",
            Self::LumpSumHybrid => "Lump Sum Hybrid",
        }
    }

    /// Stable key for configuration
    pub const fn key(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::ValueAveraging => "value_averaging",
            Self::IncreasingAmount => "increasing_amount",
            Self::SignalBasedRsi => "signal_rsi",
            Self::DoubleDown => "double_down",
            Self::LumpSumHybrid => "lump_sum_hybrid",
        }
    }

    /// Run this strategy with comparison parameters.
    ///
    /// `Ok(None)` means the strategy never traded.
    pub fn run(
        self,
        series: &PriceSeries,
        config: &ComparisonConfig,
        options: &RunOptions,
    ) -> Result<Option<StrategyResult>> {
        let amount = config.amount;
        match self {
            Self::Fixed => fixed(series, amount, options).map(Some),
            Self::ValueAveraging => value_averaging(series, amount, options).map(Some),
            Self::IncreasingAmount => {
                increasing(series, amount, config.growth_rate, options).map(Some)
            }
            Self::SignalBasedRsi => signal_based(series, amount, config.rsi_threshold, options),
            Self::DoubleDown => double_down(series, amount, config.drop_threshold, options).map(Some),
            Self::LumpSumHybrid => {
                lump_sum_hybrid(series, config.lump_sum()?, amount, options).map(Some)
            }
        }
    }

    /// Simulate this strategy with comparison parameters, stopping before
    /// the metrics step
    pub fn replay(self, series: &PriceSeries, config: &ComparisonConfig) -> Result<SimulationState> {
        let amount = config.amount;
        match self {
            Self::Fixed => simulators::fixed_state(series, amount),
            Self::ValueAveraging => simulators::value_averaging_state(series, amount),
            Self::IncreasingAmount => simulators::increasing_state(series, amount, config.growth_rate),
            Self::SignalBasedRsi => {
                simulators::signal_based_state(series, amount, config.rsi_threshold)
            }
            Self::DoubleDown => simulators::double_down_state(series, amount, config.drop_threshold),
            Self::LumpSumHybrid => {
                simulators::lump_sum_hybrid_state(series, config.lump_sum()?, amount)
            }
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StrategyKind {
    type Err = BacktestError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.key().eq_ignore_ascii_case(wanted) || k.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| BacktestError::InvalidParameter(format!("unknown strategy '{wanted}'")))
    }
}

/// Walk the series once, buying what `decide` returns for each period.
///
/// `decide` sees the period index, the period and the state before that
/// period's purchase. One portfolio value is recorded per period.
pub fn simulate<F>(
    series: &PriceSeries,
    mut state: SimulationState,
    mut decide: F,
) -> Result<SimulationState>
where
    F: FnMut(usize, &PricePoint, &SimulationState) -> Result<Decimal>,
{
    state.period_values.reserve(series.len());

    for (i, point) in series.points().iter().enumerate() {
        let invest = decide(i, point, &state)?;
        if invest > Decimal::ZERO {
            state.buy(invest, point.price)?;
        }
        state.close_period(point.price)?;
    }

    Ok(state)
}

/// Turn a finished simulation into a result priced at the last period
fn finish(
    kind: StrategyKind,
    series: &PriceSeries,
    state: &SimulationState,
    options: &RunOptions,
) -> Result<StrategyResult> {
    if state.total_invested.is_zero() {
        return Err(BacktestError::NoCapitalInvested {
            strategy: kind.label().to_string(),
        });
    }
    metrics::build_result(kind.label(), state, series.last_price(), options)
}

fn ensure_non_negative(name: &str, value: Decimal) -> Result<()> {
    if value < Decimal::ZERO {
        return Err(BacktestError::negative(name, value));
    }
    Ok(())
}
