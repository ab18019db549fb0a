//! Dollar-Cost Averaging Simulators
//!
//! One function per strategy. Each differs only in how much it buys in a
//! given period; the loop itself lives in [`super::simulate`]. The
//! `*_state` variants stop before the metrics step.

use rust_decimal::{Decimal, MathematicalOps};

use super::{StrategyKind, ensure_non_negative, finish, simulate};
use crate::config::RunOptions;
use crate::error::{BacktestError, Result};
use crate::indicator::{RSI_PERIOD, rsi};
use crate::model::{PriceSeries, SimulationState, StrategyResult};

/// Invest the same `amount` every period
pub fn fixed(series: &PriceSeries, amount: Decimal, options: &RunOptions) -> Result<StrategyResult> {
    let state = fixed_state(series, amount)?;
    finish(StrategyKind::Fixed, series, &state, options)
}

pub(super) fn fixed_state(series: &PriceSeries, amount: Decimal) -> Result<SimulationState> {
    ensure_non_negative("amount", amount)?;
    simulate(series, SimulationState::new(), |_, _, _| Ok(amount))
}

/// Top the portfolio up to a target that grows by `target_growth` each
/// period. Never sells.
pub fn value_averaging(
    series: &PriceSeries,
    target_growth: Decimal,
    options: &RunOptions,
) -> Result<StrategyResult> {
    let state = value_averaging_state(series, target_growth)?;
    finish(StrategyKind::ValueAveraging, series, &state, options)
}

pub(super) fn value_averaging_state(
    series: &PriceSeries,
    target_growth: Decimal,
) -> Result<SimulationState> {
    ensure_non_negative("target_growth", target_growth)?;

    let mut target = Decimal::ZERO;
    simulate(series, SimulationState::new(), |i, point, state| {
        target = target
            .checked_add(target_growth)
            .ok_or_else(|| BacktestError::overflow(format!("value averaging target at period {i}")))?;
        let current_value = state.value_at(point.price)?;
        // Both sides are non-negative, so the difference cannot overflow
        Ok((target - current_value).max(Decimal::ZERO))
    })
}

/// Invest `initial_amount * (1 + growth_rate)^i` in period `i`
pub fn increasing(
    series: &PriceSeries,
    initial_amount: Decimal,
    growth_rate: Decimal,
    options: &RunOptions,
) -> Result<StrategyResult> {
    let state = increasing_state(series, initial_amount, growth_rate)?;
    finish(StrategyKind::IncreasingAmount, series, &state, options)
}

pub(super) fn increasing_state(
    series: &PriceSeries,
    initial_amount: Decimal,
    growth_rate: Decimal,
) -> Result<SimulationState> {
    ensure_non_negative("initial_amount", initial_amount)?;

    let factor = Decimal::ONE
        .checked_add(growth_rate)
        .ok_or_else(|| BacktestError::overflow(format!("1 + {growth_rate}")))?;
    if factor <= Decimal::ZERO {
        return Err(BacktestError::InvalidParameter(format!(
            "growth_rate must be greater than -1 (got {growth_rate})"
        )));
    }

    simulate(series, SimulationState::new(), |i, _, _| {
        let exp = i64::try_from(i).map_err(|_| BacktestError::overflow(format!("period {i}")))?;
        factor
            .checked_powi(exp)
            .and_then(|growth| initial_amount.checked_mul(growth))
            .ok_or_else(|| BacktestError::overflow(format!("increasing amount at period {i}")))
    })
}

/// Invest `amount` only in periods where the 14-period RSI is below
/// `rsi_threshold`.
///
/// Returns `Ok(None)` when the RSI never crossed below the threshold.
pub fn signal_based(
    series: &PriceSeries,
    amount: Decimal,
    rsi_threshold: Decimal,
    options: &RunOptions,
) -> Result<Option<StrategyResult>> {
    let state = signal_based_state(series, amount, rsi_threshold)?;

    if state.total_invested.is_zero() {
        tracing::info!(strategy = StrategyKind::SignalBasedRsi.label(), "No trades triggered.");
        return Ok(None);
    }
    finish(StrategyKind::SignalBasedRsi, series, &state, options).map(Some)
}

pub(super) fn signal_based_state(
    series: &PriceSeries,
    amount: Decimal,
    rsi_threshold: Decimal,
) -> Result<SimulationState> {
    ensure_non_negative("amount", amount)?;
    ensure_non_negative("rsi_threshold", rsi_threshold)?;

    // Indexed by position, aligned with the series rows
    let prices: Vec<Decimal> = series.prices().collect();
    let signal = rsi(&prices, RSI_PERIOD);

    simulate(series, SimulationState::new(), |i, _, _| {
        let oversold = signal[i].is_some_and(|value| value < rsi_threshold);
        Ok(if oversold { amount } else { Decimal::ZERO })
    })
}

/// Invest `amount`, or twice that when the price fell by at least
/// `drop_threshold` since the previous period
pub fn double_down(
    series: &PriceSeries,
    amount: Decimal,
    drop_threshold: Decimal,
    options: &RunOptions,
) -> Result<StrategyResult> {
    let state = double_down_state(series, amount, drop_threshold)?;
    finish(StrategyKind::DoubleDown, series, &state, options)
}

pub(super) fn double_down_state(
    series: &PriceSeries,
    amount: Decimal,
    drop_threshold: Decimal,
) -> Result<SimulationState> {
    ensure_non_negative("amount", amount)?;
    ensure_non_negative("drop_threshold", drop_threshold)?;

    let doubled = amount
        .checked_mul(Decimal::TWO)
        .ok_or_else(|| BacktestError::overflow(format!("2 * {amount}")))?;

    let mut last_price = series.first_price();
    simulate(series, SimulationState::new(), |_, point, _| {
        // Only a very large rise can overflow the ratio, which is never a drop
        let dropped = (last_price - point.price)
            .checked_div(last_price)
            .is_some_and(|drop| drop >= drop_threshold);
        last_price = point.price;
        Ok(if dropped { doubled } else { amount })
    })
}

/// Put `lump_sum` in at the first price, then add `recurring` every period.
///
/// The first period receives the recurring amount on top of the lump sum.
pub fn lump_sum_hybrid(
    series: &PriceSeries,
    lump_sum: Decimal,
    recurring: Decimal,
    options: &RunOptions,
) -> Result<StrategyResult> {
    let state = lump_sum_hybrid_state(series, lump_sum, recurring)?;
    finish(StrategyKind::LumpSumHybrid, series, &state, options)
}

pub(super) fn lump_sum_hybrid_state(
    series: &PriceSeries,
    lump_sum: Decimal,
    recurring: Decimal,
) -> Result<SimulationState> {
    ensure_non_negative("lump_sum", lump_sum)?;
    ensure_non_negative("recurring", recurring)?;

    let opening_shares = lump_sum
        .checked_div(series.first_price())
        .ok_or_else(|| BacktestError::overflow(format!("lump sum {lump_sum}")))?;
    let seeded = SimulationState::seeded(lump_sum, opening_shares);

    simulate(series, seeded, |_, _, _| Ok(recurring))
}
