//! Performance Metrics
//!
//! Turns the final state of a simulation into a rounded [`StrategyResult`].

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

use crate::config::RunOptions;
use crate::error::{BacktestError, Result};
use crate::model::{SimulationState, StrategyResult};

/// Decimal places for currency amounts and ROI
pub const CURRENCY_DP: u32 = 2;

/// Decimal places for share counts
pub const SHARES_DP: u32 = 6;

/// Decimal places for the Sharpe ratio
pub const SHARPE_DP: u32 = 4;

/// Build the result for a finished simulation.
///
/// `state.total_invested` must be positive; a zero investment is reported
/// as [`BacktestError::NoCapitalInvested`] rather than dividing by zero.
pub fn build_result(
    strategy: &str,
    state: &SimulationState,
    final_price: Decimal,
    options: &RunOptions,
) -> Result<StrategyResult> {
    if state.total_invested.is_zero() {
        return Err(BacktestError::NoCapitalInvested {
            strategy: strategy.to_string(),
        });
    }

    let final_value = state
        .total_shares
        .checked_mul(final_price)
        .ok_or_else(|| BacktestError::overflow(format!("{strategy} final value")))?;
    let profit_loss = final_value
        .checked_sub(state.total_invested)
        .ok_or_else(|| BacktestError::overflow(format!("{strategy} profit / loss")))?;
    let roi = profit_loss
        .checked_div(state.total_invested)
        .and_then(|ratio| ratio.checked_mul(dec!(100)))
        .ok_or_else(|| BacktestError::overflow(format!("{strategy} ROI")))?;

    let sharpe = sharpe_ratio(&state.period_values, options.risk_free_rate);

    let result = StrategyResult {
        total_invested: state.total_invested.round_dp(CURRENCY_DP),
        total_shares: state.total_shares.round_dp(SHARES_DP),
        final_price: final_price.round_dp(CURRENCY_DP),
        final_value: final_value.round_dp(CURRENCY_DP),
        profit_loss: profit_loss.round_dp(CURRENCY_DP),
        roi_percent: roi.round_dp(CURRENCY_DP),
        sharpe_ratio: sharpe.round_dp(SHARPE_DP),
    };

    if options.verbose {
        for line in result.report().lines() {
            tracing::info!(strategy, "{line}");
        }
    }

    Ok(result)
}

/// Period-over-period simple returns.
///
/// Returns `None` when any prior value is zero, since that return is
/// undefined, or when a return does not fit in a `Decimal`.
pub fn period_returns(values: &[Decimal]) -> Option<Vec<Decimal>> {
    values
        .windows(2)
        .map(|w| w[1].checked_sub(w[0])?.checked_div(w[0]))
        .collect()
}

/// Sharpe ratio over the per-period value series.
///
/// The risk-free rate is spread evenly across the return series and the
/// ratio is scaled by the square root of the number of returns. Falls back
/// to zero for fewer than two values, undefined returns, zero variance, or
/// any intermediate value that overflows.
pub fn sharpe_ratio(period_values: &[Decimal], risk_free_rate: Decimal) -> Decimal {
    period_returns(period_values)
        .and_then(|returns| sharpe_from_returns(&returns, risk_free_rate))
        .unwrap_or(Decimal::ZERO)
}

fn sharpe_from_returns(returns: &[Decimal], risk_free_rate: Decimal) -> Option<Decimal> {
    if returns.is_empty() {
        return None;
    }

    let n = Decimal::from(returns.len());
    let per_period_rf = risk_free_rate.checked_div(n)?;
    let excess = returns
        .iter()
        .map(|r| r.checked_sub(per_period_rf))
        .collect::<Option<Vec<Decimal>>>()?;

    let mean = checked_sum(excess.iter().copied())?.checked_div(n)?;
    let squared = excess
        .iter()
        .map(|r| {
            let deviation = r.checked_sub(mean)?;
            deviation.checked_mul(deviation)
        })
        .collect::<Option<Vec<Decimal>>>()?;
    let variance = checked_sum(squared.into_iter())?.checked_div(n)?;

    let std_dev = variance.sqrt()?;
    if std_dev <= Decimal::ZERO {
        return None;
    }

    mean.checked_div(std_dev)?.checked_mul(n.sqrt()?)
}

fn checked_sum(mut values: impl Iterator<Item = Decimal>) -> Option<Decimal> {
    values.try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> RunOptions {
        RunOptions {
            verbose: false,
            ..RunOptions::default()
        }
    }

    #[test]
    fn test_basic_metrics() {
        let state = SimulationState {
            total_invested: dec!(150),
            total_shares: dec!(1.5),
            period_values: vec![dec!(50), dec!(100), dec!(165)],
        };

        let result = build_result("test", &state, dec!(110), &quiet()).unwrap();
        assert_eq!(result.total_invested, dec!(150));
        assert_eq!(result.final_value, dec!(165));
        assert_eq!(result.profit_loss, dec!(15));
        assert_eq!(result.roi_percent, dec!(10));
        assert_eq!(result.final_price, dec!(110));
    }

    #[test]
    fn test_rounding_matches_unrounded_inputs() {
        let shares = dec!(50) / dec!(3) + dec!(50) / dec!(7);
        let state = SimulationState {
            total_invested: dec!(100),
            total_shares: shares,
            period_values: vec![dec!(50), dec!(120)],
        };
        let final_price = dec!(5.55);

        let result = build_result("test", &state, final_price, &quiet()).unwrap();
        let final_value = shares * final_price;
        assert_eq!(result.total_shares, shares.round_dp(6));
        assert_eq!(result.final_value, final_value.round_dp(2));
        assert_eq!(result.profit_loss, (final_value - dec!(100)).round_dp(2));
        assert_eq!(
            result.roi_percent,
            ((final_value - dec!(100)) / dec!(100) * dec!(100)).round_dp(2)
        );
    }

    #[test]
    fn test_zero_invested_is_error() {
        let state = SimulationState {
            total_invested: Decimal::ZERO,
            total_shares: Decimal::ZERO,
            period_values: vec![Decimal::ZERO],
        };

        let result = build_result("Fixed DCA", &state, dec!(10), &quiet());
        assert!(matches!(result, Err(BacktestError::NoCapitalInvested { .. })));
    }

    #[test]
    fn test_sharpe_single_period_is_zero() {
        assert_eq!(sharpe_ratio(&[dec!(100)], dec!(0.02)), Decimal::ZERO);
        assert_eq!(sharpe_ratio(&[], dec!(0.02)), Decimal::ZERO);
    }

    #[test]
    fn test_sharpe_zero_variance_is_zero() {
        // Constant 10% growth every period
        let values = [dec!(100), dec!(110), dec!(121), dec!(133.1)];
        assert_eq!(sharpe_ratio(&values, dec!(0.02)), Decimal::ZERO);
    }

    #[test]
    fn test_sharpe_zero_prior_value_is_zero() {
        let values = [Decimal::ZERO, Decimal::ZERO, dec!(50), dec!(110)];
        assert!(period_returns(&values).is_none());
        assert_eq!(sharpe_ratio(&values, dec!(0.02)), Decimal::ZERO);
    }

    #[test]
    fn test_sharpe_known_value() {
        // returns: 1.0, 0.5 ; rf per period 0.01
        // excess: 0.99, 0.49 ; mean 0.74 ; std 0.25 ; sqrt(2) scale
        let values = [dec!(50), dec!(100), dec!(150)];
        let sharpe = sharpe_ratio(&values, dec!(0.02));
        let expected = dec!(0.74) / dec!(0.25) * dec!(2).sqrt().unwrap();
        assert_eq!(sharpe.round_dp(4), expected.round_dp(4));
        assert_eq!(sharpe.round_dp(4), dec!(4.1861));
    }

    #[test]
    fn test_sharpe_overflow_is_zero() {
        // Returns of roughly 1e15 and -1: their squared deviation exceeds Decimal::MAX
        let values = [dec!(1), dec!(1000000000000001), dec!(2)];
        assert!(period_returns(&values).is_some());
        assert_eq!(sharpe_ratio(&values, dec!(0.02)), Decimal::ZERO);
    }

    #[test]
    fn test_final_value_overflow_is_error() {
        let state = SimulationState {
            total_invested: dec!(100),
            total_shares: Decimal::MAX,
            period_values: vec![dec!(100)],
        };

        let result = build_result("test", &state, dec!(2), &quiet());
        assert!(matches!(result, Err(BacktestError::Overflow(_))));
    }

    #[test]
    fn test_negative_returns_give_negative_sharpe() {
        let values = [dec!(100), dec!(90), dec!(85), dec!(70)];
        assert!(sharpe_ratio(&values, dec!(0.02)) < Decimal::ZERO);
    }
}
