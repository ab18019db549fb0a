//! Price Indicators
//!
//! Relative Strength Index over a trailing window of simple averages.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)

use std::collections::VecDeque;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Window used by the signal-based strategy
pub const RSI_PERIOD: usize = 14;

/// Sliding-window RSI accumulator.
///
/// Keeps running sums of gains and losses over the last `period` price
/// changes. Feed prices in chronological order with [`RollingRsi::push`].
#[derive(Clone, Debug)]
pub struct RollingRsi {
    period: usize,
    changes: VecDeque<Decimal>,
    gain_sum: Decimal,
    loss_sum: Decimal,
    last_price: Option<Decimal>,
}

impl RollingRsi {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            changes: VecDeque::with_capacity(period + 1),
            gain_sum: Decimal::ZERO,
            loss_sum: Decimal::ZERO,
            last_price: None,
        }
    }

    /// Add the next price and return the RSI at this period, if defined
    pub fn push(&mut self, price: Decimal) -> Option<Decimal> {
        let previous = self.last_price.replace(price)?;
        let change = price - previous;

        self.changes.push_back(change);
        let mut in_range = self.add(change, Decimal::ONE);
        if self.changes.len() > self.period {
            if let Some(expired) = self.changes.pop_front() {
                in_range = in_range && self.add(expired, Decimal::NEGATIVE_ONE);
            }
        }
        if !in_range {
            self.reset_window();
            return None;
        }

        if self.period == 0 || self.changes.len() < self.period {
            return None;
        }
        self.value()
    }

    /// Returns false when a running sum no longer fits in a `Decimal`
    fn add(&mut self, change: Decimal, sign: Decimal) -> bool {
        let signed = change * sign;
        let updated = if change > Decimal::ZERO {
            self.gain_sum.checked_add(signed).map(|sum| self.gain_sum = sum)
        } else if change < Decimal::ZERO {
            self.loss_sum.checked_sub(signed).map(|sum| self.loss_sum = sum)
        } else {
            Some(())
        };
        updated.is_some()
    }

    /// Drop the window after an overflow; the RSI is undefined until it refills
    fn reset_window(&mut self) {
        self.changes.clear();
        self.gain_sum = Decimal::ZERO;
        self.loss_sum = Decimal::ZERO;
    }

    /// Both sums share the `1 / period` factor, so the ratio of sums equals
    /// the ratio of means.
    fn value(&self) -> Option<Decimal> {
        if self.loss_sum.is_zero() {
            return (!self.gain_sum.is_zero()).then_some(dec!(100));
        }
        // A ratio too large for a Decimal puts the RSI at its upper bound
        let Some(strength) = self.gain_sum.checked_div(self.loss_sum) else {
            return Some(dec!(100));
        };
        let denominator = Decimal::ONE.checked_add(strength).unwrap_or(Decimal::MAX);
        Some(dec!(100) - dec!(100) / denominator)
    }
}

/// RSI for every period of `prices`.
///
/// The first `period` entries are `None`: the first row has no price change
/// and a full window of changes is first available at index `period`.
/// Windows with no movement at all are also `None`.
pub fn rsi(prices: &[Decimal], period: usize) -> Vec<Option<Decimal>> {
    let mut window = RollingRsi::new(period);
    prices.iter().map(|&p| window.push(p)).collect()
}
