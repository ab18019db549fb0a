//! Domain Models
//!
//! Core data types for DCA backtesting.
//! Uses `rust_decimal` for all monetary values - never use f64 for money!

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::{BacktestError, Result};

/// A single period of the price history
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Closing price for the period
    pub price: Decimal,

    /// Optional period label. Never used for lookups, rows are addressed by position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl PricePoint {
    pub fn new(price: Decimal) -> Self {
        Self { price, timestamp: None }
    }

    pub fn dated(price: Decimal, timestamp: DateTime<Utc>) -> Self {
        Self {
            price,
            timestamp: Some(timestamp),
        }
    }
}

/// Chronologically ordered, validated price history.
///
/// Guaranteed non-empty with strictly positive prices, so every simulator
/// has a first and a last period to reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PricePoint>", into = "Vec<PricePoint>")]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Result<Self> {
        if points.is_empty() {
            return Err(BacktestError::EmptySeries);
        }

        if let Some((index, point)) = points
            .iter()
            .enumerate()
            .find(|(_, p)| p.price <= Decimal::ZERO)
        {
            return Err(BacktestError::InvalidPrice {
                index,
                price: point.price.to_string(),
            });
        }

        Ok(Self { points })
    }

    /// Build an undated series from raw prices
    pub fn from_prices(prices: &[Decimal]) -> Result<Self> {
        Self::new(prices.iter().copied().map(PricePoint::new).collect())
    }

    /// Build from float prices. NaN and infinite values are rejected.
    pub fn from_f64_prices(prices: &[f64]) -> Result<Self> {
        let points = prices
            .iter()
            .enumerate()
            .map(|(index, &p)| {
                Decimal::from_f64(p)
                    .map(PricePoint::new)
                    .ok_or_else(|| BacktestError::InvalidPrice {
                        index,
                        price: p.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(points)
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn prices(&self) -> impl Iterator<Item = Decimal> + '_ {
        self.points.iter().map(|p| p.price)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Relies on the non-empty invariant enforced by [`PriceSeries::new`]
    pub fn first_price(&self) -> Decimal {
        debug_assert!(!self.points.is_empty(), "PriceSeries is never empty");
        self.points.first().map_or(Decimal::ZERO, |p| p.price)
    }

    /// Relies on the non-empty invariant enforced by [`PriceSeries::new`]
    pub fn last_price(&self) -> Decimal {
        debug_assert!(!self.points.is_empty(), "PriceSeries is never empty");
        self.points.last().map_or(Decimal::ZERO, |p| p.price)
    }
}

impl TryFrom<Vec<PricePoint>> for PriceSeries {
    type Error = BacktestError;

    fn try_from(points: Vec<PricePoint>) -> Result<Self> {
        Self::new(points)
    }
}

impl From<PriceSeries> for Vec<PricePoint> {
    fn from(series: PriceSeries) -> Self {
        series.points
    }
}

/// Running state of one simulation pass
#[derive(Clone, Debug, Default)]
pub struct SimulationState {
    /// Capital put in so far
    pub total_invested: Decimal,

    /// Shares accumulated so far
    pub total_shares: Decimal,

    /// Portfolio value at the end of each processed period
    pub period_values: Vec<Decimal>,
}

impl SimulationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a position already opened (lump sum entry)
    pub fn seeded(total_invested: Decimal, total_shares: Decimal) -> Self {
        Self {
            total_invested,
            total_shares,
            period_values: Vec::new(),
        }
    }

    /// Portfolio value at the given price
    pub fn value_at(&self, price: Decimal) -> Result<Decimal> {
        self.total_shares
            .checked_mul(price)
            .ok_or_else(|| BacktestError::overflow(format!("{} shares at {price}", self.total_shares)))
    }

    /// Spend `amount` buying at `price`. State is untouched on error.
    pub fn buy(&mut self, amount: Decimal, price: Decimal) -> Result<()> {
        let shares = amount
            .checked_div(price)
            .ok_or_else(|| BacktestError::overflow(format!("{amount} / {price}")))?;
        let total_invested = self
            .total_invested
            .checked_add(amount)
            .ok_or_else(|| BacktestError::overflow(format!("total invested + {amount}")))?;
        let total_shares = self
            .total_shares
            .checked_add(shares)
            .ok_or_else(|| BacktestError::overflow(format!("total shares + {shares}")))?;

        self.total_invested = total_invested;
        self.total_shares = total_shares;
        Ok(())
    }

    /// Snapshot the end-of-period portfolio value
    pub fn close_period(&mut self, price: Decimal) -> Result<()> {
        let value = self.value_at(price)?;
        self.period_values.push(value);
        Ok(())
    }
}

/// Final metrics of a strategy run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyResult {
    pub total_invested: Decimal,
    pub total_shares: Decimal,
    pub final_price: Decimal,
    pub final_value: Decimal,
    pub profit_loss: Decimal,
    pub roi_percent: Decimal,
    pub sharpe_ratio: Decimal,
}

impl StrategyResult {
    /// Human-readable report, one field per line
    pub fn report(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("Total Invested:  ${}\n", self.total_invested));
        s.push_str(&format!("Total Shares:     {}\n", self.total_shares));
        s.push_str(&format!("Final Price:     ${}\n", self.final_price));
        s.push_str(&format!("Final Value:     ${}\n", self.final_value));
        s.push_str(&format!("Profit / Loss:   ${}\n", self.profit_loss));
        s.push_str(&format!("ROI:              {}%\n", self.roi_percent));
        s.push_str(&format!("Sharpe Ratio:     {}\n", self.sharpe_ratio));
        s
    }
}

impl fmt::Display for StrategyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.report().trim_end())
    }
}
