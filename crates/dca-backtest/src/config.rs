//! Backtest Configuration

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{BacktestError, Result};
use crate::strategy::StrategyKind;

/// Options shared by every simulator run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    /// Risk-free rate for the whole series, spread across periods
    pub risk_free_rate: Decimal,

    /// Log a report of the result
    pub verbose: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            risk_free_rate: dec!(0.02),
            verbose: true,
        }
    }
}

impl RunOptions {
    pub fn quiet(risk_free_rate: Decimal) -> Self {
        Self {
            risk_free_rate,
            verbose: false,
        }
    }
}

/// Parameters for comparing strategies over one series
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    /// Per-period amount (also the value averaging target growth)
    pub amount: Decimal,

    pub risk_free_rate: Decimal,

    /// RSI level below which the signal strategy buys
    pub rsi_threshold: Decimal,

    /// Fractional drop that triggers a double purchase
    pub drop_threshold: Decimal,

    /// Per-period growth for the increasing amount strategy
    pub growth_rate: Decimal,

    /// Lump sum size as a multiple of `amount`
    pub lump_sum_multiplier: Decimal,

    /// Strategies to run, in output order
    pub strategies: Vec<StrategyKind>,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            amount: dec!(50),
            risk_free_rate: dec!(0.02),
            rsi_threshold: dec!(30),
            drop_threshold: dec!(0.10),
            growth_rate: dec!(0.05),
            lump_sum_multiplier: dec!(20),
            strategies: StrategyKind::default_comparison().to_vec(),
        }
    }
}

impl ComparisonConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create from any key lookup, falling back to defaults for
    /// missing or unparsable values
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let decimal = |key: &str, fallback: Decimal| {
            lookup(key)
                .and_then(|v| Decimal::from_str(v.trim()).ok())
                .unwrap_or(fallback)
        };

        let strategies = lookup("DCA_STRATEGIES")
            .and_then(|v| parse_strategy_list(&v).ok())
            .filter(|list| !list.is_empty())
            .unwrap_or_else(|| defaults.strategies.clone());

        Self {
            amount: decimal("DCA_AMOUNT", defaults.amount),
            risk_free_rate: decimal("DCA_RISK_FREE_RATE", defaults.risk_free_rate),
            rsi_threshold: decimal("DCA_RSI_THRESHOLD", defaults.rsi_threshold),
            drop_threshold: decimal("DCA_DROP_THRESHOLD", defaults.drop_threshold),
            growth_rate: decimal("DCA_GROWTH_RATE", defaults.growth_rate),
            lump_sum_multiplier: decimal("DCA_LUMP_SUM_MULTIPLIER", defaults.lump_sum_multiplier),
            strategies,
        }
    }

    /// Lump sum handed to the hybrid strategy
    pub fn lump_sum(&self) -> Result<Decimal> {
        self.amount
            .checked_mul(self.lump_sum_multiplier)
            .ok_or_else(|| BacktestError::overflow(format!("{} * {}", self.amount, self.lump_sum_multiplier)))
    }

    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("amount", self.amount),
            ("rsi_threshold", self.rsi_threshold),
            ("drop_threshold", self.drop_threshold),
            ("lump_sum_multiplier", self.lump_sum_multiplier),
        ];
        if let Some((name, value)) = checks.into_iter().find(|(_, v)| *v < Decimal::ZERO) {
            return Err(BacktestError::negative(name, value));
        }
        if self.growth_rate <= dec!(-1) {
            return Err(BacktestError::InvalidParameter(format!(
                "growth_rate must be greater than -1 (got {})",
                self.growth_rate
            )));
        }
        self.lump_sum()?;
        Ok(())
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions::quiet(self.risk_free_rate)
    }
}

/// Parse a comma-separated list of strategy keys
pub fn parse_strategy_list(s: &str) -> Result<Vec<StrategyKind>> {
    s.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(StrategyKind::from_str)
        .collect()
}
