//! Strategy Comparison
//!
//! Runs several strategies over the same series and lines their results
//! up in one table.

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::ComparisonConfig;
use crate::error::Result;
use crate::model::{PriceSeries, StrategyResult};

/// One strategy's line in the comparison
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ComparisonRow {
    pub strategy: String,
    pub total_invested: Decimal,
    pub final_value: Decimal,
    pub profit_loss: Decimal,
    pub roi_percent: Decimal,
    pub sharpe_ratio: Decimal,
}

impl ComparisonRow {
    pub fn new(strategy: impl Into<String>, result: &StrategyResult) -> Self {
        Self {
            strategy: strategy.into(),
            total_invested: result.total_invested,
            final_value: result.final_value,
            profit_loss: result.profit_loss,
            roi_percent: result.roi_percent,
            sharpe_ratio: result.sharpe_ratio,
        }
    }
}

/// Results of the strategies that traded, in run order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ComparisonTable {
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    pub const COLUMNS: [&'static str; 6] = [
        "strategy",
        "total_invested",
        "final_value",
        "profit_loss",
        "roi_percent",
        "sharpe_ratio",
    ];

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up a row by strategy name
    pub fn get(&self, strategy: &str) -> Option<&ComparisonRow> {
        self.rows.iter().find(|r| r.strategy == strategy)
    }

    pub fn best_by_roi(&self) -> Option<&ComparisonRow> {
        self.rows.iter().max_by_key(|r| r.roi_percent)
    }

    pub fn best_by_sharpe(&self) -> Option<&ComparisonRow> {
        self.rows.iter().max_by_key(|r| r.sharpe_ratio)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for ComparisonTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name_width = self
            .rows
            .iter()
            .map(|r| r.strategy.len())
            .chain(std::iter::once(Self::COLUMNS[0].len()))
            .max()
            .unwrap_or_default();

        write!(f, "{:<name_width$}", Self::COLUMNS[0])?;
        for column in &Self::COLUMNS[1..] {
            write!(f, "  {column:>14}")?;
        }
        writeln!(f)?;

        for row in &self.rows {
            write!(f, "{:<name_width$}", row.strategy)?;
            for value in [
                row.total_invested,
                row.final_value,
                row.profit_loss,
                row.roi_percent,
                row.sharpe_ratio,
            ] {
                write!(f, "  {:>14}", format_amount(value))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Two decimals with thousands separators, e.g. `-1,234.50`
pub fn format_amount(value: Decimal) -> String {
    let fixed = format!("{:.2}", value.round_dp(2));
    let (sign, digits) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}{grouped}.{frac_part}")
}

/// Run the configured strategies and tabulate the ones that traded
pub fn compare_strategies(series: &PriceSeries, config: &ComparisonConfig) -> Result<ComparisonTable> {
    config.validate()?;
    let options = config.run_options();

    let mut table = ComparisonTable::default();
    for &kind in &config.strategies {
        tracing::debug!(strategy = kind.label(), periods = series.len(), "Running strategy");

        match kind.run(series, config, &options)? {
            Some(result) => table.rows.push(ComparisonRow::new(kind.label(), &result)),
            None => tracing::info!(strategy = kind.label(), "Dropped from comparison, no trades"),
        }
    }

    tracing::debug!(rows = table.len(), "Comparison complete");
    Ok(table)
}

/// Compare the default strategy set with a shared amount and risk-free rate
pub fn compare_dca_strategies(
    series: &PriceSeries,
    amount: Decimal,
    risk_free_rate: Decimal,
) -> Result<ComparisonTable> {
    let config = ComparisonConfig {
        amount,
        risk_free_rate,
        ..ComparisonConfig::default()
    };
    compare_strategies(series, &config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BacktestError;
    use crate::strategy::{self, StrategyKind};
    use crate::config::RunOptions;
    use rust_decimal_macros::dec;

    /// Saw-tooth that drifts down then recovers, enough for the RSI to trade
    fn choppy_series() -> PriceSeries {
        let prices: Vec<Decimal> = (0..40)
            .map(|i| {
                let trend = if i < 25 { 200 - i * 4 } else { 100 + (i - 25) * 6 };
                let wobble = if i % 2 == 0 { 3 } else { -3 };
                Decimal::from(trend + wobble)
            })
            .collect();
        PriceSeries::from_prices(&prices).unwrap()
    }

    fn rising_series() -> PriceSeries {
        let prices: Vec<Decimal> = (0..30).map(|i| Decimal::from(100 + i)).collect();
        PriceSeries::from_prices(&prices).unwrap()
    }

    #[test]
    fn test_default_comparison_rows() {
        let table = compare_dca_strategies(&choppy_series(), dec!(50), dec!(0.02)).unwrap();

        assert_eq!(table.len(), 5);
        let names: Vec<&str> = table.rows.iter().map(|r| r.strategy.as_str()).collect();
        assert_eq!(
            names,
            vec!["Fixed DCA", "Value Averaging", "Signal-Based RSI", "Double Down", "Lump Sum Hybrid"]
        );
        assert!(table.get("Increasing Amount").is_none());
    }

    #[test]
    fn test_strategy_without_trades_is_dropped() {
        let table = compare_dca_strategies(&rising_series(), dec!(50), dec!(0.02)).unwrap();

        assert_eq!(table.len(), 4);
        assert!(table.get("Signal-Based RSI").is_none());
        assert!(table.get("Increasing Amount").is_none());
    }

    #[test]
    fn test_rows_match_individual_runs() {
        let series = choppy_series();
        let table = compare_dca_strategies(&series, dec!(50), dec!(0.02)).unwrap();
        let options = RunOptions::quiet(dec!(0.02));

        let fixed = strategy::fixed(&series, dec!(50), &options).unwrap();
        assert_eq!(table.get("Fixed DCA"), Some(&ComparisonRow::new("Fixed DCA", &fixed)));
        assert_eq!(fixed.total_invested, dec!(2000));

        let hybrid = strategy::lump_sum_hybrid(&series, dec!(1000), dec!(50), &options).unwrap();
        assert_eq!(
            table.get("Lump Sum Hybrid"),
            Some(&ComparisonRow::new("Lump Sum Hybrid", &hybrid))
        );
    }

    #[test]
    fn test_increasing_amount_can_be_selected() {
        let config = ComparisonConfig {
            strategies: vec![StrategyKind::IncreasingAmount, StrategyKind::Fixed],
            ..ComparisonConfig::default()
        };
        let table = compare_strategies(&rising_series(), &config).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].strategy, "Increasing Amount");
    }

    #[test]
    fn test_zero_amount_surfaces_error() {
        let result = compare_dca_strategies(&rising_series(), Decimal::ZERO, dec!(0.02));
        assert!(matches!(result, Err(BacktestError::NoCapitalInvested { .. })));
    }

    #[test]
    fn test_best_rows() {
        let table = compare_dca_strategies(&choppy_series(), dec!(50), dec!(0.02)).unwrap();
        let best = table.best_by_roi().unwrap();
        assert!(table.rows.iter().all(|r| r.roi_percent <= best.roi_percent));
        assert!(table.best_by_sharpe().is_some());
        assert!(ComparisonTable::default().best_by_roi().is_none());
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec!(1234567.891)), "1,234,567.89");
        assert_eq!(format_amount(dec!(-1234.5)), "-1,234.50");
        assert_eq!(format_amount(dec!(999)), "999.00");
        assert_eq!(format_amount(Decimal::ZERO), "0.00");
    }

    #[test]
    fn test_display_and_json() {
        let table = compare_dca_strategies(&choppy_series(), dec!(50), dec!(0.02)).unwrap();

        let rendered = table.to_string();
        assert!(rendered.starts_with("strategy"));
        assert!(rendered.contains("2,000.00"));
        assert_eq!(rendered.lines().count(), table.len() + 1);

        let json: serde_json::Value = serde_json::from_str(&table.to_json().unwrap()).unwrap();
        assert_eq!(json.as_array().map(Vec::len), Some(table.len()));
        assert_eq!(json[0]["strategy"], "Fixed DCA");
    }
}
