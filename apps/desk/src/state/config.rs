//! # Display Configuration
//!
//! Settings the entry screens apply to every new form.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`TRADEDESK_*`)
//! 2. Defaults (this file)
//!
//! Backend connection settings live in `tradedesk_client::ClientConfig`.
//! This is read-only after initialization, so no mutex needed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;
use tradedesk_core::{Money, Percent, PrintFormat, MONEY_DECIMAL_PLACES};

/// Desk display configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeskConfig {
    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Number of decimal places shown for amounts
    pub currency_decimals: u32,

    /// Print layout preselected on new forms
    pub print_format: PrintFormat,

    /// Markup used for purchase price drift checks when the supplier
    /// account defines none
    pub default_markup: Percent,
}

impl Default for DeskConfig {
    fn default() -> Self {
        DeskConfig {
            currency_symbol: "Rs".to_string(),
            currency_decimals: MONEY_DECIMAL_PLACES,
            print_format: PrintFormat::A4,
            default_markup: Percent::zero(),
        }
    }
}

impl DeskConfig {
    /// Creates a DeskConfig from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `TRADEDESK_CURRENCY_SYMBOL`: Override currency symbol
    /// - `TRADEDESK_PRINT_FORMAT`: `a4`, `a5` or `thermal`
    /// - `TRADEDESK_DEFAULT_MARKUP`: Default markup percent (e.g. "12.5")
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`DeskConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = DeskConfig::default();

        if let Some(symbol) = lookup("TRADEDESK_CURRENCY_SYMBOL") {
            config.currency_symbol = symbol;
        }

        if let Some(format) = lookup("TRADEDESK_PRINT_FORMAT") {
            match format.parse::<PrintFormat>() {
                Ok(format) => config.print_format = format,
                Err(e) => warn!(error = %e, "Ignoring TRADEDESK_PRINT_FORMAT"),
            }
        }

        if let Some(markup) = lookup("TRADEDESK_DEFAULT_MARKUP") {
            match markup.trim().parse::<Decimal>() {
                Ok(value) if value >= Decimal::ZERO => {
                    config.default_markup = Percent::new(value);
                }
                _ => warn!(value = %markup, "Ignoring TRADEDESK_DEFAULT_MARKUP"),
            }
        }

        config
    }

    /// Formats an amount for display.
    ///
    /// ## Example
    /// - `Money::from_cents(123456)` → "Rs 1234.56"
    /// - `Money::from_cents(-500)` → "-Rs 5.00"
    pub fn format_amount(&self, amount: Money) -> String {
        let value = amount.amount().round_dp(self.currency_decimals);
        let places = self.currency_decimals as usize;
        if value < Decimal::ZERO {
            format!("-{} {:.*}", self.currency_symbol, places, -value)
        } else {
            format!("{} {:.*}", self.currency_symbol, places, value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        assert_eq!(DeskConfig::from_lookup(lookup(&[])), DeskConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let config = DeskConfig::from_lookup(lookup(&[
            ("TRADEDESK_CURRENCY_SYMBOL", "$"),
            ("TRADEDESK_PRINT_FORMAT", "thermal"),
            ("TRADEDESK_DEFAULT_MARKUP", "12.5"),
        ]));

        assert_eq!(config.currency_symbol, "$");
        assert_eq!(config.print_format, PrintFormat::Thermal);
        assert_eq!(config.default_markup, Percent::new(Decimal::new(125, 1)));
    }

    #[test]
    fn test_bad_values_are_ignored() {
        let config = DeskConfig::from_lookup(lookup(&[
            ("TRADEDESK_PRINT_FORMAT", "letter"),
            ("TRADEDESK_DEFAULT_MARKUP", "-3"),
        ]));

        assert_eq!(config.print_format, PrintFormat::A4);
        assert!(config.default_markup.is_zero());
    }

    #[test]
    fn test_format_amount() {
        let config = DeskConfig::default();
        assert_eq!(config.format_amount(Money::from_cents(123456)), "Rs 1234.56");
        assert_eq!(config.format_amount(Money::from_cents(-500)), "-Rs 5.00");
        assert_eq!(config.format_amount(Money::ZERO), "Rs 0.00");
    }
}
