//! # Numeric Coercion
//!
//! Turns whatever the user typed, or whatever the backend sent, into a
//! `Decimal`. Coercion never fails: anything that is not a finite number
//! becomes zero, and magnitudes beyond [`MAX_MAGNITUDE`] are clamped to it.
//!
//! ## Two Boundaries
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Form input (text boxes)          Backend snapshots (JSON)              │
//! │  ───────────────────────          ────────────────────────              │
//! │  "12", " 1,200.50 ", "", "abc"    12, "12.5", null, true, missing       │
//! │            │                                 │                          │
//! │            ▼                                 ▼                          │
//! │  parse_non_negative()             lenient::decimal (serde)              │
//! │  (row invariant: ≥ 0)             (signed: stock, balances)             │
//! │            │                                 │                          │
//! │            └──────────────► Decimal ◄────────┘                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Largest magnitude a coerced value may have. Quantity, packing, rate and
/// percent are multiplied together, so each factor stays well inside the
/// `Decimal` range.
pub const MAX_MAGNITUDE: i64 = 1_000_000_000_000;

/// Parses user or wire text into a signed decimal; non-numeric text is zero.
///
/// ## Example
/// ```rust
/// use tradedesk_core::coerce::parse_decimal;
/// use rust_decimal::Decimal;
///
/// assert_eq!(parse_decimal(" 1,200.50 "), Decimal::new(120050, 2));
/// assert_eq!(parse_decimal("-3"), Decimal::from(-3));
/// assert_eq!(parse_decimal("abc"), Decimal::ZERO);
/// assert_eq!(parse_decimal(""), Decimal::ZERO);
/// assert_eq!(parse_decimal("1e20"), Decimal::from(1_000_000_000_000i64));
/// ```
pub fn parse_decimal(raw: &str) -> Decimal {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Decimal::ZERO;
    }

    let value = match Decimal::from_str(&cleaned) {
        Ok(value) => value,
        // "12." and "1e3" are valid floats but not valid decimal literals
        Err(_) => match cleaned.parse::<f64>() {
            Ok(value) if value.is_finite() => Decimal::from_f64(value)
                .unwrap_or(if value < 0.0 { Decimal::MIN } else { Decimal::MAX }),
            _ => Decimal::ZERO,
        },
    };

    let bound = Decimal::from(MAX_MAGNITUDE);
    value.clamp(-bound, bound)
}

/// Parses form input for a row or invoice field; negatives clamp to zero.
///
/// ## Example
/// ```rust
/// use tradedesk_core::coerce::parse_non_negative;
/// use rust_decimal::Decimal;
///
/// assert_eq!(parse_non_negative("7"), Decimal::from(7));
/// assert_eq!(parse_non_negative("-7"), Decimal::ZERO);
/// assert_eq!(parse_non_negative("NaN"), Decimal::ZERO);
/// ```
pub fn parse_non_negative(raw: &str) -> Decimal {
    parse_decimal(raw).max(Decimal::ZERO)
}

/// Coerces a JSON value into a decimal (numbers and numeric strings only).
pub fn decimal_from_value(value: &serde_json::Value) -> Decimal {
    match value {
        serde_json::Value::Number(n) => parse_decimal(&n.to_string()),
        serde_json::Value::String(s) => parse_decimal(s),
        _ => Decimal::ZERO,
    }
}

/// Serde helpers for ingesting loosely-typed backend records.
///
/// Use together with `#[serde(default)]` so that a missing field also
/// lands on the zero/empty value.
pub mod lenient {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer};

    use super::decimal_from_value;

    /// Any JSON value → `Decimal` (zero when absent, null or non-numeric).
    pub fn decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(value.as_ref().map(decimal_from_value).unwrap_or(Decimal::ZERO))
    }

    /// Numeric or string identifier → `String` (empty when absent or null).
    pub fn id<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(serde_json::Value::String(s)) => s.trim().to_string(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => String::new(),
        })
    }

    /// Like [`id`], but an empty identifier becomes `None`.
    pub fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let id = id(deserializer)?;
        Ok(if id.is_empty() { None } else { Some(id) })
    }
}
