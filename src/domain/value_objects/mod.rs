//! Value Objects for order import

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference tax rates and their Spire tax codes, in lookup order.
pub const TAX_RATES: [(f64, u8); 7] = [
    (0.05, 1),
    (0.08, 2),
    (0.13, 3),
    (0.15, 4),
    (0.14, 5),
    (0.12, 6),
    (0.11, 7),
];

/// Date-time layouts seen in the report's `purchase-date` column, tried in order.
pub const ORDER_DATE_FORMATS: [&str; 2] = ["%m/%d/%Y %H:%M", "%Y-%m-%d %H:%M:%S"];

/// Spire sales tax code
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaxCode(u8);

impl TaxCode {
    /// Classifies a line from its item price and item tax.
    ///
    /// A missing cell counts as zero. Returns `None` when the price is zero,
    /// either value is not a number, or the rate is not finite.
    pub fn classify(item_price: Option<&str>, item_tax: Option<&str>) -> Option<Self> {
        let price = match item_price {
            Some(raw) => parse_amount(raw)?,
            None => 0.0,
        };
        let tax = match item_tax {
            Some(raw) => parse_amount(raw)?,
            None => 0.0,
        };
        if price == 0.0 { return None; }
        Self::from_rate(tax / price)
    }

    /// Nearest reference rate; ties keep the earliest entry of `TAX_RATES`.
    pub fn from_rate(rate: f64) -> Option<Self> {
        if !rate.is_finite() { return None; }
        let mut best: Option<(f64, u8)> = None;
        for (reference, code) in TAX_RATES {
            let distance = (reference - rate).abs();
            match best {
                Some((d, _)) if d <= distance => {}
                _ => best = Some((distance, code)),
            }
        }
        best.map(|(_, code)| Self(code))
    }

    pub fn value(&self) -> u8 { self.0 }
}

impl fmt::Display for TaxCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Parses a report cell as a float. Surrounding whitespace is ignored; `nan`
/// and `inf` are accepted and left to the caller.
pub fn parse_amount(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok()
}

/// Like `parse_amount` but missing, unparseable and NaN all become `0.0`.
pub fn amount_or_zero(raw: Option<&str>) -> f64 {
    match raw.and_then(parse_amount) {
        Some(v) if !v.is_nan() => v,
        _ => 0.0,
    }
}

/// Renders a float the way Spire expects decimal text: shortest round-trip
/// digits, integral values keep a trailing `.0`.
pub fn format_amount(value: f64) -> String {
    format!("{:?}", value)
}

/// Reduces a `purchase-date` value to `YYYY-MM-DD`, or `""` when no known
/// layout matches.
pub fn normalize_order_date(raw: Option<&str>) -> String {
    let Some(raw) = raw else { return String::new() };
    ORDER_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}
