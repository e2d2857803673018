//! Major/minor currency unit conversion.
//!
//! Forms hold amounts in major units (`"1000.50"`), the API expects integer
//! minor units (`100050`). Anything that is not a finite number maps to
//! `None` so callers emit `null` instead of a bogus amount.

use serde_json::{Number, Value};

/// Convert a major-unit value (number or decimal string) into minor units.
pub fn to_minor_units(value: &Value) -> Option<i64> {
    let major = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok()?
        }
        _ => return None,
    };

    checked_cents(major * 100.0)
}

/// Round to whole minor units; `None` when not finite or outside `i64`.
pub(crate) fn checked_cents(minor: f64) -> Option<i64> {
    let rounded = minor.round();
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    if !rounded.is_finite() || rounded < i64::MIN as f64 || rounded >= i64::MAX as f64 {
        return None;
    }
    Some(rounded as i64)
}

/// Convert minor units back into a major-unit amount.
#[inline]
pub fn from_minor_units(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Minor units as a JSON number in major units; whole amounts stay integers.
pub fn major_units_value(cents: i64) -> Value {
    if cents % 100 == 0 {
        return Value::Number(Number::from(cents / 100));
    }
    Number::from_f64(from_minor_units(cents))
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Format minor units for display, e.g. `format_money(100000, "USD")` is
/// `$1,000.00`. Unknown currencies are prefixed with their code.
pub fn format_money(cents: i64, currency: &str) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let whole = group_thousands(abs / 100);
    let fraction = abs % 100;

    let code = currency.to_ascii_uppercase();
    let prefix = match code.as_str() {
        "USD" | "CAD" | "AUD" | "NZD" | "SGD" | "MXN" | "ARS" => "$".to_string(),
        "EUR" => "€".to_string(),
        "GBP" => "£".to_string(),
        "JPY" => "¥".to_string(),
        "INR" => "₹".to_string(),
        "BRL" => "R$".to_string(),
        "" => String::new(),
        other => format!("{} ", other),
    };

    format!("{}{}{}.{:02}", sign, prefix, whole, fraction)
}

fn group_thousands(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let mut groups = Vec::new();
    while value > 0 {
        groups.push(value % 1000);
        value /= 1000;
    }

    let mut out = String::new();
    for (i, group) in groups.iter().rev().enumerate() {
        if i == 0 {
            out.push_str(&group.to_string());
        } else {
            out.push_str(&format!(",{:03}", group));
        }
    }
    out
}
