use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

// Payment rows written over the years carry amounts as numbers or strings,
// and a few hold garbage. Garbage counts as zero, never as an error.
pub fn lenient_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.to_string().parse().unwrap_or(Decimal::ZERO),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(Decimal::ZERO),
        _ => Decimal::ZERO,
    })
}

pub fn format_eur(amount: Decimal) -> String {
    let cents = (amount * Decimal::from(100)).round();
    let total = cents.to_i64().unwrap_or(0);
    let sign = if total < 0 { "-" } else { "" };
    let abs = total.abs();
    format!("{sign}{},{:02} €", abs / 100, abs % 100)
}
