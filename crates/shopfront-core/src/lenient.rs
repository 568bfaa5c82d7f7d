//! Forgiving field decoders for the commerce API's loosely typed JSON.
//!
//! Prices arrive as numbers or decimal strings, stock counts sometimes as
//! strings, and option labels either as bare strings or `{ "name": ... }`
//! objects. These helpers are used with `#[serde(deserialize_with = ...)]`
//! and never fail on a wrong-typed value; they fall back instead.

use std::str::FromStr;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::ids::EntityId;

/// Parses the longest numeric prefix of `raw`, the way a browser's
/// `parseFloat` would: `"12.50 VND"` → `12.50`, `"abc"` → `None`.
#[must_use]
pub fn parse_leading_decimal(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (idx, ch) in trimmed.char_indices() {
        match ch {
            '+' | '-' if idx == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = idx + ch.len_utf8();
    }
    if !seen_digit {
        return None;
    }
    let candidate = trimmed[..end].trim_end_matches('.');
    Decimal::from_str(candidate).ok()
}

/// Converts an arbitrary JSON value to a decimal, if it plausibly is one.
#[must_use]
pub fn value_to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .ok()
            .or_else(|| n.as_f64().and_then(Decimal::from_f64)),
        Value::String(s) => parse_leading_decimal(s),
        _ => None,
    }
}

/// Converts a JSON value to a non-negative count. Fractions are truncated.
#[must_use]
pub fn value_to_count(value: &Value) -> Option<u32> {
    let decimal = value_to_decimal(value)?;
    if decimal.is_sign_negative() {
        return Some(0);
    }
    decimal
        .trunc()
        .to_u64()
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
}

/// Reads a display label from a string or an object carrying `name`.
#[must_use]
pub fn value_to_label(value: &Value) -> Option<String> {
    let raw = match value {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map.get("name").and_then(Value::as_str)?,
        _ => return None,
    };
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Price that defaults to zero when missing, null, or unparseable.
pub fn decimal_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<Decimal, D::Error> {
    let raw = Option::<Value>::deserialize(d)?;
    Ok(raw.as_ref().and_then(value_to_decimal).unwrap_or_default())
}

/// Price that is absent when missing, null, or unparseable.
pub fn optional_decimal<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Decimal>, D::Error> {
    let raw = Option::<Value>::deserialize(d)?;
    Ok(raw.as_ref().and_then(value_to_decimal))
}

/// Stock count that is absent (unbounded) when missing or non-numeric.
pub fn optional_count<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    let raw = Option::<Value>::deserialize(d)?;
    Ok(raw.as_ref().and_then(value_to_count))
}

/// Count that defaults to zero when missing or non-numeric.
pub fn count_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    optional_count(d).map(Option::unwrap_or_default)
}

/// Label from a string or `{ "name": ... }`; blank strings become `None`.
pub fn optional_label<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let raw = Option::<Value>::deserialize(d)?;
    Ok(raw.as_ref().and_then(value_to_label))
}

/// Reads free text from a string or a number (`912345678` → `"912345678"`).
/// Blank strings and other types are `None`.
#[must_use]
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// JavaScript-style truthiness: `false`, `0`, `""`, `null`, and a missing
/// value are false; `"false"` and `"0"` strings are also read as false.
#[must_use]
pub fn value_is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f.abs() > 0.0),
        Value::String(s) => !matches!(s.trim().to_ascii_lowercase().as_str(), "" | "0" | "false"),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Id of an embedded record: `{ "id": ... }` / `{ "_id": ... }`, or a bare
/// id. Anything unreadable is `None`.
#[must_use]
pub fn value_to_ref_id(value: &Value) -> Option<EntityId> {
    let raw = match value {
        Value::Object(map) => map.get("id").or_else(|| map.get("_id"))?,
        other => other,
    };
    EntityId::deserialize(raw).ok()
}

/// Text from a string or number; blank or other types become `None`.
pub fn optional_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let raw = Option::<Value>::deserialize(d)?;
    Ok(raw.as_ref().and_then(value_to_text))
}

/// Flag read with [`value_is_truthy`]; missing is `false`.
pub fn truthy<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    let raw = Option::<Value>::deserialize(d)?;
    Ok(raw.as_ref().is_some_and(value_is_truthy))
}

/// Embedded record id, see [`value_to_ref_id`].
pub fn optional_ref_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<EntityId>, D::Error> {
    let raw = Option::<Value>::deserialize(d)?;
    Ok(raw.as_ref().and_then(value_to_ref_id))
}

/// List of labels, skipping entries that are neither strings nor named objects.
pub fn label_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    let raw = Option::<Value>::deserialize(d)?;
    Ok(match raw {
        Some(Value::Array(items)) => items.iter().filter_map(value_to_label).collect(),
        Some(single @ Value::String(_)) => value_to_label(&single).into_iter().collect(),
        _ => Vec::new(),
    })
}
