//! Response-shape helpers.
//!
//! The backend is inconsistent about wrapping: a resource may come back bare
//! or under `data`, and a list may be a bare array or sit under `items` or
//! `data`. Everything here is pure so it is tested without HTTP.

use serde::de::DeserializeOwned;
use serde_json::Value;
use shopfront_core::Credentials;

use crate::error::ApiError;

/// Strips one `{ "data": … }` wrapper if present.
pub(crate) fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.get("data").is_some_and(|d| !d.is_null()) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Extracts a list from a bare array, `items`, or `data`. Any other shape is
/// `None`.
pub(crate) fn extract_list(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => {
            for key in ["items", "data"] {
                match map.remove(key) {
                    Some(Value::Array(items)) => return Some(items),
                    Some(Value::Object(inner)) => {
                        if let Some(items) = extract_list(Value::Object(inner)) {
                            return Some(items);
                        }
                    }
                    _ => {}
                }
            }
            None
        }
        _ => None,
    }
}

pub(crate) fn decode<T: DeserializeOwned>(value: Value, context: &str) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Deserialize {
        context: context.to_owned(),
        source: e,
    })
}

/// Decodes a list response, failing when the body has no list in it.
pub(crate) fn decode_list<T: DeserializeOwned>(
    value: Value,
    context: &str,
) -> Result<Vec<T>, ApiError> {
    let items = extract_list(value).ok_or_else(|| ApiError::Deserialize {
        context: context.to_owned(),
        source: serde::de::Error::custom("expected a list, or an object with `items` or `data`"),
    })?;
    items
        .into_iter()
        .map(|item| decode(item, context))
        .collect()
}

/// Message for a failed response: JSON `message` when present, else the raw
/// body, else a generic line naming the status.
pub(crate) fn error_message(status: u16, body: &str) -> String {
    let trimmed = body.trim();
    if let Ok(json) = serde_json::from_str::<Value>(trimmed) {
        if let Some(message) = json.get("message").and_then(Value::as_str) {
            if !message.trim().is_empty() {
                return message.to_owned();
            }
        }
        if !json.is_null() {
            return json.to_string();
        }
    }
    if trimmed.is_empty() {
        format!("Request failed with {status}")
    } else {
        trimmed.to_owned()
    }
}

/// Pulls the bearer token and role out of a login response.
///
/// Token: `token`, `accessToken`, or `data.token`. Role: `role`, `user.role`,
/// `data.role`, or `data.user.role`, lowercased.
pub(crate) fn extract_credentials(body: &Value) -> Option<Credentials> {
    let token = ["/token", "/accessToken", "/data/token"]
        .iter()
        .find_map(|p| body.pointer(p).and_then(Value::as_str))
        .filter(|t| !t.is_empty())?;

    let role = ["/role", "/user/role", "/data/role", "/data/user/role"]
        .iter()
        .find_map(|p| match body.pointer(p) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_default()
        .to_lowercase();

    Some(Credentials {
        token: token.to_owned(),
        role,
    })
}
