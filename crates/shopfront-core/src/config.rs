use crate::app_config::{AppConfig, CartFailurePolicy, Environment};
use crate::error::ConfigError;

/// Order-creation paths in the order they are tried. The backend has exposed
/// each of these at some point and which one is canonical is unconfirmed.
pub const DEFAULT_ORDER_CREATE_ENDPOINTS: [&str; 3] =
    ["/v1/orders", "/v1/orders/checkout", "/v1/order"];

/// Upper bound for the cart debounce window.
const MAX_CART_DEBOUNCE_MS: u64 = 5_000;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let env = parse_environment(&or_default("SHOPFRONT_ENV", "development"))?;

    let api_base_url = require("SHOPFRONT_API_BASE_URL")?;
    if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
        return Err(ConfigError::InvalidEnvVar {
            var: "SHOPFRONT_API_BASE_URL".to_string(),
            reason: format!("expected an http(s) URL, got \"{api_base_url}\""),
        });
    }
    let api_prefix = normalize_prefix(&or_default("SHOPFRONT_API_PREFIX", "/api"));
    let log_level = or_default("SHOPFRONT_LOG_LEVEL", "info");
    let auth_token = lookup("SHOPFRONT_AUTH_TOKEN")
        .ok()
        .filter(|t| !t.trim().is_empty());

    let request_timeout_ms = parse_u64("SHOPFRONT_REQUEST_TIMEOUT_MS", "12000")?;
    if request_timeout_ms == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "SHOPFRONT_REQUEST_TIMEOUT_MS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    let user_agent = or_default("SHOPFRONT_USER_AGENT", "shopfront/0.1 (storefront-client)");

    let cart_debounce_ms = parse_u64("SHOPFRONT_CART_DEBOUNCE_MS", "350")?;
    if cart_debounce_ms == 0 || cart_debounce_ms > MAX_CART_DEBOUNCE_MS {
        return Err(ConfigError::InvalidEnvVar {
            var: "SHOPFRONT_CART_DEBOUNCE_MS".to_string(),
            reason: format!("must be between 1 and {MAX_CART_DEBOUNCE_MS}"),
        });
    }
    let cart_failure_policy =
        parse_failure_policy(&or_default("SHOPFRONT_CART_FAILURE_POLICY", "keep"))?;

    let order_create_endpoints = lookup("SHOPFRONT_ORDER_CREATE_ENDPOINTS").map_or_else(
        |_| {
            DEFAULT_ORDER_CREATE_ENDPOINTS
                .iter()
                .map(|s| (*s).to_string())
                .collect()
        },
        |raw| parse_endpoint_list(&raw),
    );
    if order_create_endpoints.is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "SHOPFRONT_ORDER_CREATE_ENDPOINTS".to_string(),
            reason: "must list at least one path".to_string(),
        });
    }

    Ok(AppConfig {
        env,
        api_base_url,
        api_prefix,
        log_level,
        auth_token,
        request_timeout_ms,
        user_agent,
        cart_debounce_ms,
        cart_failure_policy,
        order_create_endpoints,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for unrecognized values.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "SHOPFRONT_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

fn parse_failure_policy(s: &str) -> Result<CartFailurePolicy, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "keep" => Ok(CartFailurePolicy::KeepOptimistic),
        "revert" => Ok(CartFailurePolicy::RevertToConfirmed),
        other => Err(ConfigError::InvalidEnvVar {
            var: "SHOPFRONT_CART_FAILURE_POLICY".to_string(),
            reason: format!("expected \"keep\" or \"revert\", got \"{other}\""),
        }),
    }
}

/// `"api/"` → `"/api"`, `""` → `""`.
fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

/// Splits a comma-separated path list, dropping blanks and ensuring each
/// entry starts with `/`.
fn parse_endpoint_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            if s.starts_with('/') {
                s.to_string()
            } else {
                format!("/{s}")
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
