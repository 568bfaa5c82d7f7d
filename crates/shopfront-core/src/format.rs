//! Display formatting for prices.

use rust_decimal::{Decimal, RoundingStrategy};

/// Currency suffix used by the storefront.
pub const CURRENCY_SUFFIX: &str = "đ";

/// Formats an amount as whole currency units with `.` thousands separators,
/// e.g. `1234567` → `"1.234.567đ"`.
#[must_use]
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let digits = rounded.abs().trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}{CURRENCY_SUFFIX}")
}
