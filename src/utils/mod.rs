//! Utility functions for formatting money and percentages
//!
//! Centralized so tables, summaries and exports display values the same way.

use rust_decimal::Decimal;

/// Default currency symbol when the configuration sets none
pub const DEFAULT_CURRENCY_SYMBOL: &str = "$";

/// Core formatting function with full control over output.
///
/// Formats a Decimal value with `,` thousands separators and a `.` decimal
/// separator, two decimal places, sign before the symbol.
///
/// # Examples
/// ```
/// use rentbook::utils::format_money_with_width;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_money_with_width(dec!(1234.56), 0, "$"), "$1,234.56");
/// assert_eq!(format_money_with_width(dec!(-5), 8, ""), "   -5.00");
/// ```
pub fn format_money_with_width(value: Decimal, width: usize, symbol: &str) -> String {
    let is_negative = value < Decimal::ZERO;
    let formatted = format!("{:.2}", value.abs());
    let (integer_part, decimal_part) = formatted
        .split_once('.')
        .unwrap_or((formatted.as_str(), "00"));

    let mut with_separators = String::with_capacity(integer_part.len() + integer_part.len() / 3);
    for (i, c) in integer_part.chars().enumerate() {
        if i > 0 && (integer_part.len() - i) % 3 == 0 {
            with_separators.push(',');
        }
        with_separators.push(c);
    }

    // -0.00 after rounding prints without a sign
    let sign = if is_negative && formatted != "0.00" {
        "-"
    } else {
        ""
    };
    let result = format!("{}{}{}.{}", sign, symbol, with_separators, decimal_part);

    if width > 0 && result.chars().count() < width {
        format!("{:>width$}", result, width = width)
    } else {
        result
    }
}

/// Format with the default symbol: "$1,234.56"
///
/// # Examples
/// ```
/// use rentbook::utils::format_currency;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_currency(dec!(1234.56)), "$1,234.56");
/// assert_eq!(format_currency(dec!(-500)), "-$500.00");
/// ```
pub fn format_currency(value: Decimal) -> String {
    format_money_with_width(value, 0, DEFAULT_CURRENCY_SYMBOL)
}

/// Format with a custom symbol ("€", "£", "R$ ", ...)
pub fn format_currency_with(value: Decimal, symbol: &str) -> String {
    format_money_with_width(value, 0, symbol)
}

/// Format a percentage value: "12.50%"
pub fn format_percent(value: Decimal) -> String {
    format!("{:.2}%", value)
}
