//! Money parsing and display formatting.
//!
//! Amounts are stored and computed as whole-unit integers. At the API
//! boundary they may arrive with display formatting ("$2.500"), which is
//! stripped before parsing, and are rendered back with a dollar sign and
//! thousands separators, Chilean style ("$2.500", no decimals).

use std::sync::OnceLock;

use numfmt::{Formatter, Precision};

use crate::Error;

/// Render a whole-unit amount for display, e.g. `2500` becomes `"$2.500"`.
pub fn format_money(amount: i64) -> String {
    static FMT: OnceLock<Formatter> = OnceLock::new();

    let fmt = FMT.get_or_init(|| {
        Formatter::currency("$")
            .unwrap()
            .separator('.')
            .unwrap()
            .precision(Precision::Decimals(0))
    });

    // Zero is hardcoded as "0", so we must specify the formatted string for zero
    if amount == 0 {
        return "$0".to_owned();
    }

    fmt.fmt_string(amount as f64)
}

/// Parse a positive whole-unit amount from client input.
///
/// All characters other than digits and the minus sign are stripped first so
/// that locale-formatted values such as "$2.500" or "1,000" parse to their
/// raw integer value.
///
/// # Errors
/// Returns [Error::InvalidAmount] if no digits remain or the result is not
/// strictly positive.
pub fn parse_money(text: &str) -> Result<i64, Error> {
    let digits: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-')
        .collect();

    if digits.is_empty() {
        return Err(Error::InvalidAmount);
    }

    let amount: i64 = digits.parse().map_err(|_| Error::InvalidAmount)?;

    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }

    Ok(amount)
}
