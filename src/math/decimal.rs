//! Decimal-string ratios as scaled integers.
//!
//! Governance ratios (`quorum`, `threshold`, `veto_threshold`, vote weights)
//! travel as decimal strings such as `"0.334000000000000000"`. They are never
//! parsed into floating point. A ratio `r` with `n` significant fractional
//! digits becomes the integer `r * 10^n`, and `x * r` is evaluated as
//! `(x * (r * 10^n)) / 10^n` with truncating division.
//!
//! The scale `n` is derived from each literal by [`decimal_count`] rather than
//! fixed protocol-wide. Trailing zeros are not significant, so `"0.5"`,
//! `"0.50"` and `"0.500000000000000000"` all produce identical products.

use thiserror::Error;

use super::amount::Amount;

/// Decimal parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecimalError {
    /// Not a non-negative base-10 integer.
    #[error("invalid integer: {0:?}")]
    InvalidInteger(String),

    /// Not a non-negative decimal literal (`digits[.digits]`).
    #[error("invalid decimal: {0:?}")]
    InvalidDecimal(String),

    /// A ratio that must lie in `[0, 1]` does not.
    #[error("decimal out of range [0, 1]: {0}")]
    OutOfRange(String),
}

/// Number of significant digits after the decimal point.
///
/// `"0.5000"` → 1, `"0.334"` → 3, `"1"` → 0, `"2.000"` → 0.
pub fn decimal_count(value: &str) -> usize {
    match value.split_once('.') {
        Some((_, frac)) => frac.trim_end_matches('0').len(),
        None => 0,
    }
}

/// Parse `value` into the integer `value * 10^scale`, truncating any digits
/// beyond `scale` and padding with zeros when the literal has fewer.
pub fn str_to_scaled_int(value: &str, scale: usize) -> Result<Amount, DecimalError> {
    let (int_part, frac_part) = split_literal(value)?;

    let mut digits = String::with_capacity(int_part.len() + scale);
    digits.push_str(int_part);
    for i in 0..scale {
        digits.push(frac_part.as_bytes().get(i).map_or('0', |b| *b as char));
    }

    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        return Ok(Amount::zero());
    }
    trimmed
        .parse()
        .map_err(|_| DecimalError::InvalidDecimal(value.to_string()))
}

/// `amount * ratio`, truncated toward zero, at the ratio's own scale.
pub fn mul_ratio(amount: &Amount, ratio: &str) -> Result<Amount, DecimalError> {
    let scale = decimal_count(ratio);
    let scaled = str_to_scaled_int(ratio, scale)?;
    Ok(&(amount * &scaled) / &Amount::pow10(scale))
}

/// Check that `value` is a decimal literal in `[0, 1]`.
pub fn validate_fraction(value: &str) -> Result<(), DecimalError> {
    let scale = decimal_count(value);
    let scaled = str_to_scaled_int(value, scale)?;
    if scaled > Amount::pow10(scale) {
        return Err(DecimalError::OutOfRange(value.to_string()));
    }
    Ok(())
}

fn split_literal(value: &str) -> Result<(&str, &str), DecimalError> {
    let (int_part, frac_part) = match value.split_once('.') {
        Some((i, f)) => (i, f),
        None => (value, ""),
    };

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty())
        || !all_digits(int_part)
        || !all_digits(frac_part)
    {
        return Err(DecimalError::InvalidDecimal(value.to_string()));
    }
    Ok((int_part, frac_part))
}
