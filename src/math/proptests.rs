//! Property-based tests for fixed-point arithmetic
//!
//! Tests for:
//! - Scaling: trailing zeros never change a product
//! - Truncation: `mul_ratio` never exceeds the exact rational product
//! - Bounds: ratios in [0, 1] never grow an amount

use super::amount::Amount;
use super::decimal::{decimal_count, mul_ratio, str_to_scaled_int};
use proptest::prelude::*;

fn ratio_literal() -> impl Strategy<Value = String> {
    (0u64..=1_000_000_000_000_000_000, 0usize..=18).prop_map(|(digits, scale)| {
        let digits = digits % 10u64.pow(scale as u32).max(1);
        if scale == 0 {
            "0".to_string()
        } else {
            format!("0.{:0width$}", digits, width = scale)
        }
    })
}

proptest! {
    /// Property: padding a ratio with trailing zeros leaves every product unchanged
    #[test]
    fn trailing_zeros_are_insignificant(
        x in any::<u64>(),
        ratio in ratio_literal(),
        pad in 1usize..10,
    ) {
        let amount = Amount::from(x);
        let padded = if ratio.contains('.') {
            format!("{}{}", ratio, "0".repeat(pad))
        } else {
            format!("{}.{}", ratio, "0".repeat(pad))
        };

        prop_assert_eq!(
            mul_ratio(&amount, &ratio).unwrap(),
            mul_ratio(&amount, &padded).unwrap()
        );
    }

    /// Property: result * 10^n <= x * scaled < (result + 1) * 10^n
    #[test]
    fn mul_ratio_truncates_toward_zero(
        x in any::<u64>(),
        ratio in ratio_literal(),
    ) {
        let amount = Amount::from(x);
        let scale = decimal_count(&ratio);
        let scaled = str_to_scaled_int(&ratio, scale).unwrap();
        let exact = &amount * &scaled;
        let divisor = Amount::pow10(scale);

        let result = mul_ratio(&amount, &ratio).unwrap();

        prop_assert!(&result * &divisor <= exact);
        let next = &result + &Amount::from(1);
        prop_assert!(&next * &divisor > exact);
    }

    /// Property: multiplying by a fraction in [0, 1] never increases an amount
    #[test]
    fn fractions_never_grow_amounts(
        x in any::<u64>(),
        ratio in ratio_literal(),
    ) {
        let amount = Amount::from(x);
        prop_assert!(mul_ratio(&amount, &ratio).unwrap() <= amount);
    }

    /// Property: repeated evaluation is deterministic
    #[test]
    fn mul_ratio_is_deterministic(
        x in any::<u64>(),
        ratio in ratio_literal(),
    ) {
        let amount = Amount::from(x);
        let first = mul_ratio(&amount, &ratio).unwrap();
        for _ in 0..3 {
            prop_assert_eq!(&mul_ratio(&amount, &ratio).unwrap(), &first);
        }
    }
}
