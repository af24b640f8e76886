//! Fixed-point arithmetic for tallies and governance ratios.
//!
//! No floating point anywhere: every replica must produce bit-identical
//! tallies from the same inputs.

pub mod amount;
pub mod decimal;

#[cfg(test)]
mod proptests;

pub use amount::Amount;
pub use decimal::{decimal_count, mul_ratio, str_to_scaled_int, validate_fraction, DecimalError};
