//! Fixed-point math utilities for deterministic economy arithmetic.
//!
//! Resource stocks, hourly rates and costs are all fixed-point so a catch-up
//! pass produces bit-identical results on every platform, no matter how the
//! elapsed time is split between observations.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all economy math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
/// Range: approximately -2,147,483,648 to 2,147,483,647
/// Precision: approximately 0.00000000023
pub type Fixed = I32F32;

/// Milliseconds in one hour, the unit production rates are expressed in.
pub const MILLIS_PER_HOUR: u64 = 3_600_000;

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// Exact growth factor `num / den` applied once per level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ratio {
    /// Numerator.
    pub num: u32,
    /// Denominator (never zero).
    pub den: u32,
}

impl Ratio {
    /// Create a new ratio.
    #[must_use]
    pub const fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }

    /// 1.05
    pub const ONE_POINT_OH_FIVE: Self = Self::new(21, 20);
    /// 1.1
    pub const ONE_POINT_ONE: Self = Self::new(11, 10);
    /// 1.5
    pub const ONE_POINT_FIVE: Self = Self::new(3, 2);
    /// 1.6
    pub const ONE_POINT_SIX: Self = Self::new(8, 5);
    /// 1.8
    pub const ONE_POINT_EIGHT: Self = Self::new(9, 5);
    /// 2
    pub const TWO: Self = Self::new(2, 1);
    /// 5
    pub const FIVE: Self = Self::new(5, 1);
}

/// Apply `ratio` to `base` `steps` times, saturating at [`Fixed::MAX`].
///
/// Each step multiplies by the numerator, then divides by the denominator,
/// so rounding is identical on every platform.
#[must_use]
pub fn compound(base: Fixed, ratio: Ratio, steps: u32) -> Fixed {
    let mut value = base;
    for _ in 0..steps {
        match value.checked_mul_int(i64::from(ratio.num)) {
            Some(scaled) => value = scaled / i64::from(ratio.den),
            None => return Fixed::MAX,
        }
    }
    value
}

/// Exact `floor(base * ratio^level)` as a whole number, saturating at the
/// integer range of [`Fixed`].
///
/// Only meaningful for ratios of at least 1.5: an overflowing power of the
/// numerator then implies the result is past the saturation point anyway.
#[must_use]
pub fn exact_growth(base: u32, ratio: Ratio, level: u32) -> Fixed {
    let cap = u128::from(i32::MAX.unsigned_abs());
    let num = u128::from(ratio.num).checked_pow(level);
    let den = u128::from(ratio.den).checked_pow(level);
    let value = match (num, den) {
        (Some(num), Some(den)) => u128::from(base)
            .checked_mul(num)
            .map_or(cap, |scaled| scaled / den),
        _ => cap,
    };
    Fixed::from_num(value.min(cap))
}

/// Amount produced at `rate_per_hour` over `elapsed_ms`.
///
/// Computed as `floor(rate_bits * elapsed_ms / MILLIS_PER_HOUR)` in 128-bit
/// integers, so splitting an interval in two changes the sum by at most one
/// ulp. Negative rates produce nothing.
#[must_use]
pub fn produced_over(rate_per_hour: Fixed, elapsed_ms: u64) -> Fixed {
    if rate_per_hour <= Fixed::ZERO || elapsed_ms == 0 {
        return Fixed::ZERO;
    }
    let bits = i128::from(rate_per_hour.to_bits()) * i128::from(elapsed_ms)
        / i128::from(MILLIS_PER_HOUR);
    Fixed::from_bits(i64::try_from(bits).unwrap_or(i64::MAX))
}

/// Whole part of a non-negative amount, for integer duration formulas.
#[must_use]
pub fn whole(value: Fixed) -> u128 {
    if value <= Fixed::ZERO {
        0
    } else {
        value.to_num::<u128>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_determinism() {
        // Same operations must produce identical results
        let a = Fixed::from_num(1) / Fixed::from_num(3);
        let b = Fixed::from_num(1) / Fixed::from_num(3);
        assert_eq!(a, b);

        let result1 = a * Fixed::from_num(7);
        let result2 = b * Fixed::from_num(7);
        assert_eq!(result1, result2);
    }

    #[test]
    fn test_exact_growth_matches_floor() {
        // 60 * 1.5^3 = 202.5
        assert_eq!(
            exact_growth(60, Ratio::ONE_POINT_FIVE, 3),
            Fixed::from_num(202)
        );
        // 48 * 1.6^2 = 122.88
        assert_eq!(
            exact_growth(48, Ratio::ONE_POINT_SIX, 2),
            Fixed::from_num(122)
        );
        assert_eq!(exact_growth(400, Ratio::TWO, 0), Fixed::from_num(400));
    }

    #[test]
    fn test_exact_growth_saturates() {
        let huge = exact_growth(1_000_000, Ratio::TWO, 200);
        assert_eq!(huge, Fixed::from_num(i32::MAX));
    }

    #[test]
    fn test_compound_saturates_instead_of_wrapping() {
        let big = compound(Fixed::from_num(1_000_000_000), Ratio::ONE_POINT_EIGHT, 10);
        assert_eq!(big, Fixed::MAX);

        let small = compound(Fixed::from_num(1), Ratio::ONE_POINT_ONE, 2);
        // 1.21 within fixed-point rounding
        let epsilon = Fixed::from_num(1) / Fixed::from_num(10_000);
        assert!((small - Fixed::from_num(1.21)).abs() < epsilon);
    }

    #[test]
    fn test_produced_over_whole_hours() {
        let rate = Fixed::from_num(100);
        assert_eq!(produced_over(rate, 2 * MILLIS_PER_HOUR), Fixed::from_num(200));
        assert_eq!(produced_over(rate, MILLIS_PER_HOUR / 4), Fixed::from_num(25));
        assert_eq!(produced_over(Fixed::from_num(-5), MILLIS_PER_HOUR), Fixed::ZERO);
    }

    #[test]
    fn test_produced_over_split_is_within_one_ulp() {
        let rate = Fixed::from_num(137) / Fixed::from_num(7);
        let whole_interval = produced_over(rate, 1_234_567);
        let split = produced_over(rate, 1_000_001) + produced_over(rate, 234_566);
        assert!((whole_interval - split).abs() <= Fixed::DELTA);
    }
}
