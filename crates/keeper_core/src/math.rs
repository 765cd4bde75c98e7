//! Fixed-point math utilities for deterministic navigation.
//!
//! Path costs and heuristic estimates use fixed-point arithmetic so that
//! two searches over the same map always settle ties the same way,
//! regardless of the CPU the simulation happens to run on.

use fixed::types::I32F32;

/// Fixed-point number type for all cost and distance math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
/// Range: approximately -2,147,483,648 to 2,147,483,647
/// Precision: approximately 0.00000000023
pub type Fixed = I32F32;

/// Build a fixed-point constant from a decimal literal given in tenths.
///
/// `tenths(14)` is `1.4`. The result is rounded to the nearest raw bit, which
/// keeps the constant usable in `const` items.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn tenths(n: i64) -> Fixed {
    let scaled = (n as i128) << Fixed::FRAC_NBITS;
    let rounded = if scaled >= 0 {
        (scaled + 5) / 10
    } else {
        (scaled - 5) / 10
    };
    Fixed::from_bits(rounded as i64)
}

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

/// Computes the square root of a fixed-point number using binary search.
///
/// Negative inputs yield zero.
#[must_use]
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let mut low = Fixed::ZERO;
    let mut high = if value > Fixed::ONE { value } else { Fixed::ONE };

    for _ in 0..48 {
        let mid = low + (high - low) / Fixed::from_num(2);
        let mid_sq = mid.saturating_mul(mid);

        if mid_sq <= value {
            low = mid;
        } else {
            high = mid;
        }
    }

    low
}

/// Length of the vector `(dx, dy)`, rounded down to the nearest raw bit.
///
/// Computed on integers, so large offsets stay exact. Lengths past
/// [`Fixed::MAX`] saturate.
#[must_use]
pub fn hypot(dx: u32, dy: u32) -> Fixed {
    let squared = u128::from(dx) * u128::from(dx) + u128::from(dy) * u128::from(dy);
    // sqrt(2^62) = 2^31 is already out of range
    if squared >= 1 << 62 {
        return Fixed::MAX;
    }
    let bits = isqrt(squared << (2 * Fixed::FRAC_NBITS));
    i64::try_from(bits).map_or(Fixed::MAX, Fixed::from_bits)
}

fn isqrt(value: u128) -> u128 {
    let mut rest = value;
    let mut root = 0_u128;
    let mut bit = 1_u128 << 126;
    while bit > rest {
        bit >>= 2;
    }
    while bit != 0 {
        if rest >= root + bit {
            rest -= root + bit;
            root = (root >> 1) + bit;
        } else {
            root >>= 1;
        }
        bit >>= 2;
    }
    root
}
