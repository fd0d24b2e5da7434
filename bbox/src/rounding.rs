//! Deterministic integer rounding used by coordinate conversion.
//!
//! All conversions round half away from zero. Operands are non-negative, so
//! this is the same as rounding half up, and it is computed exactly in
//! integer arithmetic so that repeated conversions never drift.

use crate::common::*;

/// Computes `round(numer / denom)` with ties rounded away from zero.
pub fn div_round(numer: u64, denom: NonZeroU64) -> u64 {
    let denom = denom.get();
    let quot = numer / denom;
    let rem = numer % denom;
    // rem >= denom / 2 without losing the half for odd denominators
    if rem >= denom - rem {
        quot + 1
    } else {
        quot
    }
}

/// Rounds a non-negative float to the nearest integer in `[0, max]`, ties away from zero.
///
/// NaN and negative values map to zero.
pub fn round_f64(value: f64, max: u32) -> u32 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    value.round().min(max as f64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn div(numer: u64, denom: u64) -> u64 {
        div_round(numer, NonZeroU64::new(denom).unwrap())
    }

    #[test]
    fn ties_round_away_from_zero() {
        assert_eq!(div(5, 2), 3);
        assert_eq!(div(7, 2), 4);
        assert_eq!(div(3, 2), 2);
        assert_eq!(div(1, 2), 1);
        assert_eq!(div(4, 3), 1);
        assert_eq!(div(5, 3), 2);
        assert_eq!(div(0, 7), 0);
        assert_eq!(div(u64::MAX, 1), u64::MAX);
    }

    #[test]
    fn float_rounding() {
        assert_eq!(round_f64(2.5, 100), 3);
        assert_eq!(round_f64(3.5, 100), 4);
        assert_eq!(round_f64(2.49, 100), 2);
        assert_eq!(round_f64(-4.0, 100), 0);
        assert_eq!(round_f64(f64::NAN, 100), 0);
        assert_eq!(round_f64(f64::INFINITY, 100), 100);
        assert_eq!(round_f64(250.0, 100), 100);
    }
}
