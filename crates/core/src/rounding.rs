//! Snapping obfuscated results onto a rounding grid.

/// Round `value` to the nearest multiple of `step`, ties away from zero.
///
/// The quotient saturates at the largest multiple of `step` representable as
/// an `i64`, so the result is always divisible by `step`. A NaN input rounds
/// to zero.
///
/// `step` must be positive; configurations are validated before reaching here.
pub fn round_to(value: f64, step: i64) -> i64 {
    debug_assert!(step > 0, "rounding step must be positive");
    let quotient = (value / step as f64).round() as i64;
    quotient.clamp(i64::MIN / step, i64::MAX / step) * step
}

/// Round to the nearest multiple of `step` and floor negative results at zero.
pub fn round_non_negative(value: f64, step: i64) -> i64 {
    round_to(value, step).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ties_round_away_from_zero() {
        assert_eq!(round_to(2.5, 1), 3);
        assert_eq!(round_to(-2.5, 1), -3);
        assert_eq!(round_to(7.5, 5), 10);
        assert_eq!(round_to(-7.5, 5), -10);
        assert_eq!(round_to(12.4, 5), 10);
        assert_eq!(round_to(0.49, 1), 0);
    }

    #[test]
    fn extremes_saturate_on_grid() {
        assert_eq!(round_to(f64::INFINITY, 7), (i64::MAX / 7) * 7);
        assert_eq!(round_to(f64::NEG_INFINITY, 7), (i64::MIN / 7) * 7);
        assert_eq!(round_to(1e300, 1), i64::MAX);
        assert_eq!(round_to(f64::NAN, 3), 0);
    }

    #[test]
    fn negatives_floor_at_zero() {
        assert_eq!(round_non_negative(-0.4, 1), 0);
        assert_eq!(round_non_negative(-1234.0, 10), 0);
        assert_eq!(round_non_negative(14.0, 10), 10);
        assert_eq!(round_non_negative(15.0, 10), 20);
    }

    proptest! {
        #[test]
        fn prop_result_is_multiple_of_step(
            value in -1e12f64..1e12,
            step in 1i64..100_000,
        ) {
            let rounded = round_to(value, step);
            prop_assert_eq!(rounded % step, 0);
            prop_assert!((rounded as f64 - value).abs() <= step as f64 / 2.0 + 1e-3);
        }
    }
}
