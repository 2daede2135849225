//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::{Float, FloatConst};

/// Clamp a value into the inclusive range `[min, max]`.
///
/// Unlike `f64::clamp` this does not panic if `min > max`, the max bound wins
/// in that case.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float
{
    let mut ret = value;

    if ret < min {
        ret = min
    }
    if ret > max {
        ret = max
    }

    ret
}

/// Normalise an angle into the range (-pi, pi].
pub fn norm_angle<T>(angle: T) -> T
where
    T: Float + FloatConst
{
    let pi_t = T::PI();
    let tau_t = pi_t + pi_t;

    // Shift into [0, 2pi), then back so that -pi maps onto +pi
    let a = rem_euclid(pi_t - angle, tau_t);
    pi_t - a
}

/// Get the shortest signed angular distance going from `from` to `to`.
///
/// The result is in (-pi, pi], so that heading comparisons are correct across
/// the +/- pi wrap.
pub fn get_ang_dist<T>(from: T, to: T) -> T
where
    T: Float + FloatConst
{
    norm_angle(to - from)
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

#[cfg(test)]
mod test {
    use super::*;

    const PI: f64 = std::f64::consts::PI;
    const TAU: f64 = std::f64::consts::TAU;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_norm_angle() {
        assert!(close(norm_angle(0.0), 0.0));
        assert!(close(norm_angle(PI), PI));
        assert!(close(norm_angle(-PI), PI));
        assert!(close(norm_angle(TAU), 0.0));
        assert!(close(norm_angle(3.0 * PI / 2.0), -PI / 2.0));
        assert!(close(norm_angle(-3.0 * PI / 2.0), PI / 2.0));
        assert!(close(norm_angle(7.0 * TAU + 0.5), 0.5));
    }

    #[test]
    fn test_get_ang_dist() {
        assert!(close(get_ang_dist(1.0, 2.0), 1.0));
        assert!(close(get_ang_dist(2.0, 1.0), -1.0));

        // Across the wrap the short way round must be taken
        assert!(close(get_ang_dist(PI - 0.1, -PI + 0.1), 0.2));
        assert!(close(get_ang_dist(-PI + 0.1, PI - 0.1), -0.2));
        assert!(close(get_ang_dist(0.0, TAU), 0.0));
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(5.0, 0.0, 1.0), 1.0);
        assert_eq!(clamp(-5.0, 0.0, 1.0), 0.0);
        assert_eq!(clamp(0.5, 0.0, 1.0), 0.5);
        assert_eq!(clamp(0.5, 1.0, 0.0), 0.0);
    }
}
