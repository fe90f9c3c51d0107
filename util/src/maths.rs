//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Clamp a value into the symmetric range `[-limit, limit]`.
///
/// A negative limit is treated as its magnitude. `NaN` values are passed through unchanged.
pub fn clamp_sym<T>(value: T, limit: T) -> T 
where
    T: Float
{
    let limit = limit.abs();

    if value > limit {
        limit
    }
    else if value < -limit {
        -limit
    }
    else {
        value
    }
}

/// Get the signed angular distance from `a` to `b` in degrees.
///
/// This function will return the shortest signed distance between a and b accounting for wrapping
/// between 0 and 360, in the range `(-180, 180]`.
pub fn get_ang_dist_360<T>(a: T, b: T) -> T
where
    T: Float
{
    let full: T = T::from(360.0).unwrap_or_else(T::max_value);
    
    let c = rem_euclid(a - b, full);
    let d = rem_euclid(b - a, full);

    if c < d {
        -c
    }
    else {
        d
    }
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
