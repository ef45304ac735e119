//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;
use std::f64::consts::PI;
use thiserror::Error;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised by the maths utilities.
#[derive(Debug, Error, PartialEq)]
pub enum MathsError {
    #[error("Minimum bound ({min}) cannot be greater than maximum bound ({max})")]
    InvalidBounds { min: f64, max: f64 },
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Wrap an angle in radians into the range (-pi, pi].
///
/// Angles already inside the range are returned untouched so that wrapping is
/// idempotent.
pub fn wrap_to_pi(angle_rad: f64) -> f64 {
    if angle_rad > -PI && angle_rad <= PI {
        return angle_rad;
    }

    let wrapped = angle_rad.sin().atan2(angle_rad.cos());

    // atan2 can land on -pi exactly, which is outside the half-open range
    if wrapped <= -PI {
        PI
    }
    else {
        wrapped
    }
}

/// Offset an angle in degrees and reduce the result into (-180, 180].
///
/// This matches the convention used by inertial sensors, so a heading read
/// from an IMU can be shifted by the starting heading of the robot.
pub fn shift_deg(angle_deg: f64, offset_deg: f64) -> f64 {
    let shifted = rem_euclid(angle_deg + offset_deg + 180.0, 360.0) - 180.0;

    if shifted <= -180.0 {
        shifted + 360.0
    }
    else {
        shifted
    }
}

/// Numerically stable length of the hypotenuse of a right triangle.
pub fn hypot<T>(x: T, y: T) -> T
where
    T: Float
{
    x.hypot(y)
}

/// Check if `value` lies within `[min, max]` (inclusive).
pub fn in_range<T>(min: T, max: T, value: T) -> bool
where
    T: Float
{
    min <= value && value <= max
}

/// Clamp a value into `[min, max]`.
///
/// Returns an error if the bounds are inverted.
pub fn clamp<T>(min: T, max: T, value: T) -> Result<T, MathsError>
where
    T: Float
{
    if min > max {
        return Err(MathsError::InvalidBounds {
            min: min.to_f64().unwrap_or(f64::NAN),
            max: max.to_f64().unwrap_or(f64::NAN)
        })
    }

    Ok(value.max(min).min(max))
}

/// Sign of a value, with zero counted as positive.
pub fn sgn<T>(value: T) -> T
where
    T: Float
{
    if value < T::zero() {
        -T::one()
    }
    else {
        T::one()
    }
}

/// Check if two values are within `epsilon` of each other.
pub fn epsilon_equal<T>(a: T, b: T, epsilon: T) -> bool
where
    T: Float
{
    (a - b).abs() < epsilon
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
