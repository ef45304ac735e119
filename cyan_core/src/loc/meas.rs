//! Measurement providers
//!
//! Each estimator reads the host's sensors through a record of closures, one
//! per channel. Encoder channels return cumulative ticks, heading channels
//! return degrees as reported by the inertial sensor. Estimators pull every
//! channel once per update and never cache readings beyond that.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::LocError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single sensor channel.
pub type Channel = Box<dyn Fn() -> f64>;

/// Differential drive with an inertial sensor.
pub struct GyroTankMeasurements {
    pub left_ticks: Channel,
    pub right_ticks: Channel,
    pub heading_deg: Channel,
    pub ticks_to_distance: f64,
}

/// Differential drive from encoders alone.
pub struct TankMeasurements {
    pub left_ticks: Channel,
    pub right_ticks: Channel,
    pub ticks_to_distance: f64,
}

/// Two parallel dead wheels and one perpendicular dead wheel.
pub struct ThreeDeadWheelMeasurements {
    pub perp_ticks: Channel,
    pub left_parallel_ticks: Channel,
    pub right_parallel_ticks: Channel,
    pub ticks_to_distance: f64,
}

/// One parallel and one perpendicular dead wheel plus an inertial sensor.
pub struct TwoDeadWheelMeasurements {
    pub perp_ticks: Channel,
    pub parallel_ticks: Channel,
    pub heading_deg: Channel,
    pub ticks_to_distance: f64,
}

/// Four mecanum wheel encoders.
pub struct MecanumMeasurements {
    pub lf_ticks: Channel,
    pub rf_ticks: Channel,
    pub lb_ticks: Channel,
    pub rb_ticks: Channel,
    pub ticks_to_distance: f64,
}

/// An odometry computer reporting an absolute position, already in the
/// estimator's unit, and a heading in degrees.
pub struct AbsoluteMeasurements {
    pub x: Channel,
    pub y: Channel,
    pub heading_deg: Channel,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Any of the measurement records, used when the estimator kind is chosen at
/// run time.
pub enum Measurements {
    GyroTank(GyroTankMeasurements),
    Tank(TankMeasurements),
    ThreeDeadWheel(ThreeDeadWheelMeasurements),
    TwoDeadWheel(TwoDeadWheelMeasurements),
    Mecanum(MecanumMeasurements),
    Absolute(AbsoluteMeasurements),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Measurements {
    /// Name of the estimator kind these measurements feed.
    pub fn kind(&self) -> &'static str {
        match self {
            Measurements::GyroTank(_) => "gyro_tank",
            Measurements::Tank(_) => "tank",
            Measurements::ThreeDeadWheel(_) => "three_dead_wheel",
            Measurements::TwoDeadWheel(_) => "two_dead_wheel",
            Measurements::Mecanum(_) => "mecanum",
            Measurements::Absolute(_) => "absolute",
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Read a channel, rejecting non-finite values.
pub(crate) fn read(name: &'static str, channel: &Channel) -> Result<f64, LocError> {
    let value = channel();

    if value.is_finite() {
        Ok(value)
    }
    else {
        Err(LocError::NonFiniteMeasurement { channel: name, value })
    }
}

/// Read an encoder channel and convert it into a distance.
pub(crate) fn read_distance(
    name: &'static str,
    channel: &Channel,
    ticks_to_distance: f64
) -> Result<f64, LocError> {
    Ok(read(name, channel)? * ticks_to_distance)
}

/// Check a conversion factor can turn ticks into a meaningful distance.
pub(crate) fn check_ticks_to_distance(ticks_to_distance: f64) -> Result<f64, LocError> {
    if ticks_to_distance.is_finite() && ticks_to_distance != 0.0 {
        Ok(ticks_to_distance)
    }
    else {
        Err(LocError::InvalidGeometry {
            name: "ticks_to_distance",
            value: ticks_to_distance,
        })
    }
}
