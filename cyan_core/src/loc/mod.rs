//! # Localisation module
//!
//! Pose estimators for each supported chassis. Every estimator pulls fresh
//! readings from its measurement provider when [`PoseProvider::update`] is
//! called and integrates them into a continuous [`Pose2D`] estimate, in the
//! same unit as the distances its encoders report.
//!
//! Calling `update` twice in one control cycle is harmless, as the second call
//! sees zero deltas.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod absolute;
mod dead_wheel;
mod mecanum;
pub mod meas;
mod tank;

pub use absolute::AbsoluteLocalizer;
pub use dead_wheel::{ThreeDeadWheel, TwoDeadWheel};
pub use mecanum::MecanumKinematics;
pub use meas::Measurements;
pub use tank::{GyroTank, TankKinematics};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use crate::debug::{DebugLogger, Debuggable};
use crate::geom::{GeomError, Pose2D};
use util::maths::shift_deg;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Anything which can estimate the pose of the robot.
pub trait PoseProvider {
    /// The latest pose estimate.
    fn pose(&self) -> Pose2D;

    /// Read the measurement provider and integrate the new readings.
    ///
    /// On error the pose is left unchanged.
    fn update(&mut self) -> Result<(), LocError>;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for building a pose estimator.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    /// Pose of the robot when the estimator is created.
    ///
    /// For estimators with an inertial sensor the heading of this pose is
    /// used as the sensor's heading offset.
    pub start_pose: Pose2D,

    /// Conversion from encoder ticks to distance, ignored by the absolute
    /// localiser.
    #[serde(default = "default_ticks_to_distance")]
    pub ticks_to_distance: f64,

    /// Chassis type and its geometry
    pub chassis: ChassisGeometry,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Chassis type and geometry, as given in the parameter file.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChassisGeometry {
    GyroTank,
    Tank { track_width: f64 },
    ThreeDeadWheel { encoder_width: f64 },
    TwoDeadWheel,
    Mecanum { track_width: f64 },
    Absolute,
}

/// A pose estimator of any supported kind.
pub enum PoseEstimator {
    GyroTank(GyroTank),
    TankKinematics(TankKinematics),
    ThreeDeadWheel(ThreeDeadWheel),
    TwoDeadWheel(TwoDeadWheel),
    Mecanum(MecanumKinematics),
    Absolute(AbsoluteLocalizer),
}

/// Possible errors raised by the estimators.
#[derive(Debug, thiserror::Error)]
pub enum LocError {
    #[error("Measurement channel {channel} returned a non-finite value ({value})")]
    NonFiniteMeasurement { channel: &'static str, value: f64 },

    #[error("Invalid chassis geometry: {name} = {value}")]
    InvalidGeometry { name: &'static str, value: f64 },

    #[error("A {params} chassis cannot be built from {meas} measurements")]
    MeasurementMismatch { params: &'static str, meas: &'static str },

    #[error("Geometry error: {0}")]
    Geom(#[from] GeomError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ChassisGeometry {
    pub fn kind(&self) -> &'static str {
        match self {
            ChassisGeometry::GyroTank => "gyro_tank",
            ChassisGeometry::Tank { .. } => "tank",
            ChassisGeometry::ThreeDeadWheel { .. } => "three_dead_wheel",
            ChassisGeometry::TwoDeadWheel => "two_dead_wheel",
            ChassisGeometry::Mecanum { .. } => "mecanum",
            ChassisGeometry::Absolute => "absolute",
        }
    }
}

impl PoseEstimator {
    /// Build the estimator described by `params`, reading from `meas`.
    ///
    /// The parameter file's `ticks_to_distance` replaces the one in `meas`.
    pub fn from_params(params: &Params, meas: Measurements) -> Result<Self, LocError> {
        let start = params.start_pose;
        let offset_deg = start.heading_rad().to_degrees();
        let k = params.ticks_to_distance;

        let est = match (&params.chassis, meas) {
            (ChassisGeometry::GyroTank, Measurements::GyroTank(mut m)) => {
                m.ticks_to_distance = k;
                PoseEstimator::GyroTank(GyroTank::new(start.position(), offset_deg, m)?)
            },
            (ChassisGeometry::Tank { track_width }, Measurements::Tank(mut m)) => {
                m.ticks_to_distance = k;
                PoseEstimator::TankKinematics(TankKinematics::new(start, *track_width, m)?)
            },
            (
                ChassisGeometry::ThreeDeadWheel { encoder_width },
                Measurements::ThreeDeadWheel(mut m)
            ) => {
                m.ticks_to_distance = k;
                PoseEstimator::ThreeDeadWheel(ThreeDeadWheel::new(start, *encoder_width, m)?)
            },
            (ChassisGeometry::TwoDeadWheel, Measurements::TwoDeadWheel(mut m)) => {
                m.ticks_to_distance = k;
                PoseEstimator::TwoDeadWheel(TwoDeadWheel::new(start.position(), offset_deg, m)?)
            },
            (ChassisGeometry::Mecanum { track_width }, Measurements::Mecanum(mut m)) => {
                m.ticks_to_distance = k;
                PoseEstimator::Mecanum(MecanumKinematics::new(start, *track_width, m)?)
            },
            (ChassisGeometry::Absolute, Measurements::Absolute(m)) => {
                PoseEstimator::Absolute(AbsoluteLocalizer::new(start.position(), offset_deg, m)?)
            },
            (chassis, meas) => return Err(LocError::MeasurementMismatch {
                params: chassis.kind(),
                meas: meas.kind(),
            })
        };

        Ok(est)
    }
}

impl PoseProvider for PoseEstimator {
    fn pose(&self) -> Pose2D {
        match self {
            PoseEstimator::GyroTank(e) => e.pose(),
            PoseEstimator::TankKinematics(e) => e.pose(),
            PoseEstimator::ThreeDeadWheel(e) => e.pose(),
            PoseEstimator::TwoDeadWheel(e) => e.pose(),
            PoseEstimator::Mecanum(e) => e.pose(),
            PoseEstimator::Absolute(e) => e.pose(),
        }
    }

    fn update(&mut self) -> Result<(), LocError> {
        match self {
            PoseEstimator::GyroTank(e) => e.update(),
            PoseEstimator::TankKinematics(e) => e.update(),
            PoseEstimator::ThreeDeadWheel(e) => e.update(),
            PoseEstimator::TwoDeadWheel(e) => e.update(),
            PoseEstimator::Mecanum(e) => e.update(),
            PoseEstimator::Absolute(e) => e.update(),
        }
    }
}

impl Debuggable for PoseEstimator {
    fn debug(&self, logger: &mut DebugLogger) {
        match self {
            PoseEstimator::GyroTank(e) => e.debug(logger),
            PoseEstimator::TankKinematics(e) => e.debug(logger),
            PoseEstimator::ThreeDeadWheel(e) => e.debug(logger),
            PoseEstimator::TwoDeadWheel(e) => e.debug(logger),
            PoseEstimator::Mecanum(e) => e.debug(logger),
            PoseEstimator::Absolute(e) => e.debug(logger),
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn default_ticks_to_distance() -> f64 {
    1.0
}

/// Check a chassis width is finite and positive.
fn check_width(name: &'static str, value: f64) -> Result<f64, LocError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    }
    else {
        Err(LocError::InvalidGeometry { name, value })
    }
}

/// Heading in radians from an inertial sensor reading and offset in degrees.
fn heading_from_imu(reading_deg: f64, offset_deg: f64) -> Result<f64, LocError> {
    if !offset_deg.is_finite() {
        return Err(LocError::InvalidGeometry {
            name: "heading_offset_deg",
            value: offset_deg,
        });
    }

    Ok(shift_deg(reading_deg, offset_deg).to_radians())
}

/// Push the standard pose packets into a debug logger.
fn debug_pose(pose: &Pose2D, logger: &mut DebugLogger) {
    logger.log_value("robotX", pose.x());
    logger.log_value("robotY", pose.y());
    logger.log_value("robotHeading", pose.heading_rad());
}
