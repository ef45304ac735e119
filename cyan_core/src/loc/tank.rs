//! Differential drive ("tank") estimators

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;

use crate::debug::{DebugLogger, Debuggable};
use crate::geom::{Point, Pose2D};
use util::maths::wrap_to_pi;

use super::{
    check_width, debug_pose, heading_from_imu,
    meas::{self, GyroTankMeasurements, TankMeasurements},
    LocError, PoseProvider
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Differential drive estimator taking its heading from an inertial sensor.
///
/// The sensor is the source of truth for heading, only the position is
/// integrated from the wheel encoders.
pub struct GyroTank {
    x: f64,
    y: f64,
    heading_rad: f64,
    heading_offset_deg: f64,
    prev_left: f64,
    prev_right: f64,
    meas: GyroTankMeasurements,
}

/// Differential drive estimator dead-reckoning from the wheel encoders alone.
pub struct TankKinematics {
    x: f64,
    y: f64,
    heading_rad: f64,
    track_width: f64,
    prev_left: f64,
    prev_right: f64,
    meas: TankMeasurements,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl GyroTank {
    /// Create a new estimator at `start`.
    ///
    /// `heading_offset_deg` is added to every sensor reading, and so is also
    /// the heading reported before the first update.
    pub fn new(
        start: Point,
        heading_offset_deg: f64,
        meas: GyroTankMeasurements
    ) -> Result<Self, LocError> {
        meas::check_ticks_to_distance(meas.ticks_to_distance)?;

        Ok(Self {
            x: start.x(),
            y: start.y(),
            heading_rad: heading_from_imu(0.0, heading_offset_deg)?,
            heading_offset_deg,
            prev_left: 0.0,
            prev_right: 0.0,
            meas,
        })
    }
}

impl PoseProvider for GyroTank {
    fn pose(&self) -> Pose2D {
        Pose2D::from_raw(self.x, self.y, self.heading_rad)
    }

    fn update(&mut self) -> Result<(), LocError> {
        let k = self.meas.ticks_to_distance;
        let left = meas::read_distance("left_ticks", &self.meas.left_ticks, k)?;
        let right = meas::read_distance("right_ticks", &self.meas.right_ticks, k)?;
        let gyro_deg = meas::read("heading_deg", &self.meas.heading_deg)?;

        self.heading_rad = heading_from_imu(gyro_deg, self.heading_offset_deg)?;

        let dc = ((left - self.prev_left) + (right - self.prev_right)) / 2.0;
        self.x += dc * self.heading_rad.cos();
        self.y += dc * self.heading_rad.sin();

        self.prev_left = left;
        self.prev_right = right;

        trace!("GyroTank pose: {}", self.pose());

        Ok(())
    }
}

impl Debuggable for GyroTank {
    fn debug(&self, logger: &mut DebugLogger) {
        debug_pose(&self.pose(), logger);
    }
}

impl TankKinematics {
    /// Create a new estimator at `start`.
    ///
    /// `track_width` is the distance between the left and right wheels, in
    /// the same unit as the encoder distances.
    pub fn new(
        start: Pose2D,
        track_width: f64,
        meas: TankMeasurements
    ) -> Result<Self, LocError> {
        meas::check_ticks_to_distance(meas.ticks_to_distance)?;

        Ok(Self {
            x: start.x(),
            y: start.y(),
            heading_rad: start.heading_rad(),
            track_width: check_width("track_width", track_width)?,
            prev_left: 0.0,
            prev_right: 0.0,
            meas,
        })
    }
}

impl PoseProvider for TankKinematics {
    fn pose(&self) -> Pose2D {
        Pose2D::from_raw(self.x, self.y, self.heading_rad)
    }

    fn update(&mut self) -> Result<(), LocError> {
        let k = self.meas.ticks_to_distance;
        let left = meas::read_distance("left_ticks", &self.meas.left_ticks, k)?;
        let right = meas::read_distance("right_ticks", &self.meas.right_ticks, k)?;

        let d_left = left - self.prev_left;
        let d_right = right - self.prev_right;

        // Translate along the heading held at the start of the step
        let dc = (d_right + d_left) / 2.0;
        self.x += dc * self.heading_rad.cos();
        self.y += dc * self.heading_rad.sin();

        self.heading_rad = wrap_to_pi(
            self.heading_rad + (d_right - d_left) / self.track_width
        );

        self.prev_left = left;
        self.prev_right = right;

        trace!("TankKinematics pose: {}", self.pose());

        Ok(())
    }
}

impl Debuggable for TankKinematics {
    fn debug(&self, logger: &mut DebugLogger) {
        debug_pose(&self.pose(), logger);
    }
}
