//! Mecanum drive estimator

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use nalgebra::{Rotation2, Vector2};

use crate::debug::{DebugLogger, Debuggable};
use crate::geom::Pose2D;
use util::maths::wrap_to_pi;

use super::{
    check_width, debug_pose,
    meas::{self, MecanumMeasurements},
    LocError, PoseProvider
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Four wheel mecanum kinematics.
pub struct MecanumKinematics {
    x: f64,
    y: f64,
    heading_rad: f64,

    /// Half of the distance between the left and right wheels
    track_width: f64,

    /// Previous wheel distances, ordered LF, RF, LB, RB
    prev: [f64; 4],

    meas: MecanumMeasurements,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MecanumKinematics {
    pub fn new(
        start: Pose2D,
        track_width: f64,
        meas: MecanumMeasurements
    ) -> Result<Self, LocError> {
        meas::check_ticks_to_distance(meas.ticks_to_distance)?;

        Ok(Self {
            x: start.x(),
            y: start.y(),
            heading_rad: start.heading_rad(),
            track_width: check_width("track_width", track_width)?,
            prev: [0.0; 4],
            meas,
        })
    }
}

impl PoseProvider for MecanumKinematics {
    fn pose(&self) -> Pose2D {
        Pose2D::from_raw(self.x, self.y, self.heading_rad)
    }

    fn update(&mut self) -> Result<(), LocError> {
        let k = self.meas.ticks_to_distance;
        let curr = [
            meas::read_distance("lf_ticks", &self.meas.lf_ticks, k)?,
            meas::read_distance("rf_ticks", &self.meas.rf_ticks, k)?,
            meas::read_distance("lb_ticks", &self.meas.lb_ticks, k)?,
            meas::read_distance("rb_ticks", &self.meas.rb_ticks, k)?,
        ];

        let lf = curr[0] - self.prev[0];
        let rf = curr[1] - self.prev[1];
        let lb = curr[2] - self.prev[2];
        let rb = curr[3] - self.prev[3];

        let d_forward = (lf + rf + lb + rb) / 4.0;
        let d_strafe = (lb + rf - lf - rb) / 4.0;
        let d_heading = (rb + rf - lb - lf) / (4.0 * self.track_width);

        // dx = s*sin + f*cos, dy = s*cos - f*sin
        let d_world = Rotation2::new(-self.heading_rad) * Vector2::new(d_forward, d_strafe);
        self.x += d_world[0];
        self.y += d_world[1];
        self.heading_rad = wrap_to_pi(self.heading_rad + d_heading);

        self.prev = curr;

        trace!("MecanumKinematics pose: {}", self.pose());

        Ok(())
    }
}

impl Debuggable for MecanumKinematics {
    fn debug(&self, logger: &mut DebugLogger) {
        debug_pose(&self.pose(), logger);
    }
}
