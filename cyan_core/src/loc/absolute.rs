//! Absolute localisation from an odometry computer
//!
//! Some robots carry a dedicated odometry co-processor which fuses its own
//! dead wheels and inertial sensor and reports an absolute position. This
//! estimator adapts such a device to the [`PoseProvider`] interface.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;

use crate::debug::{DebugLogger, Debuggable};
use crate::geom::{Point, Pose2D};

use super::{
    debug_pose, heading_from_imu,
    meas::{self, AbsoluteMeasurements},
    LocError, PoseProvider
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Pose taken directly from an absolute position source.
pub struct AbsoluteLocalizer {
    start: Point,
    heading_offset_deg: f64,
    pose: Pose2D,
    meas: AbsoluteMeasurements,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl AbsoluteLocalizer {
    /// Create a new localiser. The device's reported position is taken
    /// relative to `start`.
    pub fn new(
        start: Point,
        heading_offset_deg: f64,
        meas: AbsoluteMeasurements
    ) -> Result<Self, LocError> {
        Ok(Self {
            start,
            heading_offset_deg,
            pose: Pose2D::from_raw(
                start.x(),
                start.y(),
                heading_from_imu(0.0, heading_offset_deg)?
            ),
            meas,
        })
    }
}

impl PoseProvider for AbsoluteLocalizer {
    fn pose(&self) -> Pose2D {
        self.pose
    }

    fn update(&mut self) -> Result<(), LocError> {
        let x = meas::read("x", &self.meas.x)?;
        let y = meas::read("y", &self.meas.y)?;
        let heading_deg = meas::read("heading_deg", &self.meas.heading_deg)?;

        self.pose = Pose2D::new(
            self.start.x() + x,
            self.start.y() + y,
            heading_from_imu(heading_deg, self.heading_offset_deg)?
        )?;

        trace!("AbsoluteLocalizer pose: {}", self.pose);

        Ok(())
    }
}

impl Debuggable for AbsoluteLocalizer {
    fn debug(&self, logger: &mut DebugLogger) {
        debug_pose(&self.pose, logger);
    }
}
