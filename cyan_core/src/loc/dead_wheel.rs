//! Dead wheel odometry estimators
//!
//! Dead wheels are unpowered omni wheels with encoders, mounted parallel and
//! perpendicular to the direction of travel. Parallel motion is along the
//! heading, perpendicular motion is positive to the right of it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use nalgebra::{Rotation2, Vector2};

use crate::debug::{DebugLogger, Debuggable};
use crate::geom::{Point, Pose2D};
use util::maths::wrap_to_pi;

use super::{
    check_width, debug_pose, heading_from_imu,
    meas::{self, ThreeDeadWheelMeasurements, TwoDeadWheelMeasurements},
    LocError, PoseProvider
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Two parallel wheels give heading and forward motion, the perpendicular
/// wheel gives sideways motion.
pub struct ThreeDeadWheel {
    x: f64,
    y: f64,
    heading_rad: f64,
    encoder_width: f64,
    prev_perp: f64,
    prev_left: f64,
    prev_right: f64,
    meas: ThreeDeadWheelMeasurements,
}

/// One wheel in each direction, with heading from an inertial sensor.
pub struct TwoDeadWheel {
    x: f64,
    y: f64,
    heading_rad: f64,
    heading_offset_deg: f64,
    prev_perp: f64,
    prev_parallel: f64,
    meas: TwoDeadWheelMeasurements,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ThreeDeadWheel {
    /// Create a new estimator at `start`.
    ///
    /// `encoder_width` is the distance between the two parallel wheels.
    pub fn new(
        start: Pose2D,
        encoder_width: f64,
        meas: ThreeDeadWheelMeasurements
    ) -> Result<Self, LocError> {
        meas::check_ticks_to_distance(meas.ticks_to_distance)?;

        Ok(Self {
            x: start.x(),
            y: start.y(),
            heading_rad: start.heading_rad(),
            encoder_width: check_width("encoder_width", encoder_width)?,
            prev_perp: 0.0,
            prev_left: 0.0,
            prev_right: 0.0,
            meas,
        })
    }
}

impl PoseProvider for ThreeDeadWheel {
    fn pose(&self) -> Pose2D {
        Pose2D::from_raw(self.x, self.y, self.heading_rad)
    }

    fn update(&mut self) -> Result<(), LocError> {
        let k = self.meas.ticks_to_distance;
        let perp = meas::read_distance("perp_ticks", &self.meas.perp_ticks, k)?;
        let left = meas::read_distance(
            "left_parallel_ticks", &self.meas.left_parallel_ticks, k
        )?;
        let right = meas::read_distance(
            "right_parallel_ticks", &self.meas.right_parallel_ticks, k
        )?;

        let d_perp = perp - self.prev_perp;
        let d_left = left - self.prev_left;
        let d_right = right - self.prev_right;

        let d_heading = (d_right - d_left) / self.encoder_width;
        let d_parallel = (d_right + d_left) / 2.0;

        let d_world = body_to_world(self.heading_rad, d_parallel, d_perp);
        self.x += d_world[0];
        self.y += d_world[1];
        self.heading_rad = wrap_to_pi(self.heading_rad + d_heading);

        self.prev_perp = perp;
        self.prev_left = left;
        self.prev_right = right;

        trace!("ThreeDeadWheel pose: {}", self.pose());

        Ok(())
    }
}

impl Debuggable for ThreeDeadWheel {
    fn debug(&self, logger: &mut DebugLogger) {
        debug_pose(&self.pose(), logger);
    }
}

impl TwoDeadWheel {
    /// Create a new estimator at `start`, see [`super::GyroTank::new`] for the
    /// meaning of `heading_offset_deg`.
    pub fn new(
        start: Point,
        heading_offset_deg: f64,
        meas: TwoDeadWheelMeasurements
    ) -> Result<Self, LocError> {
        meas::check_ticks_to_distance(meas.ticks_to_distance)?;

        Ok(Self {
            x: start.x(),
            y: start.y(),
            heading_rad: heading_from_imu(0.0, heading_offset_deg)?,
            heading_offset_deg,
            prev_perp: 0.0,
            prev_parallel: 0.0,
            meas,
        })
    }
}

impl PoseProvider for TwoDeadWheel {
    fn pose(&self) -> Pose2D {
        Pose2D::from_raw(self.x, self.y, self.heading_rad)
    }

    fn update(&mut self) -> Result<(), LocError> {
        let k = self.meas.ticks_to_distance;
        let perp = meas::read_distance("perp_ticks", &self.meas.perp_ticks, k)?;
        let parallel = meas::read_distance(
            "parallel_ticks", &self.meas.parallel_ticks, k
        )?;
        let gyro_deg = meas::read("heading_deg", &self.meas.heading_deg)?;

        self.heading_rad = heading_from_imu(gyro_deg, self.heading_offset_deg)?;

        let d_world = body_to_world(
            self.heading_rad,
            parallel - self.prev_parallel,
            perp - self.prev_perp
        );
        self.x += d_world[0];
        self.y += d_world[1];

        self.prev_perp = perp;
        self.prev_parallel = parallel;

        trace!("TwoDeadWheel pose: {}", self.pose());

        Ok(())
    }
}

impl Debuggable for TwoDeadWheel {
    fn debug(&self, logger: &mut DebugLogger) {
        debug_pose(&self.pose(), logger);
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Rotate a body frame displacement into the world frame.
///
/// Gives `dx = d_perp*sin + d_par*cos` and `dy = -d_perp*cos + d_par*sin`.
fn body_to_world(heading_rad: f64, d_parallel: f64, d_perp: f64) -> Vector2<f64> {
    Rotation2::new(heading_rad) * Vector2::new(d_parallel, -d_perp)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::loc::test::{channel, Sensor};
    use std::f64::consts::PI;

    struct Rig {
        perp: Sensor,
        left: Sensor,
        right: Sensor,
    }

    fn three_wheel(start: Pose2D, encoder_width: f64) -> (ThreeDeadWheel, Rig) {
        let rig = Rig {
            perp: Sensor::default(),
            left: Sensor::default(),
            right: Sensor::default(),
        };
        let est = ThreeDeadWheel::new(
            start,
            encoder_width,
            ThreeDeadWheelMeasurements {
                perp_ticks: channel(&rig.perp),
                left_parallel_ticks: channel(&rig.left),
                right_parallel_ticks: channel(&rig.right),
                ticks_to_distance: 1.0,
            }
        )
        .unwrap();
        (est, rig)
    }

    /// Equal parallel travel with no perpendicular travel is a pure forward
    /// translation along the heading.
    #[test]
    fn test_three_wheel_forward() {
        for i in 0..8 {
            let heading = -3.0 + 0.8 * i as f64;
            let (mut est, rig) = three_wheel(Pose2D::new(0.5, 0.5, heading).unwrap(), 5.0);

            rig.left.add(1.5);
            rig.right.add(1.5);
            est.update().unwrap();

            let pose = est.pose();
            assert_eq!(pose.heading_rad(), heading);
            assert!((pose.x() - (0.5 + 1.5 * heading.cos())).abs() < 1e-12);
            assert!((pose.y() - (0.5 + 1.5 * heading.sin())).abs() < 1e-12);
        }
    }

    #[test]
    fn test_three_wheel_strafe_right() {
        let (mut est, rig) = three_wheel(Pose2D::new(0.0, 0.0, 0.0).unwrap(), 5.0);

        rig.perp.add(2.0);
        est.update().unwrap();

        let pose = est.pose();
        assert!(pose.x().abs() < 1e-12);
        assert!((pose.y() + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_three_wheel_rotation() {
        let (mut est, rig) = three_wheel(Pose2D::new(0.0, 0.0, PI - 0.1).unwrap(), 4.0);

        rig.left.add(-0.4);
        rig.right.add(0.4);
        est.update().unwrap();

        // 0.2 rad of turn takes the heading through pi
        let pose = est.pose();
        assert!((pose.heading_rad() - (-PI + 0.1)).abs() < 1e-12);
        assert!(pose.x().abs() < 1e-12);
    }

    #[test]
    fn test_two_wheel_follows_gyro() {
        let (perp, parallel, gyro) = (Sensor::default(), Sensor::default(), Sensor::default());
        let mut est = TwoDeadWheel::new(
            Point::new(0.0, 0.0).unwrap(),
            -90.0,
            TwoDeadWheelMeasurements {
                perp_ticks: channel(&perp),
                parallel_ticks: channel(&parallel),
                heading_deg: channel(&gyro),
                ticks_to_distance: 0.5,
            }
        )
        .unwrap();

        assert!((est.pose().heading_rad() + PI / 2.0).abs() < 1e-12);

        // Heading of 0 after the offset, forward 1 and right 0.5
        gyro.set(90.0);
        parallel.add(2.0);
        perp.add(1.0);
        est.update().unwrap();

        let pose = est.pose();
        assert_eq!(pose.heading_rad(), 0.0);
        assert!((pose.x() - 1.0).abs() < 1e-12);
        assert!((pose.y() + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_two_wheel_non_finite_gyro() {
        let gyro = Sensor::default();
        let mut est = TwoDeadWheel::new(
            Point::new(0.0, 0.0).unwrap(),
            0.0,
            TwoDeadWheelMeasurements {
                perp_ticks: Box::new(|| 0.0),
                parallel_ticks: Box::new(|| 0.0),
                heading_deg: channel(&gyro),
                ticks_to_distance: 1.0,
            }
        )
        .unwrap();

        gyro.set(f64::INFINITY);
        assert!(est.update().is_err());
        assert_eq!(est.pose().heading_rad(), 0.0);
    }
}
