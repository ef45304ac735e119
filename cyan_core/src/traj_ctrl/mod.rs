//! # Trajectory control module
//!
//! Trajectory control drives the robot towards target points. A target is
//! either given directly, taken in turn from a [`PointSequence`], or
//! calculated each cycle from a [`Path`] by the pure pursuit kernel in
//! [`intersect`].
//!
//! Each cycle the follower updates the pose estimate and computes the error
//! to the target:
//!
//! ```text
//! dx = target.x - pose.x
//! dy = target.y - pose.y
//! heading_error = wrap_to_pi(atan2(dy, dx) - pose.heading)
//! ```
//!
//! The heading error is fed through a PID controller to give the steering
//! demand, and the linear demand is the distance to the target normalised by
//! `|dx| + |dy|`. Targets behind the robot are approached in reverse with
//! half the steering authority, unless reverse driving is disabled. The
//! resulting [`DriveDemand`] is mixed into motor powers by the chassis'
//! [`VectorInterpreter`].

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod intersect;
mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::f64::consts::{FRAC_PI_2, PI};
use log::trace;

// Internal
pub use intersect::{CircleLineIntersection, IntersectError, IntersectReport};
pub use params::Params;

use crate::debug::{self, DebugLogger, Debuggable, MessageLevel, SharedDebugLogger};
use crate::geom::{DistanceUnit, GeomError, Point, Pose2D, SmartPoint};
use crate::loc::{LocError, PoseProvider};
use crate::loco_ctrl::{DriveDemand, VectorInterpreter};
use crate::path::{Path, PathError, PathSequence, PointSequence, DEFAULT_ADMISSIBLE_ERROR};
use crate::pid::{Clock, MonotonicClock, PidCoefficients, PidController};
use util::maths::{hypot, wrap_to_pi};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default axis separation under which a segment endpoint is nudged.
pub const DEFAULT_DIFFERENCE_THRESHOLD: f64 = 0.003;

/// Steering authority kept when driving in reverse.
const REVERSE_STEER_GAIN: f64 = -0.5;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Drives the robot along points and paths.
pub struct PathFollower<P, V, C = MonotonicClock>
where
    P: PoseProvider,
    V: VectorInterpreter,
    C: Clock,
{
    provider: P,
    interpreter: V,

    /// Heading controller
    pid: PidController<C>,

    /// Pure pursuit kernel, only present once set up
    kernel: Option<CircleLineIntersection>,

    /// Distance to a target under which it is considered reached
    admissible_error: f64,

    difference_threshold: f64,

    /// If true targets behind the robot are driven to in reverse
    reverse_drive: bool,

    /// Unit of the pose estimate
    distance_unit: Option<DistanceUnit>,

    logger: Option<SharedDebugLogger>,

    /// Motor powers calculated in the latest cycle
    motor_powers: Vec<f64>,

    report: FollowReport,
}

/// Monitoring quantities from the latest cycle.
#[derive(Debug, Default, Copy, Clone)]
pub struct FollowReport {
    /// The target of the latest cycle, in the unit of the pose estimate
    pub target: Option<Point>,

    /// Distance from the robot to the target
    pub distance_to_target: f64,

    /// Angle between the robot's heading and the direction to the target
    pub heading_error_rad: f64,

    /// The demand passed to the vector interpreter
    pub demand: DriveDemand,

    /// True if the robot was commanded to stop
    pub stopped: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors raised by trajectory control.
#[derive(Debug, thiserror::Error)]
pub enum TrajCtrlError {
    #[error("Could not update the pose estimate: {0}")]
    Loc(#[from] LocError),

    #[error("Path error: {0}")]
    Path(#[from] PathError),

    #[error("Geometry error: {0}")]
    Geom(#[from] GeomError),

    #[error("Invalid trajectory control parameter: {name} = {value}")]
    InvalidParam { name: &'static str, value: f64 },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<P, V> PathFollower<P, V, MonotonicClock>
where
    P: PoseProvider,
    V: VectorInterpreter,
{
    /// Create a new follower whose heading controller uses the wall clock.
    ///
    /// Pure pursuit is not set up, call [`setup_pure_pursuit`] before
    /// following paths.
    ///
    /// [`setup_pure_pursuit`]: PathFollower::setup_pure_pursuit
    pub fn new(provider: P, interpreter: V, coeffs: PidCoefficients) -> Self {
        Self::with_pid(provider, interpreter, PidController::new(coeffs))
    }

    /// Create a new follower configured, and ready for pure pursuit, from
    /// the given parameters.
    pub fn from_params(
        provider: P,
        interpreter: V,
        params: &Params
    ) -> Result<Self, TrajCtrlError> {
        let mut follower = Self::new(provider, interpreter, params.pid_coefficients());
        follower.apply_params(params)?;
        Ok(follower)
    }
}

impl<P, V, C> PathFollower<P, V, C>
where
    P: PoseProvider,
    V: VectorInterpreter,
    C: Clock,
{
    /// Create a new follower with the given heading controller.
    pub fn with_pid(provider: P, interpreter: V, pid: PidController<C>) -> Self {
        let motor_powers = interpreter.motor_inputs().to_vec();

        Self {
            provider,
            interpreter,
            pid,
            kernel: None,
            admissible_error: DEFAULT_ADMISSIBLE_ERROR,
            difference_threshold: DEFAULT_DIFFERENCE_THRESHOLD,
            reverse_drive: true,
            distance_unit: None,
            logger: None,
            motor_powers,
            report: FollowReport::default(),
        }
    }

    /// Apply everything but the controller gains from the parameters, and set
    /// up pure pursuit.
    pub fn apply_params(&mut self, params: &Params) -> Result<(), TrajCtrlError> {
        if let Some(max) = params.max_integral {
            self.pid.set_max_integral(max);
        }

        self.reverse_drive = params.reverse_drive;
        self.distance_unit = params.distance_unit;
        self.set_difference_threshold(params.difference_threshold)?;

        self.setup_pure_pursuit(params.lookahead, params.admissible_error)
    }

    /// Set up the pure pursuit kernel, required by [`follow_path`].
    ///
    /// [`follow_path`]: PathFollower::follow_path
    pub fn setup_pure_pursuit(
        &mut self,
        lookahead: f64,
        admissible_error: f64
    ) -> Result<(), TrajCtrlError> {
        let mut kernel = CircleLineIntersection::new(lookahead, admissible_error)?;
        kernel.set_difference_threshold(self.difference_threshold)?;

        if let Some(ref logger) = self.logger {
            kernel.attach_logger(logger.clone());
        }

        self.admissible_error = admissible_error;
        self.kernel = Some(kernel);

        Ok(())
    }

    pub fn set_admissible_error(&mut self, admissible_error: f64) -> Result<(), TrajCtrlError> {
        if !admissible_error.is_finite() || admissible_error < 0.0 {
            return Err(TrajCtrlError::InvalidParam {
                name: "admissible_error",
                value: admissible_error,
            });
        }

        self.admissible_error = admissible_error;
        Ok(())
    }

    pub fn set_difference_threshold(&mut self, threshold: f64) -> Result<(), TrajCtrlError> {
        if let Some(ref mut kernel) = self.kernel {
            kernel.set_difference_threshold(threshold)?;
        }
        else if !threshold.is_finite() || threshold <= 0.0 {
            return Err(TrajCtrlError::InvalidParam {
                name: "difference_threshold",
                value: threshold,
            });
        }

        self.difference_threshold = threshold;
        Ok(())
    }

    /// Set the unit of the pose estimate. Targets in other units are
    /// converted into it, `None` disables conversion.
    pub fn set_distance_unit(&mut self, unit: Option<DistanceUnit>) {
        self.distance_unit = unit;
    }

    pub fn set_reverse_drive(&mut self, reverse_drive: bool) {
        self.reverse_drive = reverse_drive;
    }

    /// Share a debug logger with the follower and its kernel.
    pub fn attach_logger(&mut self, logger: SharedDebugLogger) {
        if let Some(ref mut kernel) = self.kernel {
            kernel.attach_logger(logger.clone());
        }
        self.logger = Some(logger);
    }

    /// Drive towards a single point, stopping if there is no point or it has
    /// been reached.
    pub fn follow_point(&mut self, point: Option<Point>) -> Result<(), TrajCtrlError> {
        self.provider.update()?;
        let pose = self.provider.pose();

        self.report.target = point;

        let point = match point {
            Some(p) => p,
            None => {
                debug::report(
                    self.logger.as_ref(),
                    MessageLevel::Debug,
                    "No target point, stopping"
                );
                self.stop();
                return Ok(());
            }
        };

        let distance = point.distance_from_pose(&pose);
        self.report.distance_to_target = distance;

        if distance < self.admissible_error {
            self.stop();
            return Ok(());
        }

        self.drive_towards(&point, &pose);

        Ok(())
    }

    /// Drive towards the current point of the sequence, moving onto the
    /// next one once it is reached.
    ///
    /// Returns `false`, stopping the robot, once the final point has been
    /// reached.
    pub fn follow_point_sequence(
        &mut self,
        seq: &mut PointSequence
    ) -> Result<bool, TrajCtrlError> {
        self.provider.update()?;
        let pose = self.provider.pose();

        let current = convert_unit(seq.current(), seq.unit(), self.distance_unit);

        let target = if current.distance_from_pose(&pose) < self.admissible_error {
            match seq.next_point() {
                Some(p) => convert_unit(p, seq.unit(), self.distance_unit),
                None => {
                    self.report.target = None;
                    self.stop();
                    return Ok(false);
                }
            }
        }
        else {
            current
        };

        self.follow_point(Some(target))?;

        Ok(true)
    }

    /// Follow a path with pure pursuit.
    ///
    /// Does nothing if pure pursuit has not been set up.
    pub fn follow_path(&mut self, path: &mut Path) -> Result<(), TrajCtrlError> {
        let kernel = match self.kernel {
            Some(ref mut k) => k,
            None => {
                debug::report(
                    self.logger.as_ref(),
                    MessageLevel::Warning,
                    "Pure pursuit has not been set up, ignoring path"
                );
                return Ok(());
            }
        };

        // The kernel compares waypoints against the pose, so both must share
        // a unit
        if let Some(unit) = self.distance_unit {
            path.convert_to(unit);
        }
        path.set_admissible_error(self.admissible_error)?;

        let target = kernel.target_point(path, &mut self.provider)?;

        trace!("Pure pursuit target: {:?}", target);

        self.follow_point(target)
    }

    /// Follow each path of the sequence in turn.
    ///
    /// Returns `false`, stopping the robot, once the final path is finished.
    pub fn follow_path_sequence(
        &mut self,
        seq: &mut PathSequence
    ) -> Result<bool, TrajCtrlError> {
        self.provider.update()?;
        let pose = self.provider.pose();

        match seq.next_update(&pose) {
            Some(path) => {
                self.follow_path(path)?;
                Ok(true)
            },
            None => {
                self.report.target = None;
                self.stop();
                Ok(false)
            }
        }
    }

    /// Drive towards a point given with units.
    pub fn follow_smart_point(&mut self, point: &SmartPoint) -> Result<(), TrajCtrlError> {
        let point = match self.distance_unit {
            Some(u) => point.as_point_in(u),
            None => point.as_point(),
        };

        self.follow_point(Some(point))
    }

    /// Push the follower's working values, and those of its kernel and
    /// interpreter, into the attached logger.
    pub fn push_debug(&self) {
        if let Some(ref logger) = self.logger {
            self.debug(&mut logger.borrow_mut());
        }
    }

    /// Motor powers from the latest cycle, indexed by motor channel.
    pub fn motor_powers(&self) -> &[f64] {
        &self.motor_powers
    }

    pub fn report(&self) -> FollowReport {
        self.report
    }

    pub fn pose(&self) -> Pose2D {
        self.provider.pose()
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    pub fn interpreter(&self) -> &V {
        &self.interpreter
    }

    pub fn pid(&self) -> &PidController<C> {
        &self.pid
    }

    pub fn kernel(&self) -> Option<&CircleLineIntersection> {
        self.kernel.as_ref()
    }

    pub fn admissible_error(&self) -> f64 {
        self.admissible_error
    }

    pub fn distance_unit(&self) -> Option<DistanceUnit> {
        self.distance_unit
    }

    /// Stop the robot.
    pub fn stop(&mut self) {
        self.interpreter.stop();
        self.motor_powers = self.interpreter.motor_inputs().to_vec();
        self.report.demand = DriveDemand::default();
        self.report.stopped = true;
    }

    /// Calculate and apply the demand which moves the robot towards `point`.
    fn drive_towards(&mut self, point: &Point, pose: &Pose2D) {
        let dx = point.x() - pose.x();
        let dy = point.y() - pose.y();
        let dist = hypot(dx, dy);
        let heading_err = wrap_to_pi(dy.atan2(dx) - pose.heading_rad());

        self.report.heading_error_rad = heading_err;

        let denom = dx.abs() + dy.abs();
        if denom == 0.0 {
            self.stop();
            return;
        }

        let mut linear = dist / denom;

        let steer_raw = self.pid.update(heading_err);
        let mut steer = steer_raw / PI;

        if self.reverse_drive && heading_err.abs() > FRAC_PI_2 {
            linear = -linear;
            steer *= REVERSE_STEER_GAIN;
        }

        let demand = DriveDemand {
            x: dx / denom,
            y: dy / denom,
            linear,
            steer,
            steer_raw,
        };

        trace!(
            "Follow: dist = {:.4}, head_err = {:.4}, demand = {:?}",
            dist, heading_err, demand
        );

        self.interpreter.process(&demand);
        self.motor_powers = self.interpreter.motor_inputs().to_vec();

        self.report.demand = demand;
        self.report.stopped = false;
    }
}

impl<P, V, C> Debuggable for PathFollower<P, V, C>
where
    P: PoseProvider,
    V: VectorInterpreter,
    C: Clock,
{
    fn debug(&self, logger: &mut DebugLogger) {
        let pose = self.provider.pose();
        logger.log_value("robotX", pose.x());
        logger.log_value("robotY", pose.y());
        logger.log_value("robotHeading", pose.heading_rad());

        match self.report.target {
            Some(t) => logger.log_value("TargetPoint", t.to_string()),
            None => logger.log_value("TargetPoint", "none"),
        }
        logger.log_value("robotDistanceToPoint", self.report.distance_to_target);
        logger.log_value("robotHeadingError", self.report.heading_error_rad);

        if let Some(ref kernel) = self.kernel {
            kernel.debug(logger);
        }

        self.interpreter.debug(logger);
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert a point between units if both are known.
fn convert_unit(point: Point, from: Option<DistanceUnit>, to: Option<DistanceUnit>) -> Point {
    match (from, to) {
        (Some(f), Some(t)) => point.convert(f, t),
        _ => point,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::loc::meas::TankMeasurements;
    use crate::loc::test::{channel, Sensor};
    use crate::loc::TankKinematics;
    use crate::loco_ctrl::{Side, TankDriveInterpreter, TANK_LEFT, TANK_RIGHT};
    use crate::pid::test::ManualClock;

    /// A pose provider which stays where it is put.
    struct FixedPose(Pose2D);

    impl PoseProvider for FixedPose {
        fn pose(&self) -> Pose2D {
            self.0
        }

        fn update(&mut self) -> Result<(), LocError> {
            Ok(())
        }
    }

    type TestFollower<Pr> = PathFollower<Pr, TankDriveInterpreter, ManualClock>;

    fn pt(x: f64, y: f64) -> Point {
        Point::new(x, y).unwrap()
    }

    fn follower_at(x: f64, y: f64, heading: f64) -> (TestFollower<FixedPose>, ManualClock) {
        let clock = ManualClock::default();
        let pid = PidController::with_clock(PidCoefficients::new(1.0, 0.0, 0.0), clock.clone());

        let follower = PathFollower::with_pid(
            FixedPose(Pose2D::new(x, y, heading).unwrap()),
            TankDriveInterpreter::new(Side::Right),
            pid
        );

        (follower, clock)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_stop_without_target() {
        let (mut f, _) = follower_at(0.0, 0.0, 0.0);

        f.follow_point(Some(pt(1.0, 0.0))).unwrap();
        assert!(f.motor_powers().iter().any(|p| *p != 0.0));

        f.follow_point(None).unwrap();
        assert_eq!(f.motor_powers(), &[0.0, 0.0]);
        assert!(f.report().stopped);
    }

    #[test]
    fn test_stop_within_admissible_error() {
        let (mut f, _) = follower_at(0.0, 0.0, 0.0);

        f.follow_point(Some(pt(0.01, 0.0))).unwrap();
        assert_eq!(f.motor_powers(), &[0.0, 0.0]);
        assert!(approx(f.report().distance_to_target, 0.01));
    }

    #[test]
    fn test_straight_ahead() {
        let (mut f, _) = follower_at(0.0, 0.0, 0.0);

        f.follow_point(Some(pt(2.0, 0.0))).unwrap();

        let demand = f.report().demand;
        assert_eq!(demand.linear, 1.0);
        assert_eq!(demand.steer, 0.0);
        assert_eq!(demand.x, 1.0);
        assert_eq!(f.motor_powers(), &[1.0, 1.0]);
    }

    #[test]
    fn test_steer_towards_target() {
        let (mut f, _) = follower_at(0.0, 0.0, 0.0);

        f.follow_point(Some(pt(1.0, 1.0))).unwrap();

        let report = f.report();
        assert!(approx(report.heading_error_rad, PI / 4.0));
        assert!(approx(report.demand.linear, 2f64.sqrt() / 2.0));
        assert!(approx(report.demand.steer_raw, PI / 4.0));
        assert!(approx(report.demand.steer, 0.25));
        assert!(approx(report.demand.x, 0.5));
        assert!(approx(report.demand.y, 0.5));

        // Left of the robot, so the right side drives faster
        let p = f.motor_powers();
        assert!(p[TANK_RIGHT] > p[TANK_LEFT]);
    }

    #[test]
    fn test_reverse_drive() {
        let (mut f, _) = follower_at(0.0, 0.0, 0.0);

        f.follow_point(Some(pt(-1.0, 0.0))).unwrap();

        let demand = f.report().demand;
        assert_eq!(demand.linear, -1.0);
        assert!(approx(demand.steer_raw, PI));
        assert!(approx(demand.steer, -0.5));

        let p = f.motor_powers();
        assert!(approx(p[TANK_LEFT], -1.0 / 3.0));
        assert!(approx(p[TANK_RIGHT], -1.0));

        let (mut f, _) = follower_at(0.0, 0.0, 0.0);
        f.set_reverse_drive(false);
        f.follow_point(Some(pt(-1.0, 0.0))).unwrap();

        let demand = f.report().demand;
        assert_eq!(demand.linear, 1.0);
        assert!(approx(demand.steer, 1.0));
        assert_eq!(f.motor_powers(), &[0.0, 1.0]);
    }

    #[test]
    fn test_zero_distance_stops() {
        let (mut f, _) = follower_at(1.0, 1.0, 0.0);
        f.set_admissible_error(0.0).unwrap();

        f.follow_point(Some(pt(1.0, 1.0))).unwrap();
        assert_eq!(f.motor_powers(), &[0.0, 0.0]);
        assert!(f.report().stopped);
    }

    #[test]
    fn test_invalid_settings() {
        let (mut f, _) = follower_at(0.0, 0.0, 0.0);

        assert!(f.set_admissible_error(-1.0).is_err());
        assert!(f.set_difference_threshold(f64::NAN).is_err());
        assert!(f.setup_pure_pursuit(-0.3, 0.05).is_err());
        assert!(f.kernel().is_none());
    }

    #[test]
    fn test_point_sequence() {
        let (mut f, _) = follower_at(0.99, 0.0, 0.0);
        let mut seq = PointSequence::new(vec![pt(1.0, 0.0), pt(2.0, 0.0)]).unwrap();

        assert!(f.follow_point_sequence(&mut seq).unwrap());
        assert_eq!(seq.index(), 1);
        assert_eq!(f.report().target, Some(pt(2.0, 0.0)));

        f.provider_mut().0 = Pose2D::new(1.99, 0.0, 0.0).unwrap();
        assert!(!f.follow_point_sequence(&mut seq).unwrap());
        assert_eq!(f.motor_powers(), &[0.0, 0.0]);
    }

    #[test]
    fn test_point_sequence_unit_conversion() {
        let (mut f, _) = follower_at(0.0, 0.0, 0.0);
        f.set_distance_unit(Some(DistanceUnit::Meter));

        let mut seq = PointSequence::new(vec![pt(150.0, 0.0)]).unwrap();
        seq.set_unit(Some(DistanceUnit::Cm));

        assert!(f.follow_point_sequence(&mut seq).unwrap());
        let target = f.report().target.unwrap();
        assert!(approx(target.x(), 1.5));
        assert!(approx(f.report().distance_to_target, 1.5));
    }

    #[test]
    fn test_smart_point() {
        let (mut f, _) = follower_at(0.0, 0.0, 0.0);
        let sp = SmartPoint::new(0.0, 50.0, DistanceUnit::Cm).unwrap();

        f.follow_smart_point(&sp).unwrap();
        assert!(approx(f.report().target.unwrap().y(), 50.0));

        f.set_distance_unit(Some(DistanceUnit::Meter));
        f.follow_smart_point(&sp).unwrap();
        assert!(approx(f.report().target.unwrap().y(), 0.5));
    }

    #[test]
    fn test_follow_path_without_pure_pursuit() {
        let (mut f, _) = follower_at(0.0, 0.0, 0.0);
        let logger = DebugLogger::new_shared(20).unwrap();
        f.attach_logger(logger.clone());

        let mut path = Path::new(vec![pt(0.0, 0.0), pt(1.0, 0.0)]).unwrap();
        f.follow_path(&mut path).unwrap();

        assert_eq!(f.motor_powers(), &[0.0, 0.0]);
        assert_eq!(path.segment_index(), 0);
        assert_eq!(logger.borrow().packets()[0].header, "WARNING");
    }

    #[test]
    fn test_follow_path_propagates_admissible_error() {
        let (mut f, _) = follower_at(0.0, 0.0, 0.0);
        f.setup_pure_pursuit(0.5, 0.1).unwrap();

        let mut path = Path::new(vec![pt(0.0, 0.0), pt(2.0, 0.0)]).unwrap();
        f.follow_path(&mut path).unwrap();

        assert_eq!(path.admissible_error(), 0.1);
        let target = f.report().target.unwrap();
        assert!((target.x() - 0.5).abs() < 1e-3);
        assert!(f.motor_powers().iter().all(|p| *p > 0.9));
    }

    #[test]
    fn test_follow_path_in_another_unit() {
        let (mut f, _) = follower_at(0.0, 0.0, 0.0);
        f.set_distance_unit(Some(DistanceUnit::Meter));
        f.setup_pure_pursuit(0.5, 0.05).unwrap();

        let mut path = Path::with_unit(vec![pt(0.0, 0.0), pt(200.0, 0.0)], DistanceUnit::Cm)
            .unwrap();
        f.follow_path(&mut path).unwrap();

        let report = f.report();
        let target = report.target.unwrap();
        assert!((target.x() - 0.5).abs() < 1e-3);
        assert!(target.y().abs() < 1e-2);
        assert!(!report.stopped);
        assert!(f.motor_powers().iter().all(|p| *p > 0.9));

        assert_eq!(path.unit(), Some(DistanceUnit::Meter));
        assert!((path.last_point().x() - 2.0).abs() < 1e-9);
    }

    /// A pose provider whose next pose only appears once it is updated.
    struct PendingPose {
        pose: Pose2D,
        pending: Option<Pose2D>,
    }

    impl PoseProvider for PendingPose {
        fn pose(&self) -> Pose2D {
            self.pose
        }

        fn update(&mut self) -> Result<(), LocError> {
            if let Some(p) = self.pending.take() {
                self.pose = p;
            }
            Ok(())
        }
    }

    #[test]
    fn test_path_sequence_switches_on_fresh_pose() {
        let clock = ManualClock::default();
        let pid = PidController::with_clock(PidCoefficients::new(1.0, 0.0, 0.0), clock.clone());
        let mut f = PathFollower::with_pid(
            PendingPose { pose: Pose2D::new(0.9, 0.0, 0.0).unwrap(), pending: None },
            TankDriveInterpreter::new(Side::Right),
            pid
        );
        f.setup_pure_pursuit(0.3, 0.05).unwrap();

        let mut seq = PathSequence::new(
            vec![
                Path::new(vec![pt(0.0, 0.0), pt(1.0, 0.0)]).unwrap(),
                Path::new(vec![pt(1.0, 0.0), pt(2.0, 0.0)]).unwrap(),
            ],
            0.05
        )
        .unwrap();

        // End of the first path is within the lookahead, so it becomes the
        // last segment
        assert!(f.follow_path_sequence(&mut seq).unwrap());
        assert_eq!(seq.current_index(), 0);
        assert!(seq.current().is_on_last_segment());

        // The robot reaches the end of the first path during this cycle
        f.provider_mut().pending = Some(Pose2D::new(1.0, 0.0, 0.0).unwrap());
        assert!(f.follow_path_sequence(&mut seq).unwrap());
        assert_eq!(seq.current_index(), 1);
    }

    #[test]
    fn test_from_params() {
        let params: Params = util::params::from_str(
            "lookahead = 0.4\nadmissible_error = 0.02\nk_p = 2.0\nk_i = 0.5\nk_d = 0.0\n\
             max_integral = 1.5\nreverse_drive = false\ndistance_unit = \"meter\"\n"
        )
        .unwrap();

        let f = PathFollower::from_params(
            FixedPose(Pose2D::new(0.0, 0.0, 0.0).unwrap()),
            TankDriveInterpreter::new(Side::Right),
            &params
        )
        .unwrap();

        assert_eq!(f.admissible_error(), 0.02);
        assert_eq!(f.kernel().unwrap().lookahead(), 0.4);
        assert_eq!(f.pid().max_integral(), 1.5);
        assert_eq!(f.pid().coefficients(), PidCoefficients::new(2.0, 0.5, 0.0));
        assert_eq!(f.distance_unit(), Some(DistanceUnit::Meter));
    }

    #[test]
    fn test_debug_packets() {
        let (mut f, _) = follower_at(0.0, 0.0, 0.0);
        f.setup_pure_pursuit(0.5, 0.05).unwrap();
        let logger = DebugLogger::new_shared(50).unwrap();
        f.attach_logger(logger.clone());

        let mut path = Path::new(vec![pt(0.0, 0.0), pt(2.0, 0.0)]).unwrap();
        f.follow_path(&mut path).unwrap();
        f.push_debug();

        let packets = logger.borrow_mut().dump();
        let headers: Vec<&str> = packets.iter().map(|p| p.header.as_str()).collect();
        assert_eq!(headers[0], "robotX");
        assert!(headers.contains(&"robotHeadingError"));
        assert!(headers.contains(&"Discriminant"));
        assert!(headers.contains(&"Right Power"));
    }

    /// Drive a simulated tank along a path with a corner until the path is
    /// finished.
    #[test]
    fn test_tank_follows_path() {
        const DT_S: f64 = 0.02;
        const FULL_SPEED: f64 = 0.5;

        let (left, right) = (Sensor::default(), Sensor::default());
        let estimator = TankKinematics::new(
            Pose2D::new(0.0, 0.0, 0.0).unwrap(),
            0.3,
            TankMeasurements {
                left_ticks: channel(&left),
                right_ticks: channel(&right),
                ticks_to_distance: 1.0,
            }
        )
        .unwrap();

        let clock = ManualClock::default();
        let pid = PidController::with_clock(PidCoefficients::new(1.0, 0.0, 0.0), clock.clone());
        let mut f = PathFollower::with_pid(estimator, TankDriveInterpreter::new(Side::Right), pid);
        f.setup_pure_pursuit(0.3, 0.05).unwrap();

        let mut path = Path::new(vec![pt(0.0, 0.0), pt(1.0, 0.0), pt(2.0, 1.0)]).unwrap();
        let goal = path.last_point();

        let mut cycles = 0;
        while !path.is_finished(&f.pose()) && cycles < 2000 {
            f.follow_path(&mut path).unwrap();

            let p = f.motor_powers();
            left.add(p[TANK_LEFT] * FULL_SPEED * DT_S);
            right.add(p[TANK_RIGHT] * FULL_SPEED * DT_S);
            clock.advance(DT_S);
            cycles += 1;
        }

        assert!(path.is_finished(&f.pose()), "not finished after {} cycles", cycles);
        assert!(goal.distance_from_pose(&f.pose()) < 0.05);

        // Once finished the robot is stopped
        f.follow_path(&mut path).unwrap();
        assert_eq!(f.motor_powers(), &[0.0, 0.0]);
    }
}
