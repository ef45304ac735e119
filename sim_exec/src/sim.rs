//! # Simulated chassis
//!
//! Ground truth model of a skid steer robot. Motor powers from the path
//! follower are integrated into the true pose of the robot, and every sensor
//! an estimator may ask for is derived from that motion: wheel and dead wheel
//! encoders, a heading sensor relative to the start heading, and an absolute
//! odometry computer.
//!
//! Wheels never slip, so the perpendicular dead wheel never turns.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::cell::Cell;
use std::rc::Rc;
use log::trace;

// Internal
use cyan_core::{
    geom::{GeomError, Pose2D},
    loc::{
        meas::{
            AbsoluteMeasurements, Channel, GyroTankMeasurements, TankMeasurements,
            ThreeDeadWheelMeasurements, TwoDeadWheelMeasurements,
        },
        ChassisGeometry, Measurements, Params as LocParams,
    },
    loco_ctrl::{NUM_TANK_MOTORS, TANK_LEFT, TANK_RIGHT},
    pid::Clock,
};
use util::maths::wrap_to_pi;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A simulated skid steer robot.
pub struct SimRobot {
    /// True pose of the robot
    pose: Pose2D,

    /// Pose at the start of the simulation
    start: Pose2D,

    full_power_speed: f64,
    track_width: f64,

    /// Separation of the parallel dead wheels
    dead_wheel_width: f64,

    ticks_to_distance: f64,

    sensors: Sensors,
}

/// Simulation time, shared between the loop which advances it and the
/// controllers which read it.
#[derive(Debug, Clone, Default)]
pub struct SimClock(Rc<Cell<f64>>);

/// Current value of every sensor channel.
#[derive(Default)]
struct Sensors {
    left_ticks: Rc<Cell<f64>>,
    right_ticks: Rc<Cell<f64>>,
    centre_ticks: Rc<Cell<f64>>,
    heading_deg: Rc<Cell<f64>>,
    x: Rc<Cell<f64>>,
    y: Rc<Cell<f64>>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("A {0} chassis cannot be simulated")]
    UnsupportedChassis(&'static str),

    #[error("Expected {expected} motor powers, found {found}")]
    MotorCount { expected: usize, found: usize },

    #[error("Invalid simulation parameter: {name} = {value}")]
    InvalidParam { name: &'static str, value: f64 },

    #[error("Simulated pose is invalid: {0}")]
    Geom(#[from] GeomError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, dt_s: f64) {
        add(&self.0, dt_s);
    }
}

impl Clock for SimClock {
    fn now_s(&self) -> f64 {
        self.0.get()
    }
}

impl SimRobot {
    /// Create a new robot at the start pose of the localisation parameters.
    pub fn new(
        loc_params: &LocParams,
        full_power_speed: f64,
        track_width: f64
    ) -> Result<Self, SimError> {
        let dead_wheel_width = match loc_params.chassis {
            ChassisGeometry::Mecanum { .. } => {
                return Err(SimError::UnsupportedChassis(loc_params.chassis.kind()))
            },
            ChassisGeometry::ThreeDeadWheel { encoder_width } => encoder_width,
            _ => track_width,
        };

        if !track_width.is_finite() || track_width <= 0.0 {
            return Err(SimError::InvalidParam {
                name: "track_width",
                value: track_width,
            });
        }

        if !loc_params.ticks_to_distance.is_finite() || loc_params.ticks_to_distance <= 0.0 {
            return Err(SimError::InvalidParam {
                name: "ticks_to_distance",
                value: loc_params.ticks_to_distance,
            });
        }

        if !full_power_speed.is_finite() {
            return Err(SimError::InvalidParam {
                name: "full_power_speed",
                value: full_power_speed,
            });
        }

        Ok(Self {
            pose: loc_params.start_pose,
            start: loc_params.start_pose,
            full_power_speed,
            track_width,
            dead_wheel_width,
            ticks_to_distance: loc_params.ticks_to_distance,
            sensors: Sensors::default(),
        })
    }

    /// The true pose of the robot.
    pub fn pose(&self) -> Pose2D {
        self.pose
    }

    /// Measurement channels for an estimator of the given kind.
    pub fn measurements(&self, chassis: &ChassisGeometry) -> Result<Measurements, SimError> {
        let s = &self.sensors;
        let k = self.ticks_to_distance;

        let meas = match chassis {
            ChassisGeometry::GyroTank => Measurements::GyroTank(GyroTankMeasurements {
                left_ticks: channel(&s.left_ticks),
                right_ticks: channel(&s.right_ticks),
                heading_deg: channel(&s.heading_deg),
                ticks_to_distance: k,
            }),
            ChassisGeometry::Tank { .. } => Measurements::Tank(TankMeasurements {
                left_ticks: channel(&s.left_ticks),
                right_ticks: channel(&s.right_ticks),
                ticks_to_distance: k,
            }),
            ChassisGeometry::ThreeDeadWheel { .. } => {
                Measurements::ThreeDeadWheel(ThreeDeadWheelMeasurements {
                    perp_ticks: Box::new(|| 0.0),
                    left_parallel_ticks: channel(&s.left_ticks),
                    right_parallel_ticks: channel(&s.right_ticks),
                    ticks_to_distance: k,
                })
            },
            ChassisGeometry::TwoDeadWheel => {
                Measurements::TwoDeadWheel(TwoDeadWheelMeasurements {
                    perp_ticks: Box::new(|| 0.0),
                    parallel_ticks: channel(&s.centre_ticks),
                    heading_deg: channel(&s.heading_deg),
                    ticks_to_distance: k,
                })
            },
            ChassisGeometry::Absolute => Measurements::Absolute(AbsoluteMeasurements {
                x: channel(&s.x),
                y: channel(&s.y),
                heading_deg: channel(&s.heading_deg),
            }),
            ChassisGeometry::Mecanum { .. } => {
                return Err(SimError::UnsupportedChassis(chassis.kind()))
            }
        };

        Ok(meas)
    }

    /// Drive the robot with the given tank motor powers for `dt_s` seconds.
    pub fn step(&mut self, motor_powers: &[f64], dt_s: f64) -> Result<(), SimError> {
        if motor_powers.len() != NUM_TANK_MOTORS {
            return Err(SimError::MotorCount {
                expected: NUM_TANK_MOTORS,
                found: motor_powers.len(),
            });
        }

        let d_left = motor_powers[TANK_LEFT] * self.full_power_speed * dt_s;
        let d_right = motor_powers[TANK_RIGHT] * self.full_power_speed * dt_s;

        let d_fwd = 0.5 * (d_left + d_right);
        let d_theta = (d_right - d_left) / self.track_width;

        // Integrate along the mean heading over the step
        let mid_heading = self.pose.heading_rad() + 0.5 * d_theta;
        self.pose = Pose2D::new(
            self.pose.x() + d_fwd * mid_heading.cos(),
            self.pose.y() + d_fwd * mid_heading.sin(),
            wrap_to_pi(self.pose.heading_rad() + d_theta)
        )?;

        // Dead wheels may sit at a different separation to the drive wheels
        let half_turn = 0.5 * d_theta * self.dead_wheel_width;
        let s = &self.sensors;
        add(&s.left_ticks, (d_fwd - half_turn) / self.ticks_to_distance);
        add(&s.right_ticks, (d_fwd + half_turn) / self.ticks_to_distance);
        add(&s.centre_ticks, d_fwd / self.ticks_to_distance);

        s.heading_deg.set(
            wrap_to_pi(self.pose.heading_rad() - self.start.heading_rad()).to_degrees()
        );
        s.x.set(self.pose.x() - self.start.x());
        s.y.set(self.pose.y() - self.start.y());

        trace!("SimRobot true pose: {}", self.pose);

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn channel(cell: &Rc<Cell<f64>>) -> Channel {
    let cell = cell.clone();
    Box::new(move || cell.get())
}

fn add(cell: &Cell<f64>, delta: f64) {
    cell.set(cell.get() + delta);
}
