//! # Locomotion control module
//!
//! Vector interpreters mix the drive demand computed by the path follower
//! into per-motor powers in [-1, 1] for a particular chassis. Motor channel
//! indices are fixed per chassis so the host can map them onto hardware.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod mecanum;
mod params;
mod tank;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use mecanum::MecanumDriveInterpreter;
pub use params::*;
pub use tank::TankDriveInterpreter;

use serde::Serialize;

use crate::debug::{DebugLogger, Debuggable};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The number of motors on a tank chassis.
pub const NUM_TANK_MOTORS: usize = 2;

/// The number of motors on a mecanum chassis.
pub const NUM_MECANUM_MOTORS: usize = 4;

/// Tank left motor channel
pub const TANK_LEFT: usize = 0;

/// Tank right motor channel
pub const TANK_RIGHT: usize = 1;

/// Mecanum left front motor channel
pub const MECANUM_LEFT_FRONT: usize = 0;

/// Mecanum left back motor channel
pub const MECANUM_LEFT_BACK: usize = 1;

/// Mecanum right front motor channel
pub const MECANUM_RIGHT_FRONT: usize = 2;

/// Mecanum right back motor channel
pub const MECANUM_RIGHT_BACK: usize = 3;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Mixes a drive demand into motor powers for one chassis type.
pub trait VectorInterpreter: Debuggable {
    /// Compute new motor powers for the demand.
    fn process(&mut self, demand: &DriveDemand);

    /// Set every motor power to zero.
    fn stop(&mut self);

    /// The latest motor powers, indexed by motor channel.
    fn motor_inputs(&self) -> &[f64];
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The demand produced by the path follower each cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DriveDemand {
    /// Normalised world frame x component of the error to the target
    pub x: f64,

    /// Normalised world frame y component of the error to the target
    pub y: f64,

    /// Linear power, negative when reverse driving
    pub linear: f64,

    /// Steering power, normalised by pi
    pub steer: f64,

    /// Unnormalised output of the heading controller
    pub steer_raw: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A vector interpreter of any supported kind.
#[derive(Debug, Clone)]
pub enum Interpreter {
    Tank(TankDriveInterpreter),
    Mecanum(MecanumDriveInterpreter),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Interpreter {
    /// Build the interpreter described by the parameters.
    pub fn from_params(params: &Params) -> Self {
        match params {
            Params::Tank { reversed_side } => {
                Interpreter::Tank(TankDriveInterpreter::new(*reversed_side))
            },
            Params::Mecanum { reversed_side } => {
                Interpreter::Mecanum(MecanumDriveInterpreter::new(*reversed_side))
            }
        }
    }
}

impl VectorInterpreter for Interpreter {
    fn process(&mut self, demand: &DriveDemand) {
        match self {
            Interpreter::Tank(i) => i.process(demand),
            Interpreter::Mecanum(i) => i.process(demand),
        }
    }

    fn stop(&mut self) {
        match self {
            Interpreter::Tank(i) => i.stop(),
            Interpreter::Mecanum(i) => i.stop(),
        }
    }

    fn motor_inputs(&self) -> &[f64] {
        match self {
            Interpreter::Tank(i) => i.motor_inputs(),
            Interpreter::Mecanum(i) => i.motor_inputs(),
        }
    }
}

impl Debuggable for Interpreter {
    fn debug(&self, logger: &mut DebugLogger) {
        match self {
            Interpreter::Tank(i) => i.debug(logger),
            Interpreter::Mecanum(i) => i.debug(logger),
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Scale powers down so none exceeds 1 in magnitude, leaving smaller demands
/// untouched.
fn normalise(powers: &mut [f64]) {
    let max = powers.iter().fold(1f64, |m, p| m.max(p.abs()));

    for p in powers.iter_mut() {
        *p /= max;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_normalise() {
        let mut small = [0.5, -0.25];
        normalise(&mut small);
        assert_eq!(small, [0.5, -0.25]);

        let mut large = [2.0, -1.0, 0.5, -4.0];
        normalise(&mut large);
        assert_eq!(large, [0.5, -0.25, 0.125, -1.0]);
    }

    #[test]
    fn test_from_params() {
        let params: Params = util::params::from_str(
            "chassis = \"mecanum\"\nreversed_side = \"left\"\n"
        )
        .unwrap();

        let mut interp = Interpreter::from_params(&params);
        assert_eq!(interp.motor_inputs().len(), NUM_MECANUM_MOTORS);

        interp.process(&DriveDemand { y: 1.0, ..Default::default() });
        assert_eq!(interp.motor_inputs(), &[1.0, 1.0, 1.0, 1.0]);

        interp.stop();
        assert!(interp.motor_inputs().iter().all(|p| *p == 0.0));
    }
}
