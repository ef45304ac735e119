//! Mecanum mixing
//!
//! Only the translational part of the demand is used, heading is left to the
//! host.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use crate::debug::{DebugLogger, Debuggable};

use super::{normalise, DriveDemand, Side, VectorInterpreter};
use super::{
    MECANUM_LEFT_BACK, MECANUM_LEFT_FRONT, MECANUM_RIGHT_BACK, MECANUM_RIGHT_FRONT,
    NUM_MECANUM_MOTORS
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Mixes the x and y demand into four mecanum wheel powers.
#[derive(Debug, Clone)]
pub struct MecanumDriveInterpreter {
    reversed_side: Side,
    powers: [f64; NUM_MECANUM_MOTORS],
    last_x: f64,
    last_y: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MecanumDriveInterpreter {
    pub fn new(reversed_side: Side) -> Self {
        Self {
            reversed_side,
            powers: [0.0; NUM_MECANUM_MOTORS],
            last_x: 0.0,
            last_y: 0.0,
        }
    }
}

impl VectorInterpreter for MecanumDriveInterpreter {
    fn process(&mut self, demand: &DriveDemand) {
        let s = self.reversed_side.mecanum_sign();
        let (x, y) = (demand.x, demand.y);

        self.powers[MECANUM_LEFT_FRONT] = y + x * s;
        self.powers[MECANUM_LEFT_BACK] = y - x * s;
        self.powers[MECANUM_RIGHT_FRONT] = y - x * s;
        self.powers[MECANUM_RIGHT_BACK] = y + x * s;

        normalise(&mut self.powers);

        self.last_x = x;
        self.last_y = y;
    }

    fn stop(&mut self) {
        self.powers = [0.0; NUM_MECANUM_MOTORS];
    }

    fn motor_inputs(&self) -> &[f64] {
        &self.powers
    }
}

impl Debuggable for MecanumDriveInterpreter {
    fn debug(&self, logger: &mut DebugLogger) {
        logger.log_value("Left Front Power", self.powers[MECANUM_LEFT_FRONT]);
        logger.log_value("Left Back Power", self.powers[MECANUM_LEFT_BACK]);
        logger.log_value("Right Front Power", self.powers[MECANUM_RIGHT_FRONT]);
        logger.log_value("Right Back Power", self.powers[MECANUM_RIGHT_BACK]);
        logger.log_value("X power", self.last_x);
        logger.log_value("Y power", self.last_y);
    }
}
