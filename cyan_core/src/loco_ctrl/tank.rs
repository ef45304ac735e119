//! Tank (skid steer) mixing

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use crate::debug::{DebugLogger, Debuggable};

use super::{normalise, DriveDemand, Side, VectorInterpreter};
use super::{NUM_TANK_MOTORS, TANK_LEFT, TANK_RIGHT};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Mixes linear and steering power into left and right motor powers.
#[derive(Debug, Clone)]
pub struct TankDriveInterpreter {
    reversed_side: Side,
    powers: [f64; NUM_TANK_MOTORS],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TankDriveInterpreter {
    pub fn new(reversed_side: Side) -> Self {
        Self {
            reversed_side,
            powers: [0.0; NUM_TANK_MOTORS],
        }
    }

    pub fn reversed_side(&self) -> Side {
        self.reversed_side
    }
}

impl VectorInterpreter for TankDriveInterpreter {
    fn process(&mut self, demand: &DriveDemand) {
        let sign = self.reversed_side.tank_sign();

        self.powers[TANK_LEFT] = demand.linear + demand.steer * sign;
        self.powers[TANK_RIGHT] = demand.linear - demand.steer * sign;

        normalise(&mut self.powers);
    }

    fn stop(&mut self) {
        self.powers = [0.0; NUM_TANK_MOTORS];
    }

    fn motor_inputs(&self) -> &[f64] {
        &self.powers
    }
}

impl Debuggable for TankDriveInterpreter {
    fn debug(&self, logger: &mut DebugLogger) {
        logger.log_value("Left Power", self.powers[TANK_LEFT]);
        logger.log_value("Right Power", self.powers[TANK_RIGHT]);
    }
}
