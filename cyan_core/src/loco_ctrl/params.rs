//! Parameters structure for LocoCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Parameters for locomotion control, selecting the chassis.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "chassis", rename_all = "snake_case")]
pub enum Params {
    Tank {
        /// Side whose motors are mounted mirrored
        reversed_side: Side,
    },
    Mecanum {
        /// Side whose motors are mounted mirrored
        reversed_side: Side,
    },
}

/// Side of the chassis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Side {
    /// Sign applied to the steering term of a tank mixer.
    pub fn tank_sign(&self) -> f64 {
        match self {
            Side::Left => 1.0,
            Side::Right => -1.0,
        }
    }

    /// Sign applied to the strafe term of a mecanum mixer.
    pub fn mecanum_sign(&self) -> f64 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }
}
