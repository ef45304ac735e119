//! # Simulation Executable Parameters
//!
//! This module provides parameters for the simulation executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use cyan_core::{
    debug::DEFAULT_CAPACITY,
    geom::{DistanceUnit, Point},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Deserialize, Debug, Clone)]
pub struct SimExecParams {

    /// Period of one control cycle
    pub cycle_period_s: f64,

    /// Number of cycles after which the run is abandoned if the sequence has
    /// not been finished
    pub max_cycles: u64,

    /// If true each cycle is padded out to the cycle period, otherwise the
    /// simulation runs as fast as possible
    #[serde(default)]
    pub real_time: bool,

    /// Ground speed of a wheel driven at full power, in the unit of the pose
    /// estimate per second
    pub full_power_speed: f64,

    /// Separation of the simulated chassis' drive wheels
    pub track_width: f64,

    /// Capacity of the debug logger, which is dumped every cycle
    #[serde(default = "default_debug_capacity")]
    pub debug_capacity: usize,

    /// Unit of the path points, if different from the pose estimate's
    #[serde(default)]
    pub path_unit: Option<DistanceUnit>,

    /// The sequence of paths to follow
    pub paths: Vec<Vec<Point>>,
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn default_debug_capacity() -> usize {
    DEFAULT_CAPACITY
}
