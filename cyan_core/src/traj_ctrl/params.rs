//! Trajectory control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use crate::geom::DistanceUnit;
use crate::pid::PidCoefficients;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for trajectory control
#[derive(Deserialize, Debug, Clone)]
pub struct Params {

    /// Radius of the pure pursuit circle around the robot.
    pub lookahead: f64,

    /// Distance to a target point under which it is considered reached, also
    /// used as the finishing distance of followed paths.
    pub admissible_error: f64,

    /// Heading controller proportional gain
    pub k_p: f64,

    /// Heading controller integral gain
    pub k_i: f64,

    /// Heading controller derivative gain
    pub k_d: f64,

    /// Limit on the heading controller's integral accumulation, unlimited
    /// if not given.
    #[serde(default)]
    pub max_integral: Option<f64>,

    /// If true the robot drives backwards towards targets behind it instead
    /// of turning round.
    #[serde(default = "default_reverse_drive")]
    pub reverse_drive: bool,

    /// Axis separation below which a segment endpoint is nudged to keep the
    /// segment's slope finite.
    #[serde(default = "default_difference_threshold")]
    pub difference_threshold: f64,

    /// Unit of the pose estimate. Targets given in another unit are
    /// converted into this one.
    #[serde(default)]
    pub distance_unit: Option<DistanceUnit>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Gains of the heading controller.
    pub fn pid_coefficients(&self) -> PidCoefficients {
        PidCoefficients::new(self.k_p, self.k_i, self.k_d)
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn default_reverse_drive() -> bool {
    true
}

fn default_difference_threshold() -> f64 {
    super::DEFAULT_DIFFERENCE_THRESHOLD
}
