//! # Cyan core library.
//!
//! Odometry and pure-pursuit path following for small ground robots. The host
//! control loop owns a pose estimator and a [`traj_ctrl::PathFollower`], calls
//! the follower once per cycle and writes the resulting motor powers to its
//! hardware.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Debug sink - bounded buffer of named values and messages pushed by the other modules
pub mod debug;

/// Geometry - distances with units, points, poses and vectors
pub mod geom;

/// Localisation module - pose estimators for each supported chassis
pub mod loc;

/// Locomotion control module - mixes drive demands into per-motor powers
pub mod loco_ctrl;

/// Paths and point sequences followed by trajectory control
pub mod path;

/// Time-aware PID controller
pub mod pid;

/// Trajectory control module - pure-pursuit target selection and the path follower
pub mod traj_ctrl;
