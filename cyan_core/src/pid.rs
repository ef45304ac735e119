//! # PID controller
//!
//! Time-aware PID controller used by the path follower to steer onto the
//! target point. The controller samples its own clock on each update so the
//! caller never passes in a delta-time.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::time::Instant;
use log::trace;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Time steps at or below this are treated as a fresh start of the controller.
///
/// Units: seconds
pub const MIN_TIME_STEP_S: f64 = 1e-6;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A monotonic source of time.
pub trait Clock {
    /// Seconds elapsed since an arbitrary but fixed origin.
    fn now_s(&self) -> f64;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Wall clock backed by [`std::time::Instant`].
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

/// Gains of a PID controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidCoefficients {
    /// Proportional gain
    pub k_p: f64,

    /// Integral gain
    pub k_i: f64,

    /// Derivative gain
    pub k_d: f64,
}

/// A PID controller
#[derive(Debug, Serialize, Clone)]
pub struct PidController<C: Clock = MonotonicClock> {
    /// Controller gains
    coeffs: PidCoefficients,

    /// Time the previous error was passed in, `None` until the first update
    /// after construction or a reset.
    prev_time_s: Option<f64>,

    /// Previous error
    prev_error: f64,

    /// The integral accumulation
    integral: f64,

    /// Symmetric limit on the integral accumulation
    max_integral: f64,

    #[serde(skip)]
    clock: C,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_s(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

impl PidCoefficients {
    pub fn new(k_p: f64, k_i: f64, k_d: f64) -> Self {
        Self { k_p, k_i, k_d }
    }
}

impl PidController<MonotonicClock> {
    /// Create a new controller with the given gains, timed by the wall clock.
    pub fn new(coeffs: PidCoefficients) -> Self {
        Self::with_clock(coeffs, MonotonicClock::new())
    }
}

impl<C: Clock> PidController<C> {
    /// Create a new controller timed by the given clock.
    pub fn with_clock(coeffs: PidCoefficients, clock: C) -> Self {
        Self {
            coeffs,
            prev_time_s: None,
            prev_error: 0.0,
            integral: 0.0,
            max_integral: f64::MAX,
            clock,
        }
    }

    /// Get the output of the controller for the given error.
    ///
    /// The first update after construction or [`reset_integral`] only
    /// applies the proportional term, since there is no time step to
    /// integrate or differentiate over. The same applies when the clock has
    /// not advanced by more than [`MIN_TIME_STEP_S`].
    ///
    /// [`reset_integral`]: PidController::reset_integral
    pub fn update(&mut self, error: f64) -> f64 {
        let curr_time_s = self.clock.now_s();

        let dt = match self.prev_time_s {
            Some(t0) => curr_time_s - t0,
            None => 0.0,
        };

        if dt <= MIN_TIME_STEP_S {
            self.prev_time_s = Some(curr_time_s);
            self.prev_error = error;
            return self.coeffs.k_p * error;
        }

        // Accumulate then saturate the integral term
        self.integral = (self.integral + error * dt)
            .max(-self.max_integral)
            .min(self.max_integral);

        let deriv = (error - self.prev_error) / dt;

        let out = self.coeffs.k_p * error
            + self.coeffs.k_i * self.integral
            + self.coeffs.k_d * deriv;

        trace!(
            "PID: err = {:.6}, dt = {:.6}, int = {:.6}, deriv = {:.6}, out = {:.6}",
            error, dt, self.integral, deriv, out
        );

        self.prev_error = error;
        self.prev_time_s = Some(curr_time_s);

        out
    }

    /// Clear the integral and restart the controller as if newly created.
    pub fn reset_integral(&mut self) {
        self.integral = 0.0;
        self.prev_time_s = None;
    }

    /// Set the limit on the magnitude of the integral accumulation.
    pub fn set_max_integral(&mut self, max_integral: f64) {
        self.max_integral = max_integral.abs();
        self.integral = self.integral.max(-self.max_integral).min(self.max_integral);
    }

    pub fn max_integral(&self) -> f64 {
        self.max_integral
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// Whether the controller has seen an update since creation or reset.
    pub fn is_initialised(&self) -> bool {
        self.prev_time_s.is_some()
    }

    pub fn coefficients(&self) -> PidCoefficients {
        self.coeffs
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Clock advanced by hand, shared between the test and the controller.
    #[derive(Debug, Clone, Default)]
    pub(crate) struct ManualClock(pub Rc<Cell<f64>>);

    impl ManualClock {
        pub(crate) fn advance(&self, dt_s: f64) {
            self.0.set(self.0.get() + dt_s);
        }
    }

    impl Clock for ManualClock {
        fn now_s(&self) -> f64 {
            self.0.get()
        }
    }

    #[test]
    fn test_first_update_is_proportional() {
        let clock = ManualClock::default();
        let mut pid = PidController::with_clock(
            PidCoefficients::new(2.0, 1.0, 0.5),
            clock.clone()
        );

        assert!(!pid.is_initialised());
        assert_eq!(pid.update(3.0), 6.0);
        assert!(pid.is_initialised());

        clock.advance(0.1);
        let out = pid.update(3.0);
        assert!((out - 6.3).abs() < 1e-9, "out = {}", out);
    }

    #[test]
    fn test_small_time_step_restarts() {
        let clock = ManualClock::default();
        let mut pid = PidController::with_clock(
            PidCoefficients::new(1.0, 10.0, 10.0),
            clock.clone()
        );

        pid.update(1.0);
        clock.advance(1e-7);
        assert_eq!(pid.update(2.0), 2.0);
        assert_eq!(pid.integral(), 0.0);
    }

    /// Under constant error the output tracks k_p*e + k_i*e*t regardless of
    /// how often the controller is called.
    #[test]
    fn test_constant_error_convergence() {
        let coeffs = PidCoefficients::new(0.5, 2.0, 1.0);
        let error = 0.25;

        for &steps in [4usize, 40, 400].iter() {
            let clock = ManualClock::default();
            let mut pid = PidController::with_clock(coeffs, clock.clone());
            let dt = 2.0 / steps as f64;

            let mut out = pid.update(error);
            for _ in 0..steps {
                clock.advance(dt);
                out = pid.update(error);
            }

            let expected = 0.5 * error + 2.0 * error * 2.0;
            assert!((out - expected).abs() < 1e-9, "steps = {}, out = {}", steps, out);
        }
    }

    #[test]
    fn test_integral_clamped() {
        let clock = ManualClock::default();
        let mut pid = PidController::with_clock(
            PidCoefficients::new(0.0, 1.0, 0.0),
            clock.clone()
        );
        pid.set_max_integral(-0.5);
        assert_eq!(pid.max_integral(), 0.5);

        pid.update(1.0);
        for _ in 0..10 {
            clock.advance(1.0);
            pid.update(1.0);
        }
        assert_eq!(pid.integral(), 0.5);

        for _ in 0..10 {
            clock.advance(1.0);
            pid.update(-1.0);
        }
        assert_eq!(pid.integral(), -0.5);
    }

    #[test]
    fn test_reset_integral() {
        let clock = ManualClock::default();
        let mut pid = PidController::with_clock(
            PidCoefficients::new(1.0, 1.0, 0.0),
            clock.clone()
        );

        pid.update(1.0);
        clock.advance(1.0);
        pid.update(1.0);
        assert_eq!(pid.integral(), 1.0);

        pid.reset_integral();
        assert_eq!(pid.integral(), 0.0);
        assert!(!pid.is_initialised());

        clock.advance(1.0);
        assert_eq!(pid.update(4.0), 4.0);
    }
}
