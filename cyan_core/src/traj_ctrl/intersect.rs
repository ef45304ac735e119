//! # Circle-line intersection
//!
//! The pure pursuit kernel. Each cycle a circle of radius `lookahead` is
//! placed on the robot and intersected with the line through the current
//! path segment `A -> B`. Intersections outside the segment's bounding box
//! are discarded and the remaining one furthest along the segment (furthest
//! from `A`) becomes the target.
//!
//! The line is solved in slope form with the circle centre as the origin:
//!
//! ```text
//! x^2 (1 + m^2) + x (2 m y1 - 2 m^2 x1) + (m^2 x1^2 - 2 y1 m x1 + y1^2 - R^2) = 0
//! ```
//!
//! where `(x1, y1) = A - C`. An axis-aligned segment is handled by nudging
//! `A` off the axis by the difference threshold, keeping `m` finite.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace};

// Internal
use super::TrajCtrlError;
use crate::debug::{self, DebugLogger, Debuggable, MessageLevel, SharedDebugLogger};
use crate::geom::Point;
use crate::loc::PoseProvider;
use crate::path::Path;
use util::maths::in_range;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Slack on the bounding box test, absorbs rounding in the root calculation.
const BOUND_TOLERANCE: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Pure pursuit target calculator.
#[derive(Debug, Clone)]
pub struct CircleLineIntersection {
    lookahead: f64,
    admissible_error: f64,
    difference_threshold: f64,

    logger: Option<SharedDebugLogger>,

    report: IntersectReport,
}

/// Working values of the latest target calculation.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntersectReport {
    /// Discriminant of the latest quadratic
    pub discriminant: f64,

    /// Number of admitted intersections
    pub num_solutions: usize,

    /// First root, admitted or not
    pub solution_1: Option<Point>,

    /// Second root, admitted or not
    pub solution_2: Option<Point>,

    /// Segment the target was found on
    pub segment_index: usize,

    /// Whether the path was finished at the latest calculation
    pub path_finished: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Failures of the intersection calculation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntersectError {
    #[error("Segment line does not cross the lookahead circle (discriminant {discriminant})")]
    ChordMiss { discriminant: f64 },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CircleLineIntersection {
    /// Create a new kernel.
    ///
    /// The lookahead must be finite and positive, the admissible error finite
    /// and non-negative.
    pub fn new(lookahead: f64, admissible_error: f64) -> Result<Self, TrajCtrlError> {
        if !lookahead.is_finite() || lookahead <= 0.0 {
            return Err(TrajCtrlError::InvalidParam {
                name: "lookahead",
                value: lookahead,
            });
        }

        if !admissible_error.is_finite() || admissible_error < 0.0 {
            return Err(TrajCtrlError::InvalidParam {
                name: "admissible_error",
                value: admissible_error,
            });
        }

        Ok(Self {
            lookahead,
            admissible_error,
            difference_threshold: super::DEFAULT_DIFFERENCE_THRESHOLD,
            logger: None,
            report: IntersectReport::default(),
        })
    }

    pub fn set_difference_threshold(&mut self, threshold: f64) -> Result<(), TrajCtrlError> {
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(TrajCtrlError::InvalidParam {
                name: "difference_threshold",
                value: threshold,
            });
        }

        self.difference_threshold = threshold;
        Ok(())
    }

    pub fn lookahead(&self) -> f64 {
        self.lookahead
    }

    pub fn admissible_error(&self) -> f64 {
        self.admissible_error
    }

    pub fn difference_threshold(&self) -> f64 {
        self.difference_threshold
    }

    pub fn report(&self) -> IntersectReport {
        self.report
    }

    /// Record recovered conditions in the given logger as well as the log.
    pub fn attach_logger(&mut self, logger: SharedDebugLogger) {
        self.logger = Some(logger);
    }

    /// Intersect the line through `a -> b` with the lookahead circle around
    /// `centre`.
    ///
    /// Returns the intersections lying within the bounding box of the
    /// segment, which may be none.
    pub fn intersect(
        &mut self,
        a: Point,
        b: Point,
        centre: Point
    ) -> Result<Vec<Point>, IntersectError> {
        let eps = self.difference_threshold;

        // Keep the slope finite and non-zero
        let mut ax = a.x();
        let mut ay = a.y();
        if (ax - b.x()).abs() < eps {
            ax += eps;
        }
        if (ay - b.y()).abs() < eps {
            ay += eps;
        }

        let m = (b.y() - ay) / (b.x() - ax);

        // Segment start relative to the circle centre
        let x1 = ax - centre.x();
        let y1 = ay - centre.y();

        let qa = 1.0 + m.powi(2);
        let qb = 2.0 * m * y1 - 2.0 * m.powi(2) * x1;
        let qc = m.powi(2) * x1.powi(2) - 2.0 * y1 * m * x1 + y1.powi(2)
            - self.lookahead.powi(2);

        let discriminant = qb.powi(2) - 4.0 * qa * qc;
        self.report.discriminant = discriminant;
        self.report.solution_1 = None;
        self.report.solution_2 = None;
        self.report.num_solutions = 0;

        if discriminant < 0.0 {
            return Err(IntersectError::ChordMiss { discriminant });
        }

        let root = |sign: f64| {
            let x = (-qb + sign * discriminant.sqrt()) / (2.0 * qa);
            let y = m * (x - x1) + y1;
            Point::from_raw(x + centre.x(), y + centre.y())
        };
        let sol_1 = root(1.0);
        let sol_2 = root(-1.0);

        self.report.solution_1 = Some(sol_1);
        self.report.solution_2 = Some(sol_2);

        let (min_x, max_x) = (ax.min(b.x()), ax.max(b.x()));
        let (min_y, max_y) = (ay.min(b.y()), ay.max(b.y()));

        let solutions: Vec<Point> = [sol_1, sol_2]
            .iter()
            .copied()
            .filter(|p| {
                in_range(min_x - BOUND_TOLERANCE, max_x + BOUND_TOLERANCE, p.x())
                    && in_range(min_y - BOUND_TOLERANCE, max_y + BOUND_TOLERANCE, p.y())
            })
            .collect();

        self.report.num_solutions = solutions.len();

        trace!(
            "Intersect: D = {:.6}, roots = {} and {}, admitted = {}",
            discriminant, sol_1, sol_2, solutions.len()
        );

        Ok(solutions)
    }

    /// Calculate the pure pursuit target point on the path.
    ///
    /// Updates the pose provider once, then advances the path's segment
    /// cursor if the end of the segment is within the lookahead or the robot
    /// has drifted closer to a later waypoint. Returns `None` once the path is
    /// finished, or if no target can be found.
    pub fn target_point<P>(
        &mut self,
        path: &mut Path,
        provider: &mut P
    ) -> Result<Option<Point>, TrajCtrlError>
    where
        P: PoseProvider
    {
        provider.update()?;
        let pose = provider.pose();

        self.report.path_finished = path.is_finished(&pose);
        if self.report.path_finished {
            return Ok(None);
        }

        let (_, b) = path.current_segment();
        let closest_next = path.closest_next_point(&pose);

        let b_dist = b.distance_from_pose(&pose);
        let drifted = match closest_next {
            Some(p) => p.distance_from_pose(&pose) < b_dist,
            None => false,
        };

        if b_dist <= self.lookahead || drifted {
            path.next_segment();
        }

        let (a, b) = path.current_segment();
        self.report.segment_index = path.segment_index();

        let mut candidates = match self.intersect(a, b, pose.position()) {
            Ok(s) => s,
            Err(e) => {
                debug::report(
                    self.logger.as_ref(),
                    MessageLevel::Warning,
                    &format!("{}, targeting the closest waypoint", e)
                );
                vec![path.closest_point(&pose)]
            }
        };

        // The end of the path is inside the circle, so aim straight for it
        if path.is_on_last_segment() && b.distance_from_pose(&pose) <= self.lookahead {
            candidates.push(b);
        }

        Ok(select_furthest_along(&candidates, &a).or_else(|| {
            debug!("No admitted intersection, targeting the next closest waypoint");
            closest_next
        }))
    }
}

impl Debuggable for CircleLineIntersection {
    fn debug(&self, logger: &mut DebugLogger) {
        let r = &self.report;

        logger.log_value("Discriminant", r.discriminant);
        logger.log_value("Solutions", r.num_solutions);

        if let Some(s) = r.solution_1 {
            logger.log_value("Solution 1 X", s.x());
            logger.log_value("Solution 1 Y", s.y());
        }
        if let Some(s) = r.solution_2 {
            logger.log_value("Solution 2 X", s.x());
            logger.log_value("Solution 2 Y", s.y());
        }

        logger.log_value("Segment Id", r.segment_index);
        logger.log_value("Is Path Finished", r.path_finished);
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// The candidate furthest from the segment start, i.e. furthest along the
/// segment towards its end.
fn select_furthest_along(candidates: &[Point], start: &Point) -> Option<Point> {
    candidates.iter().copied().fold(None, |best: Option<Point>, p| match best {
        Some(b) if b.distance_from(start) >= p.distance_from(start) => Some(b),
        _ => Some(p),
    })
}
