//! # Path
//!
//! This module defines the paths followed by trajectory control: a [`Path`] of
//! waypoints with a segment cursor, a [`PointSequence`] of individual targets,
//! and a [`PathSequence`] chaining several paths together.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;
use nalgebra::Vector2;
use serde::Serialize;

use crate::geom::{DistanceUnit, GeomError, Point, Pose2D};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default distance from the final point at which a path is finished.
pub const DEFAULT_ADMISSIBLE_ERROR: f64 = 0.05;

/// A candidate point must be closer than the current best by at least this
/// to replace it in the nearest point searches. Prevents the result chattering
/// between two almost equidistant points under sensor noise.
pub const NEAREST_HYSTERESIS: f64 = 0.003;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A path defining the desired trajectory of the robot.
#[derive(Clone, Serialize, Debug)]
pub struct Path {
    points: Vec<Point>,

    /// Index of the first point of the current segment
    segment_index: usize,

    /// Set once the cursor reaches the final segment, cleared only by reset
    on_last_segment: bool,

    /// Distance from the final point at which the path is finished
    admissible_error: f64,

    unit: Option<DistanceUnit>,
}

/// An ordered list of points visited one after the other.
#[derive(Clone, Serialize, Debug)]
pub struct PointSequence {
    points: Vec<Point>,
    index: usize,
    unit: Option<DistanceUnit>,
}

/// An ordered list of paths followed one after the other.
#[derive(Clone, Serialize, Debug)]
pub struct PathSequence {
    paths: Vec<Path>,
    index: usize,
    admissible_error: f64,
}

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("A path needs at least two points, found {0}")]
    TooFewPoints(usize),

    #[error("Index {index} is out of range for a sequence of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Point separation must be finite and positive, found {0}")]
    InvalidSeparation(f64),

    #[error("Admissible error must be finite and non-negative, found {0}")]
    InvalidAdmissibleError(f64),

    #[error("Attempted to create a sequence with no elements")]
    EmptySequence,

    #[error("Geometry error: {0}")]
    Geom(#[from] GeomError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Path {
    /// Create a new path through the given points.
    pub fn new(points: Vec<Point>) -> Result<Self, PathError> {
        if points.len() < 2 {
            return Err(PathError::TooFewPoints(points.len()));
        }

        Ok(Self {
            points,
            segment_index: 0,
            on_last_segment: false,
            admissible_error: DEFAULT_ADMISSIBLE_ERROR,
            unit: None,
        })
    }

    /// Create a new path whose points are in the given unit.
    pub fn with_unit(points: Vec<Point>, unit: DistanceUnit) -> Result<Self, PathError> {
        let mut path = Self::new(points)?;
        path.unit = Some(unit);
        Ok(path)
    }

    /// Produces a direct path between the two points, with each point in the
    /// path having at most the given separation.
    pub fn direct(from: Point, to: Point, separation: f64) -> Result<Self, PathError> {
        if !separation.is_finite() || separation <= 0.0 {
            return Err(PathError::InvalidSeparation(separation));
        }

        let start: Vector2<f64> = from.into();
        let diff_vec = Vector2::from(to) - start;
        let dist = diff_vec.norm();

        // If the points are closer than the separation just produce a new path
        // with the from and to being the only points.
        if dist <= separation {
            return Self::new(vec![from, to]);
        }

        // Number of whole separations that fit, the remainder is left as a
        // shorter final segment
        let num_steps = (dist / separation).floor() as usize;
        let delta = separation / dist * diff_vec;

        let mut points = Vec::with_capacity(num_steps + 2);
        for i in 0..=num_steps {
            let p = start + delta * i as f64;
            points.push(Point::new(p[0], p[1])?);
        }

        // Only add the end if it isn't already the last step
        if let Some(last) = points.last() {
            if last.distance_from(&to) > f64::EPSILON * dist.max(1.0) {
                points.push(to);
            }
        }

        Self::new(points)
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Number of points in the path.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn last_point(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    pub fn segment_index(&self) -> usize {
        self.segment_index
    }

    pub fn is_on_last_segment(&self) -> bool {
        self.on_last_segment
    }

    pub fn admissible_error(&self) -> f64 {
        self.admissible_error
    }

    pub fn set_admissible_error(&mut self, error: f64) -> Result<(), PathError> {
        if !error.is_finite() || error < 0.0 {
            return Err(PathError::InvalidAdmissibleError(error));
        }

        self.admissible_error = error;
        Ok(())
    }

    pub fn unit(&self) -> Option<DistanceUnit> {
        self.unit
    }

    pub fn set_unit(&mut self, unit: Option<DistanceUnit>) {
        self.unit = unit;
    }

    /// Convert the points into `unit`. Does nothing if the path's own unit is
    /// not known.
    pub fn convert_to(&mut self, unit: DistanceUnit) {
        let from = match self.unit {
            Some(u) if u != unit => u,
            _ => return,
        };

        for p in self.points.iter_mut() {
            *p = p.convert(from, unit);
        }
        self.unit = Some(unit);
    }

    /// The two endpoints of the current segment.
    pub fn current_segment(&self) -> (Point, Point) {
        (self.points[self.segment_index], self.points[self.segment_index + 1])
    }

    /// Move the cursor onto the next segment, staying on the last segment
    /// once it is reached.
    pub fn next_segment(&mut self) {
        if self.on_last_segment {
            return;
        }

        self.segment_index += 1;

        if self.segment_index >= self.points.len() - 1 {
            self.on_last_segment = true;
            self.segment_index = self.points.len() - 2;
        }

        debug!(
            "Path advanced to segment {} (last: {})",
            self.segment_index, self.on_last_segment
        );
    }

    /// Whether the pose is at the end of the path.
    pub fn is_finished(&self, pose: &Pose2D) -> bool {
        self.on_last_segment
            && self.last_point().distance_from_pose(pose) < self.admissible_error
    }

    /// Move the cursor back to the first segment.
    pub fn reset(&mut self) {
        self.segment_index = 0;
        self.on_last_segment = false;
    }

    /// Nearest waypoint to the pose.
    pub fn closest_point(&self, pose: &Pose2D) -> Point {
        // A path always has at least two points so the search always succeeds
        nearest(&self.points, pose).unwrap_or(self.points[0])
    }

    /// Nearest waypoint beyond the end of the current segment, if any.
    pub fn closest_next_point(&self, pose: &Pose2D) -> Option<Point> {
        match self.points.get(self.segment_index + 2..) {
            Some(rest) => nearest(rest, pose),
            None => None,
        }
    }

    /// Return the total length of the path.
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| w[0].distance_from(&w[1]))
            .sum()
    }

    /// A copy of the path running the other way, with its cursor reset.
    pub fn reversed(&self) -> Path {
        let mut path = self.clone();
        path.points.reverse();
        path.reset();
        path
    }
}

impl PointSequence {
    pub fn new(points: Vec<Point>) -> Result<Self, PathError> {
        if points.is_empty() {
            return Err(PathError::EmptySequence);
        }

        Ok(Self {
            points,
            index: 0,
            unit: None,
        })
    }

    /// The point currently being targeted.
    pub fn current(&self) -> Point {
        self.points[self.index]
    }

    /// Advance to the next point.
    ///
    /// Returns `None` without moving if the sequence is on its final point.
    pub fn next_point(&mut self) -> Option<Point> {
        if self.index + 1 >= self.points.len() {
            return None;
        }

        self.index += 1;
        Some(self.current())
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn append(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn insert(&mut self, index: usize, point: Point) -> Result<(), PathError> {
        if index > self.points.len() {
            return Err(PathError::IndexOutOfRange {
                index,
                len: self.points.len(),
            });
        }

        self.points.insert(index, point);
        Ok(())
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }

    /// A copy of the sequence in reverse order, starting from its first point.
    pub fn reversed(&self) -> PointSequence {
        let mut seq = self.clone();
        seq.points.reverse();
        seq.reset();
        seq
    }

    pub fn unit(&self) -> Option<DistanceUnit> {
        self.unit
    }

    pub fn set_unit(&mut self, unit: Option<DistanceUnit>) {
        self.unit = unit;
    }
}

impl PathSequence {
    /// Create a new sequence, setting the admissible error of every path.
    pub fn new(paths: Vec<Path>, admissible_error: f64) -> Result<Self, PathError> {
        if paths.is_empty() {
            return Err(PathError::EmptySequence);
        }

        let mut seq = Self {
            paths: Vec::with_capacity(paths.len()),
            index: 0,
            admissible_error,
        };

        for path in paths {
            seq.append(path)?;
        }

        Ok(seq)
    }

    /// Get the path which should be followed this cycle.
    ///
    /// Moves onto the next path once the current one is finished. Returns
    /// `None` only when the final path is finished.
    pub fn next_update(&mut self, pose: &Pose2D) -> Option<&mut Path> {
        if self.paths[self.index].is_finished(pose) {
            if self.index + 1 >= self.paths.len() {
                return None;
            }

            self.index += 1;
            debug!("Path sequence moved onto path {}", self.index);
        }

        Some(&mut self.paths[self.index])
    }

    /// Whether the final path has been finished.
    pub fn is_finished(&self, pose: &Pose2D) -> bool {
        self.index + 1 == self.paths.len() && self.paths[self.index].is_finished(pose)
    }

    pub fn current(&self) -> &Path {
        &self.paths[self.index]
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    pub fn append(&mut self, mut path: Path) -> Result<(), PathError> {
        path.set_admissible_error(self.admissible_error)?;
        self.paths.push(path);
        Ok(())
    }

    pub fn insert(&mut self, index: usize, mut path: Path) -> Result<(), PathError> {
        if index > self.paths.len() {
            return Err(PathError::IndexOutOfRange {
                index,
                len: self.paths.len(),
            });
        }

        path.set_admissible_error(self.admissible_error)?;
        self.paths.insert(index, path);
        Ok(())
    }

    /// The sequence run backwards, each path reversed and reset.
    pub fn reversed(&self) -> PathSequence {
        PathSequence {
            paths: self.paths.iter().rev().map(|p| p.reversed()).collect(),
            index: 0,
            admissible_error: self.admissible_error,
        }
    }

    /// Go back to the start of the first path.
    pub fn reset(&mut self) {
        self.index = 0;
        for path in self.paths.iter_mut() {
            path.reset();
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Nearest point to the pose, with hysteresis in favour of earlier points.
fn nearest(points: &[Point], pose: &Pose2D) -> Option<Point> {
    let mut iter = points.iter();
    let first = iter.next()?;

    let mut best = *first;
    let mut best_dist = best.distance_from_pose(pose);

    for p in iter {
        let dist = p.distance_from_pose(pose);
        if best_dist - dist >= NEAREST_HYSTERESIS {
            best = *p;
            best_dist = dist;
        }
    }

    Some(best)
}

#[cfg(test)]
mod test {
    use super::*;

    fn pt(x: f64, y: f64) -> Point {
        Point::new(x, y).unwrap()
    }

    fn pose(x: f64, y: f64) -> Pose2D {
        Pose2D::new(x, y, 0.0).unwrap()
    }

    fn line(n: usize) -> Path {
        Path::new((0..n).map(|i| pt(i as f64, 0.0)).collect()).unwrap()
    }

    #[test]
    fn test_too_few_points() {
        assert!(matches!(Path::new(vec![]), Err(PathError::TooFewPoints(0))));
        assert!(matches!(Path::new(vec![pt(0.0, 0.0)]), Err(PathError::TooFewPoints(1))));
    }

    /// Whatever the number of advances, the current segment is a pair of
    /// consecutive points.
    #[test]
    fn test_segments_stay_consecutive() {
        for n in 2..7 {
            let mut path = line(n);
            for advances in 0..10 {
                let (a, b) = path.current_segment();
                let i = path.segment_index();
                assert!(i <= n - 2);
                assert_eq!(a, path.points()[i]);
                assert_eq!(b, path.points()[i + 1]);
                assert_eq!(path.is_on_last_segment(), advances >= n - 1);
                path.next_segment();
            }
        }
    }

    #[test]
    fn test_last_segment_is_sticky() {
        let mut path = line(3);
        path.next_segment();
        assert_eq!(path.segment_index(), 1);
        assert!(!path.is_on_last_segment());

        path.next_segment();
        assert_eq!(path.segment_index(), 1);
        assert!(path.is_on_last_segment());

        path.reset();
        assert_eq!(path.segment_index(), 0);
        assert!(!path.is_on_last_segment());
    }

    #[test]
    fn test_is_finished() {
        let mut path = line(2);
        let end = pose(1.0, 0.01);

        // Near the end but not on the last segment yet
        assert!(!path.is_finished(&end));

        path.next_segment();
        assert!(path.is_finished(&end));
        assert!(!path.is_finished(&pose(0.9, 0.0)));

        path.set_admissible_error(0.2).unwrap();
        assert!(path.is_finished(&pose(0.9, 0.0)));
        assert!(path.set_admissible_error(-1.0).is_err());
    }

    #[test]
    fn test_closest_point_hysteresis() {
        let path = Path::new(vec![pt(0.0, 0.0), pt(1.0, 0.0), pt(2.0, 0.0)]).unwrap();

        assert_eq!(path.closest_point(&pose(1.2, 0.0)), pt(1.0, 0.0));

        // Second point is closer, but not by enough to replace the first
        assert_eq!(path.closest_point(&pose(0.501, 0.0)), pt(0.0, 0.0));
        assert_eq!(path.closest_point(&pose(0.51, 0.0)), pt(1.0, 0.0));

        // Closer by exactly the hysteresis is enough
        let path = Path::new(vec![pt(0.006, 0.0), pt(0.003, 0.0)]).unwrap();
        assert_eq!(path.closest_point(&pose(0.0, 0.0)), pt(0.003, 0.0));
    }

    #[test]
    fn test_convert_to() {
        let mut path = Path::with_unit(vec![pt(0.0, 0.0), pt(150.0, -20.0)], DistanceUnit::Cm)
            .unwrap();

        path.convert_to(DistanceUnit::Meter);
        assert_eq!(path.unit(), Some(DistanceUnit::Meter));
        assert!((path.last_point().x() - 1.5).abs() < 1e-12);
        assert!((path.last_point().y() + 0.2).abs() < 1e-12);

        // Converting again is a no-op
        path.convert_to(DistanceUnit::Meter);
        assert!((path.last_point().x() - 1.5).abs() < 1e-12);

        // Without a unit the points are left alone
        let mut bare = Path::new(vec![pt(0.0, 0.0), pt(150.0, 0.0)]).unwrap();
        bare.convert_to(DistanceUnit::Meter);
        assert_eq!(bare.last_point(), pt(150.0, 0.0));
        assert_eq!(bare.unit(), None);
    }

    #[test]
    fn test_closest_next_point() {
        let mut path = line(4);
        assert_eq!(path.closest_next_point(&pose(0.0, 0.0)), Some(pt(2.0, 0.0)));
        assert_eq!(path.closest_next_point(&pose(5.0, 0.0)), Some(pt(3.0, 0.0)));

        path.next_segment();
        assert_eq!(path.closest_next_point(&pose(0.0, 0.0)), Some(pt(3.0, 0.0)));

        path.next_segment();
        assert_eq!(path.closest_next_point(&pose(0.0, 0.0)), None);
    }

    #[test]
    fn test_direct() {
        let path = Path::direct(pt(0.0, 0.0), pt(1.0, 0.0), 0.3).unwrap();
        let xs: Vec<f64> = path.points().iter().map(|p| p.x()).collect();
        assert_eq!(xs.len(), 5);
        assert!((xs[3] - 0.9).abs() < 1e-12);
        assert_eq!(xs[4], 1.0);
        assert!((path.length() - 1.0).abs() < 1e-12);

        let exact = Path::direct(pt(0.0, 0.0), pt(0.0, 1.0), 0.25).unwrap();
        assert_eq!(exact.len(), 5);

        let short = Path::direct(pt(0.0, 0.0), pt(0.1, 0.1), 1.0).unwrap();
        assert_eq!(short.len(), 2);

        assert!(matches!(
            Path::direct(pt(0.0, 0.0), pt(1.0, 0.0), 0.0),
            Err(PathError::InvalidSeparation(_))
        ));
    }

    #[test]
    fn test_reversed_path() {
        let mut path = Path::with_unit(vec![pt(0.0, 0.0), pt(1.0, 1.0), pt(3.0, 1.0)], DistanceUnit::Cm)
            .unwrap();
        path.next_segment();

        let rev = path.reversed();
        assert_eq!(rev.points()[0], pt(3.0, 1.0));
        assert_eq!(rev.segment_index(), 0);
        assert_eq!(rev.unit(), Some(DistanceUnit::Cm));
        assert!((rev.length() - path.length()).abs() < 1e-12);
    }

    #[test]
    fn test_point_sequence() {
        let mut seq = PointSequence::new(vec![pt(0.0, 0.0), pt(1.0, 0.0)]).unwrap();
        assert_eq!(seq.current(), pt(0.0, 0.0));
        assert_eq!(seq.next_point(), Some(pt(1.0, 0.0)));
        assert_eq!(seq.next_point(), None);
        assert_eq!(seq.current(), pt(1.0, 0.0));

        seq.append(pt(2.0, 0.0));
        assert_eq!(seq.next_point(), Some(pt(2.0, 0.0)));

        seq.insert(0, pt(-1.0, 0.0)).unwrap();
        assert!(seq.insert(10, pt(0.0, 0.0)).is_err());

        let rev = seq.reversed();
        assert_eq!(rev.current(), pt(2.0, 0.0));
        assert_eq!(rev.points().len(), 4);

        seq.reset();
        assert_eq!(seq.current(), pt(-1.0, 0.0));

        assert!(PointSequence::new(vec![]).is_err());
    }

    #[test]
    fn test_path_sequence() {
        let mut seq = PathSequence::new(vec![line(2), line(3).reversed()], 0.1).unwrap();
        assert_eq!(seq.current().admissible_error(), 0.1);

        // First path isn't finished until its cursor reaches the last segment
        let at_end = pose(1.0, 0.0);
        assert_eq!(seq.next_update(&at_end).map(|p| p.len()), Some(2));
        assert_eq!(seq.current_index(), 0);

        if let Some(path) = seq.next_update(&at_end) {
            path.next_segment();
        }
        assert_eq!(seq.next_update(&at_end).map(|p| p.len()), Some(3));
        assert_eq!(seq.current_index(), 1);

        // Finish the final path
        let home = pose(0.0, 0.0);
        if let Some(path) = seq.next_update(&home) {
            path.next_segment();
            path.next_segment();
        }
        assert!(seq.is_finished(&home));
        assert!(seq.next_update(&home).is_none());

        seq.reset();
        assert_eq!(seq.current_index(), 0);
        assert!(!seq.current().is_on_last_segment());
    }

    #[test]
    fn test_path_sequence_insert_and_reverse() {
        let mut seq = PathSequence::new(vec![line(2)], 0.2).unwrap();
        seq.insert(0, line(4)).unwrap();
        seq.append(line(3)).unwrap();
        assert!(seq.insert(5, line(2)).is_err());

        let lens: Vec<usize> = seq.paths().iter().map(|p| p.len()).collect();
        assert_eq!(lens, vec![4, 2, 3]);
        assert!(seq.paths().iter().all(|p| p.admissible_error() == 0.2));

        let rev = seq.reversed();
        let lens: Vec<usize> = rev.paths().iter().map(|p| p.len()).collect();
        assert_eq!(lens, vec![3, 2, 4]);
        assert_eq!(rev.paths()[0].points()[0], pt(2.0, 0.0));

        assert!(PathSequence::new(vec![], 0.1).is_err());
    }
}
