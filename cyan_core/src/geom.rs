//! # Geometry
//!
//! Value types shared by every other module: [`Distance`] binds a length to a
//! [`DistanceUnit`], [`Point`] and [`Pose2D`] are raw coordinates in whatever
//! unit the caller works in, and [`SmartPoint`]/[`SmartVector`] carry their
//! unit with them so they can be converted at API boundaries.
//!
//! All constructors reject non-finite inputs.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::convert::TryFrom;
use std::fmt;

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use util::maths::{hypot, wrap_to_pi};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Two distances closer than this (in meters) are considered equal.
pub const DISTANCE_EQ_TOLERANCE_M: f64 = 1e-10;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A length bound to a unit of measurement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "RawDistance")]
pub struct Distance {
    value: f64,
    unit: DistanceUnit,
}

#[derive(Deserialize)]
struct RawDistance {
    value: f64,
    unit: DistanceUnit,
}

/// A position in the plane, in an implicit unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    x: f64,
    y: f64,
}

/// A planar pose, position plus heading.
///
/// The heading is always held in (-pi, pi].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 3]", into = "[f64; 3]")]
pub struct Pose2D {
    x: f64,
    y: f64,
    heading_rad: f64,
}

/// A cartesian vector with its polar form precomputed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Vector2D {
    x: f64,
    y: f64,
    r: f64,
    theta_rad: f64,
}

/// A point whose coordinates carry their unit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SmartPoint {
    x: Distance,
    y: Distance,
    unit: DistanceUnit,
}

/// A displacement whose components carry their unit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SmartVector {
    x: Distance,
    y: Distance,
    unit: DistanceUnit,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Supported units of length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceUnit {
    Cm,
    Meter,
    Inch,
    Foot,
    Mm,
}

/// Errors raised when constructing geometry values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeomError {
    #[error("Expected a finite value for {what}, found {value}")]
    NonFinite { what: &'static str, value: f64 },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DistanceUnit {
    /// Number of meters in one of this unit.
    pub fn meters_per_unit(&self) -> f64 {
        match self {
            DistanceUnit::Cm => 0.01,
            DistanceUnit::Meter => 1.0,
            DistanceUnit::Inch => 0.0254,
            DistanceUnit::Foot => 0.3048,
            DistanceUnit::Mm => 0.001,
        }
    }

    /// Convert a raw value in this unit into `target`.
    pub fn convert(&self, value: f64, target: DistanceUnit) -> f64 {
        if *self == target {
            return value;
        }

        value * self.meters_per_unit() / target.meters_per_unit()
    }
}

impl fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DistanceUnit::Cm => "cm",
            DistanceUnit::Meter => "m",
            DistanceUnit::Inch => "in",
            DistanceUnit::Foot => "ft",
            DistanceUnit::Mm => "mm",
        };
        write!(f, "{}", s)
    }
}

impl Distance {
    pub fn new(value: f64, unit: DistanceUnit) -> Result<Self, GeomError> {
        Ok(Self {
            value: check_finite("distance", value)?,
            unit,
        })
    }

    /// The value in this distance's own unit.
    pub fn raw_value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> DistanceUnit {
        self.unit
    }

    /// The value expressed in `unit`.
    pub fn convert_to(&self, unit: DistanceUnit) -> f64 {
        self.unit.convert(self.value, unit)
    }

    pub fn in_cm(&self) -> f64 {
        self.convert_to(DistanceUnit::Cm)
    }

    pub fn in_meters(&self) -> f64 {
        self.convert_to(DistanceUnit::Meter)
    }

    pub fn in_inches(&self) -> f64 {
        self.convert_to(DistanceUnit::Inch)
    }

    pub fn in_feet(&self) -> f64 {
        self.convert_to(DistanceUnit::Foot)
    }

    pub fn in_mm(&self) -> f64 {
        self.convert_to(DistanceUnit::Mm)
    }

    /// Sum of two distances, expressed in this distance's unit.
    pub fn add(&self, other: &Distance) -> Result<Distance, GeomError> {
        Distance::new(self.value + other.convert_to(self.unit), self.unit)
    }

    /// Difference of two distances, expressed in this distance's unit.
    pub fn sub(&self, other: &Distance) -> Result<Distance, GeomError> {
        Distance::new(self.value - other.convert_to(self.unit), self.unit)
    }
}

impl PartialEq for Distance {
    fn eq(&self, other: &Self) -> bool {
        (self.in_meters() - other.in_meters()).abs() < DISTANCE_EQ_TOLERANCE_M
    }
}

impl TryFrom<RawDistance> for Distance {
    type Error = GeomError;

    fn try_from(raw: RawDistance) -> Result<Self, Self::Error> {
        Distance::new(raw.value, raw.unit)
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

impl Point {
    pub fn new(x: f64, y: f64) -> Result<Self, GeomError> {
        Ok(Self {
            x: check_finite("point x", x)?,
            y: check_finite("point y", y)?,
        })
    }

    /// Build a point from values already known to be finite.
    pub(crate) fn from_raw(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn distance_from_origin(&self) -> f64 {
        hypot(self.x, self.y)
    }

    pub fn distance_from(&self, other: &Point) -> f64 {
        hypot(self.x - other.x, self.y - other.y)
    }

    /// Distance to the position of a pose, ignoring its heading.
    pub fn distance_from_pose(&self, pose: &Pose2D) -> f64 {
        hypot(self.x - pose.x, self.y - pose.y)
    }

    /// Angle of the point from the +ve x axis.
    pub fn angle(&self) -> f64 {
        self.y.atan2(self.x)
    }

    /// The point as a pose with zero heading.
    pub fn as_pose(&self) -> Pose2D {
        Pose2D::from_raw(self.x, self.y, 0.0)
    }

    /// The same point with both coordinates converted between units.
    pub fn convert(&self, from: DistanceUnit, to: DistanceUnit) -> Point {
        Point::from_raw(from.convert(self.x, to), from.convert(self.y, to))
    }
}

impl TryFrom<[f64; 2]> for Point {
    type Error = GeomError;

    fn try_from(xy: [f64; 2]) -> Result<Self, Self::Error> {
        Point::new(xy[0], xy[1])
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

impl From<Point> for Vector2<f64> {
    fn from(p: Point) -> Self {
        Vector2::new(p.x, p.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.x, self.y)
    }
}

impl Pose2D {
    /// Create a new pose, wrapping the heading into (-pi, pi].
    pub fn new(x: f64, y: f64, heading_rad: f64) -> Result<Self, GeomError> {
        Ok(Self {
            x: check_finite("pose x", x)?,
            y: check_finite("pose y", y)?,
            heading_rad: wrap_to_pi(check_finite("pose heading", heading_rad)?),
        })
    }

    pub(crate) fn from_raw(x: f64, y: f64, heading_rad: f64) -> Self {
        Self {
            x,
            y,
            heading_rad: wrap_to_pi(heading_rad),
        }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn heading_rad(&self) -> f64 {
        self.heading_rad
    }

    /// Position of the pose as a point.
    pub fn position(&self) -> Point {
        Point::from_raw(self.x, self.y)
    }

    pub fn distance_from(&self, point: &Point) -> f64 {
        point.distance_from_pose(self)
    }
}

impl TryFrom<[f64; 3]> for Pose2D {
    type Error = GeomError;

    fn try_from(xyh: [f64; 3]) -> Result<Self, Self::Error> {
        Pose2D::new(xyh[0], xyh[1], xyh[2])
    }
}

impl From<Pose2D> for [f64; 3] {
    fn from(p: Pose2D) -> Self {
        [p.x, p.y, p.heading_rad]
    }
}

impl fmt::Display for Pose2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.4}, {:.4}, {:.4} rad)",
            self.x, self.y, self.heading_rad
        )
    }
}

impl Vector2D {
    pub fn new(x: f64, y: f64) -> Result<Self, GeomError> {
        let x = check_finite("vector x", x)?;
        let y = check_finite("vector y", y)?;

        Ok(Self {
            x,
            y,
            r: hypot(x, y),
            theta_rad: y.atan2(x),
        })
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    /// Polar radius.
    pub fn r(&self) -> f64 {
        self.r
    }

    /// Polar angle from the +ve x axis.
    pub fn theta_rad(&self) -> f64 {
        self.theta_rad
    }
}

impl SmartPoint {
    pub fn new(x: f64, y: f64, unit: DistanceUnit) -> Result<Self, GeomError> {
        Ok(Self {
            x: Distance::new(x, unit)?,
            y: Distance::new(y, unit)?,
            unit,
        })
    }

    /// Build from two distances, adopting the unit of `x`.
    pub fn from_distances(x: Distance, y: Distance) -> Result<Self, GeomError> {
        let unit = x.unit();
        Self::new(x.raw_value(), y.convert_to(unit), unit)
    }

    pub fn x(&self) -> Distance {
        self.x
    }

    pub fn y(&self) -> Distance {
        self.y
    }

    pub fn unit(&self) -> DistanceUnit {
        self.unit
    }

    /// Raw point in this point's own unit.
    pub fn as_point(&self) -> Point {
        Point::from_raw(self.x.raw_value(), self.y.raw_value())
    }

    /// Raw point converted into `unit`.
    pub fn as_point_in(&self, unit: DistanceUnit) -> Point {
        Point::from_raw(self.x.convert_to(unit), self.y.convert_to(unit))
    }

    pub fn distance_from_origin(&self) -> Distance {
        Distance {
            value: self.as_point().distance_from_origin(),
            unit: self.unit,
        }
    }

    /// Distance to another point, expressed in this point's unit.
    pub fn distance_from(&self, other: &SmartPoint) -> Distance {
        Distance {
            value: self.as_point().distance_from(&other.as_point_in(self.unit)),
            unit: self.unit,
        }
    }

    /// Angle of the point from the +ve x axis.
    pub fn angle(&self) -> f64 {
        self.as_point().angle()
    }
}

impl SmartVector {
    pub fn new(x: f64, y: f64, unit: DistanceUnit) -> Result<Self, GeomError> {
        Ok(Self {
            x: Distance::new(x, unit)?,
            y: Distance::new(y, unit)?,
            unit,
        })
    }

    pub fn x(&self) -> Distance {
        self.x
    }

    pub fn y(&self) -> Distance {
        self.y
    }

    pub fn unit(&self) -> DistanceUnit {
        self.unit
    }

    /// Length of the vector in its own unit.
    pub fn magnitude(&self) -> Distance {
        Distance {
            value: hypot(self.x.raw_value(), self.y.raw_value()),
            unit: self.unit,
        }
    }

    /// Cartesian vector converted into `unit`.
    pub fn as_vector_in(&self, unit: DistanceUnit) -> Vector2D {
        let x = self.x.convert_to(unit);
        let y = self.y.convert_to(unit);
        Vector2D {
            x,
            y,
            r: hypot(x, y),
            theta_rad: y.atan2(x),
        }
    }

    /// The vector as a zero-heading pose in `unit`.
    pub fn as_pose_in(&self, unit: DistanceUnit) -> Pose2D {
        Pose2D::from_raw(self.x.convert_to(unit), self.y.convert_to(unit), 0.0)
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Return `value` if it is finite, otherwise a [`GeomError::NonFinite`].
pub fn check_finite(what: &'static str, value: f64) -> Result<f64, GeomError> {
    if value.is_finite() {
        Ok(value)
    }
    else {
        Err(GeomError::NonFinite { what, value })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::PI;

    const UNITS: [DistanceUnit; 5] = [
        DistanceUnit::Cm,
        DistanceUnit::Meter,
        DistanceUnit::Inch,
        DistanceUnit::Foot,
        DistanceUnit::Mm,
    ];

    #[test]
    fn test_distance_conversion() {
        let d = Distance::new(1.0, DistanceUnit::Foot).unwrap();
        assert!((d.in_inches() - 12.0).abs() < 1e-9);
        assert!((d.in_cm() - 30.48).abs() < 1e-9);
        assert!((d.in_mm() - 304.8).abs() < 1e-9);
        assert!((d.in_meters() - 0.3048).abs() < 1e-12);
    }

    /// Converting to any unit and back recovers the original value.
    #[test]
    fn test_distance_conversion_is_reversible() {
        for from in UNITS.iter() {
            for to in UNITS.iter() {
                let d = Distance::new(123.456, *from).unwrap();
                let there = Distance::new(d.convert_to(*to), *to).unwrap();
                assert!((there.convert_to(*from) - d.raw_value()).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_distance_arithmetic() {
        let a = Distance::new(1.0, DistanceUnit::Meter).unwrap();
        let b = Distance::new(50.0, DistanceUnit::Cm).unwrap();

        let sum = a.add(&b).unwrap();
        assert_eq!(sum.unit(), DistanceUnit::Meter);
        assert!((sum.raw_value() - 1.5).abs() < 1e-12);

        let diff = b.sub(&a).unwrap();
        assert_eq!(diff.unit(), DistanceUnit::Cm);
        assert!((diff.raw_value() + 50.0).abs() < 1e-9);

        assert_eq!(Distance::new(100.0, DistanceUnit::Cm).unwrap(), a);
        assert_ne!(b, a);
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(Distance::new(f64::NAN, DistanceUnit::Meter).is_err());
        assert!(Point::new(0.0, f64::INFINITY).is_err());
        assert!(Pose2D::new(0.0, 0.0, f64::NAN).is_err());
        assert!(Vector2D::new(f64::NEG_INFINITY, 0.0).is_err());
        assert!(matches!(
            Point::new(f64::NAN, 0.0),
            Err(GeomError::NonFinite { what: "point x", .. })
        ));
    }

    #[test]
    fn test_point() {
        let p = Point::new(3.0, 4.0).unwrap();
        assert_eq!(p.distance_from_origin(), 5.0);
        assert_eq!(p.distance_from(&Point::new(3.0, 0.0).unwrap()), 4.0);
        assert!((p.angle() - (4.0f64).atan2(3.0)).abs() < 1e-12);

        let pose = Pose2D::new(0.0, 4.0, 1.0).unwrap();
        assert_eq!(p.distance_from_pose(&pose), 3.0);
        assert_eq!(pose.distance_from(&p), 3.0);
    }

    /// Every pose holds a heading that is already wrapped.
    #[test]
    fn test_pose_heading_is_wrapped() {
        for i in -50..50 {
            let pose = Pose2D::new(0.0, 0.0, i as f64 * 0.9).unwrap();
            let h = pose.heading_rad();
            assert!(h > -PI && h <= PI);
            assert_eq!(wrap_to_pi(h), h);
        }
    }

    #[test]
    fn test_vector2d_polar() {
        let v = Vector2D::new(0.0, 2.0).unwrap();
        assert_eq!(v.r(), 2.0);
        assert!((v.theta_rad() - PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_smart_point() {
        let a = SmartPoint::new(100.0, 0.0, DistanceUnit::Cm).unwrap();
        let b = SmartPoint::new(1.0, 1.0, DistanceUnit::Meter).unwrap();

        let pm = a.as_point_in(DistanceUnit::Meter);
        assert!((pm.x() - 1.0).abs() < 1e-12);

        // Distance uses both axes, in the unit of the first point
        let d = a.distance_from(&b);
        assert_eq!(d.unit(), DistanceUnit::Cm);
        assert!((d.raw_value() - 100.0).abs() < 1e-9);

        assert_eq!(
            b.distance_from_origin(),
            Distance::new(2f64.sqrt(), DistanceUnit::Meter).unwrap()
        );

        let c = SmartPoint::from_distances(
            Distance::new(1.0, DistanceUnit::Foot).unwrap(),
            Distance::new(6.0, DistanceUnit::Inch).unwrap(),
        )
        .unwrap();
        assert_eq!(c.unit(), DistanceUnit::Foot);
        assert!((c.as_point().y() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_smart_vector() {
        let v = SmartVector::new(30.0, 40.0, DistanceUnit::Cm).unwrap();
        assert!((v.magnitude().raw_value() - 50.0).abs() < 1e-12);

        let vm = v.as_vector_in(DistanceUnit::Meter);
        assert!((vm.r() - 0.5).abs() < 1e-12);

        let pose = v.as_pose_in(DistanceUnit::Mm);
        assert!((pose.x() - 300.0).abs() < 1e-9);
        assert_eq!(pose.heading_rad(), 0.0);
    }

    #[test]
    fn test_point_deserialise() {
        let p: Point = serde_json::from_str("[1.5, -2.0]").unwrap();
        assert_eq!(p, Point::new(1.5, -2.0).unwrap());

        let d: Distance = serde_json::from_str(r#"{"value": 2.0, "unit": "inch"}"#).unwrap();
        assert_eq!(d.unit(), DistanceUnit::Inch);
    }
}
