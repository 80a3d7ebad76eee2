use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use approx::abs_diff_eq;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use strum::{EnumIter, FromRepr};

use crate::error::DecodeError;

/// Functional Road Class.
/// The functional road class (FRC) of a line is a road classification
/// based on the importance of the road represented by the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromRepr)]
#[repr(u8)]
pub enum Frc {
    /// Main road, highest importance.
    Frc0 = 0,
    /// First class road.
    Frc1 = 1,
    /// Second class road.
    Frc2 = 2,
    /// Third class road.
    Frc3 = 3,
    /// Fourth class road.
    Frc4 = 4,
    /// Fifth class road.
    Frc5 = 5,
    /// Sixth class road.
    Frc6 = 6,
    /// Other class road, lowest importance.
    Frc7 = 7,
}

impl Default for Frc {
    fn default() -> Self {
        Self::Frc7
    }
}

impl Frc {
    pub const fn rank(&self) -> u8 {
        *self as u8
    }

    /// Returns true if a line of this class may take part in a path whose
    /// lowest admissible class is `lfrcnp`. The encoder and decoder maps may
    /// classify the same road differently, so up to two ranks of variance
    /// are tolerated.
    pub const fn is_within_variance(&self, lfrcnp: Frc) -> bool {
        (*self as u8) <= (lfrcnp as u8).saturating_add(2)
    }
}

/// Form of Way.
/// The form of way (FOW) describes the physical road type of a line.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    FromRepr,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[repr(u8)]
pub enum Fow {
    /// The physical road type is unknown.
    Undefined = 0,
    /// A Motorway is defined as a road permitted for motorized vehicles
    /// only in combination with a prescribed minimum speed. It has two
    /// or more physically separated carriageways and no single level-crossings.
    Motorway = 1,
    /// A multiple carriageway is defined as a road with physically separated
    /// carriageways regardless of the number of lanes. If a road is also a
    /// motorway, it should be coded as such and not as a multiple carriageway.
    MultipleCarriageway = 2,
    /// All roads without separate carriageways are considered as roads with
    /// a single carriageway.
    SingleCarriageway = 3,
    /// A Roundabout is a road which forms a ring on which traffic traveling
    /// in only one direction is allowed.
    Roundabout = 4,
    /// A Traffic Square is an open area (partly) enclosed by roads which is
    /// used for non-traffic purposes and which is not a Roundabout.
    TrafficSquare = 5,
    /// A Slip Road is a road especially designed to enter or leave a line.
    SlipRoad = 6,
    /// The physical road type is known but does not fit into one of the
    /// other categories.
    Other = 7,
}

impl Default for Fow {
    fn default() -> Self {
        Self::Other
    }
}

/// Distance in meters.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Length(OrderedFloat<f64>);

impl Length {
    pub const ZERO: Self = Self(OrderedFloat(0.0));
    pub const MAX: Self = Self(OrderedFloat(f64::MAX));

    pub const fn from_meters(meters: f64) -> Self {
        Self(OrderedFloat(meters))
    }

    pub const fn meters(&self) -> f64 {
        self.0.0
    }

    pub fn round(&self) -> Self {
        Self::from_meters(self.meters().round())
    }

    pub fn is_zero(&self) -> bool {
        self.meters() == 0.0
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}m", self.meters())
    }
}

impl Add for Length {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::from_meters(self.meters() + rhs.meters())
    }
}

impl Sub for Length {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::from_meters(self.meters() - rhs.meters())
    }
}

impl Mul<f64> for Length {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::from_meters(self.meters() * rhs)
    }
}

impl AddAssign for Length {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Length {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Sum for Length {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

/// The bearing describes the angle between the true North and the road,
/// measured in degrees and folded into [0, 360).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Bearing(OrderedFloat<f64>);

impl Bearing {
    pub fn from_degrees(degrees: f64) -> Self {
        Self(OrderedFloat(degrees.rem_euclid(360.0)))
    }

    pub const fn degrees(&self) -> f64 {
        self.0.0
    }

    /// Smallest non-negative angular difference to the other bearing,
    /// folded into [0, 180] degrees.
    pub fn difference(&self, other: &Self) -> f64 {
        let difference = (self.degrees() - other.degrees()).abs();
        if difference > 180.0 { 360.0 - difference } else { difference }
    }
}

/// Rating of a candidate line in [0.0, 1.0], higher is better.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Score(OrderedFloat<f64>);

impl Score {
    pub const fn value(&self) -> f64 {
        self.0.0
    }
}

impl From<f64> for Score {
    fn from(value: f64) -> Self {
        Self(OrderedFloat(value))
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.value())
    }
}

/// Coordinate pair stands for a pair of WGS84 longitude (lon) and latitude
/// (lat) values. This coordinate pair specifies a geometric point in a
/// digital map.
#[derive(Debug, Clone, Copy, Default)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        const EPSILON: f64 = 1e-9;
        abs_diff_eq!(self.lon, other.lon, epsilon = EPSILON)
            && abs_diff_eq!(self.lat, other.lat, epsilon = EPSILON)
    }
}

/// The path attributes are part of a location reference point (except for
/// the last location reference point) and consist of lowest functional road
/// class to next point (LFRCNP) and distance to next point (DNP) data.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PathAttributes {
    /// Lowest functional road class to next point.
    pub lfrcnp: Frc,
    /// Distance to next point.
    pub dnp: Length,
}

/// A single point of a location reference, bound to the road network of the
/// encoder map. The coordinate refers to a node of a line or a point on a
/// line and the attributes refer to the line itself.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LocationReferencePoint {
    pub coordinate: Coordinate,
    pub frc: Frc,
    pub fow: Fow,
    /// Bearing of the road at this point, measured over a short distance
    /// along the line (against the line direction for the last point).
    pub bearing: Bearing,
    /// Attributes of the path towards the next point, None on the last point.
    pub path: Option<PathAttributes>,
}

impl LocationReferencePoint {
    pub const fn is_last(&self) -> bool {
        self.path.is_none()
    }
}

/// Offsets are used to locate the start and end of a location more precisely
/// than bounding to the nodes in a network. Both values are relative to the
/// length of the first/last path between the location reference points and
/// a missing offset means an offset of 0.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offsets {
    pub pos: f64,
    pub neg: f64,
}

/// A line location reference describes a path within a map and consists of
/// location reference points, a last location reference point and offset
/// data. There must be at least one location reference point and exactly one
/// last location reference point.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineLocationReference {
    pub points: Vec<LocationReferencePoint>,
    pub offsets: Offsets,
}

impl LineLocationReference {
    /// Returns an error unless the reference is structurally valid: at least
    /// two points, path attributes on every point except the last, none on
    /// the last, and offsets within [0, 1).
    pub fn validate(&self) -> Result<(), DecodeError> {
        let Some((last, init)) = self.points.split_last() else {
            return Err(DecodeError::InvalidReference(
                "a line location reference consists of at least 2 points",
            ));
        };

        if init.is_empty() {
            return Err(DecodeError::InvalidReference(
                "a line location reference consists of at least 2 points",
            ));
        }

        if last.path.is_some() {
            return Err(DecodeError::InvalidReference(
                "the last point must not carry path attributes",
            ));
        }

        if init.iter().any(|point| point.path.is_none()) {
            return Err(DecodeError::InvalidReference(
                "every point except the last must carry path attributes",
            ));
        }

        if !(0.0..1.0).contains(&self.offsets.pos) || !(0.0..1.0).contains(&self.offsets.neg) {
            return Err(DecodeError::InvalidReference("offsets must be within [0, 1)"));
        }

        Ok(())
    }
}
