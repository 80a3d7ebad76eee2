//! Value types the decoded location is assembled from: a point along a
//! line, a partial route between two such points, and the final location.

use crate::error::DecodeError;
use crate::geo::GeoTool;
use crate::map::MapLine;
use crate::model::{Coordinate, Length};

/// A point on the road network, expressed as a line and the relative offset
/// of the point along it. An offset of 0.0 references the start node of the
/// line, an offset of 1.0 its end node.
#[derive(Debug, Clone, PartialEq)]
pub struct PointOnLine<L> {
    line: L,
    relative_offset: f64,
}

impl<L: MapLine> PointOnLine<L> {
    /// Builds a point on the line, validating the relative offset.
    pub fn new(line: L, relative_offset: f64) -> Result<Self, DecodeError> {
        if !(0.0..=1.0).contains(&relative_offset) {
            return Err(DecodeError::InvalidReference("relative offset outside [0, 1]"));
        }
        Ok(Self { line, relative_offset })
    }

    /// Builds a point from an absolute offset in meters, clamped to the
    /// line. Negative offsets are measured backwards from the line end.
    pub fn from_absolute_offset(line: L, meters_into: Length) -> Self {
        let length = line.length().meters();
        let meters = meters_into.meters();
        let meters = if meters < 0.0 { length + meters } else { meters };
        let relative_offset = if length > 0.0 { (meters / length).clamp(0.0, 1.0) } else { 0.0 };
        Self { line, relative_offset }
    }

    pub fn line(&self) -> &L {
        &self.line
    }

    pub const fn relative_offset(&self) -> f64 {
        self.relative_offset
    }

    /// Distance in meters from the start of the line to the point.
    pub fn distance_from_start(&self) -> Length {
        self.line.length() * self.relative_offset
    }

    /// Distance in meters from the point to the end of the line.
    pub fn distance_to_end(&self) -> Length {
        self.line.length() * (1.0 - self.relative_offset)
    }

    /// The geographic position of the point.
    pub fn position<G: GeoTool>(&self, geo: &G) -> Coordinate {
        let coordinates: Vec<_> = self.line.coordinates().collect();
        geo.interpolate(&coordinates, self.distance_from_start())
    }

    /// Splits the line geometry at this point and returns both parts.
    pub fn split<G: GeoTool>(
        &self,
        geo: &G,
    ) -> (Option<Vec<Coordinate>>, Option<Vec<Coordinate>>) {
        let coordinates: Vec<_> = self.line.coordinates().collect();
        geo.split_line(&coordinates, self.distance_from_start())
    }
}

/// A part of a line location path: a start point, whole lines in between,
/// and an end point. The first and last line may be partial. The ordered
/// concatenation of the lines forms a connected walk in the map graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Route<L> {
    start: PointOnLine<L>,
    path_inbetween: Vec<L>,
    end: PointOnLine<L>,
}

impl<L: MapLine> Route<L> {
    pub(crate) fn new(start: PointOnLine<L>, path_inbetween: Vec<L>, end: PointOnLine<L>) -> Self {
        if path_inbetween.is_empty() && start.line().id() == end.line().id() {
            debug_assert!(start.relative_offset() <= end.relative_offset());
        }
        Self { start, path_inbetween, end }
    }

    pub fn start(&self) -> &PointOnLine<L> {
        &self.start
    }

    pub fn end(&self) -> &PointOnLine<L> {
        &self.end
    }

    pub fn path_inbetween(&self) -> &[L] {
        &self.path_inbetween
    }

    /// All the lines taking part in the route, in order, with consecutive
    /// duplicates collapsed.
    pub fn lines(&self) -> Vec<L> {
        let mut lines = vec![self.start.line().clone()];
        for line in &self.path_inbetween {
            if line.id() != lines[lines.len() - 1].id() {
                lines.push(line.clone());
            }
        }
        if self.end.line().id() == lines[lines.len() - 1].id() {
            lines.pop();
        }
        lines.push(self.end.line().clone());
        lines
    }

    /// Length of this route in meters, accounting for the partial first and
    /// last line.
    pub fn length(&self) -> Length {
        let total: Length = self.lines().iter().map(MapLine::length).sum();
        total - self.start.distance_from_start() - self.end.distance_to_end()
    }

    /// Offset of the route start within its first line, in meters.
    pub fn absolute_start_offset(&self) -> Length {
        self.start.distance_from_start()
    }

    /// Offset of the route end from the end of its last line, in meters.
    pub fn absolute_end_offset(&self) -> Length {
        self.end.distance_to_end()
    }

    /// The shape of the route as a single polyline.
    pub fn shape<G: GeoTool>(&self, geo: &G) -> Result<Vec<Coordinate>, DecodeError> {
        if self.start.line().id() == self.end.line().id() {
            let coordinates: Vec<_> = self.start.line().coordinates().collect();
            let tail = match geo.split_line(&coordinates, self.start.distance_from_start()) {
                (_, Some(tail)) => tail,
                _ => coordinates,
            };
            let span = self.end.distance_from_start() - self.start.distance_from_start();
            let head = match geo.split_line(&tail, span) {
                (Some(head), _) => head,
                _ => tail,
            };
            return Ok(head);
        }

        let mut parts: Vec<Vec<Coordinate>> = Vec::new();
        if let (_, Some(first)) = self.start.split(geo) {
            parts.push(first);
        }
        parts.extend(self.path_inbetween.iter().map(|line| line.coordinates().collect()));
        if let (Some(last), _) = self.end.split(geo) {
            parts.push(last);
        }
        geo.join_lines(&parts)
    }
}

/// The decoded line location: the complete ordered list of map lines
/// covering the location, an absolute offset in meters into the first line
/// and an absolute offset in meters before the end of the last line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineLocation<L> {
    pub lines: Vec<L>,
    pub start_offset: Length,
    pub end_offset: Length,
}
