//! Geodesy primitives the decoder relies on: point-to-point measures and
//! operations over polylines expressed as coordinate slices.

use geo::{Bearing, Destination, Distance, Geodesic, Point};

use crate::error::DecodeError;
use crate::model::{Coordinate, Length};

/// Geo utilities the decoder invokes at various points of the matching
/// process. The default [`Wgs84`] implementation works on the WGS84
/// ellipsoid; implementations targeting other reference systems (or with
/// faster primitives) only need to provide the three point-to-point
/// measures, the polyline operations are derived from them.
pub trait GeoTool {
    /// Distance between two coordinates in meters. Non-negative, symmetric.
    fn distance(&self, a: Coordinate, b: Coordinate) -> Length;

    /// Initial forward azimuth from `a` to `b`, in radians in [-π, π].
    /// Undefined when both coordinates coincide.
    fn bearing(&self, a: Coordinate, b: Coordinate) -> f64;

    /// Coordinate `distance` meters away from `origin` at the given azimuth
    /// (radians).
    fn extrapolate(&self, origin: Coordinate, distance: Length, azimuth: f64) -> Coordinate;

    /// Length of a polyline, measured pairwise between its vertices.
    fn line_string_length(&self, path: &[Coordinate]) -> Length {
        path.windows(2).map(|pair| self.distance(pair[0], pair[1])).sum()
    }

    /// Walks `distance` meters along the path and returns the resulting
    /// coordinate. Clamped to the first vertex for distances <= 0 and to
    /// the last vertex when the path is too short. The path must contain at
    /// least one coordinate.
    fn interpolate(&self, path: &[Coordinate], distance: Length) -> Coordinate {
        debug_assert!(!path.is_empty());

        if distance <= Length::ZERO {
            return path[0];
        }

        let mut remaining = distance;
        for pair in path.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            if remaining.is_zero() {
                return from;
            }

            let segment = self.distance(from, to);
            if remaining < segment {
                let azimuth = self.bearing(from, to);
                return self.extrapolate(from, remaining, azimuth);
            }
            remaining -= segment;
        }

        path[path.len() - 1]
    }

    /// Splits the polyline at the given offset in meters and returns both
    /// parts. A part is None when it would degenerate to a single point.
    /// A split point coinciding with an existing vertex is not duplicated.
    fn split_line(
        &self,
        path: &[Coordinate],
        distance: Length,
    ) -> (Option<Vec<Coordinate>>, Option<Vec<Coordinate>>) {
        if distance <= Length::ZERO {
            return (None, Some(path.to_vec()));
        }
        if distance >= self.line_string_length(path) {
            return (Some(path.to_vec()), None);
        }

        let mut first = Vec::new();
        let mut second = Vec::new();
        let mut remaining = distance;
        let mut split = false;

        for pair in path.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            if split {
                second.push(to);
                continue;
            }

            first.push(from);
            let segment = self.distance(from, to);
            if remaining < segment {
                let point = self.interpolate(&[from, to], remaining);
                if point != from {
                    first.push(point);
                }
                second.push(point);
                second.push(to);
                split = true;
            }
            remaining -= segment;
        }

        let first = (first.len() > 1).then_some(first);
        let second = (second.len() > 1).then_some(second);
        (first, second)
    }

    /// Concatenates contiguous polylines into a single one. Fails when the
    /// end of a polyline does not coincide with the start of the next.
    fn join_lines(&self, lines: &[Vec<Coordinate>]) -> Result<Vec<Coordinate>, DecodeError> {
        let mut coordinates: Vec<Coordinate> = Vec::new();
        let mut previous: Option<Coordinate> = None;

        for line in lines {
            let Some((&first, rest)) = line.split_first() else {
                continue;
            };

            match previous {
                None => coordinates.push(first),
                Some(previous) if first != previous => {
                    return Err(DecodeError::DisconnectedGeometries);
                }
                Some(_) => {}
            }

            coordinates.extend_from_slice(rest);
            previous = line.last().copied();
        }

        Ok(coordinates)
    }

    /// Projects the coordinate onto the polyline and returns the offset in
    /// meters from the start of the polyline to the projection point,
    /// together with the distance between the coordinate and that point.
    /// Segments are parameterised planarly in degree space, distances are
    /// measured through [`GeoTool::distance`].
    fn project(&self, path: &[Coordinate], coordinate: Coordinate) -> (Length, Length) {
        let mut closest = Length::MAX;
        let mut along = Length::ZERO;
        let mut walked = Length::ZERO;

        for pair in path.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let segment = self.distance(from, to);

            let (dx, dy) = (to.lon - from.lon, to.lat - from.lat);
            let norm = dx * dx + dy * dy;
            let fraction = if norm > 0.0 {
                let dot = (coordinate.lon - from.lon) * dx + (coordinate.lat - from.lat) * dy;
                (dot / norm).clamp(0.0, 1.0)
            } else {
                0.0
            };

            let point = Coordinate {
                lon: from.lon + fraction * dx,
                lat: from.lat + fraction * dy,
            };

            let away = self.distance(coordinate, point);
            if away < closest {
                closest = away;
                along = walked + segment * fraction;
            }
            walked += segment;
        }

        (along, closest)
    }
}

/// [`GeoTool`] for maps on the WGS84 ellipsoid, backed by geodesic measures.
#[derive(Debug, Clone, Copy, Default)]
pub struct Wgs84;

impl GeoTool for Wgs84 {
    fn distance(&self, a: Coordinate, b: Coordinate) -> Length {
        Length::from_meters(Geodesic.distance(point(a), point(b)))
    }

    fn bearing(&self, a: Coordinate, b: Coordinate) -> f64 {
        let degrees = Geodesic.bearing(point(a), point(b));
        let degrees = if degrees > 180.0 { degrees - 360.0 } else { degrees };
        degrees.to_radians()
    }

    fn extrapolate(&self, origin: Coordinate, distance: Length, azimuth: f64) -> Coordinate {
        let destination = Geodesic.destination(point(origin), azimuth.to_degrees(), distance.meters());
        Coordinate { lon: destination.x(), lat: destination.y() }
    }
}

fn point(coordinate: Coordinate) -> Point {
    Point::new(coordinate.lon, coordinate.lat)
}
