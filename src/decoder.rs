//! The decoder resolves a (map-dependent) location using its own map.
//! This map might differ from the one used during encoding.
//!
//! 1. Check the validity of the location reference.
//! 2. For each location reference point find and rate candidate lines.
//! 3. Determine a route between the candidates of subsequent points,
//!    backtracking through the rated alternatives on failure.
//! 4. Concatenate the routes to form the location and trim the path
//!    according to the offsets.

pub mod astar;
pub mod candidates;
pub mod location;
pub mod matcher;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tracing::debug;

use crate::decoder::candidates::nominate_candidates;
use crate::decoder::location::build_line_location;
use crate::decoder::matcher::match_tail;
use crate::error::DecodeError;
use crate::geo::{GeoTool, Wgs84};
use crate::map::MapReader;
use crate::model::{Fow, Length, LineLocationReference, Score};
use crate::observer::{DecoderObserver, NoopObserver};
use crate::route::{LineLocation, Route};

const SAME_FOW_SCORE: f64 = 1.0;
const FAMILY_FOW_SCORE: f64 = 0.5;
const STAND_IN_FOW_SCORE: f64 = 0.25;

/// Score table keyed by (LRP FOW, candidate FOW). Identical forms rate 1.0,
/// forms of the same family (motorway and slip road, single and multiple
/// carriageway) rate 0.5 and anything else 0.25 by default.
///
/// Serialises as a nested mapping keyed by the FOW names; missing entries
/// fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "FowScoreRows", into = "FowScoreRows")]
pub struct FowScoreTable {
    scores: [[f64; 8]; 8],
}

type FowScoreRows = BTreeMap<Fow, BTreeMap<Fow, f64>>;

impl FowScoreTable {
    pub fn score(&self, lrp: Fow, candidate: Fow) -> f64 {
        self.scores[lrp as usize][candidate as usize]
    }

    pub fn set(&mut self, lrp: Fow, candidate: Fow, score: f64) {
        self.scores[lrp as usize][candidate as usize] = score;
    }
}

impl Default for FowScoreTable {
    fn default() -> Self {
        const FAMILIES: [[Fow; 2]; 2] = [
            [Fow::Motorway, Fow::SlipRoad],
            [Fow::MultipleCarriageway, Fow::SingleCarriageway],
        ];

        let mut scores = [[STAND_IN_FOW_SCORE; 8]; 8];
        for fow in Fow::iter() {
            scores[fow as usize][fow as usize] = SAME_FOW_SCORE;
        }
        for [a, b] in FAMILIES {
            scores[a as usize][b as usize] = FAMILY_FOW_SCORE;
            scores[b as usize][a as usize] = FAMILY_FOW_SCORE;
        }

        Self { scores }
    }
}

impl From<FowScoreRows> for FowScoreTable {
    fn from(rows: FowScoreRows) -> Self {
        let mut table = Self::default();
        for (lrp, row) in rows {
            for (candidate, score) in row {
                table.set(lrp, candidate, score);
            }
        }
        table
    }
}

impl From<FowScoreTable> for FowScoreRows {
    fn from(table: FowScoreTable) -> Self {
        Fow::iter()
            .map(|lrp| (lrp, Fow::iter().map(|c| (c, table.score(lrp, c))).collect()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Radius in meters around a location reference point within which
    /// candidate lines are searched.
    pub search_radius: Length,
    /// Maximum allowed difference in degrees between the bearing of a
    /// location reference point and the bearing of a candidate.
    pub max_bear_deviation: f64,
    /// Distance in meters along the road over which a candidate bearing is
    /// measured.
    pub bear_dist: Length,
    /// Minimum total score for a candidate to be considered.
    pub min_score: Score,
    /// Weight of the geographic distance in the candidate score.
    pub w_geo: f64,
    /// Weight of the functional road class in the candidate score.
    pub w_frc: f64,
    /// Weight of the form of way in the candidate score.
    pub w_fow: f64,
    /// Weight of the bearing in the candidate score.
    pub w_bear: f64,
    /// Score table for pairs of forms of way.
    pub fow_score_table: FowScoreTable,
    /// Relative tolerance on the distance to next point when validating a
    /// route length.
    pub dnp_rel_tol: f64,
    /// Absolute tolerance in meters on the distance to next point when
    /// validating a route length.
    pub dnp_abs_tol: Length,
    /// Upper bound on the nodes expanded by a single route search.
    pub max_route_nodes: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            search_radius: Length::from_meters(100.0),
            max_bear_deviation: 45.0,
            bear_dist: Length::from_meters(20.0),
            min_score: Score::from(0.3),
            w_geo: 0.25,
            w_frc: 0.25,
            w_fow: 0.25,
            w_bear: 0.25,
            fow_score_table: FowScoreTable::default(),
            dnp_rel_tol: 0.25,
            dnp_abs_tol: Length::from_meters(20.0),
            max_route_nodes: 1000,
        }
    }
}

impl DecoderConfig {
    /// Admissible route length window around an encoded distance to next
    /// point.
    pub fn dnp_bounds(&self, dnp: Length) -> (Length, Length) {
        let d_min = (dnp * (1.0 - self.dnp_rel_tol) - self.dnp_abs_tol).max(Length::ZERO);
        let d_max = dnp * (1.0 + self.dnp_rel_tol) + self.dnp_abs_tol;
        (d_min, d_max)
    }
}

/// Decodes an OpenLR line location reference against the map, with WGS84
/// geodesy and without an observer.
pub fn decode_line<R: MapReader>(
    config: &DecoderConfig,
    reader: &R,
    reference: &LineLocationReference,
) -> Result<LineLocation<R::Line>, DecodeError> {
    decode_line_with(config, reader, reference, &Wgs84, &mut NoopObserver)
}

/// Decodes an OpenLR line location reference against the map, with custom
/// geodesy and an observer receiving every intermediate decision.
pub fn decode_line_with<R, G, O>(
    config: &DecoderConfig,
    reader: &R,
    reference: &LineLocationReference,
    geo: &G,
    observer: &mut O,
) -> Result<LineLocation<R::Line>, DecodeError>
where
    R: MapReader,
    G: GeoTool,
    O: DecoderObserver<R::Line>,
{
    debug!("Decoding {reference:?}");
    reference.validate()?;

    let routes = dereference_path(config, reader, reference, geo, observer)?;
    debug_assert_eq!(routes.len(), reference.points.len() - 1);

    build_line_location(&routes, reference)
}

/// Resolves the location reference path, without considering any offsets.
fn dereference_path<R, G, O>(
    config: &DecoderConfig,
    reader: &R,
    reference: &LineLocationReference,
    geo: &G,
    observer: &mut O,
) -> Result<Vec<Route<R::Line>>, DecodeError>
where
    R: MapReader,
    G: GeoTool,
    O: DecoderObserver<R::Line>,
{
    let (first, tail) = reference
        .points
        .split_first()
        .ok_or(DecodeError::InvalidReference("empty location reference"))?;

    let candidates = nominate_candidates(first, reader, config, geo, observer, false);
    if candidates.is_empty() {
        return Err(DecodeError::NoCandidatesForLrp(0));
    }

    match_tail(first, 0, &candidates, tail, reader, config, geo, observer)
}
