//! For each location reference point the decoder tries to determine lines
//! which fulfill the following constraints:
//! - The projection point shall be close to the coordinates of the location
//!   reference point.
//! - The candidate lines should match the attributes functional road class,
//!   form of way and bearing as carried by the point. Slight variances are
//!   allowed and are taken into account by the rating function.
//!
//! The candidate lines are ordered in a way that the best matching line
//! comes first.

use std::cmp::Reverse;

use approx::abs_diff_eq;
use tracing::{debug, trace};

use crate::decoder::DecoderConfig;
use crate::geo::GeoTool;
use crate::map::{MapLine, MapReader};
use crate::model::{Bearing, Length, LocationReferencePoint, Score};
use crate::observer::{CandidateRejection, DecoderObserver};
use crate::route::PointOnLine;

/// The four sub-scores of a candidate and their weighted total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    /// Closeness of the candidate point to the LRP coordinate.
    pub geo: Score,
    /// Agreement of the functional road classes.
    pub frc: Score,
    /// Agreement of the forms of way.
    pub fow: Score,
    /// Agreement of the bearings.
    pub bear: Score,
    /// Weighted sum of the sub-scores.
    pub total: Score,
}

/// A point on a map line being considered as the anchor of a location
/// reference point, annotated with its rating.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<L> {
    point: PointOnLine<L>,
    scores: ScoreBreakdown,
}

impl<L: MapLine> Candidate<L> {
    pub fn point(&self) -> &PointOnLine<L> {
        &self.point
    }

    pub fn line(&self) -> &L {
        self.point.line()
    }

    pub fn score(&self) -> Score {
        self.scores.total
    }

    pub fn scores(&self) -> &ScoreBreakdown {
        &self.scores
    }
}

/// Finds and rates the candidate lines of a location reference point.
///
/// Lines within the search radius are projected onto; a projection that
/// degenerates to the far end of a line additionally anchors candidates on
/// the adjacent lines of that node, where the bearing is measurable along
/// the edge actually being entered (or left, for the last point). The
/// surviving candidates are deduplicated per line and sorted by descending
/// score.
///
/// The spatial query is fully drained before this function returns, so map
/// implementations backed by cursors are released before any routing starts.
pub fn nominate_candidates<R, G, O>(
    lrp: &LocationReferencePoint,
    reader: &R,
    config: &DecoderConfig,
    geo: &G,
    observer: &mut O,
    is_last_lrp: bool,
) -> Vec<Candidate<R::Line>>
where
    R: MapReader,
    G: GeoTool,
    O: DecoderObserver<R::Line>,
{
    debug!("Nominating candidates for {lrp:?}");

    let close_lines: Vec<R::Line> =
        reader.find_lines_close_to(lrp.coordinate, config.search_radius).collect();
    trace!("{} lines within {}", close_lines.len(), config.search_radius);

    let mut candidates: Vec<Candidate<R::Line>> = Vec::new();
    let push = |candidates: &mut Vec<_>, candidate: Option<Candidate<R::Line>>| {
        if let Some(candidate) = candidate {
            candidates.push(candidate);
        }
    };

    for line in close_lines {
        let (along, _) = geo.project(&line.coordinates().collect::<Vec<_>>(), lrp.coordinate);
        let point = PointOnLine::from_absolute_offset(line, along);

        if !is_last_lrp && abs_diff_eq!(point.relative_offset(), 1.0) {
            for outgoing in reader.outgoing_lines(point.line().end_node()) {
                let anchored = PointOnLine::from_absolute_offset(outgoing, Length::ZERO);
                push(
                    &mut candidates,
                    score_candidate(lrp, anchored, config, geo, observer, is_last_lrp),
                );
            }
        } else if is_last_lrp && abs_diff_eq!(point.relative_offset(), 0.0) {
            for incoming in reader.incoming_lines(point.line().start_node()) {
                let length = incoming.length();
                let anchored = PointOnLine::from_absolute_offset(incoming, length);
                push(
                    &mut candidates,
                    score_candidate(lrp, anchored, config, geo, observer, is_last_lrp),
                );
            }
        }

        push(&mut candidates, score_candidate(lrp, point, config, geo, observer, is_last_lrp));
    }

    // keep the best rated candidate per line
    candidates.sort_unstable_by(|a, b| {
        (a.line().id().cmp(&b.line().id()))
            .then_with(|| b.score().cmp(&a.score()))
            .then_with(|| a.point().relative_offset().total_cmp(&b.point().relative_offset()))
    });
    candidates.dedup_by_key(|c| c.line().id());
    candidates.sort_unstable_by_key(|c| (Reverse(c.score()), c.line().id()));

    if candidates.is_empty() {
        observer.on_no_candidates_found(lrp);
    } else {
        observer.on_candidates_found(lrp, &candidates);
    }

    candidates
}

/// Rates a prospective candidate against the location reference point,
/// returning None when it is rejected.
fn score_candidate<L, G, O>(
    lrp: &LocationReferencePoint,
    point: PointOnLine<L>,
    config: &DecoderConfig,
    geo: &G,
    observer: &mut O,
    is_last_lrp: bool,
) -> Option<Candidate<L>>
where
    L: MapLine,
    G: GeoTool,
    O: DecoderObserver<L>,
{
    trace!("Rating {:?} at offset {:.3}", point.line().id(), point.relative_offset());

    if let Some(path) = &lrp.path
        && !point.line().frc().is_within_variance(path.lfrcnp)
    {
        trace!("Candidate FRC {:?} out of variance", point.line().frc());
        observer.on_candidate_rejected_frc(lrp, &point, path.lfrcnp);
        observer.on_candidate_rejected(lrp, &point, CandidateRejection::FrcVariance);
        return None;
    }

    let degenerate = bearing_is_degenerate(&point, is_last_lrp);
    let bearing = compute_candidate_bearing(&point, is_last_lrp, config.bear_dist, geo);
    let difference = bearing.difference(&lrp.bearing);

    if !degenerate && difference > config.max_bear_deviation {
        trace!("Candidate bearing {:.0} out of bounds", bearing.degrees());
        observer.on_candidate_rejected_bearing(lrp, &point, bearing, difference);
        observer.on_candidate_rejected(lrp, &point, CandidateRejection::BearingDeviation);
        return None;
    }

    let distance = geo.distance(lrp.coordinate, point.position(geo)).meters();
    let geo_score = (1.0 - distance / config.search_radius.meters()).max(0.0);

    let frc_gap = point.line().frc().rank().abs_diff(lrp.frc.rank());
    let frc_score = (1.0 - f64::from(frc_gap) / 7.0).max(0.0);

    let fow_score = config.fow_score_table.score(lrp.fow, point.line().fow());

    let bear_score = (1.0 - difference / 180.0).max(0.0);

    let total = config.w_geo * geo_score
        + config.w_frc * frc_score
        + config.w_fow * fow_score
        + config.w_bear * bear_score;

    let scores = ScoreBreakdown {
        geo: Score::from(geo_score),
        frc: Score::from(frc_score),
        fow: Score::from(fow_score),
        bear: Score::from(bear_score),
        total: Score::from(total),
    };
    observer.on_candidate_score(lrp, &point, &scores);

    if scores.total < config.min_score {
        trace!("Candidate score {} too low", scores.total);
        observer.on_candidate_rejected(lrp, &point, CandidateRejection::ScoreTooLow);
        return None;
    }

    let candidate = Candidate { point, scores };
    observer.on_candidate_found(lrp, &candidate);
    Some(candidate)
}

/// Bearing of the line at the candidate point in degrees, measured forwards
/// over `bear_dist` meters, or backwards for the last location reference
/// point. Returns 0 when the point sits at the line end the measurement
/// would start past (such a candidate is scored poorly but never rejected
/// for its bearing).
pub fn compute_candidate_bearing<L: MapLine, G: GeoTool>(
    point: &PointOnLine<L>,
    is_last_lrp: bool,
    bear_dist: Length,
    geo: &G,
) -> Bearing {
    if bearing_is_degenerate(point, is_last_lrp) {
        return Bearing::from_degrees(0.0);
    }

    let coordinates: Vec<_> = point.line().coordinates().collect();
    let along = point.distance_from_start();

    let origin = geo.interpolate(&coordinates, along);
    let target = if is_last_lrp {
        geo.interpolate(&coordinates, (along - bear_dist).max(Length::ZERO))
    } else {
        geo.interpolate(&coordinates, along + bear_dist)
    };

    Bearing::from_degrees(geo.bearing(origin, target).to_degrees())
}

fn bearing_is_degenerate<L: MapLine>(point: &PointOnLine<L>, is_last_lrp: bool) -> bool {
    if is_last_lrp {
        abs_diff_eq!(point.relative_offset(), 0.0)
    } else {
        abs_diff_eq!(point.relative_offset(), 1.0)
    }
}
