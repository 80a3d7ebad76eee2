//! Reporting hooks into the decoding process. The decoder holds the
//! observer for the duration of one decode call and never depends on its
//! behavior; every hook has a no-op default body, so implementations
//! override only what they care about.

use tracing::debug;

use crate::decoder::candidates::{Candidate, ScoreBreakdown};
use crate::error::RouteFailure;
use crate::map::MapLine;
use crate::model::{Bearing, Frc, Length, LocationReferencePoint};
use crate::route::{PointOnLine, Route};

/// Reason a candidate was discarded during nomination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateRejection {
    /// Bearing difference exceeded the configured maximum.
    BearingDeviation,
    /// FRC too far below the lowest admissible class of the path.
    FrcVariance,
    /// Weighted total score below the configured minimum.
    ScoreTooLow,
}

/// Observer of the OpenLR decoding process.
pub trait DecoderObserver<L: MapLine> {
    /// Called when a candidate has been accepted for a location reference point.
    fn on_candidate_found(&mut self, _lrp: &LocationReferencePoint, _candidate: &Candidate<L>) {}

    /// Called when a candidate for a location reference point is rejected.
    fn on_candidate_rejected(
        &mut self,
        _lrp: &LocationReferencePoint,
        _point: &PointOnLine<L>,
        _reason: CandidateRejection,
    ) {
    }

    /// Called when a candidate is rejected due to excessive bearing difference.
    fn on_candidate_rejected_bearing(
        &mut self,
        _lrp: &LocationReferencePoint,
        _point: &PointOnLine<L>,
        _bearing: Bearing,
        _difference: f64,
    ) {
    }

    /// Called when a candidate is rejected due to an incompatible FRC.
    fn on_candidate_rejected_frc(
        &mut self,
        _lrp: &LocationReferencePoint,
        _point: &PointOnLine<L>,
        _lfrcnp: Frc,
    ) {
    }

    /// Called with the score breakdown of every rated candidate.
    fn on_candidate_score(
        &mut self,
        _lrp: &LocationReferencePoint,
        _point: &PointOnLine<L>,
        _scores: &ScoreBreakdown,
    ) {
    }

    /// Called when no candidate at all survives for a location reference point.
    fn on_no_candidates_found(&mut self, _lrp: &LocationReferencePoint) {}

    /// Called with the surviving candidates of a location reference point,
    /// ordered by descending score.
    fn on_candidates_found(
        &mut self,
        _lrp: &LocationReferencePoint,
        _candidates: &[Candidate<L>],
    ) {
    }

    /// Called after a route between two candidates has been accepted.
    fn on_route_success(
        &mut self,
        _from_lrp: &LocationReferencePoint,
        _to_lrp: &LocationReferencePoint,
        _route: &Route<L>,
    ) {
    }

    /// Called after the route search between two candidates failed.
    fn on_route_fail(
        &mut self,
        _from_lrp: &LocationReferencePoint,
        _to_lrp: &LocationReferencePoint,
        _from_line: &L,
        _to_line: &L,
        _reason: RouteFailure,
    ) {
    }

    /// Called when a route was found but its length disagrees with the
    /// encoded distance between the two location reference points.
    fn on_route_fail_length(
        &mut self,
        _from_lrp: &LocationReferencePoint,
        _to_lrp: &LocationReferencePoint,
        _length: Length,
        _min: Length,
        _max: Length,
    ) {
    }

    /// Called after none of the candidate pairs of two subsequent location
    /// reference points could be matched. The only recovery is to backtrack
    /// and discard the last accepted part of the location, if possible.
    fn on_matching_fail(
        &mut self,
        _from_lrp: &LocationReferencePoint,
        _to_lrp: &LocationReferencePoint,
        _from_candidates: &[Candidate<L>],
        _to_candidates: &[Candidate<L>],
    ) {
    }
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl<L: MapLine> DecoderObserver<L> for NoopObserver {}

/// An event recorded by the [`CollectingObserver`].
#[derive(Debug, Clone)]
pub enum DecodeEvent<L: MapLine> {
    CandidateFound { lrp: LocationReferencePoint, candidate: Candidate<L> },
    CandidateRejected {
        lrp: LocationReferencePoint,
        line: L::LineId,
        reason: CandidateRejection,
    },
    CandidateScored { lrp: LocationReferencePoint, line: L::LineId, scores: ScoreBreakdown },
    NoCandidatesFound { lrp: LocationReferencePoint },
    CandidatesFound { lrp: LocationReferencePoint, count: usize },
    RouteSuccess { from_line: L::LineId, to_line: L::LineId, length: Length },
    RouteFail { from_line: L::LineId, to_line: L::LineId, reason: RouteFailure },
    RouteFailLength { length: Length, min: Length, max: Length },
    MatchingFail { from_candidates: usize, to_candidates: usize },
}

/// Observer that retains every event for later inspection.
#[derive(Debug)]
pub struct CollectingObserver<L: MapLine> {
    events: Vec<DecodeEvent<L>>,
}

impl<L: MapLine> Default for CollectingObserver<L> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<L: MapLine> CollectingObserver<L> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[DecodeEvent<L>] {
        &self.events
    }

    pub fn into_events(self) -> Vec<DecodeEvent<L>> {
        self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl<L: MapLine> DecoderObserver<L> for CollectingObserver<L> {
    fn on_candidate_found(&mut self, lrp: &LocationReferencePoint, candidate: &Candidate<L>) {
        self.events.push(DecodeEvent::CandidateFound { lrp: *lrp, candidate: candidate.clone() });
    }

    fn on_candidate_rejected(
        &mut self,
        lrp: &LocationReferencePoint,
        point: &PointOnLine<L>,
        reason: CandidateRejection,
    ) {
        self.events.push(DecodeEvent::CandidateRejected {
            lrp: *lrp,
            line: point.line().id(),
            reason,
        });
    }

    fn on_candidate_score(
        &mut self,
        lrp: &LocationReferencePoint,
        point: &PointOnLine<L>,
        scores: &ScoreBreakdown,
    ) {
        self.events.push(DecodeEvent::CandidateScored {
            lrp: *lrp,
            line: point.line().id(),
            scores: *scores,
        });
    }

    fn on_no_candidates_found(&mut self, lrp: &LocationReferencePoint) {
        self.events.push(DecodeEvent::NoCandidatesFound { lrp: *lrp });
    }

    fn on_candidates_found(
        &mut self,
        lrp: &LocationReferencePoint,
        candidates: &[Candidate<L>],
    ) {
        self.events.push(DecodeEvent::CandidatesFound { lrp: *lrp, count: candidates.len() });
    }

    fn on_route_success(
        &mut self,
        _from_lrp: &LocationReferencePoint,
        _to_lrp: &LocationReferencePoint,
        route: &Route<L>,
    ) {
        self.events.push(DecodeEvent::RouteSuccess {
            from_line: route.start().line().id(),
            to_line: route.end().line().id(),
            length: route.length(),
        });
    }

    fn on_route_fail(
        &mut self,
        _from_lrp: &LocationReferencePoint,
        _to_lrp: &LocationReferencePoint,
        from_line: &L,
        to_line: &L,
        reason: RouteFailure,
    ) {
        self.events.push(DecodeEvent::RouteFail {
            from_line: from_line.id(),
            to_line: to_line.id(),
            reason,
        });
    }

    fn on_route_fail_length(
        &mut self,
        _from_lrp: &LocationReferencePoint,
        _to_lrp: &LocationReferencePoint,
        length: Length,
        min: Length,
        max: Length,
    ) {
        self.events.push(DecodeEvent::RouteFailLength { length, min, max });
    }

    fn on_matching_fail(
        &mut self,
        _from_lrp: &LocationReferencePoint,
        _to_lrp: &LocationReferencePoint,
        from_candidates: &[Candidate<L>],
        to_candidates: &[Candidate<L>],
    ) {
        self.events.push(DecodeEvent::MatchingFail {
            from_candidates: from_candidates.len(),
            to_candidates: to_candidates.len(),
        });
    }
}

/// Observer that logs every event through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl<L: MapLine> DecoderObserver<L> for TracingObserver {
    fn on_candidate_found(&mut self, lrp: &LocationReferencePoint, candidate: &Candidate<L>) {
        debug!("candidate {:?} found for {lrp:?}", candidate.line().id());
    }

    fn on_candidate_rejected(
        &mut self,
        lrp: &LocationReferencePoint,
        point: &PointOnLine<L>,
        reason: CandidateRejection,
    ) {
        debug!("candidate {:?} rejected for {lrp:?}: {reason:?}", point.line().id());
    }

    fn on_candidate_rejected_bearing(
        &mut self,
        _lrp: &LocationReferencePoint,
        point: &PointOnLine<L>,
        bearing: Bearing,
        difference: f64,
    ) {
        debug!(
            "candidate {:?} bearing {:.0} deviates by {difference:.0} degrees",
            point.line().id(),
            bearing.degrees()
        );
    }

    fn on_candidate_score(
        &mut self,
        _lrp: &LocationReferencePoint,
        point: &PointOnLine<L>,
        scores: &ScoreBreakdown,
    ) {
        debug!("candidate {:?} scored {scores:?}", point.line().id());
    }

    fn on_no_candidates_found(&mut self, lrp: &LocationReferencePoint) {
        debug!("no candidates found for {lrp:?}");
    }

    fn on_candidates_found(&mut self, lrp: &LocationReferencePoint, candidates: &[Candidate<L>]) {
        debug!("{} candidates found for {lrp:?}", candidates.len());
    }

    fn on_route_success(
        &mut self,
        _from_lrp: &LocationReferencePoint,
        _to_lrp: &LocationReferencePoint,
        route: &Route<L>,
    ) {
        debug!(
            "route {:?} -> {:?} accepted with length {}",
            route.start().line().id(),
            route.end().line().id(),
            route.length()
        );
    }

    fn on_route_fail(
        &mut self,
        _from_lrp: &LocationReferencePoint,
        _to_lrp: &LocationReferencePoint,
        from_line: &L,
        to_line: &L,
        reason: RouteFailure,
    ) {
        debug!("route {:?} -> {:?} failed: {reason:?}", from_line.id(), to_line.id());
    }

    fn on_route_fail_length(
        &mut self,
        _from_lrp: &LocationReferencePoint,
        _to_lrp: &LocationReferencePoint,
        length: Length,
        min: Length,
        max: Length,
    ) {
        debug!("route length {length} outside [{min}, {max}]");
    }

    fn on_matching_fail(
        &mut self,
        from_lrp: &LocationReferencePoint,
        to_lrp: &LocationReferencePoint,
        _from_candidates: &[Candidate<L>],
        _to_candidates: &[Candidate<L>],
    ) {
        debug!("no candidate pair matched between {from_lrp:?} and {to_lrp:?}");
    }
}
