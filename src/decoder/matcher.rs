//! The decoder computes a route between each pair of subsequent location
//! reference points. The candidate line of the first point of the pair acts
//! as start of the search, the candidate line of the second point as its
//! end. If no route can be calculated for a chosen pair, the next pair in
//! rating order is tried; when a point runs out of alternatives the failure
//! bubbles to the previous point, which then tries its own next candidate.

use tracing::debug;

use crate::decoder::DecoderConfig;
use crate::decoder::astar::shortest_path;
use crate::decoder::candidates::{Candidate, nominate_candidates};
use crate::error::{DecodeError, RouteFailure};
use crate::geo::GeoTool;
use crate::map::{MapLine, MapReader};
use crate::model::{Frc, Length, LocationReferencePoint};
use crate::observer::DecoderObserver;
use crate::route::Route;

/// Matches the remaining location reference points recursively, starting
/// from the already nominated candidates of the current point. Returns one
/// route per consecutive pair of points.
#[allow(clippy::too_many_arguments)]
pub fn match_tail<R, G, O>(
    current: &LocationReferencePoint,
    current_index: usize,
    candidates: &[Candidate<R::Line>],
    tail: &[LocationReferencePoint],
    reader: &R,
    config: &DecoderConfig,
    geo: &G,
    observer: &mut O,
) -> Result<Vec<Route<R::Line>>, DecodeError>
where
    R: MapReader,
    G: GeoTool,
    O: DecoderObserver<R::Line>,
{
    let next_index = current_index + 1;
    let (next, rest) = tail
        .split_first()
        .ok_or(DecodeError::InvalidReference("dangling location reference point"))?;
    let is_last_lrp = rest.is_empty();

    let path = current
        .path
        .ok_or(DecodeError::InvalidReference("missing path attributes"))?;
    let bounds = config.dnp_bounds(path.dnp);

    // the candidates of the next point do not depend on the pair choice
    let next_candidates = nominate_candidates(next, reader, config, geo, observer, is_last_lrp);
    if next_candidates.is_empty() {
        return Err(DecodeError::NoCandidatesForLrp(next_index));
    }

    for candidate in candidates {
        for next_candidate in &next_candidates {
            let pair = (candidate, next_candidate);
            let result = handle_candidate_pair(
                (current, next),
                pair,
                (current_index, next_index),
                path.lfrcnp,
                bounds,
                config,
                reader,
                geo,
                observer,
            );

            let route = match result {
                Ok(route) => route,
                Err(error) => {
                    debug!("Candidate pair rejected: {error}");
                    continue;
                }
            };

            if is_last_lrp {
                return Ok(vec![route]);
            }

            match match_tail(
                next,
                next_index,
                &[next_candidate.clone()],
                rest,
                reader,
                config,
                geo,
                observer,
            ) {
                Ok(mut routes) => {
                    routes.insert(0, route);
                    return Ok(routes);
                }
                // no alternative pair can make candidates appear downstream
                Err(error @ DecodeError::NoCandidatesForLrp(_)) => return Err(error),
                Err(error) => {
                    debug!("Matching deeper into the reference failed: {error}");
                    continue;
                }
            }
        }
    }

    observer.on_matching_fail(current, next, candidates, &next_candidates);
    Err(DecodeError::MatchingFailed { from_lrp: current_index, to_lrp: next_index })
}

/// Tries to connect a pair of candidates of two subsequent location
/// reference points and validates the route length against the encoded
/// distance. Local failures are reported to the observer and returned for
/// the matcher to try the next pair.
#[allow(clippy::too_many_arguments)]
pub fn handle_candidate_pair<R, G, O>(
    lrps: (&LocationReferencePoint, &LocationReferencePoint),
    pair: (&Candidate<R::Line>, &Candidate<R::Line>),
    lrp_indices: (usize, usize),
    lowest_frc: Frc,
    bounds: (Length, Length),
    config: &DecoderConfig,
    reader: &R,
    geo: &G,
    observer: &mut O,
) -> Result<Route<R::Line>, DecodeError>
where
    R: MapReader,
    G: GeoTool,
    O: DecoderObserver<R::Line>,
{
    let (from_lrp, to_lrp) = lrps;
    let (from, to) = pair;
    let (d_min, d_max) = bounds;

    let route = match find_candidate_route(
        reader,
        geo,
        from,
        to,
        lowest_frc,
        d_max,
        config.max_route_nodes,
    ) {
        Ok(route) => route,
        Err(failure) => {
            debug!("No route between {:?} and {:?}: {failure:?}", from.line().id(), to.line().id());
            observer.on_route_fail(from_lrp, to_lrp, from.line(), to.line(), failure);
            return Err(DecodeError::RouteNotFound {
                from_lrp: lrp_indices.0,
                to_lrp: lrp_indices.1,
            });
        }
    };

    let length = route.length();
    if length < d_min || length > d_max {
        debug!("Route length {length} outside [{d_min}, {d_max}]");
        observer.on_route_fail_length(from_lrp, to_lrp, length, d_min, d_max);
        return Err(DecodeError::RouteLengthOutOfBounds { length, min: d_min, max: d_max });
    }

    observer.on_route_success(from_lrp, to_lrp, &route);
    Ok(route)
}

/// Computes the route between two candidates. When both share a line in
/// walking order no search is needed; otherwise the router connects the end
/// node of the first candidate line with the start node of the second.
pub fn find_candidate_route<R, G>(
    reader: &R,
    geo: &G,
    from: &Candidate<R::Line>,
    to: &Candidate<R::Line>,
    lowest_frc: Frc,
    max_length: Length,
    max_nodes: usize,
) -> Result<Route<R::Line>, RouteFailure>
where
    R: MapReader,
    G: GeoTool,
{
    if from.line().id() == to.line().id()
        && from.point().relative_offset() <= to.point().relative_offset()
    {
        return Ok(Route::new(from.point().clone(), vec![], to.point().clone()));
    }

    let path = shortest_path(
        reader,
        geo,
        from.line().end_node(),
        to.line().start_node(),
        lowest_frc,
        max_length,
        max_nodes,
        |_| true,
    )?;

    Ok(Route::new(from.point().clone(), path.lines, to.point().clone()))
}
