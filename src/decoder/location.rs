//! Concatenation of the matched routes into the final line location and
//! trimming of the positive/negative offsets.

use std::collections::VecDeque;

use tracing::debug;

use crate::error::DecodeError;
use crate::map::MapLine;
use crate::model::{Length, LineLocationReference};
use crate::route::{LineLocation, PointOnLine, Route};

/// Builds the final line location from the routes matched between each pair
/// of location reference points. The relative offsets of the reference are
/// converted to meters against the first and last route and trimmed off.
pub fn build_line_location<L: MapLine>(
    routes: &[Route<L>],
    reference: &LineLocationReference,
) -> Result<LineLocation<L>, DecodeError> {
    let (Some(first), Some(last)) = (routes.first(), routes.last()) else {
        return Err(DecodeError::InvalidReference("a location consists of at least one route"));
    };

    let pos_offset = first.length() * reference.offsets.pos;
    let neg_offset = last.length() * reference.offsets.neg;

    let combined = combine_routes(routes)?;
    let trimmed = remove_offsets(combined, pos_offset, neg_offset)?;

    Ok(LineLocation {
        start_offset: trimmed.absolute_start_offset(),
        end_offset: trimmed.absolute_end_offset(),
        lines: trimmed.lines(),
    })
}

/// Concatenates the matched routes into a single route, collapsing the
/// lines shared between consecutive routes at their joins.
pub fn combine_routes<L: MapLine>(routes: &[Route<L>]) -> Result<Route<L>, DecodeError> {
    let (Some(first), Some(last)) = (routes.first(), routes.last()) else {
        return Err(DecodeError::InvalidReference("a location consists of at least one route"));
    };

    let mut lines: Vec<L> = Vec::new();
    for route in routes {
        for line in route.lines() {
            if lines.last().is_none_or(|previous| previous.id() != line.id()) {
                lines.push(line);
            }
        }
    }

    debug_assert!(lines.first().is_some_and(|l| l.id() == first.start().line().id()));
    debug_assert!(lines.last().is_some_and(|l| l.id() == last.end().line().id()));

    let path_inbetween =
        if lines.len() > 2 { lines[1..lines.len() - 1].to_vec() } else { Vec::new() };

    Ok(Route::new(first.start().clone(), path_inbetween, last.end().clone()))
}

/// Removes the positive and negative offsets, measured in meters, from the
/// head and tail of the route. Whole lines covered by an offset are dropped
/// from the location; fails when the offsets meet or exceed the path.
pub fn remove_offsets<L: MapLine>(
    route: Route<L>,
    pos_offset: Length,
    neg_offset: Length,
) -> Result<Route<L>, DecodeError> {
    debug!("Trimming {pos_offset} off the head and {neg_offset} off the tail");

    let mut remaining_pos = pos_offset + route.absolute_start_offset();
    let mut remaining_neg = neg_offset + route.absolute_end_offset();
    let mut lines: VecDeque<L> = route.lines().into();

    while let Some(line) = lines.front() {
        let length = line.length();
        if remaining_pos < length {
            break;
        }
        lines.pop_front();
        remaining_pos -= length;
    }

    while let Some(line) = lines.back() {
        let length = line.length();
        if remaining_neg < length {
            break;
        }
        lines.pop_back();
        remaining_neg -= length;
    }

    let start_line = lines.pop_front().ok_or(DecodeError::OffsetTooLarge)?;
    let end_line = lines.pop_back().unwrap_or_else(|| start_line.clone());

    if start_line.id() == end_line.id()
        && remaining_pos + remaining_neg >= start_line.length()
    {
        return Err(DecodeError::OffsetTooLarge);
    }

    let start = PointOnLine::from_absolute_offset(start_line, remaining_pos);
    let end_length = end_line.length();
    let end = PointOnLine::from_absolute_offset(end_line, end_length - remaining_neg);

    Ok(Route::new(start, lines.into(), end))
}
