//! Length-constrained shortest path search between two nodes of the map.
//!
//! The search is node based: it starts at the end node of the first
//! candidate line and ends at the start node of the last candidate line,
//! returning the ordered intermediate lines only. The caller composes the
//! full route by prepending the tail of the source line and appending the
//! head of the sink line.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::error::RouteFailure;
use crate::geo::GeoTool;
use crate::map::{MapLine, MapNode, MapReader};
use crate::model::{Coordinate, Frc, Length};

/// Shortest admissible walk between two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct AstarPath<L> {
    /// Ordered whole lines from the origin node to the destination node.
    pub lines: Vec<L>,
    /// Sum of the line lengths.
    pub length: Length,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HeapElement<NodeId, LineId> {
    /// Lower bound on the total path length through this node (g + h).
    estimate: Length,
    /// Length of the best known path from the origin to this node.
    distance: Length,
    node: NodeId,
    /// The line used to enter the node, None at the origin.
    line: Option<LineId>,
}

// The priority queue depends on the implementation of the Ord trait.
// By default std::BinaryHeap is a max heap.
// Explicitly implement the trait so the queue becomes a min heap:
// lower estimate first, then lower distance, then line id.
impl<NodeId: Ord, LineId: Ord> Ord for HeapElement<NodeId, LineId> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .estimate
            .cmp(&self.estimate)
            .then_with(|| other.distance.cmp(&self.distance))
            // breaking ties in a deterministic way
            .then_with(|| other.line.cmp(&self.line))
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl<NodeId: Ord, LineId: Ord> PartialOrd for HeapElement<NodeId, LineId> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Computes the shortest directed walk from `origin` to `destination` whose
/// length stays within `max_length`, skipping lines below the admissible
/// functional road class or excluded by the filter.
///
/// The heuristic is the geodesic distance to the destination, which never
/// overestimates the road distance; it is however not consistent on a
/// directed graph with one-way restrictions, so a settled node is reopened
/// whenever a better distance to it is discovered. `max_nodes` bounds the
/// number of expansions as a safety valve.
#[allow(clippy::too_many_arguments)]
pub fn shortest_path<R, G, F>(
    reader: &R,
    geo: &G,
    origin: R::NodeId,
    destination: R::NodeId,
    lowest_frc: Frc,
    max_length: Length,
    max_nodes: usize,
    filter: F,
) -> Result<AstarPath<R::Line>, RouteFailure>
where
    R: MapReader,
    G: GeoTool,
    F: Fn(&R::Line) -> bool,
{
    debug!("Routing {origin:?} -> {destination:?} within {max_length}");

    let origin_coordinate = reader.get_node(origin).map(|node| node.coordinate());
    let target = reader.get_node(destination).map(|node| node.coordinate());
    let (Some(origin_coordinate), Some(target)) = (origin_coordinate, target) else {
        return Err(RouteFailure::PathNotFound);
    };

    // the heuristic is memoised per node for the duration of this call
    let mut heuristics: FxHashMap<R::NodeId, Length> = FxHashMap::default();
    let mut heuristic = |node: R::NodeId, coordinate: Coordinate| {
        *heuristics.entry(node).or_insert_with(|| geo.distance(coordinate, target))
    };

    // (current) shortest distance from the origin to each node
    let mut distances: FxHashMap<R::NodeId, Length> = FxHashMap::default();
    distances.insert(origin, Length::ZERO);

    // line and node the best known path reaches this node through
    let mut previous: FxHashMap<R::NodeId, (R::Line, R::NodeId)> = FxHashMap::default();

    let mut frontier = BinaryHeap::from([HeapElement {
        estimate: heuristic(origin, origin_coordinate),
        distance: Length::ZERO,
        node: origin,
        line: None,
    }]);

    let mut expanded = 0_usize;
    let mut out_of_bounds = false;

    while let Some(element) = frontier.pop() {
        if element.node == destination {
            return Ok(unpack_path(&previous, origin, destination, element.distance));
        }

        // stale entry, the node has since been reached on a cheaper path
        if distances.get(&element.node).is_some_and(|&known| element.distance > known) {
            continue;
        }

        expanded += 1;
        if expanded > max_nodes {
            debug!("Aborting route search after {expanded} expansions");
            return Err(RouteFailure::PathNotFound);
        }

        // expand in a deterministic order regardless of the map backend
        let mut exits: Vec<R::Line> = reader.outgoing_lines(element.node).collect();
        exits.sort_unstable_by_key(|line| line.id());

        for line in exits {
            if line.frc() > lowest_frc || !filter(&line) {
                trace!("Skipping {:?}", line.id());
                continue;
            }

            let node = line.end_node();
            let distance = element.distance + line.length();

            let Some(coordinate) = line.coordinates().last() else {
                continue;
            };
            let estimate = distance + heuristic(node, coordinate);
            if estimate > max_length {
                out_of_bounds = true;
                continue;
            }

            let known = distances.get(&node).copied().unwrap_or(Length::MAX);
            if distance < known {
                // relax, possibly reopening an already settled node
                distances.insert(node, distance);
                previous.insert(node, (line.clone(), element.node));
                frontier.push(HeapElement { estimate, distance, node, line: Some(line.id()) });
            }
        }
    }

    Err(if out_of_bounds { RouteFailure::PathTooLong } else { RouteFailure::PathNotFound })
}

/// Unpacks the path from the destination back to the origin.
fn unpack_path<L: MapLine>(
    previous: &FxHashMap<L::NodeId, (L, L::NodeId)>,
    origin: L::NodeId,
    destination: L::NodeId,
    length: Length,
) -> AstarPath<L> {
    let mut lines = Vec::new();
    let mut next = destination;

    while next != origin {
        let Some((line, node)) = previous.get(&next) else {
            break;
        };
        lines.push(line.clone());
        next = *node;
    }
    debug_assert!(next == origin);

    lines.reverse();
    AstarPath { lines, length }
}
