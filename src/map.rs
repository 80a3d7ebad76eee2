//! Abstract contract between the decoder and the target map. Implement
//! these traits to decode location references on your own road network;
//! the backing store may be an in-memory graph, an R-tree or a spatial
//! database. The decoder treats the map as a read-only data source.

use std::fmt::Debug;
use std::hash::Hash;

use crate::model::{Coordinate, Fow, Frc, Length};

/// A line interconnects exactly two nodes in exactly one direction. Roads
/// traversable both ways are represented by two lines. Invariant: `length`
/// equals the geodesic length of `coordinates`.
pub trait MapLine: Clone {
    /// Uniquely identifies a line of the map.
    type LineId: Debug + Copy + Eq + Ord + Hash;
    /// Uniquely identifies a node of the map.
    type NodeId: Debug + Copy + Eq + Ord + Hash;

    fn id(&self) -> Self::LineId;

    /// The node this line starts from.
    fn start_node(&self) -> Self::NodeId;

    /// The node this line ends into.
    fn end_node(&self) -> Self::NodeId;

    /// Functional Road Class of the line.
    fn frc(&self) -> Frc;

    /// Form of Way of the line.
    fn fow(&self) -> Fow;

    /// The shape of the line, from its start node to its end node.
    fn coordinates(&self) -> impl Iterator<Item = Coordinate>;

    /// Total length of the line in meters.
    fn length(&self) -> Length;
}

/// A node is an object with an id and a WGS84 position.
pub trait MapNode {
    type NodeId: Debug + Copy + Eq + Ord + Hash;

    fn id(&self) -> Self::NodeId;

    fn coordinate(&self) -> Coordinate;
}

/// Read-only access to the nodes and lines of the target map.
pub trait MapReader {
    type LineId: Debug + Copy + Eq + Ord + Hash;
    type NodeId: Debug + Copy + Eq + Ord + Hash;
    type Line: MapLine<LineId = Self::LineId, NodeId = Self::NodeId>;
    type Node: MapNode<NodeId = Self::NodeId>;

    /// Gets a line by its id.
    fn get_line(&self, line: Self::LineId) -> Option<Self::Line>;

    /// Gets a node by its id.
    fn get_node(&self, node: Self::NodeId) -> Option<Self::Node>;

    /// Iterates over all the lines of the map.
    fn get_lines(&self) -> impl Iterator<Item = Self::Line>;

    /// Iterates over all the nodes of the map.
    fn get_nodes(&self) -> impl Iterator<Item = Self::Node>;

    /// Iterates over the lines within `radius` meters around the coordinate.
    /// Every line whose minimum distance to the coordinate is within the
    /// radius must be returned; the order is unspecified.
    fn find_lines_close_to(
        &self,
        coordinate: Coordinate,
        radius: Length,
    ) -> impl Iterator<Item = Self::Line>;

    /// Iterates over the nodes within `radius` meters around the coordinate.
    /// The order is unspecified.
    fn find_nodes_close_to(
        &self,
        coordinate: Coordinate,
        radius: Length,
    ) -> impl Iterator<Item = Self::Node>;

    /// Iterates over all the lines exiting the given node.
    fn outgoing_lines(&self, node: Self::NodeId) -> impl Iterator<Item = Self::Line>;

    /// Iterates over all the lines entering the given node.
    fn incoming_lines(&self, node: Self::NodeId) -> impl Iterator<Item = Self::Line>;

    /// Iterates over all the lines touching the given node.
    fn connected_lines(&self, node: Self::NodeId) -> impl Iterator<Item = Self::Line> {
        self.incoming_lines(node).chain(self.outgoing_lines(node))
    }
}
