#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use openlr_decoder::{
    Coordinate, Fow, Frc, GeoTool, Length, MapLine, MapNode, MapReader, Wgs84,
};
use rstar::{AABB, PointDistance, RTree, RTreeObject};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineId(pub i64);

#[derive(Debug, Clone)]
pub struct TestLine(Arc<TestLineData>);

#[derive(Debug)]
struct TestLineData {
    id: LineId,
    start: NodeId,
    end: NodeId,
    frc: Frc,
    fow: Fow,
    geometry: Vec<Coordinate>,
    length: Length,
}

impl PartialEq for TestLine {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestNode {
    id: NodeId,
    coordinate: Coordinate,
}

#[derive(Debug)]
struct SpatialNode {
    node: NodeId,
    coordinate: Coordinate,
}

impl RTreeObject for SpatialNode {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.coordinate.lon, self.coordinate.lat])
    }
}

impl PointDistance for SpatialNode {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let point = Coordinate { lon: point[0], lat: point[1] };
        let distance = Wgs84.distance(self.coordinate, point).meters();
        distance * distance
    }
}

#[derive(Debug)]
struct SpatialLine {
    line: LineId,
    geometry: Vec<Coordinate>,
}

impl RTreeObject for SpatialLine {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        let lons = self.geometry.iter().map(|c| c.lon);
        let lats = self.geometry.iter().map(|c| c.lat);
        AABB::from_corners(
            [lons.clone().fold(f64::INFINITY, f64::min), lats.clone().fold(f64::INFINITY, f64::min)],
            [lons.fold(f64::NEG_INFINITY, f64::max), lats.fold(f64::NEG_INFINITY, f64::max)],
        )
    }
}

impl PointDistance for SpatialLine {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let point = Coordinate { lon: point[0], lat: point[1] };
        let (_, away) = Wgs84.project(&self.geometry, point);
        away.meters() * away.meters()
    }
}

/// In-memory road network with R-tree backed spatial queries.
pub struct TestMap {
    nodes: BTreeMap<NodeId, TestNode>,
    lines: BTreeMap<LineId, TestLine>,
    outgoing: BTreeMap<NodeId, Vec<LineId>>,
    incoming: BTreeMap<NodeId, Vec<LineId>>,
    spatial_nodes: RTree<SpatialNode>,
    spatial_lines: RTree<SpatialLine>,
}

impl TestMap {
    pub fn new(nodes: &[(u64, f64, f64)], lines: &[(i64, u64, u64, Frc, Fow)]) -> Self {
        let nodes: BTreeMap<NodeId, TestNode> = nodes
            .iter()
            .map(|&(id, lon, lat)| {
                let id = NodeId(id);
                (id, TestNode { id, coordinate: Coordinate { lon, lat } })
            })
            .collect();

        let mut outgoing: BTreeMap<NodeId, Vec<LineId>> = BTreeMap::new();
        let mut incoming: BTreeMap<NodeId, Vec<LineId>> = BTreeMap::new();

        let lines: BTreeMap<LineId, TestLine> = lines
            .iter()
            .map(|&(id, start, end, frc, fow)| {
                let id = LineId(id);
                let (start, end) = (NodeId(start), NodeId(end));
                let geometry = vec![nodes[&start].coordinate, nodes[&end].coordinate];
                let length = Wgs84.line_string_length(&geometry);

                outgoing.entry(start).or_default().push(id);
                incoming.entry(end).or_default().push(id);

                let line =
                    TestLine(Arc::new(TestLineData { id, start, end, frc, fow, geometry, length }));
                (id, line)
            })
            .collect();

        let spatial_nodes = RTree::bulk_load(
            nodes
                .values()
                .map(|node| SpatialNode { node: node.id, coordinate: node.coordinate })
                .collect(),
        );
        let spatial_lines = RTree::bulk_load(
            lines
                .values()
                .map(|line| SpatialLine { line: line.0.id, geometry: line.0.geometry.clone() })
                .collect(),
        );

        TestMap { nodes, lines, outgoing, incoming, spatial_nodes, spatial_lines }
    }

    pub fn line(&self, id: i64) -> TestLine {
        self.lines[&LineId(id)].clone()
    }

    pub fn line_length(&self, id: i64) -> Length {
        self.line(id).length()
    }

    pub fn coordinate(&self, node: u64) -> Coordinate {
        self.nodes[&NodeId(node)].coordinate
    }
}

impl MapLine for TestLine {
    type LineId = LineId;
    type NodeId = NodeId;

    fn id(&self) -> LineId {
        self.0.id
    }

    fn start_node(&self) -> NodeId {
        self.0.start
    }

    fn end_node(&self) -> NodeId {
        self.0.end
    }

    fn frc(&self) -> Frc {
        self.0.frc
    }

    fn fow(&self) -> Fow {
        self.0.fow
    }

    fn coordinates(&self) -> impl Iterator<Item = Coordinate> {
        self.0.geometry.iter().copied()
    }

    fn length(&self) -> Length {
        self.0.length
    }
}

impl MapNode for TestNode {
    type NodeId = NodeId;

    fn id(&self) -> NodeId {
        self.id
    }

    fn coordinate(&self) -> Coordinate {
        self.coordinate
    }
}

impl MapReader for TestMap {
    type LineId = LineId;
    type NodeId = NodeId;
    type Line = TestLine;
    type Node = TestNode;

    fn get_line(&self, line: LineId) -> Option<TestLine> {
        self.lines.get(&line).cloned()
    }

    fn get_node(&self, node: NodeId) -> Option<TestNode> {
        self.nodes.get(&node).copied()
    }

    fn get_lines(&self) -> impl Iterator<Item = TestLine> {
        self.lines.values().cloned()
    }

    fn get_nodes(&self) -> impl Iterator<Item = TestNode> {
        self.nodes.values().copied()
    }

    fn find_lines_close_to(
        &self,
        coordinate: Coordinate,
        radius: Length,
    ) -> impl Iterator<Item = TestLine> {
        let radius_2 = radius.meters() * radius.meters();
        self.spatial_lines
            .nearest_neighbor_iter_with_distance_2(&[coordinate.lon, coordinate.lat])
            .take_while(move |(_, distance_2)| *distance_2 <= radius_2)
            .map(|(spatial, _)| self.lines[&spatial.line].clone())
    }

    fn find_nodes_close_to(
        &self,
        coordinate: Coordinate,
        radius: Length,
    ) -> impl Iterator<Item = TestNode> {
        let radius_2 = radius.meters() * radius.meters();
        self.spatial_nodes
            .nearest_neighbor_iter_with_distance_2(&[coordinate.lon, coordinate.lat])
            .take_while(move |(_, distance_2)| *distance_2 <= radius_2)
            .map(|(spatial, _)| self.nodes[&spatial.node])
    }

    fn outgoing_lines(&self, node: NodeId) -> impl Iterator<Item = TestLine> {
        self.outgoing
            .get(&node)
            .into_iter()
            .flatten()
            .map(|id| self.lines[id].clone())
    }

    fn incoming_lines(&self, node: NodeId) -> impl Iterator<Item = TestLine> {
        self.incoming
            .get(&node)
            .into_iter()
            .flatten()
            .map(|id| self.lines[id].clone())
    }
}
