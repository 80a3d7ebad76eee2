#![doc = include_str!("../README.md")]

mod decoder;
mod error;
mod geo;
mod map;
mod model;
mod observer;
mod route;

pub use decoder::astar::{AstarPath, shortest_path};
pub use decoder::candidates::{
    Candidate, ScoreBreakdown, compute_candidate_bearing, nominate_candidates,
};
pub use decoder::location::{build_line_location, combine_routes, remove_offsets};
pub use decoder::matcher::{find_candidate_route, handle_candidate_pair, match_tail};
pub use decoder::{DecoderConfig, FowScoreTable, decode_line, decode_line_with};
pub use error::{DecodeError, RouteFailure};
pub use geo::{GeoTool, Wgs84};
pub use map::{MapLine, MapNode, MapReader};
pub use model::{
    Bearing, Coordinate, Fow, Frc, Length, LineLocationReference, LocationReferencePoint,
    Offsets, PathAttributes, Score,
};
pub use observer::{
    CandidateRejection, CollectingObserver, DecodeEvent, DecoderObserver, NoopObserver,
    TracingObserver,
};
pub use route::{LineLocation, PointOnLine, Route};
