use thiserror::Error;

use crate::model::Length;

/// Failures of the decoding process.
///
/// Candidate rejections, single routing failures and single pair failures
/// are recovered internally (the matcher tries the next alternative); an
/// error is only returned once the whole search tree for a reference is
/// exhausted, or when the reference or its offsets are invalid. Location
/// reference points are identified by their index within the reference.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum DecodeError {
    #[error("no candidates found for LRP {0}")]
    NoCandidatesForLrp(usize),
    #[error("no route found between LRP {from_lrp} and LRP {to_lrp}")]
    RouteNotFound { from_lrp: usize, to_lrp: usize },
    #[error("route length {length} outside [{min}, {max}]")]
    RouteLengthOutOfBounds { length: Length, min: Length, max: Length },
    #[error("no candidate pair between LRP {from_lrp} and LRP {to_lrp} could be matched")]
    MatchingFailed { from_lrp: usize, to_lrp: usize },
    #[error("offsets are larger than the location path")]
    OffsetTooLarge,
    #[error("line geometries are not connected")]
    DisconnectedGeometries,
    #[error("location reference is not valid: {0}")]
    InvalidReference(&'static str),
}

/// Failure modes of the length-constrained route search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteFailure {
    /// The search frontier was exhausted without reaching the target.
    PathNotFound,
    /// Every remaining expansion would have exceeded the maximum length.
    PathTooLong,
}
