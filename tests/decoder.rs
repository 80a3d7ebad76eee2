mod common;

use approx::assert_abs_diff_eq;
use openlr_decoder::{
    Bearing, CandidateRejection, CollectingObserver, Coordinate, DecodeError, DecodeEvent,
    DecoderConfig, Fow, Frc, GeoTool, Length, LineLocationReference, LocationReferencePoint,
    MapLine, Offsets, PathAttributes, Wgs84, decode_line, decode_line_with,
};
use test_log::test;

use crate::common::{LineId, TestMap};

/// Several disjoint road clusters, far enough apart that candidate searches
/// never leak across them:
/// - a straight 300m motorway (line 101)
/// - an L-shaped path across one intersection (lines 102, 103)
/// - a 150m approach with a 200m continuation east (lines 104, 105)
/// - a dual carriageway, one line per direction (106 east, 107 west)
/// - a straight three-line path (lines 301, 302, 303)
fn network() -> TestMap {
    TestMap::new(
        &[
            (1, 13.4600, 52.5100),
            (2, 13.4600, 52.5126972),
            (3, 13.4650, 52.5100),
            (4, 13.4650, 52.5113486),
            (5, 13.4679522, 52.5113486),
            (6, 13.4700, 52.5100),
            (7, 13.4700, 52.5113486),
            (8, 13.4729522, 52.5113486),
            (11, 13.4550, 52.5150),
            (12, 13.4579541, 52.5150),
            (13, 13.4579541, 52.51505),
            (14, 13.4550, 52.51505),
            (21, 13.4800, 52.5100),
            (22, 13.4800, 52.5113486),
            (23, 13.4800, 52.5126972),
            (24, 13.4800, 52.5140458),
        ],
        &[
            (101, 1, 2, Frc::Frc0, Fow::Motorway),
            (102, 3, 4, Frc::Frc2, Fow::SingleCarriageway),
            (103, 4, 5, Frc::Frc2, Fow::SingleCarriageway),
            (104, 6, 7, Frc::Frc2, Fow::SingleCarriageway),
            (105, 7, 8, Frc::Frc2, Fow::SingleCarriageway),
            (106, 11, 12, Frc::Frc2, Fow::MultipleCarriageway),
            (107, 13, 14, Frc::Frc2, Fow::MultipleCarriageway),
            (301, 21, 22, Frc::Frc2, Fow::SingleCarriageway),
            (302, 22, 23, Frc::Frc2, Fow::SingleCarriageway),
            (303, 23, 24, Frc::Frc2, Fow::SingleCarriageway),
        ],
    )
}

fn bearing_towards(from: Coordinate, to: Coordinate) -> Bearing {
    Bearing::from_degrees(Wgs84.bearing(from, to).to_degrees())
}

fn lrp(
    coordinate: Coordinate,
    frc: Frc,
    fow: Fow,
    bearing: Bearing,
    path: Option<PathAttributes>,
) -> LocationReferencePoint {
    LocationReferencePoint { coordinate, frc, fow, bearing, path }
}

fn line_ids<L: MapLine>(lines: &[L]) -> Vec<L::LineId> {
    lines.iter().map(MapLine::id).collect()
}

#[test]
fn decode_straight_motorway_between_exact_nodes() {
    let map = network();
    let (a, b) = (map.coordinate(1), map.coordinate(2));
    let dnp = Wgs84.distance(a, b);

    let reference = LineLocationReference {
        points: vec![
            lrp(
                a,
                Frc::Frc0,
                Fow::Motorway,
                bearing_towards(a, b),
                Some(PathAttributes { lfrcnp: Frc::Frc0, dnp }),
            ),
            lrp(b, Frc::Frc0, Fow::Motorway, bearing_towards(b, a), None),
        ],
        offsets: Offsets::default(),
    };

    let location = decode_line(&DecoderConfig::default(), &map, &reference).unwrap();

    assert_eq!(line_ids(&location.lines), [LineId(101)]);
    assert_eq!(location.start_offset, Length::ZERO);
    assert_eq!(location.end_offset, Length::ZERO);
}

#[test]
fn decode_l_shaped_path_across_an_intersection() {
    let map = network();
    let (a, b, c) = (map.coordinate(3), map.coordinate(4), map.coordinate(5));
    let (dnp_1, dnp_2) = (Wgs84.distance(a, b), Wgs84.distance(b, c));

    let reference = LineLocationReference {
        points: vec![
            lrp(
                a,
                Frc::Frc2,
                Fow::SingleCarriageway,
                bearing_towards(a, b),
                Some(PathAttributes { lfrcnp: Frc::Frc2, dnp: dnp_1 }),
            ),
            lrp(
                b,
                Frc::Frc2,
                Fow::SingleCarriageway,
                bearing_towards(b, c),
                Some(PathAttributes { lfrcnp: Frc::Frc2, dnp: dnp_2 }),
            ),
            lrp(c, Frc::Frc2, Fow::SingleCarriageway, bearing_towards(c, b), None),
        ],
        offsets: Offsets::default(),
    };

    let mut observer = CollectingObserver::new();
    let location =
        decode_line_with(&DecoderConfig::default(), &map, &reference, &Wgs84, &mut observer)
            .unwrap();

    assert_eq!(line_ids(&location.lines), [LineId(102), LineId(103)]);
    assert_eq!(location.start_offset, Length::ZERO);
    assert_eq!(location.end_offset, Length::ZERO);

    // one accepted route per consecutive pair of points
    let successes = observer
        .events()
        .iter()
        .filter(|event| matches!(event, DecodeEvent::RouteSuccess { .. }))
        .count();
    assert_eq!(successes, 2);

    // round trip: the location length equals the sum of the encoded
    // distances, within the configured tolerance
    let total: Length = location.lines.iter().map(MapLine::length).sum();
    let length = total - location.start_offset - location.end_offset;
    let encoded = dnp_1 + dnp_2;
    assert_abs_diff_eq!(
        length.meters(),
        encoded.meters(),
        epsilon = DecoderConfig::default().dnp_abs_tol.meters()
    );
    assert_abs_diff_eq!(length.meters(), 350.0, epsilon = 25.0);
}

#[test]
fn decode_lrp_matching_an_outgoing_alternative_beyond_the_line_end() {
    let map = network();
    let geo = Wgs84;

    // 40m beyond the far node of line 104, bearing east along line 105
    let position = geo.extrapolate(map.coordinate(7), Length::from_meters(40.0), 0.0);
    let dnp = map.line_length(105);

    let reference = LineLocationReference {
        points: vec![
            lrp(
                position,
                Frc::Frc2,
                Fow::SingleCarriageway,
                bearing_towards(map.coordinate(7), map.coordinate(8)),
                Some(PathAttributes { lfrcnp: Frc::Frc2, dnp }),
            ),
            lrp(
                map.coordinate(8),
                Frc::Frc2,
                Fow::SingleCarriageway,
                bearing_towards(map.coordinate(8), map.coordinate(7)),
                None,
            ),
        ],
        offsets: Offsets::default(),
    };

    let location = decode_line(&DecoderConfig::default(), &map, &reference).unwrap();

    assert_eq!(line_ids(&location.lines), [LineId(105)]);
    assert_eq!(location.start_offset, Length::ZERO);
    assert_eq!(location.end_offset, Length::ZERO);
}

#[test]
fn decode_rejects_the_wrong_direction_carriageway() {
    let map = network();
    let geo = Wgs84;

    // between the two carriageways, closer to the westbound line 107, but
    // heading east along line 106
    let position = Coordinate { lon: 13.4551, lat: 52.51504 };
    let destination = map.coordinate(12);
    let dnp = geo.distance(position, destination);

    let reference = LineLocationReference {
        points: vec![
            lrp(
                position,
                Frc::Frc2,
                Fow::MultipleCarriageway,
                Bearing::from_degrees(90.0),
                Some(PathAttributes { lfrcnp: Frc::Frc2, dnp }),
            ),
            lrp(
                destination,
                Frc::Frc2,
                Fow::MultipleCarriageway,
                bearing_towards(destination, map.coordinate(11)),
                None,
            ),
        ],
        offsets: Offsets::default(),
    };

    let mut observer = CollectingObserver::new();
    let location =
        decode_line_with(&DecoderConfig::default(), &map, &reference, &geo, &mut observer)
            .unwrap();

    assert_eq!(line_ids(&location.lines), [LineId(106)]);

    // the closer but opposing candidate was rejected for its bearing
    assert!(observer.events().iter().any(|event| matches!(
        event,
        DecodeEvent::CandidateRejected {
            line: LineId(107),
            reason: CandidateRejection::BearingDeviation,
            ..
        }
    )));
}

#[test]
fn decode_trims_a_positive_offset_past_the_first_line() {
    let map = network();
    let (a, b) = (map.coordinate(21), map.coordinate(24));
    let dnp = map.line_length(301) + map.line_length(302) + map.line_length(303);

    // the offset consumes the whole first line plus ten meters
    let pos = (map.line_length(301) + Length::from_meters(10.0)).meters() / dnp.meters();

    let reference = LineLocationReference {
        points: vec![
            lrp(
                a,
                Frc::Frc2,
                Fow::SingleCarriageway,
                bearing_towards(a, map.coordinate(22)),
                Some(PathAttributes { lfrcnp: Frc::Frc2, dnp }),
            ),
            lrp(b, Frc::Frc2, Fow::SingleCarriageway, bearing_towards(b, map.coordinate(23)), None),
        ],
        offsets: Offsets { pos, neg: 0.0 },
    };

    let location = decode_line(&DecoderConfig::default(), &map, &reference).unwrap();

    assert_eq!(line_ids(&location.lines), [LineId(302), LineId(303)]);
    assert_abs_diff_eq!(location.start_offset.meters(), 10.0, epsilon = 1e-6);
    assert_eq!(location.end_offset, Length::ZERO);
}

#[test]
fn decode_without_any_candidate_names_the_offending_lrp() {
    let map = network();
    let geo = Wgs84;

    // far away from every road of the network
    let a = Coordinate { lon: 13.4900, lat: 52.5100 };
    let b = Coordinate { lon: 13.4920, lat: 52.5100 };

    let reference = LineLocationReference {
        points: vec![
            lrp(
                a,
                Frc::Frc2,
                Fow::SingleCarriageway,
                Bearing::from_degrees(90.0),
                Some(PathAttributes { lfrcnp: Frc::Frc2, dnp: geo.distance(a, b) }),
            ),
            lrp(b, Frc::Frc2, Fow::SingleCarriageway, Bearing::from_degrees(270.0), None),
        ],
        offsets: Offsets::default(),
    };

    let mut observer = CollectingObserver::new();
    let result =
        decode_line_with(&DecoderConfig::default(), &map, &reference, &geo, &mut observer);

    assert_eq!(result, Err(DecodeError::NoCandidatesForLrp(0)));
    assert!(observer
        .events()
        .iter()
        .any(|event| matches!(event, DecodeEvent::NoCandidatesFound { .. })));
}

#[test]
fn decode_rejects_invalid_references() {
    let map = network();
    let config = DecoderConfig::default();

    let reference = LineLocationReference::default();
    assert!(matches!(
        decode_line(&config, &map, &reference),
        Err(DecodeError::InvalidReference(_))
    ));
}

#[test]
fn decode_is_deterministic() {
    let map = network();
    let (a, b, c) = (map.coordinate(3), map.coordinate(4), map.coordinate(5));

    let reference = LineLocationReference {
        points: vec![
            lrp(
                a,
                Frc::Frc2,
                Fow::SingleCarriageway,
                bearing_towards(a, b),
                Some(PathAttributes { lfrcnp: Frc::Frc2, dnp: Wgs84.distance(a, b) }),
            ),
            lrp(
                b,
                Frc::Frc2,
                Fow::SingleCarriageway,
                bearing_towards(b, c),
                Some(PathAttributes { lfrcnp: Frc::Frc2, dnp: Wgs84.distance(b, c) }),
            ),
            lrp(c, Frc::Frc2, Fow::SingleCarriageway, bearing_towards(c, b), None),
        ],
        offsets: Offsets::default(),
    };

    let config = DecoderConfig::default();
    let first = decode_line(&config, &map, &reference).unwrap();
    let second = decode_line(&config, &map, &reference).unwrap();

    assert_eq!(first, second);
    assert_eq!(line_ids(&first.lines), line_ids(&second.lines));
    assert_eq!(first.start_offset, second.start_offset);
    assert_eq!(first.end_offset, second.end_offset);
}
