//! Track segments and the unique-segment derivation.

use std::fmt;

use serde::Serialize;

use super::keyed::dedup_last_wins;
use super::station::Location;

/// A physical track link between two stations.
///
/// The upstream identifies each traversal direction separately, so a segment
/// carries two ids. `busy` is reported by the upstream and may be stale.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub station_id_a: String,
    pub station_id_b: String,
    pub segment_id_ab: i64,
    pub segment_id_ba: i64,
    pub location_a: Location,
    pub location_b: Location,
    pub busy: bool,
}

impl Segment {
    /// The key under which duplicate segment records collapse.
    pub fn unique_key(&self) -> UniqueSegmentKey {
        UniqueSegmentKey {
            ab: self.segment_id_ab,
            ba: self.segment_id_ba,
        }
    }
}

/// Identity of a bidirectional segment: the `(ab, ba)` id pair.
///
/// Displays as `"{ab}-{ba}"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniqueSegmentKey {
    ab: i64,
    ba: i64,
}

impl fmt::Display for UniqueSegmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.ab, self.ba)
    }
}

/// Keep only segments the upstream reports as occupied.
pub fn busy_segments(segments: Vec<Segment>) -> Vec<Segment> {
    segments.into_iter().filter(|s| s.busy).collect()
}

/// Collapse segments sharing a [`UniqueSegmentKey`] to one record each.
///
/// When two records collide the later one's payload is kept (see
/// [`dedup_last_wins`]). The upstream has not been observed to emit
/// colliding records with differing payloads, so which one survives is
/// not something callers should rely on.
pub fn unique_segments(segments: Vec<Segment>) -> Vec<Segment> {
    dedup_last_wins(segments, Segment::unique_key)
}

#[cfg(test)]
pub(crate) fn segment(ab: i64, ba: i64, busy: bool) -> Segment {
    Segment {
        station_id_a: format!("S{ab:05}"),
        station_id_b: format!("S{ba:05}"),
        segment_id_ab: ab,
        segment_id_ba: ba,
        location_a: Location::new(45.0, 9.0),
        location_b: Location::new(45.1, 9.1),
        busy,
    }
}
