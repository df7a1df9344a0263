//! Live train records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::keyed::dedup_last_wins;

/// A train observed on one of the network segments.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Train {
    pub departed: bool,
    pub arrived: bool,
    pub travelling: bool,
    pub in_station: bool,
    pub departure_time: DateTime<Utc>,
    pub segment_id: String,
    pub region_id: i32,
    pub train_category: String,
    pub train_number: u32,
    /// Whether the train changes number along its route.
    pub changing_number: bool,
    pub station_a: String,
    pub station_id_a: String,
    pub station_b: String,
    pub station_id_b: String,
    /// Scheduled travel time in minutes.
    pub travel_duration: u32,
    /// Current delay in minutes (negative when early).
    pub delay: i32,
    pub latest_detection: Option<DateTime<Utc>>,
}

impl Train {
    pub fn key(&self) -> TrainKey {
        TrainKey {
            train_number: self.train_number,
            region_id: self.region_id,
        }
    }
}

/// Deduplication identity of a train.
///
/// Train numbers are reused by unrelated trains in different regions, so the
/// number alone does not identify a train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrainKey {
    pub train_number: u32,
    pub region_id: i32,
}

impl fmt::Display for TrainKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.train_number, self.region_id)
    }
}

/// Collapse trains reported on several segments to one record per [`TrainKey`].
///
/// The record seen last wins, in the slot of the first record with that key.
pub fn dedup_trains(trains: Vec<Train>) -> Vec<Train> {
    dedup_last_wins(trains, Train::key)
}

/// A candidate resolution of a bare train number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainAutocompleteMatch {
    pub train_number: u32,
    /// Name of the departure station.
    pub station_a: String,
    /// Id of the departure station.
    pub station_id_a: String,
}

#[cfg(test)]
pub(crate) fn train(train_number: u32, region_id: i32) -> Train {
    Train {
        departed: true,
        arrived: false,
        travelling: true,
        in_station: false,
        departure_time: DateTime::from_timestamp_millis(1_762_124_400_000).unwrap(),
        segment_id: "1201".to_string(),
        region_id,
        train_category: "REG".to_string(),
        train_number,
        changing_number: false,
        station_a: "ANCONA".to_string(),
        station_id_a: "S07113".to_string(),
        station_b: "PESARO".to_string(),
        station_id_b: "S07103".to_string(),
        travel_duration: 45,
        delay: 0,
        latest_detection: None,
    }
}
