//! Itinerary records for a single train.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One physical stop on a train's itinerary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainStopInfo {
    pub station_id: String,
    pub name: String,
    pub is_first_stop: bool,
    pub is_last_stop: bool,
    /// The stop the train occupies or most recently left.
    pub is_current_stop: bool,
    pub expected_arrival: Option<DateTime<Utc>>,
    pub actual_arrival: Option<DateTime<Utc>>,
    pub expected_departure: Option<DateTime<Utc>>,
    pub actual_departure: Option<DateTime<Utc>>,
    pub delay_at_arrival: Option<i32>,
    pub delay_at_departure: Option<i32>,
    pub expected_platform: Option<String>,
    pub actual_platform: Option<String>,
}

/// The full itinerary of a train with its latest reported status.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainProgress {
    pub train_number: u32,
    pub train_category: String,
    pub station_a: String,
    pub station_id_a: String,
    pub station_b: String,
    pub station_id_b: String,
    pub delay: i32,
    pub latest_detection: Option<DateTime<Utc>>,
    pub latest_detection_station: Option<String>,
    /// Stops in route order.
    pub stops: Vec<TrainStopInfo>,
}

impl TrainProgress {
    /// The stop currently flagged as the train's position, if any.
    pub fn current_stop(&self) -> Option<&TrainStopInfo> {
        self.stops.iter().find(|s| s.is_current_stop)
    }
}
