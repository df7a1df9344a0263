//! Station records.

use serde::Serialize;

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A station from the catalog snapshot.
///
/// Identity is `station_id` (e.g. `"S08409"`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub station_id: String,
    pub name: String,
    pub city: String,
    /// Region code as reported by the catalog.
    pub region_code: i32,
    pub location: Location,
}
