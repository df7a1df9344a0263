//! Endpoint paths, relative to the configured base URL.

use chrono::Utc;

/// Current wall-clock time in epoch milliseconds.
///
/// Appended to some paths so intermediate caches do not serve stale data.
pub fn cache_buster() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn stations() -> String {
    "/elencoStazioni/0".to_string()
}

pub fn segments(categories: &str, timestamp: i64) -> String {
    format!("/elencoTratte/0/6/{categories}/null/{timestamp}")
}

pub fn segment_trains(categories: &str, segment_id_ab: i64, segment_id_ba: i64) -> String {
    format!("/dettagliTratta/0/{segment_id_ab}/{segment_id_ba}/{categories}/null")
}

pub fn region(station_id: &str) -> String {
    format!("/regione/{station_id}")
}

pub fn autocomplete(query: &str) -> String {
    format!("/cercaNumeroTrenoTrenoAutocomplete/{}", query.trim())
}

pub fn stop_canvas(station_id: &str, train_number: u32, timestamp: i64) -> String {
    format!("/tratteCanvas/{station_id}/{train_number}/{timestamp}")
}

pub fn train_progress(station_id: &str, train_number: u32, timestamp: i64) -> String {
    format!("/andamentoTreno/{station_id}/{train_number}/{timestamp}")
}
