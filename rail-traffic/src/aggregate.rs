//! Train aggregation pipeline.
//!
//! Turns the per-segment train lists fetched by the client into one
//! de-duplicated list of [`Train`]s:
//!
//! 1. flatten the per-segment lists
//! 2. drop records that fail [`keep_train_record`]
//! 3. normalize each record ([`convert_train`])
//! 4. collapse records sharing a [`TrainKey`](crate::domain::TrainKey)
//!
//! The fan-out that produces the per-segment lists lives in
//! [`TrafficClient::fetch_all_trains`](crate::client::TrafficClient::fetch_all_trains).

use tracing::debug;

use crate::domain::{Train, dedup_trains};
use crate::upstream::{ConversionError, RawTrainDto, convert_train};

/// Whether a raw train record is kept.
///
/// The rule is `!arrived || !departed`: the only record dropped is one
/// flagged as both arrived and departed. Its real-world meaning depends on
/// how the upstream sets the two flags, so it is applied exactly as stated.
pub fn keep_train_record(arrived: bool, departed: bool) -> bool {
    !arrived || !departed
}

/// [`keep_train_record`] applied to an upstream record.
pub fn keep_raw_train(raw: &RawTrainDto) -> bool {
    keep_train_record(raw.arrivato, raw.partito)
}

/// Run the flatten, filter, normalize and dedup steps.
///
/// Fails on the first record that cannot be normalized.
pub fn aggregate_trains(
    per_segment: Vec<Vec<RawTrainDto>>,
) -> Result<Vec<Train>, ConversionError> {
    let raw_count: usize = per_segment.iter().map(Vec::len).sum();

    let trains = per_segment
        .into_iter()
        .flatten()
        .filter(keep_raw_train)
        .map(|raw| convert_train(&raw))
        .collect::<Result<Vec<_>, _>>()?;

    let kept = trains.len();
    let trains = dedup_trains(trains);

    debug!(
        raw = raw_count,
        kept,
        unique = trains.len(),
        "Aggregated segment trains"
    );

    Ok(trains)
}

#[cfg(test)]
pub(crate) fn raw_train_json(number: u32, region: i32, arrived: bool, departed: bool) -> String {
    format!(
        r#"{{
            "numeroTreno": {number},
            "categoria": "",
            "compNumeroTreno": " REG {number}",
            "codOrigine": "S07113", "origine": "ANCONA",
            "codDestinazione": "S07103", "destinazione": "PESARO",
            "orarioPartenza": 1762124400000,
            "durata": "01:05",
            "ritardo": 2,
            "tratta": 1201,
            "regione": {region},
            "partito": {departed},
            "arrivato": {arrived}
        }}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(number: u32, region: i32, arrived: bool, departed: bool) -> RawTrainDto {
        serde_json::from_str(&raw_train_json(number, region, arrived, departed)).unwrap()
    }

    #[test]
    fn filter_truth_table() {
        assert!(!keep_train_record(true, true));
        assert!(keep_train_record(false, false));
        assert!(keep_train_record(true, false));
        assert!(keep_train_record(false, true));
    }

    #[test]
    fn completed_trains_are_dropped() {
        let per_segment = vec![
            vec![raw(1, 1, true, true), raw(2, 1, false, true)],
            vec![raw(3, 1, true, false)],
        ];

        let trains = aggregate_trains(per_segment).unwrap();
        let numbers: Vec<u32> = trains.iter().map(|t| t.train_number).collect();
        assert_eq!(numbers, vec![2, 3]);
    }

    #[test]
    fn trains_on_several_segments_collapse() {
        let per_segment = vec![
            vec![raw(9516, 3, false, true)],
            vec![raw(9516, 3, false, true), raw(9516, 7, false, true)],
            vec![],
        ];

        let trains = aggregate_trains(per_segment).unwrap();
        assert_eq!(trains.len(), 2);
        assert_eq!(trains[0].region_id, 3);
        assert_eq!(trains[1].region_id, 7);
    }

    #[test]
    fn records_are_normalized() {
        let trains = aggregate_trains(vec![vec![raw(3914, 11, false, false)]]).unwrap();

        assert_eq!(trains[0].train_category, "REG");
        assert_eq!(trains[0].travel_duration, 65);
        assert_eq!(trains[0].segment_id, "1201");
    }

    #[test]
    fn bad_record_fails_aggregation() {
        let mut broken = raw(2, 1, false, false);
        broken.durata = "soon".to_string();

        let result = aggregate_trains(vec![vec![raw(1, 1, false, false)], vec![broken]]);
        assert!(matches!(result, Err(ConversionError::InvalidDuration(_))));
    }

    #[test]
    fn dropped_records_are_not_normalized() {
        // A completed train with a broken duration never reaches normalization
        let mut completed = raw(2, 1, true, true);
        completed.durata = "soon".to_string();

        let trains = aggregate_trains(vec![vec![completed, raw(1, 1, false, false)]]).unwrap();
        assert_eq!(trains.len(), 1);
    }

    #[test]
    fn empty_input() {
        assert!(aggregate_trains(Vec::new()).unwrap().is_empty());
    }
}
