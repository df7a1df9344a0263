//! Conversion from upstream DTOs to domain records.
//!
//! The upstream has a handful of data-quality quirks that are resolved here by
//! small named heuristics ([`infer_category`], [`parse_duration_minutes`],
//! [`is_current_stop`], [`select_platforms`]). They are kept as separate pure
//! functions so each can be tested and replaced on its own.

use chrono::{DateTime, Utc};

use crate::domain::{Location, Segment, Station, Train, TrainProgress, TrainStopInfo};

use super::types::{
    CanvasStopDto, FermataDto, RawTrainDto, SegmentDto, StationDto, TrainProgressDto,
};

/// Marker value of `actualFermataType` for a stop the train has reached.
pub const REACHED_STOP_MARKER: i32 = 1;

/// Stop-type code of a train's origin.
const ORIGIN_STOP_TYPE: &str = "P";

/// Stop-type code of a train's destination.
const DESTINATION_STOP_TYPE: &str = "A";

/// Error during DTO to domain conversion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    /// Travel duration not in "HH:MM" form
    #[error("invalid duration: {0:?}")]
    InvalidDuration(String),

    /// Epoch-millis value outside the representable range
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(i64),

    /// Missing required field
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Autocomplete line not in "label|code" form
    #[error("invalid autocomplete line: {0:?}")]
    InvalidAutocomplete(String),
}

/// Convert a station catalog entry.
///
/// The long name is preferred, then the short name, then the id itself.
pub fn convert_station(dto: &StationDto) -> Station {
    let localita = dto.localita.as_ref();
    let name = localita
        .and_then(|l| l.nome_lungo.as_deref())
        .or_else(|| localita.and_then(|l| l.nome_breve.as_deref()))
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(dto.codice_stazione.as_str())
        .trim()
        .to_string();

    Station {
        station_id: dto.codice_stazione.clone(),
        name,
        city: dto.nome_citta.clone().unwrap_or_default(),
        region_code: dto.cod_reg.unwrap_or_default(),
        location: Location::new(dto.lat.unwrap_or_default(), dto.lon.unwrap_or_default()),
    }
}

/// Convert a segment list entry.
pub fn convert_segment(dto: &SegmentDto) -> Segment {
    Segment {
        station_id_a: dto.node_a.clone(),
        station_id_b: dto.node_b.clone(),
        segment_id_ab: dto.segment_ab,
        segment_id_ba: dto.segment_ba,
        location_a: Location::new(dto.lat_a, dto.lon_a),
        location_b: Location::new(dto.lat_b, dto.lon_b),
        busy: dto.busy,
    }
}

/// Convert a per-segment train record.
pub fn convert_train(dto: &RawTrainDto) -> Result<Train, ConversionError> {
    let departure_time = dto
        .orario_partenza
        .ok_or(ConversionError::MissingField("orarioPartenza"))?;

    Ok(Train {
        departed: dto.partito,
        arrived: dto.arrivato,
        travelling: dto.in_viaggio,
        in_station: dto.in_stazione,
        departure_time: millis_to_utc(departure_time)?,
        segment_id: dto.tratta.clone(),
        region_id: dto.regione,
        train_category: infer_category(dto.categoria.as_deref(), &dto.comp_numero_treno),
        train_number: dto.numero_treno,
        changing_number: dto.ha_cambi_numero,
        station_a: dto.origine.clone(),
        station_id_a: dto.cod_origine.clone(),
        station_b: dto.destinazione.clone(),
        station_id_b: dto.cod_destinazione.clone(),
        travel_duration: parse_duration_minutes(&dto.durata)?,
        delay: dto.ritardo.unwrap_or_default(),
        latest_detection: optional_millis(dto.ora_ultimo_rilevamento),
    })
}

/// Train category, falling back to the formatted train number.
///
/// Some operators leave the category empty and instead prefix it to the
/// formatted number (`" FR 9516"`); the first whitespace-delimited token of
/// that string is used then.
///
/// The category is trimmed before the emptiness check, so a whitespace-only
/// category counts as missing and padding around a real one is dropped.
///
/// ```
/// use rail_traffic::upstream::infer_category;
///
/// assert_eq!(infer_category(Some("REG"), " REG 3914"), "REG");
/// assert_eq!(infer_category(Some(""), " FR 9516"), "FR");
/// assert_eq!(infer_category(None, " FR 9516"), "FR");
/// assert_eq!(infer_category(Some("  "), " FR 9516"), "FR");
/// assert_eq!(infer_category(Some(" IC "), " FR 9516"), "IC");
/// ```
pub fn infer_category(category: Option<&str>, formatted_number: &str) -> String {
    match category.map(str::trim) {
        Some(c) if !c.is_empty() => c.to_string(),
        _ => formatted_number
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

/// Parse an "HH:MM" duration into total minutes.
///
/// ```
/// use rail_traffic::upstream::parse_duration_minutes;
///
/// assert_eq!(parse_duration_minutes("02:15").unwrap(), 135);
/// assert!(parse_duration_minutes("2h15").is_err());
/// ```
pub fn parse_duration_minutes(s: &str) -> Result<u32, ConversionError> {
    let invalid = || ConversionError::InvalidDuration(s.to_string());

    let (hours, minutes) = s.trim().split_once(':').ok_or_else(invalid)?;
    let hours: u32 = hours.parse().map_err(|_| invalid())?;
    let minutes: u32 = minutes.parse().map_err(|_| invalid())?;

    if minutes >= 60 {
        return Err(invalid());
    }

    hours
        .checked_mul(60)
        .and_then(|h| h.checked_add(minutes))
        .ok_or_else(invalid)
}

/// Whether the stop at `index` is the train's current stop.
///
/// A stop is current when its progress marker is [`REACHED_STOP_MARKER`] and
/// the following stop either does not exist or carries a different marker.
/// For a well-formed itinerary that is the last stop the train has reached.
/// Out-of-range indices are never current.
pub fn is_current_stop(markers: &[i32], index: usize) -> bool {
    match markers.get(index) {
        Some(&marker) if marker == REACHED_STOP_MARKER => markers
            .get(index + 1)
            .is_none_or(|&next| next != REACHED_STOP_MARKER),
        _ => false,
    }
}

/// Scheduled and actual platform for a stop.
///
/// The origin only has departure platforms; every other stop reports its
/// arrival platforms. Blank platform strings become `None`.
pub fn select_platforms(stop: &FermataDto, is_origin: bool) -> (Option<String>, Option<String>) {
    let (expected, actual) = if is_origin {
        (
            &stop.binario_programmato_partenza_descrizione,
            &stop.binario_effettivo_partenza_descrizione,
        )
    } else {
        (
            &stop.binario_programmato_arrivo_descrizione,
            &stop.binario_effettivo_arrivo_descrizione,
        )
    };

    (clean_platform(expected.as_deref()), clean_platform(actual.as_deref()))
}

fn clean_platform(platform: Option<&str>) -> Option<String> {
    platform
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
}

/// Convert the stop canvas, where first/last/current are reported directly.
pub fn convert_canvas_stops(
    stops: &[CanvasStopDto],
) -> Result<Vec<TrainStopInfo>, ConversionError> {
    stops
        .iter()
        .map(|canvas| {
            let is_current = canvas.stazione_corrente.unwrap_or(false);
            build_stop(
                &canvas.fermata,
                &canvas.id,
                &canvas.stazione,
                canvas.first,
                canvas.last,
                is_current,
            )
        })
        .collect()
}

/// Convert a full `andamentoTreno` response, inferring the current stop.
pub fn convert_train_progress(dto: &TrainProgressDto) -> Result<TrainProgress, ConversionError> {
    let markers: Vec<i32> = dto.fermate.iter().map(|f| f.actual_fermata_type).collect();

    let stops = dto
        .fermate
        .iter()
        .enumerate()
        .map(|(i, stop)| {
            build_stop(
                stop,
                &stop.id,
                &stop.stazione,
                stop.tipo_fermata == ORIGIN_STOP_TYPE,
                stop.tipo_fermata == DESTINATION_STOP_TYPE,
                is_current_stop(&markers, i),
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TrainProgress {
        train_number: dto.numero_treno,
        train_category: infer_category(dto.categoria.as_deref(), &dto.comp_numero_treno),
        station_a: dto.origine.clone(),
        station_id_a: dto.id_origine.clone(),
        station_b: dto.destinazione.clone(),
        station_id_b: dto.id_destinazione.clone(),
        delay: dto.ritardo.unwrap_or_default(),
        latest_detection: optional_millis(dto.ora_ultimo_rilevamento),
        latest_detection_station: dto
            .stazione_ultimo_rilevamento
            .clone()
            .filter(|s| !s.trim().is_empty() && s != "--"),
        stops,
    })
}

fn build_stop(
    stop: &FermataDto,
    station_id: &str,
    name: &str,
    is_first: bool,
    is_last: bool,
    is_current: bool,
) -> Result<TrainStopInfo, ConversionError> {
    let (expected_platform, actual_platform) = select_platforms(stop, is_first);

    Ok(TrainStopInfo {
        station_id: non_empty_or(station_id, &stop.id),
        name: non_empty_or(name, &stop.stazione),
        is_first_stop: is_first,
        is_last_stop: is_last,
        is_current_stop: is_current,
        expected_arrival: optional_millis_checked(stop.arrivo_teorico)?,
        actual_arrival: optional_millis_checked(stop.arrivo_reale)?,
        expected_departure: optional_millis_checked(stop.partenza_teorica)?,
        actual_departure: optional_millis_checked(stop.partenza_reale)?,
        delay_at_arrival: stop.ritardo_arrivo,
        delay_at_departure: stop.ritardo_partenza,
        expected_platform,
        actual_platform,
    })
}

fn non_empty_or(preferred: &str, fallback: &str) -> String {
    if preferred.is_empty() {
        fallback.to_string()
    } else {
        preferred.to_string()
    }
}

fn millis_to_utc(ms: i64) -> Result<DateTime<Utc>, ConversionError> {
    DateTime::from_timestamp_millis(ms).ok_or(ConversionError::InvalidTimestamp(ms))
}

/// Optional timestamp where zero means "not reported" and bad values are dropped.
fn optional_millis(ms: Option<i64>) -> Option<DateTime<Utc>> {
    ms.filter(|&ms| ms != 0)
        .and_then(DateTime::from_timestamp_millis)
}

/// Optional timestamp where zero means "not reported" and bad values fail.
fn optional_millis_checked(ms: Option<i64>) -> Result<Option<DateTime<Utc>>, ConversionError> {
    ms.filter(|&ms| ms != 0).map(millis_to_utc).transpose()
}
