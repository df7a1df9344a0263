//! Upstream response DTOs.
//!
//! These map directly to the JSON the traffic service returns. The service
//! omits fields, sends `null` where a value is expected, and mixes numbers and
//! strings for the same field, so most fields are `Option` or defaulted.
//! Timestamps are epoch milliseconds.

use serde::{Deserialize, Deserializer};

/// Entry of the station catalog (`elencoStazioni`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationDto {
    pub codice_stazione: String,
    pub localita: Option<LocalitaDto>,
    pub nome_citta: Option<String>,
    pub cod_reg: Option<i32>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// Naming block nested in a station entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalitaDto {
    pub nome_lungo: Option<String>,
    pub nome_breve: Option<String>,
}

/// Entry of the segment list (`elencoTratte`).
#[derive(Debug, Clone, Deserialize)]
pub struct SegmentDto {
    #[serde(rename = "nodoA")]
    pub node_a: String,
    #[serde(rename = "nodoB")]
    pub node_b: String,
    #[serde(rename = "trattaAB")]
    pub segment_ab: i64,
    #[serde(rename = "trattaBA")]
    pub segment_ba: i64,
    #[serde(rename = "latitudineA", default)]
    pub lat_a: f64,
    #[serde(rename = "longitudineA", default)]
    pub lon_a: f64,
    #[serde(rename = "latitudineB", default)]
    pub lat_b: f64,
    #[serde(rename = "longitudineB", default)]
    pub lon_b: f64,
    /// Whether a train is on the segment.
    #[serde(rename = "occupata", default)]
    pub busy: bool,
}

/// A train on a segment (`dettagliTratta`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTrainDto {
    pub numero_treno: u32,

    /// Empty or missing for some operators (see `comp_numero_treno`).
    pub categoria: Option<String>,

    /// Formatted number, e.g. `" FR 9516"`.
    #[serde(default)]
    pub comp_numero_treno: String,

    #[serde(default)]
    pub cod_origine: String,
    #[serde(default)]
    pub origine: String,
    #[serde(default)]
    pub cod_destinazione: String,
    #[serde(default)]
    pub destinazione: String,

    pub orario_partenza: Option<i64>,

    /// Scheduled travel time as "HH:MM".
    #[serde(default)]
    pub durata: String,

    pub ritardo: Option<i32>,

    pub ora_ultimo_rilevamento: Option<i64>,

    #[serde(default, deserialize_with = "string_or_number")]
    pub tratta: String,

    #[serde(default)]
    pub regione: i32,

    #[serde(default)]
    pub partito: bool,
    #[serde(default)]
    pub arrivato: bool,
    #[serde(default)]
    pub in_viaggio: bool,
    #[serde(default)]
    pub in_stazione: bool,
    #[serde(default)]
    pub ha_cambi_numero: bool,
}

/// A stop in either itinerary endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FermataDto {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub stazione: String,

    /// "P" at the origin, "A" at the destination, "F" in between.
    #[serde(default)]
    pub tipo_fermata: String,

    /// Progress marker; 1 once the train has called here.
    #[serde(default)]
    pub actual_fermata_type: i32,

    #[serde(rename = "arrivo_teorico")]
    pub arrivo_teorico: Option<i64>,
    #[serde(rename = "partenza_teorica")]
    pub partenza_teorica: Option<i64>,
    pub arrivo_reale: Option<i64>,
    pub partenza_reale: Option<i64>,
    pub ritardo_arrivo: Option<i32>,
    pub ritardo_partenza: Option<i32>,

    pub binario_programmato_arrivo_descrizione: Option<String>,
    pub binario_effettivo_arrivo_descrizione: Option<String>,
    pub binario_programmato_partenza_descrizione: Option<String>,
    pub binario_effettivo_partenza_descrizione: Option<String>,
}

/// Entry of the stop canvas (`tratteCanvas`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasStopDto {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub stazione: String,
    #[serde(default)]
    pub first: bool,
    #[serde(default)]
    pub last: bool,
    #[serde(default)]
    pub stazione_corrente: Option<bool>,
    pub fermata: FermataDto,
}

/// Response of `andamentoTreno`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainProgressDto {
    pub numero_treno: u32,
    pub categoria: Option<String>,
    #[serde(default)]
    pub comp_numero_treno: String,
    #[serde(default)]
    pub origine: String,
    #[serde(default)]
    pub id_origine: String,
    #[serde(default)]
    pub destinazione: String,
    #[serde(default)]
    pub id_destinazione: String,
    pub ritardo: Option<i32>,
    pub ora_ultimo_rilevamento: Option<i64>,
    pub stazione_ultimo_rilevamento: Option<String>,
    #[serde(default)]
    pub fermate: Vec<FermataDto>,
}

/// Accept a JSON string, number or null and keep it as text.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::Text(s)) => s,
        Some(Loose::Int(n)) => n.to_string(),
        Some(Loose::Float(n)) => n.to_string(),
        None => String::new(),
    })
}
