//! Traffic service client.
//!
//! [`TrafficClient`] exposes one async method per library operation. Every
//! method returns `Result<_, UpstreamError>` and logs failures before
//! returning them; callers that prefer an empty list on failure can use
//! [`OrEmpty`](crate::upstream::OrEmpty).

use std::sync::Arc;

use futures::future::try_join_all;
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::aggregate::aggregate_trains;
use crate::config::TrafficConfig;
use crate::domain::{
    Segment, Station, Train, TrainAutocompleteMatch, TrainProgress, TrainStopInfo,
    busy_segments, unique_segments,
};
use crate::upstream::{
    CanvasStopDto, Gateway, HttpGateway, RawTrainDto, SegmentDto, StationDto, TrainProgressDto,
    UpstreamError, convert_canvas_stops, convert_segment, convert_station,
    convert_train_progress, parse_autocomplete, paths,
};

/// Client for the traffic service.
///
/// Holds the injected gateway, the configuration and a semaphore that caps
/// how many per-segment requests the train aggregation runs at once.
#[derive(Debug)]
pub struct TrafficClient<G> {
    gateway: G,
    config: TrafficConfig,
    limiter: Arc<Semaphore>,
}

impl TrafficClient<HttpGateway> {
    /// Create a client talking to the service described by `config`.
    pub fn from_config(config: TrafficConfig) -> Result<Self, UpstreamError> {
        let gateway = HttpGateway::new(&config)?;
        Ok(Self::new(gateway, config))
    }
}

impl<G: Gateway> TrafficClient<G> {
    /// Create a client over an existing gateway.
    pub fn new(gateway: G, config: TrafficConfig) -> Self {
        let limiter = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
        Self {
            gateway,
            config,
            limiter,
        }
    }

    pub fn config(&self) -> &TrafficConfig {
        &self.config
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Fetch the full station catalog.
    pub async fn fetch_stations(&self) -> Result<Vec<Station>, UpstreamError> {
        let result = async {
            let dtos: Vec<StationDto> = self.get_json(&paths::stations()).await?;
            Ok::<_, UpstreamError>(dtos.iter().map(convert_station).collect::<Vec<_>>())
        }
        .await;

        result
            .inspect(|stations| debug!(count = stations.len(), "Fetched station catalog"))
            .inspect_err(|e| warn!(error = %e, "Failed to fetch station catalog"))
    }

    /// Fetch the segment list.
    ///
    /// `busy_only` drops segments not reported as occupied; `unique` then
    /// collapses the remaining records to one per segment id pair. The
    /// order of the two steps matters when a pair has both busy and idle
    /// records.
    pub async fn fetch_segments(
        &self,
        unique: bool,
        busy_only: bool,
    ) -> Result<Vec<Segment>, UpstreamError> {
        let result = async {
            let path = paths::segments(&self.config.categories, paths::cache_buster());
            let dtos: Vec<SegmentDto> = self.get_json(&path).await?;

            let mut segments: Vec<Segment> = dtos.iter().map(convert_segment).collect();
            if busy_only {
                segments = busy_segments(segments);
            }
            if unique {
                segments = unique_segments(segments);
            }
            Ok::<_, UpstreamError>(segments)
        }
        .await;

        result
            .inspect(|segments| {
                debug!(
                    count = segments.len(),
                    unique, busy_only, "Fetched segment list"
                )
            })
            .inspect_err(|e| warn!(error = %e, "Failed to fetch segment list"))
    }

    /// Fetch every train currently on the network.
    ///
    /// Queries each unique segment (busy or not, since the busy flag can be
    /// wrong) with at most `max_concurrent` requests in flight. If any
    /// segment request fails the whole aggregation fails.
    pub async fn fetch_all_trains(&self) -> Result<Vec<Train>, UpstreamError> {
        let result = async {
            let segments = self.fetch_segments(true, false).await?;
            debug!(
                segments = segments.len(),
                max_concurrent = self.config.max_concurrent,
                "Fetching trains per segment"
            );

            let per_segment =
                try_join_all(segments.iter().map(|s| self.fetch_segment_trains(s))).await?;

            Ok::<_, UpstreamError>(aggregate_trains(per_segment)?)
        }
        .await;

        result
            .inspect(|trains| info!(count = trains.len(), "Aggregated trains"))
            .inspect_err(|e| warn!(error = %e, "Failed to aggregate trains"))
    }

    /// Raw train records on one segment.
    ///
    /// The upstream answers `null` for a segment without trains.
    async fn fetch_segment_trains(
        &self,
        segment: &Segment,
    ) -> Result<Vec<RawTrainDto>, UpstreamError> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| UpstreamError::LimiterClosed)?;

        let path = paths::segment_trains(
            &self.config.categories,
            segment.segment_id_ab,
            segment.segment_id_ba,
        );

        let trains: Option<Vec<RawTrainDto>> =
            self.get_json(&path).await.inspect_err(|e| {
                debug!(
                    segment = %segment.unique_key(),
                    error = %e,
                    "Segment request failed"
                )
            })?;

        Ok(trains.unwrap_or_default())
    }

    /// Region id of a station.
    pub async fn region_id_for_station(&self, station_id: &str) -> Result<i32, UpstreamError> {
        let result = async {
            let body = self.gateway.get(&paths::region(station_id)).await?;
            body.trim()
                .parse::<i32>()
                .map_err(|e| UpstreamError::parse(format!("region id: {e}"), &body))
        }
        .await;

        result.inspect_err(|e| warn!(station_id, error = %e, "Failed to look up region"))
    }

    /// Resolve a train number (or free text) to candidate trains.
    ///
    /// No match is an empty list, not an error.
    pub async fn autocomplete(
        &self,
        query: &str,
    ) -> Result<Vec<TrainAutocompleteMatch>, UpstreamError> {
        let result = async {
            let body = self.gateway.get(&paths::autocomplete(query)).await?;
            Ok::<_, UpstreamError>(parse_autocomplete(&body)?)
        }
        .await;

        result
            .inspect(|matches| debug!(query, count = matches.len(), "Autocomplete"))
            .inspect_err(|e| warn!(query, error = %e, "Autocomplete failed"))
    }

    /// Departure station of a train: `station_id` if given, otherwise the
    /// departure station of the `match_index`-th autocomplete match.
    pub async fn resolve_origin(
        &self,
        train_number: u32,
        station_id: Option<&str>,
        match_index: usize,
    ) -> Result<String, UpstreamError> {
        if let Some(id) = station_id {
            return Ok(id.to_string());
        }

        let query = train_number.to_string();
        let matches = self.autocomplete(&query).await?;

        matches
            .into_iter()
            .nth(match_index)
            .map(|m| m.station_id_a)
            .ok_or(UpstreamError::TrainNotFound {
                query,
                index: match_index,
            })
    }

    /// Stops of a train as reported by the stop canvas.
    pub async fn fetch_stop_info(
        &self,
        train_number: u32,
        station_id: Option<&str>,
        match_index: usize,
    ) -> Result<Vec<TrainStopInfo>, UpstreamError> {
        let result = async {
            let origin = self
                .resolve_origin(train_number, station_id, match_index)
                .await?;
            let path = paths::stop_canvas(&origin, train_number, paths::cache_buster());
            let dtos: Vec<CanvasStopDto> = self.get_json(&path).await?;
            Ok::<_, UpstreamError>(convert_canvas_stops(&dtos)?)
        }
        .await;

        result.inspect_err(|e| warn!(train_number, error = %e, "Failed to fetch stop info"))
    }

    /// Full itinerary of a train, with the current stop inferred.
    pub async fn fetch_train_info(
        &self,
        train_number: u32,
        station_id: Option<&str>,
        match_index: usize,
    ) -> Result<TrainProgress, UpstreamError> {
        let result = async {
            let origin = self
                .resolve_origin(train_number, station_id, match_index)
                .await?;
            let path = paths::train_progress(&origin, train_number, paths::cache_buster());
            let dto: TrainProgressDto = self.get_json(&path).await?;
            Ok::<_, UpstreamError>(convert_train_progress(&dto)?)
        }
        .await;

        result.inspect_err(|e| warn!(train_number, error = %e, "Failed to fetch train info"))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, UpstreamError> {
        let body = self.gateway.get(path).await?;
        serde_json::from_str(&body).map_err(|e| UpstreamError::parse(e.to_string(), &body))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::aggregate::raw_train_json;
    use crate::upstream::{MockGateway, OrEmpty};

    const SEGMENTS_PREFIX: &str = "/elencoTratte/0/6/ES*,IC,EXP,EC,EN,REG/null/";

    fn segment_json(ab: i64, ba: i64, busy: bool) -> String {
        format!(
            r#"{{"nodoA": "S{ab:05}", "nodoB": "S{ba:05}", "trattaAB": {ab}, "trattaBA": {ba},
                "latitudineA": 43.6, "longitudineA": 13.5,
                "latitudineB": 43.9, "longitudineB": 12.9, "occupata": {busy}}}"#
        )
    }

    fn segment_trains_path(ab: i64, ba: i64) -> String {
        paths::segment_trains(crate::config::DEFAULT_CATEGORIES, ab, ba)
    }

    fn client(gateway: MockGateway) -> TrafficClient<MockGateway> {
        TrafficClient::new(gateway, TrafficConfig::default())
    }

    fn network_gateway() -> MockGateway {
        let segments = format!(
            "[{}, {}, {}]",
            segment_json(1, 2, true),
            segment_json(3, 4, false),
            segment_json(1, 2, true),
        );

        MockGateway::new()
            .with_prefix_body(SEGMENTS_PREFIX, segments)
            .with_body(
                segment_trains_path(1, 2),
                format!(
                    "[{}, {}]",
                    raw_train_json(9516, 3, false, true),
                    raw_train_json(100, 3, true, true)
                ),
            )
            .with_body(
                segment_trains_path(3, 4),
                format!(
                    "[{}, {}]",
                    raw_train_json(9516, 3, false, true),
                    raw_train_json(9516, 7, false, false)
                ),
            )
    }

    #[tokio::test]
    async fn stations_are_converted() {
        let gateway = MockGateway::new().with_body(
            "/elencoStazioni/0",
            r#"[
                {"codiceStazione": "S07113", "codReg": 11, "nomeCitta": "Ancona",
                 "localita": {"nomeLungo": "ANCONA"}, "lat": 43.6, "lon": 13.5},
                {"codiceStazione": "S07103", "codReg": 11, "nomeCitta": "Pesaro",
                 "localita": {"nomeLungo": "PESARO"}, "lat": 43.9, "lon": 12.9}
            ]"#,
        );

        let stations = client(gateway).fetch_stations().await.unwrap();
        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].station_id, "S07113");
        assert_eq!(stations[1].city, "Pesaro");
    }

    #[tokio::test]
    async fn non_200_is_an_error_and_or_empty_yields_nothing() {
        let gateway = MockGateway::new()
            .with_status("/elencoStazioni/0", 500)
            .with_prefix_status(SEGMENTS_PREFIX, 503);
        let client = client(gateway);

        let stations = client.fetch_stations().await;
        assert!(matches!(stations, Err(UpstreamError::Status { status: 500, .. })));
        assert!(stations.or_empty("stations").is_empty());

        let segments = client.fetch_segments(true, true).await;
        assert!(matches!(segments, Err(UpstreamError::Status { status: 503, .. })));
        assert!(segments.or_empty("segments").is_empty());
    }

    #[tokio::test]
    async fn malformed_json_is_a_parse_error() {
        let gateway = MockGateway::new().with_body("/elencoStazioni/0", "<html>maintenance</html>");

        let result = client(gateway).fetch_stations().await;
        match result {
            Err(UpstreamError::Parse { body: Some(body), .. }) => assert!(body.contains("maintenance")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn segment_request_is_cache_busted() {
        let gateway = network_gateway();
        let client = client(gateway);
        client.fetch_segments(false, false).await.unwrap();

        let requests = client.gateway().requests();
        let timestamp = requests[0].strip_prefix(SEGMENTS_PREFIX).unwrap();
        assert!(timestamp.parse::<i64>().unwrap() > 0);
    }

    #[tokio::test]
    async fn segment_filters() {
        let client = client(network_gateway());

        let all = client.fetch_segments(false, false).await.unwrap();
        assert_eq!(all.len(), 3);

        let unique = client.fetch_segments(true, false).await.unwrap();
        assert_eq!(unique.len(), 2);

        let busy = client.fetch_segments(false, true).await.unwrap();
        assert_eq!(busy.len(), 2);
        assert!(busy.iter().all(|s| s.busy));

        let busy_unique = client.fetch_segments(true, true).await.unwrap();
        assert_eq!(busy_unique.len(), 1);
        assert_eq!(busy_unique[0].segment_id_ab, 1);
    }

    #[tokio::test]
    async fn busy_filter_runs_before_unique() {
        // Same pair reported busy then idle: unique-first would keep the idle
        // record and busy filtering would then drop the pair entirely.
        let segments = format!("[{}, {}]", segment_json(5, 6, true), segment_json(5, 6, false));
        let gateway = MockGateway::new().with_prefix_body(SEGMENTS_PREFIX, segments);

        let result = client(gateway).fetch_segments(true, true).await.unwrap();
        assert_eq!(result.len(), 1);
        assert!(result[0].busy);
    }

    #[tokio::test]
    async fn all_trains_aggregated_and_deduplicated() {
        let client = client(network_gateway());

        let trains = client.fetch_all_trains().await.unwrap();

        let keys: Vec<(u32, i32)> = trains.iter().map(|t| (t.train_number, t.region_id)).collect();
        assert_eq!(keys, vec![(9516, 3), (9516, 7)]);

        // One request per unique segment, idle segments included
        assert_eq!(client.gateway().request_count("/dettagliTratta/"), 2);
    }

    #[tokio::test]
    async fn segment_without_trains_answers_null() {
        let gateway = MockGateway::new()
            .with_prefix_body(SEGMENTS_PREFIX, format!("[{}]", segment_json(1, 2, false)))
            .with_body(segment_trains_path(1, 2), "null");

        let trains = client(gateway).fetch_all_trains().await.unwrap();
        assert!(trains.is_empty());
    }

    #[tokio::test]
    async fn one_failed_segment_fails_aggregation() {
        let gateway = network_gateway().with_status(segment_trains_path(3, 4), 500);

        let result = client(gateway).fetch_all_trains().await;
        assert!(matches!(result, Err(UpstreamError::Status { status: 500, .. })));
    }

    /// Gateway that tracks how many segment requests are in flight.
    struct CountingGateway {
        inner: MockGateway,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl Gateway for CountingGateway {
        async fn get(&self, path: &str) -> Result<String, UpstreamError> {
            if !path.starts_with("/dettagliTratta/") {
                return self.inner.get(path).await;
            }

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            for _ in 0..5 {
                tokio::task::yield_now().await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            self.inner.get(path).await
        }
    }

    #[tokio::test]
    async fn fan_out_is_bounded() {
        let segments: Vec<String> = (0..20).map(|i| segment_json(i * 2, i * 2 + 1, false)).collect();
        let gateway = CountingGateway {
            inner: MockGateway::new()
                .with_prefix_body(SEGMENTS_PREFIX, format!("[{}]", segments.join(",")))
                .with_prefix_body("/dettagliTratta/", "[]"),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        };

        let client = TrafficClient::new(gateway, TrafficConfig::new().with_max_concurrent(3));
        let trains = client.fetch_all_trains().await.unwrap();

        assert!(trains.is_empty());
        let peak = client.gateway().peak.load(Ordering::SeqCst);
        assert!((1..=3).contains(&peak), "peak in-flight requests: {peak}");
    }

    #[tokio::test]
    async fn closed_limiter_fails_aggregation() {
        let client = client(network_gateway());
        client.limiter.close();

        let result = client.fetch_all_trains().await;
        assert!(matches!(result, Err(UpstreamError::LimiterClosed)));
    }

    #[tokio::test]
    async fn region_lookup() {
        let gateway = MockGateway::new()
            .with_body("/regione/S07113", "11\n")
            .with_body("/regione/S00000", "");
        let client = client(gateway);

        assert_eq!(client.region_id_for_station("S07113").await.unwrap(), 11);
        assert!(matches!(
            client.region_id_for_station("S00000").await,
            Err(UpstreamError::Parse { .. })
        ));
        assert!(matches!(
            client.region_id_for_station("S99999").await,
            Err(UpstreamError::Status { status: 404, .. })
        ));
    }

    const AUTOCOMPLETE_3914: &str = "3914 - ANCONA - 03/11/25|3914-S07113-1762124400000\n\
                                     3914 - ROMA TERMINI - 03/11/25|3914-S08409-1762124400000\n";

    #[tokio::test]
    async fn autocomplete_matches() {
        let gateway = MockGateway::new()
            .with_body("/cercaNumeroTrenoTrenoAutocomplete/3914", AUTOCOMPLETE_3914)
            .with_body("/cercaNumeroTrenoTrenoAutocomplete/1", "")
            .with_body("/cercaNumeroTrenoTrenoAutocomplete/2", "garbage");
        let client = client(gateway);

        let matches = client.autocomplete("3914").await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[1].station_id_a, "S08409");

        assert!(client.autocomplete("1").await.unwrap().is_empty());
        assert!(matches!(
            client.autocomplete("2").await,
            Err(UpstreamError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn origin_resolution() {
        let gateway = MockGateway::new()
            .with_body("/cercaNumeroTrenoTrenoAutocomplete/3914", AUTOCOMPLETE_3914);
        let client = client(gateway);

        assert_eq!(
            client.resolve_origin(3914, Some("S01700"), 0).await.unwrap(),
            "S01700"
        );
        assert!(client.gateway().requests().is_empty());

        assert_eq!(client.resolve_origin(3914, None, 0).await.unwrap(), "S07113");
        assert_eq!(client.resolve_origin(3914, None, 1).await.unwrap(), "S08409");
        assert!(matches!(
            client.resolve_origin(3914, None, 2).await,
            Err(UpstreamError::TrainNotFound { index: 2, .. })
        ));
    }

    #[tokio::test]
    async fn stop_info_from_canvas() {
        let canvas = r#"[
            {"id": "S07113", "stazione": "ANCONA", "first": true, "last": false,
             "stazioneCorrente": false,
             "fermata": {"id": "S07113", "stazione": "ANCONA", "tipoFermata": "P",
                         "actualFermataType": 1, "partenza_teorica": 1762124400000,
                         "binarioProgrammatoPartenzaDescrizione": "2",
                         "binarioProgrammatoArrivoDescrizione": "9"}},
            {"id": "S07103", "stazione": "PESARO", "first": false, "last": true,
             "stazioneCorrente": true,
             "fermata": {"id": "S07103", "stazione": "PESARO", "tipoFermata": "A",
                         "actualFermataType": 0, "arrivo_teorico": 1762128300000,
                         "binarioProgrammatoArrivoDescrizione": "1 "}}
        ]"#;
        let gateway = MockGateway::new()
            .with_body("/cercaNumeroTrenoTrenoAutocomplete/3914", AUTOCOMPLETE_3914)
            .with_prefix_body("/tratteCanvas/S07113/3914/", canvas);
        let client = client(gateway);

        let stops = client.fetch_stop_info(3914, None, 0).await.unwrap();
        assert_eq!(stops.len(), 2);
        assert!(stops[0].is_first_stop);
        assert_eq!(stops[0].expected_platform.as_deref(), Some("2"));
        assert!(stops[1].is_last_stop && stops[1].is_current_stop);
        assert_eq!(stops[1].expected_platform.as_deref(), Some("1"));
        assert_eq!(
            stops[1].expected_arrival.map(|t| t.timestamp_millis()),
            Some(1_762_128_300_000)
        );
    }

    #[tokio::test]
    async fn stop_info_for_unknown_train() {
        let gateway = MockGateway::new().with_body("/cercaNumeroTrenoTrenoAutocomplete/1", "");

        let result = client(gateway).fetch_stop_info(1, None, 0).await;
        assert!(matches!(result, Err(UpstreamError::TrainNotFound { .. })));
        assert!(result.or_empty("stops").is_empty());
    }

    #[tokio::test]
    async fn train_info_infers_current_stop() {
        let progress = r#"{
            "numeroTreno": 3914, "categoria": "REG",
            "origine": "ANCONA", "idOrigine": "S07113",
            "destinazione": "PESARO", "idDestinazione": "S07103",
            "ritardo": 3, "oraUltimoRilevamento": 1762125000000,
            "stazioneUltimoRilevamento": "SENIGALLIA",
            "fermate": [
                {"id": "S07113", "stazione": "ANCONA", "tipoFermata": "P", "actualFermataType": 1},
                {"id": "S07110", "stazione": "SENIGALLIA", "tipoFermata": "F", "actualFermataType": 1},
                {"id": "S07103", "stazione": "PESARO", "tipoFermata": "A", "actualFermataType": 0}
            ]
        }"#;
        let gateway = MockGateway::new().with_prefix_body("/andamentoTreno/S07113/3914/", progress);
        let client = client(gateway);

        let info = client.fetch_train_info(3914, Some("S07113"), 0).await.unwrap();
        assert_eq!(info.train_category, "REG");
        assert_eq!(info.delay, 3);
        assert_eq!(info.latest_detection_station.as_deref(), Some("SENIGALLIA"));
        assert_eq!(
            info.current_stop().map(|s| s.name.as_str()),
            Some("SENIGALLIA")
        );
        assert!(info.stops[0].is_first_stop);
        assert!(info.stops[2].is_last_stop);
    }

    #[tokio::test]
    async fn train_info_errors_surface() {
        let gateway = MockGateway::new().with_prefix_status("/andamentoTreno/", 204);

        let result = client(gateway).fetch_train_info(3914, Some("S07113"), 0).await;
        assert!(matches!(result, Err(UpstreamError::Status { status: 204, .. })));
    }
}
