//! Access to the ViaggiaTreno traffic service.
//!
//! This module covers the transport boundary and the wire formats:
//! - [`Gateway`] is the injected HTTP capability, with a `reqwest`
//!   implementation and an in-memory mock
//! - `types` holds the raw JSON DTOs, `convert` turns them into domain
//!   records and hosts the heuristics for upstream quirks
//! - the train-number autocomplete endpoint speaks a line-oriented text
//!   format with its own parser
//!
//! Quirks worth knowing about:
//! - timestamps are epoch milliseconds, with `0` meaning "not reported"
//! - some endpoints are cached aggressively upstream; their paths carry a
//!   timestamp to defeat that
//! - only HTTP 200 counts as success

mod autocomplete;
mod convert;
mod error;
mod gateway;
mod mock;
pub mod paths;
mod types;

pub use autocomplete::{parse_autocomplete, parse_line as parse_autocomplete_line};
pub use convert::{
    ConversionError, REACHED_STOP_MARKER, convert_canvas_stops, convert_segment, convert_station,
    convert_train, convert_train_progress, infer_category, is_current_stop,
    parse_duration_minutes, select_platforms,
};
pub use error::{OrEmpty, UpstreamError};
pub use gateway::{Gateway, HttpGateway};
pub use mock::MockGateway;
pub use types::{
    CanvasStopDto, FermataDto, LocalitaDto, RawTrainDto, SegmentDto, StationDto,
    TrainProgressDto,
};
