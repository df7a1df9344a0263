//! Domain records for the rail traffic client.
//!
//! Every record here is an immutable snapshot value produced by one fetch.
//! Nothing is updated in place; callers compare snapshots to detect change.

mod keyed;
mod segment;
mod station;
mod stop;
mod train;

pub use keyed::dedup_last_wins;
pub use segment::{Segment, UniqueSegmentKey, busy_segments, unique_segments};
pub use station::{Location, Station};
pub use stop::{TrainProgress, TrainStopInfo};
pub use train::{Train, TrainAutocompleteMatch, TrainKey, dedup_trains};
