//! Client-side aggregation over the ViaggiaTreno railway traffic service.
//!
//! Fetches stations, track segments and live trains, normalizes the
//! upstream's loosely-typed records and de-duplicates what it reports more
//! than once. The centrepiece is [`TrafficClient::fetch_all_trains`], which
//! fans out one request per unique segment and merges the results.
//!
//! Storing the snapshots is left to callers.
//!
//! [`TrafficClient::fetch_all_trains`]: client::TrafficClient::fetch_all_trains

pub mod aggregate;
pub mod client;
pub mod config;
pub mod domain;
pub mod regions;
pub mod upstream;
