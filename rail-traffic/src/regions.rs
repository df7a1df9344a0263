//! Caching layer for region lookups.
//!
//! A station's region never changes, but each lookup is a network round trip.
//! Successful lookups are cached; failures are not, so a transient upstream
//! error is retried on the next call.

use std::time::Duration;

use moka::future::Cache as MokaCache;
use tracing::trace;

use crate::client::TrafficClient;
use crate::upstream::{Gateway, UpstreamError};

/// Configuration for the region cache.
#[derive(Debug, Clone)]
pub struct RegionCacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached stations.
    pub max_capacity: u64,
}

impl Default for RegionCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(24 * 60 * 60),
            // Comfortably above the size of the station catalog
            max_capacity: 5000,
        }
    }
}

/// Traffic client with cached region lookups.
///
/// Wraps a [`TrafficClient`]; every other operation is reached through
/// [`client`](Self::client).
pub struct RegionCache<G> {
    client: TrafficClient<G>,
    regions: MokaCache<String, i32>,
}

impl<G: Gateway> RegionCache<G> {
    /// Create a new cached client.
    pub fn new(client: TrafficClient<G>, config: &RegionCacheConfig) -> Self {
        let regions = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { client, regions }
    }

    /// Region id of a station, from cache if available.
    pub async fn region_id_for_station(&self, station_id: &str) -> Result<i32, UpstreamError> {
        if let Some(region) = self.regions.get(station_id).await {
            trace!(station_id, region, "Region cache hit");
            return Ok(region);
        }

        let region = self.client.region_id_for_station(station_id).await?;
        self.regions.insert(station_id.to_string(), region).await;

        Ok(region)
    }

    /// Access the underlying client.
    pub fn client(&self) -> &TrafficClient<G> {
        &self.client
    }

    /// Number of cached stations (approximate, for monitoring).
    pub fn entry_count(&self) -> u64 {
        self.regions.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_all(&self) {
        self.regions.invalidate_all();
    }
}
