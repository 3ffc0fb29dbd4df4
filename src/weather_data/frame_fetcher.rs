use crate::agforecast::LatLon;
use crate::types::observation::Observation;
use crate::weather_data::chunks::{chunk_range, TimeChunk};
use crate::weather_data::data_loader::HourlyWeatherSource;
use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, warn};

/// Longest span the hourly API accepts in a single request.
pub const MAX_CHUNK_HOURS: i64 = 999;

/// Observations for a whole interval, plus how many chunks went missing on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchedObservations {
    /// Concatenated in chunk order.
    pub observations: Vec<Observation>,
    pub chunks_requested: usize,
    pub chunks_failed: usize,
}

impl FetchedObservations {
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Splits an interval into API-sized chunks and fetches them one after another.
///
/// A chunk that fails is logged and skipped, the rest of the interval is still returned.
pub struct ChunkedFetcher<S> {
    source: S,
    max_span: TimeDelta,
}

impl<S: HourlyWeatherSource> ChunkedFetcher<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            max_span: TimeDelta::hours(MAX_CHUNK_HOURS),
        }
    }

    pub fn with_max_span(mut self, max_span: TimeDelta) -> Self {
        self.max_span = max_span;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn fetch(
        &self,
        location: LatLon,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> FetchedObservations {
        let chunks = chunk_range(start, end, self.max_span);
        let mut fetched = FetchedObservations {
            chunks_requested: chunks.len(),
            ..Default::default()
        };

        for chunk in chunks {
            match self.fetch_chunk(location, chunk).await {
                Some(mut observations) => fetched.observations.append(&mut observations),
                None => fetched.chunks_failed += 1,
            }
        }

        debug!(
            "Fetched {} observations for ({}, {}) in {} chunks ({} failed)",
            fetched.observations.len(),
            location.0,
            location.1,
            fetched.chunks_requested,
            fetched.chunks_failed
        );
        fetched
    }

    async fn fetch_chunk(&self, location: LatLon, chunk: TimeChunk) -> Option<Vec<Observation>> {
        match self.source.fetch_hourly(location, chunk).await {
            Ok(observations) => Some(observations),
            Err(e) => {
                warn!(
                    "Skipping chunk {} to {} for ({}, {}): {}",
                    chunk.start, chunk.end, location.0, location.1, e
                );
                None
            }
        }
    }
}
