//! This module provides the main entry point: fetch hourly weather for a point or a grid of
//! points and turn it into daily disease risk.

use crate::config::WeatherApiConfig;
use crate::error::AgForecastError;
use crate::grid::{generate_grid, BoundingBox, GridResult};
use crate::risk::composer::RiskComposer;
use crate::types::daily_summary::{EnrichedDailySummary, MovingAverage, DEFAULT_MOVING_AVERAGES};
use crate::types::frequency_frames::daily_frame::DailyLazyFrame;
use crate::types::frequency_frames::hourly_frame::HourlyLazyFrame;
use crate::types::observation::{normalize, NormalizedObservation, Observation};
use crate::types::risk_record::RiskRecord;
use crate::weather_data::data_loader::{HourlyWeatherSource, IbmWeatherLoader};
use crate::weather_data::error::WeatherDataError;
use crate::weather_data::frame_fetcher::ChunkedFetcher;
use bon::bon;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use chrono_tz::Tz;
use futures_util::{stream, StreamExt};
use log::{info, warn};
use serde::Serialize;

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// # Examples
///
/// ```
/// use agforecast::LatLon;
///
/// let madison = LatLon(43.07, -89.40);
/// assert_eq!(madison.0, 43.07); // Latitude
/// assert_eq!(madison.1, -89.40); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLon(pub f64, pub f64);

/// Local timezone used for daily bucketing unless another one is set.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::US::Central;
/// Days of hourly history fetched before the end date.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 36;

/// Everything computed for one point.
#[derive(Debug, Clone, PartialEq)]
pub struct PointWeather {
    pub location: LatLon,
    /// Normalized hourly observations, ordered by instant.
    pub hourly: Vec<NormalizedObservation>,
    pub daily: Vec<EnrichedDailySummary>,
    /// One record per daily row, keyed by forecasting date.
    pub risks: Vec<RiskRecord>,
}

impl PointWeather {
    pub fn hourly_frame(&self) -> Result<HourlyLazyFrame, WeatherDataError> {
        HourlyLazyFrame::from_normalized(&self.hourly)
    }
}

/// How a point pipeline run ended.
#[derive(Debug)]
pub enum PointOutcome {
    Risk(PointWeather),
    /// Every chunk came back empty or failed.
    NoData,
    Failed(AgForecastError),
}

impl PointOutcome {
    pub fn weather(&self) -> Option<&PointWeather> {
        match self {
            PointOutcome::Risk(weather) => Some(weather),
            _ => None,
        }
    }

    pub fn into_weather(self) -> Option<PointWeather> {
        match self {
            PointOutcome::Risk(weather) => Some(weather),
            _ => None,
        }
    }
}

/// The main client: hourly weather in, daily disease risk out.
///
/// `S` is where hourly observations come from, the weather.com History-on-Demand API by default.
pub struct AgForecast<S = IbmWeatherLoader> {
    fetcher: ChunkedFetcher<S>,
    timezone: Tz,
    lookback_days: i64,
    moving_averages: Vec<MovingAverage>,
    composer: RiskComposer,
}

impl AgForecast<IbmWeatherLoader> {
    /// Creates a client for the hourly weather API described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`AgForecastError::WeatherData`] if the HTTP client can't be built.
    pub fn new(config: WeatherApiConfig) -> Result<Self, AgForecastError> {
        Ok(Self::with_source(IbmWeatherLoader::new(config)?))
    }

    /// Creates a client configured from the process environment, see [`WeatherApiConfig::from_env`].
    ///
    /// # Errors
    ///
    /// Returns [`AgForecastError::Config`] if the API key is missing, before any request is made.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use agforecast::{AgForecast, AgForecastError};
    /// # fn run() -> Result<(), AgForecastError> {
    /// let client = AgForecast::from_env()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_env() -> Result<Self, AgForecastError> {
        Self::new(WeatherApiConfig::from_env()?)
    }
}

#[bon]
impl<S: HourlyWeatherSource> AgForecast<S> {
    pub fn with_source(source: S) -> Self {
        Self {
            fetcher: ChunkedFetcher::new(source),
            timezone: DEFAULT_TIMEZONE,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            moving_averages: DEFAULT_MOVING_AVERAGES.to_vec(),
            composer: RiskComposer::standard(),
        }
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_lookback_days(mut self, lookback_days: i64) -> Self {
        self.lookback_days = lookback_days;
        self
    }

    pub fn with_moving_averages(mut self, moving_averages: Vec<MovingAverage>) -> Self {
        self.moving_averages = moving_averages;
        self
    }

    pub fn with_composer(mut self, composer: RiskComposer) -> Self {
        self.composer = composer;
        self
    }

    /// Longest span requested from the source at once.
    pub fn with_max_chunk_span(mut self, max_span: TimeDelta) -> Self {
        self.fetcher = self.fetcher.with_max_span(max_span);
        self
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn lookback_days(&self) -> i64 {
        self.lookback_days
    }

    /// The `[start, end)` interval fetched for `end_date`: midnight UTC of `end_date`
    /// back by the lookback period.
    pub fn fetch_window(&self, end_date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let end = end_date.and_time(NaiveTime::MIN).and_utc();
        (end - TimeDelta::days(self.lookback_days), end)
    }

    /// Fetches hourly observations for `location` over `[start, end)`.
    ///
    /// Chunks that fail are left out; an interval without any data gives an empty frame.
    #[builder]
    pub async fn hourly(
        &self,
        location: LatLon,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<HourlyLazyFrame, AgForecastError> {
        let fetched = self.fetcher.fetch(location, start, end).await;
        Ok(HourlyLazyFrame::from_observations(
            fetched.observations,
            self.timezone,
        )?)
    }

    /// Runs the whole pipeline for one point: fetch, normalize, aggregate, enrich and score.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use agforecast::{AgForecast, LatLon, PointOutcome};
    /// use chrono::NaiveDate;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = AgForecast::from_env()?;
    /// let outcome = client
    ///     .point_risk()
    ///     .location(LatLon(43.07, -89.40))
    ///     .end_date(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap())
    ///     .call()
    ///     .await;
    ///
    /// match outcome {
    ///     PointOutcome::Risk(weather) => println!("{} days scored", weather.risks.len()),
    ///     PointOutcome::NoData => println!("No weather available"),
    ///     PointOutcome::Failed(e) => eprintln!("Failed: {e}"),
    /// }
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn point_risk(&self, location: LatLon, end_date: NaiveDate) -> PointOutcome {
        let (start, end) = self.fetch_window(end_date);
        info!(
            "Fetching weather for point ({}, {}) from {} to {}",
            location.0, location.1, start, end
        );

        let fetched = self.fetcher.fetch(location, start, end).await;
        if fetched.is_empty() {
            return PointOutcome::NoData;
        }

        match self.process_observations(location, fetched.observations) {
            Ok(weather) => PointOutcome::Risk(weather),
            Err(e) => PointOutcome::Failed(e),
        }
    }

    /// Runs [`Self::point_risk`] for every point of the lattice over `bbox`.
    ///
    /// Points without data or with a failed pipeline are logged and left out of the result.
    /// Up to `concurrency` points (default 1) are in flight at once; the result keeps lattice
    /// order either way.
    ///
    /// # Errors
    ///
    /// Returns [`AgForecastError::Grid`] if the resolution isn't positive. Per-point
    /// failures never fail the grid.
    #[builder]
    pub async fn grid_risk(
        &self,
        bbox: BoundingBox,
        resolution: f64,
        end_date: NaiveDate,
        concurrency: Option<usize>,
    ) -> Result<GridResult, AgForecastError> {
        let points = generate_grid(&bbox, resolution)?;
        let concurrency = concurrency.unwrap_or(1).max(1);
        info!(
            "Computing risk for {} grid points ending {} ({} at a time)",
            points.len(),
            end_date,
            concurrency
        );

        let outcomes: Vec<(LatLon, PointOutcome)> = stream::iter(points)
            .map(|location| async move {
                let outcome = self
                    .point_risk()
                    .location(location)
                    .end_date(end_date)
                    .call()
                    .await;
                (location, outcome)
            })
            .buffered(concurrency)
            .collect()
            .await;

        let mut result = GridResult::default();
        for (location, outcome) in outcomes {
            match outcome {
                PointOutcome::Risk(weather) => result.push(location, weather.risks),
                PointOutcome::NoData => {
                    warn!("No data for point ({}, {}), skipping", location.0, location.1)
                }
                PointOutcome::Failed(e) => {
                    warn!("Point ({}, {}) failed: {}", location.0, location.1, e)
                }
            }
        }
        Ok(result)
    }

    /// The offline part of the pipeline, for observations already fetched.
    pub fn process_observations(
        &self,
        location: LatLon,
        observations: Vec<Observation>,
    ) -> Result<PointWeather, AgForecastError> {
        let hourly = normalize(observations, self.timezone);
        let daily = DailyLazyFrame::from_hourly(&HourlyLazyFrame::from_normalized(&hourly)?)
            .with_moving_averages(&self.moving_averages)
            .collect_enriched()?;
        let risks = self.composer.compose(&daily);

        Ok(PointWeather {
            location,
            hourly,
            daily,
            risks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::models::{GRAY_LEAF_SPOT_RISK, TARSPOT_RISK};
    use crate::weather_data::chunks::TimeChunk;
    use chrono::Timelike;

    /// Synthetic hourly weather: a daily temperature cycle with humid nights.
    struct FakeSource {
        failing: Vec<LatLon>,
        empty: Vec<LatLon>,
    }

    impl FakeSource {
        fn healthy() -> Self {
            Self {
                failing: Vec::new(),
                empty: Vec::new(),
            }
        }
    }

    impl HourlyWeatherSource for FakeSource {
        async fn fetch_hourly(
            &self,
            location: LatLon,
            chunk: TimeChunk,
        ) -> Result<Vec<Observation>, WeatherDataError> {
            if self.failing.contains(&location) {
                return Err(WeatherDataError::UnexpectedData("simulated outage".to_string()));
            }
            if self.empty.contains(&location) {
                return Ok(Vec::new());
            }
            Ok((0..chunk.duration().num_hours())
                .map(|h| {
                    let valid_time = chunk.start + TimeDelta::hours(h);
                    let hour = valid_time.hour() as f64;
                    let humid = !(12..=23).contains(&valid_time.hour());
                    Observation {
                        valid_time,
                        temperature: Some(18.0 + hour / 4.0 + location.0 / 100.0),
                        dew_point: Some(14.0 + hour / 8.0),
                        relative_humidity: Some(if humid { 94.0 } else { 70.0 }),
                        precipitation: Some(0.0),
                        wind_speed: Some(8.0 + location.1.abs() / 100.0),
                    }
                })
                .collect())
        }
    }

    fn july(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, day).unwrap()
    }

    #[tokio::test]
    async fn test_point_risk_runs_whole_pipeline() {
        let client = AgForecast::with_source(FakeSource::healthy());
        let outcome = client
            .point_risk()
            .location(LatLon(43.0, -89.5))
            .end_date(july(15))
            .call()
            .await;

        let weather = outcome.into_weather().expect("point should have data");
        assert_eq!(weather.hourly.len(), 36 * 24);
        // The first UTC midnight is the previous evening in Chicago.
        assert_eq!(weather.daily.len(), 37);
        assert_eq!(weather.risks.len(), weather.daily.len());
        assert_eq!(weather.risks.last().unwrap().forecasting_date, july(15));

        for (day, record) in weather.daily.iter().zip(&weather.risks) {
            assert_eq!(record.forecasting_date, day.summary.date.succ_opt().unwrap());
        }
        let last = weather.risks.last().unwrap();
        assert!(last.score(TARSPOT_RISK).is_some());
        assert!(last.score(GRAY_LEAF_SPOT_RISK).is_some());

        let hourly = weather.hourly_frame().unwrap().frame.collect().unwrap();
        assert_eq!(hourly.height(), 36 * 24);
    }

    #[tokio::test]
    async fn test_point_without_data() {
        let location = LatLon(43.0, -89.5);
        let client = AgForecast::with_source(FakeSource {
            failing: Vec::new(),
            empty: vec![location],
        });
        let outcome = client.point_risk().location(location).end_date(july(15)).call().await;
        assert!(matches!(outcome, PointOutcome::NoData));

        let client = AgForecast::with_source(FakeSource {
            failing: vec![location],
            empty: Vec::new(),
        });
        let outcome = client.point_risk().location(location).end_date(july(15)).call().await;
        assert!(matches!(outcome, PointOutcome::NoData));
    }

    #[tokio::test]
    async fn test_fetch_window_and_chunking() {
        let client = AgForecast::with_source(FakeSource::healthy())
            .with_lookback_days(10)
            .with_max_chunk_span(TimeDelta::hours(48));
        let (start, end) = client.fetch_window(july(15));
        assert_eq!(end, july(15).and_time(NaiveTime::MIN).and_utc());
        assert_eq!(end - start, TimeDelta::days(10));

        let hourly = client
            .hourly()
            .location(LatLon(43.0, -89.5))
            .start(start)
            .end(end)
            .call()
            .await
            .unwrap()
            .frame
            .collect()
            .unwrap();
        assert_eq!(hourly.height(), 240);
    }

    #[tokio::test]
    async fn test_grid_isolates_failing_points() {
        let failing = LatLon(43.5, -89.5);
        let empty = LatLon(44.0, -90.0);
        let bbox = BoundingBox::new(43.0, -90.0, 44.0, -89.0).unwrap();

        let client = AgForecast::with_source(FakeSource {
            failing: vec![failing],
            empty: vec![empty],
        });
        let result = client
            .grid_risk()
            .bbox(bbox)
            .resolution(0.5)
            .end_date(july(15))
            .call()
            .await
            .unwrap();

        assert_eq!(result.len(), 7);
        assert!(result.get(failing).is_none());
        assert!(result.get(empty).is_none());
        let order: Vec<LatLon> = result.locations().collect();
        assert_eq!(order[0], LatLon(43.0, -90.0));
        assert_eq!(order[6], LatLon(44.0, -89.0));

        // Surviving points match a standalone run against a healthy source.
        let healthy = AgForecast::with_source(FakeSource::healthy());
        for point in &result.points {
            let alone = healthy
                .point_risk()
                .location(point.location)
                .end_date(july(15))
                .call()
                .await
                .into_weather()
                .unwrap();
            assert_eq!(point.records, alone.risks);
        }
    }

    #[tokio::test]
    async fn test_concurrent_grid_keeps_lattice_order() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0).unwrap();
        let client = AgForecast::with_source(FakeSource::healthy()).with_lookback_days(3);

        let sequential = client
            .grid_risk()
            .bbox(bbox)
            .resolution(0.5)
            .end_date(july(15))
            .call()
            .await
            .unwrap();
        let concurrent = client
            .grid_risk()
            .bbox(bbox)
            .resolution(0.5)
            .end_date(july(15))
            .concurrency(4)
            .call()
            .await
            .unwrap();

        assert_eq!(sequential.len(), 9);
        assert_eq!(sequential, concurrent);
    }

    #[tokio::test]
    async fn test_invalid_resolution_is_an_error() {
        let client = AgForecast::with_source(FakeSource::healthy());
        let result = client
            .grid_risk()
            .bbox(BoundingBox::new(0.0, 0.0, 1.0, 1.0).unwrap())
            .resolution(0.0)
            .end_date(july(15))
            .call()
            .await;
        assert!(matches!(result, Err(AgForecastError::Grid(_))));
    }
}
