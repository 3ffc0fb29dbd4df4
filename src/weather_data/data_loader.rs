use crate::agforecast::LatLon;
use crate::config::WeatherApiConfig;
use crate::types::observation::Observation;
use crate::weather_data::chunks::TimeChunk;
use crate::weather_data::error::WeatherDataError;
use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

/// Anything that can return hourly observations for one point and one time chunk.
///
/// [`crate::ChunkedFetcher`] calls this once per chunk; an `Err` only drops that chunk.
#[allow(async_fn_in_trait)]
pub trait HourlyWeatherSource {
    async fn fetch_hourly(
        &self,
        location: LatLon,
        chunk: TimeChunk,
    ) -> Result<Vec<Observation>, WeatherDataError>;
}

/// Loads hourly history from the weather.com History-on-Demand API.
pub struct IbmWeatherLoader {
    config: WeatherApiConfig,
    client: Client,
}

impl IbmWeatherLoader {
    pub fn new(config: WeatherApiConfig) -> Result<Self, WeatherDataError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(WeatherDataError::ClientBuild)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &WeatherApiConfig {
        &self.config
    }
}

impl HourlyWeatherSource for IbmWeatherLoader {
    async fn fetch_hourly(
        &self,
        location: LatLon,
        chunk: TimeChunk,
    ) -> Result<Vec<Observation>, WeatherDataError> {
        // The request URL carries the API key, so errors only name the endpoint and window.
        let target = format!(
            "{} ({}, {} from {} to {})",
            self.config.base_url, location.0, location.1, chunk.start, chunk.end
        );
        let geocode = format!("{},{}", location.0, location.1);
        let start = chunk.start.to_rfc3339_opts(SecondsFormat::Secs, true);
        let end = chunk.end.to_rfc3339_opts(SecondsFormat::Secs, true);
        debug!("Requesting hourly weather for {}", target);

        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[
                ("format", "json"),
                ("geocode", geocode.as_str()),
                ("startDateTime", start.as_str()),
                ("endDateTime", end.as_str()),
                ("units", "m"),
                ("apiKey", self.config.api_key()),
            ])
            .send()
            .await
            .map_err(|e| WeatherDataError::NetworkRequest(target.clone(), e.without_url()))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {}", target, e.status().unwrap_or_default());
                return Err(if let Some(status) = e.status() {
                    WeatherDataError::HttpStatus {
                        url: target,
                        status,
                        source: e.without_url(),
                    }
                } else {
                    WeatherDataError::NetworkRequest(target, e.without_url())
                });
            }
        };

        if response.status() == StatusCode::NO_CONTENT {
            debug!("No observations available for {}", target);
            return Ok(Vec::new());
        }

        let payload: HourlyPayload =
            response
                .json()
                .await
                .map_err(|e| WeatherDataError::PayloadDecode {
                    url: target.clone(),
                    source: e.without_url(),
                })?;
        let observations = payload.into_observations();
        debug!("Received {} observations for {}", observations.len(), target);
        Ok(observations)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ValidTime {
    Epoch(i64),
    Text(String),
}

impl ValidTime {
    fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            ValidTime::Epoch(seconds) => DateTime::from_timestamp(*seconds, 0),
            ValidTime::Text(text) => DateTime::parse_from_rfc3339(text)
                .or_else(|_| DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%z"))
                .map(|dt| dt.with_timezone(&Utc))
                .ok(),
        }
    }
}

/// The API answers column-wise: one array per variable, aligned by index.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HourlyPayload {
    #[serde(default)]
    valid_time_utc: Vec<ValidTime>,
    #[serde(default)]
    temperature: Vec<Option<f64>>,
    #[serde(default)]
    temperature_dew_point: Vec<Option<f64>>,
    #[serde(default)]
    relative_humidity: Vec<Option<f64>>,
    #[serde(default)]
    precip1_hour: Vec<Option<f64>>,
    #[serde(default)]
    wind_speed: Vec<Option<f64>>,
}

impl HourlyPayload {
    fn into_observations(self) -> Vec<Observation> {
        fn value(column: &[Option<f64>], idx: usize) -> Option<f64> {
            column.get(idx).copied().flatten()
        }

        self.valid_time_utc
            .iter()
            .enumerate()
            .filter_map(|(idx, valid_time)| {
                let Some(valid_time) = valid_time.to_utc() else {
                    warn!("Dropping observation {} with unreadable timestamp {:?}", idx, valid_time);
                    return None;
                };
                Some(Observation {
                    valid_time,
                    temperature: value(&self.temperature, idx),
                    dew_point: value(&self.temperature_dew_point, idx),
                    relative_humidity: value(&self.relative_humidity, idx),
                    precipitation: value(&self.precip1_hour, idx),
                    wind_speed: value(&self.wind_speed, idx),
                })
            })
            .collect()
    }
}
