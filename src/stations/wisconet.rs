//! Client for the Wisconet environmental sensor network.

use crate::stations::error::WisconetError;
use crate::types::station::{BulkMeasures, Field, RawStation, Station};
use bon::bon;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use log::{debug, info, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const WISCONET_BASE_URL: &str = "https://wisconet.wisc.edu/api/v1";

/// Timezone in which bulk query dates are interpreted when none is given.
pub const DEFAULT_MEASURES_TIMEZONE: Tz = chrono_tz::US::Eastern;
const DEFAULT_BULK_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_FULL_HISTORY_TIMEOUT: Duration = Duration::from_secs(60);

pub struct WisconetClient {
    base_url: String,
    client: Client,
}

#[bon]
impl WisconetClient {
    pub fn new() -> Result<Self, WisconetError> {
        Self::with_base_url(WISCONET_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, WisconetError> {
        let client = Client::builder()
            .build()
            .map_err(WisconetError::ClientBuild)?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Lists stations that have been reporting for more than `min_days_active` days.
    ///
    /// `days_active` is counted from each station's earliest API date to `as_of`
    /// (defaults to now). `min_days_active` defaults to 0.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use agforecast::WisconetClient;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = WisconetClient::new()?;
    /// let stations = client.all_stations().min_days_active(365).call().await?;
    /// for station in &stations {
    ///     println!("{} has {} days of data", station.station_id, station.days_active);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn all_stations(
        &self,
        min_days_active: Option<i64>,
        as_of: Option<DateTime<Utc>>,
    ) -> Result<Vec<Station>, WisconetError> {
        let min_days_active = min_days_active.unwrap_or(0);
        let as_of = as_of.unwrap_or_else(Utc::now);

        let raw: Vec<RawStation> = self.get_json("/stations/", &[], None).await?;
        let total = raw.len();
        let mut stations = Vec::new();
        for station in raw {
            let station = station.into_station(as_of)?;
            if station.days_active > min_days_active {
                stations.push(station);
            }
        }
        info!(
            "{} of {} Wisconet stations active for more than {} days",
            stations.len(),
            total,
            min_days_active
        );
        Ok(stations)
    }

    /// The fields `station_id` reports.
    pub async fn station_fields(&self, station_id: &str) -> Result<Vec<Field>, WisconetError> {
        let route = format!("/fields/{station_id}/available_fields");
        self.get_json(&route, &[], None).await
    }

    /// Measures of `station_id` between two dates.
    ///
    /// `start` and `end` are taken as midnight in `timezone` (default US/Eastern).
    /// `fields` narrows the response to those standard names; all fields otherwise.
    #[builder]
    pub async fn bulk_measures(
        &self,
        station_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        fields: Option<Vec<String>>,
        timezone: Option<Tz>,
        timeout: Option<Duration>,
    ) -> Result<BulkMeasures, WisconetError> {
        let timezone = timezone.unwrap_or(DEFAULT_MEASURES_TIMEZONE);
        let start_time = local_midnight(start, timezone)?;
        let end_time = local_midnight(end, timezone)?;
        debug!(
            "Bulk measures for {} from {} to {}",
            station_id, start_time, end_time
        );

        let mut query = vec![
            ("start_time", start_time.timestamp().to_string()),
            ("end_time", end_time.timestamp().to_string()),
        ];
        if let Some(fields) = fields.filter(|fields| !fields.is_empty()) {
            query.push(("fields", fields.join(",")));
        }

        let route = format!("/stations/{station_id}/measures");
        let measures: BulkMeasures = self
            .get_json(&route, &query, Some(timeout.unwrap_or(DEFAULT_BULK_TIMEOUT)))
            .await?;
        if measures.is_empty() {
            warn!("No measures returned for {} between {} and {}", station_id, start, end);
        }
        Ok(measures)
    }

    /// Every measure `station` has reported, from its earliest API date until `until`
    /// (defaults to today).
    #[builder]
    pub async fn all_data_for_station(
        &self,
        station: &Station,
        fields: Option<Vec<String>>,
        until: Option<NaiveDate>,
        timeout: Option<Duration>,
    ) -> Result<BulkMeasures, WisconetError> {
        self.bulk_measures()
            .station_id(&station.station_id)
            .start(station.earliest_api_date.date_naive())
            .end(until.unwrap_or_else(|| Utc::now().date_naive()))
            .maybe_fields(fields)
            .timeout(timeout.unwrap_or(DEFAULT_FULL_HISTORY_TIMEOUT))
            .call()
            .await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        route: &str,
        query: &[(&str, String)],
        timeout: Option<Duration>,
    ) -> Result<T, WisconetError> {
        let url = format!("{}{}", self.base_url, route);
        let mut request = self.client.get(&url).query(query);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| WisconetError::NetworkRequest(url.clone(), e))?;
        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                return Err(if let Some(status) = e.status() {
                    WisconetError::HttpStatus {
                        url,
                        status,
                        source: e,
                    }
                } else {
                    WisconetError::NetworkRequest(url, e)
                });
            }
        };

        let bytes = response
            .bytes()
            .await
            .map_err(|e| WisconetError::NetworkRequest(url.clone(), e))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Midnight of `date` in `timezone`, as an instant. The earlier instant wins when midnight is ambiguous.
fn local_midnight(date: NaiveDate, timezone: Tz) -> Result<DateTime<Utc>, WisconetError> {
    let naive = date.and_time(NaiveTime::MIN);
    timezone
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| WisconetError::NonexistentLocalTime(naive, timezone.name().to_string()))
}
