//! Records returned by the Wisconet station network API.
//!
//! Each record has a fixed set of known fields; anything else the API sends is kept in `extra`.

use crate::agforecast::LatLon;
use crate::stations::error::WisconetError;
use crate::utils::f64_from_number_or_string;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use polars::prelude::{col, DataType, IntoLazy, LazyFrame, SortMultipleOptions, TimeUnit};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Format of `earliest_api_date` in the stations listing.
pub const EARLIEST_API_DATE_FORMAT: &str = "%m/%d/%Y";

/// A Wisconet weather station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Station {
    /// Short identifier, e.g. "ALTN".
    pub station_id: String,
    pub station_name: Option<String>,
    /// IANA timezone name of the station.
    pub station_timezone: String,
    /// Midnight UTC of the first day the API has data for.
    pub earliest_api_date: DateTime<Utc>,
    /// Whole days between `earliest_api_date` and the reference time of the query.
    pub days_active: i64,
    pub elevation: f64,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Station {
    pub fn location(&self) -> LatLon {
        LatLon(self.latitude, self.longitude)
    }

    /// `None` if the station reports a zone chrono-tz doesn't know.
    pub fn timezone(&self) -> Option<Tz> {
        self.station_timezone.parse().ok()
    }
}

/// Station as it comes over the wire.
#[derive(Debug, Deserialize)]
pub(crate) struct RawStation {
    station_id: String,
    #[serde(default)]
    station_name: Option<String>,
    station_timezone: String,
    earliest_api_date: String,
    #[serde(deserialize_with = "f64_from_number_or_string")]
    elevation: f64,
    #[serde(deserialize_with = "f64_from_number_or_string")]
    latitude: f64,
    #[serde(deserialize_with = "f64_from_number_or_string")]
    longitude: f64,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl RawStation {
    pub(crate) fn into_station(self, as_of: DateTime<Utc>) -> Result<Station, WisconetError> {
        let earliest_api_date =
            NaiveDate::parse_from_str(&self.earliest_api_date, EARLIEST_API_DATE_FORMAT)
                .map_err(|source| WisconetError::InvalidDate {
                    field: "earliest_api_date",
                    value: self.earliest_api_date.clone(),
                    source,
                })?
                .and_time(NaiveTime::MIN)
                .and_utc();

        Ok(Station {
            station_id: self.station_id,
            station_name: self.station_name,
            station_timezone: self.station_timezone,
            earliest_api_date,
            days_active: (as_of - earliest_api_date).num_days(),
            elevation: self.elevation,
            latitude: self.latitude,
            longitude: self.longitude,
            extra: self.extra,
        })
    }
}

/// A measurement a station can report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Name used to request the field in bulk queries, e.g. "60min_air_temp_f_avg".
    pub standard_name: String,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub collection_frequency: Option<String>,
    #[serde(default)]
    pub measure_type: Option<String>,
    #[serde(default)]
    pub qualifier: Option<String>,
    #[serde(default)]
    pub units_abbrev: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// All measures reported at one collection time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureRow {
    /// Unix seconds.
    pub collection_time: i64,
    /// `(field id, value)` pairs.
    #[serde(default)]
    pub measures: Vec<(i64, Option<f64>)>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of a bulk measures query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkMeasures {
    #[serde(default)]
    pub data: Vec<MeasureRow>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BulkMeasures {
    pub fn len(&self) -> usize {
        self.data.iter().map(|row| row.measures.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Long-format frame with one row per measure: `collection_time` (naive UTC), `field_id`, `value`.
    pub fn to_lazy_frame(&self) -> Result<LazyFrame, WisconetError> {
        let mut collection_time: Vec<i64> = Vec::with_capacity(self.len());
        let mut field_id: Vec<i64> = Vec::with_capacity(self.len());
        let mut value: Vec<Option<f64>> = Vec::with_capacity(self.len());
        for row in &self.data {
            for (id, measure) in &row.measures {
                collection_time.push(row.collection_time * 1000);
                field_id.push(*id);
                value.push(*measure);
            }
        }

        let df = polars::df!(
            "collection_time" => collection_time,
            "field_id" => field_id,
            "value" => value,
        )?;
        Ok(df
            .lazy()
            .with_column(
                col("collection_time").cast(DataType::Datetime(TimeUnit::Milliseconds, None)),
            )
            .sort_by_exprs(
                [col("collection_time"), col("field_id")],
                SortMultipleOptions::default(),
            ))
    }
}
