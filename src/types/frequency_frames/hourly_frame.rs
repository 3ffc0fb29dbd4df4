// hourly_frame.rs

//! Contains the `HourlyLazyFrame` structure holding normalized hourly observations for one point.

use crate::types::observation::{normalize, NormalizedObservation, Observation};
use crate::utils::to_epoch_days;
use crate::weather_data::error::WeatherDataError;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use polars::prelude::{col, lit, DataType, Expr, IntoLazy, LazyFrame, TimeUnit};

pub const VALID_TIME: &str = "valid_time";
pub const LOCAL_TIME: &str = "local_time";
pub const DATE: &str = "date";
pub const HOUR: &str = "hour";
pub const NIGHT: &str = "night";
pub const SHIFT_DATE: &str = "shift_date";
pub const TEMPERATURE: &str = "temperature";
pub const DEW_POINT: &str = "temperatureDewPoint";
pub const RELATIVE_HUMIDITY: &str = "relativeHumidity";
pub const PRECIPITATION: &str = "precip1Hour";
pub const WIND_SPEED: &str = "windSpeed";

/// A wrapper around a Polars `LazyFrame` with one row per normalized hourly observation.
///
/// Columns:
///
/// * `valid_time` - the observation instant, naive UTC `Datetime(ms)`.
/// * `local_time` - the same instant as naive wall-clock time in the target zone.
/// * `date`, `hour`, `night`, `shift_date` - derived from `local_time`,
///   see [`NormalizedObservation`].
/// * `temperature`, `temperatureDewPoint`, `relativeHumidity`, `precip1Hour`, `windSpeed` -
///   the measured values, `Float64` with nulls for missing readings.
///
/// Rows are ordered by `valid_time`.
#[derive(Clone)]
pub struct HourlyLazyFrame {
    /// The underlying Polars LazyFrame containing the hourly data.
    pub frame: LazyFrame,
}

impl HourlyLazyFrame {
    pub fn new(frame: LazyFrame) -> Self {
        Self { frame }
    }

    /// Normalizes `observations` into `timezone` and builds the frame from them.
    pub fn from_observations(
        observations: Vec<Observation>,
        timezone: Tz,
    ) -> Result<Self, WeatherDataError> {
        Self::from_normalized(&normalize(observations, timezone))
    }

    /// Builds the frame from rows that are already normalized, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherDataError::DataFrameProcessing`] if Polars fails to assemble the columns.
    pub fn from_normalized(rows: &[NormalizedObservation]) -> Result<Self, WeatherDataError> {
        let valid_time: Vec<i64> = rows
            .iter()
            .map(|row| row.observation.valid_time.timestamp_millis())
            .collect();
        let local_time: Vec<i64> = rows
            .iter()
            .map(|row| row.local_time.naive_local().and_utc().timestamp_millis())
            .collect();
        let date: Vec<i32> = rows.iter().map(|row| to_epoch_days(row.date)).collect();
        let hour: Vec<u32> = rows.iter().map(|row| row.hour).collect();
        let night: Vec<bool> = rows.iter().map(|row| row.is_night).collect();
        let shift_date: Vec<i32> = rows.iter().map(|row| to_epoch_days(row.shift_date)).collect();

        let measure = |get: fn(&Observation) -> Option<f64>| -> Vec<Option<f64>> {
            rows.iter().map(|row| get(&row.observation)).collect()
        };

        let df = polars::df!(
            VALID_TIME => valid_time,
            LOCAL_TIME => local_time,
            DATE => date,
            HOUR => hour,
            NIGHT => night,
            SHIFT_DATE => shift_date,
            TEMPERATURE => measure(|o| o.temperature),
            DEW_POINT => measure(|o| o.dew_point),
            RELATIVE_HUMIDITY => measure(|o| o.relative_humidity),
            PRECIPITATION => measure(|o| o.precipitation),
            WIND_SPEED => measure(|o| o.wind_speed),
        )?;

        let frame = df.lazy().with_columns([
            col(VALID_TIME).cast(DataType::Datetime(TimeUnit::Milliseconds, None)),
            col(LOCAL_TIME).cast(DataType::Datetime(TimeUnit::Milliseconds, None)),
            col(DATE).cast(DataType::Date),
            col(SHIFT_DATE).cast(DataType::Date),
        ]);
        Ok(Self::new(frame))
    }

    /// Filters the hourly data based on a Polars predicate expression.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use agforecast::{HourlyLazyFrame, RELATIVE_HUMIDITY};
    /// use polars::prelude::{col, lit};
    ///
    /// # fn humid(hourly: HourlyLazyFrame) -> Result<(), Box<dyn std::error::Error>> {
    /// let humid_hours = hourly.filter(col(RELATIVE_HUMIDITY).gt_eq(lit(90.0)));
    /// println!("{}", humid_hours.frame.collect()?);
    /// # Ok(())
    /// # }
    /// ```
    pub fn filter(&self, predicate: Expr) -> HourlyLazyFrame {
        HourlyLazyFrame::new(self.frame.clone().filter(predicate))
    }

    /// Keeps observations with `start <= valid_time <= end`.
    pub fn get_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> HourlyLazyFrame {
        self.filter(
            col(VALID_TIME)
                .gt_eq(lit(start.naive_utc()))
                .and(col(VALID_TIME).lt_eq(lit(end.naive_utc()))),
        )
    }

    /// Keeps the observations whose local calendar date falls within `start..=end`.
    pub fn get_dates(&self, start: NaiveDate, end: NaiveDate) -> HourlyLazyFrame {
        self.filter(col(DATE).gt_eq(lit(start)).and(col(DATE).lt_eq(lit(end))))
    }

    /// Only the night rows.
    pub fn nights(&self) -> HourlyLazyFrame {
        self.filter(col(NIGHT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDateTime, TimeDelta, TimeZone};
    use chrono_tz::America::Chicago;

    fn observations(start: DateTime<Utc>, hours: i64) -> Vec<Observation> {
        (0..hours)
            .map(|h| Observation {
                temperature: Some(20.0 + h as f64),
                relative_humidity: if h % 2 == 0 { Some(95.0) } else { None },
                ..Observation::empty(start + TimeDelta::hours(h))
            })
            .collect()
    }

    #[test]
    fn test_hourly_frame_schema() -> Result<(), Box<dyn std::error::Error>> {
        let start = Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap();
        let hourly = HourlyLazyFrame::from_observations(observations(start, 3), Chicago)?;
        let df = hourly.frame.collect()?;

        assert_eq!(df.height(), 3);
        assert!(matches!(
            df.column(VALID_TIME)?.dtype(),
            DataType::Datetime(TimeUnit::Milliseconds, None)
        ));
        assert_eq!(df.column(DATE)?.dtype(), &DataType::Date);
        assert_eq!(df.column(SHIFT_DATE)?.dtype(), &DataType::Date);
        assert_eq!(df.column(NIGHT)?.dtype(), &DataType::Boolean);
        assert_eq!(df.column(TEMPERATURE)?.dtype(), &DataType::Float64);

        let hours: Vec<Option<u32>> = df.column(HOUR)?.u32()?.into_iter().collect();
        assert_eq!(hours, vec![Some(7), Some(8), Some(9)]);

        let rh = df.column(RELATIVE_HUMIDITY)?.f64()?;
        assert_eq!(rh.get(0), Some(95.0));
        assert_eq!(rh.get(1), None);

        let local = df.column(LOCAL_TIME)?.cast(&DataType::Int64)?.i64()?.get(0).unwrap();
        let expected: NaiveDateTime = NaiveDate::from_ymd_opt(2024, 7, 1)
            .unwrap()
            .and_hms_opt(7, 0, 0)
            .unwrap();
        assert_eq!(local, expected.and_utc().timestamp_millis());
        Ok(())
    }

    #[test]
    fn test_rows_sorted_by_instant() -> Result<(), Box<dyn std::error::Error>> {
        let start = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
        let mut input = observations(start, 5);
        input.reverse();
        let df = HourlyLazyFrame::from_observations(input, Chicago)?.frame.collect()?;

        let times: Vec<i64> = df
            .column(VALID_TIME)?
            .cast(&DataType::Int64)?
            .i64()?
            .into_iter()
            .flatten()
            .collect();
        assert!(times.windows(2).all(|w| w[0] < w[1]));
        Ok(())
    }

    #[test]
    fn test_filters() -> Result<(), Box<dyn std::error::Error>> {
        // 2024-07-01 00:00 UTC is 19:00 CDT on June 30th
        let start = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
        let hourly = HourlyLazyFrame::from_observations(observations(start, 48), Chicago)?;

        let range = hourly
            .get_range(start + TimeDelta::hours(2), start + TimeDelta::hours(5))
            .frame
            .collect()?;
        assert_eq!(range.height(), 4);

        let june_30 = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let first_day = hourly.get_dates(june_30, june_30).frame.collect()?;
        assert_eq!(first_day.height(), 5);

        let nights = hourly.nights().frame.collect()?;
        assert!(nights.column(NIGHT)?.bool()?.into_iter().all(|n| n == Some(true)));
        Ok(())
    }

    #[test]
    fn test_empty_input() -> Result<(), Box<dyn std::error::Error>> {
        let df = HourlyLazyFrame::from_observations(Vec::new(), Chicago)?.frame.collect()?;
        assert_eq!(df.height(), 0);
        assert_eq!(df.column(DATE)?.dtype(), &DataType::Date);
        Ok(())
    }
}
