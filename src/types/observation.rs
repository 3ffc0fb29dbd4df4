//! Hourly observations as fetched, and the local-time view used to bucket them into days.

use crate::weather_data::error::WeatherDataError;
use chrono::{DateTime, NaiveDate, TimeDelta, Timelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::ops::RangeInclusive;

/// Local hours counted as daytime; everything else is night.
pub const DAY_HOURS: RangeInclusive<u32> = 7..=19;

/// Night observations are bucketed by the date of `local_time + NIGHT_SHIFT_HOURS`,
/// so an evening and the following early morning land in one bucket.
pub const NIGHT_SHIFT_HOURS: i64 = 4;

/// One hourly weather record for a point, timestamped in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    pub valid_time: DateTime<Utc>,
    /// Air temperature, °C.
    pub temperature: Option<f64>,
    /// Dew point, °C.
    pub dew_point: Option<f64>,
    /// Relative humidity, %.
    pub relative_humidity: Option<f64>,
    /// Precipitation over the preceding hour, mm.
    pub precipitation: Option<f64>,
    /// Wind speed, km/h.
    pub wind_speed: Option<f64>,
}

impl Observation {
    /// An observation with no measured values.
    pub fn empty(valid_time: DateTime<Utc>) -> Self {
        Self {
            valid_time,
            temperature: None,
            dew_point: None,
            relative_humidity: None,
            precipitation: None,
            wind_speed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedObservation {
    pub observation: Observation,
    pub local_time: DateTime<Tz>,
    /// Civil date of `local_time`.
    pub date: NaiveDate,
    /// Civil hour of `local_time`, 0-23.
    pub hour: u32,
    pub is_night: bool,
    pub shift_date: NaiveDate,
}

impl NormalizedObservation {
    pub fn new(observation: Observation, timezone: Tz) -> Self {
        Self::from_local_time(observation, observation.valid_time.with_timezone(&timezone))
    }

    pub fn from_local_time(observation: Observation, local_time: DateTime<Tz>) -> Self {
        let hour = local_time.hour();
        let date = local_time.date_naive();
        let shift_date = (local_time + TimeDelta::hours(NIGHT_SHIFT_HOURS)).date_naive();
        Self {
            observation,
            local_time,
            date,
            hour,
            is_night: !DAY_HOURS.contains(&hour),
            shift_date,
        }
    }

    /// Recomputes the derived fields from this row's own local timestamp.
    pub fn renormalized(&self) -> Self {
        Self::from_local_time(self.observation, self.local_time)
    }
}

/// Looks up an IANA zone name such as "America/Chicago" or "US/Central".
pub fn parse_timezone(name: &str) -> Result<Tz, WeatherDataError> {
    name.trim()
        .parse()
        .map_err(|_| WeatherDataError::UnknownTimezone(name.to_string()))
}

/// Converts observations to `timezone` and orders them by instant.
///
/// The sort is stable, so duplicate timestamps keep their fetch order.
pub fn normalize(observations: Vec<Observation>, timezone: Tz) -> Vec<NormalizedObservation> {
    let mut rows: Vec<NormalizedObservation> = observations
        .into_iter()
        .map(|observation| NormalizedObservation::new(observation, timezone))
        .collect();
    rows.sort_by_key(|row| row.observation.valid_time);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::America::Chicago;

    fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Observation {
        Observation::empty(Utc.with_ymd_and_hms(year, month, day, hour, minute, 0).unwrap())
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone("US/Central").unwrap(), chrono_tz::US::Central);
        assert_eq!(parse_timezone("America/Chicago").unwrap(), Chicago);
        assert!(matches!(
            parse_timezone("Mars/Olympus_Mons"),
            Err(WeatherDataError::UnknownTimezone(name)) if name == "Mars/Olympus_Mons"
        ));
    }

    #[test]
    fn test_central_time_conversion_and_night_flag() {
        // 2024-07-01 12:00 UTC is 07:00 CDT, the first daytime hour.
        let row = NormalizedObservation::new(at(2024, 7, 1, 12, 0), Chicago);
        assert_eq!(row.date, date(2024, 7, 1));
        assert_eq!(row.hour, 7);
        assert!(!row.is_night);

        // 01:00 UTC on July 2nd is 20:00 CDT on July 1st.
        let row = NormalizedObservation::new(at(2024, 7, 2, 1, 0), Chicago);
        assert_eq!(row.date, date(2024, 7, 1));
        assert_eq!(row.hour, 20);
        assert!(row.is_night);
        assert_eq!(row.shift_date, date(2024, 7, 2));

        // 19:00 local is still daytime
        let row = NormalizedObservation::new(at(2024, 7, 2, 0, 0), Chicago);
        assert_eq!(row.hour, 19);
        assert!(!row.is_night);
    }

    #[test]
    fn test_late_evening_and_early_morning_share_shift_date() {
        // 23:30 CDT on July 1st and 02:30 CDT on July 2nd
        let evening = NormalizedObservation::new(at(2024, 7, 2, 4, 30), Chicago);
        let morning = NormalizedObservation::new(at(2024, 7, 2, 7, 30), Chicago);

        assert_eq!(evening.date, date(2024, 7, 1));
        assert_eq!(morning.date, date(2024, 7, 2));
        assert_eq!(evening.shift_date, date(2024, 7, 2));
        assert_eq!(morning.shift_date, date(2024, 7, 2));
        assert!(evening.is_night && morning.is_night);

        // 19:59 local stays on its own date
        let before = NormalizedObservation::new(at(2024, 7, 2, 0, 59), Chicago);
        assert_eq!(before.shift_date, date(2024, 7, 1));
    }

    #[test]
    fn test_daylight_saving_transitions() {
        // Spring forward on 2024-03-10: 07:00 and 08:00 UTC are 01:00 CST and 03:00 CDT.
        let before = NormalizedObservation::new(at(2024, 3, 10, 7, 0), Chicago);
        let after = NormalizedObservation::new(at(2024, 3, 10, 8, 0), Chicago);
        assert_eq!(before.hour, 1);
        assert_eq!(after.hour, 3);
        assert_eq!(before.date, after.date);

        // Fall back on 2024-11-03: 01:00 local happens twice.
        let first = NormalizedObservation::new(at(2024, 11, 3, 6, 0), Chicago);
        let second = NormalizedObservation::new(at(2024, 11, 3, 7, 0), Chicago);
        assert_eq!(first.hour, 1);
        assert_eq!(second.hour, 1);
        assert!(first.local_time < second.local_time);
    }

    #[test]
    fn test_normalize_sorts_by_instant() {
        let rows = normalize(
            vec![at(2024, 7, 1, 3, 0), at(2024, 7, 1, 1, 0), at(2024, 7, 1, 2, 0)],
            Chicago,
        );
        let hours: Vec<u32> = rows.iter().map(|row| row.observation.valid_time.hour()).collect();
        assert_eq!(hours, vec![1, 2, 3]);
    }

    #[test]
    fn test_renormalizing_is_idempotent() {
        let observations: Vec<Observation> = (0..72)
            .map(|h| Observation::empty(Utc.with_ymd_and_hms(2024, 11, 2, 0, 0, 0).unwrap() + TimeDelta::hours(h)))
            .collect();
        let rows = normalize(observations.clone(), Chicago);
        for row in &rows {
            assert_eq!(&row.renormalized(), row);
        }
        assert_eq!(normalize(observations, Chicago), rows);
    }
}
