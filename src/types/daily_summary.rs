use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Minimum, mean and maximum of one hourly variable over a day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Stats {
    pub min: Option<f64>,
    pub mean: Option<f64>,
    pub max: Option<f64>,
}

/// One calendar day of aggregated hourly weather.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    /// The day risk computed from this row applies to, `date + 1`.
    pub forecasting_date: NaiveDate,
    pub temperature: Stats,
    pub dew_point: Stats,
    pub relative_humidity: Stats,
    pub precipitation_sum: Option<f64>,
    pub wind_speed_mean: Option<f64>,
    pub wind_speed_max: Option<f64>,
    /// Night hours with RH ≥ 90, bucketed by shift date. `None` when the day had no night hours.
    pub hours_rh90_night: Option<u32>,
    /// Hours with RH ≥ 80 over the whole day.
    pub hours_rh80_allday: Option<u32>,
}

/// A trailing moving average of one daily column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MovingAverage {
    /// Name of the daily column being averaged, e.g. `temperature_max`.
    pub field: &'static str,
    /// Window length in days.
    pub window: usize,
}

impl MovingAverage {
    pub const fn new(field: &'static str, window: usize) -> Self {
        Self { field, window }
    }

    /// `temperature_max` over 30 days becomes `temperature_max_30ma`.
    pub fn column_name(&self) -> String {
        format!("{}_{}ma", self.field, self.window)
    }
}

pub const TEMPERATURE_MAX_30MA: MovingAverage = MovingAverage::new("temperature_max", 30);
pub const TEMPERATURE_MEAN_30MA: MovingAverage = MovingAverage::new("temperature_mean", 30);
pub const TEMPERATURE_MIN_21MA: MovingAverage = MovingAverage::new("temperature_min", 21);
pub const DEW_POINT_MIN_30MA: MovingAverage = MovingAverage::new("temperatureDewPoint_min", 30);
pub const RELATIVE_HUMIDITY_MAX_30MA: MovingAverage =
    MovingAverage::new("relativeHumidity_max", 30);
pub const WIND_SPEED_MAX_30MA: MovingAverage = MovingAverage::new("windSpeed_max", 30);
pub const HOURS_RH90_NIGHT_14MA: MovingAverage = MovingAverage::new("hours_rh90_night", 14);
pub const HOURS_RH80_ALLDAY_30MA: MovingAverage = MovingAverage::new("hours_rh80_allday", 30);

/// The moving averages the standard risk models read.
pub const DEFAULT_MOVING_AVERAGES: [MovingAverage; 8] = [
    TEMPERATURE_MAX_30MA,
    TEMPERATURE_MEAN_30MA,
    DEW_POINT_MIN_30MA,
    RELATIVE_HUMIDITY_MAX_30MA,
    WIND_SPEED_MAX_30MA,
    HOURS_RH90_NIGHT_14MA,
    HOURS_RH80_ALLDAY_30MA,
    TEMPERATURE_MIN_21MA,
];

/// A [`DailySummary`] with its moving averages, keyed by [`MovingAverage::column_name`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedDailySummary {
    #[serde(flatten)]
    pub summary: DailySummary,
    #[serde(flatten)]
    pub moving_averages: BTreeMap<String, Option<f64>>,
}

impl EnrichedDailySummary {
    /// The average for `average`, or `None` if it wasn't computed or had no input values.
    pub fn moving_average(&self, average: &MovingAverage) -> Option<f64> {
        self.moving_averages
            .get(&average.column_name())
            .copied()
            .flatten()
    }
}
