// daily_frame.rs

//! Contains the `DailyLazyFrame` structure: hourly observations aggregated per local calendar day,
//! optionally enriched with trailing moving averages.

use crate::types::daily_summary::{DailySummary, EnrichedDailySummary, MovingAverage, Stats};
use crate::types::frequency_frames::hourly_frame::{
    HourlyLazyFrame, DATE, DEW_POINT, NIGHT, PRECIPITATION, RELATIVE_HUMIDITY, SHIFT_DATE,
    TEMPERATURE, WIND_SPEED,
};
use crate::utils::from_epoch_days;
use crate::weather_data::error::WeatherDataError;
use chrono::NaiveDate;
use polars::prelude::{
    col, lit, Column, DataFrame, DataType, Expr, LazyFrame, RollingOptionsFixedWindow,
    SortMultipleOptions,
};
use std::collections::BTreeMap;

pub const FORECASTING_DATE: &str = "forecasting_date";
pub const PRECIPITATION_SUM: &str = "precip1Hour_sum";
pub const HOURS_RH90_NIGHT: &str = "hours_rh90_night";
pub const HOURS_RH80_ALLDAY: &str = "hours_rh80_allday";

/// Night hours at or above this relative humidity count towards `hours_rh90_night`.
pub const NIGHT_RH_THRESHOLD: f64 = 90.0;
/// Hours at or above this relative humidity count towards `hours_rh80_allday`.
pub const ALLDAY_RH_THRESHOLD: f64 = 80.0;

/// Name of the daily column holding `stat` (`min`, `mean`, `max`, `sum`) of hourly `field`.
pub fn stat_column(field: &str, stat: &str) -> String {
    format!("{field}_{stat}")
}

/// A wrapper around a Polars `LazyFrame` with one row per local calendar date.
///
/// Columns, in addition to `date` and `forecasting_date` (`date + 1`):
///
/// * `temperature_{min,mean,max}`, `temperatureDewPoint_{min,mean,max}`,
///   `relativeHumidity_{min,mean,max}`
/// * `precip1Hour_sum`, `windSpeed_mean`, `windSpeed_max`
/// * `hours_rh90_night` - night hours with RH ≥ 90 whose shift date is this date.
///   Null when no night hour maps onto the date.
/// * `hours_rh80_allday` - hours with RH ≥ 80 on this date.
/// * one `{field}_{window}ma` column per configured [`MovingAverage`].
///
/// Rows are sorted by `date`.
#[derive(Clone)]
pub struct DailyLazyFrame {
    /// The underlying Polars LazyFrame containing the daily data.
    pub frame: LazyFrame,
    /// Moving averages already added to `frame`.
    pub moving_averages: Vec<MovingAverage>,
}

impl DailyLazyFrame {
    pub fn new(frame: LazyFrame) -> Self {
        Self {
            frame,
            moving_averages: Vec::new(),
        }
    }

    /// Aggregates an hourly frame into daily summaries.
    ///
    /// Every date present in `hourly` appears exactly once. The two humidity counts are
    /// computed separately and left-joined onto that date spine.
    pub fn from_hourly(hourly: &HourlyLazyFrame) -> Self {
        let hourly = hourly.frame.clone();

        let mut stats: Vec<Expr> = Vec::new();
        for field in [TEMPERATURE, DEW_POINT, RELATIVE_HUMIDITY] {
            stats.push(col(field).min().alias(stat_column(field, "min")));
            stats.push(col(field).mean().alias(stat_column(field, "mean")));
            stats.push(col(field).max().alias(stat_column(field, "max")));
        }
        stats.push(col(PRECIPITATION).sum().alias(PRECIPITATION_SUM));
        stats.push(col(WIND_SPEED).mean().alias(stat_column(WIND_SPEED, "mean")));
        stats.push(col(WIND_SPEED).max().alias(stat_column(WIND_SPEED, "max")));

        let spine = hourly.clone().group_by([col(DATE)]).agg(stats);

        let night_counts = hourly
            .clone()
            .filter(col(NIGHT))
            .group_by([col(SHIFT_DATE)])
            .agg([count_at_least(RELATIVE_HUMIDITY, NIGHT_RH_THRESHOLD).alias(HOURS_RH90_NIGHT)])
            .select([col(SHIFT_DATE).alias(DATE), col(HOURS_RH90_NIGHT)]);

        let allday_counts = hourly
            .group_by([col(DATE)])
            .agg([count_at_least(RELATIVE_HUMIDITY, ALLDAY_RH_THRESHOLD).alias(HOURS_RH80_ALLDAY)]);

        let frame = spine
            .left_join(night_counts, col(DATE), col(DATE))
            .left_join(allday_counts, col(DATE), col(DATE))
            .sort_by_exprs([col(DATE)], SortMultipleOptions::default())
            .with_column(
                (col(DATE).cast(DataType::Int32) + lit(1i32))
                    .cast(DataType::Date)
                    .alias(FORECASTING_DATE),
            );

        Self::new(frame)
    }

    /// Adds a trailing moving average column for each entry of `averages`.
    ///
    /// Row `i` averages rows `max(0, i - window + 1)..=i`, so the first rows of the series use
    /// shorter windows instead of producing nulls. Null inputs are skipped; a window without any
    /// values yields null.
    pub fn with_moving_averages(&self, averages: &[MovingAverage]) -> DailyLazyFrame {
        let columns: Vec<Expr> = averages
            .iter()
            .map(|average| {
                col(average.field)
                    .cast(DataType::Float64)
                    .rolling_mean(RollingOptionsFixedWindow {
                        window_size: average.window,
                        min_periods: 1,
                        ..Default::default()
                    })
                    .alias(average.column_name())
            })
            .collect();

        let mut moving_averages = self.moving_averages.clone();
        moving_averages.extend_from_slice(averages);
        DailyLazyFrame {
            frame: self.frame.clone().with_columns(columns),
            moving_averages,
        }
    }

    /// Filters the daily data based on a Polars predicate expression.
    pub fn filter(&self, predicate: Expr) -> DailyLazyFrame {
        DailyLazyFrame {
            frame: self.frame.clone().filter(predicate),
            moving_averages: self.moving_averages.clone(),
        }
    }

    /// Keeps dates within `start..=end`.
    ///
    /// Moving averages already computed keep the values they had over the full series.
    pub fn get_range(&self, start: NaiveDate, end: NaiveDate) -> DailyLazyFrame {
        self.filter(col(DATE).gt_eq(lit(start)).and(col(DATE).lt_eq(lit(end))))
    }

    pub fn get_at(&self, date: NaiveDate) -> DailyLazyFrame {
        self.filter(col(DATE).eq(lit(date)))
    }

    /// Collects the frame into typed daily summaries.
    pub fn collect_summaries(&self) -> Result<Vec<DailySummary>, WeatherDataError> {
        let df = self.frame.clone().collect()?;
        summaries_from_frame(&df)
    }

    /// Collects the frame into summaries carrying every configured moving average.
    pub fn collect_enriched(&self) -> Result<Vec<EnrichedDailySummary>, WeatherDataError> {
        let df = self.frame.clone().collect()?;
        let summaries = summaries_from_frame(&df)?;

        let mut averages: Vec<(String, Vec<Option<f64>>)> = Vec::new();
        for average in &self.moving_averages {
            let name = average.column_name();
            let values = floats(&df, &name)?;
            averages.push((name, values));
        }

        Ok(summaries
            .into_iter()
            .enumerate()
            .map(|(idx, summary)| EnrichedDailySummary {
                summary,
                moving_averages: averages
                    .iter()
                    .map(|(name, values)| (name.clone(), values.get(idx).copied().flatten()))
                    .collect::<BTreeMap<_, _>>(),
            })
            .collect())
    }
}

/// Number of rows where `field >= threshold`. Null readings never count.
fn count_at_least(field: &str, threshold: f64) -> Expr {
    col(field)
        .gt_eq(lit(threshold))
        .cast(DataType::UInt32)
        .sum()
}

fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, WeatherDataError> {
    df.column(name)
        .map_err(|e| WeatherDataError::ColumnNotFound(name.to_string(), e))
}

fn floats(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, WeatherDataError> {
    Ok(column(df, name)?
        .cast(&DataType::Float64)?
        .f64()?
        .into_iter()
        .collect())
}

fn counts(df: &DataFrame, name: &str) -> Result<Vec<Option<u32>>, WeatherDataError> {
    Ok(column(df, name)?
        .cast(&DataType::UInt32)?
        .u32()?
        .into_iter()
        .collect())
}

fn dates(df: &DataFrame, name: &str) -> Result<Vec<NaiveDate>, WeatherDataError> {
    column(df, name)?
        .cast(&DataType::Int32)?
        .i32()?
        .into_iter()
        .map(|days| {
            days.and_then(from_epoch_days)
                .ok_or_else(|| WeatherDataError::UnexpectedData(format!("Invalid value in '{name}'")))
        })
        .collect()
}

fn summaries_from_frame(df: &DataFrame) -> Result<Vec<DailySummary>, WeatherDataError> {
    let stats = |field: &str| -> Result<Vec<Stats>, WeatherDataError> {
        let min = floats(df, &stat_column(field, "min"))?;
        let mean = floats(df, &stat_column(field, "mean"))?;
        let max = floats(df, &stat_column(field, "max"))?;
        Ok(min
            .into_iter()
            .zip(mean)
            .zip(max)
            .map(|((min, mean), max)| Stats { min, mean, max })
            .collect())
    };

    let date = dates(df, DATE)?;
    let forecasting_date = dates(df, FORECASTING_DATE)?;
    let temperature = stats(TEMPERATURE)?;
    let dew_point = stats(DEW_POINT)?;
    let relative_humidity = stats(RELATIVE_HUMIDITY)?;
    let precipitation_sum = floats(df, PRECIPITATION_SUM)?;
    let wind_speed_mean = floats(df, &stat_column(WIND_SPEED, "mean"))?;
    let wind_speed_max = floats(df, &stat_column(WIND_SPEED, "max"))?;
    let hours_rh90_night = counts(df, HOURS_RH90_NIGHT)?;
    let hours_rh80_allday = counts(df, HOURS_RH80_ALLDAY)?;

    Ok((0..df.height())
        .map(|idx| DailySummary {
            date: date[idx],
            forecasting_date: forecasting_date[idx],
            temperature: temperature[idx],
            dew_point: dew_point[idx],
            relative_humidity: relative_humidity[idx],
            precipitation_sum: precipitation_sum[idx],
            wind_speed_mean: wind_speed_mean[idx],
            wind_speed_max: wind_speed_max[idx],
            hours_rh90_night: hours_rh90_night[idx],
            hours_rh80_allday: hours_rh80_allday[idx],
        })
        .collect())
}
