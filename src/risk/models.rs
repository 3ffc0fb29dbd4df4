//! The standard crop disease risk models.
//!
//! Every model reads a few moving averages from one [`EnrichedDailySummary`] and returns a
//! probability for each of its outputs. Models are pure and know nothing about each other.

use crate::risk::error::RiskError;
use crate::types::daily_summary::{
    EnrichedDailySummary, MovingAverage, DEW_POINT_MIN_30MA, HOURS_RH80_ALLDAY_30MA,
    HOURS_RH90_NIGHT_14MA, RELATIVE_HUMIDITY_MAX_30MA, TEMPERATURE_MAX_30MA,
    TEMPERATURE_MEAN_30MA, TEMPERATURE_MIN_21MA, WIND_SPEED_MAX_30MA,
};
use crate::types::risk_record::{RiskClass, RiskScore};

pub const TARSPOT_RISK: &str = "tarspot_risk";
pub const GRAY_LEAF_SPOT_RISK: &str = "gray_leaf_spot_risk";
pub const FROGEYE_LEAF_SPOT_RISK: &str = "frogeye_leaf_spot_risk";
pub const WHITEMOLD_IRRIGATED_30IN_RISK: &str = "whitemold_irr_30in_risk";
pub const WHITEMOLD_IRRIGATED_15IN_RISK: &str = "whitemold_irr_15in_risk";
pub const WHITEMOLD_NON_IRRIGATED_RISK: &str = "whitemold_nirr_risk";

/// A disease risk model evaluated once per day.
pub trait RiskModel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Names of every score `evaluate` produces, in output order.
    fn outputs(&self) -> &'static [&'static str];

    /// Scores `day`.
    ///
    /// # Errors
    ///
    /// Returns a [`RiskError`] if an input is missing or not a finite number.
    fn evaluate(
        &self,
        day: &EnrichedDailySummary,
    ) -> Result<Vec<(&'static str, RiskScore)>, RiskError>;
}

pub(crate) fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn input(model: &'static str, day: &EnrichedDailySummary, average: &MovingAverage) -> Result<f64, RiskError> {
    let value = day
        .moving_average(average)
        .ok_or_else(|| RiskError::MissingInput {
            model,
            input: average.column_name(),
        })?;
    if !value.is_finite() {
        return Err(RiskError::NonFiniteInput {
            model,
            input: average.column_name(),
            value,
        });
    }
    Ok(value)
}

/// Tar spot of corn: mean of two logistic models on temperature and humidity.
#[derive(Debug, Clone, Copy, Default)]
pub struct TarSpot;

impl RiskModel for TarSpot {
    fn name(&self) -> &'static str {
        "tar_spot"
    }

    fn outputs(&self) -> &'static [&'static str] {
        &[TARSPOT_RISK]
    }

    fn evaluate(&self, day: &EnrichedDailySummary) -> Result<Vec<(&'static str, RiskScore)>, RiskError> {
        let mean_temperature = input(self.name(), day, &TEMPERATURE_MEAN_30MA)?;
        let max_rh = input(self.name(), day, &RELATIVE_HUMIDITY_MAX_30MA)?;
        let rh90_night_hours = input(self.name(), day, &HOURS_RH90_NIGHT_14MA)?;

        let lr4 = 32.06987 - 0.89471 * mean_temperature - 0.14373 * max_rh;
        let lr6 = 20.35950 - 0.91093 * mean_temperature - 0.29240 * rh90_night_hours;
        let probability = (logistic(lr4) + logistic(lr6)) / 2.0;

        Ok(vec![(
            TARSPOT_RISK,
            RiskScore::new(probability, Some(RiskClass::from_thresholds(probability, 0.2, 0.35))),
        )])
    }
}

/// Gray leaf spot of corn.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrayLeafSpot;

impl RiskModel for GrayLeafSpot {
    fn name(&self) -> &'static str {
        "gray_leaf_spot"
    }

    fn outputs(&self) -> &'static [&'static str] {
        &[GRAY_LEAF_SPOT_RISK]
    }

    fn evaluate(&self, day: &EnrichedDailySummary) -> Result<Vec<(&'static str, RiskScore)>, RiskError> {
        let min_temperature = input(self.name(), day, &TEMPERATURE_MIN_21MA)?;
        let min_dew_point = input(self.name(), day, &DEW_POINT_MIN_30MA)?;

        let probability = logistic(-2.9467 - 0.03729 * min_temperature + 0.6534 * min_dew_point);
        Ok(vec![(
            GRAY_LEAF_SPOT_RISK,
            RiskScore::new(probability, Some(RiskClass::from_thresholds(probability, 0.2, 0.6))),
        )])
    }
}

/// Frogeye leaf spot of soybean.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrogeyeLeafSpot;

impl RiskModel for FrogeyeLeafSpot {
    fn name(&self) -> &'static str {
        "frogeye_leaf_spot"
    }

    fn outputs(&self) -> &'static [&'static str] {
        &[FROGEYE_LEAF_SPOT_RISK]
    }

    fn evaluate(&self, day: &EnrichedDailySummary) -> Result<Vec<(&'static str, RiskScore)>, RiskError> {
        let max_temperature = input(self.name(), day, &TEMPERATURE_MAX_30MA)?;
        let rh80_hours = input(self.name(), day, &HOURS_RH80_ALLDAY_30MA)?;

        let probability = logistic(-5.92485 + 0.1220 * max_temperature + 0.1732 * rh80_hours);
        Ok(vec![(
            FROGEYE_LEAF_SPOT_RISK,
            RiskScore::new(probability, Some(RiskClass::from_thresholds(probability, 0.5, 0.6))),
        )])
    }
}

/// White mould of soybean under irrigation, for 30 and 15 inch row spacing.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhiteMoldIrrigated;

impl RiskModel for WhiteMoldIrrigated {
    fn name(&self) -> &'static str {
        "white_mold_irrigated"
    }

    fn outputs(&self) -> &'static [&'static str] {
        &[WHITEMOLD_IRRIGATED_30IN_RISK, WHITEMOLD_IRRIGATED_15IN_RISK]
    }

    fn evaluate(&self, day: &EnrichedDailySummary) -> Result<Vec<(&'static str, RiskScore)>, RiskError> {
        let max_temperature = input(self.name(), day, &TEMPERATURE_MAX_30MA)?;
        let max_rh = input(self.name(), day, &RELATIVE_HUMIDITY_MAX_30MA)?;

        let base = 0.65 * max_temperature + 0.38 * max_rh - 52.65;
        Ok(vec![
            (WHITEMOLD_IRRIGATED_30IN_RISK, RiskScore::new(logistic(base - 2.38), None)),
            (WHITEMOLD_IRRIGATED_15IN_RISK, RiskScore::new(logistic(base), None)),
        ])
    }
}

/// White mould of soybean without irrigation.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhiteMoldNonIrrigated;

impl RiskModel for WhiteMoldNonIrrigated {
    fn name(&self) -> &'static str {
        "white_mold_non_irrigated"
    }

    fn outputs(&self) -> &'static [&'static str] {
        &[WHITEMOLD_NON_IRRIGATED_RISK]
    }

    fn evaluate(&self, day: &EnrichedDailySummary) -> Result<Vec<(&'static str, RiskScore)>, RiskError> {
        let max_temperature = input(self.name(), day, &TEMPERATURE_MAX_30MA)?;
        let max_wind_speed = input(self.name(), day, &WIND_SPEED_MAX_30MA)?;

        let probability = logistic(-0.47 * max_temperature - 1.01 * max_wind_speed + 16.65);
        Ok(vec![(WHITEMOLD_NON_IRRIGATED_RISK, RiskScore::new(probability, None))])
    }
}
