use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RiskClass {
    Low,
    Moderate,
    High,
}

impl RiskClass {
    /// `Low` below `low`, `High` above `high`, `Moderate` in between (both bounds inclusive).
    pub fn from_thresholds(probability: f64, low: f64, high: f64) -> Self {
        if probability < low {
            RiskClass::Low
        } else if probability > high {
            RiskClass::High
        } else {
            RiskClass::Moderate
        }
    }
}

impl fmt::Display for RiskClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RiskClass::Low => "Low",
            RiskClass::Moderate => "Moderate",
            RiskClass::High => "High",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskScore {
    pub probability: f64,
    /// Not every model defines classes.
    pub class: Option<RiskClass>,
}

impl RiskScore {
    pub fn new(probability: f64, class: Option<RiskClass>) -> Self {
        Self { probability, class }
    }
}

/// The scores of every risk model for one forecasting date.
///
/// Each model output is present as a key; `None` means the model could not score this day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskRecord {
    pub forecasting_date: NaiveDate,
    #[serde(flatten)]
    pub scores: BTreeMap<String, Option<RiskScore>>,
}

impl RiskRecord {
    pub fn new(forecasting_date: NaiveDate) -> Self {
        Self {
            forecasting_date,
            scores: BTreeMap::new(),
        }
    }

    pub fn score(&self, name: &str) -> Option<&RiskScore> {
        self.scores.get(name).and_then(Option::as_ref)
    }
}
