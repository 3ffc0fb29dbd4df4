use crate::risk::models::{
    FrogeyeLeafSpot, GrayLeafSpot, RiskModel, TarSpot, WhiteMoldIrrigated, WhiteMoldNonIrrigated,
};
use crate::types::daily_summary::EnrichedDailySummary;
use crate::types::risk_record::RiskRecord;
use log::debug;

/// Runs a set of independent [`RiskModel`]s over a daily series.
pub struct RiskComposer {
    models: Vec<Box<dyn RiskModel>>,
}

impl Default for RiskComposer {
    fn default() -> Self {
        Self::standard()
    }
}

impl RiskComposer {
    pub fn new(models: Vec<Box<dyn RiskModel>>) -> Self {
        Self { models }
    }

    /// Tar spot, gray leaf spot, frogeye leaf spot and both white mould models.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(TarSpot),
            Box::new(GrayLeafSpot),
            Box::new(FrogeyeLeafSpot),
            Box::new(WhiteMoldIrrigated),
            Box::new(WhiteMoldNonIrrigated),
        ])
    }

    pub fn with_model(mut self, model: impl RiskModel + 'static) -> Self {
        self.models.push(Box::new(model));
        self
    }

    /// Every output name of every model.
    pub fn outputs(&self) -> Vec<&'static str> {
        self.models
            .iter()
            .flat_map(|model| model.outputs().iter().copied())
            .collect()
    }

    /// One record per day, keyed by its forecasting date.
    ///
    /// All outputs are present in every record. When a model can't score a day, only that
    /// model's outputs are `None`.
    pub fn compose(&self, days: &[EnrichedDailySummary]) -> Vec<RiskRecord> {
        days.iter().map(|day| self.compose_day(day)).collect()
    }

    pub fn compose_day(&self, day: &EnrichedDailySummary) -> RiskRecord {
        let mut record = RiskRecord::new(day.summary.forecasting_date);
        for model in &self.models {
            for output in model.outputs() {
                record.scores.insert(output.to_string(), None);
            }
            match model.evaluate(day) {
                Ok(scores) => {
                    for (name, score) in scores {
                        record.scores.insert(name.to_string(), Some(score));
                    }
                }
                Err(e) => debug!(
                    "{} skipped {}: {}",
                    model.name(),
                    day.summary.forecasting_date,
                    e
                ),
            }
        }
        record
    }
}
