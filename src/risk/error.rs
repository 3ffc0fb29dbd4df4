use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum RiskError {
    #[error("{model}: input '{input}' is missing")]
    MissingInput { model: &'static str, input: String },

    #[error("{model}: input '{input}' is not finite ({value})")]
    NonFiniteInput {
        model: &'static str,
        input: String,
        value: f64,
    },
}
