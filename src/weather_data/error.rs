use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeatherDataError {
    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to decode hourly weather payload for {url}")]
    PayloadDecode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unknown timezone '{0}'")]
    UnknownTimezone(String),

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),

    #[error("Required column '{0}' not found in DataFrame")]
    ColumnNotFound(String, #[source] PolarsError),

    #[error("Unexpected data state: {0}")]
    UnexpectedData(String),
}

impl WeatherDataError {
    /// HTTP status of the failed request, if the server answered at all.
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            WeatherDataError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
