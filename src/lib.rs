mod agforecast;
mod config;
mod error;
mod grid;
mod risk;
mod stations;
mod types;
mod utils;
mod weather_data;

pub use agforecast::*;
pub use config::*;
pub use error::AgForecastError;

pub use grid::{generate_grid, BoundingBox, GridError, GridPointRisk, GridResult};

pub use risk::composer::RiskComposer;
pub use risk::error::RiskError;
pub use risk::models::*;

pub use types::daily_summary::*;
pub use types::observation::*;
pub use types::risk_record::*;
pub use types::station::{BulkMeasures, Field, MeasureRow, Station, EARLIEST_API_DATE_FORMAT};

pub use types::frequency_frames::daily_frame::*;
pub use types::frequency_frames::hourly_frame::*;

pub use stations::error::WisconetError;
pub use stations::wisconet::*;

pub use weather_data::chunks::{chunk_range, TimeChunk};
pub use weather_data::data_loader::{HourlyWeatherSource, IbmWeatherLoader};
pub use weather_data::error::WeatherDataError;
pub use weather_data::frame_fetcher::*;
