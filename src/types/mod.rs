pub mod daily_summary;
pub mod frequency_frames;
pub mod observation;
pub mod risk_record;
pub mod station;
