pub mod composer;
pub mod error;
pub mod models;
