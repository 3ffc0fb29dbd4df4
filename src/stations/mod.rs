pub mod error;
pub mod wisconet;
