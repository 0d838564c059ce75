pub mod aggregate;
pub mod config;
pub mod error;
pub mod hot_cold;
pub mod service;
pub mod tracker;

pub use config::AnalysisConfig;
pub use error::AnalysisError;
