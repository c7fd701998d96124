//! Core library for the `weather-report` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeatherMap client and sequential batch fetching
//! - CSV/JSON persistence of observations
//! - Statistics, groupings and the text report renderer
//!
//! It is used by `weather-report-cli`, but can also be reused by other
//! binaries or services.

pub mod analyzer;
pub mod client;
pub mod config;
pub mod model;
pub mod report;
pub mod store;

pub use analyzer::{AnalysisResult, AnalyzeError, Band, BandThresholds};
pub use client::{
    BatchOutcome, CityFailure, FetchError, OpenWeatherClient, WeatherProvider, fetch_batch,
};
pub use config::{Config, ConfigError};
pub use model::{Observation, Units};
pub use report::ReportOptions;
pub use store::{DataFormat, StoreError};
