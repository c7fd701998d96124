use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::model::Observation;

pub mod openweather;

pub use openweather::OpenWeatherClient;

/// Outcome of a single per-city fetch attempt.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("city '{city}' was not found by the weather provider")]
    CityNotFound { city: String },

    #[error("the weather provider rejected the API key")]
    Unauthorized,

    #[error("network error talking to the weather provider: {0}")]
    Network(#[source] reqwest::Error),

    #[error("weather provider returned {status}: {body}")]
    Provider {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("could not decode the weather provider response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Fetch the current observation for one city.
    async fn fetch(&self, city: &str) -> Result<Observation, FetchError>;
}

/// One skipped city within a batch.
#[derive(Debug)]
pub struct CityFailure {
    pub city: String,
    pub error: FetchError,
}

/// Result of a batch fetch: the observations that succeeded, in input
/// order, plus the cities that were skipped.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub observations: Vec<Observation>,
    pub failures: Vec<CityFailure>,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> usize {
        self.observations.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Fetch observations for every city, strictly sequentially in input order.
///
/// Any per-city failure is logged and recorded; the batch never aborts
/// early, even on an auth error for the first city. `delay` is observed
/// between successive calls only, not after the last one.
pub async fn fetch_batch(
    provider: &dyn WeatherProvider,
    cities: &[String],
    delay: Duration,
) -> BatchOutcome {
    let total = cities.len();
    let mut outcome = BatchOutcome::default();

    for (i, city) in cities.iter().enumerate() {
        let city = city.trim();
        info!("Processing {}/{}: {}", i + 1, total, city);

        match provider.fetch(city).await {
            Ok(observation) => outcome.observations.push(observation),
            Err(error) => {
                warn!("Skipping '{city}': {error}");
                outcome.failures.push(CityFailure {
                    city: city.to_string(),
                    error,
                });
            }
        }

        if i + 1 < total {
            tokio::time::sleep(delay).await;
        }
    }

    outcome
}
