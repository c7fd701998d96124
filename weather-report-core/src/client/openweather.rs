use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::config::Config;
use crate::model::{Observation, Units};

use super::{FetchError, WeatherProvider};

/// Production client for the OpenWeatherMap current-weather endpoint.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    base_url: String,
    api_key: String,
    units: Units,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            units: config.units,
            http,
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn fetch(&self, city: &str) -> Result<Observation, FetchError> {
        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", self.units.as_query_param()),
            ])
            .send()
            .await
            .map_err(FetchError::Network)?;

        let status = res.status();

        match status {
            StatusCode::NOT_FOUND => {
                return Err(FetchError::CityNotFound { city: city.into() });
            }
            StatusCode::UNAUTHORIZED => return Err(FetchError::Unauthorized),
            _ => {}
        }

        let body = res.text().await.map_err(FetchError::Network)?;

        if !status.is_success() {
            return Err(FetchError::Provider {
                status,
                body: truncate_body(&body),
            });
        }

        let parsed: OwCurrentResponse = serde_json::from_str(&body)?;

        Ok(parsed.into_observation(city))
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

impl OwCurrentResponse {
    fn into_observation(self, city: &str) -> Observation {
        let timestamp = unix_to_utc(self.dt).unwrap_or_else(Utc::now);

        let (condition, description) = self
            .weather
            .first()
            .map(|w| (w.main.clone(), title_case(&w.description)))
            .unwrap_or_else(|| ("Unknown".to_string(), "Unknown".to_string()));

        Observation {
            city: city.to_string(),
            resolved_name: self.name,
            temperature: round1(self.main.temp),
            feels_like: round1(self.main.feels_like),
            humidity: self.main.humidity,
            wind_speed: round1(self.wind.speed),
            condition,
            description,
            timestamp,
        }
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Provider descriptions arrive lowercased ("scattered clouds"); the
/// report shows them title-cased ("Scattered Clouds").
fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }

    // cut at a char boundary; a multi-byte character may straddle MAX
    let mut cut = MAX;
    while !body.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &body[..cut])
}
