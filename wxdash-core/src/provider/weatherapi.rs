use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::FetchError,
    model::{
        CurrentConditions, DayForecast, FORECAST_DAYS, ForecastSnapshot, Location,
        normalize_icon_url,
    },
};

use super::ForecastProvider;

const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com";

/// Live forecast from WeatherAPI.com.
#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    location: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String, location: String) -> Result<Self, FetchError> {
        let http = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self { api_key, location, base_url: DEFAULT_BASE_URL.to_string(), http })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn fetch_forecast(&self) -> Result<ForecastSnapshot, FetchError> {
        let url = format!("{}/v1/forecast.json", self.base_url);
        let days = FORECAST_DAYS.to_string();

        tracing::debug!(%url, location = %self.location, "requesting forecast");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", self.location.as_str()),
                ("days", days.as_str()),
                ("aqi", "no"),
                ("alerts", "no"),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            tracing::warn!(%status, "weather API returned an error");
            return Err(FetchError::Status { status: status.as_u16(), body: truncate_body(&body) });
        }

        let parsed: WaForecastResponse = serde_json::from_str(&body)?;
        parsed.into_snapshot()
    }
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    name: String,
    #[serde(default)]
    region: String,
    country: String,
    #[serde(default)]
    localtime: String,
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    feelslike_c: f64,
    humidity: u8,
    wind_kph: f64,
    condition: WaCondition,
    #[serde(default)]
    last_updated: String,
}

#[derive(Debug, Deserialize)]
struct WaDay {
    maxtemp_c: f64,
    mintemp_c: f64,
    avgtemp_c: f64,
    condition: WaCondition,
    #[serde(default)]
    daily_chance_of_rain: u8,
    #[serde(default)]
    daily_chance_of_snow: u8,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    date: NaiveDate,
    day: WaDay,
}

#[derive(Debug, Deserialize)]
struct WaForecast {
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaForecastResponse {
    location: WaLocation,
    current: WaCurrent,
    forecast: WaForecast,
}

impl WaForecastResponse {
    fn into_snapshot(self) -> Result<ForecastSnapshot, FetchError> {
        let location = Location {
            name: self.location.name,
            region: self.location.region,
            country: self.location.country,
            localtime: self.location.localtime,
        };

        let current = CurrentConditions {
            temperature_c: self.current.temp_c,
            condition: self.current.condition.text,
            icon_url: normalize_icon_url(&self.current.condition.icon),
            wind_kph: self.current.wind_kph,
            humidity_pct: self.current.humidity,
            feels_like_c: self.current.feelslike_c,
            last_updated: self.current.last_updated,
        };

        let days = self
            .forecast
            .forecastday
            .into_iter()
            .map(|fd| {
                let (precipitation_chance, is_snow) = DayForecast::precipitation_from(
                    fd.day.daily_chance_of_rain,
                    fd.day.daily_chance_of_snow,
                );
                DayForecast {
                    date: fd.date,
                    min_temp_c: fd.day.mintemp_c,
                    max_temp_c: fd.day.maxtemp_c,
                    avg_temp_c: fd.day.avgtemp_c,
                    condition: fd.day.condition.text,
                    icon_url: normalize_icon_url(&fd.day.condition.icon),
                    precipitation_chance,
                    is_snow,
                }
            })
            .collect();

        ForecastSnapshot::new(location, current, days)
    }
}

#[async_trait]
impl ForecastProvider for WeatherApiProvider {
    async fn get_forecast(&self) -> Result<ForecastSnapshot, FetchError> {
        self.fetch_forecast().await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
