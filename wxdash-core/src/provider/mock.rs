use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, Days, Local, NaiveDate};

use crate::{
    error::FetchError,
    model::{CurrentConditions, DayForecast, FORECAST_DAYS, ForecastSnapshot, Location},
};

use super::ForecastProvider;

/// (text, icon code) pairs the generator cycles through.
const CONDITIONS: &[(&str, u16)] = &[
    ("Sunny", 113),
    ("Partly cloudy", 116),
    ("Light rain", 296),
    ("Overcast", 122),
    ("Patchy light drizzle", 263),
    ("Heavy snow", 338),
    ("Mist", 143),
];

/// Synthesized forecast anchored on today's date.
///
/// The shape never changes; values are derived from the calendar date so a
/// given day always looks the same.
#[derive(Debug, Clone)]
pub struct MockProvider {
    location: String,
    latency: Duration,
}

impl MockProvider {
    pub fn new(location: String, latency: Duration) -> Self {
        Self { location, latency }
    }

    /// Snapshot for a fixed "today", without the simulated delay.
    pub fn snapshot_for(&self, today: NaiveDate) -> Result<ForecastSnapshot, FetchError> {
        let days: Vec<DayForecast> = (0..FORECAST_DAYS as u64)
            .map(|offset| {
                let date = today.checked_add_days(Days::new(offset)).unwrap_or(today);
                synth_day(date)
            })
            .collect();

        let first = &days[0];
        let current = CurrentConditions {
            temperature_c: first.max_temp_c - 1.0,
            condition: first.condition.clone(),
            icon_url: first.icon_url.clone(),
            wind_kph: 5.0 + f64::from(today.ordinal() % 20),
            humidity_pct: 40 + (today.ordinal() % 50) as u8,
            feels_like_c: first.max_temp_c - 2.5,
            last_updated: format!("{today} 08:00"),
        };

        let (name, country) = split_location(&self.location);
        let location = Location {
            name,
            region: String::new(),
            country,
            localtime: Local::now().format("%Y-%m-%d %H:%M").to_string(),
        };

        ForecastSnapshot::new(location, current, days)
    }
}

fn synth_day(date: NaiveDate) -> DayForecast {
    let seed = date.ordinal() as usize;
    let (text, code) = CONDITIONS[seed % CONDITIONS.len()];

    let base = 8.0 + (seed % 12) as f64;
    let (min, max) =
        if text.contains("snow") { (base - 12.0, base - 6.0) } else { (base, base + 9.0) };

    let (rain, snow) = match text {
        "Heavy snow" => (0, 80),
        "Light rain" | "Patchy light drizzle" => (65, 0),
        "Overcast" => (25, 0),
        _ => (5, 0),
    };
    let (precipitation_chance, is_snow) = DayForecast::precipitation_from(rain, snow);

    DayForecast {
        date,
        min_temp_c: min,
        max_temp_c: max,
        avg_temp_c: (min + max) / 2.0,
        condition: text.to_string(),
        icon_url: format!("https://cdn.weatherapi.com/weather/64x64/day/{code}.png"),
        precipitation_chance,
        is_snow,
    }
}

fn split_location(query: &str) -> (String, String) {
    match query.split_once(',') {
        Some((name, country)) => (name.trim().to_string(), country.trim().to_string()),
        None => (query.trim().to_string(), String::new()),
    }
}

#[async_trait]
impl ForecastProvider for MockProvider {
    async fn get_forecast(&self) -> Result<ForecastSnapshot, FetchError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let today = Local::now().date_naive();
        tracing::debug!(%today, "returning mock forecast");
        self.snapshot_for(today)
    }
}
