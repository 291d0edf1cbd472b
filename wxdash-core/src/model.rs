use std::collections::BTreeSet;
use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{FetchError, ValidationError};

/// Number of days every snapshot carries.
pub const FORECAST_DAYS: usize = 5;

/// Condition keys offered by the subscription form.
pub const KNOWN_CONDITIONS: &[(&str, &str)] = &[
    ("extreme", "Extreme weather"),
    ("rain", "Rain forecast"),
    ("temperature", "Temperature changes"),
    ("daily-summary", "Daily summary"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub region: String,
    pub country: String,
    pub localtime: String,
}

impl Location {
    /// "Name, Country" as shown in the dashboard header.
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.name, self.country)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature_c: f64,
    pub condition: String,
    pub icon_url: String,
    pub wind_kph: f64,
    pub humidity_pct: u8,
    pub feels_like_c: f64,
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayForecast {
    pub date: NaiveDate,
    pub min_temp_c: f64,
    pub max_temp_c: f64,
    pub avg_temp_c: f64,
    pub condition: String,
    pub icon_url: String,
    pub precipitation_chance: u8,
    pub is_snow: bool,
}

impl DayForecast {
    /// Snow chance wins over rain chance whenever any snow is expected.
    pub fn precipitation_from(chance_of_rain: u8, chance_of_snow: u8) -> (u8, bool) {
        if chance_of_snow > 0 {
            (chance_of_snow, true)
        } else {
            (chance_of_rain, false)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSnapshot {
    pub location: Location,
    pub current: CurrentConditions,
    days: Vec<DayForecast>,
}

impl ForecastSnapshot {
    /// Build a snapshot, enforcing exactly [`FORECAST_DAYS`] days in
    /// non-decreasing date order. Extra trailing days are dropped.
    pub fn new(
        location: Location,
        current: CurrentConditions,
        mut days: Vec<DayForecast>,
    ) -> Result<Self, FetchError> {
        if days.len() < FORECAST_DAYS {
            return Err(FetchError::Invalid(format!(
                "expected {FORECAST_DAYS} forecast days, got {}",
                days.len()
            )));
        }
        days.truncate(FORECAST_DAYS);

        if let Some(pair) = days.windows(2).find(|w| w[1].date < w[0].date) {
            return Err(FetchError::Invalid(format!(
                "forecast days out of order: {} before {}",
                pair[0].date, pair[1].date
            )));
        }

        Ok(Self { location, current, days })
    }

    pub fn days(&self) -> &[DayForecast] {
        &self.days
    }
}

/// Rewrite protocol-relative icon URLs (`//cdn...`) to `https://`.
pub fn normalize_icon_url(url: &str) -> String {
    match url.strip_prefix("//") {
        Some(rest) => format!("https://{rest}"),
        None => url.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sign-up for recurring weather alerts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRequest {
    pub email: String,
    pub frequency: Frequency,
    pub conditions: BTreeSet<String>,
    pub phone_number: Option<String>,
}

impl AlertRequest {
    pub fn new(
        email: impl Into<String>,
        frequency: Frequency,
        conditions: impl IntoIterator<Item = String>,
        phone_number: Option<String>,
    ) -> Self {
        Self {
            email: email.into().trim().to_string(),
            frequency,
            conditions: conditions.into_iter().collect(),
            phone_number: normalize_phone(phone_number),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.email.trim().is_empty() {
            return Err(ValidationError::EmailRequired);
        }
        if self.conditions.is_empty() {
            return Err(ValidationError::NoConditions);
        }
        Ok(())
    }
}

impl Default for AlertRequest {
    /// Matches the form's initial state: daily, "extreme" pre-selected.
    fn default() -> Self {
        Self::new("", Frequency::Daily, ["extreme".to_string()], None)
    }
}

/// Request to receive a daily summary at a fixed local time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyAlertRequest {
    pub email: String,
    pub phone_number: Option<String>,
    pub send_at: NaiveTime,
}

impl DailyAlertRequest {
    pub fn new(email: impl Into<String>, phone_number: Option<String>) -> Self {
        Self {
            email: email.into().trim().to_string(),
            phone_number: normalize_phone(phone_number),
            send_at: NaiveTime::from_hms_opt(7, 0, 0).unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.email.trim().is_empty() {
            return Err(ValidationError::EmailRequired);
        }
        Ok(())
    }
}

fn normalize_phone(phone: Option<String>) -> Option<String> {
    phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty())
}
