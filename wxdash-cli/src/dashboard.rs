//! Dashboard UI state and the action handlers that change it.
//!
//! Handlers return a [`Notice`] for the caller to display instead of
//! pushing notifications anywhere themselves.

use wxdash_core::{
    AlertError, AlertRequest, AlertService, ForecastProvider, ForecastSnapshot, Notifier,
};

/// Display state of one data region.
#[derive(Debug, Clone, PartialEq)]
pub enum Region<T> {
    Loading,
    Empty,
    Ready(T),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

/// A dismissible message produced by an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { level: Level::Info, title: title.into(), description: description.into() }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { level: Level::Error, title: title.into(), description: description.into() }
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub forecast: Region<ForecastSnapshot>,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self { forecast: Region::Loading }
    }
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a snapshot. On failure a previously loaded snapshot is kept;
    /// without one the region becomes empty.
    pub async fn load(&mut self, provider: &dyn ForecastProvider) -> Option<Notice> {
        match provider.get_forecast().await {
            Ok(snapshot) => {
                self.forecast = Region::Ready(snapshot);
                None
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to load forecast");
                if !matches!(self.forecast, Region::Ready(_)) {
                    self.forecast = Region::Empty;
                }
                Some(Notice::error("Error loading weather data", err.user_message()))
            }
        }
    }

    pub async fn refresh(&mut self, provider: &dyn ForecastProvider) -> Notice {
        match self.load(provider).await {
            Some(failure) => failure,
            None => Notice::info("Weather data updated", "Weather information is now up to date"),
        }
    }
}

pub async fn subscribe<N: Notifier>(alerts: &AlertService<N>, request: &AlertRequest) -> Notice {
    match alerts.submit_subscription(request).await {
        Ok(()) => {
            Notice::info("Subscription successful!", "You'll start receiving weather alerts soon")
        }
        Err(AlertError::Validation(invalid)) => {
            Notice::error(invalid.title(), invalid.user_message())
        }
        Err(err) => {
            tracing::warn!(error = %err, "subscription failed");
            Notice::error("Subscription failed", "Please try again later")
        }
    }
}

pub async fn daily_alert<N: Notifier>(
    alerts: &AlertService<N>,
    email: &str,
    phone_number: Option<String>,
) -> Notice {
    match alerts.submit_daily_alert(email, phone_number).await {
        Ok(request) => Notice::info(
            "Daily alerts activated",
            format!(
                "You will now receive weather updates every day at {}",
                request.send_at.format("%-I:%M %p")
            ),
        ),
        Err(AlertError::Validation(_)) => {
            Notice::error("Email required", "Please enter an email address")
        }
        Err(err) => {
            tracing::warn!(error = %err, "daily alert setup failed");
            Notice::error("Error setting up alerts", "Please try again later")
        }
    }
}
