//! Core library for the `wxdash` weather dashboard.
//!
//! This crate defines:
//! - Configuration handling
//! - Forecast sources (live WeatherAPI.com and a mock generator)
//! - Domain models and condition classification
//! - Alert sign-up validation and delivery
//!
//! It is used by `wxdash-cli`, but can also be reused by other front ends.

pub mod alerts;
pub mod condition;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;

pub use alerts::{AlertService, LogNotifier, Notifier, SmtpNotifier, notifier_from_config};
pub use condition::{Category, classify_condition};
pub use config::{Config, NotifierConfig, NotifierKind, ProviderConfig};
pub use error::{AlertError, FetchError, NotifyError, ValidationError};
pub use model::{
    AlertRequest, CurrentConditions, DailyAlertRequest, DayForecast, FORECAST_DAYS,
    ForecastSnapshot, Frequency, KNOWN_CONDITIONS, Location, normalize_icon_url,
};
pub use provider::{ForecastProvider, SourceId};
