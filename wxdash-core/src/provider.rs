use crate::{
    Config, FetchError, ForecastSnapshot,
    provider::{mock::MockProvider, weatherapi::WeatherApiProvider},
};
use async_trait::async_trait;
use std::{convert::TryFrom, fmt::Debug, time::Duration};

pub mod mock;
pub mod weatherapi;

/// Where forecast data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceId {
    WeatherApi,
    Mock,
}

impl SourceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::WeatherApi => "weatherapi",
            SourceId::Mock => "mock",
        }
    }

    pub const fn all() -> &'static [SourceId] {
        &[SourceId::WeatherApi, SourceId::Mock]
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SourceId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "weatherapi" => Ok(SourceId::WeatherApi),
            "mock" => Ok(SourceId::Mock),
            _ => Err(anyhow::anyhow!(
                "Unknown data source '{value}'. Supported sources: weatherapi, mock."
            )),
        }
    }
}

#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    /// Current conditions plus the five-day forecast for the configured location.
    async fn get_forecast(&self) -> Result<ForecastSnapshot, FetchError>;
}

/// Construct a provider for an explicit source.
pub fn provider_from_config(
    id: SourceId,
    config: &Config,
) -> Result<Box<dyn ForecastProvider>, FetchError> {
    let boxed: Box<dyn ForecastProvider> = match id {
        SourceId::WeatherApi => {
            let api_key = config
                .provider_api_key(id)
                .ok_or_else(|| FetchError::MissingApiKey(id.to_string()))?;

            let provider = WeatherApiProvider::new(api_key.to_owned(), config.location.clone())?;
            match config.provider_base_url(id) {
                Some(base) => Box::new(provider.with_base_url(base)),
                None => Box::new(provider),
            }
        }
        SourceId::Mock => Box::new(MockProvider::new(
            config.location.clone(),
            Duration::from_millis(config.mock_latency_ms),
        )),
    };

    tracing::debug!(source = %id, location = %config.location, "forecast provider ready");
    Ok(boxed)
}

/// Construct the provider named by the `source` field of the config.
pub fn default_provider_from_config(config: &Config) -> anyhow::Result<Box<dyn ForecastProvider>> {
    let id = config.source_id()?;
    Ok(provider_from_config(id, config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn source_id_as_str_roundtrip() {
        for id in SourceId::all() {
            let parsed = SourceId::try_from(id.as_str()).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn source_id_is_case_insensitive() {
        assert_eq!(SourceId::try_from("WeatherAPI").unwrap(), SourceId::WeatherApi);
    }

    #[test]
    fn unknown_source_error() {
        let err = SourceId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown data source"));
    }

    #[test]
    fn live_source_requires_api_key() {
        let cfg = Config::default();
        let err = provider_from_config(SourceId::WeatherApi, &cfg).unwrap_err();
        assert!(matches!(err, FetchError::MissingApiKey(_)));
    }

    #[test]
    fn mock_source_needs_no_key() {
        let mut cfg = Config::default();
        cfg.set_source(SourceId::Mock);
        assert!(default_provider_from_config(&cfg).is_ok());
    }

    #[test]
    fn live_source_builds_when_key_present() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(SourceId::WeatherApi, "KEY".into());
        assert!(default_provider_from_config(&cfg).is_ok());
    }
}
