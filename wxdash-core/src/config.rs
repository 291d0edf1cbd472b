use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::Path, path::PathBuf};

use crate::provider::SourceId;

pub const DEFAULT_LOCATION: &str = "Krumovgrad,Bulgaria";

/// Configuration for a single upstream provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,

    /// Override for the API root, e.g. a local mock server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    #[default]
    Log,
    Smtp,
}

/// How alert confirmations are delivered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    pub kind: NotifierKind,
    pub subscription_delay_ms: u64,
    pub daily_delay_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smtp_relay: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smtp_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smtp_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            kind: NotifierKind::Log,
            subscription_delay_ms: 1500,
            daily_delay_ms: 1000,
            smtp_relay: None,
            smtp_username: None,
            smtp_password: None,
            from: None,
        }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Location query sent upstream, e.g. "Krumovgrad,Bulgaria".
    pub location: String,

    /// Data source, "weatherapi" or "mock".
    pub source: String,

    /// Simulated latency of the mock source.
    pub mock_latency_ms: u64,

    /// Example TOML:
    /// [providers.weatherapi]
    /// api_key = "..."
    pub providers: HashMap<String, ProviderConfig>,

    pub notifier: NotifierConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            location: DEFAULT_LOCATION.to_string(),
            source: SourceId::WeatherApi.as_str().to_string(),
            mock_latency_ms: 500,
            providers: HashMap::new(),
            notifier: NotifierConfig::default(),
        }
    }
}

impl Config {
    /// Return the configured source as a strongly-typed SourceId.
    pub fn source_id(&self) -> Result<SourceId> {
        SourceId::try_from(self.source.as_str())
    }

    pub fn set_source(&mut self, id: SourceId) {
        self.source = id.as_str().to_string();
    }

    pub fn provider_config(&self, id: SourceId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Set or replace a provider API key, keeping any base URL override.
    pub fn upsert_provider_api_key(&mut self, id: SourceId, api_key: String) {
        self.providers
            .entry(id.as_str().to_string())
            .and_modify(|cfg| cfg.api_key = api_key.clone())
            .or_insert(ProviderConfig { api_key, base_url: None });
    }

    /// Returns API key for a provider, if present and non-empty.
    pub fn provider_api_key(&self, id: SourceId) -> Option<&str> {
        self.provider_config(id)
            .map(|cfg| cfg.api_key.as_str())
            .filter(|key| !key.is_empty())
    }

    pub fn provider_base_url(&self, id: SourceId) -> Option<&str> {
        self.provider_config(id).and_then(|cfg| cfg.base_url.as_deref())
    }

    /// Load config from the platform location, or defaults if absent.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the platform location.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save config, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "wxdash", "wxdash")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_krumovgrad_live_source() {
        let cfg = Config::default();
        assert_eq!(cfg.location, DEFAULT_LOCATION);
        assert_eq!(cfg.source_id().unwrap(), SourceId::WeatherApi);
        assert_eq!(cfg.notifier.kind, NotifierKind::Log);
        assert_eq!(cfg.notifier.subscription_delay_ms, 1500);
    }

    #[test]
    fn unknown_source_is_an_error() {
        let cfg = Config { source: "darksky".into(), ..Config::default() };
        let err = cfg.source_id().unwrap_err();
        assert!(err.to_string().contains("Unknown data source"));
    }

    #[test]
    fn upsert_keeps_base_url() {
        let mut cfg = Config::default();
        cfg.providers.insert(
            "weatherapi".into(),
            ProviderConfig { api_key: "OLD".into(), base_url: Some("http://localhost".into()) },
        );

        cfg.upsert_provider_api_key(SourceId::WeatherApi, "NEW".into());

        assert_eq!(cfg.provider_api_key(SourceId::WeatherApi), Some("NEW"));
        assert_eq!(cfg.provider_base_url(SourceId::WeatherApi), Some("http://localhost"));
    }

    #[test]
    fn empty_api_key_counts_as_missing() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(SourceId::WeatherApi, String::new());
        assert_eq!(cfg.provider_api_key(SourceId::WeatherApi), None);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(cfg.location, DEFAULT_LOCATION);
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.location = "Sofia,Bulgaria".into();
        cfg.set_source(SourceId::Mock);
        cfg.upsert_provider_api_key(SourceId::WeatherApi, "KEY".into());
        cfg.notifier.kind = NotifierKind::Smtp;
        cfg.notifier.smtp_relay = Some("smtp.example.com".into());
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.location, "Sofia,Bulgaria");
        assert_eq!(loaded.source_id().unwrap(), SourceId::Mock);
        assert_eq!(loaded.provider_api_key(SourceId::WeatherApi), Some("KEY"));
        assert_eq!(loaded.notifier.kind, NotifierKind::Smtp);
        assert_eq!(loaded.notifier.smtp_relay.as_deref(), Some("smtp.example.com"));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "source = \"mock\"\n").unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.source_id().unwrap(), SourceId::Mock);
        assert_eq!(cfg.location, DEFAULT_LOCATION);
        assert_eq!(cfg.notifier.daily_delay_ms, 1000);
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "location = [").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
