use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use inquire::{InquireError, MultiSelect, Password, Select, Text};
use wxdash_core::{
    AlertRequest, AlertService, Config, ForecastProvider, Frequency, KNOWN_CONDITIONS, Notifier,
    NotifierKind, SourceId, notifier_from_config,
    provider::{default_provider_from_config, provider_from_config},
};

use crate::dashboard::{self, Dashboard, Notice};
use crate::view;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "wxdash", version, about = "Weather dashboard and alert sign-up")]
pub struct Cli {
    /// Use this config file instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively set location, data source, API key and notifier.
    Configure,

    /// Print current conditions and the 5-day forecast once.
    Show {
        /// Data source override: "weatherapi" or "mock".
        #[arg(long)]
        source: Option<String>,

        /// Print the snapshot as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Interactive dashboard with refresh and alert forms.
    Dashboard {
        /// Data source override: "weatherapi" or "mock".
        #[arg(long)]
        source: Option<String>,
    },

    /// Subscribe to weather alerts.
    Subscribe {
        #[arg(long, default_value = "")]
        email: String,

        #[arg(long, value_enum, default_value_t = FrequencyArg::Daily)]
        frequency: FrequencyArg,

        /// Condition to be alerted about; repeatable.
        #[arg(long = "condition", default_values_t = vec!["extreme".to_string()])]
        conditions: Vec<String>,

        /// Phone number for SMS alerts.
        #[arg(long)]
        phone: Option<String>,
    },

    /// Receive a daily weather update at 7:00 AM.
    DailyAlert {
        #[arg(long, default_value = "")]
        email: String,

        #[arg(long)]
        phone: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FrequencyArg {
    Daily,
    Weekly,
}

impl From<FrequencyArg> for Frequency {
    fn from(value: FrequencyArg) -> Self {
        match value {
            FrequencyArg::Daily => Frequency::Daily,
            FrequencyArg::Weekly => Frequency::Weekly,
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };

        match self.command {
            Command::Configure => configure(config, self.config),
            Command::Show { source, json } => show(&config, source.as_deref(), json).await,
            Command::Dashboard { source } => run_dashboard(&config, source.as_deref()).await,
            Command::Subscribe { email, frequency, conditions, phone } => {
                let alerts = alert_service(&config)?;
                let request = AlertRequest::new(email, frequency.into(), conditions, phone);
                println!("Subscribing...");
                finish(dashboard::subscribe(&alerts, &request).await)
            }
            Command::DailyAlert { email, phone } => {
                let alerts = alert_service(&config)?;
                println!("Activating daily alerts...");
                finish(dashboard::daily_alert(&alerts, &email, phone).await)
            }
        }
    }
}

/// Print the notice and turn error notices into a failing exit status.
fn finish(notice: Notice) -> anyhow::Result<()> {
    println!("{}", view::render_notice(&notice));
    if notice.is_error() {
        return Err(anyhow!("{}", notice.title));
    }
    Ok(())
}

fn resolve_provider(
    config: &Config,
    source: Option<&str>,
) -> anyhow::Result<Box<dyn ForecastProvider>> {
    let provider = match source {
        Some(s) => {
            let id = SourceId::try_from(s)?;
            provider_from_config(id, config).map_err(anyhow::Error::from)
        }
        None => default_provider_from_config(config),
    };

    provider.with_context(|| {
        let name = source.unwrap_or(config.source.as_str());
        format!("Could not set up data source '{name}'.\nHint: run `wxdash configure` first.")
    })
}

fn alert_service(config: &Config) -> anyhow::Result<AlertService<Box<dyn Notifier>>> {
    let notifier = notifier_from_config(&config.notifier, &config.location)
        .context("Could not set up alert notifier")?;
    Ok(AlertService::new(notifier, config.location.clone()))
}

/// A broken notifier only disables the alert forms; the forecast still loads.
fn dashboard_alerts(config: &Config) -> Result<AlertService<Box<dyn Notifier>>, Notice> {
    alert_service(config).map_err(|err| {
        tracing::warn!(error = %format!("{err:#}"), "alerts disabled");
        Notice::error("Alerts unavailable", format!("{err:#}"))
    })
}

fn dashboard_title(config: &Config) -> String {
    let place = config.location.split(',').next().unwrap_or_default().trim();
    format!("{place} Weather Alerts")
}

async fn show(config: &Config, source: Option<&str>, json: bool) -> anyhow::Result<()> {
    let provider = resolve_provider(config, source)?;

    if !json {
        println!("{}", view::render_current(&dashboard::Region::Loading));
    }

    let snapshot = provider.get_forecast().await.context("Error loading weather data")?;

    if json {
        let out = serde_json::to_string_pretty(&snapshot)
            .context("Failed to serialize forecast snapshot")?;
        println!("{out}");
    } else {
        let dash = Dashboard { forecast: dashboard::Region::Ready(snapshot) };
        print!("{}", view::render_dashboard(&dashboard_title(config), &dash));
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Refresh,
    Subscribe,
    DailyAlerts,
    Quit,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Refresh => "Refresh",
            Action::Subscribe => "Subscribe to alerts",
            Action::DailyAlerts => "Daily alerts (7:00 AM)",
            Action::Quit => "Quit",
        })
    }
}

async fn run_dashboard(config: &Config, source: Option<&str>) -> anyhow::Result<()> {
    let provider = resolve_provider(config, source)?;
    let alerts = dashboard_alerts(config);
    let title = dashboard_title(config);

    let mut dash = Dashboard::new();
    print!("{}", view::render_dashboard(&title, &dash));

    let mut notice = dash.load(provider.as_ref()).await;

    loop {
        print!("\n{}", view::render_dashboard(&title, &dash));
        if let Some(n) = notice.take() {
            println!("\n{}", view::render_notice(&n));
        }

        let actions = vec![Action::Refresh, Action::Subscribe, Action::DailyAlerts, Action::Quit];
        let action = match Select::new("What next?", actions).prompt() {
            Ok(action) => action,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(err) => return Err(err.into()),
        };

        notice = match action {
            Action::Refresh => {
                println!("Refreshing...");
                Some(dash.refresh(provider.as_ref()).await)
            }
            Action::Subscribe => match &alerts {
                Err(unavailable) => Some(unavailable.clone()),
                Ok(alerts) => match prompt_subscription()? {
                    Some(request) => {
                        println!("Subscribing...");
                        Some(dashboard::subscribe(alerts, &request).await)
                    }
                    None => None,
                },
            },
            Action::DailyAlerts => match &alerts {
                Err(unavailable) => Some(unavailable.clone()),
                Ok(alerts) => match prompt_daily_alert()? {
                    Some((email, phone)) => {
                        Some(dashboard::daily_alert(alerts, &email, phone).await)
                    }
                    None => None,
                },
            },
            Action::Quit => break,
        };
    }

    Ok(())
}

fn unless_blank(value: String) -> Option<String> {
    Some(value).filter(|v| !v.trim().is_empty())
}

/// Map Esc / Ctrl-C inside a form to "form dismissed".
fn dismissed<T>(result: Result<T, InquireError>) -> anyhow::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

#[derive(Debug, Clone, Copy)]
struct ConditionChoice {
    key: &'static str,
    label: &'static str,
}

impl fmt::Display for ConditionChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label)
    }
}

fn prompt_subscription() -> anyhow::Result<Option<AlertRequest>> {
    let defaults = AlertRequest::default();

    let email_prompt = Text::new("Email").with_placeholder("your.email@example.com");
    let Some(email) = dismissed(email_prompt.prompt())? else {
        return Ok(None);
    };
    let phone_prompt = Text::new("Phone (optional, for SMS alerts)").with_placeholder("+359 ...");
    let Some(phone) = dismissed(phone_prompt.prompt())? else {
        return Ok(None);
    };
    let Some(frequency) = dismissed(
        Select::new("Alert frequency", vec![FrequencyArg::Daily, FrequencyArg::Weekly]).prompt(),
    )?
    else {
        return Ok(None);
    };

    let choices: Vec<ConditionChoice> = KNOWN_CONDITIONS
        .iter()
        .map(|&(key, label)| ConditionChoice { key, label })
        .collect();
    let preselected: Vec<usize> = choices
        .iter()
        .enumerate()
        .filter(|(_, c)| defaults.conditions.contains(c.key))
        .map(|(i, _)| i)
        .collect();
    let Some(picked) =
        dismissed(MultiSelect::new("Alert me about", choices).with_default(&preselected).prompt())?
    else {
        return Ok(None);
    };

    Ok(Some(AlertRequest::new(
        email,
        frequency.into(),
        picked.into_iter().map(|c| c.key.to_string()),
        Some(phone),
    )))
}

impl fmt::Display for FrequencyArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FrequencyArg::Daily => "Daily",
            FrequencyArg::Weekly => "Weekly",
        })
    }
}

fn prompt_daily_alert() -> anyhow::Result<Option<(String, Option<String>)>> {
    let Some(email) =
        dismissed(Text::new("Email").with_placeholder("your-email@example.com").prompt())?
    else {
        return Ok(None);
    };
    let Some(phone) =
        dismissed(Text::new("Phone (optional)").with_placeholder("+35912345678").prompt())?
    else {
        return Ok(None);
    };
    Ok(Some((email, Some(phone))))
}

fn configure(mut config: Config, path: Option<PathBuf>) -> anyhow::Result<()> {
    config.location = Text::new("Location")
        .with_default(&config.location)
        .prompt()
        .context("Location prompt failed")?;

    let sources = SourceId::all().to_vec();
    let current = config.source_id().ok();
    let start = sources.iter().position(|s| Some(*s) == current).unwrap_or(0);
    let source = Select::new("Data source", sources)
        .with_starting_cursor(start)
        .prompt()
        .context("Source prompt failed")?;
    config.set_source(source);

    if source == SourceId::WeatherApi {
        let key = Password::new("WeatherAPI.com API key")
            .without_confirmation()
            .prompt()
            .context("API key prompt failed")?;
        if !key.trim().is_empty() {
            config.upsert_provider_api_key(source, key.trim().to_string());
        }
    }

    let kinds = vec![NotifierKindChoice(NotifierKind::Log), NotifierKindChoice(NotifierKind::Smtp)];
    let kind = Select::new("Alert delivery", kinds)
        .prompt()
        .context("Notifier prompt failed")?
        .0;
    config.notifier.kind = kind;

    if kind == NotifierKind::Smtp {
        let relay = Text::new("SMTP relay host").prompt()?;
        config.notifier.smtp_relay = unless_blank(relay);
        let username = Text::new("SMTP username (blank = no login)").prompt()?;
        config.notifier.smtp_username = unless_blank(username);
        let password = Password::new("SMTP password").without_confirmation().prompt()?;
        config.notifier.smtp_password = unless_blank(password);
        let from = Text::new("From address (blank = username)").prompt()?;
        config.notifier.from = unless_blank(from);
    }

    let saved_to = match path {
        Some(path) => {
            config.save_to(&path)?;
            path
        }
        None => config.save()?,
    };
    tracing::info!(path = %saved_to.display(), "configuration saved");
    println!("Saved configuration to {}", saved_to.display());

    Ok(())
}

struct NotifierKindChoice(NotifierKind);

impl fmt::Display for NotifierKindChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self.0 {
            NotifierKind::Log => "Log only (nothing is sent)",
            NotifierKind::Smtp => "Email via SMTP",
        })
    }
}
