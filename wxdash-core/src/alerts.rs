//! Alert sign-up handling.
//!
//! Form input is validated here, then handed to a [`Notifier`] that
//! delivers a confirmation. Nothing is stored.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    Message, Transport, message::Mailbox, transport::smtp::SmtpTransport,
    transport::smtp::authentication::Credentials,
};

use crate::{
    config::{NotifierConfig, NotifierKind},
    error::{AlertError, NotifyError},
    model::{AlertRequest, DailyAlertRequest},
};

/// Delivery backend for alert confirmations.
#[async_trait]
pub trait Notifier: Send + Sync + Debug {
    async fn send_subscription_confirmation(&self, request: &AlertRequest)
    -> Result<(), NotifyError>;

    async fn send_daily_alert(&self, request: &DailyAlertRequest) -> Result<(), NotifyError>;
}

/// Validates form submissions and forwards them to a notifier.
#[derive(Debug)]
pub struct AlertService<N> {
    notifier: N,
    location: String,
}

impl<N: Notifier> AlertService<N> {
    pub fn new(notifier: N, location: impl Into<String>) -> Self {
        Self { notifier, location: location.into() }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub async fn submit_subscription(&self, request: &AlertRequest) -> Result<(), AlertError> {
        request.validate()?;

        tracing::info!(
            email = %request.email,
            frequency = %request.frequency,
            conditions = ?request.conditions,
            location = %self.location,
            "submitting alert subscription"
        );
        self.notifier.send_subscription_confirmation(request).await?;
        Ok(())
    }

    pub async fn submit_daily_alert(
        &self,
        email: &str,
        phone_number: Option<String>,
    ) -> Result<DailyAlertRequest, AlertError> {
        let request = DailyAlertRequest::new(email, phone_number);
        request.validate()?;

        tracing::info!(
            email = %request.email,
            send_at = %request.send_at.format("%H:%M"),
            location = %self.location,
            "setting up daily weather alerts"
        );
        self.notifier.send_daily_alert(&request).await?;
        Ok(request)
    }
}

#[async_trait]
impl<T: Notifier + ?Sized> Notifier for Box<T> {
    async fn send_subscription_confirmation(
        &self,
        request: &AlertRequest,
    ) -> Result<(), NotifyError> {
        (**self).send_subscription_confirmation(request).await
    }

    async fn send_daily_alert(&self, request: &DailyAlertRequest) -> Result<(), NotifyError> {
        (**self).send_daily_alert(request).await
    }
}

/// Logs requests instead of delivering them.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier {
    subscription_delay: Duration,
    daily_delay: Duration,
}

impl LogNotifier {
    pub fn new(subscription_delay: Duration, daily_delay: Duration) -> Self {
        Self { subscription_delay, daily_delay }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_subscription_confirmation(
        &self,
        request: &AlertRequest,
    ) -> Result<(), NotifyError> {
        tokio::time::sleep(self.subscription_delay).await;
        tracing::info!(
            email = %request.email,
            phone = ?request.phone_number,
            frequency = %request.frequency,
            conditions = ?request.conditions,
            "subscription recorded (log only, nothing sent)"
        );
        Ok(())
    }

    async fn send_daily_alert(&self, request: &DailyAlertRequest) -> Result<(), NotifyError> {
        tokio::time::sleep(self.daily_delay).await;
        tracing::info!(
            email = %request.email,
            phone = ?request.phone_number,
            schedule = %format!("Daily at {}", request.send_at.format("%-I:%M %p")),
            "daily alert recorded (log only, nothing sent)"
        );
        Ok(())
    }
}

/// Sends confirmation emails through an SMTP relay.
#[derive(Debug, Clone)]
pub struct SmtpNotifier {
    transport: SmtpTransport,
    from: Mailbox,
    location: String,
}

impl SmtpNotifier {
    pub fn new(
        relay: &str,
        credentials: Option<Credentials>,
        from: &str,
        location: impl Into<String>,
    ) -> Result<Self, NotifyError> {
        let mut builder = SmtpTransport::relay(relay)?;
        if let Some(credentials) = credentials {
            builder = builder.credentials(credentials);
        }

        Ok(Self {
            transport: builder.build(),
            from: parse_mailbox(from)?,
            location: location.into(),
        })
    }

    async fn deliver(&self, to: &str, subject: String, body: String) -> Result<(), NotifyError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(parse_mailbox(to)?)
            .subject(subject)
            .body(body)?;

        let transport = self.transport.clone();
        tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .map_err(|e| NotifyError::Task(e.to_string()))??;

        tracing::info!(to, "confirmation email sent");
        Ok(())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_subscription_confirmation(
        &self,
        request: &AlertRequest,
    ) -> Result<(), NotifyError> {
        if let Some(phone) = &request.phone_number {
            tracing::warn!(phone = %phone, "SMS delivery is not configured, skipping phone number");
        }

        let conditions: Vec<&str> = request.conditions.iter().map(String::as_str).collect();
        let body = format!(
            "You are subscribed to {} weather alerts for {}.\n\n\
             Alert me about: {}\n\n\
             You can unsubscribe at any time.",
            request.frequency,
            self.location,
            conditions.join(", "),
        );

        self.deliver(&request.email, format!("Weather alerts for {}", self.location), body)
            .await
    }

    async fn send_daily_alert(&self, request: &DailyAlertRequest) -> Result<(), NotifyError> {
        if let Some(phone) = &request.phone_number {
            tracing::warn!(phone = %phone, "SMS delivery is not configured, skipping phone number");
        }

        let body = format!(
            "Daily weather updates for {} are now active.\n\
             You will receive them every day at {}.",
            self.location,
            request.send_at.format("%-I:%M %p"),
        );

        self.deliver(&request.email, "Daily weather alerts activated".to_string(), body)
            .await
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address.parse().map_err(|e: lettre::address::AddressError| NotifyError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// Blank strings left by the interactive setup count as unset.
fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// AUTH is only attempted when both username and password are given.
fn smtp_credentials(config: &NotifierConfig) -> Option<Credentials> {
    match (non_blank(&config.smtp_username), config.smtp_password.as_deref()) {
        (Some(user), Some(pass)) if !pass.is_empty() => {
            Some(Credentials::new(user.to_string(), pass.to_string()))
        }
        _ => None,
    }
}

/// Build the notifier selected in config.
pub fn notifier_from_config(
    config: &NotifierConfig,
    location: &str,
) -> Result<Box<dyn Notifier>, NotifyError> {
    let boxed: Box<dyn Notifier> = match config.kind {
        NotifierKind::Log => Box::new(LogNotifier::new(
            Duration::from_millis(config.subscription_delay_ms),
            Duration::from_millis(config.daily_delay_ms),
        )),
        NotifierKind::Smtp => {
            let relay = non_blank(&config.smtp_relay)
                .ok_or_else(|| NotifyError::Config("smtp_relay is not set".into()))?;
            let from = non_blank(&config.from)
                .or(non_blank(&config.smtp_username))
                .ok_or_else(|| NotifyError::Config("from address is not set".into()))?;
            Box::new(SmtpNotifier::new(relay, smtp_credentials(config), from, location)?)
        }
    };

    Ok(boxed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::model::Frequency;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct RecordingNotifier {
        subscriptions: Mutex<Vec<AlertRequest>>,
        daily: Mutex<Vec<DailyAlertRequest>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send_subscription_confirmation(
            &self,
            request: &AlertRequest,
        ) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::Config("down".into()));
            }
            self.subscriptions.lock().unwrap().push(request.clone());
            Ok(())
        }

        async fn send_daily_alert(&self, request: &DailyAlertRequest) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::Config("down".into()));
            }
            self.daily.lock().unwrap().push(request.clone());
            Ok(())
        }
    }

    fn service() -> AlertService<RecordingNotifier> {
        AlertService::new(RecordingNotifier::default(), "Krumovgrad,Bulgaria")
    }

    #[tokio::test]
    async fn empty_email_never_reaches_notifier() {
        let svc = service();
        let req = AlertRequest::new("", Frequency::Daily, ["rain".to_string()], None);

        let err = svc.submit_subscription(&req).await.unwrap_err();

        assert!(matches!(err, AlertError::Validation(ValidationError::EmailRequired)));
        assert!(svc.notifier.subscriptions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn zero_conditions_rejected() {
        let svc = service();
        let req = AlertRequest::new("me@example.com", Frequency::Weekly, Vec::new(), None);

        let err = svc.submit_subscription(&req).await.unwrap_err();

        assert!(matches!(err, AlertError::Validation(ValidationError::NoConditions)));
        assert!(svc.notifier.subscriptions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn valid_subscription_is_forwarded() {
        let svc = service();
        let req = AlertRequest::new(
            "me@example.com",
            Frequency::Weekly,
            ["rain".to_string(), "extreme".to_string()],
            Some("+35912345678".into()),
        );

        svc.submit_subscription(&req).await.unwrap();

        let sent = svc.notifier.subscriptions.lock().unwrap();
        assert_eq!(sent.as_slice(), &[req]);
    }

    #[tokio::test]
    async fn daily_alert_requires_email() {
        let svc = service();
        let err = svc.submit_daily_alert("  ", None).await.unwrap_err();
        assert!(matches!(err, AlertError::Validation(ValidationError::EmailRequired)));
        assert!(svc.notifier.daily.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn daily_alert_is_forwarded() {
        let svc = service();
        let req = svc.submit_daily_alert("me@example.com", Some(String::new())).await.unwrap();

        assert_eq!(req.phone_number, None);
        assert_eq!(svc.notifier.daily.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn notifier_failure_is_surfaced() {
        let svc = AlertService::new(RecordingNotifier { fail: true, ..Default::default() }, "X");
        let req = AlertRequest::new("me@example.com", Frequency::Daily, ["rain".into()], None);

        let err = svc.submit_subscription(&req).await.unwrap_err();
        assert!(matches!(err, AlertError::Notify(_)));
    }

    #[tokio::test]
    async fn log_notifier_succeeds() {
        let notifier = LogNotifier::default();
        let req = AlertRequest::new("me@example.com", Frequency::Daily, ["rain".into()], None);
        notifier.send_subscription_confirmation(&req).await.unwrap();
        notifier.send_daily_alert(&DailyAlertRequest::new("me@example.com", None)).await.unwrap();
    }

    #[test]
    fn smtp_notifier_requires_relay() {
        let cfg = NotifierConfig { kind: NotifierKind::Smtp, ..NotifierConfig::default() };
        let err = notifier_from_config(&cfg, "X").unwrap_err();
        assert!(err.to_string().contains("smtp_relay"));
    }

    #[test]
    fn smtp_notifier_rejects_bad_from_address() {
        let cfg = NotifierConfig {
            kind: NotifierKind::Smtp,
            smtp_relay: Some("smtp.example.com".into()),
            from: Some("not an address".into()),
            ..NotifierConfig::default()
        };
        let err = notifier_from_config(&cfg, "X").unwrap_err();
        assert!(matches!(err, NotifyError::Address { .. }));
    }

    #[test]
    fn blank_smtp_login_attaches_no_credentials() {
        let cfg = NotifierConfig {
            kind: NotifierKind::Smtp,
            smtp_relay: Some("smtp.example.com".into()),
            smtp_username: Some(String::new()),
            smtp_password: Some(String::new()),
            from: Some("alerts@example.com".into()),
            ..NotifierConfig::default()
        };
        assert!(smtp_credentials(&cfg).is_none());
        assert!(notifier_from_config(&cfg, "X").is_ok());

        let with_login = NotifierConfig {
            smtp_username: Some("user".into()),
            smtp_password: Some("secret".into()),
            ..cfg
        };
        assert!(smtp_credentials(&with_login).is_some());
    }

    #[test]
    fn blank_smtp_relay_counts_as_missing() {
        let cfg = NotifierConfig {
            kind: NotifierKind::Smtp,
            smtp_relay: Some("  ".into()),
            from: Some("alerts@example.com".into()),
            ..NotifierConfig::default()
        };
        let err = notifier_from_config(&cfg, "X").unwrap_err();
        assert!(err.to_string().contains("smtp_relay is not set"));
    }

    #[test]
    fn log_notifier_is_default() {
        assert!(notifier_from_config(&NotifierConfig::default(), "X").is_ok());
    }
}
