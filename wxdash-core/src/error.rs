//! Error types shared by the provider and alert layers.

use thiserror::Error;

/// Failure to obtain a forecast snapshot.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("No API key configured for source '{0}'")]
    MissingApiKey(String),

    #[error("Request to weather service failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Weather API error: {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse weather payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid forecast payload: {0}")]
    Invalid(String),
}

impl FetchError {
    /// Short message suitable for a notification body.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingApiKey(source) => {
                format!("Run `wxdash configure` to set an API key for {source}")
            }
            Self::Network(_) => "Network error. Check your connection.".to_string(),
            Self::Status { status: 401 | 403, .. } => {
                "The weather service rejected the API key".to_string()
            }
            Self::Status { .. } | Self::Decode(_) | Self::Invalid(_) => {
                "Please try again later".to_string()
            }
        }
    }
}

/// Required-field checks on the alert forms.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Email required")]
    EmailRequired,

    #[error("Select at least one weather condition")]
    NoConditions,
}

impl ValidationError {
    pub fn title(&self) -> &'static str {
        match self {
            Self::EmailRequired => "Email required",
            Self::NoConditions => "Select conditions",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EmailRequired => "Please enter your email address",
            Self::NoConditions => "Please select at least one weather condition",
        }
    }
}

/// Failure reported by a notification backend.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Invalid address '{address}': {reason}")]
    Address { address: String, reason: String },

    #[error("Failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP delivery failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Notifier is misconfigured: {0}")]
    Config(String),

    #[error("Delivery task failed: {0}")]
    Task(String),
}

/// Outcome of submitting one of the alert forms.
#[derive(Error, Debug)]
pub enum AlertError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Notification failed: {0}")]
    Notify(#[from] NotifyError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_mentions_code() {
        let err = FetchError::Status { status: 500, body: "boom".into() };
        assert!(err.to_string().contains("500"));
        assert_eq!(err.user_message(), "Please try again later");
    }

    #[test]
    fn rejected_key_has_specific_message() {
        let err = FetchError::Status { status: 403, body: String::new() };
        assert!(err.user_message().contains("API key"));
    }

    #[test]
    fn validation_titles_match_form_toasts() {
        assert_eq!(ValidationError::EmailRequired.title(), "Email required");
        assert_eq!(ValidationError::NoConditions.title(), "Select conditions");
        assert!(ValidationError::NoConditions.user_message().contains("at least one"));
    }

    #[test]
    fn alert_error_is_transparent_for_validation() {
        let err = AlertError::from(ValidationError::EmailRequired);
        assert_eq!(err.to_string(), "Email required");
    }
}
