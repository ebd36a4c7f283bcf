/// Transactional email sending
///
/// Thin client for an HTTP email API (POST /emails with a bearer key).
/// Email is a side effect everywhere it is used in this tier, so callers
/// treat send failures as log-and-continue; the error type exists so call
/// sites can decide, not so failures propagate into business flows.

use serde::Serialize;
use std::env;
use thiserror::Error;

/// Default email API base URL
const DEFAULT_API_BASE_URL: &str = "https://api.resend.com";

/// Default sender address
const DEFAULT_FROM: &str = "FolioLink <system@foliolink.io>";

/// Email provider settings from the environment
#[derive(Debug, Clone)]
pub struct EmailSettings {
    /// API key
    pub api_key: String,

    /// API base URL (overridable for tests)
    pub api_base_url: String,

    /// Sender address for system mail
    pub from: String,

    /// Mailing-list audience id, if list membership is managed
    pub audience_id: Option<String>,
}

impl EmailSettings {
    /// Reads settings from the environment; None if no provider configured
    pub fn from_env_optional() -> Option<Self> {
        let api_key = env::var("EMAIL_API_KEY").ok()?;

        let api_base_url = env::var("EMAIL_API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let from = env::var("EMAIL_FROM").unwrap_or_else(|_| DEFAULT_FROM.to_string());
        let audience_id = env::var("EMAIL_AUDIENCE_ID").ok();

        Some(Self {
            api_key,
            api_base_url,
            from,
            audience_id,
        })
    }
}

/// Mailer error
#[derive(Debug, Error)]
pub enum MailError {
    /// Transport-level failure
    #[error("Email request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Provider rejected the call
    #[error("Email API error: status {0}")]
    Api(u16),
}

/// An email ready to send
#[derive(Debug, Clone, Serialize)]
pub struct Email {
    /// Recipient address
    pub to: String,

    /// Subject line
    pub subject: String,

    /// HTML body
    pub html: String,

    /// Plain-text body
    pub text: String,
}

/// Transactional mailer capability
#[derive(Clone)]
pub enum Mailer {
    /// HTTP email provider
    Live {
        /// HTTP client
        http: reqwest::Client,

        /// Provider settings
        settings: EmailSettings,
    },

    /// No provider configured; sends are logged instead
    Disabled,
}

impl Mailer {
    /// Builds the capability from optional provider settings
    pub fn new(settings: Option<EmailSettings>) -> Self {
        match settings {
            Some(settings) => Mailer::Live {
                http: reqwest::Client::new(),
                settings,
            },
            None => {
                tracing::info!("Transactional email disabled (provider not configured)");
                Mailer::Disabled
            }
        }
    }

    /// Whether a provider is configured
    pub fn is_enabled(&self) -> bool {
        matches!(self, Mailer::Live { .. })
    }

    /// Sends an email
    ///
    /// The disabled variant logs the message and succeeds, so self-hosted
    /// installs without email still complete every flow.
    pub async fn send(&self, email: &Email) -> Result<(), MailError> {
        let (http, settings) = match self {
            Mailer::Live { http, settings } => (http, settings),
            Mailer::Disabled => {
                tracing::info!(
                    to = %email.to,
                    subject = %email.subject,
                    body = %email.text,
                    "Email provider not configured; logging message instead of sending"
                );
                return Ok(());
            }
        };

        let url = format!("{}/emails", settings.api_base_url);

        let body = serde_json::json!({
            "from": settings.from,
            "to": email.to,
            "subject": email.subject,
            "html": email.html,
            "text": email.text,
        });

        let response = http
            .post(&url)
            .bearer_auth(&settings.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MailError::Api(status.as_u16()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_mailer_succeeds() {
        let mailer = Mailer::new(None);
        assert!(!mailer.is_enabled());

        let email = Email {
            to: "user@example.com".to_string(),
            subject: "Test".to_string(),
            html: "<p>hi</p>".to_string(),
            text: "hi".to_string(),
        };

        assert!(mailer.send(&email).await.is_ok());
    }
}
