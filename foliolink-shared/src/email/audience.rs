/// Mailing-list audience membership
///
/// Keeps the product mailing list in sync with account email addresses:
/// the email-change flow unsubscribes the old address and subscribes the
/// new one. Membership changes are best-effort; the account mutation never
/// waits on them and never fails because of them.

use crate::email::mailer::{EmailSettings, MailError};

/// Mailing-list audience capability
#[derive(Clone)]
pub enum Audience {
    /// Provider-managed audience
    Live {
        /// HTTP client
        http: reqwest::Client,

        /// Provider settings (must carry an audience id)
        settings: EmailSettings,
    },

    /// No audience configured; membership calls are no-ops
    Disabled,
}

impl Audience {
    /// Builds the capability from optional provider settings
    ///
    /// Requires both a provider and an audience id; a provider without an
    /// audience id behaves as disabled.
    pub fn new(settings: Option<EmailSettings>) -> Self {
        match settings {
            Some(settings) if settings.audience_id.is_some() => Audience::Live {
                http: reqwest::Client::new(),
                settings,
            },
            _ => {
                tracing::info!("Mailing-list audience disabled");
                Audience::Disabled
            }
        }
    }

    /// Subscribes an address to the audience
    pub async fn subscribe(&self, email: &str) -> Result<(), MailError> {
        let (http, settings, audience_id) = match self {
            Audience::Live { http, settings } => (
                http,
                settings,
                settings.audience_id.as_deref().unwrap_or_default(),
            ),
            Audience::Disabled => return Ok(()),
        };

        let url = format!(
            "{}/audiences/{}/contacts",
            settings.api_base_url, audience_id
        );

        let response = http
            .post(&url)
            .bearer_auth(&settings.api_key)
            .json(&serde_json::json!({
                "email": email,
                "unsubscribed": false,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MailError::Api(status.as_u16()));
        }

        Ok(())
    }

    /// Unsubscribes an address from the audience
    pub async fn unsubscribe(&self, email: &str) -> Result<(), MailError> {
        let (http, settings, audience_id) = match self {
            Audience::Live { http, settings } => (
                http,
                settings,
                settings.audience_id.as_deref().unwrap_or_default(),
            ),
            Audience::Disabled => return Ok(()),
        };

        let url = format!(
            "{}/audiences/{}/contacts/{}",
            settings.api_base_url, audience_id, email
        );

        let response = http
            .patch(&url)
            .bearer_auth(&settings.api_key)
            .json(&serde_json::json!({
                "unsubscribed": true,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MailError::Api(status.as_u16()));
        }

        Ok(())
    }
}
