/// Slack Web API client
///
/// Minimal client for the one call the notification path needs:
/// chat.postMessage with a workspace access token. Slack reports most
/// failures inside a 200 response (`"ok": false` plus an error code), so
/// the response body is checked, not just the status.

use crate::slack::templates::SlackMessage;
use serde::Deserialize;
use std::env;
use thiserror::Error;

/// Default Slack API base URL
const DEFAULT_API_BASE_URL: &str = "https://slack.com/api";

/// Slack app settings from the environment
#[derive(Debug, Clone)]
pub struct SlackSettings {
    /// OAuth client id
    pub client_id: String,

    /// OAuth client secret
    pub client_secret: String,

    /// Integration id under which installs are recorded
    pub integration_id: String,

    /// API base URL (overridable for tests)
    pub api_base_url: String,
}

impl SlackSettings {
    /// Reads settings from the environment; None if the app is not
    /// configured
    ///
    /// Requires `SLACK_CLIENT_ID`, `SLACK_CLIENT_SECRET`, and
    /// `SLACK_INTEGRATION_ID` together; a partial configuration counts as
    /// absent.
    pub fn from_env_optional() -> Option<Self> {
        let client_id = env::var("SLACK_CLIENT_ID").ok()?;
        let client_secret = env::var("SLACK_CLIENT_SECRET").ok()?;
        let integration_id = env::var("SLACK_INTEGRATION_ID").ok()?;

        let api_base_url = env::var("SLACK_API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());

        Some(Self {
            client_id,
            client_secret,
            integration_id,
            api_base_url,
        })
    }
}

/// Slack API error
#[derive(Debug, Error)]
pub enum SlackError {
    /// Transport-level failure
    #[error("Slack request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Slack rejected the call (`ok: false`)
    #[error("Slack API error: {0}")]
    Api(String),
}

/// Response envelope shared by Slack Web API methods
#[derive(Debug, Deserialize)]
struct SlackApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Slack Web API client
#[derive(Clone)]
pub struct SlackApi {
    http: reqwest::Client,
    base_url: String,
}

impl SlackApi {
    /// Creates a client from app settings
    pub fn new(settings: &SlackSettings) -> Self {
        SlackApi {
            http: reqwest::Client::new(),
            base_url: settings.api_base_url.clone(),
        }
    }

    /// Posts a message to a channel using a workspace access token
    ///
    /// # Errors
    ///
    /// Returns `SlackError::Api` when Slack answers `ok: false` (unknown
    /// channel, revoked token, app not in channel, ...) and
    /// `SlackError::Request` on transport failure.
    pub async fn post_message(
        &self,
        access_token: &str,
        channel_id: &str,
        message: &SlackMessage,
    ) -> Result<(), SlackError> {
        let url = format!("{}/chat.postMessage", self.base_url);

        let body = serde_json::json!({
            "channel": channel_id,
            "text": message.text,
            "blocks": message.blocks,
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await?;

        let envelope: SlackApiResponse = response.json().await?;

        if !envelope.ok {
            return Err(SlackError::Api(
                envelope.error.unwrap_or_else(|| "unknown_error".to_string()),
            ));
        }

        Ok(())
    }
}
