/// Hosted passkey tenant adapter
///
/// Passkey (WebAuthn) ceremonies are delegated to a hosted tenant service;
/// this adapter only initializes ceremonies and reports whether the feature
/// is configured. Installs without a tenant run with passkeys disabled and
/// the endpoint answers "not configured" instead of erroring at startup.

use serde::Serialize;
use std::env;
use thiserror::Error;

/// Default passkey tenant API base URL
const DEFAULT_API_BASE_URL: &str = "https://passkeys.hanko.io";

/// Passkey tenant settings from the environment
#[derive(Debug, Clone)]
pub struct PasskeySettings {
    /// Tenant API key
    pub api_key: String,

    /// Tenant id
    pub tenant_id: String,

    /// API base URL (overridable for tests)
    pub api_base_url: String,
}

impl PasskeySettings {
    /// Reads settings from the environment; None if no tenant configured
    ///
    /// Requires both `PASSKEYS_API_KEY` and `PASSKEYS_TENANT_ID`.
    pub fn from_env_optional() -> Option<Self> {
        let api_key = env::var("PASSKEYS_API_KEY").ok()?;
        let tenant_id = env::var("PASSKEYS_TENANT_ID").ok()?;

        let api_base_url = env::var("PASSKEYS_API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());

        Some(Self {
            api_key,
            tenant_id,
            api_base_url,
        })
    }
}

/// Passkey adapter error
#[derive(Debug, Error)]
pub enum PasskeyError {
    /// No tenant configured in this deployment
    #[error("Passkey tenant is not configured")]
    NotConfigured,

    /// Transport-level failure
    #[error("Passkey request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Tenant API rejected the call
    #[error("Passkey API error: status {0}")]
    Api(u16),
}

/// Registration initialization request body
#[derive(Debug, Serialize)]
struct RegistrationInput<'a> {
    user_id: &'a str,
    username: &'a str,
}

/// Passkey tenant capability
#[derive(Clone)]
pub enum PasskeyBackend {
    /// Hosted tenant
    Live {
        /// HTTP client
        http: reqwest::Client,

        /// Tenant settings
        settings: PasskeySettings,
    },

    /// No tenant configured
    Disabled,
}

impl PasskeyBackend {
    /// Builds the capability from optional tenant settings
    pub fn new(settings: Option<PasskeySettings>) -> Self {
        match settings {
            Some(settings) => PasskeyBackend::Live {
                http: reqwest::Client::new(),
                settings,
            },
            None => {
                tracing::info!("Passkeys disabled (tenant not configured)");
                PasskeyBackend::Disabled
            }
        }
    }

    /// Whether a tenant is configured
    pub fn is_configured(&self) -> bool {
        matches!(self, PasskeyBackend::Live { .. })
    }

    /// Initializes a passkey registration ceremony
    ///
    /// Returns the WebAuthn creation options produced by the tenant, passed
    /// through to the browser untouched.
    pub async fn start_registration(
        &self,
        user_id: &str,
        username: &str,
    ) -> Result<serde_json::Value, PasskeyError> {
        let (http, settings) = match self {
            PasskeyBackend::Live { http, settings } => (http, settings),
            PasskeyBackend::Disabled => return Err(PasskeyError::NotConfigured),
        };

        let url = format!(
            "{}/{}/registration/initialize",
            settings.api_base_url, settings.tenant_id
        );

        let response = http
            .post(&url)
            .header("apiKey", &settings.api_key)
            .json(&RegistrationInput { user_id, username })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PasskeyError::Api(status.as_u16()));
        }

        Ok(response.json().await?)
    }
}
