/// Deployment configuration resolver
///
/// FolioLink runs in two deployment shapes: the hosted platform, where every
/// managed provider is configured, and self-hosted installs, where any subset
/// of Redis, Slack, email, the job queue, and the passkey tenant may be
/// absent. This module reads the environment once at startup and resolves
/// each optional provider to `Some(settings)` or `None`; consumers receive a
/// live or disabled capability built from that decision instead of probing
/// the environment themselves.
///
/// # Environment Variables
///
/// - `SELF_HOSTED`: "true" enables self-hosted mode (limits bypassed)
/// - `SESSION_SECRET`: session token signing key (required, >= 32 bytes)
/// - `VERIFICATION_SECRET`: link checksum key (falls back to SESSION_SECRET)
/// - `REDIS_URL` (+ tuning vars, see `redis::client`): temporary store and
///   rate limiter
/// - `SLACK_CLIENT_ID`, `SLACK_CLIENT_SECRET`, `SLACK_INTEGRATION_ID`
/// - `EMAIL_API_KEY`, `EMAIL_API_BASE_URL`, `EMAIL_FROM`, `EMAIL_AUDIENCE_ID`
/// - `QUEUE_TOKEN`, `QUEUE_API_BASE_URL`, `QUEUE_CURRENT_SIGNING_KEY`,
///   `QUEUE_NEXT_SIGNING_KEY`, `QUEUE_CALLBACK_URL`
/// - `PASSKEYS_API_KEY`, `PASSKEYS_TENANT_ID`, `PASSKEYS_API_BASE_URL`
/// - `BASE_URL`: public base URL used in generated links and emails
/// - `BETA_TEAMS`: comma-separated team ids enrolled in beta feature flags

use crate::email::mailer::EmailSettings;
use crate::passkeys::PasskeySettings;
use crate::queue::QueueSettings;
use crate::redis::client::RedisConfig;
use crate::slack::client::SlackSettings;
use std::env;

/// Resolved deployment configuration
///
/// Constructed once at process start; optional providers that are not
/// configured resolve to `None` and their capabilities run disabled.
#[derive(Debug, Clone)]
pub struct DeploymentConfig {
    /// Self-hosted mode: limit checks are bypassed and upgrade prompts
    /// suppressed
    pub self_hosted: bool,

    /// Public base URL for generated links
    pub base_url: String,

    /// Session token signing secret
    pub session_secret: String,

    /// Link checksum secret (falls back to the session secret)
    pub verification_secret: String,

    /// Team ids enrolled in beta feature flags
    pub beta_teams: Vec<String>,

    /// Redis settings, if configured
    pub redis: Option<RedisConfig>,

    /// Slack app settings, if configured
    pub slack: Option<SlackSettings>,

    /// Transactional email settings, if configured
    pub email: Option<EmailSettings>,

    /// Job queue settings, if configured
    pub queue: Option<QueueSettings>,

    /// Passkey tenant settings, if configured
    pub passkeys: Option<PasskeySettings>,
}

impl DeploymentConfig {
    /// Loads deployment configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if `SESSION_SECRET` is missing or too short, or if a
    /// configured provider's settings are malformed. A provider that is
    /// entirely absent is not an error.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let self_hosted = env::var("SELF_HOSTED")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let base_url =
            env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());

        let session_secret = env::var("SESSION_SECRET")
            .map_err(|_| anyhow::anyhow!("SESSION_SECRET environment variable is required"))?;

        if session_secret.len() < 32 {
            anyhow::bail!("SESSION_SECRET must be at least 32 characters long");
        }

        let verification_secret =
            env::var("VERIFICATION_SECRET").unwrap_or_else(|_| session_secret.clone());

        let beta_teams = env::var("BETA_TEAMS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            self_hosted,
            base_url,
            session_secret,
            verification_secret,
            beta_teams,
            redis: RedisConfig::from_env_optional()?,
            slack: SlackSettings::from_env_optional(),
            email: EmailSettings::from_env_optional(),
            queue: QueueSettings::from_env_optional(),
            passkeys: PasskeySettings::from_env_optional(),
        })
    }

    /// Whether a team is enrolled in beta feature flags
    pub fn is_beta_team(&self, team_id: &str) -> bool {
        self.beta_teams.iter().any(|t| t == team_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(beta: &[&str], self_hosted: bool) -> DeploymentConfig {
        DeploymentConfig {
            self_hosted,
            base_url: "http://localhost:8080".to_string(),
            session_secret: "test-secret-key-at-least-32-bytes-long".to_string(),
            verification_secret: "test-secret-key-at-least-32-bytes-long".to_string(),
            beta_teams: beta.iter().map(|s| s.to_string()).collect(),
            redis: None,
            slack: None,
            email: None,
            queue: None,
            passkeys: None,
        }
    }

    #[test]
    fn test_beta_team_membership() {
        let config = config_with(&["team_a", "team_b"], false);
        assert!(config.is_beta_team("team_a"));
        assert!(config.is_beta_team("team_b"));
        assert!(!config.is_beta_team("team_c"));
    }

    #[test]
    fn test_empty_beta_list() {
        let config = config_with(&[], true);
        assert!(!config.is_beta_team("team_a"));
        assert!(config.self_hosted);
    }
}
