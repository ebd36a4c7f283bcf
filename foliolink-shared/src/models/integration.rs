/// Installed integration model
///
/// One row per (team, integration) pair, created when a team completes an
/// integration's OAuth install. Credentials and per-integration
/// configuration are stored as JSONB; the typed views below decode the
/// Slack shape. The notification path only ever reads these rows; admin
/// settings mutate them.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE installed_integrations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     team_id UUID NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
///     integration_id VARCHAR(255) NOT NULL,
///     enabled BOOLEAN NOT NULL DEFAULT TRUE,
///     credentials JSONB NOT NULL DEFAULT '{}',
///     configuration JSONB NOT NULL DEFAULT '{}',
///     UNIQUE (team_id, integration_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

/// Installed integration row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct InstalledIntegration {
    /// Unique row ID
    pub id: Uuid,

    /// Owning team
    pub team_id: Uuid,

    /// Integration identifier (e.g. the Slack app's integration id)
    pub integration_id: String,

    /// Whether the integration is active for the team
    pub enabled: bool,

    /// OAuth credentials (JSONB)
    #[serde(skip_serializing)] // never expose tokens in API responses
    pub credentials: JsonValue,

    /// Integration-specific configuration (JSONB)
    pub configuration: JsonValue,

    /// When the integration was installed
    pub created_at: DateTime<Utc>,

    /// When the integration was last updated
    pub updated_at: DateTime<Utc>,
}

/// Slack credentials stored on install
///
/// Field names match the JSON written by the OAuth callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlackCredentials {
    /// Bot access token for the installed workspace
    pub access_token: String,
}

/// Per-channel notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlackChannelConfig {
    /// Whether notifications to this channel are on
    pub enabled: bool,

    /// Human-readable channel name, if known
    #[serde(default)]
    pub name: Option<String>,

    /// Event types this channel subscribes to (e.g. "document_view")
    #[serde(default)]
    pub notification_types: Vec<String>,
}

/// Slack configuration stored on the integration row
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlackIntegrationConfig {
    /// Channel id -> channel notification settings
    #[serde(default)]
    pub enabled_channels: HashMap<String, SlackChannelConfig>,
}

impl InstalledIntegration {
    /// Decodes the Slack credentials JSONB
    pub fn slack_credentials(&self) -> Result<SlackCredentials, serde_json::Error> {
        serde_json::from_value(self.credentials.clone())
    }

    /// Decodes the Slack configuration JSONB
    ///
    /// A missing or malformed configuration decodes to the empty default
    /// (no channels), which the dispatcher treats as "nothing to send".
    pub fn slack_configuration(&self) -> SlackIntegrationConfig {
        serde_json::from_value(self.configuration.clone()).unwrap_or_default()
    }

    /// Creates an integration row (OAuth install path)
    pub async fn create(
        pool: &PgPool,
        team_id: Uuid,
        integration_id: &str,
        credentials: JsonValue,
        configuration: JsonValue,
    ) -> Result<Self, sqlx::Error> {
        let integration = sqlx::query_as::<_, InstalledIntegration>(
            r#"
            INSERT INTO installed_integrations
                (team_id, integration_id, credentials, configuration)
            VALUES ($1, $2, $3, $4)
            RETURNING id, team_id, integration_id, enabled, credentials,
                      configuration, created_at, updated_at
            "#,
        )
        .bind(team_id)
        .bind(integration_id)
        .bind(credentials)
        .bind(configuration)
        .fetch_one(pool)
        .await?;

        Ok(integration)
    }

    /// Finds the integration row for a team
    pub async fn find_for_team(
        pool: &PgPool,
        team_id: Uuid,
        integration_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let integration = sqlx::query_as::<_, InstalledIntegration>(
            r#"
            SELECT id, team_id, integration_id, enabled, credentials,
                   configuration, created_at, updated_at
            FROM installed_integrations
            WHERE team_id = $1 AND integration_id = $2
            "#,
        )
        .bind(team_id)
        .bind(integration_id)
        .fetch_optional(pool)
        .await?;

        Ok(integration)
    }

    /// Toggles an integration on or off
    pub async fn set_enabled(
        pool: &PgPool,
        id: Uuid,
        enabled: bool,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE installed_integrations SET enabled = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(enabled)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replaces the configuration JSONB
    pub async fn update_configuration(
        pool: &PgPool,
        id: Uuid,
        configuration: JsonValue,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE installed_integrations SET configuration = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(configuration)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
