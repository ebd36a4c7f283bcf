/// Slack event notification dispatcher
///
/// Translates document activity (views, downloads, dataroom access) into
/// Slack messages for the channels a team has opted into. The whole path is
/// fail-silent: every early exit and every delivery failure is logged and
/// swallowed, because a Slack hiccup must never fail the business action
/// that produced the event.
///
/// Dispatch rules:
/// - No Slack app configured, no integration row for the team, or the
///   integration toggled off -> zero sends, no error.
/// - A channel is a candidate iff it is enabled AND subscribes to the
///   event's type.
/// - Channels are attempted independently; one failure does not stop the
///   rest. No retries, no rollback.

use crate::models::integration::{InstalledIntegration, SlackChannelConfig, SlackIntegrationConfig};
use crate::slack::client::{SlackApi, SlackSettings};
use crate::slack::templates;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Document activity event types that can notify Slack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlackEventType {
    /// A document was viewed through a shared link
    DocumentView,

    /// A dataroom was accessed
    DataroomAccess,

    /// A document was downloaded
    DocumentDownload,
}

impl SlackEventType {
    /// Wire name used in channel subscription lists
    pub fn as_str(&self) -> &'static str {
        match self {
            SlackEventType::DocumentView => "document_view",
            SlackEventType::DataroomAccess => "dataroom_access",
            SlackEventType::DocumentDownload => "document_download",
        }
    }
}

/// Event payload fields shared by all event types
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlackEventPayload {
    /// Document id, if the event concerns a document
    #[serde(default)]
    pub document_id: Option<String>,

    /// Document display name
    #[serde(default)]
    pub document_name: Option<String>,

    /// Dataroom id, if the event concerns a dataroom
    #[serde(default)]
    pub dataroom_id: Option<String>,

    /// Dataroom display name
    #[serde(default)]
    pub dataroom_name: Option<String>,

    /// Share link id that produced the event
    #[serde(default)]
    pub link_id: Option<String>,

    /// Viewer's email, when the link captured one
    #[serde(default)]
    pub viewer_email: Option<String>,
}

/// A fully-typed event: team, type, payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlackEventData {
    /// Team whose integration should be notified
    pub team_id: Uuid,

    /// Event type
    pub event_type: SlackEventType,

    /// Event payload
    #[serde(flatten)]
    pub payload: SlackEventPayload,
}

/// Computes the candidate channels for an event
///
/// A channel is selected iff `enabled` is true and the event type appears in
/// its subscription list. Pure so the filtering contract is testable without
/// a database.
pub fn notification_channels(
    config: &SlackIntegrationConfig,
    event_type: SlackEventType,
) -> Vec<(String, SlackChannelConfig)> {
    config
        .enabled_channels
        .iter()
        .filter(|(_, channel)| {
            channel.enabled
                && channel
                    .notification_types
                    .iter()
                    .any(|t| t == event_type.as_str())
        })
        .map(|(id, channel)| (id.clone(), channel.clone()))
        .collect()
}

/// Slack notification dispatcher capability
#[derive(Clone)]
pub enum SlackNotifier {
    /// App configured; events resolve against installed integrations
    Live {
        /// Slack Web API client
        api: SlackApi,

        /// Database pool for integration lookups
        db: PgPool,

        /// Integration id installs are recorded under
        integration_id: String,
    },

    /// Slack app not configured in this deployment
    Disabled,
}

impl SlackNotifier {
    /// Builds the capability from optional app settings
    pub fn new(settings: Option<&SlackSettings>, db: PgPool) -> Self {
        match settings {
            Some(settings) => SlackNotifier::Live {
                api: SlackApi::new(settings),
                db,
                integration_id: settings.integration_id.clone(),
            },
            None => {
                tracing::info!("Slack notifications disabled (app not configured)");
                SlackNotifier::Disabled
            }
        }
    }

    /// Processes an event end to end
    ///
    /// Never returns an error: every failure mode is logged and swallowed so
    /// the triggering business action is unaffected.
    pub async fn process_event(&self, event: &SlackEventData) {
        let (api, db, integration_id) = match self {
            SlackNotifier::Live {
                api,
                db,
                integration_id,
            } => (api, db, integration_id),
            SlackNotifier::Disabled => return,
        };

        let integration =
            match InstalledIntegration::find_for_team(db, event.team_id, integration_id).await {
                Ok(Some(integration)) => integration,
                Ok(None) => {
                    tracing::debug!(team_id = %event.team_id, "No Slack integration installed");
                    return;
                }
                Err(e) => {
                    tracing::error!(team_id = %event.team_id, error = %e, "Failed to load Slack integration");
                    return;
                }
            };

        if !integration.enabled {
            tracing::debug!(team_id = %event.team_id, "Slack integration disabled for team");
            return;
        }

        let credentials = match integration.slack_credentials() {
            Ok(credentials) => credentials,
            Err(e) => {
                tracing::error!(team_id = %event.team_id, error = %e, "Malformed Slack credentials");
                return;
            }
        };

        let config = integration.slack_configuration();
        let channels = notification_channels(&config, event.event_type);

        if channels.is_empty() {
            return;
        }

        let message = templates::build_message(event);

        for (channel_id, channel) in channels {
            if let Err(e) = api
                .post_message(&credentials.access_token, &channel_id, &message)
                .await
            {
                let channel_name = channel.name.as_deref().unwrap_or(&channel_id);
                tracing::error!(
                    team_id = %event.team_id,
                    channel = channel_name,
                    error = %e,
                    "Failed to deliver Slack notification"
                );
            }
        }
    }

    /// Notifies a document view
    pub async fn notify_document_view(&self, team_id: Uuid, payload: SlackEventPayload) {
        self.process_event(&SlackEventData {
            team_id,
            event_type: SlackEventType::DocumentView,
            payload,
        })
        .await;
    }

    /// Notifies a dataroom access
    pub async fn notify_dataroom_access(&self, team_id: Uuid, payload: SlackEventPayload) {
        self.process_event(&SlackEventData {
            team_id,
            event_type: SlackEventType::DataroomAccess,
            payload,
        })
        .await;
    }

    /// Notifies a document download
    pub async fn notify_document_download(&self, team_id: Uuid, payload: SlackEventPayload) {
        self.process_event(&SlackEventData {
            team_id,
            event_type: SlackEventType::DocumentDownload,
            payload,
        })
        .await;
    }
}
