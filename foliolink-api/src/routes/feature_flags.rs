/// Feature flags endpoint
///
/// Returns the feature map a client should render: capability-derived flags
/// (is email change possible in this deployment, are passkeys configured)
/// merged with beta features rolled out to specific teams.
///
/// # Endpoint
///
/// ```text
/// GET /api/feature-flags?teamId=<id>
/// ```
///
/// teamId is optional; without it only deployment-level flags are set.

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

/// Query parameters
#[derive(Debug, Deserialize)]
pub struct FeatureFlagsQuery {
    /// Team to resolve beta flags for
    #[serde(rename = "teamId")]
    pub team_id: Option<String>,
}

/// Feature-flag map returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Passkey login available
    pub passkeys: bool,

    /// Email-change flow available (requires the temporary store)
    pub email_change: bool,

    /// Slack integration available
    pub slack_integration: bool,

    /// Beta: dataroom uploads
    pub dataroom_upload: bool,

    /// Beta: incoming webhooks
    pub incoming_webhooks: bool,
}

/// Computes the flag map for an optional team
///
/// Deployment-level flags come from which capabilities are configured;
/// beta flags require the team to be enrolled.
pub fn resolve_flags(state: &AppState, team_id: Option<&str>) -> FeatureFlags {
    let beta = team_id
        .map(|id| state.deployment.is_beta_team(id))
        .unwrap_or(false);

    FeatureFlags {
        passkeys: state.services.passkeys.is_configured(),
        email_change: state.services.store.is_enabled(),
        slack_integration: state.deployment.slack.is_some(),
        dataroom_upload: beta,
        incoming_webhooks: beta,
    }
}

/// Feature flags handler
pub async fn feature_flags(
    State(state): State<AppState>,
    Query(query): Query<FeatureFlagsQuery>,
) -> ApiResult<Json<FeatureFlags>> {
    let flags = resolve_flags(&state, query.team_id.as_deref());
    Ok(Json(flags))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_accepts_camel_case_team_id() {
        let query: FeatureFlagsQuery =
            serde_urlencoded::from_str("teamId=team_123").unwrap();
        assert_eq!(query.team_id.as_deref(), Some("team_123"));

        let query: FeatureFlagsQuery = serde_urlencoded::from_str("").unwrap();
        assert!(query.team_id.is_none());
    }

    #[test]
    fn test_flags_serialize_shape() {
        let flags = FeatureFlags {
            passkeys: true,
            email_change: false,
            slack_integration: true,
            dataroom_upload: false,
            incoming_webhooks: false,
        };

        let value = serde_json::to_value(&flags).unwrap();
        assert_eq!(value["passkeys"], true);
        assert_eq!(value["email_change"], false);
    }
}
