/// Team limits endpoint
///
/// Returns a team's plan, effective limits, live usage snapshot, and the
/// evaluated capability flags the client uses to gate add-document /
/// add-link / invite actions.
///
/// # Endpoint
///
/// ```text
/// GET /api/teams/:team_id/limits
/// ```
///
/// # Response
///
/// ```json
/// {
///   "plan": "pro",
///   "trial": false,
///   "limits": { "documents": 500, "links": null, "users": 5 },
///   "usage": { "documents": 12, "links": 40, "users": 3 },
///   "can_add_documents": true,
///   "can_add_links": true,
///   "can_add_users": true,
///   "show_upgrade_plan_modal": false
/// }
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    Json,
};
use foliolink_shared::limits::TeamLimits;
use uuid::Uuid;

/// Team limits handler
///
/// 404 for an unknown team; the usage snapshot is advisory (see the limit
/// evaluator's consistency notes).
pub async fn team_limits(
    State(state): State<AppState>,
    Path(team_id): Path<Uuid>,
) -> ApiResult<Json<TeamLimits>> {
    let limits = state.services.limits.resolve(team_id).await?;
    Ok(Json(limits))
}
