/// Plan-limit evaluation for teams
///
/// Combines a team's effective plan limits with a live usage snapshot to
/// compute capability flags: can the team add another document, link, or
/// member, and should the UI push an upgrade prompt. Self-hosted installs
/// bypass every check and never see upgrade prompts.
///
/// The usage snapshot and the limit read are two separate queries with no
/// transaction between them; a concurrent insert can land between the count
/// and the check. The flags are advisory gates for the UI and request
/// handlers, not a hard quota.
///
/// # Upgrade prompt policy
///
/// The modal is shown when the team is on the free tier outside a trial, or
/// when a trial has already consumed its member seats.

use crate::models::team::{PlanInfo, PlanLimits, Team, TeamUsage};
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

/// Limit evaluation error
#[derive(Debug, Error)]
pub enum LimitError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Team not found
    #[error("Team not found: {0}")]
    TeamNotFound(Uuid),
}

/// Evaluated capability flags for a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LimitFlags {
    /// Whether another document can be added
    pub can_add_documents: bool,

    /// Whether another link can be created
    pub can_add_links: bool,

    /// Whether another member can be invited
    pub can_add_users: bool,

    /// Whether the UI should push the upgrade-plan modal
    pub show_upgrade_plan_modal: bool,
}

/// Evaluates capability flags from plan, limits, and usage
///
/// An absent limit means unlimited, so the flag is true regardless of usage.
/// `self_hosted` forces all three add-flags true and suppresses the upgrade
/// modal, independent of every other input.
pub fn evaluate(
    plan: PlanInfo,
    limits: &PlanLimits,
    usage: &TeamUsage,
    self_hosted: bool,
) -> LimitFlags {
    if self_hosted {
        return LimitFlags {
            can_add_documents: true,
            can_add_links: true,
            can_add_users: true,
            show_upgrade_plan_modal: false,
        };
    }

    let can_add_documents = limits
        .documents
        .map(|limit| usage.documents < limit)
        .unwrap_or(true);
    let can_add_links = limits
        .links
        .map(|limit| usage.links < limit)
        .unwrap_or(true);
    let can_add_users = limits
        .users
        .map(|limit| usage.users < limit)
        .unwrap_or(true);

    let show_upgrade_plan_modal =
        (plan.is_free() && !plan.trial) || (plan.trial && !can_add_users);

    LimitFlags {
        can_add_documents,
        can_add_links,
        can_add_users,
        show_upgrade_plan_modal,
    }
}

/// Resolved limits for a team: plan, effective limits, usage, and flags
#[derive(Debug, Clone, Serialize)]
pub struct TeamLimits {
    /// Raw plan string
    pub plan: String,

    /// Whether the team is in a trial
    pub trial: bool,

    /// Effective limits (plan defaults + overrides)
    pub limits: PlanLimits,

    /// Live usage snapshot
    pub usage: TeamUsage,

    /// Evaluated capability flags
    #[serde(flatten)]
    pub flags: LimitFlags,
}

/// Limit evaluation service
///
/// Loads the team, derives effective limits, counts usage, and evaluates
/// the flags. Injected into the API state at startup.
#[derive(Clone)]
pub struct LimitEvaluator {
    db: PgPool,
    self_hosted: bool,
}

impl LimitEvaluator {
    /// Creates a new limit evaluator
    pub fn new(db: PgPool, self_hosted: bool) -> Self {
        LimitEvaluator { db, self_hosted }
    }

    /// Resolves limits, usage, and flags for a team
    ///
    /// # Errors
    ///
    /// Returns `LimitError::TeamNotFound` when the team does not exist, or a
    /// database error from either query.
    pub async fn resolve(&self, team_id: Uuid) -> Result<TeamLimits, LimitError> {
        let team = Team::find_by_id(&self.db, team_id)
            .await?
            .ok_or(LimitError::TeamNotFound(team_id))?;

        let plan = team.plan_info();
        let limits = team.effective_limits();
        let usage = Team::count_usage(&self.db, team_id).await?;
        let flags = evaluate(plan, &limits, &usage, self.self_hosted);

        Ok(TeamLimits {
            plan: team.plan,
            trial: plan.trial,
            limits,
            usage,
            flags,
        })
    }

    /// Convenience check for the invite path
    pub async fn can_add_users(&self, team_id: Uuid) -> Result<bool, LimitError> {
        Ok(self.resolve(team_id).await?.flags.can_add_users)
    }
}
