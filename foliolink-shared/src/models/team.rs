/// Team model, billing plans, and usage counters
///
/// Teams are the unit of billing and isolation. Each team carries a plan
/// string (e.g. "free", "pro", "business+drtrial"); the `+drtrial` suffix
/// marks a dataroom trial layered on top of the base plan. Plans map to
/// default numeric limits for documents, links, and members; a team's JSONB
/// `limits` column can override individual values (used for custom deals).
///
/// Usage counters are live `COUNT(*)` snapshots, not maintained aggregates.
/// They feed the limit evaluator, which tolerates the snapshot being
/// slightly stale.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE teams (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     plan VARCHAR(50) NOT NULL DEFAULT 'free',
///     limits JSONB,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

/// Trial marker suffix on plan strings
const TRIAL_SUFFIX: &str = "+drtrial";

/// Billing plan tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    /// Free plan (limited documents, links, and a single member)
    Free,

    /// Starter plan
    Starter,

    /// Professional plan
    Pro,

    /// Business plan
    Business,

    /// Datarooms plan (everything unlimited)
    Datarooms,
}

impl Plan {
    /// Converts plan to its base string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Starter => "starter",
            Plan::Pro => "pro",
            Plan::Business => "business",
            Plan::Datarooms => "datarooms",
        }
    }

    /// Parses a base plan string (without trial suffix)
    ///
    /// Unknown strings fall back to Free so a bad row degrades to the most
    /// restrictive limits rather than unlimited access.
    pub fn parse(s: &str) -> Self {
        match s {
            "free" => Plan::Free,
            "starter" => Plan::Starter,
            "pro" => Plan::Pro,
            "business" => Plan::Business,
            "datarooms" => Plan::Datarooms,
            _ => Plan::Free,
        }
    }

    /// Default limits for the plan; None = unlimited
    pub fn default_limits(&self) -> PlanLimits {
        match self {
            Plan::Free => PlanLimits {
                documents: Some(50),
                links: Some(50),
                users: Some(1),
            },
            Plan::Starter => PlanLimits {
                documents: Some(100),
                links: None,
                users: Some(2),
            },
            Plan::Pro => PlanLimits {
                documents: Some(500),
                links: None,
                users: Some(5),
            },
            Plan::Business => PlanLimits {
                documents: None,
                links: None,
                users: Some(15),
            },
            Plan::Datarooms => PlanLimits {
                documents: None,
                links: None,
                users: None,
            },
        }
    }
}

/// Parsed plan string: base tier plus trial marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanInfo {
    /// Base plan tier
    pub plan: Plan,

    /// Whether the team is in a trial
    pub trial: bool,
}

impl PlanInfo {
    /// Parses a stored plan string such as "pro" or "business+drtrial"
    pub fn parse(s: &str) -> Self {
        match s.strip_suffix(TRIAL_SUFFIX) {
            Some(base) => PlanInfo {
                plan: Plan::parse(base),
                trial: true,
            },
            None => PlanInfo {
                plan: Plan::parse(s),
                trial: false,
            },
        }
    }

    /// Whether the base tier is free
    pub fn is_free(&self) -> bool {
        self.plan == Plan::Free
    }
}

/// Numeric limits for a plan; None = unlimited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLimits {
    /// Maximum documents
    pub documents: Option<i64>,

    /// Maximum links
    pub links: Option<i64>,

    /// Maximum team members
    pub users: Option<i64>,
}

impl PlanLimits {
    /// Applies JSONB overrides from the team row on top of plan defaults
    ///
    /// Only keys present in the override object replace defaults; a JSON
    /// null for a key means "unlimited".
    pub fn with_overrides(mut self, overrides: &JsonValue) -> Self {
        let Some(map) = overrides.as_object() else {
            return self;
        };

        for (key, value) in map {
            let parsed = if value.is_null() {
                None
            } else if let Some(n) = value.as_i64() {
                Some(n)
            } else {
                continue;
            };

            match key.as_str() {
                "documents" => self.documents = parsed,
                "links" => self.links = parsed,
                "users" => self.users = parsed,
                _ => {}
            }
        }

        self
    }
}

/// Live usage snapshot for a team
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TeamUsage {
    /// Current document count
    pub documents: i64,

    /// Current link count
    pub links: i64,

    /// Current member count
    pub users: i64,
}

/// Team record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Team {
    /// Unique team ID
    pub id: Uuid,

    /// Team name
    pub name: String,

    /// Raw plan string (parse with `plan_info`)
    pub plan: String,

    /// Per-team limit overrides (JSONB)
    pub limits: Option<JsonValue>,

    /// When the team was created
    pub created_at: DateTime<Utc>,

    /// When the team was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new team
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTeam {
    /// Team name
    pub name: String,

    /// Plan string (defaults to "free")
    #[serde(default = "default_plan")]
    pub plan: String,
}

fn default_plan() -> String {
    "free".to_string()
}

impl Team {
    /// Parses the stored plan string
    pub fn plan_info(&self) -> PlanInfo {
        PlanInfo::parse(&self.plan)
    }

    /// Effective limits: plan defaults with the team's overrides applied
    pub fn effective_limits(&self) -> PlanLimits {
        let defaults = self.plan_info().plan.default_limits();
        match &self.limits {
            Some(overrides) => defaults.with_overrides(overrides),
            None => defaults,
        }
    }

    /// Creates a new team
    pub async fn create(pool: &PgPool, data: CreateTeam) -> Result<Self, sqlx::Error> {
        let team = sqlx::query_as::<_, Team>(
            r#"
            INSERT INTO teams (name, plan)
            VALUES ($1, $2)
            RETURNING id, name, plan, limits, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.plan)
        .fetch_one(pool)
        .await?;

        Ok(team)
    }

    /// Finds a team by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let team = sqlx::query_as::<_, Team>(
            r#"
            SELECT id, name, plan, limits, created_at, updated_at
            FROM teams
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(team)
    }

    /// Updates a team's plan string
    pub async fn update_plan(
        pool: &PgPool,
        id: Uuid,
        plan: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let team = sqlx::query_as::<_, Team>(
            r#"
            UPDATE teams
            SET plan = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, plan, limits, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(plan)
        .fetch_optional(pool)
        .await?;

        Ok(team)
    }

    /// Counts current usage for the team
    ///
    /// Three independent COUNT queries; the snapshot is advisory and not
    /// transactional with any limit read.
    pub async fn count_usage(pool: &PgPool, team_id: Uuid) -> Result<TeamUsage, sqlx::Error> {
        let documents: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE team_id = $1")
                .bind(team_id)
                .fetch_one(pool)
                .await?;

        let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM links WHERE team_id = $1")
            .bind(team_id)
            .fetch_one(pool)
            .await?;

        let users: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM team_members WHERE team_id = $1")
                .bind(team_id)
                .fetch_one(pool)
                .await?;

        Ok(TeamUsage {
            documents,
            links,
            users,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plan_parse_round_trip() {
        for plan in [
            Plan::Free,
            Plan::Starter,
            Plan::Pro,
            Plan::Business,
            Plan::Datarooms,
        ] {
            assert_eq!(Plan::parse(plan.as_str()), plan);
        }
    }

    #[test]
    fn test_unknown_plan_falls_back_to_free() {
        assert_eq!(Plan::parse("enterprise-legacy"), Plan::Free);
        assert_eq!(Plan::parse(""), Plan::Free);
    }

    #[test]
    fn test_plan_info_trial_suffix() {
        let info = PlanInfo::parse("business+drtrial");
        assert_eq!(info.plan, Plan::Business);
        assert!(info.trial);

        let info = PlanInfo::parse("pro");
        assert_eq!(info.plan, Plan::Pro);
        assert!(!info.trial);
    }

    #[test]
    fn test_plan_info_is_free() {
        assert!(PlanInfo::parse("free").is_free());
        assert!(PlanInfo::parse("free+drtrial").is_free());
        assert!(!PlanInfo::parse("pro").is_free());
    }

    #[test]
    fn test_default_limits_free() {
        let limits = Plan::Free.default_limits();
        assert_eq!(limits.documents, Some(50));
        assert_eq!(limits.links, Some(50));
        assert_eq!(limits.users, Some(1));
    }

    #[test]
    fn test_default_limits_datarooms_unlimited() {
        let limits = Plan::Datarooms.default_limits();
        assert_eq!(limits.documents, None);
        assert_eq!(limits.links, None);
        assert_eq!(limits.users, None);
    }

    #[test]
    fn test_limit_overrides() {
        let limits = Plan::Free
            .default_limits()
            .with_overrides(&json!({"documents": 200, "users": null}));
        assert_eq!(limits.documents, Some(200));
        assert_eq!(limits.links, Some(50)); // untouched
        assert_eq!(limits.users, None); // null = unlimited
    }

    #[test]
    fn test_limit_overrides_ignores_unknown_keys() {
        let limits = Plan::Pro
            .default_limits()
            .with_overrides(&json!({"datarooms": 3, "links": "not-a-number"}));
        assert_eq!(limits, Plan::Pro.default_limits());
    }
}
