use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::user::Role;

/// A user's role-bearing association with one tenant.
/// At most one active (non-deleted) row exists per (tenant, user) pair.
/// A non-null `deleted_at` disables the membership without deleting history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TenantMembership {
    pub tenant_id: i64,
    pub user_id: i64,
    pub role: Role,
    pub joined_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TenantMembership {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Tenant plus the caller's membership details, for profile listings.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TenantWithMembership {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub enabled: bool,
    pub role: Role,
    pub joined_at: DateTime<Utc>,
}
