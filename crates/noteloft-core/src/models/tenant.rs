use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Tenant (workspace) entity.
/// Resolved per request from the left-most subdomain label; a disabled tenant
/// is invisible to slug lookup and therefore to authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Tenant {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub enabled: bool,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Tenant fields safe to expose to API callers.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TenantResponse {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub enabled: bool,
}

impl From<&Tenant> for TenantResponse {
    fn from(tenant: &Tenant) -> Self {
        Self {
            id: tenant.id,
            slug: tenant.slug.clone(),
            name: tenant.name.clone(),
            enabled: tenant.enabled,
        }
    }
}
