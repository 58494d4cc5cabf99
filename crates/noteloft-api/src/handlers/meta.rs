//! Meta handlers: catalogues the UI needs, filtered by caller context.

use crate::auth::models::AuthedUser;
use crate::error::HttpAppError;
use axum::{extract::Query, response::IntoResponse, Json};
use noteloft_core::models::AccessKind;
use noteloft_core::pagination::paginate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const DEFAULT_PAGE_SIZE: i64 = 10;

#[derive(Debug, Deserialize)]
pub struct ListAccessQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AccessEntry {
    pub id: AccessKind,
    pub label: String,
}

fn access_entry(kind: AccessKind, label: &str) -> AccessEntry {
    AccessEntry {
        id: kind,
        label: label.to_string(),
    }
}

/// Access kinds the caller may assign to a resource:
/// main-site admins cannot pick TENANT, main-site users only PRIVATE, and
/// tenant members cannot pick PUBLIC.
pub fn access_kinds_for(user: &AuthedUser) -> Vec<AccessEntry> {
    let all = vec![
        access_entry(AccessKind::Private, "Private"),
        access_entry(AccessKind::Public, "Public"),
        access_entry(AccessKind::Tenant, "Tenant"),
    ];

    if user.is_main() {
        if user.is_admin() {
            all.into_iter()
                .filter(|e| e.id != AccessKind::Tenant)
                .collect()
        } else {
            all.into_iter()
                .filter(|e| e.id == AccessKind::Private)
                .collect()
        }
    } else {
        all.into_iter()
            .filter(|e| e.id != AccessKind::Public)
            .collect()
    }
}

/// Paginated access-kind catalogue for the caller's context.
#[utoipa::path(
    get,
    path = "/api/meta/access",
    tag = "meta",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Page size")
    ),
    responses(
        (status = 200, description = "Access kinds", body = serde_json::Value)
    )
)]
#[tracing::instrument(skip(user))]
pub async fn list_access(
    user: AuthedUser,
    Query(query): Query<ListAccessQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 100);

    Ok(Json(paginate(access_kinds_for(&user), page, limit)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use noteloft_core::models::{Role, Tenant};

    fn user(role: Role, tenant: bool) -> AuthedUser {
        let tenant = tenant.then(|| Tenant {
            id: 1,
            slug: "acme".to_string(),
            name: "Acme".to_string(),
            enabled: true,
            created_by: 1,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        });
        AuthedUser {
            id: 5,
            email: "a@b.c".to_string(),
            name: None,
            role,
            tenant,
        }
    }

    fn kinds(user: &AuthedUser) -> Vec<AccessKind> {
        access_kinds_for(user).into_iter().map(|e| e.id).collect()
    }

    #[test]
    fn test_main_admin_excludes_tenant() {
        assert_eq!(
            kinds(&user(Role::Admin, false)),
            vec![AccessKind::Private, AccessKind::Public]
        );
    }

    #[test]
    fn test_main_user_private_only() {
        assert_eq!(kinds(&user(Role::User, false)), vec![AccessKind::Private]);
    }

    #[test]
    fn test_tenant_member_excludes_public() {
        assert_eq!(
            kinds(&user(Role::User, true)),
            vec![AccessKind::Private, AccessKind::Tenant]
        );
    }
}
