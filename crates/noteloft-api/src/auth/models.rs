use crate::error::ErrorResponse;
use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use axum::Json;
use noteloft_core::models::{Role, Tenant};
use noteloft_core::VisibilityScope;
use serde::Serialize;

/// Sentinel user id for the anonymous identity used by public-read routes.
pub const ANONYMOUS_USER_ID: i64 = 0;

/// Tenant resolved from the request's subdomain, attached to request
/// extensions before authentication runs. `None` means the main site.
#[derive(Debug, Clone, Default)]
pub struct RequestTenant(pub Option<Tenant>);

/// The authenticated, role-resolved actor attached to the request by the
/// access gate. `role` is the effective role: the membership role when a
/// tenant is in scope, else the user's global role. Constructed fresh per
/// request, never cached.
#[derive(Debug, Clone, Serialize)]
pub struct AuthedUser {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    pub tenant: Option<Tenant>,
}

impl AuthedUser {
    /// The anonymous identity attached when a public route is hit with no
    /// tenant in scope and no credential.
    pub fn anonymous() -> Self {
        Self {
            id: ANONYMOUS_USER_ID,
            email: String::new(),
            name: Some("public".to_string()),
            role: Role::User,
            tenant: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Whether the request is against the main site (no tenant scope).
    pub fn is_main(&self) -> bool {
        self.tenant.is_none()
    }

    pub fn tenant_id(&self) -> Option<i64> {
        self.tenant.as_ref().map(|t| t.id)
    }

    pub fn visibility_scope(&self) -> VisibilityScope {
        VisibilityScope::new(self.id, self.tenant_id())
    }
}

// Extract the resolved identity from request extensions. Handlers using this
// extractor can only be reached through the access gate.
impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthedUser>()
            .cloned()
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse::new("Please authenticate", "UNAUTHENTICATED")),
                )
            })
    }
}

// Extract the request tenant; absent extension means main site.
impl<S> FromRequestParts<S> for RequestTenant
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestTenant>()
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_identity_shape() {
        let user = AuthedUser::anonymous();
        assert_eq!(user.id, ANONYMOUS_USER_ID);
        assert_eq!(user.role, Role::User);
        assert!(user.tenant.is_none());
        assert!(user.is_main());
        assert!(!user.is_admin());
    }

    #[test]
    fn test_visibility_scope_follows_tenant() {
        let user = AuthedUser::anonymous();
        assert_eq!(user.visibility_scope(), VisibilityScope::new(0, None));
    }
}
