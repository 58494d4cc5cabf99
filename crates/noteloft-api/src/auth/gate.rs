//! Access gate: the composition point every protected route passes through.
//!
//! Per request, in order: consume the resolved tenant context, verify the
//! bearer credential, enforce tenant binding, load the canonical user and
//! membership, resolve the effective role, and check route rights. On any
//! failure the request is rejected before the handler runs and no identity
//! is attached.

use crate::auth::models::{AuthedUser, RequestTenant};
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{FromRequestParts, RawPathParams, Request, State},
    http::header::AUTHORIZATION,
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use noteloft_core::models::{Role, Tenant};
use noteloft_core::rights::{has_rights, Right};
use noteloft_core::AppError;
use std::sync::Arc;

/// Per-route authentication policy.
///
/// `allow_public` admits anonymous access only when no tenant is in scope
/// and no credential was supplied; write routes never set it.
/// `required_rights` are checked against the effective role, except when the
/// route targets the caller's own user record.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoutePolicy {
    pub allow_public: bool,
    pub required_rights: &'static [Right],
}

impl RoutePolicy {
    /// Authenticated access, no specific rights.
    pub fn authenticated() -> Self {
        Self::default()
    }

    /// Read route that also serves anonymous main-site requests.
    pub fn public_read() -> Self {
        Self {
            allow_public: true,
            required_rights: &[],
        }
    }

    /// Authenticated access with required rights.
    pub fn rights(required: &'static [Right]) -> Self {
        Self {
            allow_public: false,
            required_rights: required,
        }
    }
}

/// Gate middleware. Attaches the resolved identity on success; rejects with
/// 401/403 otherwise.
pub async fn authorize(
    State((state, policy)): State<(Arc<AppState>, RoutePolicy)>,
    request: Request,
    next: Next,
) -> Response {
    // Path params are only needed for the self-access escape hatch.
    let (mut parts, body) = request.into_parts();
    let target_user_id = RawPathParams::from_request_parts(&mut parts, &())
        .await
        .ok()
        .and_then(|params| {
            params
                .iter()
                .find(|(key, _)| *key == "user_id")
                .and_then(|(_, value)| value.parse::<i64>().ok())
        });
    let mut request = Request::from_parts(parts, body);

    // Read the request-scoped inputs the gate needs before entering the async
    // path: holding a `&Request` across an await would make the future non-Send
    // (`Request<Body>` is not `Sync`).
    let tenant = request
        .extensions()
        .get::<RequestTenant>()
        .cloned()
        .unwrap_or_default()
        .0;
    let bearer = bearer_token(request.headers()).map(|t| t.to_string());

    match run_gate(&state, policy, tenant, bearer, target_user_id).await {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(e) => HttpAppError(e).into_response(),
    }
}

async fn run_gate(
    state: &AppState,
    policy: RoutePolicy,
    tenant: Option<Tenant>,
    bearer: Option<String>,
    target_user_id: Option<i64>,
) -> Result<AuthedUser, AppError> {
    // Public bypass: tenant requests are never served anonymously.
    if policy.allow_public && tenant.is_none() && bearer.is_none() {
        return Ok(AuthedUser::anonymous());
    }

    let token = bearer.ok_or_else(|| AppError::Unauthenticated("Please authenticate".to_string()))?;
    let claims = state.tokens.verify_access(&token)?;

    check_tenant_binding(tenant.as_ref().map(|t| t.slug.as_str()), claims.tenant.as_deref())?;

    let identity = load_identity(state, claims.sub, tenant).await?;

    if !policy.required_rights.is_empty() {
        let is_self = target_user_id == Some(identity.id);
        if !has_rights(identity.role, policy.required_rights) && !is_self {
            return Err(AppError::Forbidden("Forbidden".to_string()));
        }
    }

    Ok(identity)
}

/// Extract the bearer token from the Authorization header, if any.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
}

/// Tenant binding: when the request is tenant-scoped, the token must be
/// bound to exactly that tenant. Untenanted requests accept any binding as
/// informational only.
fn check_tenant_binding(
    request_slug: Option<&str>,
    claim_slug: Option<&str>,
) -> Result<(), AppError> {
    match request_slug {
        Some(slug) if claim_slug != Some(slug) => Err(AppError::TenantMismatch(
            "Mismatched token for tenant".to_string(),
        )),
        _ => Ok(()),
    }
}

/// The effective role for the request scope: the membership role when a
/// tenant is in scope, else the user's global role.
fn effective_role(global: Role, membership: Option<Role>) -> Role {
    membership.unwrap_or(global)
}

/// Load the canonical user and, when a tenant is in scope, the active
/// membership. Reads fresh rows every request; a disabled account or
/// membership fails authentication immediately.
async fn load_identity(
    state: &AppState,
    user_id: i64,
    tenant: Option<Tenant>,
) -> Result<AuthedUser, AppError> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthenticated("Please authenticate".to_string()))?;
    if user.deleted_at.is_some() {
        return Err(AppError::Unauthenticated("User disabled".to_string()));
    }

    let membership_role = match &tenant {
        Some(tenant) => {
            let membership = state
                .memberships
                .find_active(tenant.id, user.id)
                .await?
                .ok_or_else(|| {
                    AppError::Unauthenticated("User is not part of tenant".to_string())
                })?;
            Some(membership.role)
        }
        None => None,
    };

    Ok(AuthedUser {
        id: user.id,
        email: user.email,
        name: user.name,
        role: effective_role(user.role, membership_role),
        tenant,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use noteloft_core::rights;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_tenant_binding_requires_exact_match() {
        assert!(check_tenant_binding(Some("acme"), Some("acme")).is_ok());
        assert!(matches!(
            check_tenant_binding(Some("acme"), Some("other")),
            Err(AppError::TenantMismatch(_))
        ));
        // a token with no binding is rejected on tenant-scoped requests
        assert!(matches!(
            check_tenant_binding(Some("acme"), None),
            Err(AppError::TenantMismatch(_))
        ));
    }

    #[test]
    fn test_tenant_binding_informational_on_main_site() {
        assert!(check_tenant_binding(None, Some("acme")).is_ok());
        assert!(check_tenant_binding(None, None).is_ok());
    }

    #[test]
    fn test_effective_role_prefers_membership() {
        // tenant role wins regardless of the global role
        assert_eq!(
            effective_role(Role::Superadmin, Some(Role::User)),
            Role::User
        );
        assert_eq!(effective_role(Role::User, Some(Role::Admin)), Role::Admin);
        // no tenant scope: global role applies
        assert_eq!(effective_role(Role::Admin, None), Role::Admin);
    }

    #[test]
    fn test_route_policy_presets() {
        let public = RoutePolicy::public_read();
        assert!(public.allow_public);
        assert!(public.required_rights.is_empty());

        let admin = RoutePolicy::rights(&[rights::GET_USERS]);
        assert!(!admin.allow_public);
        assert_eq!(admin.required_rights, &[rights::GET_USERS]);
    }
}
