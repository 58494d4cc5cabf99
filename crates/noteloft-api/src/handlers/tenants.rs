//! Tenant handlers: workspace info, slug availability, and creation.

use crate::auth::models::{AuthedUser, RequestTenant};
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use noteloft_core::models::TenantResponse;
use noteloft_core::validation::validate_slug;
use noteloft_core::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTenantRequest {
    #[validate(length(min = 1))]
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TenantGreeting {
    pub message: String,
    pub data: TenantResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SlugCheckResponse {
    pub slug: String,
    pub available: bool,
}

/// Greeting plus the sanitized tenant record for the current subdomain.
/// Fails on the main site.
#[utoipa::path(
    get,
    path = "/api/tenants",
    tag = "tenants",
    responses(
        (status = 200, description = "Current tenant", body = TenantGreeting),
        (status = 501, description = "Not a tenant subdomain", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(tenant))]
pub async fn tenant_home(
    RequestTenant(tenant): RequestTenant,
) -> Result<impl IntoResponse, HttpAppError> {
    let tenant = tenant.ok_or_else(|| {
        AppError::TenantUnavailable("Tenant not enabled".to_string())
    })?;

    Ok(Json(TenantGreeting {
        message: format!("Hello from {}", tenant.name),
        data: TenantResponse::from(&tenant),
    }))
}

/// Tenant-bound variant of the greeting; reachable only with a token bound
/// to the current tenant.
#[utoipa::path(
    get,
    path = "/api/tenants/view",
    tag = "tenants",
    responses(
        (status = 200, description = "Greeting", body = serde_json::Value),
        (status = 401, description = "Token not bound to this tenant", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(user))]
pub async fn view_tenant(user: AuthedUser) -> Result<impl IntoResponse, HttpAppError> {
    let tenant = user.tenant.as_ref().ok_or_else(|| {
        AppError::TenantUnavailable("Tenant not enabled".to_string())
    })?;

    Ok(Json(serde_json::json!({
        "message": format!("Hello from {}", tenant.name)
    })))
}

/// Check whether a slug is free to claim.
#[utoipa::path(
    get,
    path = "/api/tenants/slug-check/{slug}",
    tag = "tenants",
    params(("slug" = String, Path, description = "Candidate slug")),
    responses(
        (status = 200, description = "Availability", body = SlugCheckResponse),
        (status = 400, description = "Malformed slug", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn check_slug(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    validate_slug(&slug).map_err(HttpAppError::from)?;

    let taken = state.tenants.find_enabled_by_slug(&slug).await?.is_some();
    Ok(Json(SlugCheckResponse {
        slug,
        available: !taken,
    }))
}

/// Create a tenant. The creator becomes its first ADMIN member; both rows
/// are written atomically.
#[utoipa::path(
    post,
    path = "/api/tenants/create",
    tag = "tenants",
    request_body = CreateTenantRequest,
    responses(
        (status = 201, description = "Tenant created", body = TenantResponse),
        (status = 400, description = "Slug taken or malformed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, user, request))]
pub async fn create_tenant(
    State(state): State<Arc<AppState>>,
    user: AuthedUser,
    ValidatedJson(request): ValidatedJson<CreateTenantRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    validate_slug(&request.slug).map_err(HttpAppError::from)?;

    if state
        .tenants
        .find_enabled_by_slug(&request.slug)
        .await?
        .is_some()
    {
        return Err(HttpAppError(AppError::BadRequest(
            "Tenant already taken".to_string(),
        )));
    }

    let tenant = state
        .tenants
        .create(&request.name, &request.slug, user.id)
        .await?;

    Ok((StatusCode::CREATED, Json(TenantResponse::from(&tenant))))
}
