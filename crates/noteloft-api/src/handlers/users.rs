//! Admin user management handlers.
//!
//! Rights are enforced by the route policy; a caller may always act on its
//! own record regardless of rights (self-access). The path parameter must
//! stay named `user_id` because the gate compares it to the identity.

use crate::auth::models::AuthedUser;
use crate::auth::password::hash_password;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use noteloft_core::models::{Role, UserResponse};
use noteloft_core::pagination::SortOrder;
use noteloft_core::validation::validate_password;
use noteloft_core::AppError;
use noteloft_db::{UserFilter, UserUpdate};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

const DEFAULT_PAGE_SIZE: i64 = 10;

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort: Option<String>,
    pub order: Option<SortOrder>,
    pub role: Option<Role>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
    pub name: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(email)]
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

/// List users. Tenant-scoped requests list that tenant's members with their
/// membership role and disabled state overlaid.
#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "users",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Page size"),
        ("role" = Option<String>, Query, description = "Filter by role"),
        ("name" = Option<String>, Query, description = "Filter by name substring")
    ),
    responses(
        (status = 200, description = "Page of users", body = serde_json::Value),
        (status = 403, description = "Missing get_users right", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, user))]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    user: AuthedUser,
    Query(query): Query<ListUsersQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 100);
    let order = query.order.unwrap_or(SortOrder::Desc);
    let filter = UserFilter {
        role: query.role,
        name: query.name,
    };

    let result = state
        .users
        .list_paginated(
            user.tenant_id(),
            &filter,
            page,
            limit,
            query.sort.as_deref(),
            order,
        )
        .await?;

    Ok(Json(result))
}

/// Create a user with an explicit role.
#[utoipa::path(
    post,
    path = "/admin/users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Email taken or invalid input", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request))]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    validate_password(&request.password).map_err(HttpAppError::from)?;

    if state.users.find_by_email(&request.email).await?.is_some() {
        return Err(HttpAppError(AppError::BadRequest(
            "Email already taken".to_string(),
        )));
    }

    let password_hash = hash_password(&request.password)?;
    let user = state
        .users
        .create(
            &request.email,
            &password_hash,
            request.name.as_deref(),
            request.role.unwrap_or(Role::User),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// Fetch a single user. Self-access bypasses the rights check.
#[utoipa::path(
    get,
    path = "/admin/users/{user_id}",
    tag = "users",
    params(("user_id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::from(&user)))
}

/// Update a user's email, name, or password. Self-access bypasses the
/// rights check.
#[utoipa::path(
    patch,
    path = "/admin/users/{user_id}",
    tag = "users",
    params(("user_id" = i64, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request))]
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let password_hash = match &request.password {
        Some(password) => {
            validate_password(password).map_err(HttpAppError::from)?;
            Some(hash_password(password)?)
        }
        None => None,
    };

    if let Some(email) = &request.email {
        if let Some(existing) = state.users.find_by_email(email).await? {
            if existing.id != user_id {
                return Err(HttpAppError(AppError::BadRequest(
                    "Email already taken".to_string(),
                )));
            }
        }
    }

    let user = state
        .users
        .update(
            user_id,
            &UserUpdate {
                email: request.email.clone(),
                name: request.name.clone(),
                password_hash,
            },
        )
        .await?;

    Ok(Json(UserResponse::from(&user)))
}

/// Disable a user: tenant-scoped requests disable the membership only;
/// main-site requests disable the account platform-wide. Takes effect on
/// the target's very next request.
#[utoipa::path(
    post,
    path = "/admin/users/{user_id}/disable",
    tag = "users",
    params(("user_id" = i64, Path, description = "User ID")),
    responses(
        (status = 204, description = "User disabled"),
        (status = 404, description = "User or membership not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, user))]
pub async fn disable_user(
    State(state): State<Arc<AppState>>,
    user: AuthedUser,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    match user.tenant_id() {
        Some(tenant_id) => {
            if !state.memberships.disable(tenant_id, user_id).await? {
                return Err(HttpAppError(AppError::NotFound(
                    "User is not part of tenant".to_string(),
                )));
            }
        }
        None => state.users.disable(user_id).await?,
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Re-enable a previously disabled user or membership.
#[utoipa::path(
    post,
    path = "/admin/users/{user_id}/enable",
    tag = "users",
    params(("user_id" = i64, Path, description = "User ID")),
    responses(
        (status = 204, description = "User enabled"),
        (status = 404, description = "User or membership not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, user))]
pub async fn enable_user(
    State(state): State<Arc<AppState>>,
    user: AuthedUser,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    match user.tenant_id() {
        Some(tenant_id) => {
            if !state.memberships.enable(tenant_id, user_id).await? {
                return Err(HttpAppError(AppError::NotFound(
                    "User is not part of tenant".to_string(),
                )));
            }
        }
        None => state.users.enable(user_id).await?,
    }

    Ok(StatusCode::NO_CONTENT)
}
