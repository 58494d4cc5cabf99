//! Authentication handlers: registration, login, token lifecycle, and the
//! email flows.

use crate::auth::models::{AuthedUser, RequestTenant};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::AuthTokensResponse;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use noteloft_core::models::{Role, TenantResponse, TokenKind, UserResponse};
use noteloft_core::validation::validate_password;
use noteloft_core::AppError;
use noteloft_db::UserUpdate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordQuery {
    pub token: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VerifyEmailRequest {
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub tokens: AuthTokensResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub tenant: Option<TenantResponse>,
}

/// Register a new account. On a tenant subdomain, an already-registered
/// email joins the existing account to the tenant instead of failing.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Email taken or invalid input", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request))]
pub async fn register(
    State(state): State<Arc<AppState>>,
    RequestTenant(tenant): RequestTenant,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    validate_password(&request.password).map_err(HttpAppError::from)?;

    let existing = state.users.find_by_email(&request.email).await?;
    let user = match (existing, &tenant) {
        (Some(existing), Some(tenant)) => {
            if state
                .memberships
                .find_active(tenant.id, existing.id)
                .await?
                .is_some()
            {
                return Err(HttpAppError(AppError::BadRequest(
                    "User already registered to this tenant".to_string(),
                )));
            }
            state
                .memberships
                .add(tenant.id, existing.id, Role::User)
                .await?;
            existing
        }
        (Some(_), None) => {
            return Err(HttpAppError(AppError::BadRequest(
                "Email already taken".to_string(),
            )));
        }
        (None, _) => {
            let password_hash = hash_password(&request.password)?;
            let user = state
                .users
                .create(
                    &request.email,
                    &password_hash,
                    request.name.as_deref(),
                    Role::User,
                )
                .await?;
            if let Some(tenant) = &tenant {
                state
                    .memberships
                    .add(tenant.id, user.id, Role::User)
                    .await?;
            }
            user
        }
    };

    let tokens = state
        .tokens
        .generate_auth_tokens(user.id, tenant.as_ref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserResponse::from(&user),
            tokens,
        }),
    ))
}

/// Log in with email and password. On a tenant subdomain the user must hold
/// an active membership; the issued tokens are bound to that tenant.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Invalid credentials or not part of tenant", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request))]
pub async fn login(
    State(state): State<Arc<AppState>>,
    RequestTenant(tenant): RequestTenant,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let user = state
        .users
        .find_by_email(&request.email)
        .await?
        .ok_or_else(|| AppError::Unauthenticated("Incorrect email or password".to_string()))?;
    if !verify_password(&request.password, &user.password_hash)? {
        return Err(HttpAppError(AppError::Unauthenticated(
            "Incorrect email or password".to_string(),
        )));
    }

    match &tenant {
        Some(tenant) => {
            if state
                .memberships
                .find_active(tenant.id, user.id)
                .await?
                .is_none()
            {
                return Err(HttpAppError(AppError::Unauthenticated(
                    "User is not part of tenant".to_string(),
                )));
            }
        }
        None => {
            if user.deleted_at.is_some() {
                return Err(HttpAppError(AppError::Unauthenticated(
                    "User disabled".to_string(),
                )));
            }
        }
    }

    let tokens = state
        .tokens
        .generate_auth_tokens(user.id, tenant.as_ref())
        .await?;

    Ok(Json(AuthResponse {
        user: UserResponse::from(&user),
        tokens,
    }))
}

/// Revoke a refresh token.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    request_body = RefreshTokenRequest,
    responses(
        (status = 204, description = "Logged out"),
        (status = 404, description = "Token not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request))]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<RefreshTokenRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let record = state
        .tokens
        .find_refresh(&request.refresh_token)
        .await?
        .ok_or_else(|| AppError::NotFound("Token not found".to_string()))?;
    state.tokens.revoke(&record).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Rotate a refresh token into a fresh access/refresh pair. The stored token
/// must match the request's tenant binding.
#[utoipa::path(
    post,
    path = "/api/auth/refresh-tokens",
    tag = "auth",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New token pair", body = AuthTokensResponse),
        (status = 401, description = "Invalid refresh token", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request))]
pub async fn refresh_tokens(
    State(state): State<Arc<AppState>>,
    RequestTenant(tenant): RequestTenant,
    ValidatedJson(request): ValidatedJson<RefreshTokenRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let record = state
        .tokens
        .verify_persisted(&request.refresh_token, TokenKind::Refresh, tenant.as_ref())
        .await
        .map_err(|_| AppError::Unauthenticated("Please authenticate".to_string()))?;

    let user = state
        .users
        .find_by_id(record.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthenticated("Please authenticate".to_string()))?;

    state.tokens.revoke(&record).await?;
    let tokens = state
        .tokens
        .generate_auth_tokens(user.id, tenant.as_ref())
        .await?;

    Ok(Json(tokens))
}

/// Email a password-reset link.
#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    tag = "auth",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 204, description = "Reset email sent"),
        (status = 404, description = "Unknown email", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request))]
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    RequestTenant(tenant): RequestTenant,
    ValidatedJson(request): ValidatedJson<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let user = state
        .users
        .find_by_email(&request.email)
        .await?
        .ok_or_else(|| AppError::NotFound("No users found with this email".to_string()))?;

    let token = state.tokens.generate_reset_password_token(user.id).await?;

    let tenant_slug = tenant.as_ref().map(|t| t.slug.as_str());
    match &state.email {
        Some(email) => email
            .send_reset_password_email(&user.email, &token, tenant_slug)
            .await
            .map_err(|e| {
                tracing::error!("Failed to send reset email: {}", e);
                AppError::Internal("Failed to send email".to_string())
            })?,
        None => tracing::warn!("Email service not configured; skipping reset email"),
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Reset the password with a reset token. Outstanding reset tokens are
/// revoked on success.
#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    tag = "auth",
    params(("token" = String, Query, description = "Reset-password token")),
    request_body = ResetPasswordRequest,
    responses(
        (status = 204, description = "Password reset"),
        (status = 401, description = "Reset failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, query, request))]
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ResetPasswordQuery>,
    ValidatedJson(request): ValidatedJson<ResetPasswordRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    validate_password(&request.password).map_err(HttpAppError::from)?;

    let record = state
        .tokens
        .verify_persisted(&query.token, TokenKind::ResetPassword, None)
        .await
        .map_err(|_| AppError::Unauthenticated("Password reset failed".to_string()))?;

    let password_hash = hash_password(&request.password)?;
    state
        .users
        .update(
            record.user_id,
            &UserUpdate {
                password_hash: Some(password_hash),
                ..Default::default()
            },
        )
        .await?;
    state
        .tokens
        .revoke_all(record.user_id, TokenKind::ResetPassword)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Email a verification link to the authenticated user, unless one is
/// already outstanding.
#[utoipa::path(
    post,
    path = "/api/auth/send-verification-email",
    tag = "auth",
    responses(
        (status = 204, description = "Verification email sent"),
        (status = 401, description = "Unauthenticated", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, user))]
pub async fn send_verification_email(
    State(state): State<Arc<AppState>>,
    user: AuthedUser,
) -> Result<impl IntoResponse, HttpAppError> {
    if !state.tokens.has_active_verify_token(user.id).await? {
        let token = state.tokens.generate_verify_email_token(user.id).await?;
        let tenant_slug = user.tenant.as_ref().map(|t| t.slug.as_str());
        match &state.email {
            Some(email) => email
                .send_verification_email(&user.email, &token, tenant_slug)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to send verification email: {}", e);
                    AppError::Internal("Failed to send email".to_string())
                })?,
            None => tracing::warn!("Email service not configured; skipping verification email"),
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Mark the email verified with a verification token.
#[utoipa::path(
    post,
    path = "/api/auth/verify-email",
    tag = "auth",
    request_body = VerifyEmailRequest,
    responses(
        (status = 204, description = "Email verified"),
        (status = 401, description = "Verification failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request))]
pub async fn verify_email(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<VerifyEmailRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let record = state
        .tokens
        .verify_persisted(&request.token, TokenKind::VerifyEmail, None)
        .await
        .map_err(|_| AppError::Unauthenticated("Email verification failed".to_string()))?;

    state.users.set_email_verified(record.user_id).await?;
    state
        .tokens
        .revoke_all(record.user_id, TokenKind::VerifyEmail)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// The authenticated identity with its tenant-effective role.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current identity", body = MeResponse),
        (status = 401, description = "Unauthenticated", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, user))]
pub async fn me(
    State(state): State<Arc<AppState>>,
    user: AuthedUser,
) -> Result<impl IntoResponse, HttpAppError> {
    let record = state
        .users
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::Unauthenticated("Please authenticate".to_string()))?;

    Ok(Json(MeResponse {
        user: UserResponse::with_role(&record, user.role),
        tenant: user.tenant.as_ref().map(TenantResponse::from),
    }))
}
