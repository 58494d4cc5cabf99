//! Token issuance and verification service.
//!
//! Access tokens are stateless JWTs. Refresh, reset-password, and
//! verify-email tokens are additionally persisted so they can be revoked;
//! verifying one checks both the signature and the stored row.

use chrono::{DateTime, Duration, Utc};
use noteloft_core::models::{Tenant, TokenKind, TokenRecord};
use noteloft_core::{AppError, Config};
use noteloft_db::TokenRepository;
use serde::Serialize;
use utoipa::ToSchema;

use super::claims::{self, Claims};

/// A signed token with its expiry, as returned to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenPair {
    pub token: String,
    pub expires: DateTime<Utc>,
}

/// Access/refresh pair issued on register, login, and refresh.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthTokensResponse {
    pub access: TokenPair,
    pub refresh: TokenPair,
}

#[derive(Clone)]
pub struct TokenService {
    secret: String,
    access_expiration_minutes: i64,
    refresh_expiration_days: i64,
    reset_password_expiration_minutes: i64,
    verify_email_expiration_minutes: i64,
    repository: TokenRepository,
}

impl TokenService {
    pub fn new(config: &Config, repository: TokenRepository) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            access_expiration_minutes: config.jwt_access_expiration_minutes,
            refresh_expiration_days: config.jwt_refresh_expiration_days,
            reset_password_expiration_minutes: config.jwt_reset_password_expiration_minutes,
            verify_email_expiration_minutes: config.jwt_verify_email_expiration_minutes,
            repository,
        }
    }

    /// Sign a token of the given kind, optionally bound to a tenant slug.
    fn generate(
        &self,
        user_id: i64,
        expires: DateTime<Utc>,
        kind: TokenKind,
        tenant: Option<&str>,
    ) -> Result<String, AppError> {
        let claims = Claims {
            sub: user_id,
            iat: Utc::now().timestamp(),
            exp: expires.timestamp(),
            kind,
            tenant: tenant.map(String::from),
        };
        claims::sign(&claims, &self.secret)
    }

    /// Verify a bearer credential for API access. Rejects any kind other
    /// than `Access`: refresh/reset/verify tokens must never authenticate
    /// API calls.
    pub fn verify_access(&self, token: &str) -> Result<Claims, AppError> {
        let claims = claims::verify(token, &self.secret)?;
        if claims.kind != TokenKind::Access {
            return Err(AppError::Unauthenticated("Invalid token type".to_string()));
        }
        Ok(claims)
    }

    /// Issue an access/refresh pair bound to the given tenant. The refresh
    /// token is persisted for later rotation and revocation.
    pub async fn generate_auth_tokens(
        &self,
        user_id: i64,
        tenant: Option<&Tenant>,
    ) -> Result<AuthTokensResponse, AppError> {
        let slug = tenant.map(|t| t.slug.as_str());

        let access_expires = Utc::now() + Duration::minutes(self.access_expiration_minutes);
        let access = self.generate(user_id, access_expires, TokenKind::Access, slug)?;

        let refresh_expires = Utc::now() + Duration::days(self.refresh_expiration_days);
        let refresh = self.generate(user_id, refresh_expires, TokenKind::Refresh, slug)?;
        self.repository
            .save(
                &refresh,
                user_id,
                TokenKind::Refresh,
                tenant.map(|t| t.id),
                refresh_expires,
            )
            .await?;

        Ok(AuthTokensResponse {
            access: TokenPair {
                token: access,
                expires: access_expires,
            },
            refresh: TokenPair {
                token: refresh,
                expires: refresh_expires,
            },
        })
    }

    /// Verify a persisted token (refresh/reset/verify): signature, kind,
    /// tenant binding against the request tenant, and the stored,
    /// unblacklisted row.
    pub async fn verify_persisted(
        &self,
        token: &str,
        kind: TokenKind,
        request_tenant: Option<&Tenant>,
    ) -> Result<TokenRecord, AppError> {
        let claims = claims::verify(token, &self.secret)?;
        if claims.kind != kind {
            return Err(AppError::Unauthenticated("Invalid token type".to_string()));
        }
        if let Some(tenant) = request_tenant {
            if claims.tenant.as_deref() != Some(tenant.slug.as_str()) {
                return Err(AppError::Unauthenticated(
                    "Invalid token for tenant".to_string(),
                ));
            }
        }
        self.repository
            .find_active(token, kind, claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthenticated("Token not found".to_string()))
    }

    pub async fn generate_reset_password_token(&self, user_id: i64) -> Result<String, AppError> {
        let expires = Utc::now() + Duration::minutes(self.reset_password_expiration_minutes);
        let token = self.generate(user_id, expires, TokenKind::ResetPassword, None)?;
        self.repository
            .save(&token, user_id, TokenKind::ResetPassword, None, expires)
            .await?;
        Ok(token)
    }

    pub async fn generate_verify_email_token(&self, user_id: i64) -> Result<String, AppError> {
        let expires = Utc::now() + Duration::minutes(self.verify_email_expiration_minutes);
        let token = self.generate(user_id, expires, TokenKind::VerifyEmail, None)?;
        self.repository
            .save(&token, user_id, TokenKind::VerifyEmail, None, expires)
            .await?;
        Ok(token)
    }

    /// Whether the user already has an outstanding verify-email token, to
    /// avoid resending on every request.
    pub async fn has_active_verify_token(&self, user_id: i64) -> Result<bool, AppError> {
        self.repository
            .has_active(user_id, TokenKind::VerifyEmail)
            .await
    }

    /// Blacklist a stored token row.
    pub async fn revoke(&self, record: &TokenRecord) -> Result<(), AppError> {
        self.repository.blacklist(record.id).await
    }

    /// Blacklist every outstanding token of one kind for a user.
    pub async fn revoke_all(&self, user_id: i64, kind: TokenKind) -> Result<(), AppError> {
        self.repository.revoke_all(user_id, kind).await
    }

    /// Look up a stored refresh token row for logout; signature problems and
    /// unknown rows are both reported as not found.
    pub async fn find_refresh(&self, token: &str) -> Result<Option<TokenRecord>, AppError> {
        let claims = match claims::verify(token, &self.secret) {
            Ok(claims) if claims.kind == TokenKind::Refresh => claims,
            _ => return Ok(None),
        };
        self.repository
            .find_active(token, TokenKind::Refresh, claims.sub)
            .await
    }
}
