use chrono::{DateTime, Utc};
use noteloft_core::models::{TokenKind, TokenRecord};
use noteloft_core::AppError;
use sqlx::PgPool;

const TOKEN_COLUMNS: &str =
    "id, token, user_id, kind, tenant_id, expires, blacklisted, created_at";

/// Persisted token storage (refresh, reset-password, verify-email).
/// Access tokens are stateless and never pass through here.
#[derive(Clone)]
pub struct TokenRepository {
    pool: PgPool,
}

impl TokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn save(
        &self,
        token: &str,
        user_id: i64,
        kind: TokenKind,
        tenant_id: Option<i64>,
        expires: DateTime<Utc>,
    ) -> Result<TokenRecord, AppError> {
        let record = sqlx::query_as::<_, TokenRecord>(&format!(
            r#"
            INSERT INTO tokens (token, user_id, kind, tenant_id, expires, blacklisted)
            VALUES ($1, $2, $3, $4, $5, FALSE)
            RETURNING {}
            "#,
            TOKEN_COLUMNS
        ))
        .bind(token)
        .bind(user_id)
        .bind(kind)
        .bind(tenant_id)
        .bind(expires)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to save token: {}", e);
            AppError::Internal("Failed to save token".to_string())
        })?;

        Ok(record)
    }

    /// Find a stored, unblacklisted token of the given kind for the given
    /// user.
    pub async fn find_active(
        &self,
        token: &str,
        kind: TokenKind,
        user_id: i64,
    ) -> Result<Option<TokenRecord>, AppError> {
        let record = sqlx::query_as::<_, TokenRecord>(&format!(
            r#"
            SELECT {}
            FROM tokens
            WHERE token = $1 AND kind = $2 AND user_id = $3 AND blacklisted = FALSE
            "#,
            TOKEN_COLUMNS
        ))
        .bind(token)
        .bind(kind)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch token: {}", e);
            AppError::Internal("Failed to fetch token".to_string())
        })?;

        Ok(record)
    }

    /// Blacklist a single stored token (logout, refresh rotation).
    pub async fn blacklist(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE tokens SET blacklisted = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to blacklist token: {}", e);
                AppError::Internal("Failed to revoke token".to_string())
            })?;
        Ok(())
    }

    /// Blacklist every outstanding token of one kind for a user
    /// (password reset, email verification completion).
    pub async fn revoke_all(&self, user_id: i64, kind: TokenKind) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE tokens SET blacklisted = TRUE WHERE user_id = $1 AND kind = $2 AND blacklisted = FALSE",
        )
        .bind(user_id)
        .bind(kind)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to revoke tokens: {}", e);
            AppError::Internal("Failed to revoke tokens".to_string())
        })?;
        Ok(())
    }

    /// Whether the user has an outstanding, unexpired token of this kind.
    pub async fn has_active(&self, user_id: i64, kind: TokenKind) -> Result<bool, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM tokens
            WHERE user_id = $1 AND kind = $2 AND blacklisted = FALSE AND expires > NOW()
            "#,
        )
        .bind(user_id)
        .bind(kind)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count tokens: {}", e);
            AppError::Internal("Failed to fetch token".to_string())
        })?;

        Ok(count > 0)
    }
}
