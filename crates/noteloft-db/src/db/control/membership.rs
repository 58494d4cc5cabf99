use noteloft_core::models::{Role, TenantMembership};
use noteloft_core::AppError;
use sqlx::PgPool;

#[derive(Clone)]
pub struct MembershipRepository {
    pool: PgPool,
}

impl MembershipRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch the active membership for (tenant, user). A soft-deleted row is
    /// treated as absent; callers re-read per request so removal takes effect
    /// on the very next call.
    pub async fn find_active(
        &self,
        tenant_id: i64,
        user_id: i64,
    ) -> Result<Option<TenantMembership>, AppError> {
        let membership = sqlx::query_as::<_, TenantMembership>(
            r#"
            SELECT tenant_id, user_id, role, joined_at, deleted_at
            FROM tenant_users
            WHERE tenant_id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch membership: {}", e);
            AppError::Internal("Failed to fetch membership".to_string())
        })?;

        Ok(membership)
    }

    /// Enroll a user in a tenant. Re-adding a previously removed member
    /// restores the row, keeping at most one active membership per pair.
    pub async fn add(
        &self,
        tenant_id: i64,
        user_id: i64,
        role: Role,
    ) -> Result<TenantMembership, AppError> {
        let membership = sqlx::query_as::<_, TenantMembership>(
            r#"
            INSERT INTO tenant_users (tenant_id, user_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (tenant_id, user_id)
            DO UPDATE SET role = EXCLUDED.role, deleted_at = NULL
            RETURNING tenant_id, user_id, role, joined_at, deleted_at
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to add tenant membership: {}", e);
            AppError::Internal("Failed to add user to tenant".to_string())
        })?;

        tracing::info!("Added user {} to tenant {}", user_id, tenant_id);
        Ok(membership)
    }

    /// Soft-remove a user from a tenant. Returns false if no active row
    /// existed.
    pub async fn disable(&self, tenant_id: i64, user_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE tenant_users SET deleted_at = NOW()
            WHERE tenant_id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to disable membership: {}", e);
            AppError::Internal("Failed to disable membership".to_string())
        })?;

        Ok(result.rows_affected() > 0)
    }

    /// Restore a previously removed membership. Returns false if no row
    /// existed.
    pub async fn enable(&self, tenant_id: i64, user_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE tenant_users SET deleted_at = NULL
            WHERE tenant_id = $1 AND user_id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to enable membership: {}", e);
            AppError::Internal("Failed to enable membership".to_string())
        })?;

        Ok(result.rows_affected() > 0)
    }
}
