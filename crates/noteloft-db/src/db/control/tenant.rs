use noteloft_core::models::{Role, Tenant, TenantWithMembership};
use noteloft_core::pagination::{calc_num_pages, PaginatedData, SortOrder};
use noteloft_core::AppError;
use sqlx::PgPool;

#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Look up an enabled tenant by its exact slug. Disabled tenants are
    /// treated as nonexistent.
    pub async fn find_enabled_by_slug(&self, slug: &str) -> Result<Option<Tenant>, AppError> {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            SELECT id, slug, name, enabled, created_by, created_at, updated_at
            FROM tenants
            WHERE slug = $1 AND enabled = TRUE
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch tenant by slug: {}", e);
            AppError::Internal("Failed to fetch tenant".to_string())
        })?;

        Ok(tenant)
    }

    /// Create a tenant and enroll its creator as the first ADMIN member.
    /// Both rows are written in one transaction.
    pub async fn create(
        &self,
        name: &str,
        slug: &str,
        created_by: i64,
    ) -> Result<Tenant, AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            tracing::error!("Failed to begin tenant transaction: {}", e);
            AppError::Internal("Failed to create tenant".to_string())
        })?;

        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (name, slug, enabled, created_by)
            VALUES ($1, $2, TRUE, $3)
            RETURNING id, slug, name, enabled, created_by, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(slug)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create tenant: {}", e);
            AppError::Internal("Failed to create tenant".to_string())
        })?;

        sqlx::query(
            r#"
            INSERT INTO tenant_users (tenant_id, user_id, role)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(tenant.id)
        .bind(created_by)
        .bind(Role::Admin)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create first tenant membership: {}", e);
            AppError::Internal("Failed to create tenant".to_string())
        })?;

        tx.commit().await.map_err(|e| {
            tracing::error!("Failed to commit tenant transaction: {}", e);
            AppError::Internal("Failed to create tenant".to_string())
        })?;

        tracing::info!("Created new tenant: {} ({})", tenant.slug, tenant.id);
        Ok(tenant)
    }

    /// List the tenants a user belongs to, with the user's per-tenant role.
    pub async fn list_for_user_paginated(
        &self,
        user_id: i64,
        page: i64,
        limit: i64,
        order: SortOrder,
    ) -> Result<PaginatedData<TenantWithMembership>, AppError> {
        let offset = (page - 1) * limit;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM tenant_users
            WHERE user_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count user tenants: {}", e);
            AppError::Internal("Failed to list tenants".to_string())
        })?;

        let query = format!(
            r#"
            SELECT t.id, t.slug, t.name, t.enabled, m.role, m.joined_at
            FROM tenant_users m
            JOIN tenants t ON t.id = m.tenant_id
            WHERE m.user_id = $1 AND m.deleted_at IS NULL
            ORDER BY m.tenant_id {}
            LIMIT $2 OFFSET $3
            "#,
            order.as_sql()
        );
        let data = sqlx::query_as::<_, TenantWithMembership>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list user tenants: {}", e);
                AppError::Internal("Failed to list tenants".to_string())
            })?;

        Ok(PaginatedData {
            total,
            data,
            page,
            next_page: page + 1,
            pages: calc_num_pages(total, limit),
            limit,
        })
    }
}
