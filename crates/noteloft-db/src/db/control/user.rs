use chrono::{DateTime, Utc};
use noteloft_core::models::{Role, User};
use noteloft_core::pagination::{calc_num_pages, PaginatedData, SortOrder};
use noteloft_core::AppError;
use serde::Serialize;
use sqlx::PgPool;

const USER_COLUMNS: &str =
    "id, email, password_hash, name, role, is_email_verified, deleted_at, created_at, updated_at";

/// Listing projection. For tenant-scoped listings, `role` and `deleted_at`
/// come from the membership row, not the user row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserListItem {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    pub is_email_verified: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Optional filters for user listings.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub name: Option<String>,
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password_hash: Option<String>,
}

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch user by id: {}", e);
            AppError::Internal("Failed to fetch user".to_string())
        })?;

        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch user by email: {}", e);
            AppError::Internal("Failed to fetch user".to_string())
        })?;

        Ok(user)
    }

    pub async fn create(
        &self,
        email: &str,
        password_hash: &str,
        name: Option<&str>,
        role: Role,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, name, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create user: {}", e);
            AppError::Internal("Failed to create user".to_string())
        })?;

        tracing::info!("Created new user: {}", user.id);
        Ok(user)
    }

    pub async fn update(&self, id: i64, update: &UserUpdate) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                name = COALESCE($3, name),
                password_hash = COALESCE($4, password_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(update.email.as_deref())
        .bind(update.name.as_deref())
        .bind(update.password_hash.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::RowNotFound = e {
                AppError::NotFound("User not found".to_string())
            } else {
                tracing::error!("Failed to update user: {}", e);
                AppError::Internal("Failed to update user".to_string())
            }
        })?;

        Ok(user)
    }

    pub async fn set_email_verified(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET is_email_verified = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to mark email verified: {}", e);
                AppError::Internal("Failed to update user".to_string())
            })?;
        Ok(())
    }

    /// Soft-disable the account platform-wide.
    pub async fn disable(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to disable user: {}", e);
                AppError::Internal("Failed to disable user".to_string())
            })?;
        Ok(())
    }

    pub async fn enable(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET deleted_at = NULL, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to enable user: {}", e);
                AppError::Internal("Failed to enable user".to_string())
            })?;
        Ok(())
    }

    /// Paginated user listing. When `tenant_id` is set, only members of that
    /// tenant are returned and their membership role and disabled state
    /// overlay the global ones. Membership rows are not filtered on
    /// `deleted_at` so admins can see disabled members.
    pub async fn list_paginated(
        &self,
        tenant_id: Option<i64>,
        filter: &UserFilter,
        page: i64,
        limit: i64,
        sort: Option<&str>,
        order: SortOrder,
    ) -> Result<PaginatedData<UserListItem>, AppError> {
        let offset = (page - 1) * limit;
        let name_pattern = filter.name.as_ref().map(|n| format!("%{}%", n));

        let (total, data) = match tenant_id {
            Some(tenant_id) => {
                let total = sqlx::query_scalar::<_, i64>(
                    r#"
                    SELECT COUNT(*)
                    FROM users u
                    JOIN tenant_users m ON m.user_id = u.id
                    WHERE m.tenant_id = $1
                      AND ($2::role IS NULL OR m.role = $2)
                      AND ($3::text IS NULL OR u.name ILIKE $3)
                    "#,
                )
                .bind(tenant_id)
                .bind(filter.role)
                .bind(name_pattern.as_deref())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to count tenant users: {}", e);
                    AppError::Internal("Failed to list users".to_string())
                })?;

                let query = format!(
                    r#"
                    SELECT u.id, u.email, u.name, m.role AS role,
                           u.is_email_verified, m.deleted_at AS deleted_at
                    FROM users u
                    JOIN tenant_users m ON m.user_id = u.id
                    WHERE m.tenant_id = $1
                      AND ($2::role IS NULL OR m.role = $2)
                      AND ($3::text IS NULL OR u.name ILIKE $3)
                    ORDER BY u.{} {}
                    LIMIT $4 OFFSET $5
                    "#,
                    sort_column(sort),
                    order.as_sql()
                );
                let data = sqlx::query_as::<_, UserListItem>(&query)
                    .bind(tenant_id)
                    .bind(filter.role)
                    .bind(name_pattern.as_deref())
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(|e| {
                        tracing::error!("Failed to list tenant users: {}", e);
                        AppError::Internal("Failed to list users".to_string())
                    })?;

                (total, data)
            }
            None => {
                let total = sqlx::query_scalar::<_, i64>(
                    r#"
                    SELECT COUNT(*) FROM users
                    WHERE ($1::role IS NULL OR role = $1)
                      AND ($2::text IS NULL OR name ILIKE $2)
                    "#,
                )
                .bind(filter.role)
                .bind(name_pattern.as_deref())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to count users: {}", e);
                    AppError::Internal("Failed to list users".to_string())
                })?;

                let query = format!(
                    r#"
                    SELECT id, email, name, role, is_email_verified, deleted_at
                    FROM users
                    WHERE ($1::role IS NULL OR role = $1)
                      AND ($2::text IS NULL OR name ILIKE $2)
                    ORDER BY {} {}
                    LIMIT $3 OFFSET $4
                    "#,
                    sort_column(sort),
                    order.as_sql()
                );
                let data = sqlx::query_as::<_, UserListItem>(&query)
                    .bind(filter.role)
                    .bind(name_pattern.as_deref())
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(|e| {
                        tracing::error!("Failed to list users: {}", e);
                        AppError::Internal("Failed to list users".to_string())
                    })?;

                (total, data)
            }
        };

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

/// Whitelisted sort columns; anything else falls back to id.
fn sort_column(sort: Option<&str>) -> &'static str {
    match sort {
        Some("email") => "email",
        Some("name") => "name",
        Some("created_at") => "created_at",
        _ => "id",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_column_whitelist() {
        assert_eq!(sort_column(Some("email")), "email");
        assert_eq!(sort_column(Some("id; DROP TABLE users")), "id");
        assert_eq!(sort_column(None), "id");
    }
}
