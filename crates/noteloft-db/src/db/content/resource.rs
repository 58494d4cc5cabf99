use noteloft_core::models::{AccessKind, Note, Resource};
use noteloft_core::pagination::{calc_num_pages, PaginatedData, SortOrder};
use noteloft_core::{AppError, VisibilityScope};
use sqlx::PgPool;

const RESOURCE_COLUMNS: &str = r#"id, title, type, access, tenant_id, created_by, pinned, created_at, updated_at, deleted_at"#;

/// Storage-level translation of [`VisibilityScope`]: rows pass when either
/// the tenant-scope branch or the private-ownership branch holds. Binds:
/// $1 = scope tenant id (nullable), $2 = tenant-branch access kind,
/// $3 = scope user id. Must stay in lockstep with `VisibilityScope::allows`;
/// handlers re-check fetched rows with it.
const VISIBILITY_WHERE: &str = r#"
    r.deleted_at IS NULL
    AND r.type = 'NOTE'
    AND r.tenant_id IS NOT DISTINCT FROM $1
    AND (r.access = $2 OR (r.access = 'PRIVATE' AND r.created_by = $3))
"#;

/// Note resource joined with its payload and author, as returned by list
/// queries.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NoteResourceRecord {
    #[sqlx(flatten)]
    pub resource: Resource,
    #[sqlx(flatten)]
    pub note: Note,
    pub author_id: i64,
    pub author_name: Option<String>,
}

#[derive(Clone)]
pub struct ResourceRepository {
    pool: PgPool,
}

impl ResourceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List resources readable under the given scope, newest first by
    /// default. The visibility predicate is pushed down as the SQL filter.
    pub async fn list_visible(
        &self,
        scope: &VisibilityScope,
        page: i64,
        limit: i64,
        sort: Option<&str>,
        order: SortOrder,
    ) -> Result<PaginatedData<NoteResourceRecord>, AppError> {
        let offset = (page - 1) * limit;

        let count_query = format!(
            "SELECT COUNT(*) FROM resources r WHERE {}",
            VISIBILITY_WHERE
        );
        let total = sqlx::query_scalar::<_, i64>(&count_query)
            .bind(scope.tenant_id)
            .bind(scope.tenant_branch_access())
            .bind(scope.user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count resources: {}", e);
                AppError::Internal("Failed to list resources".to_string())
            })?;

        let list_query = format!(
            r#"
            SELECT r.id, r.title, r.type, r.access, r.tenant_id, r.created_by,
                   r.pinned, r.created_at, r.updated_at, r.deleted_at,
                   n.resource_id, n.content, n.delta,
                   u.id AS author_id, u.name AS author_name
            FROM resources r
            JOIN notes n ON n.resource_id = r.id
            JOIN users u ON u.id = r.created_by
            WHERE {}
            ORDER BY r.{} {}
            LIMIT $4 OFFSET $5
            "#,
            VISIBILITY_WHERE,
            sort_column(sort),
            order.as_sql()
        );
        let data = sqlx::query_as::<_, NoteResourceRecord>(&list_query)
            .bind(scope.tenant_id)
            .bind(scope.tenant_branch_access())
            .bind(scope.user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list resources: {}", e);
                AppError::Internal("Failed to list resources".to_string())
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

    /// Fetch a single resource through the same visibility filter used for
    /// lists. Callers must still re-check the row with
    /// `VisibilityScope::allows` after fetch.
    pub async fn find_visible_by_id(
        &self,
        scope: &VisibilityScope,
        id: i64,
    ) -> Result<Option<Resource>, AppError> {
        let query = format!(
            "SELECT {} FROM resources r WHERE r.id = $4 AND {}",
            resource_columns_prefixed(),
            VISIBILITY_WHERE
        );
        let resource = sqlx::query_as::<_, Resource>(&query)
            .bind(scope.tenant_id)
            .bind(scope.tenant_branch_access())
            .bind(scope.user_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch resource: {}", e);
                AppError::Internal("Failed to fetch resource".to_string())
            })?;

        Ok(resource)
    }

    /// Fetch a resource row without visibility filtering, for write-path
    /// authorship checks.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Resource>, AppError> {
        let resource = sqlx::query_as::<_, Resource>(&format!(
            "SELECT {} FROM resources WHERE id = $1 AND deleted_at IS NULL",
            RESOURCE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch resource: {}", e);
            AppError::Internal("Failed to fetch resource".to_string())
        })?;

        Ok(resource)
    }

    pub async fn find_note(&self, resource_id: i64) -> Result<Option<Note>, AppError> {
        let note = sqlx::query_as::<_, Note>(
            "SELECT resource_id, content, delta FROM notes WHERE resource_id = $1",
        )
        .bind(resource_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch note: {}", e);
            AppError::Internal("Failed to fetch note".to_string())
        })?;

        Ok(note)
    }

    /// Create a note resource. The resource row and its note payload are
    /// written in one transaction so a failure leaves no empty resource
    /// behind. `created_by` and `tenant_id` come from the acting identity.
    pub async fn create_note(
        &self,
        created_by: i64,
        tenant_id: Option<i64>,
        title: &str,
        access: AccessKind,
        content: &str,
        delta: &serde_json::Value,
    ) -> Result<(Resource, Note), AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            tracing::error!("Failed to begin note transaction: {}", e);
            AppError::Internal("Error creating note".to_string())
        })?;

        let resource = sqlx::query_as::<_, Resource>(&format!(
            r#"
            INSERT INTO resources (title, type, access, tenant_id, created_by, pinned)
            VALUES ($1, 'NOTE', $2, $3, $4, FALSE)
            RETURNING {}
            "#,
            RESOURCE_COLUMNS
        ))
        .bind(title)
        .bind(access)
        .bind(tenant_id)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create resource: {}", e);
            AppError::Internal("Error creating note".to_string())
        })?;

        let note = sqlx::query_as::<_, Note>(
            r#"
            INSERT INTO notes (resource_id, content, delta)
            VALUES ($1, $2, $3)
            RETURNING resource_id, content, delta
            "#,
        )
        .bind(resource.id)
        .bind(content)
        .bind(delta)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create note payload: {}", e);
            AppError::Internal("Error creating note".to_string())
        })?;

        tx.commit().await.map_err(|e| {
            tracing::error!("Failed to commit note transaction: {}", e);
            AppError::Internal("Error creating note".to_string())
        })?;

        Ok((resource, note))
    }

    /// Update a note resource and its payload atomically. Authorship and
    /// tenant stamping are never changed by updates.
    pub async fn update_note(
        &self,
        id: i64,
        title: &str,
        access: AccessKind,
        content: &str,
        delta: &serde_json::Value,
    ) -> Result<(Resource, Note), AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            tracing::error!("Failed to begin note transaction: {}", e);
            AppError::Internal("Error updating note".to_string())
        })?;

        let resource = sqlx::query_as::<_, Resource>(&format!(
            r#"
            UPDATE resources
            SET title = $2, access = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            RESOURCE_COLUMNS
        ))
        .bind(id)
        .bind(title)
        .bind(access)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::RowNotFound = e {
                AppError::NotFound("Resource not found".to_string())
            } else {
                tracing::error!("Failed to update resource: {}", e);
                AppError::Internal("Error updating note".to_string())
            }
        })?;

        let note = sqlx::query_as::<_, Note>(
            r#"
            UPDATE notes
            SET content = $2, delta = $3
            WHERE resource_id = $1
            RETURNING resource_id, content, delta
            "#,
        )
        .bind(id)
        .bind(content)
        .bind(delta)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::RowNotFound = e {
                AppError::NotFound("Resource not found".to_string())
            } else {
                tracing::error!("Failed to update note payload: {}", e);
                AppError::Internal("Error updating note".to_string())
            }
        })?;

        tx.commit().await.map_err(|e| {
            tracing::error!("Failed to commit note transaction: {}", e);
            AppError::Internal("Error updating note".to_string())
        })?;

        Ok((resource, note))
    }
}

fn resource_columns_prefixed() -> String {
    RESOURCE_COLUMNS
        .split(", ")
        .map(|c| format!("r.{}", c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Whitelisted sort columns; anything else falls back to created_at.
fn sort_column(sort: Option<&str>) -> &'static str {
    match sort {
        Some("id") => "id",
        Some("title") => "title",
        Some("updated_at") => "updated_at",
        _ => "created_at",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_column_whitelist() {
        assert_eq!(sort_column(Some("title")), "title");
        assert_eq!(sort_column(Some("created_at; --")), "created_at");
        assert_eq!(sort_column(None), "created_at");
    }

    #[test]
    fn test_resource_columns_prefixed() {
        let prefixed = resource_columns_prefixed();
        assert!(prefixed.starts_with("r.id, r.title"));
        assert!(prefixed.contains("r.deleted_at"));
    }
}
