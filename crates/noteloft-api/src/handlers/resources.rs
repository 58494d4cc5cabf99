//! Resource handlers: visibility-filtered list and read, plus note create
//! and update.

use crate::auth::models::AuthedUser;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use crate::utils::html::decode_html_entities;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use noteloft_core::models::{AccessKind, Note, Resource, ResourceType};
use noteloft_core::pagination::{PaginatedData, SortOrder};
use noteloft_core::AppError;
use noteloft_db::NoteResourceRecord;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

const DEFAULT_PAGE_SIZE: i64 = 10;

#[derive(Debug, Deserialize)]
pub struct ListResourcesQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort: Option<String>,
    pub order: Option<SortOrder>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct WriteResourceRequest {
    /// Resource type name; only "NOTE" has an implemented handler.
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    #[validate(length(min = 1))]
    pub title: String,
    pub content: String,
    pub delta: serde_json::Value,
    pub access: Option<AccessKind>,
}

/// Map the requested type name to an implemented handler; anything without
/// one is reported as unsupported, not invalid.
fn requested_type(request: &WriteResourceRequest) -> Result<ResourceType, AppError> {
    match request.resource_type.as_deref() {
        None | Some("NOTE") => Ok(ResourceType::Note),
        Some(_) => Err(AppError::ResourceTypeUnsupported(
            "Resource type not yet implemented".to_string(),
        )),
    }
}

/// Resource author, reduced to the fields safe to expose.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthorRef {
    pub id: i64,
    pub name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NoteResourceResponse {
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub resource: Resource,
    pub note: Note,
    pub user: AuthorRef,
}

impl NoteResourceResponse {
    fn from_record(record: NoteResourceRecord) -> Self {
        Self {
            resource: record.resource,
            note: record.note,
            user: AuthorRef {
                id: record.author_id,
                name: record.author_name,
            },
        }
    }

    fn from_parts(resource: Resource, note: Note, author: AuthorRef) -> Self {
        Self {
            resource,
            note,
            user: author,
        }
    }
}

/// List resources readable by the caller. Anonymous main-site callers see
/// only public resources.
#[utoipa::path(
    get,
    path = "/api/resources",
    tag = "resources",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Page size"),
        ("sort" = Option<String>, Query, description = "Sort column"),
        ("order" = Option<String>, Query, description = "asc or desc")
    ),
    responses(
        (status = 200, description = "Page of resources", body = serde_json::Value)
    )
)]
#[tracing::instrument(skip(state, user))]
pub async fn list_resources(
    State(state): State<Arc<AppState>>,
    user: AuthedUser,
    Query(query): Query<ListResourcesQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 100);
    let order = query.order.unwrap_or(SortOrder::Desc);

    let result = state
        .resources
        .list_visible(
            &user.visibility_scope(),
            page,
            limit,
            query.sort.as_deref(),
            order,
        )
        .await?;

    let response = PaginatedData {
        total: result.total,
        data: result
            .data
            .into_iter()
            .map(NoteResourceResponse::from_record)
            .collect::<Vec<_>>(),
        page: result.page,
        next_page: result.next_page,
        pages: result.pages,
        limit: result.limit,
    };

    Ok(Json(response))
}

/// Fetch a single resource by id. Invisible and nonexistent resources are
/// indistinguishable to the caller.
#[utoipa::path(
    get,
    path = "/api/resources/{resource_id}",
    tag = "resources",
    params(("resource_id" = i64, Path, description = "Resource ID")),
    responses(
        (status = 200, description = "Resource found", body = NoteResourceResponse),
        (status = 404, description = "Resource not found or not visible", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, user))]
pub async fn get_resource(
    State(state): State<Arc<AppState>>,
    user: AuthedUser,
    Path(resource_id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    let scope = user.visibility_scope();
    let resource = state
        .resources
        .find_visible_by_id(&scope, resource_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Resource not found".to_string()))?;

    // Re-check the fetched row against the identity's actual tenant scope.
    // The storage filter and this rule must not drift apart; in particular a
    // TENANT-access row from another tenant is rejected here even if a
    // looser query returned it.
    if !scope.allows(&resource) {
        return Err(HttpAppError(AppError::NotFound(
            "Resource not found".to_string(),
        )));
    }

    match resource.resource_type {
        ResourceType::Note => {
            let note = state
                .resources
                .find_note(resource.id)
                .await?
                .ok_or_else(|| AppError::NotFound("Resource of type NOTE not found".to_string()))?;
            let author = state.users.find_by_id(resource.created_by).await?;
            let author = AuthorRef {
                id: resource.created_by,
                name: author.and_then(|a| a.name),
            };
            Ok(Json(NoteResourceResponse::from_parts(resource, note, author)))
        }
    }
}

/// Create a note resource. Authorship and tenant are stamped from the
/// acting identity, never from the request body.
#[utoipa::path(
    post,
    path = "/api/resources",
    tag = "resources",
    request_body = WriteResourceRequest,
    responses(
        (status = 201, description = "Resource created", body = NoteResourceResponse),
        (status = 400, description = "Invalid access for scope", body = ErrorResponse),
        (status = 501, description = "Unsupported resource type", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, user, request))]
pub async fn create_resource(
    State(state): State<Arc<AppState>>,
    user: AuthedUser,
    ValidatedJson(request): ValidatedJson<WriteResourceRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let requested = requested_type(&request)?;
    let access = request.access.unwrap_or(AccessKind::Private);
    check_access_for_scope(access, user.tenant_id())?;

    match requested {
        ResourceType::Note => {
            let content = decode_html_entities(&request.content);
            let (resource, note) = state
                .resources
                .create_note(
                    user.id,
                    user.tenant_id(),
                    &request.title,
                    access,
                    &content,
                    &request.delta,
                )
                .await?;
            let author = AuthorRef {
                id: user.id,
                name: user.name.clone(),
            };
            Ok((
                StatusCode::CREATED,
                Json(NoteResourceResponse::from_parts(resource, note, author)),
            ))
        }
    }
}

/// Update a note resource. Only the author or an elevated role may write.
#[utoipa::path(
    patch,
    path = "/api/resources/{resource_id}",
    tag = "resources",
    params(("resource_id" = i64, Path, description = "Resource ID")),
    request_body = WriteResourceRequest,
    responses(
        (status = 200, description = "Resource updated", body = NoteResourceResponse),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Resource not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, user, request))]
pub async fn update_resource(
    State(state): State<Arc<AppState>>,
    user: AuthedUser,
    Path(resource_id): Path<i64>,
    ValidatedJson(request): ValidatedJson<WriteResourceRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let existing = state
        .resources
        .find_by_id(resource_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Resource not found".to_string()))?;

    if !user.is_admin() && existing.created_by != user.id {
        return Err(HttpAppError(AppError::Forbidden(
            "Unauthorized to perform action on resource".to_string(),
        )));
    }

    let requested = requested_type(&request)?;
    let access = request.access.unwrap_or(existing.access);
    check_access_for_scope(access, existing.tenant_id)?;

    match requested {
        ResourceType::Note => {
            let content = decode_html_entities(&request.content);
            let (resource, note) = state
                .resources
                .update_note(resource_id, &request.title, access, &content, &request.delta)
                .await?;
            let author = state.users.find_by_id(resource.created_by).await?;
            let author = AuthorRef {
                id: resource.created_by,
                name: author.and_then(|a| a.name),
            };
            Ok(Json(NoteResourceResponse::from_parts(resource, note, author)))
        }
    }
}

/// Enforce the access/tenant invariants at write time: PUBLIC never carries
/// a tenant, TENANT always does.
fn check_access_for_scope(access: AccessKind, tenant_id: Option<i64>) -> Result<(), AppError> {
    match access {
        AccessKind::Public if tenant_id.is_some() => Err(AppError::BadRequest(
            "Public resources cannot belong to a tenant".to_string(),
        )),
        AccessKind::Tenant if tenant_id.is_none() => Err(AppError::BadRequest(
            "Tenant resources require a tenant scope".to_string(),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_request(resource_type: Option<&str>) -> WriteResourceRequest {
        WriteResourceRequest {
            resource_type: resource_type.map(String::from),
            title: "t".to_string(),
            content: "c".to_string(),
            delta: serde_json::json!({}),
            access: None,
        }
    }

    #[test]
    fn test_requested_type_defaults_to_note() {
        assert_eq!(
            requested_type(&write_request(None)).expect("note"),
            ResourceType::Note
        );
        assert_eq!(
            requested_type(&write_request(Some("NOTE"))).expect("note"),
            ResourceType::Note
        );
    }

    #[test]
    fn test_unknown_type_is_unsupported_not_invalid() {
        let err = requested_type(&write_request(Some("BOOKMARK"))).expect_err("unsupported");
        assert!(matches!(err, AppError::ResourceTypeUnsupported(_)));
    }

    #[test]
    fn test_access_scope_invariants() {
        assert!(check_access_for_scope(AccessKind::Public, None).is_ok());
        assert!(check_access_for_scope(AccessKind::Public, Some(1)).is_err());
        assert!(check_access_for_scope(AccessKind::Tenant, Some(1)).is_ok());
        assert!(check_access_for_scope(AccessKind::Tenant, None).is_err());
        assert!(check_access_for_scope(AccessKind::Private, None).is_ok());
        assert!(check_access_for_scope(AccessKind::Private, Some(1)).is_ok());
    }
}
