//! Profile handlers: the caller's own tenant roster.

use crate::auth::models::AuthedUser;
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use noteloft_core::pagination::SortOrder;
use serde::Deserialize;
use std::sync::Arc;

const DEFAULT_PAGE_SIZE: i64 = 10;

#[derive(Debug, Deserialize)]
pub struct ListTenantsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub order: Option<SortOrder>,
}

/// List the tenants the caller belongs to, with per-tenant role and join
/// date.
#[utoipa::path(
    get,
    path = "/api/profile/tenants",
    tag = "profile",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Page size")
    ),
    responses(
        (status = 200, description = "Page of tenants", body = serde_json::Value)
    )
)]
#[tracing::instrument(skip(state, user))]
pub async fn list_my_tenants(
    State(state): State<Arc<AppState>>,
    user: AuthedUser,
    Query(query): Query<ListTenantsQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 100);
    let order = query.order.unwrap_or(SortOrder::Asc);

    let result = state
        .tenants
        .list_for_user_paginated(user.id, page, limit, order)
        .await?;

    Ok(Json(result))
}
