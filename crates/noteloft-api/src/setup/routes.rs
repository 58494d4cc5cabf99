//! Route configuration and setup.
//!
//! Tenant resolution wraps the whole `/api` and `/admin` trees so it runs
//! before any per-route access gate. Routes are grouped by their gate
//! policy: public-read, authenticated, or rights-gated.

use crate::auth::gate::{authorize, RoutePolicy};
use crate::auth::tenant::resolve_tenant;
use crate::handlers;
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use noteloft_core::rights::{GET_USERS, MANAGE_USERS};
use noteloft_core::Config;
use std::sync::Arc;
use std::time::Duration;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let api = Router::new()
        .route("/", get(index))
        .nest("/auth", auth_routes(&state))
        .nest("/tenants", tenant_routes(&state))
        .nest("/profile", profile_routes(&state))
        .nest("/resources", resource_routes(&state))
        .nest("/meta", meta_routes(&state));

    let admin = Router::new().nest("/users", admin_user_routes(&state));

    // Server-level concurrency limit to protect against resource exhaustion
    let http_concurrency_limit = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(10_000)
        .max(1);

    let app = Router::new()
        .nest("/api", api)
        .nest("/admin", admin)
        // Tenant resolution runs first on every API route
        .layer(middleware::from_fn_with_state(
            state.clone(),
            resolve_tenant,
        ))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
        .merge(utoipa_rapidoc::RapiDoc::new("/api/openapi.json").path("/docs"))
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins.contains(&"*".to_string()) {
        if config.is_production() {
            tracing::warn!("CORS configured to allow all origins - not recommended for production");
        }
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins: Result<Vec<HeaderValue>, _> =
            config.cors_origins.iter().map(|o| o.parse()).collect();

        CorsLayer::new()
            .allow_origin(origins.unwrap_or_default())
            .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
            .allow_headers(Any)
    };
    Ok(cors)
}

// Per-policy gate layers are built inline with `from_fn_with_state`; the
// layer type is not nameable, so there is no shared helper.
macro_rules! gate {
    ($state:expr, $policy:expr) => {
        middleware::from_fn_with_state(($state.clone(), $policy), authorize)
    };
}

/// Auth routes. Token-issuing endpoints are reachable without a credential;
/// `me` and verification-email sending require one.
fn auth_routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let open = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout))
        .route("/refresh-tokens", post(handlers::auth::refresh_tokens))
        .route("/forgot-password", post(handlers::auth::forgot_password))
        .route("/reset-password", post(handlers::auth::reset_password))
        .route("/verify-email", post(handlers::auth::verify_email));

    let authed = Router::new()
        .route(
            "/send-verification-email",
            post(handlers::auth::send_verification_email),
        )
        .route("/me", get(handlers::auth::me))
        .route_layer(gate!(state, RoutePolicy::authenticated()));

    open.merge(authed)
}

fn tenant_routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let open = Router::new().route("/", get(handlers::tenants::tenant_home));

    let authed = Router::new()
        .route("/slug-check/{slug}", get(handlers::tenants::check_slug))
        .route("/view", get(handlers::tenants::view_tenant))
        .route("/create", post(handlers::tenants::create_tenant))
        .route_layer(gate!(state, RoutePolicy::authenticated()));

    open.merge(authed)
}

fn profile_routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/tenants", get(handlers::profile::list_my_tenants))
        .route_layer(gate!(state, RoutePolicy::authenticated()))
}

/// Resource routes. Reads allow anonymous main-site access; writes never do.
fn resource_routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let read = Router::new()
        .route("/", get(handlers::resources::list_resources))
        .route(
            "/{resource_id}",
            get(handlers::resources::get_resource),
        )
        .route_layer(gate!(state, RoutePolicy::public_read()));

    let write = Router::new()
        .route("/", post(handlers::resources::create_resource))
        .route(
            "/{resource_id}",
            patch(handlers::resources::update_resource),
        )
        .route_layer(gate!(state, RoutePolicy::authenticated()));

    read.merge(write)
}

fn meta_routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/access", get(handlers::meta::list_access))
        .route_layer(gate!(state, RoutePolicy::authenticated()))
}

/// Admin user routes, gated by the role-rights table. The gate waives the
/// rights check when the `user_id` path parameter is the caller itself.
fn admin_user_routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let read = Router::new()
        .route("/", get(handlers::users::list_users))
        .route("/{user_id}", get(handlers::users::get_user))
        .route_layer(gate!(state, RoutePolicy::rights(&[GET_USERS])));

    let manage = Router::new()
        .route("/", post(handlers::users::create_user))
        .route("/{user_id}", patch(handlers::users::update_user))
        .route("/{user_id}/disable", post(handlers::users::disable_user))
        .route("/{user_id}/enable", post(handlers::users::enable_user))
        .route_layer(gate!(state, RoutePolicy::rights(&[MANAGE_USERS])));

    read.merge(manage)
}

async fn index() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "Hello" }))
}

/// Liveness probe - always returns 200 if the process can respond.
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "alive" })))
}

/// Readiness probe - checks critical dependencies (database).
async fn readiness_check(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
) -> impl IntoResponse {
    const TIMEOUT: Duration = Duration::from_secs(5);

    let mut response = serde_json::json!({
        "status": "ready",
        "database": "unknown"
    });
    let mut overall_ready = true;

    match tokio::time::timeout(TIMEOUT, sqlx::query("SELECT 1").execute(&state.pool)).await {
        Ok(Ok(_)) => {
            response["database"] = serde_json::json!("ready");
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Database readiness check failed");
            response["database"] = serde_json::json!(format!("not_ready: {}", e));
            overall_ready = false;
        }
        Err(_) => {
            tracing::error!("Database readiness check timed out");
            response["database"] = serde_json::json!("timeout");
            overall_ready = false;
        }
    }

    let status_code = if overall_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}
