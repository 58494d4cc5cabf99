//! Tenant resolution middleware.
//!
//! Runs before authentication on every API route. The left-most subdomain
//! label in front of the configured base domain names the tenant; no label
//! means the main site. A label that does not resolve to an enabled tenant
//! fails the request rather than silently falling back to main.

use crate::auth::models::RequestTenant;
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::header::HOST,
    middleware::Next,
    response::{IntoResponse, Response},
};
use noteloft_core::AppError;
use std::sync::Arc;

/// Extract the left-most subdomain label from a host name, relative to the
/// configured base domain. Returns `None` for the base domain itself and for
/// hosts outside it.
pub fn extract_subdomain(host: &str, base_domain: &str) -> Option<String> {
    let host = host
        .split(':')
        .next()
        .unwrap_or(host)
        .trim_end_matches('.')
        .to_ascii_lowercase();
    let base = base_domain.trim_end_matches('.').to_ascii_lowercase();

    if host == base {
        return None;
    }
    let prefix = host.strip_suffix(&format!(".{}", base))?;
    prefix.split('.').next().map(String::from)
}

/// Resolve the request's tenant from its Host header and attach it to
/// request extensions for the rest of the pipeline.
pub async fn resolve_tenant(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let host = request
        .headers()
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    let tenant = match extract_subdomain(host, &state.config.base_domain) {
        None => None,
        Some(slug) => match state.tenants.find_enabled_by_slug(&slug).await {
            Ok(Some(tenant)) => {
                tracing::debug!(tenant = %tenant.slug, "Resolved request tenant");
                Some(tenant)
            }
            Ok(None) => {
                return HttpAppError(AppError::TenantUnavailable(
                    "Tenant not enabled".to_string(),
                ))
                .into_response();
            }
            Err(e) => return HttpAppError(e).into_response(),
        },
    };

    request.extensions_mut().insert(RequestTenant(tenant));
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subdomain_on_base_domain() {
        assert_eq!(extract_subdomain("example.com", "example.com"), None);
        assert_eq!(extract_subdomain("example.com:3000", "example.com"), None);
        assert_eq!(extract_subdomain("localhost:3000", "localhost"), None);
    }

    #[test]
    fn test_single_label() {
        assert_eq!(
            extract_subdomain("acme.example.com", "example.com"),
            Some("acme".to_string())
        );
        assert_eq!(
            extract_subdomain("acme.localhost:3000", "localhost"),
            Some("acme".to_string())
        );
    }

    #[test]
    fn test_leftmost_label_wins() {
        assert_eq!(
            extract_subdomain("a.b.example.com", "example.com"),
            Some("a".to_string())
        );
    }

    #[test]
    fn test_case_insensitive_host() {
        assert_eq!(
            extract_subdomain("ACME.Example.COM", "example.com"),
            Some("acme".to_string())
        );
    }

    #[test]
    fn test_unrelated_host_is_untenanted() {
        assert_eq!(extract_subdomain("other.org", "example.com"), None);
        // a suffix that is not a label boundary must not match
        assert_eq!(extract_subdomain("notexample.com", "example.com"), None);
    }
}
