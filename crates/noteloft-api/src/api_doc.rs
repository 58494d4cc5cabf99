//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::auth::token::{AuthTokensResponse, TokenPair};
use crate::error::ErrorResponse;
use crate::handlers;
use noteloft_core::models::{AccessKind, Note, ResourceType, Role, TenantResponse, UserResponse};

/// Returns the OpenAPI spec served at /api/openapi.json.
pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Noteloft API",
        version = "0.1.0",
        description = "Multi-tenant workspace backend. Tenants are addressed by subdomain; bearer tokens are bound to the tenant they were issued for."
    ),
    paths(
        // Auth
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::refresh_tokens,
        handlers::auth::forgot_password,
        handlers::auth::reset_password,
        handlers::auth::send_verification_email,
        handlers::auth::verify_email,
        handlers::auth::me,
        // Tenants
        handlers::tenants::tenant_home,
        handlers::tenants::view_tenant,
        handlers::tenants::check_slug,
        handlers::tenants::create_tenant,
        // Profile
        handlers::profile::list_my_tenants,
        // Resources
        handlers::resources::list_resources,
        handlers::resources::get_resource,
        handlers::resources::create_resource,
        handlers::resources::update_resource,
        // Meta
        handlers::meta::list_access,
        // Admin users
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::get_user,
        handlers::users::update_user,
        handlers::users::disable_user,
        handlers::users::enable_user,
    ),
    components(schemas(
        ErrorResponse,
        Role,
        AccessKind,
        ResourceType,
        Note,
        UserResponse,
        TenantResponse,
        TokenPair,
        AuthTokensResponse,
        handlers::auth::RegisterRequest,
        handlers::auth::LoginRequest,
        handlers::auth::RefreshTokenRequest,
        handlers::auth::ForgotPasswordRequest,
        handlers::auth::ResetPasswordRequest,
        handlers::auth::VerifyEmailRequest,
        handlers::auth::AuthResponse,
        handlers::auth::MeResponse,
        handlers::tenants::CreateTenantRequest,
        handlers::tenants::TenantGreeting,
        handlers::tenants::SlugCheckResponse,
        handlers::resources::WriteResourceRequest,
        handlers::resources::NoteResourceResponse,
        handlers::resources::AuthorRef,
        handlers::meta::AccessEntry,
        handlers::users::CreateUserRequest,
        handlers::users::UpdateUserRequest,
    )),
    tags(
        (name = "auth", description = "Authentication and token lifecycle"),
        (name = "tenants", description = "Workspace management"),
        (name = "profile", description = "Caller's own data"),
        (name = "resources", description = "Visibility-scoped resources"),
        (name = "meta", description = "Catalogues"),
        (name = "users", description = "Admin user management")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_builds() {
        let spec = get_openapi_spec();
        assert!(spec.paths.paths.contains_key("/api/auth/login"));
        assert!(spec.paths.paths.contains_key("/api/resources/{resource_id}"));
        assert!(spec.paths.paths.contains_key("/admin/users/{user_id}"));
    }
}
