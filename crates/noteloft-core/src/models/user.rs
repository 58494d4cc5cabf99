use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;

/// Platform and tenant role.
///
/// A user carries a global role; a tenant membership carries its own role
/// local to that tenant. `Superadmin` is only meaningful globally.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "role", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Admin,
    Superadmin,
}

impl Role {
    /// Elevated roles may act on resources they did not create.
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin | Role::Superadmin)
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Role::User => write!(f, "USER"),
            Role::Admin => write!(f, "ADMIN"),
            Role::Superadmin => write!(f, "SUPERADMIN"),
        }
    }
}

/// User entity. A non-null `deleted_at` marks the account disabled
/// platform-wide without deleting history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: Option<String>,
    pub role: Role,
    pub is_email_verified: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User fields safe to expose to API callers. `role` is the effective role
/// for the request scope, which may differ from the stored global role.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    pub is_email_verified: bool,
}

impl UserResponse {
    /// Build a response with an explicit effective role.
    pub fn with_role(user: &User, role: Role) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role,
            is_email_verified: user.is_email_verified,
        }
    }
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        UserResponse::with_role(user, user.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_admin() {
        assert!(!Role::User.is_admin());
        assert!(Role::Admin.is_admin());
        assert!(Role::Superadmin.is_admin());
    }

    #[test]
    fn test_role_serializes_screaming() {
        assert_eq!(
            serde_json::to_value(Role::Superadmin).expect("serialize"),
            serde_json::json!("SUPERADMIN")
        );
    }

    #[test]
    fn test_user_response_hides_password_hash() {
        let json = serde_json::to_value(UserResponse {
            id: 1,
            email: "a@b.c".to_string(),
            name: None,
            role: Role::User,
            is_email_verified: false,
        })
        .expect("serialize");
        assert!(json.get("password_hash").is_none());
    }
}
