use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Token kinds issued by the platform. Only `Access` authenticates API
/// calls; the other kinds drive the refresh and email flows and are
/// persisted so they can be revoked.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "token_kind", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    Access,
    Refresh,
    ResetPassword,
    VerifyEmail,
}

/// Persisted token row. Access tokens are stateless and never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TokenRecord {
    pub id: i64,
    pub token: String,
    pub user_id: i64,
    pub kind: TokenKind,
    pub tenant_id: Option<i64>,
    pub expires: DateTime<Utc>,
    pub blacklisted: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_kind_wire_names() {
        assert_eq!(
            serde_json::to_value(TokenKind::ResetPassword).expect("serialize"),
            serde_json::json!("RESET_PASSWORD")
        );
        assert_eq!(
            serde_json::from_value::<TokenKind>(serde_json::json!("ACCESS")).expect("deserialize"),
            TokenKind::Access
        );
    }
}
