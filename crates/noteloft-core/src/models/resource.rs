use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Access classification of a resource.
/// Invariants: `Public` implies no tenant id; `Tenant` implies a tenant id;
/// `Private` may carry either but always has a creator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "access_kind", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessKind {
    Private,
    Public,
    Tenant,
}

/// Resource payload discriminator. Only notes are implemented; other kinds
/// surface `ResourceTypeUnsupported`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "resource_type", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceType {
    Note,
}

/// Resource entity. The typed payload (e.g. [`Note`]) lives in its own row;
/// the two are written atomically.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Resource {
    pub id: i64,
    pub title: String,
    #[serde(rename = "type")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "type"))]
    pub resource_type: ResourceType,
    pub access: AccessKind,
    pub tenant_id: Option<i64>,
    pub created_by: i64,
    pub pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Note payload attached to a `ResourceType::Note` resource.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Note {
    pub resource_id: i64,
    pub content: String,
    /// Editor delta document, stored verbatim.
    pub delta: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_kind_wire_names() {
        assert_eq!(
            serde_json::to_value(AccessKind::Tenant).expect("serialize"),
            serde_json::json!("TENANT")
        );
    }

    #[test]
    fn test_resource_type_field_serializes_as_type() {
        let resource = Resource {
            id: 1,
            title: "t".to_string(),
            resource_type: ResourceType::Note,
            access: AccessKind::Private,
            tenant_id: None,
            created_by: 7,
            pinned: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        };
        let json = serde_json::to_value(&resource).expect("serialize");
        assert_eq!(json.get("type"), Some(&serde_json::json!("NOTE")));
        assert!(json.get("resource_type").is_none());
    }
}
