//! Resource visibility scope.
//!
//! `VisibilityScope` is the single source of truth for which resources an
//! identity may read. Repositories translate it into a storage filter for
//! list queries, and handlers re-check fetched rows with [`VisibilityScope::allows`]
//! so the pushed-down filter and the in-memory rule cannot drift apart.

use crate::models::{AccessKind, Resource};

/// The reader's scope: who is asking, and from which tenant (if any).
/// Constructed fresh per request from the resolved identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityScope {
    pub user_id: i64,
    pub tenant_id: Option<i64>,
}

impl VisibilityScope {
    pub fn new(user_id: i64, tenant_id: Option<i64>) -> Self {
        Self { user_id, tenant_id }
    }

    /// Access kind matched by the tenant-scope branch of the predicate:
    /// `Tenant` when the reader has a tenant, otherwise the fallback to
    /// `Public` resources.
    pub fn tenant_branch_access(&self) -> AccessKind {
        if self.tenant_id.is_some() {
            AccessKind::Tenant
        } else {
            AccessKind::Public
        }
    }

    /// Whether this scope may read the given resource.
    ///
    /// A resource is visible iff it is not soft-deleted and either:
    /// - tenant-scope branch: its tenant id equals the reader's tenant id
    ///   (both possibly null) and its access equals
    ///   [`Self::tenant_branch_access`], or
    /// - private-ownership branch: it is `Private`, its tenant id equals the
    ///   reader's tenant id, and the reader created it.
    ///
    /// Repositories push the same rule down as SQL; direct-by-id reads must
    /// re-check fetched rows with this method.
    pub fn allows(&self, resource: &Resource) -> bool {
        if resource.deleted_at.is_some() {
            return false;
        }
        if resource.tenant_id != self.tenant_id {
            return false;
        }

        let tenant_branch = resource.access == self.tenant_branch_access();
        let private_branch =
            resource.access == AccessKind::Private && resource.created_by == self.user_id;

        tenant_branch || private_branch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResourceType;
    use chrono::Utc;

    fn resource(access: AccessKind, tenant_id: Option<i64>, created_by: i64) -> Resource {
        Resource {
            id: 42,
            title: "note".to_string(),
            resource_type: ResourceType::Note,
            access,
            tenant_id,
            created_by,
            pinned: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_private_visible_only_to_creator() {
        let owned = resource(AccessKind::Private, None, 7);
        assert!(VisibilityScope::new(7, None).allows(&owned));
        assert!(!VisibilityScope::new(8, None).allows(&owned));
    }

    #[test]
    fn test_private_within_tenant_needs_matching_tenant() {
        let owned = resource(AccessKind::Private, Some(3), 7);
        assert!(VisibilityScope::new(7, Some(3)).allows(&owned));
        assert!(!VisibilityScope::new(7, None).allows(&owned));
        assert!(!VisibilityScope::new(7, Some(4)).allows(&owned));
    }

    #[test]
    fn test_tenant_resource_visible_only_to_that_tenant() {
        let shared = resource(AccessKind::Tenant, Some(7), 1);
        assert!(VisibilityScope::new(99, Some(7)).allows(&shared));
        // reader bound to another tenant: invisible even post-fetch
        assert!(!VisibilityScope::new(99, Some(9)).allows(&shared));
        assert!(!VisibilityScope::new(99, None).allows(&shared));
    }

    #[test]
    fn test_public_visible_only_without_tenant_scope() {
        let public = resource(AccessKind::Public, None, 1);
        assert!(VisibilityScope::new(0, None).allows(&public));
        assert!(VisibilityScope::new(5, None).allows(&public));
        // the tenant-branch fallback deliberately hides PUBLIC rows from
        // tenant-scoped readers
        assert!(!VisibilityScope::new(5, Some(2)).allows(&public));
    }

    #[test]
    fn test_soft_deleted_never_visible() {
        let mut gone = resource(AccessKind::Public, None, 7);
        gone.deleted_at = Some(Utc::now());
        assert!(!VisibilityScope::new(7, None).allows(&gone));
    }

    #[test]
    fn test_tenant_branch_access_fallback() {
        assert_eq!(
            VisibilityScope::new(1, Some(2)).tenant_branch_access(),
            AccessKind::Tenant
        );
        assert_eq!(
            VisibilityScope::new(1, None).tenant_branch_access(),
            AccessKind::Public
        );
    }
}
