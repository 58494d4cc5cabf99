//! Role-rights table.
//!
//! An immutable mapping from role to capability strings, shared read-only
//! across concurrent requests. Routes declare required rights; the access
//! gate checks them against the identity's effective role.

use crate::models::Role;

/// Capability string granted to a role.
pub type Right = &'static str;

pub const GET_USERS: Right = "get_users";
pub const MANAGE_USERS: Right = "manage_users";
pub const MANAGE_TENANTS: Right = "manage_tenants";

/// Rights granted to the given role.
pub fn rights_for(role: Role) -> &'static [Right] {
    match role {
        Role::User => &[],
        Role::Admin => &[GET_USERS, MANAGE_USERS],
        Role::Superadmin => &[GET_USERS, MANAGE_USERS, MANAGE_TENANTS],
    }
}

/// Whether the role grants every required right.
pub fn has_rights(role: Role, required: &[Right]) -> bool {
    let granted = rights_for(role);
    required.iter().all(|right| granted.contains(right))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_has_no_rights() {
        assert!(rights_for(Role::User).is_empty());
        assert!(!has_rights(Role::User, &[GET_USERS]));
    }

    #[test]
    fn test_admin_manages_users_but_not_tenants() {
        assert!(has_rights(Role::Admin, &[GET_USERS, MANAGE_USERS]));
        assert!(!has_rights(Role::Admin, &[MANAGE_TENANTS]));
    }

    #[test]
    fn test_superadmin_has_all_rights() {
        assert!(has_rights(
            Role::Superadmin,
            &[GET_USERS, MANAGE_USERS, MANAGE_TENANTS]
        ));
    }

    #[test]
    fn test_empty_requirement_always_passes() {
        assert!(has_rights(Role::User, &[]));
    }
}
