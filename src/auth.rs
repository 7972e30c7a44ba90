//! Room management authorization
//!
//! The registry asks an `Authorizer` before creating or deleting rooms.

use std::collections::HashSet;

use crate::types::{Role, User};

/// Decides who may create and delete rooms
pub trait Authorizer: Send + Sync {
    fn can_manage_rooms(&self, user: &User) -> bool;
}

/// Grants room management to admins and the system principal
#[derive(Debug, Clone, Default)]
pub struct RoleAuthorizer;

impl Authorizer for RoleAuthorizer {
    fn can_manage_rooms(&self, user: &User) -> bool {
        matches!(user.role, Role::Admin | Role::System)
    }
}

/// Resolves a connecting username to a `User` using the configured admin list
#[derive(Debug, Clone, Default)]
pub struct RoleResolver {
    admins: HashSet<String>,
}

impl RoleResolver {
    pub fn new<I, S>(admins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            admins: admins.into_iter().map(Into::into).collect(),
        }
    }

    /// Anonymous connections are always plain users
    pub fn resolve(&self, username: &str) -> User {
        let role = if !username.is_empty() && self.admins.contains(username) {
            Role::Admin
        } else {
            Role::User
        };
        User::new(username, role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_authorizer() {
        let auth = RoleAuthorizer;
        assert!(auth.can_manage_rooms(&User::system()));
        assert!(auth.can_manage_rooms(&User::new("root", Role::Admin)));
        assert!(!auth.can_manage_rooms(&User::new("alice", Role::User)));
    }

    #[test]
    fn test_resolver_promotes_listed_admins() {
        let resolver = RoleResolver::new(["root"]);
        assert_eq!(resolver.resolve("root").role, Role::Admin);
        assert_eq!(resolver.resolve("alice").role, Role::User);
    }

    #[test]
    fn test_resolver_never_promotes_anonymous() {
        let resolver = RoleResolver::new([""]);
        assert_eq!(resolver.resolve("").role, Role::User);
    }
}
