//! Role-based authorization gate.
//!
//! Roles form an explicit hierarchy: a role satisfies a requirement when it
//! equals the required role or implies it, directly or transitively.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::domain::entities::{Identity, Role};
use crate::errors::AuthError;

/// Which roles imply which other roles
#[derive(Debug, Clone, Default)]
pub struct RoleHierarchy {
    implies: HashMap<Role, HashSet<Role>>,
}

impl RoleHierarchy {
    /// A hierarchy where every role only satisfies itself
    pub fn flat() -> Self {
        Self::default()
    }

    /// The deployed hierarchy: `ADMIN` implies `USER`
    pub fn standard() -> Self {
        Self::flat().with(Role::Admin, Role::User)
    }

    /// Declare that holding `role` also grants `implied`
    pub fn with(mut self, role: Role, implied: Role) -> Self {
        self.implies.entry(role).or_default().insert(implied);
        self
    }

    /// Whether `held` satisfies a requirement for `required`
    pub fn satisfies(&self, held: Role, required: Role) -> bool {
        let mut seen = HashSet::new();
        let mut pending = vec![held];
        while let Some(role) = pending.pop() {
            if role == required {
                return true;
            }
            if seen.insert(role) {
                if let Some(implied) = self.implies.get(&role) {
                    pending.extend(implied.iter().copied());
                }
            }
        }
        false
    }
}

/// Checks a verified identity against a required role
#[derive(Debug, Clone)]
pub struct AuthorizationGate {
    hierarchy: RoleHierarchy,
}

impl Default for AuthorizationGate {
    fn default() -> Self {
        Self::new(RoleHierarchy::standard())
    }
}

impl AuthorizationGate {
    pub fn new(hierarchy: RoleHierarchy) -> Self {
        Self { hierarchy }
    }

    /// # Returns
    /// * `Ok(())` - The identity's role satisfies `required`
    /// * `Err(AuthError::Forbidden)` - It does not
    pub fn authorize(&self, identity: &Identity, required: Role) -> Result<(), AuthError> {
        if self.hierarchy.satisfies(identity.role(), required) {
            Ok(())
        } else {
            debug!(
                user_id = %identity.user_id(),
                role = %identity.role(),
                required = %required,
                "Authorization denied"
            );
            Err(AuthError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn identity(role: Role) -> Identity {
        Identity::new(Uuid::new_v4(), role, "jti".to_string(), Utc::now())
    }

    #[test]
    fn test_standard_hierarchy() {
        let gate = AuthorizationGate::default();

        assert!(gate.authorize(&identity(Role::Admin), Role::Admin).is_ok());
        assert!(gate.authorize(&identity(Role::Admin), Role::User).is_ok());
        assert!(gate.authorize(&identity(Role::User), Role::User).is_ok());
        assert_eq!(
            gate.authorize(&identity(Role::User), Role::Admin),
            Err(AuthError::Forbidden)
        );
    }

    #[test]
    fn test_flat_hierarchy_requires_exact_role() {
        let gate = AuthorizationGate::new(RoleHierarchy::flat());
        assert_eq!(
            gate.authorize(&identity(Role::Admin), Role::User),
            Err(AuthError::Forbidden)
        );
    }

    #[test]
    fn test_cycles_terminate() {
        let hierarchy = RoleHierarchy::flat()
            .with(Role::Admin, Role::User)
            .with(Role::User, Role::Admin);
        assert!(hierarchy.satisfies(Role::User, Role::Admin));
        assert!(hierarchy.satisfies(Role::Admin, Role::User));
    }
}
