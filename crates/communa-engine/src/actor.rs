//! Authenticated caller identity
//!
//! The engine never verifies tokens; it receives an already
//! authenticated actor (user id plus global roles) from the
//! authentication collaborator and resolves everything else itself.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use communa_org::GlobalRole;

/// The authenticated caller of an engine operation.
///
/// # Examples
///
/// ```
/// use uuid::Uuid;
/// use communa_engine::Actor;
/// use communa_org::GlobalRole;
///
/// let dev = Actor::new(Uuid::now_v7()).with_global_role(GlobalRole::Developer);
/// assert!(dev.is_admin());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    /// The caller's user id
    pub user_id: Uuid,

    /// Global platform roles granted to the caller
    #[serde(default)]
    pub global_roles: Vec<GlobalRole>,
}

impl Actor {
    /// Create an actor with no global roles.
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            global_roles: Vec::new(),
        }
    }

    /// Grant a global role.
    pub fn with_global_role(mut self, role: GlobalRole) -> Self {
        if !self.global_roles.contains(&role) {
            self.global_roles.push(role);
        }
        self
    }

    /// Check if the actor holds any elevated global role.
    pub fn is_admin(&self) -> bool {
        self.global_roles.iter().any(GlobalRole::is_elevated)
    }

    /// Check if the actor holds a specific global role.
    pub fn has_global_role(&self, role: GlobalRole) -> bool {
        self.global_roles.contains(&role)
    }
}
