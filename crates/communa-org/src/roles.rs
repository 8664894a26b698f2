//! Role definitions
//!
//! This module defines the per-unit membership roles and the global
//! platform roles, along with their permission predicates.

use serde::{Deserialize, Serialize};

/// A member's role within a single organizational unit.
///
/// Roles are ordered: Member < Coordinator. A coordinator manages the
/// unit — inviting members, changing roles, and creating child units.
///
/// # Examples
///
/// ```
/// use communa_org::OrgRole;
///
/// let role = OrgRole::Coordinator;
/// assert!(role.is_coordinator());
/// assert!(!OrgRole::Member.is_coordinator());
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrgRole {
    /// Regular member of the unit
    Member = 0,

    /// Manages the unit: invites, role changes, child units
    Coordinator = 1,
}

impl OrgRole {
    /// Check if this role carries coordination rights.
    pub fn is_coordinator(&self) -> bool {
        *self >= OrgRole::Coordinator
    }

    /// Parse role from string representation.
    ///
    /// # Examples
    ///
    /// ```
    /// use communa_org::OrgRole;
    ///
    /// assert_eq!(OrgRole::parse("coordinator"), Some(OrgRole::Coordinator));
    /// assert_eq!(OrgRole::parse("MEMBER"), Some(OrgRole::Member));
    /// assert_eq!(OrgRole::parse("invalid"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "member" => Some(Self::Member),
            "coordinator" => Some(Self::Coordinator),
            _ => None,
        }
    }

    /// Get string representation of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Coordinator => "coordinator",
        }
    }

    /// Get a human-readable display name for the role.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Member => "Member",
            Self::Coordinator => "Coordinator",
        }
    }
}

impl Default for OrgRole {
    fn default() -> Self {
        Self::Member
    }
}

/// Platform-wide role held by a user independently of any unit.
///
/// Global roles are granted out of band (by operations staff) and are
/// carried on the authenticated actor, not stored with memberships.
///
/// - **Admin**: may view any unit and manage members anywhere
/// - **Developer**: Admin rights, plus bootstrap rights — only a
///   Developer may create the root Council
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GlobalRole {
    /// Platform administrator
    Admin,

    /// Platform developer (bootstrap rights)
    Developer,
}

impl GlobalRole {
    /// Check if this role grants elevated (admin-level) access.
    ///
    /// Both Admin and Developer are elevated.
    pub fn is_elevated(&self) -> bool {
        matches!(self, Self::Admin | Self::Developer)
    }

    /// Parse role from string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "developer" => Some(Self::Developer),
            _ => None,
        }
    }

    /// Get string representation of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Developer => "developer",
        }
    }
}
