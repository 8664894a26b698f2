//! Membership domain models
//!
//! This module provides the membership entity linking users to
//! organizational units. Removal is a soft delete: the row is retained
//! with status Removed so history and the "one active membership per
//! (user, unit)" constraint stay intact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::roles::OrgRole;

/// Lifecycle status of a membership.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    /// Currently a member
    Active,

    /// Soft-deleted; retained for history
    Removed,
}

/// A user's membership in an organizational unit.
///
/// At most one Active membership may exist per (user, unit) pair.
/// Memberships either originate from an accepted invite (`invite_id`
/// set) or from direct admission at unit creation.
///
/// # Examples
///
/// ```
/// use uuid::Uuid;
/// use communa_org::{Membership, OrgRole};
///
/// let unit_id = Uuid::now_v7();
/// let user_id = Uuid::now_v7();
/// let membership = Membership::new(unit_id, user_id, OrgRole::Member);
/// assert!(membership.is_active());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    /// Unique membership ID
    pub id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Organizational unit ID
    pub org_unit_id: Uuid,

    /// Role within the unit
    pub role: OrgRole,

    /// Lifecycle status
    pub status: MembershipStatus,

    /// When the user joined
    pub joined_at: DateTime<Utc>,

    /// When the user left or was removed (set on removal)
    pub left_at: Option<DateTime<Utc>>,

    /// The accepted invite this membership originated from, if any
    pub invite_id: Option<Uuid>,
}

impl Membership {
    /// Creates a new active membership.
    ///
    /// # Arguments
    ///
    /// * `org_unit_id` - The unit being joined
    /// * `user_id` - The joining user
    /// * `role` - The user's role in the unit
    pub fn new(org_unit_id: Uuid, user_id: Uuid, role: OrgRole) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            org_unit_id,
            role,
            status: MembershipStatus::Active,
            joined_at: Utc::now(),
            left_at: None,
            invite_id: None,
        }
    }

    /// Record the invite this membership originated from.
    pub fn with_invite(mut self, invite_id: Uuid) -> Self {
        self.invite_id = Some(invite_id);
        self
    }

    /// Check if the membership is currently active.
    pub fn is_active(&self) -> bool {
        self.status == MembershipStatus::Active
    }

    /// Check if this is an active coordinator membership.
    pub fn is_active_coordinator(&self) -> bool {
        self.is_active() && self.role.is_coordinator()
    }

    /// Soft-delete the membership, stamping the departure time.
    pub fn remove(&mut self, now: DateTime<Utc>) {
        self.status = MembershipStatus::Removed;
        self.left_at = Some(now);
    }
}
