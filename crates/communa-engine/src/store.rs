//! In-memory organization store
//!
//! Holds the three record collections (units, memberships, invites) as
//! explicit id-indexed maps plus the set of known user ids. The tree is
//! pure adjacency: children are found by scanning `parent_id`, never
//! through back-references.
//!
//! The store itself is plain data. The engine wraps one [`StoreState`]
//! in a `tokio::sync::RwLock`; a single write-guard acquisition is the
//! transaction under which every invariant is re-validated before any
//! write becomes visible.

use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use communa_org::{Invite, InviteStatus, Membership, OrgUnit};

use crate::actor::Actor;
use communa_org::Visibility;

/// All engine-owned records.
#[derive(Debug, Default)]
pub(crate) struct StoreState {
    /// Organizational units by id
    pub units: HashMap<Uuid, OrgUnit>,

    /// Membership rows by id (soft-deleted rows retained)
    pub memberships: HashMap<Uuid, Membership>,

    /// Invite rows by id (terminal rows retained)
    pub invites: HashMap<Uuid, Invite>,

    /// Users known to the platform (stand-in for the user directory)
    pub users: HashSet<Uuid>,
}

impl StoreState {
    /// The active membership of `user_id` in `org_unit_id`, if any.
    ///
    /// The live subset holds at most one row per (user, unit) pair.
    pub fn active_membership(&self, user_id: Uuid, org_unit_id: Uuid) -> Option<&Membership> {
        self.memberships.values().find(|m| {
            m.user_id == user_id && m.org_unit_id == org_unit_id && m.is_active()
        })
    }

    /// Check if `user_id` is an active member of `org_unit_id`.
    pub fn is_member(&self, user_id: Uuid, org_unit_id: Uuid) -> bool {
        self.active_membership(user_id, org_unit_id).is_some()
    }

    /// Check if `user_id` is an active coordinator of `org_unit_id`.
    pub fn is_coordinator(&self, user_id: Uuid, org_unit_id: Uuid) -> bool {
        self.active_membership(user_id, org_unit_id)
            .is_some_and(|m| m.role.is_coordinator())
    }

    /// Count of active coordinators of `org_unit_id`.
    ///
    /// This count is authoritative under the enclosing write guard; the
    /// last-coordinator guard compares it against 1 before any
    /// demotion or removal of a coordinator.
    pub fn active_coordinator_count(&self, org_unit_id: Uuid) -> usize {
        self.memberships
            .values()
            .filter(|m| m.org_unit_id == org_unit_id && m.is_active_coordinator())
            .count()
    }

    /// Count of active members of `org_unit_id` (any role).
    pub fn active_member_count(&self, org_unit_id: Uuid) -> usize {
        self.memberships
            .values()
            .filter(|m| m.org_unit_id == org_unit_id && m.is_active())
            .count()
    }

    /// Active memberships of `org_unit_id`, coordinators first, then by
    /// join time.
    pub fn active_members(&self, org_unit_id: Uuid) -> Vec<&Membership> {
        let mut members: Vec<&Membership> = self
            .memberships
            .values()
            .filter(|m| m.org_unit_id == org_unit_id && m.is_active())
            .collect();
        members.sort_by(|a, b| {
            b.role
                .cmp(&a.role)
                .then_with(|| a.joined_at.cmp(&b.joined_at))
        });
        members
    }

    /// The pending invite targeting (`org_unit_id`, `invited_user_id`), if any.
    pub fn pending_invite(&self, org_unit_id: Uuid, invited_user_id: Uuid) -> Option<&Invite> {
        self.invites.values().find(|i| {
            i.org_unit_id == org_unit_id
                && i.invited_user_id == invited_user_id
                && i.status == InviteStatus::Pending
        })
    }

    /// Check if a slug is already issued.
    pub fn slug_taken(&self, slug: &str) -> bool {
        self.units.values().any(|u| u.slug == slug)
    }

    /// The single active root Council, if one exists.
    pub fn active_root(&self) -> Option<&OrgUnit> {
        self.units
            .values()
            .find(|u| u.is_root() && u.is_active)
    }

    /// Active children of `org_unit_id`, ordered by creation time.
    pub fn active_children(&self, org_unit_id: Uuid) -> Vec<&OrgUnit> {
        let mut children: Vec<&OrgUnit> = self
            .units
            .values()
            .filter(|u| u.parent_id == Some(org_unit_id) && u.is_active)
            .collect();
        children.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        children
    }

    /// Check whether `actor` may see `unit` at all.
    ///
    /// Public units are visible to everyone; Restricted units only to
    /// active members and platform admins.
    pub fn visible_to(&self, actor: &Actor, unit: &OrgUnit) -> bool {
        match unit.visibility {
            Visibility::Public => true,
            Visibility::Restricted => {
                actor.is_admin() || self.is_member(actor.user_id, unit.id)
            }
        }
    }
}
