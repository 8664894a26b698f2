//! Permission resolution
//!
//! Aggregates membership, visibility, and the hierarchy policy into a
//! capability set for one (actor, unit) pair. Resolution is a pure
//! read; mutating operations run their own checks under the write
//! guard.

use serde::{Deserialize, Serialize};

use communa_org::OrgUnitType;

use crate::actor::Actor;
use crate::store::StoreState;

/// The capability set of an actor over one unit.
///
/// Returned by the permissions query so clients can render the right
/// controls; the engine re-checks everything on mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitPermissions {
    /// May see the unit's existence and details
    pub can_view: bool,

    /// May list the unit's members
    pub can_view_members: bool,

    /// May send invites for the unit
    pub can_invite: bool,

    /// May create child units
    pub can_create_child: bool,

    /// Child types the actor could create (empty unless coordinator or admin)
    pub allowed_child_types: Vec<OrgUnitType>,

    /// May edit the unit's details
    pub can_edit: bool,

    /// May change roles and remove members
    pub can_manage_members: bool,

    /// Actor is an active coordinator of the unit
    pub is_coordinator: bool,

    /// Actor is an active member of the unit
    pub is_member: bool,

    /// Actor holds an elevated global role
    pub is_admin: bool,
}

/// Resolve the capability set of `actor` over the unit `unit_id`.
///
/// The caller has already looked the unit up; this never fails.
pub(crate) fn resolve(state: &StoreState, actor: &Actor, unit_id: uuid::Uuid) -> UnitPermissions {
    let unit = &state.units[&unit_id];

    let is_admin = actor.is_admin();
    let is_member = state.is_member(actor.user_id, unit_id);
    let is_coordinator = state.is_coordinator(actor.user_id, unit_id);

    let can_view = state.visible_to(actor, unit);
    let can_manage = is_coordinator || is_admin;

    let allowed_child_types: Vec<OrgUnitType> = if can_manage {
        unit.unit_type.allowed_children().to_vec()
    } else {
        Vec::new()
    };

    UnitPermissions {
        can_view,
        can_view_members: can_view,
        can_invite: can_manage,
        can_create_child: !allowed_child_types.is_empty(),
        allowed_child_types,
        can_edit: can_manage,
        can_manage_members: can_manage,
        is_coordinator,
        is_member,
        is_admin,
    }
}
