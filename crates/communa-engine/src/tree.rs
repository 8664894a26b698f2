//! Org tree query
//!
//! Read-side assembly of the visible subtree for presentation.
//! Depth-bounded, inactive children pruned, Restricted units the viewer
//! cannot see pruned, member counts computed live from active
//! memberships.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use communa_org::{GroupCategory, OrgUnit, OrgUnitType, Visibility};

use crate::actor::Actor;
use crate::store::StoreState;

/// One node of the rendered organizational tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitNode {
    /// Unit id
    pub id: Uuid,

    /// Unit type
    pub unit_type: OrgUnitType,

    /// Group category, for groups
    pub group_category: Option<GroupCategory>,

    /// Unit name
    pub name: String,

    /// Unit slug
    pub slug: String,

    /// Unit description
    pub description: Option<String>,

    /// Unit visibility
    pub visibility: Visibility,

    /// Parent unit id (None for the root)
    pub parent_id: Option<Uuid>,

    /// Count of active memberships at query time
    pub member_count: usize,

    /// Visible active children, up to the depth bound
    pub children: Vec<UnitNode>,
}

/// Build the subtree rooted at `unit`, descending at most `max_depth`
/// levels below it.
///
/// Children that are inactive or not visible to `viewer` are pruned
/// together with their entire subtrees.
pub(crate) fn build_subtree(
    state: &StoreState,
    viewer: &Actor,
    unit: &OrgUnit,
    max_depth: usize,
) -> UnitNode {
    let children = if max_depth > 0 {
        state
            .active_children(unit.id)
            .into_iter()
            .filter(|child| state.visible_to(viewer, child))
            .map(|child| build_subtree(state, viewer, child, max_depth - 1))
            .collect()
    } else {
        Vec::new()
    };

    UnitNode {
        id: unit.id,
        unit_type: unit.unit_type,
        group_category: unit.group_category,
        name: unit.name.clone(),
        slug: unit.slug.clone(),
        description: unit.description.clone(),
        visibility: unit.visibility,
        parent_id: unit.parent_id,
        member_count: state.active_member_count(unit.id),
        children,
    }
}
